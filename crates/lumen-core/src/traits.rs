//! Trait abstraction over the device-control API.
//!
//! This module provides the [`DeviceApi`] trait that abstracts over the real
//! HTTP client and a mock API for testing the reconciliation engine without
//! a server.

use async_trait::async_trait;
use time::Date;

use lumen_types::{ControlAction, DeviceSettings, DeviceStatus, HistorySample};

use crate::api::{ControlResponse, TokenResponse};
use crate::error::Result;

/// Operations the dashboard performs against the device-control endpoint.
///
/// Implemented by [`crate::api::ApiClient`] for the real HTTP API and by
/// [`crate::mock::MockApi`] for tests. The engine is generic over this trait,
/// so all reconciliation logic can be exercised with injected failures.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Exchange credentials for a bearer token (`POST /token`).
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse>;

    /// Fetch the current device status (`GET /api/device/status`).
    async fn device_status(&self, token: &str) -> Result<DeviceStatus>;

    /// Send a control action (`POST /api/device/control`).
    async fn control(&self, token: &str, action: ControlAction) -> Result<ControlResponse>;

    /// Fetch ordered samples for a calendar date
    /// (`GET /api/device/history/by-date`). An empty day yields `Ok(vec![])`.
    async fn history_by_date(&self, token: &str, date: Date) -> Result<Vec<HistorySample>>;

    /// Fetch the auto-mode settings (`GET /api/device/settings`).
    async fn settings(&self, token: &str) -> Result<DeviceSettings>;

    /// Update the auto-mode settings (`PUT /api/device/settings`).
    async fn update_settings(&self, token: &str, settings: DeviceSettings)
    -> Result<DeviceSettings>;
}

#[async_trait]
impl<T: DeviceApi + ?Sized> DeviceApi for std::sync::Arc<T> {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        (**self).login(username, password).await
    }

    async fn device_status(&self, token: &str) -> Result<DeviceStatus> {
        (**self).device_status(token).await
    }

    async fn control(&self, token: &str, action: ControlAction) -> Result<ControlResponse> {
        (**self).control(token, action).await
    }

    async fn history_by_date(&self, token: &str, date: Date) -> Result<Vec<HistorySample>> {
        (**self).history_by_date(token, date).await
    }

    async fn settings(&self, token: &str) -> Result<DeviceSettings> {
        (**self).settings(token).await
    }

    async fn update_settings(
        &self,
        token: &str,
        settings: DeviceSettings,
    ) -> Result<DeviceSettings> {
        (**self).update_settings(token, settings).await
    }
}
