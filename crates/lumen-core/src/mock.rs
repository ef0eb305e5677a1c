//! Mock API implementation for testing.
//!
//! This module provides a mock device-control API so the reconciliation
//! engine can be unit tested without a server.
//!
//! # Features
//!
//! - **Failure injection**: mark the server unreachable, reject the token,
//!   or fail control requests with an application error
//! - **Request log**: every accepted control action is recorded for
//!   assertions (debounce coalescing, payload contents)
//! - **Scripted data**: status, per-date history, and settings are plain
//!   values tests can set

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use time::Date;
use tokio::sync::RwLock;

use lumen_types::{ControlAction, DeviceSettings, DeviceStatus, HistorySample};

use crate::api::{ControlResponse, TokenResponse};
use crate::error::{Error, Result};
use crate::traits::DeviceApi;

const MOCK_URL: &str = "http://mock.invalid";

/// A mock device-control API for engine tests.
pub struct MockApi {
    username: String,
    password: String,
    token: String,
    status: RwLock<DeviceStatus>,
    history: RwLock<HashMap<Date, Vec<HistorySample>>>,
    settings: RwLock<DeviceSettings>,
    unreachable: AtomicBool,
    reject_token: AtomicBool,
    control_failure: RwLock<Option<String>>,
    control_log: RwLock<Vec<ControlAction>>,
    status_requests: AtomicU32,
    last_status_token: RwLock<Option<String>>,
}

impl std::fmt::Debug for MockApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockApi")
            .field("token", &self.token)
            .field("unreachable", &self.unreachable.load(Ordering::Relaxed))
            .field("reject_token", &self.reject_token.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockApi {
    /// Create a mock that accepts `admin`/`correct` and issues `abc123`.
    pub fn new() -> Self {
        Self::with_credentials("admin", "correct", "abc123")
    }

    /// Create a mock with specific credentials and token.
    pub fn with_credentials(username: &str, password: &str, token: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            token: token.to_string(),
            status: RwLock::new(DeviceStatus::default()),
            history: RwLock::new(HashMap::new()),
            settings: RwLock::new(DeviceSettings::default()),
            unreachable: AtomicBool::new(false),
            reject_token: AtomicBool::new(false),
            control_failure: RwLock::new(None),
            control_log: RwLock::new(Vec::new()),
            status_requests: AtomicU32::new(0),
            last_status_token: RwLock::new(None),
        }
    }

    /// The token this mock issues.
    pub fn issued_token(&self) -> &str {
        &self.token
    }

    /// Set the status the next polls will report.
    pub async fn set_status(&self, status: DeviceStatus) {
        *self.status.write().await = status;
    }

    /// Provide history samples for a date.
    pub async fn set_history(&self, date: Date, samples: Vec<HistorySample>) {
        self.history.write().await.insert(date, samples);
    }

    /// Set the stored settings.
    pub async fn set_settings(&self, settings: DeviceSettings) {
        *self.settings.write().await = settings;
    }

    /// Simulate the server being unreachable (network-level failure).
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::Relaxed);
    }

    /// Make every authenticated request come back 401.
    pub fn set_reject_token(&self, reject: bool) {
        self.reject_token.store(reject, Ordering::Relaxed);
    }

    /// Make control requests fail with an application error.
    pub async fn set_control_failure(&self, message: Option<&str>) {
        *self.control_failure.write().await = message.map(String::from);
    }

    /// Accepted control actions, in arrival order.
    pub async fn control_log(&self) -> Vec<ControlAction> {
        self.control_log.read().await.clone()
    }

    /// Number of status fetches served or refused.
    pub fn status_request_count(&self) -> u32 {
        self.status_requests.load(Ordering::Relaxed)
    }

    /// The bearer token presented on the most recent status fetch.
    pub async fn last_status_token(&self) -> Option<String> {
        self.last_status_token.read().await.clone()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::Relaxed) {
            return Err(Error::NotReachable {
                url: MOCK_URL.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn check_token(&self, token: &str) -> Result<()> {
        if self.reject_token.load(Ordering::Relaxed) || token != self.token {
            return Err(Error::TokenRejected);
        }
        Ok(())
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceApi for MockApi {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        self.check_reachable()?;
        if username == self.username && password == self.password {
            Ok(TokenResponse {
                access_token: self.token.clone(),
                token_type: "bearer".to_string(),
            })
        } else {
            Err(Error::Auth {
                message: "Incorrect username or password".to_string(),
            })
        }
    }

    async fn device_status(&self, token: &str) -> Result<DeviceStatus> {
        self.status_requests.fetch_add(1, Ordering::Relaxed);
        *self.last_status_token.write().await = Some(token.to_string());
        self.check_reachable()?;
        self.check_token(token)?;
        Ok(*self.status.read().await)
    }

    async fn control(&self, token: &str, action: ControlAction) -> Result<ControlResponse> {
        self.check_reachable()?;
        self.check_token(token)?;
        if let Some(message) = self.control_failure.read().await.clone() {
            return Err(Error::Api {
                status: 400,
                message,
            });
        }
        self.control_log.write().await.push(action);
        Ok(ControlResponse {
            status: "success".to_string(),
            message: "Command sent to device".to_string(),
        })
    }

    async fn history_by_date(&self, token: &str, date: Date) -> Result<Vec<HistorySample>> {
        self.check_reachable()?;
        self.check_token(token)?;
        Ok(self
            .history
            .read()
            .await
            .get(&date)
            .cloned()
            .unwrap_or_default())
    }

    async fn settings(&self, token: &str) -> Result<DeviceSettings> {
        self.check_reachable()?;
        self.check_token(token)?;
        Ok(*self.settings.read().await)
    }

    async fn update_settings(
        &self,
        token: &str,
        settings: DeviceSettings,
    ) -> Result<DeviceSettings> {
        self.check_reachable()?;
        self.check_token(token)?;
        *self.settings.write().await = settings;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_issues_token() {
        let api = MockApi::new();
        let token = api.login("admin", "correct").await.unwrap();
        assert_eq!(token.access_token, "abc123");

        let err = api.login("admin", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }));
    }

    #[tokio::test]
    async fn test_status_requires_valid_token() {
        let api = MockApi::new();
        assert!(api.device_status("abc123").await.is_ok());

        let err = api.device_status("stale").await.unwrap_err();
        assert!(err.is_auth_rejection());
        assert_eq!(api.status_request_count(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_is_connectivity_error() {
        let api = MockApi::new();
        api.set_unreachable(true);
        let err = api.device_status("abc123").await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_control_log_records_payloads() {
        let api = MockApi::new();
        api.control("abc123", ControlAction::SetBrightness { value: 40 })
            .await
            .unwrap();
        let log = api.control_log().await;
        assert_eq!(log, vec![ControlAction::SetBrightness { value: 40 }]);
    }

    #[tokio::test]
    async fn test_missing_history_is_empty() {
        let api = MockApi::new();
        let date = Date::from_calendar_date(2026, time::Month::August, 6).unwrap();
        let samples = api.history_by_date("abc123", date).await.unwrap();
        assert!(samples.is_empty());
    }
}
