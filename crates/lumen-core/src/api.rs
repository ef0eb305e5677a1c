//! HTTP client for the device-control REST API.
//!
//! This module provides the client used by the dashboard engine to talk to
//! the smart-light backend: token exchange, status polling, control actions,
//! history queries, and settings.
//!
//! # Example
//!
//! ```no_run
//! use lumen_core::api::ApiClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("http://127.0.0.1:8000")?;
//!
//! let token = client.login("admin", "secret").await?;
//! let status = client.device_status(&token.access_token).await?;
//! println!("Light is on: {}", status.is_on);
//!
//! Ok(())
//! # }
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use lumen_types::{ControlAction, DeviceSettings, DeviceStatus, HistorySample};

use crate::error::{Error, Result};
use crate::traits::DeviceApi;

/// HTTP client for the device-control API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

// ==========================================================================
// Response Types
// ==========================================================================

/// Response from `POST /token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The bearer token for subsequent requests.
    pub access_token: String,
    /// Token scheme, `"bearer"`.
    #[serde(default)]
    pub token_type: String,
}

/// Response from `POST /api/device/control`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    pub message: String,
}

// ==========================================================================
// ApiClient Implementation
// ==========================================================================

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the backend (e.g., "http://127.0.0.1:8000")
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(Error::Request)?;

        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        // Normalize URL (remove trailing slash)
        let base_url = base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange credentials for a bearer token.
    ///
    /// The backend expects a form-encoded body, not JSON.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let url = format!("{}/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| Error::not_reachable(&url, &e))?;

        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(Error::Request)
        } else {
            Err(Error::Auth {
                message: read_detail(response).await.unwrap_or_else(|| "Login failed".to_string()),
            })
        }
    }

    /// Fetch the current device status.
    pub async fn device_status(&self, token: &str) -> Result<DeviceStatus> {
        let url = format!("{}/api/device/status", self.base_url);
        self.get(&url, token).await
    }

    /// Send a control action to the device.
    pub async fn control(&self, token: &str, action: ControlAction) -> Result<ControlResponse> {
        let url = format!("{}/api/device/control", self.base_url);
        debug!(?action, "sending control request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&action)
            .send()
            .await
            .map_err(|e| Error::not_reachable(&url, &e))?;

        handle_response(response).await
    }

    /// Fetch ordered samples for a calendar date.
    pub async fn history_by_date(&self, token: &str, date: Date) -> Result<Vec<HistorySample>> {
        let url = format!(
            "{}/api/device/history/by-date?target_date={}",
            self.base_url,
            format_date(date)
        );
        self.get(&url, token).await
    }

    /// Fetch the auto-mode settings.
    pub async fn settings(&self, token: &str) -> Result<DeviceSettings> {
        let url = format!("{}/api/device/settings", self.base_url);
        self.get(&url, token).await
    }

    /// Update the auto-mode settings.
    pub async fn update_settings(
        &self,
        token: &str,
        settings: DeviceSettings,
    ) -> Result<DeviceSettings> {
        let url = format!("{}/api/device/settings", self.base_url);
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(&settings)
            .send()
            .await
            .map_err(|e| Error::not_reachable(&url, &e))?;

        handle_response(response).await
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str, token: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::not_reachable(url, &e))?;

        handle_response(response).await
    }
}

/// Format a calendar date as the `YYYY-MM-DD` query form the backend expects.
fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Map a response for an authenticated request into the error taxonomy.
///
/// A 401 means the token is stale or revoked and becomes
/// [`Error::TokenRejected`] so the caller can tear the session down before
/// the error propagates any further.
async fn handle_response<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(Error::TokenRejected);
    }
    if status.is_success() {
        response.json().await.map_err(Error::Request)
    } else {
        let message = read_detail(response)
            .await
            .unwrap_or_else(|| status.to_string());
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull the human-readable `detail` field out of an error body, if present.
async fn read_detail(response: reqwest::Response) -> Option<String> {
    response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
}

// ==========================================================================
// DeviceApi impl
// ==========================================================================

#[async_trait]
impl DeviceApi for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        ApiClient::login(self, username, password).await
    }

    async fn device_status(&self, token: &str) -> Result<DeviceStatus> {
        ApiClient::device_status(self, token).await
    }

    async fn control(&self, token: &str, action: ControlAction) -> Result<ControlResponse> {
        ApiClient::control(self, token, action).await
    }

    async fn history_by_date(&self, token: &str, date: Date) -> Result<Vec<HistorySample>> {
        ApiClient::history_by_date(self, token, date).await
    }

    async fn settings(&self, token: &str) -> Result<DeviceSettings> {
        ApiClient::settings(self, token).await
    }

    async fn update_settings(
        &self,
        token: &str,
        settings: DeviceSettings,
    ) -> Result<DeviceSettings> {
        ApiClient::update_settings(self, token, settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn test_client_creation() {
        let client = ApiClient::new("http://127.0.0.1:8000");
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_client_normalizes_url() {
        let client = ApiClient::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = ApiClient::new("127.0.0.1:8000");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_format_date_zero_pads() {
        let date = Date::from_calendar_date(2026, Month::August, 6).unwrap();
        assert_eq!(format_date(date), "2026-08-06");
    }

    #[test]
    fn test_token_response_tolerates_missing_type() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token": "abc123"}"#).unwrap();
        assert_eq!(token.access_token, "abc123");
        assert_eq!(token.token_type, "");
    }
}
