//! Error types for lumen-core.
//!
//! The variants follow the failure taxonomy the dashboard reacts to:
//!
//! | Variant | Surfaced as | Connectivity badge |
//! |---------|-------------|--------------------|
//! | [`Error::Auth`] | inline error on the login form | unchanged |
//! | [`Error::TokenRejected`] | forced logout, login screen | unchanged |
//! | [`Error::NotReachable`] | badge flip, polling keeps retrying | offline |
//! | [`Error::Api`] | transient toast | unchanged |
//! | [`Error::Request`], [`Error::InvalidUrl`] | toast / startup failure | unchanged |
//!
//! An empty history result is `Ok(vec![])`, never an error.

use thiserror::Error;

/// Errors that can occur when talking to the device-control API.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Login was rejected (bad credentials).
    #[error("Login failed: {message}")]
    Auth { message: String },

    /// An authenticated request was rejected; the token is stale or revoked.
    ///
    /// Observing this on any request tears the session down before the error
    /// reaches the caller.
    #[error("Session expired")]
    TokenRejected,

    /// The server could not be reached at all (network-level failure).
    #[error("Server not reachable at {url}: {message}")]
    NotReachable { url: String, message: String },

    /// The server was reached but rejected the request.
    #[error("API error: {message}")]
    Api { status: u16, message: String },

    /// HTTP request plumbing failed (body read, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The configured base URL is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Create a network-level failure from a transport error.
    pub fn not_reachable(url: impl Into<String>, source: &reqwest::Error) -> Self {
        Self::NotReachable {
            url: url.into(),
            message: source.to_string(),
        }
    }

    /// Whether this error means the session token is no longer valid.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::TokenRejected)
    }

    /// Whether this error is a network-level failure (server unreachable),
    /// as opposed to an application-level rejection.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::NotReachable { .. } => true,
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias using lumen-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
