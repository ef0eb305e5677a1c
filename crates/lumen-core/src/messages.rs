//! Message types for UI/engine communication.
//!
//! The terminal UI and the reconciliation engine run as separate tasks and
//! communicate over channels:
//!
//! ```text
//! +------------------+     Intent      +------------------+
//! |    UI thread     | --------------> |     Engine       |
//! |    (ratatui)     |                 |  (tokio select)  |
//! |                  | <-------------- |                  |
//! +------------------+     UiEvent     +------------------+
//! ```
//!
//! - [`Intent`]: typed user gestures sent from the UI to the engine
//! - [`UiEvent`]: state projections and notifications sent back to the UI
//!
//! Every gesture becomes a typed intent, so the reconciliation logic is
//! testable without a terminal attached.

use time::Date;

use lumen_types::DeviceSettings;

use crate::chart::ChartSeries;
use crate::view::ViewState;

/// User-initiated intents consumed by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Submit the login form.
    Login { username: String, password: String },

    /// Log out and return to the login screen.
    Logout,

    /// Toggle the light's power state.
    TogglePower,

    /// Toggle the auto-brightness loop.
    ToggleAuto,

    /// One brightness input event (a step of a drag). Rapid events coalesce
    /// into a single debounced control request.
    BrightnessInput { value: u8 },

    /// Show history for a different calendar date.
    SelectDate { date: Date },

    /// Re-fetch history for the currently selected date.
    ReloadHistory,

    /// Save edited auto-mode settings.
    SaveSettings { settings: DeviceSettings },

    /// Shut the engine down.
    Shutdown,
}

/// Events sent from the engine back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A persisted token was validated; the dashboard can open directly.
    SessionRestored,

    /// No usable persisted token; show the login screen.
    RestoreFailed,

    /// Login succeeded.
    LoggedIn,

    /// Login failed; shown inline on the login form.
    LoginFailed { error: String },

    /// The user logged out.
    LoggedOut,

    /// A request was rejected for a stale token; the session was torn down.
    SessionExpired,

    /// New widget values to draw.
    ViewUpdated { view: ViewState },

    /// The chart series was rebuilt or appended to.
    ChartUpdated { series: ChartSeries },

    /// Fresh auto-mode settings (after login or a successful save).
    SettingsUpdated { settings: DeviceSettings },

    /// Transient success/info notification.
    Notice { text: String },

    /// Transient error notification.
    Alert { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_debug() {
        let intent = Intent::BrightnessInput { value: 40 };
        let debug = format!("{:?}", intent);
        assert!(debug.contains("BrightnessInput"));
        assert!(debug.contains("40"));
    }

    #[test]
    fn test_intent_clone_eq() {
        let intent = Intent::Login {
            username: "admin".to_string(),
            password: "correct".to_string(),
        };
        assert_eq!(intent.clone(), intent);
    }

    #[test]
    fn test_event_debug() {
        let event = UiEvent::SessionExpired;
        assert!(format!("{:?}", event).contains("SessionExpired"));
    }
}
