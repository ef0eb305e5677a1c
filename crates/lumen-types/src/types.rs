//! Core types for the smart-light device API.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Upper bound of the brightness scale (percent).
pub const BRIGHTNESS_MAX: u8 = 100;

/// Clamp a raw brightness value into the `[0, 100]` range.
#[must_use]
pub fn clamp_brightness(value: u8) -> u8 {
    value.min(BRIGHTNESS_MAX)
}

/// Authoritative device state as reported by `GET /api/device/status`.
///
/// The server is the source of truth for these fields; the client replaces
/// its copy wholesale on every successful poll. Optimistic writes between
/// polls touch individual fields and are reconciled against the next poll
/// or rolled back when the command fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Whether the light is powered on.
    pub is_on: bool,
    /// Brightness in percent, `0..=100`.
    pub brightness: u8,
    /// Most recent ambient light sensor reading.
    pub sensor_value: u32,
    /// Whether the device is running its sensor-driven auto-brightness loop.
    pub is_auto_mode: bool,
}

impl DeviceStatus {
    /// The brightness a display should show for this state.
    ///
    /// An off light emits no light; the rendered brightness is forced to 0
    /// regardless of the last stored value.
    #[must_use]
    pub fn effective_brightness(&self) -> u8 {
        if self.is_on {
            clamp_brightness(self.brightness)
        } else {
            0
        }
    }
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            is_on: false,
            brightness: 0,
            sensor_value: 0,
            is_auto_mode: false,
        }
    }
}

/// A user-initiated command for `POST /api/device/control`.
///
/// Serializes to the wire form `{"action": "...", ...params}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ControlAction {
    /// Switch the light on or off.
    #[serde(rename = "TOGGLE_POWER")]
    TogglePower { state: bool },
    /// Set a manual brightness level.
    #[serde(rename = "SET_BRIGHTNESS")]
    SetBrightness { value: u8 },
    /// Enable or disable the auto-brightness loop.
    #[serde(rename = "SET_AUTO")]
    SetAuto { enable: bool },
}

impl ControlAction {
    /// Short human-readable description for notifications.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::TogglePower { state: true } => "Light turned on".to_string(),
            Self::TogglePower { state: false } => "Light turned off".to_string(),
            Self::SetBrightness { value } => format!("Brightness set to {}%", value),
            Self::SetAuto { enable: true } => "Auto mode enabled".to_string(),
            Self::SetAuto { enable: false } => "Auto mode disabled".to_string(),
        }
    }
}

/// One historical sample from `GET /api/device/history/by-date`.
///
/// Samples are ordered ascending by timestamp and immutable once fetched;
/// the live chart path appends new samples, it never rewrites old ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    /// When the sample was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Ambient light sensor reading at that time.
    pub sensor_value: u32,
    /// Light brightness at that time, in percent.
    pub brightness: u8,
}

/// Auto-mode tuning settings, `GET`/`PUT /api/device/settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Sensor reading below which the room counts as dark.
    pub light_threshold_low: u32,
    /// Sensor reading above which the room counts as bright.
    pub light_threshold_high: u32,
    /// Brightness the auto loop applies when the room is dark, in percent.
    pub auto_brightness: u8,
}

impl DeviceSettings {
    /// Whether the thresholds form a valid window (`low < high`).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.light_threshold_low < self.light_threshold_high
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            light_threshold_low: 300,
            light_threshold_high: 700,
            auto_brightness: 80,
        }
    }
}
