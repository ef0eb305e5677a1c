//! # lumen-types
//!
//! Wire-level data types shared by the lumen smart-light dashboard crates.
//!
//! These types mirror the JSON payloads of the device-control HTTP API:
//! the authoritative device status, the control actions a user can issue,
//! historical sensor samples, and the auto-mode tuning settings. They carry
//! no I/O of their own; `lumen-core` owns the client that moves them.

mod types;

pub use types::{
    BRIGHTNESS_MAX, ControlAction, DeviceSettings, DeviceStatus, HistorySample, clamp_brightness,
};
