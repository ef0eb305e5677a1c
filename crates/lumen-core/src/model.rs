//! The device status model.
//!
//! Holds the last-known authoritative device state. Two writers exist: the
//! poller replaces the whole status on every successful fetch, and the
//! command dispatcher applies targeted optimistic writes that are later
//! confirmed by the server or rolled back from a snapshot. The view never
//! writes here.

use time::OffsetDateTime;

use lumen_types::{DeviceStatus, clamp_brightness};

/// Last-known authoritative device state plus its update timestamp.
#[derive(Debug, Clone, Default)]
pub struct StatusModel {
    status: DeviceStatus,
    last_updated: Option<OffsetDateTime>,
}

impl StatusModel {
    /// Create a model with no data yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current status.
    pub fn status(&self) -> &DeviceStatus {
        &self.status
    }

    /// When the model last received an authoritative update.
    pub fn last_updated(&self) -> Option<OffsetDateTime> {
        self.last_updated
    }

    /// Replace the whole status with a freshly polled one.
    pub fn replace(&mut self, status: DeviceStatus, at: OffsetDateTime) {
        self.status = status;
        self.last_updated = Some(at);
    }

    /// Snapshot the current status for a later rollback.
    pub fn snapshot(&self) -> DeviceStatus {
        self.status
    }

    /// Restore a snapshot taken before a failed optimistic update.
    ///
    /// Only the status fields revert; the authoritative timestamp is left
    /// alone since the snapshot never came from the server.
    pub fn restore(&mut self, snapshot: DeviceStatus) {
        self.status = snapshot;
    }

    /// Optimistically set the power state.
    ///
    /// Turning the light off also forces brightness to 0 and leaves auto
    /// mode: an off light has no output and cannot be in an active control
    /// loop.
    pub fn set_power(&mut self, on: bool) {
        self.status.is_on = on;
        if !on {
            self.status.brightness = 0;
            self.status.is_auto_mode = false;
        }
    }

    /// Optimistically set a manual brightness level.
    ///
    /// Manual and auto control are mutually exclusive, so a manual edit
    /// drops the auto flag immediately, before the server confirms. A
    /// brightness write while the light is off is refused; an off light
    /// holds brightness 0.
    ///
    /// Returns whether the write was applied.
    pub fn set_brightness(&mut self, value: u8) -> bool {
        if !self.status.is_on {
            return false;
        }
        self.status.brightness = clamp_brightness(value);
        self.status.is_auto_mode = false;
        true
    }

    /// Optimistically set the auto-mode flag.
    ///
    /// Auto mode cannot engage while the light is off.
    pub fn set_auto(&mut self, enable: bool) {
        self.status.is_auto_mode = enable && self.status.is_on;
    }
}
