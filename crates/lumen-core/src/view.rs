//! Pure projection from model state to displayed widget values.
//!
//! The view is never a source of truth. Two projections exist:
//!
//! - [`ViewState::direct`] — used by the command dispatcher for its own
//!   action, so the user's input shows immediately (bypassing the lock).
//! - [`ViewState::gated`] — used when a poll lands; everything updates live
//!   except the brightness display, which holds its previous value while the
//!   interaction lock is active.

use time::OffsetDateTime;

use crate::model::StatusModel;

/// The widget values a renderer draws, derived from (model, lock state).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    /// Whether the server is reachable (connection badge).
    pub connected: bool,
    /// Power indicator.
    pub is_on: bool,
    /// Displayed brightness; the only field the interaction lock gates.
    pub brightness: u8,
    /// Live ambient light reading.
    pub sensor_value: u32,
    /// Auto/manual mode indicator.
    pub is_auto_mode: bool,
    /// When the model last received an authoritative update.
    pub last_updated: Option<OffsetDateTime>,
}

impl ViewState {
    /// Project model state with the brightness display taken from the model.
    ///
    /// An off light always displays brightness 0, whatever the stored value.
    pub fn direct(model: &StatusModel, connected: bool) -> Self {
        let status = model.status();
        Self {
            connected,
            is_on: status.is_on,
            brightness: status.effective_brightness(),
            sensor_value: status.sensor_value,
            is_auto_mode: status.is_auto_mode,
            last_updated: model.last_updated(),
        }
    }

    /// Project model state after a poll, holding the brightness display
    /// steady while the lock is active.
    pub fn gated(model: &StatusModel, connected: bool, lock_active: bool, prev: &Self) -> Self {
        let mut view = Self::direct(model, connected);
        if lock_active {
            view.brightness = prev.brightness;
        }
        view
    }
}
