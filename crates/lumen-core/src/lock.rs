//! The interaction lock.
//!
//! A time-windowed gate that suppresses model-to-view propagation for the
//! brightness display while the user is editing it. Device commands are not
//! applied instantaneously server-side, so a poll landing shortly after a
//! command can still carry a stale brightness; without the lock the slider
//! would visibly snap back under the user's pointer.
//!
//! The lock protects only the brightness display. Sensor readings, power
//! state, mode, and the connection badge are never user-edited and must stay
//! live, so the poller updates them regardless of the lock.

use std::time::Duration;

use tokio::time::Instant;

/// Default quiet period after the last edit before authoritative values may
/// reach the brightness display again. Long enough to outlast the server's
/// command propagation delay; an empirical constant, not a protocol
/// guarantee.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockState {
    /// No edit in progress, no quiet period pending.
    Idle,
    /// An edit gesture or dispatch is in progress.
    Engaged,
    /// The last edit settled; the lock stays active until the deadline.
    Draining { until: Instant },
}

/// Time-windowed gate over the brightness display.
///
/// `engage` is called on every edit/dispatch event and cancels any pending
/// release, so the quiet period always counts from the *last* event, not the
/// first. The release deadline is a plain value replaced on re-arm; there is
/// no timer task to leak or double-fire.
#[derive(Debug, Clone)]
pub struct InteractionLock {
    quiet_period: Duration,
    state: LockState,
}

impl InteractionLock {
    /// Create a lock with the given quiet period.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            state: LockState::Idle,
        }
    }

    /// Activate the lock and cancel any pending release.
    pub fn engage(&mut self) {
        self.state = LockState::Engaged;
    }

    /// Start (or restart) the quiet-period countdown.
    pub fn release(&mut self) {
        self.state = LockState::Draining {
            until: Instant::now() + self.quiet_period,
        };
    }

    /// Whether the lock currently gates the brightness display.
    pub fn is_active(&mut self) -> bool {
        match self.state {
            LockState::Idle => false,
            LockState::Engaged => true,
            LockState::Draining { until } => {
                if Instant::now() < until {
                    true
                } else {
                    self.state = LockState::Idle;
                    false
                }
            }
        }
    }
}

impl Default for InteractionLock {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_idle_by_default() {
        let mut lock = InteractionLock::default();
        assert!(!lock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_engaged_until_released() {
        let mut lock = InteractionLock::default();
        lock.engage();
        assert!(lock.is_active());

        // Engaged state has no deadline; time alone does not clear it
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(lock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_holds_for_quiet_period() {
        let mut lock = InteractionLock::new(Duration::from_millis(4000));
        lock.engage();
        lock.release();

        tokio::time::advance(Duration::from_millis(3999)).await;
        assert!(lock.is_active());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(!lock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reengage_extends_window() {
        let mut lock = InteractionLock::new(Duration::from_millis(4000));
        lock.engage();
        lock.release();

        // Partway through the countdown, a new edit arrives
        tokio::time::advance(Duration::from_millis(3000)).await;
        lock.engage();
        lock.release();

        // The original deadline has passed, but the window was extended
        tokio::time::advance(Duration::from_millis(2000)).await;
        assert!(lock.is_active());

        tokio::time::advance(Duration::from_millis(2001)).await;
        assert!(!lock.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_engage_cancels_pending_release() {
        let mut lock = InteractionLock::new(Duration::from_millis(4000));
        lock.engage();
        lock.release();
        lock.engage();

        // The earlier countdown was cancelled, not left to fire
        tokio::time::advance(Duration::from_millis(10_000)).await;
        assert!(lock.is_active());
    }
}
