//! The reconciliation engine.
//!
//! One background task owns all mutable dashboard state — session, status
//! model, interaction lock, chart — and merges the three sources of truth
//! for it: server polls, optimistic writes from user intents, and the
//! settled results of in-flight control requests.
//!
//! # Architecture
//!
//! The engine runs a single `tokio::select!` loop. Suspension points are
//! exactly the network awaits and three deadlines: the poll tick, the
//! brightness debounce window, and the lock's quiet period. Poll fetches
//! are awaited inline, so ticks are strictly sequential: a slow response
//! delays the next tick instead of racing a second write into the model.
//! Deadlines are plain values replaced on re-arm, so a timer can never leak
//! or double-fire.
//!
//! Reconciliation policy: a poll always replaces the model wholesale and
//! refreshes every non-contested field on screen. Only the brightness
//! display is gated — while the interaction lock is active the previous
//! displayed value holds, so the control cannot snap under the user's
//! pointer. The dispatcher's own writes bypass the gate; the user's action
//! must show immediately.

use std::time::Duration;

use time::{Date, OffsetDateTime};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lumen_types::{ControlAction, DeviceSettings, DeviceStatus};

use crate::chart::ChartSeries;
use crate::lock::{DEFAULT_QUIET_PERIOD, InteractionLock};
use crate::messages::{Intent, UiEvent};
use crate::model::StatusModel;
use crate::session::Session;
use crate::traits::DeviceApi;
use crate::view::ViewState;

/// Default period between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Default pause after the last brightness input before the coalesced
/// control request is sent.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Timing configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Period between status polls.
    pub poll_interval: Duration,
    /// Quiet period of the interaction lock.
    pub quiet_period: Duration,
    /// Debounce window for brightness input.
    pub debounce_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            quiet_period: DEFAULT_QUIET_PERIOD,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

/// A brightness request waiting out the debounce window.
///
/// `snapshot` is the model state before the *first* input of the burst, so
/// a failed request rolls the whole burst back, auto-mode flip included.
#[derive(Debug)]
struct PendingBrightness {
    value: u8,
    deadline: Instant,
    snapshot: DeviceStatus,
}

/// The reconciliation engine. Consumes [`Intent`]s, emits [`UiEvent`]s.
pub struct Engine<A: DeviceApi> {
    api: A,
    session: Session,
    model: StatusModel,
    lock: InteractionLock,
    chart: ChartSeries,
    view: ViewState,
    selected_date: Date,
    pending_brightness: Option<PendingBrightness>,
    config: EngineConfig,
    intent_rx: mpsc::Receiver<Intent>,
    event_tx: mpsc::Sender<UiEvent>,
    cancel: CancellationToken,
}

impl<A: DeviceApi> Engine<A> {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `api` - device-control API (real client or mock)
    /// * `session` - session store, usually fresh and unauthenticated
    /// * `config` - timing configuration
    /// * `intent_rx` - channel of user intents from the UI
    /// * `event_tx` - channel of events back to the UI
    /// * `cancel` - token the UI cancels on shutdown
    pub fn new(
        api: A,
        session: Session,
        config: EngineConfig,
        intent_rx: mpsc::Receiver<Intent>,
        event_tx: mpsc::Sender<UiEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let lock = InteractionLock::new(config.quiet_period);
        Self {
            api,
            session,
            model: StatusModel::new(),
            lock,
            chart: ChartSeries::new(),
            view: ViewState::default(),
            selected_date: today(),
            pending_brightness: None,
            config,
            intent_rx,
            event_tx,
            cancel,
        }
    }

    /// Run the engine's main loop.
    ///
    /// This method consumes the engine and runs until the cancellation token
    /// fires, a [`Intent::Shutdown`] arrives, or the intent channel closes.
    pub async fn run(mut self) {
        info!("engine started");

        self.try_restore().await;

        let mut poll = interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The restore probe already fetched once; first periodic tick waits
        // a full period.
        poll.reset();

        loop {
            let debounce_at = self.pending_brightness.as_ref().map(|p| p.deadline);
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("engine cancelled, shutting down");
                    break;
                }
                intent = self.intent_rx.recv() => {
                    match intent {
                        None => {
                            info!("intent channel closed, shutting down");
                            break;
                        }
                        Some(Intent::Shutdown) => {
                            info!("engine received shutdown intent");
                            break;
                        }
                        Some(intent) => self.handle_intent(intent, &mut poll).await,
                    }
                }
                _ = poll.tick(), if self.session.is_authenticated() => {
                    self.poll_status().await;
                }
                _ = sleep_until(debounce_at.unwrap_or_else(Instant::now)), if debounce_at.is_some() => {
                    self.flush_brightness().await;
                }
            }
        }

        info!("engine stopped");
    }

    /// Handle a single intent from the UI.
    async fn handle_intent(&mut self, intent: Intent, poll: &mut Interval) {
        debug!(?intent, "handling intent");

        match intent {
            Intent::Login { username, password } => {
                self.handle_login(&username, &password, poll).await;
            }
            Intent::Logout => self.handle_logout().await,
            Intent::TogglePower => self.handle_toggle_power().await,
            Intent::ToggleAuto => self.handle_toggle_auto().await,
            Intent::BrightnessInput { value } => self.handle_brightness_input(value).await,
            Intent::SelectDate { date } => {
                self.selected_date = date;
                self.load_history().await;
            }
            Intent::ReloadHistory => self.load_history().await,
            Intent::SaveSettings { settings } => self.handle_save_settings(settings).await,
            Intent::Shutdown => {
                // Handled in run() loop
            }
        }
    }

    // ======================================================================
    // Session lifecycle
    // ======================================================================

    /// Validate a persisted token with one live probe.
    ///
    /// The probe doubles as the first status fetch. A token that fails
    /// validation for any reason is discarded and the login screen shown; a
    /// stale token must never produce a half-broken dashboard.
    async fn try_restore(&mut self) {
        let Some(token) = self.session.stored_token() else {
            self.emit(UiEvent::RestoreFailed).await;
            return;
        };

        match self.api.device_status(&token).await {
            Ok(status) => {
                info!("restored persisted session");
                self.session.adopt(token);
                self.emit(UiEvent::SessionRestored).await;
                self.apply_poll_success(status).await;
                self.load_history().await;
                self.load_settings().await;
            }
            Err(e) => {
                warn!(error = %e, "persisted token failed validation");
                self.session.discard_stored();
                self.emit(UiEvent::RestoreFailed).await;
            }
        }
    }

    async fn handle_login(&mut self, username: &str, password: &str, poll: &mut Interval) {
        match self.api.login(username, password).await {
            Ok(token) => {
                info!("login succeeded");
                self.session.begin(token.access_token);
                self.emit(UiEvent::LoggedIn).await;
                // One immediate fetch so the dashboard does not wait out a
                // full poll period after login.
                self.poll_status().await;
                poll.reset();
                self.load_history().await;
                self.load_settings().await;
            }
            Err(e) => {
                if e.is_connectivity() {
                    self.session.set_connected(false);
                }
                self.emit(UiEvent::LoginFailed {
                    error: e.to_string(),
                })
                .await;
            }
        }
    }

    async fn handle_logout(&mut self) {
        self.pending_brightness = None;
        self.session.clear();
        self.emit(UiEvent::LoggedOut).await;
    }

    /// Tear the session down after a rejected token.
    ///
    /// Polling stops with the session: the tick branch is guarded on
    /// authentication, so a cleared session admits no further model writes.
    /// A pending debounced request dies with it.
    async fn expire_session(&mut self) {
        warn!("session rejected by server, logging out");
        self.pending_brightness = None;
        self.session.clear();
        self.emit(UiEvent::SessionExpired).await;
    }

    // ======================================================================
    // Poller
    // ======================================================================

    async fn poll_status(&mut self) {
        let Some(token) = self.token() else { return };

        match self.api.device_status(&token).await {
            Ok(status) => self.apply_poll_success(status).await,
            Err(e) if e.is_auth_rejection() => self.expire_session().await,
            Err(e) if e.is_connectivity() => {
                debug!(error = %e, "poll failed, server unreachable");
                // Keep the stale model on screen; only the badge flips.
                if self.session.set_connected(false) {
                    self.render_gated().await;
                }
            }
            Err(e) => {
                // Server reachable but the request was rejected. Keep the
                // last known state and let the next tick retry.
                warn!(error = %e, "poll failed");
            }
        }
    }

    async fn apply_poll_success(&mut self, status: DeviceStatus) {
        let now = OffsetDateTime::now_utc();
        self.model.replace(status, now);
        self.session.set_connected(true);
        if self
            .chart
            .live_append(now.date(), now, status.sensor_value, status.brightness)
        {
            self.emit_chart().await;
        }
        self.render_gated().await;
    }

    // ======================================================================
    // Command dispatcher
    // ======================================================================

    async fn handle_toggle_power(&mut self) {
        if !self.session.is_authenticated() {
            return;
        }
        let target = !self.model.status().is_on;

        self.lock.engage();
        let snapshot = self.model.snapshot();
        // Turning off cascades: brightness 0, auto mode off.
        self.model.set_power(target);
        self.render_direct().await;

        self.dispatch(ControlAction::TogglePower { state: target }, snapshot)
            .await;
        self.lock.release();
    }

    async fn handle_toggle_auto(&mut self) {
        if !self.session.is_authenticated() {
            return;
        }
        let status = *self.model.status();
        if !status.is_on && !status.is_auto_mode {
            self.emit(UiEvent::Alert {
                text: "Turn the light on before enabling auto mode".to_string(),
            })
            .await;
            return;
        }
        let target = !status.is_auto_mode;

        self.lock.engage();
        let snapshot = self.model.snapshot();
        self.model.set_auto(target);
        self.render_direct().await;

        self.dispatch(ControlAction::SetAuto { enable: target }, snapshot)
            .await;
        self.lock.release();
    }

    /// One brightness input event.
    ///
    /// The optimistic write and render happen per event; the outbound
    /// request is debounced so a drag produces one request, not one per
    /// step. Re-arming replaces the deadline and keeps the snapshot from
    /// the first event of the burst.
    async fn handle_brightness_input(&mut self, value: u8) {
        if !self.session.is_authenticated() {
            return;
        }
        if !self.model.status().is_on {
            self.emit(UiEvent::Alert {
                text: "Turn the light on to set brightness".to_string(),
            })
            .await;
            return;
        }

        self.lock.engage();
        let snapshot = match self.pending_brightness.take() {
            Some(pending) => pending.snapshot,
            None => self.model.snapshot(),
        };
        // Manual edit drops the auto flag immediately.
        self.model.set_brightness(value);
        self.pending_brightness = Some(PendingBrightness {
            value: self.model.status().brightness,
            deadline: Instant::now() + self.config.debounce_window,
            snapshot,
        });
        self.render_direct().await;
    }

    /// The debounce window elapsed; send the coalesced request.
    async fn flush_brightness(&mut self) {
        let Some(pending) = self.pending_brightness.take() else {
            return;
        };
        self.dispatch(
            ControlAction::SetBrightness {
                value: pending.value,
            },
            pending.snapshot,
        )
        .await;
        self.lock.release();
    }

    /// Send a control request and reconcile the optimistic state.
    ///
    /// Success leaves the optimistic state in place (now presumed correct).
    /// Failure restores the snapshot, re-renders, and surfaces the error;
    /// no outcome leaves an optimistic update unaccounted for.
    async fn dispatch(&mut self, action: ControlAction, snapshot: DeviceStatus) {
        let Some(token) = self.token() else { return };

        match self.api.control(&token, action).await {
            Ok(_) => {
                self.session.set_connected(true);
                self.emit(UiEvent::Notice {
                    text: action.describe(),
                })
                .await;
            }
            Err(e) if e.is_auth_rejection() => self.expire_session().await,
            Err(e) => {
                if e.is_connectivity() {
                    self.session.set_connected(false);
                }
                warn!(error = %e, ?action, "control request failed, rolling back");
                self.model.restore(snapshot);
                self.render_direct().await;
                self.emit(UiEvent::Alert {
                    text: e.to_string(),
                })
                .await;
            }
        }
    }

    // ======================================================================
    // History / settings
    // ======================================================================

    async fn load_history(&mut self) {
        let Some(token) = self.token() else { return };

        match self.api.history_by_date(&token, self.selected_date).await {
            Ok(samples) => {
                debug!(count = samples.len(), "history loaded");
                // An empty day is a valid outcome; the chart clears.
                self.chart.rebuild(self.selected_date, &samples);
                self.emit_chart().await;
            }
            Err(e) if e.is_auth_rejection() => self.expire_session().await,
            Err(e) if e.is_connectivity() => {
                if self.session.set_connected(false) {
                    self.render_gated().await;
                }
            }
            Err(e) => {
                self.emit(UiEvent::Alert {
                    text: e.to_string(),
                })
                .await;
            }
        }
    }

    async fn load_settings(&mut self) {
        let Some(token) = self.token() else { return };

        match self.api.settings(&token).await {
            Ok(settings) => self.emit(UiEvent::SettingsUpdated { settings }).await,
            Err(e) if e.is_auth_rejection() => self.expire_session().await,
            Err(e) => debug!(error = %e, "failed to load settings"),
        }
    }

    async fn handle_save_settings(&mut self, settings: DeviceSettings) {
        if !settings.is_valid() {
            self.emit(UiEvent::Alert {
                text: "Dark threshold must stay below the bright threshold".to_string(),
            })
            .await;
            return;
        }
        let Some(token) = self.token() else { return };

        match self.api.update_settings(&token, settings).await {
            Ok(saved) => {
                self.emit(UiEvent::SettingsUpdated { settings: saved }).await;
                self.emit(UiEvent::Notice {
                    text: "Settings saved".to_string(),
                })
                .await;
            }
            Err(e) if e.is_auth_rejection() => self.expire_session().await,
            Err(e) => {
                if e.is_connectivity() {
                    self.session.set_connected(false);
                }
                self.emit(UiEvent::Alert {
                    text: e.to_string(),
                })
                .await;
            }
        }
    }

    // ======================================================================
    // Projection and plumbing
    // ======================================================================

    /// Re-render with the brightness display taken straight from the model
    /// (the dispatcher's own writes bypass the lock's gate).
    async fn render_direct(&mut self) {
        self.view = ViewState::direct(&self.model, self.session.connected());
        let view = self.view.clone();
        self.emit(UiEvent::ViewUpdated { view }).await;
    }

    /// Re-render after a poll, holding the brightness display while the
    /// lock is active.
    async fn render_gated(&mut self) {
        let lock_active = self.lock.is_active();
        let view = ViewState::gated(&self.model, self.session.connected(), lock_active, &self.view);
        self.view = view.clone();
        self.emit(UiEvent::ViewUpdated { view }).await;
    }

    async fn emit_chart(&mut self) {
        let series = self.chart.clone();
        self.emit(UiEvent::ChartUpdated { series }).await;
    }

    async fn emit(&self, event: UiEvent) {
        if self.event_tx.send(event).await.is_err() {
            debug!("UI receiver dropped, event discarded");
        }
    }

    fn token(&self) -> Option<String> {
        self.session.token().map(String::from)
    }
}

/// Today's calendar date (UTC, matching the timestamps the client stores).
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.quiet_period, Duration::from_millis(4000));
        assert_eq!(config.debounce_window, Duration::from_millis(300));
    }
}
