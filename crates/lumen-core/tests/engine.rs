//! End-to-end tests for the reconciliation engine against the mock API.
//!
//! All tests run on a paused tokio clock, so poll ticks, the debounce
//! window, and the lock's quiet period elapse deterministically.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use lumen_core::engine::{Engine, EngineConfig, today};
use lumen_core::messages::{Intent, UiEvent};
use lumen_core::mock::MockApi;
use lumen_core::session::{Session, TokenStore};
use lumen_core::view::ViewState;
use lumen_types::{ControlAction, DeviceStatus, HistorySample};
use time::OffsetDateTime;

const POLL: Duration = Duration::from_millis(2000);
const QUIET: Duration = Duration::from_millis(4000);
const DEBOUNCE: Duration = Duration::from_millis(300);

struct Harness {
    api: Arc<MockApi>,
    intent_tx: mpsc::Sender<Intent>,
    event_rx: mpsc::Receiver<UiEvent>,
    cancel: CancellationToken,
}

impl Harness {
    /// Spawn an engine over a fresh mock with no persisted session.
    fn spawn() -> Self {
        Self::spawn_with_store(TokenStore::disabled())
    }

    fn spawn_with_store(store: TokenStore) -> Self {
        let api = Arc::new(MockApi::new());
        let (intent_tx, intent_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(256);
        let cancel = CancellationToken::new();

        let config = EngineConfig {
            poll_interval: POLL,
            quiet_period: QUIET,
            debounce_window: DEBOUNCE,
        };
        let engine = Engine::new(
            Arc::clone(&api),
            Session::new(store),
            config,
            intent_rx,
            event_tx,
            cancel.clone(),
        );
        tokio::spawn(engine.run());

        Self {
            api,
            intent_tx,
            event_rx,
            cancel,
        }
    }

    async fn send(&self, intent: Intent) {
        self.intent_tx.send(intent).await.unwrap();
    }

    async fn next_event(&mut self) -> UiEvent {
        timeout(Duration::from_secs(60), self.event_rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("engine dropped its event sender")
    }

    /// Receive events until one matches, returning the skipped ones too.
    async fn collect_until<F>(&mut self, pred: F) -> (Vec<UiEvent>, UiEvent)
    where
        F: Fn(&UiEvent) -> bool,
    {
        let mut skipped = Vec::new();
        loop {
            let event = self.next_event().await;
            if pred(&event) {
                return (skipped, event);
            }
            skipped.push(event);
        }
    }

    async fn wait_for<F>(&mut self, pred: F) -> UiEvent
    where
        F: Fn(&UiEvent) -> bool,
    {
        self.collect_until(pred).await.1
    }

    /// Log in as admin/correct and drain up to the post-login view.
    async fn login(&mut self) {
        self.send(Intent::Login {
            username: "admin".to_string(),
            password: "correct".to_string(),
        })
        .await;
        self.wait_for(|e| matches!(e, UiEvent::LoggedIn)).await;
        self.wait_for(|e| matches!(e, UiEvent::ViewUpdated { .. }))
            .await;
    }
}

fn lit_status() -> DeviceStatus {
    DeviceStatus {
        is_on: true,
        brightness: 75,
        sensor_value: 412,
        is_auto_mode: true,
    }
}

fn view_of(event: &UiEvent) -> Option<&ViewState> {
    match event {
        UiEvent::ViewUpdated { view } => Some(view),
        _ => None,
    }
}

fn sample_at(at: OffsetDateTime, sensor_value: u32, brightness: u8) -> HistorySample {
    HistorySample {
        timestamp: at,
        sensor_value,
        brightness,
    }
}

// ==========================================================================
// Session
// ==========================================================================

#[tokio::test(start_paused = true)]
async fn startup_without_token_shows_login() {
    let mut h = Harness::spawn();
    let event = h.next_event().await;
    assert_eq!(event, UiEvent::RestoreFailed);
}

#[tokio::test(start_paused = true)]
async fn login_sends_bearer_token_on_status_fetch() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;

    h.login().await;

    // The probe after login carried the issued token
    assert_eq!(h.api.last_status_token().await, Some("abc123".to_string()));
}

#[tokio::test(start_paused = true)]
async fn bad_credentials_surface_inline() {
    let mut h = Harness::spawn();
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;

    h.send(Intent::Login {
        username: "admin".to_string(),
        password: "wrong".to_string(),
    })
    .await;

    let event = h
        .wait_for(|e| matches!(e, UiEvent::LoginFailed { .. }))
        .await;
    let UiEvent::LoginFailed { error } = event else {
        unreachable!()
    };
    assert!(error.contains("Incorrect username or password"));
}

#[tokio::test(start_paused = true)]
async fn restore_validates_persisted_token() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::at(dir.path().join("token"));
    store.save("abc123");

    let mut h = Harness::spawn_with_store(TokenStore::at(dir.path().join("token")));
    h.api.set_status(lit_status()).await;

    let event = h
        .wait_for(|e| matches!(e, UiEvent::SessionRestored | UiEvent::RestoreFailed))
        .await;
    assert_eq!(event, UiEvent::SessionRestored);
}

#[tokio::test(start_paused = true)]
async fn restore_discards_stale_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    TokenStore::at(&path).save("revoked-token");

    let mut h = Harness::spawn_with_store(TokenStore::at(&path));
    let event = h
        .wait_for(|e| matches!(e, UiEvent::SessionRestored | UiEvent::RestoreFailed))
        .await;
    assert_eq!(event, UiEvent::RestoreFailed);
    // The stale token is gone; the next run goes straight to login
    assert_eq!(TokenStore::at(&path).load(), None);
}

#[tokio::test(start_paused = true)]
async fn logout_is_idempotent_and_stops_polling() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.send(Intent::Logout).await;
    h.wait_for(|e| matches!(e, UiEvent::LoggedOut)).await;
    h.send(Intent::Logout).await;
    h.wait_for(|e| matches!(e, UiEvent::LoggedOut)).await;

    let requests_after_logout = h.api.status_request_count();
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(h.api.status_request_count(), requests_after_logout);

    h.cancel.cancel();
}

// ==========================================================================
// Poller
// ==========================================================================

#[tokio::test(start_paused = true)]
async fn poll_updates_noncontested_fields_in_real_time() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.api
        .set_status(DeviceStatus {
            sensor_value: 901,
            ..lit_status()
        })
        .await;

    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| v.sensor_value == 901))
        .await;
    let view = view_of(&event).unwrap();
    assert!(view.connected);
    assert!(view.is_on);
}

#[tokio::test(start_paused = true)]
async fn poll_failure_flips_badge_and_keeps_stale_model() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.api.set_unreachable(true);
    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| !v.connected))
        .await;
    // Stale but displayed, not cleared
    let view = view_of(&event).unwrap();
    assert!(view.is_on);
    assert_eq!(view.sensor_value, 412);

    // One failure does not cancel the schedule: the server comes back and
    // the next tick recovers
    h.api.set_unreachable(false);
    h.wait_for(|e| view_of(e).is_some_and(|v| v.connected)).await;
}

#[tokio::test(start_paused = true)]
async fn session_expiry_mid_poll_stops_the_poller() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.api.set_reject_token(true);
    h.wait_for(|e| matches!(e, UiEvent::SessionExpired)).await;

    let requests_at_expiry = h.api.status_request_count();
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(h.api.status_request_count(), requests_at_expiry);
}

// ==========================================================================
// Command dispatcher
// ==========================================================================

#[tokio::test(start_paused = true)]
async fn power_off_cascades_to_brightness_and_auto() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.send(Intent::TogglePower).await;

    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| !v.is_on))
        .await;
    let view = view_of(&event).unwrap();
    assert_eq!(view.brightness, 0);
    assert!(!view.is_auto_mode);

    h.wait_for(|e| matches!(e, UiEvent::Notice { .. })).await;
    assert_eq!(
        h.api.control_log().await,
        vec![ControlAction::TogglePower { state: false }]
    );
}

#[tokio::test(start_paused = true)]
async fn failed_command_rolls_back_every_touched_field() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.api.set_control_failure(Some("device rejected command")).await;
    h.send(Intent::TogglePower).await;

    // Optimistic write shows first
    h.wait_for(|e| view_of(e).is_some_and(|v| !v.is_on)).await;

    // Then the failure reverts power, brightness, and auto mode together
    let (skipped, event) = h
        .collect_until(|e| view_of(e).is_some_and(|v| v.is_on))
        .await;
    let view = view_of(&event).unwrap();
    assert_eq!(view.brightness, 75);
    assert!(view.is_auto_mode);
    assert!(!skipped.iter().any(|e| matches!(e, UiEvent::Notice { .. })));

    let event = h.wait_for(|e| matches!(e, UiEvent::Alert { .. })).await;
    let UiEvent::Alert { text } = event else {
        unreachable!()
    };
    assert!(text.contains("device rejected command"));
    assert!(h.api.control_log().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn brightness_burst_coalesces_into_one_request() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    for value in [71, 68, 64, 60, 55] {
        h.send(Intent::BrightnessInput { value }).await;
    }

    // Each input re-rendered immediately
    h.wait_for(|e| view_of(e).is_some_and(|v| v.brightness == 55))
        .await;

    // After the debounce window, exactly one request with the last value
    h.wait_for(|e| matches!(e, UiEvent::Notice { .. })).await;
    assert_eq!(
        h.api.control_log().await,
        vec![ControlAction::SetBrightness { value: 55 }]
    );
}

#[tokio::test(start_paused = true)]
async fn manual_brightness_edit_drops_auto_mode_immediately() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.send(Intent::BrightnessInput { value: 30 }).await;

    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| v.brightness == 30))
        .await;
    // The flip shows before the request is even sent
    assert!(!view_of(&event).unwrap().is_auto_mode);
    assert!(h.api.control_log().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_brightness_burst_restores_pre_burst_state() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.api.set_control_failure(Some("flash storage busy")).await;
    for value in [70, 60, 50] {
        h.send(Intent::BrightnessInput { value }).await;
    }
    h.wait_for(|e| view_of(e).is_some_and(|v| v.brightness == 50))
        .await;

    // Rollback restores the value and the auto flag from before the burst
    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| v.brightness == 75))
        .await;
    assert!(view_of(&event).unwrap().is_auto_mode);
}

// ==========================================================================
// Interaction lock
// ==========================================================================

#[tokio::test(start_paused = true)]
async fn poll_does_not_clobber_brightness_under_lock() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    // User drags to 55; the debounced request settles and starts the
    // lock's quiet-period countdown
    h.send(Intent::BrightnessInput { value: 55 }).await;
    h.wait_for(|e| matches!(e, UiEvent::Notice { .. })).await;

    // The server still echoes the stale pre-command brightness
    h.api
        .set_status(DeviceStatus {
            brightness: 75,
            sensor_value: 555,
            ..lit_status()
        })
        .await;

    // The next poll lands inside the quiet period: sensor updates live,
    // the brightness display holds
    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| v.sensor_value == 555))
        .await;
    assert_eq!(view_of(&event).unwrap().brightness, 55);

    // Once the quiet period elapses, polls propagate again. The server has
    // caught up with the command by then.
    h.api
        .set_status(DeviceStatus {
            brightness: 55,
            sensor_value: 600,
            is_auto_mode: false,
            ..lit_status()
        })
        .await;
    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| v.sensor_value == 600))
        .await;
    assert_eq!(view_of(&event).unwrap().brightness, 55);
}

#[tokio::test(start_paused = true)]
async fn stale_poll_after_quiet_period_propagates() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.send(Intent::BrightnessInput { value: 55 }).await;
    h.wait_for(|e| matches!(e, UiEvent::Notice { .. })).await;

    h.api
        .set_status(DeviceStatus {
            brightness: 20,
            ..lit_status()
        })
        .await;

    // Wait out the quiet period; last-write-wins by arrival order applies
    // again and the authoritative value shows
    tokio::time::sleep(QUIET + POLL * 2).await;
    let event = h
        .wait_for(|e| view_of(e).is_some_and(|v| v.brightness == 20))
        .await;
    assert!(view_of(&event).unwrap().connected);
}

// ==========================================================================
// History / chart
// ==========================================================================

#[tokio::test(start_paused = true)]
async fn empty_history_clears_chart_and_blocks_append() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    // Today has no samples: the load yields an explicitly empty chart
    let event = h
        .wait_for(|e| matches!(e, UiEvent::ChartUpdated { .. }))
        .await;
    let UiEvent::ChartUpdated { series } = event else {
        unreachable!()
    };
    assert!(series.is_empty());

    // Subsequent polls must not fabricate a series from nothing
    h.api
        .set_status(DeviceStatus {
            sensor_value: 777,
            ..lit_status()
        })
        .await;
    let (skipped, _) = h
        .collect_until(|e| view_of(e).is_some_and(|v| v.sensor_value == 777))
        .await;
    h.api
        .set_status(DeviceStatus {
            sensor_value: 778,
            ..lit_status()
        })
        .await;
    let (more, _) = h
        .collect_until(|e| view_of(e).is_some_and(|v| v.sensor_value == 778))
        .await;
    assert!(
        !skipped
            .iter()
            .chain(more.iter())
            .any(|e| matches!(e, UiEvent::ChartUpdated { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn anchored_today_chart_appends_on_poll() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    let now = OffsetDateTime::now_utc();
    h.api
        .set_history(today(), vec![sample_at(now, 100, 10)])
        .await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    let event = h
        .wait_for(|e| matches!(e, UiEvent::ChartUpdated { series } if !series.is_empty()))
        .await;
    let UiEvent::ChartUpdated { series } = event else {
        unreachable!()
    };
    assert_eq!(series.len(), 1);

    // The next successful poll appends one live point
    let event = h
        .wait_for(|e| matches!(e, UiEvent::ChartUpdated { series } if series.len() == 2))
        .await;
    let UiEvent::ChartUpdated { series } = event else {
        unreachable!()
    };
    assert_eq!(series.sensor()[1], 412);
    assert_eq!(series.brightness()[1], 75);
}

#[tokio::test(start_paused = true)]
async fn non_today_chart_never_appends() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    let yesterday = today().previous_day().unwrap();
    let stamp = OffsetDateTime::now_utc() - time::Duration::days(1);
    h.api
        .set_history(yesterday, vec![sample_at(stamp, 100, 10)])
        .await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    h.send(Intent::SelectDate { date: yesterday }).await;
    h.wait_for(|e| matches!(e, UiEvent::ChartUpdated { series } if series.len() == 1))
        .await;

    // Let several polls land; the historical chart stays untouched
    h.api
        .set_status(DeviceStatus {
            sensor_value: 888,
            ..lit_status()
        })
        .await;
    let (skipped, _) = h
        .collect_until(|e| view_of(e).is_some_and(|v| v.sensor_value == 888))
        .await;
    assert!(
        !skipped
            .iter()
            .any(|e| matches!(e, UiEvent::ChartUpdated { series } if series.len() > 1))
    );
}

// ==========================================================================
// Settings
// ==========================================================================

#[tokio::test(start_paused = true)]
async fn settings_load_and_save_round_trip() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    let event = h
        .wait_for(|e| matches!(e, UiEvent::SettingsUpdated { .. }))
        .await;
    let UiEvent::SettingsUpdated { settings } = event else {
        unreachable!()
    };
    assert_eq!(settings.light_threshold_low, 300);

    let edited = lumen_types::DeviceSettings {
        light_threshold_low: 200,
        light_threshold_high: 800,
        auto_brightness: 60,
    };
    h.send(Intent::SaveSettings { settings: edited }).await;
    let event = h
        .wait_for(|e| matches!(e, UiEvent::SettingsUpdated { .. }))
        .await;
    let UiEvent::SettingsUpdated { settings } = event else {
        unreachable!()
    };
    assert_eq!(settings, edited);
}

#[tokio::test(start_paused = true)]
async fn inverted_thresholds_are_rejected_client_side() {
    let mut h = Harness::spawn();
    h.api.set_status(lit_status()).await;
    h.wait_for(|e| matches!(e, UiEvent::RestoreFailed)).await;
    h.login().await;

    let inverted = lumen_types::DeviceSettings {
        light_threshold_low: 800,
        light_threshold_high: 200,
        auto_brightness: 60,
    };
    h.send(Intent::SaveSettings { settings: inverted }).await;
    let event = h.wait_for(|e| matches!(e, UiEvent::Alert { .. })).await;
    let UiEvent::Alert { text } = event else {
        unreachable!()
    };
    assert!(text.contains("threshold"));
}
