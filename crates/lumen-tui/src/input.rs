//! Keyboard input handling.
//!
//! Keys map to [`Action`]s, and actions either mutate local UI state
//! (editing the login form, adjusting a settings draft) or produce a typed
//! [`Intent`] for the engine. Input capture stays decoupled from state
//! mutation, so the mapping is testable without a terminal.

use crossterm::event::KeyCode;
use time::Date;

use lumen_core::engine::today;
use lumen_core::messages::Intent;
use lumen_types::{BRIGHTNESS_MAX, DeviceSettings};

use crate::app::{App, Screen, ToastKind};

/// Step applied per brightness keypress.
const BRIGHTNESS_STEP: u8 = 5;
/// Step applied per threshold keypress.
const THRESHOLD_STEP: u32 = 25;
/// Upper bound of the sensor scale the thresholds live on.
const SENSOR_SCALE_MAX: u32 = 1000;

/// UI actions produced from key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Quit,

    // Login screen
    InsertChar(char),
    Backspace,
    SwitchField,
    Submit,

    // Dashboard
    Logout,
    TogglePower,
    ToggleAuto,
    BrightnessUp,
    BrightnessDown,
    PrevDate,
    NextDate,
    GotoToday,
    ReloadHistory,
    AdjustLow(i32),
    AdjustHigh(i32),
    AdjustAutoBrightness(i32),
    SaveSettings,
}

/// Map a key press to an action for the active screen.
pub fn handle_key(screen: Screen, code: KeyCode) -> Action {
    match screen {
        Screen::Login => match code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => Action::SwitchField,
            KeyCode::Enter => Action::Submit,
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Char(c) => Action::InsertChar(c),
            _ => Action::None,
        },
        Screen::Dashboard => match code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('x') => Action::Logout,
            KeyCode::Char('p') | KeyCode::Char(' ') => Action::TogglePower,
            KeyCode::Char('a') => Action::ToggleAuto,
            KeyCode::Right => Action::BrightnessUp,
            KeyCode::Left => Action::BrightnessDown,
            KeyCode::Char('[') => Action::PrevDate,
            KeyCode::Char(']') => Action::NextDate,
            KeyCode::Char('t') => Action::GotoToday,
            KeyCode::Char('r') => Action::ReloadHistory,
            KeyCode::Char('1') => Action::AdjustLow(-(THRESHOLD_STEP as i32)),
            KeyCode::Char('2') => Action::AdjustLow(THRESHOLD_STEP as i32),
            KeyCode::Char('3') => Action::AdjustHigh(-(THRESHOLD_STEP as i32)),
            KeyCode::Char('4') => Action::AdjustHigh(THRESHOLD_STEP as i32),
            KeyCode::Char('5') => Action::AdjustAutoBrightness(-(BRIGHTNESS_STEP as i32)),
            KeyCode::Char('6') => Action::AdjustAutoBrightness(BRIGHTNESS_STEP as i32),
            KeyCode::Char('s') => Action::SaveSettings,
            _ => Action::None,
        },
    }
}

/// Apply an action to the app, producing an intent for the engine if the
/// gesture needs one.
pub fn apply_action(app: &mut App, action: Action) -> Option<Intent> {
    match action {
        Action::None => None,
        Action::Quit => {
            app.should_quit = true;
            None
        }

        // Login form
        Action::InsertChar(c) => {
            app.login.active_value_mut().push(c);
            None
        }
        Action::Backspace => {
            app.login.active_value_mut().pop();
            None
        }
        Action::SwitchField => {
            app.login.field = app.login.field.toggle();
            None
        }
        Action::Submit => submit_login(app),

        // Dashboard
        Action::Logout => Some(Intent::Logout),
        Action::TogglePower => Some(Intent::TogglePower),
        Action::ToggleAuto => Some(Intent::ToggleAuto),
        Action::BrightnessUp => brightness_input(app, BRIGHTNESS_STEP as i32),
        Action::BrightnessDown => brightness_input(app, -(BRIGHTNESS_STEP as i32)),
        Action::PrevDate => select_date(app, app.chart_date.previous_day()),
        Action::NextDate => select_date(app, app.chart_date.next_day()),
        Action::GotoToday => select_date(app, Some(today())),
        Action::ReloadHistory => Some(Intent::ReloadHistory),
        Action::AdjustLow(delta) => {
            adjust_draft(app, |s| {
                s.light_threshold_low = step_u32(s.light_threshold_low, delta, SENSOR_SCALE_MAX);
            });
            None
        }
        Action::AdjustHigh(delta) => {
            adjust_draft(app, |s| {
                s.light_threshold_high = step_u32(s.light_threshold_high, delta, SENSOR_SCALE_MAX);
            });
            None
        }
        Action::AdjustAutoBrightness(delta) => {
            adjust_draft(app, |s| {
                s.auto_brightness =
                    step_u32(s.auto_brightness as u32, delta, BRIGHTNESS_MAX as u32) as u8;
            });
            None
        }
        Action::SaveSettings => {
            let settings = app.draft_settings?;
            if !settings.is_valid() {
                app.push_toast(
                    "Dark threshold must stay below the bright threshold",
                    ToastKind::Error,
                );
                return None;
            }
            Some(Intent::SaveSettings { settings })
        }
    }
}

fn submit_login(app: &mut App) -> Option<Intent> {
    let username = app.login.username.trim().to_string();
    let password = app.login.password.clone();
    if username.is_empty() || password.is_empty() {
        app.login.error = Some("Enter a username and password".to_string());
        return None;
    }
    if app.login.submitting {
        return None;
    }
    app.login.error = None;
    app.login.submitting = true;
    Some(Intent::Login { username, password })
}

fn brightness_input(app: &mut App, delta: i32) -> Option<Intent> {
    if !app.view.is_on {
        app.push_toast("Turn the light on to set brightness", ToastKind::Error);
        return None;
    }
    let value = step_u32(app.view.brightness as u32, delta, BRIGHTNESS_MAX as u32) as u8;
    Some(Intent::BrightnessInput { value })
}

fn select_date(app: &mut App, date: Option<Date>) -> Option<Intent> {
    let date = date?;
    if date > today() {
        return None;
    }
    app.chart_date = date;
    Some(Intent::SelectDate { date })
}

fn adjust_draft(app: &mut App, f: impl FnOnce(&mut DeviceSettings)) {
    if let Some(draft) = app.draft_settings.as_mut() {
        f(draft);
    }
}

/// Saturating signed step within `[0, max]`.
fn step_u32(value: u32, delta: i32, max: u32) -> u32 {
    let stepped = value as i64 + delta as i64;
    stepped.clamp(0, max as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::messages::UiEvent;
    use lumen_core::view::ViewState;
    use tokio::sync::mpsc;

    fn app() -> App {
        let (_tx, rx) = mpsc::channel(1);
        App::new(rx, today())
    }

    fn dashboard_app() -> App {
        let mut app = app();
        app.handle_event(UiEvent::LoggedIn);
        app.handle_event(UiEvent::ViewUpdated {
            view: ViewState {
                connected: true,
                is_on: true,
                brightness: 50,
                ..Default::default()
            },
        });
        app
    }

    #[test]
    fn test_dashboard_key_bindings() {
        assert_eq!(handle_key(Screen::Dashboard, KeyCode::Char('q')), Action::Quit);
        assert_eq!(
            handle_key(Screen::Dashboard, KeyCode::Char('p')),
            Action::TogglePower
        );
        assert_eq!(
            handle_key(Screen::Dashboard, KeyCode::Char(' ')),
            Action::TogglePower
        );
        assert_eq!(
            handle_key(Screen::Dashboard, KeyCode::Char('a')),
            Action::ToggleAuto
        );
        assert_eq!(
            handle_key(Screen::Dashboard, KeyCode::Right),
            Action::BrightnessUp
        );
    }

    #[test]
    fn test_login_keys_edit_form() {
        let mut app = app();
        apply_action(&mut app, handle_key(Screen::Login, KeyCode::Char('a')));
        apply_action(&mut app, handle_key(Screen::Login, KeyCode::Char('d')));
        assert_eq!(app.login.username, "ad");

        apply_action(&mut app, handle_key(Screen::Login, KeyCode::Backspace));
        assert_eq!(app.login.username, "a");

        apply_action(&mut app, handle_key(Screen::Login, KeyCode::Tab));
        apply_action(&mut app, handle_key(Screen::Login, KeyCode::Char('x')));
        assert_eq!(app.login.password, "x");
    }

    #[test]
    fn test_submit_requires_both_fields() {
        let mut app = app();
        assert_eq!(apply_action(&mut app, Action::Submit), None);
        assert!(app.login.error.is_some());

        app.login.username = "admin".to_string();
        app.login.password = "correct".to_string();
        let intent = apply_action(&mut app, Action::Submit);
        assert_eq!(
            intent,
            Some(Intent::Login {
                username: "admin".to_string(),
                password: "correct".to_string(),
            })
        );
        assert!(app.login.submitting);

        // A second submit while one is in flight is swallowed
        assert_eq!(apply_action(&mut app, Action::Submit), None);
    }

    #[test]
    fn test_brightness_steps_from_displayed_value() {
        let mut app = dashboard_app();
        assert_eq!(
            apply_action(&mut app, Action::BrightnessUp),
            Some(Intent::BrightnessInput { value: 55 })
        );
        assert_eq!(
            apply_action(&mut app, Action::BrightnessDown),
            Some(Intent::BrightnessInput { value: 45 })
        );
    }

    #[test]
    fn test_brightness_clamps_at_bounds() {
        let mut app = dashboard_app();
        app.view.brightness = 98;
        assert_eq!(
            apply_action(&mut app, Action::BrightnessUp),
            Some(Intent::BrightnessInput { value: 100 })
        );
        app.view.brightness = 3;
        assert_eq!(
            apply_action(&mut app, Action::BrightnessDown),
            Some(Intent::BrightnessInput { value: 0 })
        );
    }

    #[test]
    fn test_brightness_blocked_while_off() {
        let mut app = dashboard_app();
        app.view.is_on = false;
        assert_eq!(apply_action(&mut app, Action::BrightnessUp), None);
        assert!(!app.toasts.is_empty());
    }

    #[test]
    fn test_date_navigation_stops_at_today() {
        let mut app = dashboard_app();
        let yesterday = today().previous_day().unwrap();

        let intent = apply_action(&mut app, Action::PrevDate);
        assert_eq!(intent, Some(Intent::SelectDate { date: yesterday }));
        assert_eq!(app.chart_date, yesterday);

        apply_action(&mut app, Action::NextDate);
        assert_eq!(app.chart_date, today());

        // Already at today; the future is not browsable
        assert_eq!(apply_action(&mut app, Action::NextDate), None);
        assert_eq!(app.chart_date, today());
    }

    #[test]
    fn test_settings_draft_adjustment_and_save() {
        let mut app = dashboard_app();
        app.handle_event(UiEvent::SettingsUpdated {
            settings: DeviceSettings::default(),
        });

        apply_action(&mut app, Action::AdjustLow(-25));
        apply_action(&mut app, Action::AdjustAutoBrightness(5));
        let draft = app.draft_settings.unwrap();
        assert_eq!(draft.light_threshold_low, 275);
        assert_eq!(draft.auto_brightness, 85);

        let intent = apply_action(&mut app, Action::SaveSettings);
        assert_eq!(intent, Some(Intent::SaveSettings { settings: draft }));
    }

    #[test]
    fn test_invalid_draft_rejected_before_dispatch() {
        let mut app = dashboard_app();
        app.draft_settings = Some(DeviceSettings {
            light_threshold_low: 900,
            light_threshold_high: 100,
            auto_brightness: 50,
        });
        assert_eq!(apply_action(&mut app, Action::SaveSettings), None);
        assert!(!app.toasts.is_empty());
    }
}
