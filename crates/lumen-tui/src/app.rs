//! Application state for the TUI.
//!
//! The app holds what the terminal draws: the active screen, the latest
//! view projection and chart series from the engine, toast notifications,
//! and the login form. It never computes device state itself — every value
//! on screen arrived in a [`UiEvent`].

use std::time::{Duration, Instant};

use time::Date;
use tokio::sync::mpsc;

use lumen_core::chart::ChartSeries;
use lumen_core::messages::UiEvent;
use lumen_core::view::ViewState;
use lumen_types::DeviceSettings;

/// How long a toast stays on screen.
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Which screen is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Dashboard,
}

/// Which login field has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

impl LoginField {
    pub fn toggle(self) -> Self {
        match self {
            Self::Username => Self::Password,
            Self::Password => Self::Username,
        }
    }
}

/// Login form state.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub field: LoginField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl LoginForm {
    /// The field currently being edited.
    pub fn active_value_mut(&mut self) -> &mut String {
        match self.field {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }
}

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// A transient notification.
#[derive(Debug, Clone)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    shown_at: Instant,
}

/// Top-level TUI state.
pub struct App {
    pub screen: Screen,
    pub login: LoginForm,
    pub view: ViewState,
    pub chart: ChartSeries,
    pub chart_date: Date,
    pub settings: Option<DeviceSettings>,
    /// Locally edited settings, sent on save.
    pub draft_settings: Option<DeviceSettings>,
    pub toasts: Vec<Toast>,
    pub should_quit: bool,
    pub event_rx: mpsc::Receiver<UiEvent>,
}

impl App {
    /// Create the app in its pre-restore state.
    pub fn new(event_rx: mpsc::Receiver<UiEvent>, chart_date: Date) -> Self {
        Self {
            screen: Screen::Login,
            login: LoginForm::default(),
            view: ViewState::default(),
            chart: ChartSeries::new(),
            chart_date,
            settings: None,
            draft_settings: None,
            toasts: Vec::new(),
            should_quit: false,
            event_rx,
        }
    }

    /// Apply one engine event.
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::SessionRestored => {
                self.screen = Screen::Dashboard;
                self.push_toast("Session restored", ToastKind::Info);
            }
            UiEvent::RestoreFailed => {
                self.screen = Screen::Login;
            }
            UiEvent::LoggedIn => {
                self.screen = Screen::Dashboard;
                self.login.submitting = false;
                self.login.error = None;
                self.login.password.clear();
                self.push_toast("Logged in", ToastKind::Success);
            }
            UiEvent::LoginFailed { error } => {
                self.login.submitting = false;
                self.login.error = Some(error);
            }
            UiEvent::LoggedOut => {
                self.reset_dashboard();
                self.push_toast("Logged out", ToastKind::Info);
            }
            UiEvent::SessionExpired => {
                self.reset_dashboard();
                self.login.error = Some("Session expired, please log in again".to_string());
            }
            UiEvent::ViewUpdated { view } => {
                self.view = view;
            }
            UiEvent::ChartUpdated { series } => {
                if let Some(date) = series.date() {
                    self.chart_date = date;
                }
                self.chart = series;
            }
            UiEvent::SettingsUpdated { settings } => {
                self.settings = Some(settings);
                self.draft_settings = Some(settings);
            }
            UiEvent::Notice { text } => self.push_toast(&text, ToastKind::Success),
            UiEvent::Alert { text } => self.push_toast(&text, ToastKind::Error),
        }
    }

    fn reset_dashboard(&mut self) {
        self.screen = Screen::Login;
        self.view = ViewState::default();
        self.chart = ChartSeries::new();
        self.settings = None;
        self.draft_settings = None;
    }

    /// Queue a toast.
    pub fn push_toast(&mut self, text: &str, kind: ToastKind) {
        self.toasts.push(Toast {
            text: text.to_string(),
            kind,
            shown_at: Instant::now(),
        });
    }

    /// Drop toasts past their display window.
    pub fn clean_expired_toasts(&mut self) {
        self.toasts.retain(|t| t.shown_at.elapsed() < TOAST_TTL);
    }
}
