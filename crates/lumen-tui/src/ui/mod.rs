//! Main UI layout and rendering for the TUI dashboard.
//!
//! Rendering is a pure function of [`App`] state: the draw pass reads the
//! latest view projection and chart series and never mutates anything.

mod dashboard;
mod login;

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::{App, Screen, Toast, ToastKind};

/// Draw the complete TUI interface.
pub fn draw(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Login => login::draw(frame, app),
        Screen::Dashboard => dashboard::draw(frame, app),
    }

    draw_toasts(frame, &app.toasts);
}

/// Render active toasts stacked in the bottom-right corner.
fn draw_toasts(frame: &mut Frame, toasts: &[Toast]) {
    let area = frame.area();
    // Last three toasts, newest at the bottom
    let visible: Vec<&Toast> = toasts.iter().rev().take(3).rev().collect();

    for (i, toast) in visible.iter().enumerate() {
        let width = (toast.text.len() as u16 + 4).min(area.width);
        let height = 3;
        let bottom_offset = (visible.len() - i) as u16 * height;
        if area.height < bottom_offset + 1 || area.width < width {
            continue;
        }
        let rect = Rect {
            x: area.right().saturating_sub(width + 1),
            y: area.bottom().saturating_sub(bottom_offset + 1),
            width,
            height,
        };

        let color = match toast.kind {
            ToastKind::Info => Color::Blue,
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };

        let widget = Paragraph::new(toast.text.as_str())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            );

        frame.render_widget(Clear, rect);
        frame.render_widget(widget, rect);
    }
}

/// Connection badge spans shared by both screens' headers.
pub(crate) fn connection_badge(connected: bool) -> Span<'static> {
    if connected {
        Span::styled("* online", Style::default().fg(Color::Green))
    } else {
        Span::styled("o offline", Style::default().fg(Color::Red))
    }
}
