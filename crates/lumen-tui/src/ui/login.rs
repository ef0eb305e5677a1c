//! Login screen rendering.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{App, LoginField};

/// Draw the centered login form.
pub(super) fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(12),
            Constraint::Min(1),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(46),
            Constraint::Min(1),
        ])
        .split(vertical[1]);

    let form_area = horizontal[1];

    let block = Block::default()
        .title(" lumen ")
        .title_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let field_style = |field: LoginField| {
        if app.login.field == field {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let password_mask = "*".repeat(app.login.password.chars().count());

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Smart light dashboard",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Username: ", field_style(LoginField::Username)),
            Span::raw(app.login.username.as_str()),
            cursor(app, LoginField::Username),
        ]),
        Line::from(vec![
            Span::styled("  Password: ", field_style(LoginField::Password)),
            Span::raw(password_mask),
            cursor(app, LoginField::Password),
        ]),
        Line::from(""),
    ];

    if app.login.submitting {
        lines.push(Line::from(Span::styled(
            "  Logging in...",
            Style::default().fg(Color::Blue),
        )));
    } else if let Some(error) = &app.login.error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(Color::Red),
        )));
    } else {
        lines.push(Line::from(""));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  tab switch field - enter log in - esc quit",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}

fn cursor(app: &App, field: LoginField) -> Span<'static> {
    if app.login.field == field && !app.login.submitting {
        Span::styled("_", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    }
}
