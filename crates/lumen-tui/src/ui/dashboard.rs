//! Dashboard rendering: status panel, brightness gauge, settings, and the
//! history chart.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Sparkline};

use lumen_core::engine::today;

use super::connection_badge;
use crate::app::App;

/// Draw the dashboard screen.
pub(super) fn draw(frame: &mut Frame, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Help bar
        ])
        .split(frame.area());

    draw_header(frame, layout[0], app);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(38), Constraint::Min(1)])
        .split(layout[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Status
            Constraint::Length(3), // Brightness gauge
            Constraint::Length(7), // Settings
            Constraint::Min(0),
        ])
        .split(content[0]);

    draw_status(frame, left[0], app);
    draw_brightness(frame, left[1], app);
    draw_settings(frame, left[2], app);
    draw_chart(frame, content[1], app);
    draw_help_bar(frame, layout[2]);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let updated = app
        .view
        .last_updated
        .map(|at| {
            format!(
                "updated {:02}:{:02}:{:02}",
                at.hour(),
                at.minute(),
                at.second()
            )
        })
        .unwrap_or_else(|| "waiting for data".to_string());

    let line = Line::from(vec![
        Span::styled(
            " lumen ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        connection_badge(app.view.connected),
        Span::styled(format!("  {}", updated), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let view = &app.view;

    let power = if view.is_on {
        Span::styled("On", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("Off", Style::default().fg(Color::DarkGray))
    };
    let mode = if view.is_auto_mode {
        Span::styled("Auto", Style::default().fg(Color::Cyan))
    } else {
        Span::styled("Manual", Style::default().fg(Color::Gray))
    };

    let lines = vec![
        Line::from(""),
        Line::from(vec![Span::raw(" Power   "), power]),
        Line::from(vec![Span::raw(" Mode    "), mode]),
        Line::from(vec![
            Span::raw(" Sensor  "),
            Span::styled(
                view.sensor_value.to_string(),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_brightness(frame: &mut Frame, area: Rect, app: &App) {
    let brightness = app.view.brightness;
    let style = if app.view.is_on {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let gauge = Gauge::default()
        .block(Block::default().title(" Brightness ").borders(Borders::ALL))
        .gauge_style(style)
        .percent(brightness as u16)
        .label(format!("{}%", brightness));
    frame.render_widget(gauge, area);
}

fn draw_settings(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Auto mode settings ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let Some(draft) = app.draft_settings else {
        let hint = Paragraph::new(Line::from(Span::styled(
            " not loaded",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        frame.render_widget(hint, area);
        return;
    };

    let dirty = app.settings != app.draft_settings;
    let value_style = if dirty {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Gray)
    };

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw(" Dark below    "),
            Span::styled(draft.light_threshold_low.to_string(), value_style),
        ]),
        Line::from(vec![
            Span::raw(" Bright above  "),
            Span::styled(draft.light_threshold_high.to_string(), value_style),
        ]),
        Line::from(vec![
            Span::raw(" Auto level    "),
            Span::styled(format!("{}%", draft.auto_brightness), value_style),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_chart(frame: &mut Frame, area: Rect, app: &App) {
    let chart = &app.chart;
    let title = if app.chart_date == today() {
        " History (today) ".to_string()
    } else {
        format!(" History ({}) ", app.chart_date)
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    if chart.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "    No samples for this date",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "    [ and ] change the date, t jumps to today",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Sensor label
            Constraint::Min(3),    // Sensor sparkline
            Constraint::Length(1), // Brightness label
            Constraint::Length(4), // Brightness sparkline
            Constraint::Length(1), // Time axis
        ])
        .split(inner);

    let sensor_peak = chart.sensor().iter().copied().max().unwrap_or(0);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" Sensor (peak {})", sensor_peak),
            Style::default().fg(Color::Cyan),
        ))),
        rows[0],
    );

    let width = rows[1].width as usize;
    let sensor_data = resample(chart.sensor().iter().map(|&v| v as u64), width);
    let sensor = Sparkline::default()
        .data(&sensor_data)
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(sensor, rows[1]);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " Brightness %",
            Style::default().fg(Color::Yellow),
        ))),
        rows[2],
    );

    let brightness_data = resample(chart.brightness().iter().map(|&v| v as u64), width);
    let brightness = Sparkline::default()
        .data(&brightness_data)
        .max(100)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(brightness, rows[3]);

    draw_time_axis(frame, rows[4], app);
}

/// Resample a series to the drawable width by nearest-index picking, so the
/// sparkline spans the whole panel regardless of sample count.
fn resample(values: impl Iterator<Item = u64>, target_width: usize) -> Vec<u64> {
    let data: Vec<u64> = values.collect();
    if data.is_empty() || target_width == 0 {
        return Vec::new();
    }
    if data.len() <= target_width {
        return data;
    }
    let last = data.len() - 1;
    (0..target_width)
        .map(|i| data[i * last / (target_width - 1).max(1)])
        .collect()
}

fn draw_time_axis(frame: &mut Frame, area: Rect, app: &App) {
    let first = app.chart.labels().first().cloned().unwrap_or_default();
    let last = app.chart.labels().last().cloned().unwrap_or_default();
    let pad = (area.width as usize).saturating_sub(first.len() + last.len() + 2);
    let line = Line::from(Span::styled(
        format!(" {}{}{}", first, " ".repeat(pad), last),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_help_bar(frame: &mut Frame, area: Rect) {
    let help = Line::from(Span::styled(
        " space power | a auto | left/right brightness | [ ] date | t today | r reload | 1-6 settings | s save | x logout | q quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(help), area);
}
