pub mod counters;
pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Instant;

pub fn draw(frame: &mut Frame, app: &App) {
    let now = Instant::now();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Min(8),
        ])
        .split(frame.area());

    let auto = if app.auto_generate() {
        Span::styled("auto-generación: activa", Style::default().fg(Color::Green))
    } else {
        Span::styled("auto-generación: en pausa", Style::default().fg(Color::Yellow))
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " OneInBox ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(app.server_url(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        auto,
    ]));
    frame.render_widget(header, rows[0]);

    widgets::stats::render_counters(frame, rows[1], app.counters());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(rows[2]);

    app.feed().draw(frame, columns[0], now);
    app.composer().draw(frame, columns[1], now);

    if let Some(dialog) = app.dialog() {
        dialog.draw(frame, frame.area());
    }
}
