use crate::ui::counters::{CounterAnimator, Stat};
use crate::ui::widgets::feed::Accent;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn stat_color(stat: Stat) -> Color {
    match stat {
        Stat::Total => Color::Cyan,
        Stat::Whatsapp => Accent::WhatsApp.color(),
        Stat::Instagram => Accent::Instagram.color(),
        Stat::Facebook => Accent::Facebook.color(),
    }
}

/// Four counter tiles laid out side by side.
pub fn render_counters(frame: &mut Frame, area: Rect, counters: &CounterAnimator) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (stat, chunk) in Stat::ALL.into_iter().zip(chunks.iter()) {
        let color = stat_color(stat);
        let value_style = if counters.is_animating(stat) {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));

        let text = vec![
            Line::from(Span::styled(counters.displayed(stat).to_string(), value_style)),
            Line::from(Span::styled(stat.label(), Style::default().fg(Color::DarkGray))),
        ];

        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, *chunk);
    }
}
