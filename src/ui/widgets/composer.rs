use crate::feeds::Platform;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::time::{Duration, Instant};

/// How long the send button shows its confirmation.
pub const SENT_FEEDBACK: Duration = Duration::from_millis(1500);

const SEND_LABEL: &str = "ENVIAR";
const SENT_LABEL: &str = "✅ ENVIADO!";

/// The manual message simulator: platform picker, compose box and send button.
#[derive(Debug, Clone)]
pub struct Composer {
    platform: Platform,
    input: String,
    customer: String,
    sent_until: Option<Instant>,
}

impl Composer {
    pub fn new(platform: Platform, customer: String) -> Self {
        Self {
            platform,
            input: String::new(),
            customer,
            sent_until: None,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn text(&self) -> &str {
        &self.input
    }

    pub fn cycle_platform(&mut self) {
        self.platform = self.platform.next();
    }

    pub fn add_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn delete_char(&mut self) {
        self.input.pop();
    }

    pub fn clear(&mut self) {
        self.input.clear();
    }

    pub fn flash_sent(&mut self, now: Instant) {
        self.sent_until = Some(now + SENT_FEEDBACK);
    }

    pub fn button_label(&self, now: Instant) -> &'static str {
        match self.sent_until {
            Some(until) if now < until => SENT_LABEL,
            _ => SEND_LABEL,
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, now: Instant) {
        let block = Block::default()
            .title(" Simulador ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(4),
                Constraint::Length(3),
                Constraint::Length(6),
            ])
            .split(inner);

        let platforms: Vec<Span> = Platform::SELECTABLE
            .iter()
            .flat_map(|platform| {
                let style = if *platform == self.platform {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                [
                    Span::styled(format!(" {} ", platform.label()), style),
                    Span::raw(" "),
                ]
            })
            .collect();
        let picker = Paragraph::new(vec![
            Line::from(platforms),
            Line::from(Span::styled(
                format!("como {}", self.customer),
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(picker, chunks[0]);

        let input = Paragraph::new(format!("{}▏", self.input))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(" Mensaje ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(input, chunks[1]);

        let label = self.button_label(now);
        let button_style = if label == SENT_LABEL {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        };
        let button = Paragraph::new(Line::from(Span::styled(label, button_style)))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(button, chunks[2]);

        let help = Paragraph::new(vec![
            Line::from("Ctrl+Enter / Ctrl+S  enviar"),
            Line::from("Tab  cambiar plataforma"),
            Line::from("Ctrl+R  refrescar   Ctrl+P  auto"),
            Line::from("Ctrl+X  limpiar     ↑/↓  desplazar"),
            Line::from("Esc / Ctrl+C  salir"),
        ])
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
