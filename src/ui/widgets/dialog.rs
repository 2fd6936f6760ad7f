use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub const EMPTY_INPUT_WARNING: &str = "⚠️ Por favor escribe un mensaje";
pub const SEND_FAILED: &str = "❌ Error al enviar mensaje";
pub const CLEAR_CONFIRM: &str = "¿Estás seguro de que quieres eliminar todos los mensajes?";
pub const CLEAR_DONE: &str = "✅ Mensajes eliminados correctamente";
pub const CLEAR_FAILED: &str = "❌ Error al limpiar mensajes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Warning,
    Success,
    Error,
}

impl NoticeKind {
    fn color(self) -> Color {
        match self {
            NoticeKind::Warning => Color::Yellow,
            NoticeKind::Success => Color::Green,
            NoticeKind::Error => Color::Red,
        }
    }
}

/// A blocking overlay: the user must answer it before anything else reacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    Notice { kind: NoticeKind, text: String },
    ConfirmClear,
}

impl Dialog {
    pub fn warning(text: &str) -> Self {
        Dialog::Notice {
            kind: NoticeKind::Warning,
            text: text.to_string(),
        }
    }

    pub fn success(text: &str) -> Self {
        Dialog::Notice {
            kind: NoticeKind::Success,
            text: text.to_string(),
        }
    }

    pub fn error(text: &str) -> Self {
        Dialog::Notice {
            kind: NoticeKind::Error,
            text: text.to_string(),
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let modal_area = center_rect(50, 25, area);
        frame.render_widget(Clear, modal_area);

        let (color, title, body, hint) = match self {
            Dialog::Notice { kind, text } => (
                kind.color(),
                " Aviso ",
                text.as_str(),
                "Enter / Esc para cerrar",
            ),
            Dialog::ConfirmClear => (
                Color::Yellow,
                " Confirmar ",
                CLEAR_CONFIRM,
                "y: eliminar   n / Esc: cancelar",
            ),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                body,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        ];

        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, modal_area);
    }
}

fn center_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
