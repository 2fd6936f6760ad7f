use crate::feeds::{recent_window, Message, Platform};
use crate::ui::widgets::FeedView;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: usize = 50;
/// Entrance delay between consecutive cards.
pub const REVEAL_STAGGER: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accent {
    WhatsApp,
    Facebook,
    Instagram,
    Bot,
    Neutral,
}

impl Accent {
    fn for_message(message: &Message) -> Self {
        if message.is_bot() {
            return Accent::Bot;
        }
        match message.platform {
            Platform::WhatsApp => Accent::WhatsApp,
            Platform::Facebook => Accent::Facebook,
            Platform::Instagram => Accent::Instagram,
            Platform::Unknown => Accent::Neutral,
        }
    }

    pub fn color(self) -> Color {
        match self {
            Accent::WhatsApp => Color::Rgb(37, 211, 102),
            Accent::Facebook => Color::Rgb(24, 119, 242),
            Accent::Instagram => Color::Rgb(225, 48, 108),
            Accent::Bot => Color::Rgb(16, 185, 129),
            Accent::Neutral => Color::Gray,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardModel {
    pub icon: String,
    pub customer: String,
    pub platform_label: &'static str,
    pub time: String,
    pub content: String,
    pub is_bot: bool,
    pub accent: Accent,
    pub auto_badge: bool,
    pub reveal_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub icon: &'static str,
    pub headline: &'static str,
    pub hint: &'static str,
}

pub const EMPTY_STATE: EmptyState = EmptyState {
    icon: "📭",
    headline: "No hay mensajes aún",
    hint: "Usa el simulador o espera la generación automática",
};

#[derive(Debug, Clone, PartialEq)]
pub enum FeedContent {
    Loading,
    Empty(EmptyState),
    Cards(Vec<CardModel>),
}

/// Card view-models for the newest `window` messages, oldest first.
pub fn build_cards(messages: &[Message], window: usize) -> Vec<CardModel> {
    recent_window(messages, window)
        .iter()
        .enumerate()
        .map(|(i, message)| CardModel {
            icon: message.icon.clone(),
            customer: message.customer.clone(),
            platform_label: message.platform.label(),
            time: message.time.clone(),
            content: message.content.clone(),
            is_bot: message.is_bot(),
            accent: Accent::for_message(message),
            auto_badge: message.is_bot(),
            reveal_delay: REVEAL_STAGGER * i as u32,
        })
        .collect()
}

pub struct MessageFeed {
    content: FeedContent,
    window: usize,
    scroll_state: ListState,
    rendered_at: Instant,
}

impl MessageFeed {
    pub fn new(window: usize) -> Self {
        Self {
            content: FeedContent::Loading,
            window: window.max(1),
            scroll_state: ListState::default(),
            rendered_at: Instant::now(),
        }
    }

    pub fn content(&self) -> &FeedContent {
        &self.content
    }

    pub fn cards(&self) -> &[CardModel] {
        match &self.content {
            FeedContent::Cards(cards) => cards,
            _ => &[],
        }
    }

    pub fn card_count(&self) -> usize {
        self.cards().len()
    }

    pub fn selected(&self) -> Option<usize> {
        self.scroll_state.selected()
    }

    /// True while the view sits on the newest card.
    pub fn is_pinned(&self) -> bool {
        let count = self.card_count();
        count > 0 && self.scroll_state.selected() == Some(count - 1)
    }

    pub fn scroll_up(&mut self) {
        if let Some(selected) = self.scroll_state.selected() {
            if selected > 0 {
                self.scroll_state.select(Some(selected - 1));
            }
        }
    }

    pub fn scroll_down(&mut self) {
        if let Some(selected) = self.scroll_state.selected() {
            if selected < self.card_count().saturating_sub(1) {
                self.scroll_state.select(Some(selected + 1));
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, now: Instant) {
        let title = match &self.content {
            FeedContent::Cards(cards) => format!(" Mensajes ({}) ", cards.len()),
            _ => " Mensajes ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White));

        match &self.content {
            FeedContent::Loading => {
                let loading = List::new(vec![ListItem::new("Cargando mensajes...")]).block(block);
                frame.render_widget(loading, area);
            }
            FeedContent::Empty(empty) => {
                let inner = block.inner(area);
                frame.render_widget(block, area);
                let top_padding = inner.height.saturating_sub(4) / 2;
                let mut lines = vec![Line::from(""); top_padding as usize];
                lines.extend([
                    Line::from(empty.icon),
                    Line::from(""),
                    Line::from(Span::styled(
                        empty.headline,
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(empty.hint, Style::default().fg(Color::DarkGray))),
                ]);
                let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
                frame.render_widget(paragraph, inner);
            }
            FeedContent::Cards(cards) => {
                let width = block.inner(area).width as usize;
                let items: Vec<ListItem> = cards
                    .iter()
                    .map(|card| {
                        let revealing = now < self.rendered_at + card.reveal_delay;
                        card_item(card, width, revealing)
                    })
                    .collect();

                let list = List::new(items).block(block);
                let mut state = self.scroll_state.clone();
                frame.render_stateful_widget(list, area, &mut state);
            }
        }
    }
}

fn card_item(card: &CardModel, width: usize, revealing: bool) -> ListItem<'static> {
    let muted = Style::default().fg(Color::DarkGray);
    let paint = |style: Style| if revealing { muted } else { style };
    let accent = paint(Style::default().fg(card.accent.color()));

    let mut left = vec![
        Span::styled("▌ ", accent),
        Span::raw(format!("{} ", card.icon)),
        Span::styled(
            card.customer.clone(),
            paint(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        ),
        Span::styled(format!("  {}", card.platform_label), accent),
    ];
    let mut right = vec![Span::styled(card.time.clone(), muted)];
    if card.auto_badge {
        right.push(Span::raw(" "));
        right.push(Span::styled(
            " AUTO ",
            paint(
                Style::default()
                    .fg(Color::Black)
                    .bg(Accent::Bot.color())
                    .add_modifier(Modifier::BOLD),
            ),
        ));
    }

    let used = Line::from(left.clone()).width() + Line::from(right.clone()).width();
    left.push(Span::raw(" ".repeat(width.saturating_sub(used))));
    left.extend(right);

    let body_style = if card.is_bot {
        paint(Style::default().fg(Color::Rgb(167, 243, 208)))
    } else {
        paint(Style::default().fg(Color::Gray))
    };

    let mut lines = vec![Line::from(left)];
    let wrap_width = width.saturating_sub(4).max(10);
    for segment in textwrap::wrap(&card.content, wrap_width) {
        lines.push(Line::from(vec![
            Span::styled("▌   ", accent),
            Span::styled(segment.into_owned(), body_style),
        ]));
    }
    lines.push(Line::from(""));

    ListItem::new(lines)
}

impl FeedView for MessageFeed {
    fn render(&mut self, messages: &[Message]) {
        if messages.is_empty() {
            self.render_empty_state();
            return;
        }

        let cards = build_cards(messages, self.window);
        let last = cards.len() - 1;
        self.content = FeedContent::Cards(cards);
        self.rendered_at = Instant::now();
        self.scroll_state = ListState::default();
        self.scroll_state.select(Some(last));
    }

    fn render_empty_state(&mut self) {
        self.content = FeedContent::Empty(EMPTY_STATE);
        self.scroll_state = ListState::default();
    }
}
