pub mod driver;

use crate::config::Config;
use crate::error::InboxError;
use crate::feeds::{FeedData, InboxApi};
use crate::ui;
use crate::ui::counters::CounterAnimator;
use crate::ui::widgets::composer::Composer;
use crate::ui::widgets::dialog::{self, Dialog};
use crate::ui::widgets::feed::MessageFeed;
use crate::ui::widgets::FeedView;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use driver::{DriverSettings, LoopDriver};
use ratatui::{backend::Backend, Terminal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Redraw cadence; matches the counter animation step so every step shows.
const FRAME_INTERVAL: Duration = Duration::from_millis(25);

pub struct App {
    server_url: String,
    driver: LoopDriver,
    updates: Option<mpsc::UnboundedReceiver<FeedData>>,
    feed: MessageFeed,
    counters: CounterAnimator,
    composer: Composer,
    dialog: Option<Dialog>,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, api: Arc<dyn InboxApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = DriverSettings {
            message_interval: config.refresh.message_interval(),
            stats_interval: config.refresh.stats_interval(),
            auto_generate: config.refresh.auto_generate,
        };

        Self {
            server_url: config.base_url().to_string(),
            driver: LoopDriver::new(api, tx, settings),
            updates: Some(rx),
            feed: MessageFeed::new(config.feed.window),
            counters: CounterAnimator::new(),
            composer: Composer::new(
                config.feed.default_platform,
                config.feed.customer_name.clone(),
            ),
            dialog: None,
            should_quit: false,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn feed(&self) -> &MessageFeed {
        &self.feed
    }

    pub fn counters(&self) -> &CounterAnimator {
        &self.counters
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn auto_generate(&self) -> bool {
        self.driver.auto_generate()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn start(&mut self) {
        self.driver.start();
    }

    /// Stop the timers and any running counter animation.
    pub fn shutdown(&mut self) {
        self.driver.shutdown();
        self.counters.shutdown();
        info!("refresh loop stopped");
    }

    pub fn handle_update(&mut self, update: FeedData) {
        match update {
            FeedData::Messages(messages) => self.feed.render(&messages),
            FeedData::Stats(stats) => self.counters.apply_snapshot(&stats),
            FeedData::Sent => {
                self.composer.clear();
                self.composer.flash_sent(Instant::now());
            }
            FeedData::SendFailed(_) => {
                self.dialog = Some(Dialog::error(dialog::SEND_FAILED));
            }
            FeedData::Cleared => {
                self.dialog = Some(Dialog::success(dialog::CLEAR_DONE));
            }
            FeedData::ClearFailed(_) => {
                self.dialog = Some(Dialog::error(dialog::CLEAR_FAILED));
            }
        }
    }

    /// Apply every update that has already arrived.
    pub fn pump_updates(&mut self) {
        let mut pending = Vec::new();
        if let Some(updates) = self.updates.as_mut() {
            while let Ok(message) = updates.try_recv() {
                pending.push(message);
            }
        }
        for message in pending {
            self.handle_update(message);
        }
    }

    pub fn submit(&mut self) {
        let platform = self.composer.platform();
        match self
            .driver
            .send_manual(platform, self.composer.text(), self.composer.customer())
        {
            Ok(()) => {}
            Err(InboxError::Validation) => {
                self.dialog = Some(Dialog::warning(dialog::EMPTY_INPUT_WARNING));
            }
            Err(e) => warn!("Error sending message: {}", e),
        }
    }

    pub fn request_clear(&mut self) {
        self.dialog = Some(Dialog::ConfirmClear);
    }

    pub fn answer_clear(&mut self, confirmed: bool) {
        self.dialog = None;
        match self.driver.clear_all(confirmed) {
            Ok(()) => {}
            Err(InboxError::UserAborted) => info!("clear declined"),
            Err(e) => warn!("Error clearing messages: {}", e),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.dialog {
            Some(Dialog::ConfirmClear) => {
                match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('s') => {
                        self.answer_clear(true)
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                        self.answer_clear(false)
                    }
                    _ => {}
                }
                return;
            }
            Some(Dialog::Notice { .. }) => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.dialog = None;
                }
                return;
            }
            None => {}
        }

        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Enter if ctrl || alt => self.submit(),
            KeyCode::Char('s') if ctrl => self.submit(),
            KeyCode::Char('r') if ctrl => self.driver.refresh_now(),
            KeyCode::Char('x') if ctrl => self.request_clear(),
            KeyCode::Char('p') if ctrl => {
                let enabled = !self.driver.auto_generate();
                self.driver.set_auto_generate(enabled);
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.composer.cycle_platform(),
            KeyCode::Up => self.feed.scroll_up(),
            KeyCode::Down => self.feed.scroll_down(),
            KeyCode::Backspace => self.composer.delete_char(),
            KeyCode::Enter => self.composer.add_char('\n'),
            KeyCode::Char(c) if !ctrl => self.composer.add_char(c),
            _ => {}
        }
    }

    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut updates = self
            .updates
            .take()
            .context("the dashboard is already running")?;
        self.start();

        let mut frames = tokio::time::interval(FRAME_INTERVAL);
        let result = loop {
            if self.should_quit {
                break Ok(());
            }
            if let Err(e) = terminal.draw(|frame| ui::draw(frame, self)) {
                break Err(e.into());
            }

            tokio::select! {
                _ = frames.tick() => {
                    if let Err(e) = self.poll_input() {
                        break Err(e);
                    }
                }
                Some(update) = updates.recv() => self.handle_update(update),
            }
        };

        self.shutdown();
        self.updates = Some(updates);
        result
    }

    fn poll_input(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }
}
