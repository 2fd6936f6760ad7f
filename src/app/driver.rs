//! The refresh loop: a message cycle, a stats cycle, and the on-demand send
//! and clear actions. Results travel to the UI as [`FeedData`] updates.

use crate::error::{InboxError, InboxResult};
use crate::feeds::{FeedData, InboxApi, Platform};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverSettings {
    pub message_interval: Duration,
    pub stats_interval: Duration,
    pub auto_generate: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            message_interval: Duration::from_millis(5000),
            stats_interval: Duration::from_millis(2000),
            auto_generate: true,
        }
    }
}

/// Owns the two refresh timers. There is at most one of each for the
/// lifetime of the driver.
pub struct LoopDriver {
    api: Arc<dyn InboxApi>,
    tx: mpsc::UnboundedSender<FeedData>,
    settings: DriverSettings,
    auto_generate: Arc<AtomicBool>,
    message_timer: Option<JoinHandle<()>>,
    stats_timer: Option<JoinHandle<()>>,
}

impl LoopDriver {
    pub fn new(
        api: Arc<dyn InboxApi>,
        tx: mpsc::UnboundedSender<FeedData>,
        settings: DriverSettings,
    ) -> Self {
        Self {
            api,
            tx,
            auto_generate: Arc::new(AtomicBool::new(settings.auto_generate)),
            settings,
            message_timer: None,
            stats_timer: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.message_timer.is_some() || self.stats_timer.is_some()
    }

    pub fn auto_generate(&self) -> bool {
        self.auto_generate.load(Ordering::Relaxed)
    }

    /// Toggles the generate step of the message cycle; fetching continues.
    pub fn set_auto_generate(&self, enabled: bool) {
        self.auto_generate.store(enabled, Ordering::Relaxed);
        info!(enabled, "auto-generate toggled");
    }

    /// Start both cycles. Calling it again while running does nothing.
    pub fn start(&mut self) {
        if self.message_timer.is_none() {
            let api = Arc::clone(&self.api);
            let tx = self.tx.clone();
            let period = self.settings.message_interval;
            let auto_generate = Arc::clone(&self.auto_generate);
            self.message_timer = Some(tokio::spawn(async move {
                message_cycle(api, tx, period, auto_generate).await;
            }));
        }

        if self.stats_timer.is_none() {
            let api = Arc::clone(&self.api);
            let tx = self.tx.clone();
            let period = self.settings.stats_interval;
            self.stats_timer = Some(tokio::spawn(async move {
                stats_cycle(api, tx, period).await;
            }));
        }

        info!(
            message_interval_ms = self.settings.message_interval.as_millis() as u64,
            stats_interval_ms = self.settings.stats_interval.as_millis() as u64,
            "refresh loop started"
        );
    }

    /// Fetch and render now, outside the regular cadence.
    pub fn refresh_now(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            refresh_messages(api.as_ref(), &tx).await;
        });
    }

    /// Rejects blank input without touching the network; otherwise sends in
    /// the background and reports [`FeedData::Sent`] or
    /// [`FeedData::SendFailed`], followed by a refresh on success.
    pub fn send_manual(&self, platform: Platform, text: &str, customer: &str) -> InboxResult<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InboxError::Validation);
        }

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let text = text.to_string();
        let customer = customer.to_string();
        tokio::spawn(async move {
            match api.send_message(platform, &text, &customer).await {
                Ok(()) => {
                    info!(%platform, "manual message sent");
                    emit(&tx, FeedData::Sent);
                    refresh_messages(api.as_ref(), &tx).await;
                }
                Err(e) => {
                    warn!("Error sending message: {}", e);
                    emit(&tx, FeedData::SendFailed(e.to_string()));
                }
            }
        });
        Ok(())
    }

    /// Destructive; `confirmed` must come from an explicit user answer.
    pub fn clear_all(&self, confirmed: bool) -> InboxResult<()> {
        if !confirmed {
            return Err(InboxError::UserAborted);
        }

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match api.clear_all().await {
                Ok(()) => {
                    info!("message store cleared");
                    refresh_messages(api.as_ref(), &tx).await;
                    emit(&tx, FeedData::Cleared);
                }
                Err(e) => {
                    warn!("Error clearing messages: {}", e);
                    emit(&tx, FeedData::ClearFailed(e.to_string()));
                }
            }
        });
        Ok(())
    }

    /// Stop both timers. In-flight one-off actions are left to finish.
    pub fn shutdown(&mut self) {
        for handle in [self.message_timer.take(), self.stats_timer.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

impl Drop for LoopDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn emit(tx: &mpsc::UnboundedSender<FeedData>, data: FeedData) {
    // The receiver only goes away on teardown.
    let _ = tx.send(data);
}

/// Refresh failures never stop the loop; the next tick is a fresh attempt.
fn log_refresh_error(action: &str, e: &InboxError) {
    if e.is_transient() {
        warn!("Error {}: {}", action, e);
    } else {
        error!("Unexpected error {}: {}", action, e);
    }
}

async fn message_cycle(
    api: Arc<dyn InboxApi>,
    tx: mpsc::UnboundedSender<FeedData>,
    period: Duration,
    auto_generate: Arc<AtomicBool>,
) {
    refresh_messages(api.as_ref(), &tx).await;

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if auto_generate.load(Ordering::Relaxed) {
            match api.request_auto_generate().await {
                Ok(()) => {}
                // Backend unreachable: a refetch would fail the same way.
                Err(e @ InboxError::Network(_)) => {
                    log_refresh_error("generating message", &e);
                    continue;
                }
                // The backend answered, so its store is still readable.
                Err(e) => log_refresh_error("generating message", &e),
            }
        }

        refresh_messages(api.as_ref(), &tx).await;
    }
}

async fn stats_cycle(api: Arc<dyn InboxApi>, tx: mpsc::UnboundedSender<FeedData>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        refresh_stats(api.as_ref(), &tx).await;
    }
}

/// Fetch the full message snapshot, hand it to the UI, then refresh stats.
/// A failed fetch leaves whatever the UI is showing untouched.
async fn refresh_messages(api: &dyn InboxApi, tx: &mpsc::UnboundedSender<FeedData>) {
    match api.fetch_messages().await {
        Ok(messages) => {
            debug!(count = messages.len(), "messages refreshed");
            emit(tx, FeedData::Messages(messages));
            refresh_stats(api, tx).await;
        }
        Err(e) => log_refresh_error("loading messages", &e),
    }
}

async fn refresh_stats(api: &dyn InboxApi, tx: &mpsc::UnboundedSender<FeedData>) {
    match api.fetch_stats().await {
        Ok(stats) => emit(tx, FeedData::Stats(stats)),
        Err(e) => log_refresh_error("loading stats", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::testing::{customer_message, FakeInbox};

    fn driver_with(fake: Arc<FakeInbox>) -> (LoopDriver, mpsc::UnboundedReceiver<FeedData>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api: Arc<dyn InboxApi> = fake;
        (LoopDriver::new(api, tx, DriverSettings::default()), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<FeedData>) -> Vec<FeedData> {
        let mut out = Vec::new();
        while let Ok(message) = rx.try_recv() {
            out.push(message);
        }
        out
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fetches_immediately() {
        let fake = Arc::new(FakeInbox::with_messages(vec![customer_message(1)]));
        let (mut driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.start();
        settle().await;

        assert_eq!(fake.calls(), vec!["messages", "stats"]);
        let updates = drain(&mut rx);
        assert!(matches!(&updates[0], FeedData::Messages(list) if list.len() == 1));
        assert!(matches!(updates[1], FeedData::Stats(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let fake = Arc::new(FakeInbox::default());
        let (mut driver, _rx) = driver_with(Arc::clone(&fake));
        driver.start();
        driver.start();
        settle().await;
        assert_eq!(fake.count("messages"), 1);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        // initial + after-message refresh + one stats tick
        assert_eq!(fake.count("stats"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycles_follow_their_cadence() {
        let fake = Arc::new(FakeInbox::default());
        let (mut driver, _rx) = driver_with(Arc::clone(&fake));
        driver.start();
        tokio::time::sleep(Duration::from_millis(5100)).await;

        assert_eq!(fake.count("generate"), 1);
        assert_eq!(fake.count("messages"), 2);
        // start, 2000ms, 4000ms, after the 5000ms message cycle
        assert_eq!(fake.count("stats"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_completes_before_refetch() {
        let fake = Arc::new(FakeInbox::default());
        let (mut driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.start();
        tokio::time::sleep(Duration::from_millis(5100)).await;

        let calls: Vec<&str> = fake
            .calls()
            .into_iter()
            .filter(|c| *c != "stats")
            .collect();
        assert_eq!(calls, vec!["messages", "generate", "messages"]);

        let lists: Vec<usize> = drain(&mut rx)
            .into_iter()
            .filter_map(|d| match d {
                FeedData::Messages(list) => Some(list.len()),
                _ => None,
            })
            .collect();
        assert_eq!(lists, vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_generate_still_refreshes() {
        let fake = Arc::new(FakeInbox {
            fail_generate: true,
            ..FakeInbox::with_messages(vec![customer_message(1)])
        });
        let (mut driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.start();
        settle().await;
        fake.store.lock().unwrap().push(customer_message(2));
        tokio::time::sleep(Duration::from_millis(30_100)).await;

        assert_eq!(fake.count("generate"), 6);
        assert_eq!(fake.count("messages"), 7);
        let last = drain(&mut rx)
            .into_iter()
            .filter_map(|d| match d {
                FeedData::Messages(list) => Some(list.len()),
                _ => None,
            })
            .last();
        assert_eq!(last, Some(2));
        assert!(driver.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_stats_keep_cycles_running() {
        let fake = Arc::new(FakeInbox::default());
        fake.fail_stats.store(true, Ordering::SeqCst);
        let (mut driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.start();
        tokio::time::sleep(Duration::from_millis(10_100)).await;

        // start, then 2s ticks to 10s, plus two after-message refreshes
        assert_eq!(fake.count("stats"), 8);
        assert_eq!(fake.count("messages"), 3);
        let updates = drain(&mut rx);
        assert!(updates.iter().all(|d| matches!(d, FeedData::Messages(_))));
        assert_eq!(updates.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_auto_generate_still_fetches() {
        let fake = Arc::new(FakeInbox::default());
        let (mut driver, _rx) = driver_with(Arc::clone(&fake));
        driver.set_auto_generate(false);
        driver.start();
        tokio::time::sleep(Duration::from_millis(10_100)).await;

        assert_eq!(fake.count("generate"), 0);
        assert_eq!(fake.count("messages"), 3);
        assert!(!driver.auto_generate());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_send_issues_no_request() {
        let fake = Arc::new(FakeInbox::default());
        let (driver, mut rx) = driver_with(Arc::clone(&fake));

        for input in ["", "   ", "\n\t "] {
            let err = driver
                .send_manual(Platform::WhatsApp, input, "Usuario Demo")
                .unwrap_err();
            assert!(matches!(err, InboxError::Validation));
        }
        settle().await;
        assert!(fake.calls().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_refresh_includes_message() {
        let fake = Arc::new(FakeInbox::default());
        let (driver, mut rx) = driver_with(Arc::clone(&fake));
        driver
            .send_manual(Platform::WhatsApp, "  Hola ", "Usuario Demo")
            .unwrap();
        settle().await;

        assert_eq!(fake.calls(), vec!["send", "messages", "stats"]);
        let updates = drain(&mut rx);
        assert!(matches!(updates[0], FeedData::Sent));
        match &updates[1] {
            FeedData::Messages(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].content, "Hola");
                assert_eq!(list[0].customer, "Usuario Demo");
            }
            other => panic!("expected messages, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_send_reports_without_refresh() {
        let fake = Arc::new(FakeInbox {
            fail_send: true,
            ..FakeInbox::default()
        });
        let (driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.send_manual(Platform::Facebook, "Hola", "Usuario Demo").unwrap();
        settle().await;

        assert_eq!(fake.calls(), vec!["send"]);
        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], FeedData::SendFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_clear_is_aborted() {
        let fake = Arc::new(FakeInbox::with_messages(vec![customer_message(1)]));
        let (driver, _rx) = driver_with(Arc::clone(&fake));
        let err = driver.clear_all(false).unwrap_err();
        assert!(matches!(err, InboxError::UserAborted));
        settle().await;
        assert!(fake.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmed_clear_refreshes_then_notifies() {
        let fake = Arc::new(FakeInbox::with_messages(vec![customer_message(1)]));
        let (driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.clear_all(true).unwrap();
        settle().await;

        assert_eq!(fake.calls(), vec!["clear", "messages", "stats"]);
        let updates = drain(&mut rx);
        assert!(matches!(&updates[0], FeedData::Messages(list) if list.is_empty()));
        assert!(matches!(updates.last(), Some(FeedData::Cleared)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_clear_leaves_state() {
        let fake = Arc::new(FakeInbox {
            fail_clear: true,
            ..FakeInbox::with_messages(vec![customer_message(1)])
        });
        let (driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.clear_all(true).unwrap();
        settle().await;

        let updates = drain(&mut rx);
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], FeedData::ClearFailed(_)));
        assert_eq!(fake.store.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_swallowed() {
        let fake = Arc::new(FakeInbox {
            fail_messages: true,
            ..FakeInbox::default()
        });
        let (mut driver, mut rx) = driver_with(Arc::clone(&fake));
        driver.start();
        tokio::time::sleep(Duration::from_millis(5100)).await;

        // The loop keeps ticking; only stats ever reach the UI.
        assert_eq!(fake.count("messages"), 2);
        assert!(drain(&mut rx)
            .iter()
            .all(|d| matches!(d, FeedData::Stats(_))));
        assert!(driver.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timers() {
        let fake = Arc::new(FakeInbox::default());
        let (mut driver, _rx) = driver_with(Arc::clone(&fake));
        driver.start();
        settle().await;
        driver.shutdown();
        assert!(!driver.is_running());

        let before = fake.calls().len();
        tokio::time::sleep(Duration::from_millis(12_000)).await;
        assert_eq!(fake.calls().len(), before);
    }
}
