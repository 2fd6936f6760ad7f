pub mod inbox;
pub mod wire;

use crate::error::InboxResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An update sent from the refresh loop to the UI.
#[derive(Debug, Clone)]
pub enum FeedData {
    Messages(Vec<Message>),
    Stats(StatsSnapshot),
    Sent,
    SendFailed(String),
    Cleared,
    ClearFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    #[default]
    #[serde(alias = "whatsapp")]
    WhatsApp,
    #[serde(alias = "facebook")]
    Facebook,
    #[serde(alias = "instagram")]
    Instagram,
    #[serde(rename = "Desconocido")]
    Unknown,
}

impl Platform {
    /// Platforms a user can pick in the simulator.
    pub const SELECTABLE: [Platform; 3] =
        [Platform::WhatsApp, Platform::Instagram, Platform::Facebook];

    pub fn label(self) -> &'static str {
        match self {
            Platform::WhatsApp => "WhatsApp",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::Unknown => "Desconocido",
        }
    }

    /// Lenient match used for server payloads: anything unrecognised is `Unknown`.
    pub fn from_label(raw: &str) -> Self {
        raw.parse().unwrap_or(Platform::Unknown)
    }

    pub fn default_icon(self) -> &'static str {
        match self {
            Platform::WhatsApp => "📱",
            Platform::Facebook => "📘",
            Platform::Instagram => "📸",
            Platform::Unknown => "💬",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Platform::WhatsApp => Platform::Instagram,
            Platform::Instagram => Platform::Facebook,
            Platform::Facebook | Platform::Unknown => Platform::WhatsApp,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whatsapp" | "wa" => Ok(Platform::WhatsApp),
            "facebook" | "fb" | "messenger" => Ok(Platform::Facebook),
            "instagram" | "ig" => Ok(Platform::Instagram),
            other => Err(format!(
                "unknown platform '{}' (expected whatsapp, instagram or facebook)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderType {
    Customer,
    Bot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Server sequence number, when the backend provides one.
    pub seq: Option<u64>,
    pub platform: Platform,
    pub sender: SenderType,
    pub customer: String,
    pub time: String,
    pub content: String,
    pub icon: String,
}

impl Message {
    pub fn is_bot(&self) -> bool {
        self.sender == SenderType::Bot
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsSnapshot {
    pub total: u64,
    pub whatsapp: u64,
    pub instagram: u64,
    pub facebook: u64,
}

/// The newest `window` messages, oldest first. Expects `messages` to be in
/// arrival order.
pub fn recent_window(messages: &[Message], window: usize) -> &[Message] {
    let start = messages.len().saturating_sub(window);
    &messages[start..]
}

/// The backend collaborator. Every call either completes or fails; none of
/// them retry.
#[async_trait]
pub trait InboxApi: Send + Sync {
    async fn fetch_messages(&self) -> InboxResult<Vec<Message>>;

    async fn fetch_stats(&self) -> InboxResult<StatsSnapshot>;

    async fn send_message(
        &self,
        platform: Platform,
        content: &str,
        customer: &str,
    ) -> InboxResult<()>;

    /// Ask the backend to synthesize one customer message (and its reply).
    async fn request_auto_generate(&self) -> InboxResult<()>;

    async fn clear_all(&self) -> InboxResult<()>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::error::InboxError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    pub fn customer_message(idx: usize) -> Message {
        Message {
            seq: Some(idx as u64),
            platform: Platform::WhatsApp,
            sender: SenderType::Customer,
            customer: format!("Cliente {}", idx),
            time: "10:00".to_string(),
            content: format!("Mensaje {}", idx),
            icon: "📱".to_string(),
        }
    }

    /// In-memory backend that records every call it receives.
    #[derive(Default)]
    pub struct FakeInbox {
        pub store: Mutex<Vec<Message>>,
        pub stats: Mutex<StatsSnapshot>,
        pub calls: Mutex<Vec<&'static str>>,
        pub fail_send: bool,
        pub fail_clear: bool,
        pub fail_messages: bool,
        pub fail_generate: bool,
        /// Switchable mid-test, unlike the other failure flags.
        pub fail_stats: AtomicBool,
    }

    impl FakeInbox {
        pub fn with_messages(messages: Vec<Message>) -> Self {
            Self {
                store: Mutex::new(messages),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn failure(endpoint: &'static str) -> InboxError {
            InboxError::Status {
                endpoint,
                status: 500,
            }
        }
    }

    #[async_trait]
    impl InboxApi for FakeInbox {
        async fn fetch_messages(&self) -> InboxResult<Vec<Message>> {
            self.record("messages");
            if self.fail_messages {
                return Err(Self::failure("/api/messages"));
            }
            Ok(self.store.lock().unwrap().clone())
        }

        async fn fetch_stats(&self) -> InboxResult<StatsSnapshot> {
            self.record("stats");
            if self.fail_stats.load(Ordering::SeqCst) {
                return Err(Self::failure("/api/stats"));
            }
            Ok(*self.stats.lock().unwrap())
        }

        async fn send_message(
            &self,
            platform: Platform,
            content: &str,
            customer: &str,
        ) -> InboxResult<()> {
            self.record("send");
            if self.fail_send {
                return Err(Self::failure("/api/send"));
            }
            let mut store = self.store.lock().unwrap();
            let seq = store.len() as u64;
            store.push(Message {
                seq: Some(seq),
                platform,
                sender: SenderType::Customer,
                customer: customer.to_string(),
                time: "12:00".to_string(),
                content: content.to_string(),
                icon: platform.default_icon().to_string(),
            });
            Ok(())
        }

        async fn request_auto_generate(&self) -> InboxResult<()> {
            self.record("generate");
            if self.fail_generate {
                return Err(Self::failure("/api/generate"));
            }
            let mut store = self.store.lock().unwrap();
            let next = store.len();
            store.push(customer_message(next));
            Ok(())
        }

        async fn clear_all(&self) -> InboxResult<()> {
            self.record("clear");
            if self.fail_clear {
                return Err(Self::failure("/api/clear"));
            }
            self.store.lock().unwrap().clear();
            Ok(())
        }
    }
}
