//! Decoding of `/api/messages` and `/api/stats` bodies.
//!
//! Two record vocabularies are in circulation: the dashboard one
//! (`type`, `customer`, `time`, `content`, `icon`) and the backend's storage one
//! (`role`, `user`, `timestamp`, `text`, `seq`). Both decode to [`Message`].

use super::{Message, Platform, SenderType, StatsSnapshot};
use crate::error::InboxResult;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

const ANONYMOUS: &str = "Anónimo";
const NO_TIME: &str = "--:--";
const BOT_ICON: &str = "🤖";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessagesBody {
    Bare(Vec<WireMessage>),
    Envelope { messages: Vec<WireMessage> },
}

#[derive(Debug, Default, Deserialize)]
struct WireMessage {
    #[serde(default)]
    seq: Option<Value>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    sender_name: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

pub fn decode_messages(body: &str) -> InboxResult<Vec<Message>> {
    let records = match serde_json::from_str::<MessagesBody>(body)? {
        MessagesBody::Bare(records) => records,
        MessagesBody::Envelope { messages } => messages,
    };

    let mut messages: Vec<Message> = records.into_iter().map(Message::from).collect();

    // Only reorder when every record carries a sequence number; otherwise the
    // server's arrival order is the best information we have.
    if messages.iter().all(|m| m.seq.is_some()) {
        messages.sort_by_key(|m| m.seq);
    }

    Ok(messages)
}

pub fn decode_stats(body: &str) -> InboxResult<StatsSnapshot> {
    Ok(serde_json::from_str(body)?)
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        let platform = wire
            .platform
            .as_deref()
            .map(Platform::from_label)
            .unwrap_or(Platform::Unknown);

        let sender = match wire.kind.as_deref().or(wire.role.as_deref()) {
            Some(kind) if is_bot_kind(kind) => SenderType::Bot,
            _ => SenderType::Customer,
        };

        let customer = first_present([wire.customer, wire.user, wire.sender_name])
            .unwrap_or_else(|| ANONYMOUS.to_string());

        let time = first_present([wire.time, wire.timestamp])
            .map(|raw| display_time(&raw))
            .unwrap_or_else(|| NO_TIME.to_string());

        let content = first_present([wire.content, wire.text, wire.message]).unwrap_or_default();

        let icon = wire
            .icon
            .filter(|icon| !icon.trim().is_empty())
            .unwrap_or_else(|| match sender {
                SenderType::Bot => BOT_ICON.to_string(),
                SenderType::Customer => platform.default_icon().to_string(),
            });

        Message {
            seq: wire.seq.as_ref().and_then(parse_seq),
            platform,
            sender,
            customer,
            time,
            content,
            icon,
        }
    }
}

fn is_bot_kind(kind: &str) -> bool {
    matches!(
        kind.trim().to_lowercase().as_str(),
        "bot" | "system" | "auto" | "assistant"
    )
}

fn first_present<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
}

fn parse_seq(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Shorten full timestamps to `HH:MM`; anything else is assumed to be
/// display-ready already.
fn display_time(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%H:%M").to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, pattern) {
            return ts.format("%H:%M").to_string();
        }
    }
    raw.to_string()
}
