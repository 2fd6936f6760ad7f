//! Non-interactive subcommands. Each one talks to the backend once and prints
//! a plain-text result.

use crate::error::InboxError;
use crate::feeds::{recent_window, InboxApi, Platform};
use crate::ui::counters::Stat;
use crate::ui::widgets::dialog::CLEAR_DONE;
use crate::ui::widgets::feed::EMPTY_STATE;
use anyhow::Result;
use std::io::Write;
use tracing::info;

pub async fn send<W: Write>(
    api: &dyn InboxApi,
    platform: Platform,
    customer: &str,
    text: &str,
    out: &mut W,
) -> Result<()> {
    let content = text.trim();
    if content.is_empty() {
        return Err(InboxError::Validation.into());
    }
    api.send_message(platform, content, customer).await?;
    info!("sent message via {} as {}", platform, customer);
    writeln!(out, "✅ ENVIADO! ({} · {})", platform, customer)?;
    Ok(())
}

/// Deleting everything is irreversible, so it needs `confirmed`.
pub async fn clear<W: Write>(api: &dyn InboxApi, confirmed: bool, out: &mut W) -> Result<()> {
    if !confirmed {
        return Err(InboxError::UserAborted.into());
    }
    api.clear_all().await?;
    info!("all messages cleared");
    writeln!(out, "{}", CLEAR_DONE)?;
    Ok(())
}

pub async fn stats<W: Write>(api: &dyn InboxApi, out: &mut W) -> Result<()> {
    let snapshot = api.fetch_stats().await?;
    for stat in Stat::ALL {
        writeln!(out, "{:<10} {}", stat.label(), stat.value_in(&snapshot))?;
    }
    Ok(())
}

pub async fn messages<W: Write>(api: &dyn InboxApi, limit: usize, out: &mut W) -> Result<()> {
    let messages = api.fetch_messages().await?;
    if messages.is_empty() {
        writeln!(out, "{}", EMPTY_STATE.headline)?;
        return Ok(());
    }
    for message in recent_window(&messages, limit) {
        let badge = if message.is_bot() { " [AUTO]" } else { "" };
        writeln!(
            out,
            "[{}] {} {} ({}){}: {}",
            message.time, message.icon, message.customer, message.platform, badge, message.content
        )?;
    }
    Ok(())
}
