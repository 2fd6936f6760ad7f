use super::wire::{decode_messages, decode_stats};
use super::{InboxApi, Message, Platform, StatsSnapshot};
use crate::error::{InboxError, InboxResult};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const MESSAGES_PATH: &str = "/api/messages";
const STATS_PATH: &str = "/api/stats";
const GENERATE_PATH: &str = "/api/generate";
const SEND_PATH: &str = "/api/send";
const CLEAR_PATH: &str = "/api/clear";

pub struct HttpInbox {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    platform: &'a str,
    message: &'a str,
    customer: &'a str,
    // The reference backend reads the sender from `user`.
    user: &'a str,
}

impl HttpInbox {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oneinbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &'static str) -> InboxResult<String> {
        let response = self.client.get(self.url(path)).send().await?;
        let response = ensure_success(path, response)?;
        Ok(response.text().await?)
    }
}

fn ensure_success(
    endpoint: &'static str,
    response: reqwest::Response,
) -> InboxResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(InboxError::Status {
            endpoint,
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl InboxApi for HttpInbox {
    async fn fetch_messages(&self) -> InboxResult<Vec<Message>> {
        let body = self.get_text(MESSAGES_PATH).await?;
        let messages = decode_messages(&body)?;
        debug!(count = messages.len(), "fetched messages");
        Ok(messages)
    }

    async fn fetch_stats(&self) -> InboxResult<StatsSnapshot> {
        let body = self.get_text(STATS_PATH).await?;
        decode_stats(&body)
    }

    async fn send_message(
        &self,
        platform: Platform,
        content: &str,
        customer: &str,
    ) -> InboxResult<()> {
        let request = SendRequest {
            platform: platform.label(),
            message: content,
            customer,
            user: customer,
        };

        let response = self
            .client
            .post(self.url(SEND_PATH))
            .json(&request)
            .send()
            .await?;
        ensure_success(SEND_PATH, response)?;
        debug!(%platform, customer, "message accepted");
        Ok(())
    }

    async fn request_auto_generate(&self) -> InboxResult<()> {
        let response = self.client.get(self.url(GENERATE_PATH)).send().await?;
        ensure_success(GENERATE_PATH, response)?;
        Ok(())
    }

    async fn clear_all(&self) -> InboxResult<()> {
        let response = self.client.post(self.url(CLEAR_PATH)).send().await?;
        ensure_success(CLEAR_PATH, response)?;
        Ok(())
    }
}
