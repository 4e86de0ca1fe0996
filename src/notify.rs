//! # notify — outbound breach notifications
//!
//! One preconfigured recipient, best effort.  [`TelegramNotifier`] when a bot
//! token and chat id are configured, [`LogNotifier`] otherwise.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::MonitorError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), MonitorError>;
}

// ─── Telegram ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id:    &'a str,
    text:       &'a str,
    parse_mode: &'a str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok:          bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramNotifier {
    client:  reqwest::Client,
    api_url: String,
    token:   String,
    chat_id: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        client: reqwest::Client,
        api_url: &str,
        token: &str,
        chat_id: &str,
        timeout: Duration,
    ) -> Self {
        info!("📱 Telegram notifier enabled (chat_id={chat_id})");
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), MonitorError> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let body = SendMessage {
            chat_id:    &self.chat_id,
            text,
            parse_mode: "Markdown",
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MonitorError::NotifyFailed(format!("Telegram unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(MonitorError::NotifyFailed(format!("Telegram HTTP {status}: {text}")));
        }

        let data: TelegramResponse = resp
            .json()
            .await
            .map_err(|e| MonitorError::NotifyFailed(format!("Telegram response parse error: {e}")))?;

        if !data.ok {
            return Err(MonitorError::NotifyFailed(format!(
                "Telegram rejected message: {}",
                data.description.unwrap_or_default()
            )));
        }

        info!("📤 Sent Telegram message");
        Ok(())
    }
}

// ─── Log only ─────────────────────────────────────────────────────────────────

/// Fallback when Telegram credentials are not set.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> Result<(), MonitorError> {
        info!(message = %text, "🔔 Notification (Telegram not configured)");
        Ok(())
    }
}
