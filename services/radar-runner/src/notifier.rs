//! Notification transport
//!
//! Delivery is best-effort. Callers log failures; alert state never depends
//! on the outcome.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::alerts::Alert;
use crate::config::TelegramConfig;
use crate::error::RadarError;

/// Sends text messages to a chat
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, text: &str) -> Result<(), RadarError>;

    /// Send a fired alert
    async fn notify(&self, alert: &Alert) -> Result<(), RadarError> {
        self.send_text(&alert.message()).await
    }

    fn name(&self) -> &str;
}

/// Telegram Bot API transport
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn send_message_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, text: &str) -> Result<(), RadarError> {
        let payload = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| RadarError::TransportFailure(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RadarError::TransportFailure(format!(
                "Telegram sendMessage failed: {} - {}",
                status, body
            )));
        }

        debug!("Telegram message sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// Writes alerts to the log only; used when no chat is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_text(&self, text: &str) -> Result<(), RadarError> {
        info!(message = %text, "NOTIFY");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
