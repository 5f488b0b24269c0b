// src/services/telegram.rs

//! Telegram Bot API transport.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::NotifierConfig;
use crate::services::Notifier;
use crate::utils::http::create_api_client;
use crate::utils::truncate_chars;

/// Sends messages through `sendMessage` to one chat.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
    disable_link_preview: bool,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

impl TelegramNotifier {
    /// Build from configuration. Token and chat id must be present.
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let token = config
            .bot_token
            .as_deref()
            .ok_or_else(|| AppError::config("missing required settings: TELEGRAM_BOT_TOKEN"))?;
        let chat_id = config
            .chat_id
            .clone()
            .ok_or_else(|| AppError::config("missing required settings: TELEGRAM_CHAT_ID"))?;

        Ok(Self {
            client: create_api_client(config.timeout_secs)?,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                token
            ),
            chat_id,
            disable_link_preview: config.disable_link_preview,
        })
    }

    /// Send one message, reporting why it failed.
    pub async fn send(&self, message: &str) -> Result<()> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "HTML",
            disable_web_page_preview: self.disable_link_preview,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .form(&payload)
            .send()
            .await
            .map_err(|e| AppError::transport(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::transport(format!(
            "sendMessage returned {}: {}",
            status.as_u16(),
            truncate_chars(&body, 200)
        )))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> bool {
        match self.send(message).await {
            Ok(()) => {
                log::info!("Message delivered");
                true
            }
            Err(e) => {
                log::error!("Message delivery failed: {}", e);
                false
            }
        }
    }
}
