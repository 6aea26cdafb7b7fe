// src/connectors/telegram.rs
use crate::connectors::traits::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use tracing::info;

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram Bot API notifier posting to a single chat.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    http_client: Client,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            bot_token,
            chat_id,
            http_client,
            api_base: TELEGRAM_API.to_string(),
        }
    }

    /// Points the notifier at another Bot API host (self-hosted server, tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, message: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        let resp = self
            .http_client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !resp.status().is_success() {
            let err = resp.text().await.map_err(reqwest::Error::without_url)?;
            anyhow::bail!("Telegram sendMessage failed: {err}");
        }

        info!(chat_id = %self.chat_id, "Telegram message sent");
        Ok(())
    }

    async fn send_image(&self, image: Vec<u8>, caption: &str) -> Result<()> {
        let part = Part::bytes(image).file_name("chart.png");
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", "Markdown")
            .part("photo", part);

        let resp = self
            .http_client
            .post(self.api_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !resp.status().is_success() {
            let err = resp.text().await.map_err(reqwest::Error::without_url)?;
            anyhow::bail!("Telegram sendPhoto failed: {err}");
        }

        info!(chat_id = %self.chat_id, "Telegram photo sent");
        Ok(())
    }
}
