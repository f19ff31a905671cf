//! Telegram Bot API notifier.
//!
//! Delivers plain-text messages via the Bot API `sendMessage` endpoint.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

use super::Notifier;
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Telegram rejects longer messages
const MAX_MESSAGE_CHARS: usize = 4096;

#[derive(Clone)]
pub struct TelegramNotifier {
    api_url: String,
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TelegramNotifier")
            .field("api_url", &self.api_url)
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let bot_token = normalize_text_option(Some(bot_token.into())).ok_or_else(|| {
            Error::InvalidInput("Telegram bot token must not be empty".to_string())
        })?;
        let chat_id = normalize_text_option(Some(chat_id.into()))
            .ok_or_else(|| Error::InvalidInput("Telegram chat id must not be empty".to_string()))?;

        Ok(Self {
            api_url: TELEGRAM_API_URL.to_string(),
            bot_token,
            chat_id,
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
        })
    }

    /// Point the notifier at a different Bot API host
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.bot_token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": clamp_message(text),
        });

        tracing::debug!(chat_id = %self.chat_id, "Sending Telegram message");

        // The request URL embeds the bot token; keep it out of transport errors.
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if payload.get("ok") == Some(&Value::Bool(true)) {
            return Ok(());
        }

        Err(Error::Notify(describe_failure(status, &payload)))
    }
}

fn clamp_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut clamped: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    clamped.push('…');
    clamped
}

fn describe_failure(status: StatusCode, payload: &Value) -> String {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = payload
            .get("parameters")
            .and_then(|parameters| parameters.get("retry_after"))
            .and_then(Value::as_u64)
            .unwrap_or(30);
        return format!("rate limited, retry after {retry_after}s");
    }

    let description = payload
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("unknown Telegram API error");
    format!("{description} ({})", status.as_u16())
}
