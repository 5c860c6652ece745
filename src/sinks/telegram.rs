//! Telegram Bot API notifier.
//!
//! Sends chunks via `sendMessage` with HTML parse mode. Transient failures
//! are retried with exponential backoff and jitter; a chunk that still
//! fails after the retry budget surfaces as a [`SinkError`], which the
//! aggregator logs before moving on to the next chunk.
//!
//! # Retry Strategy
//!
//! - Up to 3 attempts per chunk (`--notify-retries`)
//! - Exponential backoff starting at 500ms
//! - Random jitter (0-250ms) added to each delay

use crate::error::SinkError;
use crate::sinks::Notifier;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use rand::{Rng, rng};
use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
    max_attempts: u8,
    base_delay: Duration,
}

impl TelegramNotifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            bot_token,
            chat_id,
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retries(mut self, attempts: u8) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    fn send_url(&self) -> String {
        format!("{API_BASE}/bot{}/sendMessage", self.bot_token)
    }

    async fn try_send(&self, text: &str) -> Result<(), SinkError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let resp = self
            .client
            .post(self.send_url())
            .json(&payload)
            .send()
            .await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(SinkError::Api {
                status: status.as_u16(),
                message: truncate_for_log(&body, 512),
            })
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
    async fn send(&self, text: &str) -> Result<(), SinkError> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.try_send(text).await {
                Ok(()) => {
                    info!(attempt, "Notifier message delivered");
                    return Ok(());
                }
                Err(e) if attempt < self.max_attempts => {
                    let backoff = self.base_delay.saturating_mul(1 << (attempt - 1));
                    let jitter = Duration::from_millis(rng().random_range(0..=250));
                    warn!(attempt, error = %e, ?backoff, "Notifier send failed; backing off");
                    sleep(backoff + jitter).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_url_embeds_bot_token() {
        let n = TelegramNotifier::new("123:abc".to_string(), "42".to_string());
        assert_eq!(n.send_url(), "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[test]
    fn retry_budget_never_drops_below_one() {
        let n = TelegramNotifier::new("t".into(), "c".into()).with_retries(0);
        assert_eq!(n.max_attempts, 1);
    }

    #[test]
    fn payload_serializes_html_parse_mode() {
        let payload = SendMessage {
            chat_id: "42",
            text: "hello",
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(json["chat_id"], "42");
        assert_eq!(json["disable_web_page_preview"], true);
    }
}
