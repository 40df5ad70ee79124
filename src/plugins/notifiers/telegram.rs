use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::TelegramConfig;
use crate::plugins::traits::{Notification, NotificationResult, NotifierError, NotifierPlugin};

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

/// Bot API `sendMessage`; the item owner is the chat id.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(api_base: impl Into<String>, bot_token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    /// `None` when Telegram is switched off or has no token.
    pub fn from_config(config: &TelegramConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let token = config.bot_token.as_deref().filter(|t| !t.trim().is_empty())?;
        Some(Self::new(config.api_base.clone(), token))
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn send(&self, owner: &str, notification: &Notification) -> Result<NotificationResult, NotifierError> {
        let payload = json!({
            "chat_id": owner,
            "text": notification.message(),
            "disable_web_page_preview": false,
        });

        let response = self.client.post(self.endpoint()).json(&payload).send().await?;
        let status = response.status();
        let body: ApiResponse = response.json().await?;

        if !status.is_success() || !body.ok {
            let reason = body
                .description
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            tracing::warn!(owner, error = %reason, "telegram rejected message");
            return Ok(NotificationResult::rejected(reason));
        }

        Ok(NotificationResult::delivered(
            body.result.map(|m| format!("telegram-{}", m.message_id)),
        ))
    }
}
