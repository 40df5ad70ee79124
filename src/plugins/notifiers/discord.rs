use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use crate::config::DiscordConfig;
use crate::models::StockStatus;
use crate::plugins::traits::{Notification, NotificationResult, NotifierError, NotifierPlugin};

pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>, username: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            client,
            webhook_url: webhook_url.into(),
            username: username.into(),
        }
    }

    pub fn from_config(config: &DiscordConfig) -> Option<Self> {
        let webhook_url = config.webhook_url.as_deref().filter(|u| !u.trim().is_empty())?;
        Some(Self::new(webhook_url, config.username.clone()))
    }

    fn get_embed_color(&self, status: StockStatus) -> u32 {
        match status {
            StockStatus::InStock => 0x00ff00,    // Green
            StockStatus::OutOfStock => 0xff0000, // Red
            StockStatus::Unknown => 0x0099ff,    // Blue
        }
    }

    fn create_embed(&self, notification: &Notification) -> serde_json::Value {
        let mut embed = json!({
            "title": notification.title(),
            "url": notification.url,
            "color": self.get_embed_color(notification.status),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "fields": [
                {
                    "name": "💰 Price",
                    "value": notification.price,
                    "inline": true
                },
                {
                    "name": "📦 Status",
                    "value": notification.status_text,
                    "inline": true
                }
            ],
            "footer": {
                "text": self.username
            }
        });

        if let Some(name) = &notification.product_name {
            embed["description"] = json!(name);
        }
        embed
    }

    fn create_webhook_payload(&self, owner: &str, notification: &Notification) -> serde_json::Value {
        json!({
            "username": self.username,
            "content": format!("<@{}> {}", owner, notification.message()),
            "embeds": [self.create_embed(notification)],
            "allowed_mentions": { "users": [owner] }
        })
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    fn plugin_type(&self) -> &str {
        "discord"
    }

    async fn send(&self, owner: &str, notification: &Notification) -> Result<NotificationResult, NotifierError> {
        let payload = self.create_webhook_payload(owner, notification);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(NotificationResult::delivered(Some(format!(
                "discord-{}",
                chrono::Utc::now().timestamp()
            ))))
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(owner, status = status.as_u16(), "discord webhook rejected message");
            Ok(NotificationResult::rejected(format!("HTTP {}: {}", status.as_u16(), body)))
        }
    }
}
