use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{CheckResult, StockStatus, TrackedItem};

pub type NotifierError = Box<dyn std::error::Error + Send + Sync>;

/// A restock alert for one tracked item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub item_id: String,
    pub url: String,
    pub status: StockStatus,
    pub price: String,
    pub product_name: Option<String>,
    pub status_text: String,
}

impl Notification {
    pub fn restock(item: &TrackedItem, check: &CheckResult) -> Self {
        Self {
            item_id: item.id.clone(),
            url: item.url.clone(),
            status: check.status,
            price: check.price.clone(),
            product_name: check.product_name.clone(),
            status_text: check.status_text.clone(),
        }
    }

    pub fn title(&self) -> String {
        match &self.product_name {
            Some(name) => format!("{} {} is back in stock!", self.status.emoji(), name),
            None => format!("{} Back in stock!", self.status.emoji()),
        }
    }

    /// Plain-text body shared by every transport. Always carries the price.
    pub fn message(&self) -> String {
        format!(
            "{}\n{}\nPrice: {}\n{}",
            self.title(),
            self.url,
            self.price,
            self.status_text
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// A delivery channel (Telegram, Discord, ...). Delivery is best effort.
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// `owner` is the transport-specific recipient, e.g. a Telegram chat id.
    async fn send(&self, owner: &str, notification: &Notification) -> Result<NotificationResult, NotifierError>;
}
