use async_trait::async_trait;

use crate::plugins::traits::{Notification, NotificationResult, NotifierError, NotifierPlugin};

/// Writes alerts to the log. Registered when no transport is configured so
/// restocks are still visible.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotifierPlugin for LogNotifier {
    fn name(&self) -> &str {
        "Log Notifier"
    }

    fn plugin_type(&self) -> &str {
        "log"
    }

    async fn send(&self, owner: &str, notification: &Notification) -> Result<NotificationResult, NotifierError> {
        tracing::info!(
            owner,
            item_id = %notification.item_id,
            url = %notification.url,
            price = %notification.price,
            "{}",
            notification.title()
        );
        Ok(NotificationResult::delivered(None))
    }
}
