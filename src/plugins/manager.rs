use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::notifiers::{DiscordNotifier, LogNotifier, TelegramNotifier};
use super::traits::{Notification, NotifierPlugin};
use crate::config::NotificationsConfig;
use crate::utils::error::AppError;

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Registry of delivery channels keyed by plugin type.
#[derive(Clone)]
pub struct PluginManager {
    notifiers: Arc<RwLock<HashMap<String, Arc<dyn NotifierPlugin>>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a notifier plugin, replacing any plugin of the same type.
    pub async fn register_notifier(&self, plugin: NotifierPluginBox) -> Result<(), AppError> {
        let plugin_type = plugin.plugin_type().to_string();
        if plugin_type.is_empty() {
            return Err(AppError::PluginError("Notifier plugin type must not be empty".to_string()));
        }

        tracing::info!(plugin = plugin.name(), "registered notifier");
        let mut notifiers = self.notifiers.write().await;
        notifiers.insert(plugin_type, Arc::from(plugin));
        Ok(())
    }

    pub async fn has_notifier(&self, plugin_type: &str) -> bool {
        let notifiers = self.notifiers.read().await;
        notifiers.contains_key(plugin_type)
    }

    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        let mut types: Vec<String> = notifiers.keys().cloned().collect();
        types.sort();
        types
    }

    /// Registers every configured transport, or the log notifier when none is.
    pub async fn initialize_from_config(&self, config: &NotificationsConfig) -> Result<(), AppError> {
        if let Some(telegram) = TelegramNotifier::from_config(&config.telegram) {
            self.register_notifier(Box::new(telegram)).await?;
        }

        if let Some(discord) = DiscordNotifier::from_config(&config.discord) {
            self.register_notifier(Box::new(discord)).await?;
        }

        if self.notifiers.read().await.is_empty() {
            tracing::warn!("no notification transport configured, restocks will only be logged");
            self.register_notifier(Box::new(LogNotifier::new())).await?;
        }

        Ok(())
    }

    /// Delivers to every registered notifier concurrently. Failures are
    /// logged and swallowed; returns the number of successful deliveries.
    pub async fn send_notification(&self, owner: &str, notification: &Notification) -> usize {
        // The registry lock is not held across deliveries
        let notifiers: Vec<Arc<dyn NotifierPlugin>> = {
            let registry = self.notifiers.read().await;
            registry.values().cloned().collect()
        };

        let deliveries = notifiers.iter().map(|notifier| async move {
            match notifier.send(owner, notification).await {
                Ok(result) if result.success => true,
                Ok(result) => {
                    tracing::warn!(
                        notifier = notifier.plugin_type(),
                        owner,
                        item_id = %notification.item_id,
                        error = result.error.as_deref().unwrap_or("unknown"),
                        "notification was not delivered"
                    );
                    false
                }
                Err(e) => {
                    tracing::warn!(
                        notifier = notifier.plugin_type(),
                        owner,
                        item_id = %notification.item_id,
                        error = %e,
                        "notifier failed"
                    );
                    false
                }
            }
        });

        join_all(deliveries)
            .await
            .into_iter()
            .filter(|delivered| *delivered)
            .count()
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
