use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use validator::Validate;

use super::ItemStore;
use crate::Result;
use crate::models::{NewTrackedItem, StockStatus, TrackedItem};

/// Process-local store. Each instance is independent, which keeps tests
/// isolated from one another.
#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<Vec<TrackedItem>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn upsert(&self, item: &NewTrackedItem) -> bool {
        if let Err(e) = item.validate() {
            tracing::warn!(owner = %item.owner, url = %item.url, error = %e, "upsert rejected");
            return false;
        }

        let mut items = self.items.write().await;
        match items
            .iter_mut()
            .find(|existing| existing.owner == item.owner && existing.url == item.url)
        {
            Some(existing) => existing.apply_rules(item.clone()),
            None => items.push(TrackedItem::new(item.clone())),
        }
        true
    }

    async fn list(&self, owner: Option<&str>) -> Result<Vec<TrackedItem>> {
        let items = self.items.read().await;
        let mut selected: Vec<TrackedItem> = items
            .iter()
            .filter(|item| owner.is_none_or(|o| item.owner == o))
            .cloned()
            .collect();
        selected.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(selected)
    }

    async fn update_status(&self, id: &str, status: StockStatus, checked_at: DateTime<Utc>) -> Result<()> {
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            item.record_check(status, checked_at);
        }
        Ok(())
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<bool> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| !(item.owner == owner && item.id == id));
        Ok(items.len() < before)
    }

    async fn get(&self, owner: &str, url: &str) -> Result<Option<TrackedItem>> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .find(|item| item.owner == owner && item.url == url)
            .cloned())
    }
}
