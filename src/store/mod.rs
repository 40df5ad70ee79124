//! Durable (owner, url) -> state mapping shared by the monitor and the CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Result;
use crate::models::{NewTrackedItem, StockStatus, TrackedItem};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryItemStore;
pub use sqlite::SqliteItemStore;

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Inserts a new item or replaces the extraction rules of an existing
    /// (owner, url) pair. Observed state is never reset. Returns `false` on
    /// validation failure or storage fault; the cause is logged.
    async fn upsert(&self, item: &NewTrackedItem) -> bool;

    /// All items, or only `owner`'s, ordered by creation time then id.
    async fn list(&self, owner: Option<&str>) -> Result<Vec<TrackedItem>>;

    /// Updating an id that no longer exists is not an error.
    async fn update_status(&self, id: &str, status: StockStatus, checked_at: DateTime<Utc>) -> Result<()>;

    async fn delete(&self, owner: &str, id: &str) -> Result<bool>;

    async fn get(&self, owner: &str, url: &str) -> Result<Option<TrackedItem>>;
}
