use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{FromRow, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;
use validator::Validate;

use super::ItemStore;
use crate::config::DatabaseConfig;
use crate::models::{NewTrackedItem, StockStatus, TrackedItem, generate_id, normalize_keywords, normalize_selector};
use crate::{AppError, Result};

const SELECT_COLUMNS: &str = "SELECT id, owner, url, selector, in_stock_keywords, out_of_stock_keywords, \
     last_status, last_checked, created_at FROM tracked_items";

#[derive(Debug, FromRow)]
struct TrackedItemRow {
    id: String,
    owner: String,
    url: String,
    selector: Option<String>,
    in_stock_keywords: Option<String>,
    out_of_stock_keywords: Option<String>,
    last_status: StockStatus,
    last_checked: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn decode_keywords(raw: Option<String>) -> Result<Option<Vec<String>>> {
    match raw {
        Some(json) => Ok(normalize_keywords(Some(serde_json::from_str(&json)?))),
        None => Ok(None),
    }
}

fn encode_keywords(keywords: &Option<Vec<String>>) -> Result<Option<String>> {
    match normalize_keywords(keywords.clone()) {
        Some(list) => Ok(Some(serde_json::to_string(&list)?)),
        None => Ok(None),
    }
}

impl TryFrom<TrackedItemRow> for TrackedItem {
    type Error = AppError;

    fn try_from(row: TrackedItemRow) -> Result<Self> {
        Ok(TrackedItem {
            id: row.id,
            owner: row.owner,
            url: row.url,
            selector: row.selector,
            in_stock_keywords: decode_keywords(row.in_stock_keywords)?,
            out_of_stock_keywords: decode_keywords(row.out_of_stock_keywords)?,
            last_status: row.last_status,
            last_checked: row.last_checked,
            created_at: row.created_at,
        })
    }
}

/// Opens (creating if needed) the SQLite database behind `config.url` in WAL
/// mode. In-memory databases are pinned to a single connection so every
/// query sees the same data.
pub async fn init_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let in_memory = config.url.contains(":memory:");
    if !in_memory {
        ensure_parent_dir(&config.url);
    }

    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let max_connections = if in_memory { 1 } else { config.max_connections };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// File-backed URLs may point into a directory that does not exist yet.
fn ensure_parent_dir(url: &str) {
    let path = url
        .trim_start_matches("sqlite:")
        .trim_start_matches("//");
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %e, "could not create database directory");
            }
        }
    }
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct SqliteItemStore {
    pool: SqlitePool,
}

impl SqliteItemStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Pool plus migrations in one step.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = init_pool(config).await?;
        run_migrations(&pool).await?;
        tracing::info!(url = %config.url, "item store ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn try_upsert(&self, item: &NewTrackedItem) -> Result<()> {
        item.validate()?;

        sqlx::query(
            "INSERT INTO tracked_items \
                (id, owner, url, selector, in_stock_keywords, out_of_stock_keywords, last_status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (owner, url) DO UPDATE SET \
                selector = excluded.selector, \
                in_stock_keywords = excluded.in_stock_keywords, \
                out_of_stock_keywords = excluded.out_of_stock_keywords",
        )
        .bind(generate_id())
        .bind(&item.owner)
        .bind(&item.url)
        .bind(normalize_selector(item.selector.clone()))
        .bind(encode_keywords(&item.in_stock_keywords)?)
        .bind(encode_keywords(&item.out_of_stock_keywords)?)
        .bind(StockStatus::Unknown)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    #[instrument(skip_all, fields(owner = %item.owner, url = %item.url))]
    async fn upsert(&self, item: &NewTrackedItem) -> bool {
        match self.try_upsert(item).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "upsert rejected");
                false
            }
        }
    }

    #[instrument(skip_all)]
    async fn list(&self, owner: Option<&str>) -> Result<Vec<TrackedItem>> {
        let rows: Vec<TrackedItemRow> = match owner {
            Some(owner) => {
                sqlx::query_as(&format!("{} WHERE owner = ? ORDER BY created_at, id", SELECT_COLUMNS))
                    .bind(owner)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as(&format!("{} ORDER BY created_at, id", SELECT_COLUMNS))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(TrackedItem::try_from).collect()
    }

    #[instrument(skip_all, fields(item_id = %id))]
    async fn update_status(&self, id: &str, status: StockStatus, checked_at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE tracked_items SET last_status = ?, last_checked = ? WHERE id = ?")
            .bind(status)
            .bind(checked_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("status update matched no item");
        }
        Ok(())
    }

    #[instrument(skip_all)]
    async fn delete(&self, owner: &str, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tracked_items WHERE owner = ? AND id = ?")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip_all)]
    async fn get(&self, owner: &str, url: &str) -> Result<Option<TrackedItem>> {
        let row: Option<TrackedItemRow> =
            sqlx::query_as(&format!("{} WHERE owner = ? AND url = ?", SELECT_COLUMNS))
                .bind(owner)
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TrackedItem::try_from).transpose()
    }
}
