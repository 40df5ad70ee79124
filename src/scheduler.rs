use chrono::Utc;
use futures::FutureExt;
use metrics::{counter, gauge};
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::Result;
use crate::classifier::classify;
use crate::config::SchedulerConfig;
use crate::fetcher::ContentFetcher;
use crate::models::{CheckResult, StockStatus, TrackedItem};
use crate::plugins::{Notification, PluginManager};
use crate::store::ItemStore;

#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub item_id: String,
    pub check: CheckResult,
    pub previous: StockStatus,
    pub current: StockStatus,
    pub notified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub items: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub notifications: usize,
}

/// Polls every tracked item in turn and alerts owners when an item comes
/// back in stock. One failing item never affects the others.
pub struct StockMonitor {
    store: Arc<dyn ItemStore>,
    fetcher: Arc<dyn ContentFetcher>,
    plugins: PluginManager,
    config: SchedulerConfig,
}

impl StockMonitor {
    pub fn new(
        store: Arc<dyn ItemStore>,
        fetcher: Arc<dyn ContentFetcher>,
        plugins: PluginManager,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            plugins,
            config,
        }
    }

    async fn check_url(
        &self,
        url: &str,
        selector: Option<&str>,
        in_stock_keywords: Option<&[String]>,
        out_of_stock_keywords: Option<&[String]>,
    ) -> CheckResult {
        let started = Instant::now();

        match self.fetcher.fetch(url).await {
            Ok(document) => {
                let verdict = classify(&document.html, selector, in_stock_keywords, out_of_stock_keywords);
                tracing::debug!(
                    url,
                    strategy = verdict.matched_by,
                    degraded = document.degraded,
                    "classified page"
                );
                CheckResult::from_verdict(verdict, document.source, started.elapsed().as_millis() as u64)
            }
            Err(e) => CheckResult::failed(&e, started.elapsed().as_millis() as u64),
        }
    }

    /// Fetch and classify one item. Faults come back as a failed result.
    pub async fn check_item(&self, item: &TrackedItem) -> CheckResult {
        self.check_url(
            &item.url,
            item.selector.as_deref(),
            item.in_stock_keywords.as_deref(),
            item.out_of_stock_keywords.as_deref(),
        )
        .await
    }

    /// One-off check of an arbitrary URL. Nothing is stored or sent.
    pub async fn check_now(
        &self,
        url: &str,
        selector: Option<&str>,
        in_stock_keywords: Option<&[String]>,
        out_of_stock_keywords: Option<&[String]>,
    ) -> CheckResult {
        self.check_url(url, selector, in_stock_keywords, out_of_stock_keywords)
            .await
    }

    pub async fn process_item(&self, item: &TrackedItem) -> ItemOutcome {
        let check = self.check_item(item).await;
        let previous = item.last_status;

        if !check.success {
            counter!("restock_checks_total", "outcome" => "failure").increment(1);
            tracing::warn!(
                item_id = %item.id,
                url = %item.url,
                error = check.error.as_deref().unwrap_or_default(),
                "check failed, keeping previous status"
            );
            return ItemOutcome {
                item_id: item.id.clone(),
                check,
                previous,
                current: previous,
                notified: false,
            };
        }

        counter!("restock_checks_total", "outcome" => "success").increment(1);
        let current = check.status;

        let notified = StockStatus::is_notify_edge(previous, current);
        if notified {
            let notification = Notification::restock(item, &check);
            let delivered = self.plugins.send_notification(&item.owner, &notification).await;
            counter!("restock_notifications_total").increment(1);

            tracing::info!(
                item_id = %item.id,
                owner = %item.owner,
                url = %item.url,
                price = %check.price,
                delivered,
                "item is back in stock"
            );
            if delivered == 0 {
                tracing::warn!(item_id = %item.id, "restock notification reached no channel");
            }
        } else if previous != current {
            tracing::info!(item_id = %item.id, %previous, %current, "stock status changed");
        }

        if let Err(e) = self.store.update_status(&item.id, current, Utc::now()).await {
            tracing::error!(item_id = %item.id, error = %e, "failed to persist stock status");
        }

        ItemOutcome {
            item_id: item.id.clone(),
            check,
            previous,
            current,
            notified,
        }
    }

    /// Processes every tracked item sequentially, pausing between items.
    /// Errors only when the item list cannot be loaded.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let items = self.store.list(None).await?;
        gauge!("restock_tracked_items").set(items.len() as f64);

        let mut summary = CycleSummary {
            items: items.len(),
            ..CycleSummary::default()
        };

        if items.is_empty() {
            tracing::debug!("no tracked items");
            return Ok(summary);
        }

        let delay = Duration::from_millis(self.config.item_delay_ms);
        for (index, item) in items.iter().enumerate() {
            let outcome = self.process_item(item).await;

            if outcome.check.success {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            if outcome.notified {
                summary.notifications += 1;
            }

            if index + 1 < items.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        tracing::info!(
            items = summary.items,
            succeeded = summary.succeeded,
            failed = summary.failed,
            notifications = summary.notifications,
            "monitoring cycle complete"
        );
        Ok(summary)
    }

    pub async fn run_forever(&self) {
        let interval = Duration::from_secs(self.config.cycle_interval_secs);
        let recovery = Duration::from_secs(self.config.recovery_delay_secs);

        tracing::info!(
            interval_secs = self.config.cycle_interval_secs,
            item_delay_ms = self.config.item_delay_ms,
            "stock monitor started"
        );

        loop {
            // A panicking cycle is handled like a failed one
            let fault = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                Ok(Ok(_)) => {
                    tokio::time::sleep(interval).await;
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("cycle panicked: {}", panic_message(payload.as_ref())),
            };

            counter!("restock_cycle_failures_total").increment(1);
            tracing::error!(error = %fault, retry_in_secs = recovery.as_secs(), "monitoring cycle failed");
            tokio::time::sleep(recovery).await;
        }
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_forever().await })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
