// Integration tests for Restock Watcher
// These tests verify that all components work together correctly

pub mod classifier_tests;
pub mod monitoring_tests;
pub mod store_tests;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use restock_watcher::{
    AppConfig, StockMonitor,
    config::{DatabaseConfig, SchedulerConfig, ScraperConfig},
    fetcher::HttpFetcher,
    plugins::{Notification, NotificationResult, NotifierPlugin, PluginManager},
    plugins::traits::NotifierError,
    store::{ItemStore, SqliteItemStore},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

pub const SOLD_OUT_PAGE: &str = r#"<html><body>
    <h1>Trail Runner 2</h1>
    <span class="price">€19.99</span>
    <button class="add-to-cart" disabled>Sold out</button>
</body></html>"#;

pub const IN_STOCK_PAGE: &str = r#"<html><body>
    <h1>Trail Runner 2</h1>
    <span class="price">€19.99</span>
    <button class="add-to-cart">Add to cart</button>
</body></html>"#;

/// Test configuration for integration tests
pub fn get_test_config() -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        scraper: ScraperConfig {
            request_timeout: 5,
            ..ScraperConfig::default()
        },
        scheduler: SchedulerConfig {
            item_delay_ms: 0,
            cycle_interval_secs: 1,
            recovery_delay_secs: 1,
        },
        ..AppConfig::default()
    }
}

/// Fresh in-memory SQLite store with migrations applied
pub async fn create_test_store() -> anyhow::Result<Arc<SqliteItemStore>> {
    let config = get_test_config();
    Ok(Arc::new(SqliteItemStore::connect(&config.database).await?))
}

/// Captures every alert instead of delivering it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<(String, Notification)>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Notification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifierPlugin for RecordingNotifier {
    fn name(&self) -> &str {
        "Recording Notifier"
    }

    fn plugin_type(&self) -> &str {
        "recording"
    }

    async fn send(&self, owner: &str, notification: &Notification) -> Result<NotificationResult, NotifierError> {
        self.sent
            .lock()
            .unwrap()
            .push((owner.to_string(), notification.clone()));
        Ok(NotificationResult::delivered(None))
    }
}

/// A monitor wired to real HTTP fetching, the given store and a recording notifier
pub async fn create_test_monitor(
    store: Arc<dyn ItemStore>,
) -> anyhow::Result<(StockMonitor, RecordingNotifier)> {
    let config = get_test_config();
    let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);

    let notifier = RecordingNotifier::default();
    let plugins = PluginManager::new();
    plugins.register_notifier(Box::new(notifier.clone())).await?;

    let monitor = StockMonitor::new(store, fetcher, plugins, config.scheduler);
    Ok((monitor, notifier))
}

/// Serves `first` once at `route`, then `then` for every later request.
pub async fn mount_page_sequence(server: &MockServer, route: &str, first: &str, then: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(first.to_string()))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(then.to_string()))
        .mount(server)
        .await;
}
