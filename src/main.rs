use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use restock_watcher::config::{LoggingConfig, MetricsConfig};
use restock_watcher::fetcher::build_fetcher;
use restock_watcher::models::NewTrackedItem;
use restock_watcher::plugins::PluginManager;
use restock_watcher::store::{ItemStore, MemoryItemStore, SqliteItemStore};
use restock_watcher::{AppConfig, StockMonitor};

#[derive(Debug, Parser)]
#[command(name = "restock-watcher", version, about = "Watches product pages and alerts when items come back in stock")]
struct Cli {
    /// Extra config file layered over config/*.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the monitor
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Track a product page (re-adding updates its rules)
    Add {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        selector: Option<String>,
        #[arg(long = "in-stock-keyword")]
        in_stock_keywords: Vec<String>,
        #[arg(long = "out-of-stock-keyword")]
        out_of_stock_keywords: Vec<String>,
        /// Check the page right away and print the result
        #[arg(long)]
        check: bool,
    },
    /// List tracked items
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Stop tracking an item
    Remove {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        id: String,
    },
    /// Fetch and classify a page once without tracking it
    Check {
        #[arg(long)]
        url: String,
        #[arg(long)]
        selector: Option<String>,
    },
}

fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("restock_watcher=info"),
    };

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("failed to create log directory {}", directory))?;
            let appender = tracing_appender::rolling::daily(directory, "restock-watcher.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(file_layer)
        .init();

    Ok(guard)
}

fn init_metrics(config: &MetricsConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.port))
        .install()
        .context("failed to install Prometheus exporter")?;
    info!(port = config.port, "metrics exporter listening");
    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn ItemStore>> {
    let store = SqliteItemStore::connect(&config.database)
        .await
        .context("failed to open item store")?;
    Ok(Arc::new(store))
}

async fn build_monitor(config: &AppConfig, store: Arc<dyn ItemStore>) -> Result<StockMonitor> {
    let fetcher = build_fetcher(config).context("failed to build content fetcher")?;

    let plugins = PluginManager::new();
    plugins
        .initialize_from_config(&config.notifications)
        .await
        .context("failed to register notifiers")?;

    Ok(StockMonitor::new(store, fetcher, plugins, config.scheduler.clone()))
}

fn non_empty(list: Vec<String>) -> Option<Vec<String>> {
    if list.is_empty() { None } else { Some(list) }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let _log_guard = init_tracing(&config.logging)?;
    init_metrics(&config.metrics)?;

    match cli.command {
        Command::Run { once } => {
            let store = open_store(&config).await?;
            let monitor = build_monitor(&config, store).await?;

            if once {
                let summary = monitor.run_cycle().await?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            info!("Starting Restock Watcher...");
            let mut handle = Arc::new(monitor).spawn();

            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Shutting down...");
                    handle.abort();
                }
                joined = &mut handle => {
                    bail!("monitor task stopped unexpectedly: {:?}", joined);
                }
            }
        }
        Command::Add {
            owner,
            url,
            selector,
            in_stock_keywords,
            out_of_stock_keywords,
            check,
        } => {
            let store = open_store(&config).await?;

            let mut new_item = NewTrackedItem::new(owner.clone(), url.clone());
            new_item.selector = selector;
            new_item.in_stock_keywords = non_empty(in_stock_keywords);
            new_item.out_of_stock_keywords = non_empty(out_of_stock_keywords);

            if !store.upsert(&new_item).await {
                bail!("item was rejected, see the log for details");
            }

            let item = store
                .get(&owner, &url)
                .await?
                .context("item disappeared right after it was stored")?;
            println!("Tracking {} as {}", item.url, item.id);

            if check {
                let monitor = build_monitor(&config, store).await?;
                let result = monitor.check_item(&item).await;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Command::List { owner } => {
            let store = open_store(&config).await?;
            let items = store.list(owner.as_deref()).await?;

            if items.is_empty() {
                println!("No tracked items");
            }
            for item in items {
                let checked = item
                    .last_checked
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}  {} {:<12}  {:<19}  {}  {}",
                    item.id,
                    item.last_status.emoji(),
                    item.last_status.as_str(),
                    checked,
                    item.owner,
                    item.url
                );
            }
        }
        Command::Remove { owner, id } => {
            let store = open_store(&config).await?;
            if store.delete(&owner, &id).await? {
                println!("Removed {}", id);
            } else {
                bail!("no item {} for owner {}", id, owner);
            }
        }
        Command::Check { url, selector } => {
            // One-off checks never touch the database
            let monitor = build_monitor(&config, Arc::new(MemoryItemStore::new())).await?;
            let result = monitor.check_now(&url, selector.as_deref(), None, None).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
