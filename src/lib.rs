pub mod classifier;
pub mod config;
pub mod fetcher;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use scheduler::{CycleSummary, ItemOutcome, StockMonitor};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
