use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod check_result;
pub mod tracked_item;

pub use check_result::*;
pub use tracked_item::*;

/// Availability state persisted per tracked item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT")]
pub enum StockStatus {
    #[default]
    #[sqlx(rename = "unknown")]
    Unknown,
    #[sqlx(rename = "in_stock")]
    InStock,
    #[sqlx(rename = "out_of_stock")]
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Unknown => "unknown",
            StockStatus::InStock => "in_stock",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }

    pub fn parse_status(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(StockStatus::Unknown),
            "in_stock" => Some(StockStatus::InStock),
            "out_of_stock" => Some(StockStatus::OutOfStock),
            _ => None,
        }
    }

    /// The only transition that produces a user notification: entering
    /// `InStock` from any other state.
    pub fn is_notify_edge(previous: StockStatus, current: StockStatus) -> bool {
        previous != StockStatus::InStock && current == StockStatus::InStock
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            StockStatus::InStock => "✅",
            StockStatus::OutOfStock => "❌",
            StockStatus::Unknown => "❓",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Helper function to generate UUIDs in the format expected by the database
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
