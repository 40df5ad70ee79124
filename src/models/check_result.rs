use serde::{Deserialize, Serialize};

use crate::classifier::{Availability, Verdict};
use crate::fetcher::{FetchError, FetchSource};
use crate::models::StockStatus;

pub const NO_PRICE: &str = "N/A";

/// Outcome of one fetch + classify pass over a single URL. Never persisted;
/// only `status` feeds back into the tracked item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub success: bool,
    pub available: bool,
    pub status: StockStatus,
    pub status_text: String,
    pub price: String,
    pub product_name: Option<String>,
    pub error: Option<String>,
    pub source: Option<FetchSource>,
    pub elapsed_ms: u64,
}

impl CheckResult {
    pub fn from_verdict(verdict: Verdict, source: FetchSource, elapsed_ms: u64) -> Self {
        Self {
            success: true,
            available: verdict.available,
            status: verdict.availability.stock_status(),
            status_text: verdict.status_text,
            price: verdict.price,
            product_name: verdict.product_name,
            error: None,
            source: Some(source),
            elapsed_ms,
        }
    }

    pub fn failed(error: &FetchError, elapsed_ms: u64) -> Self {
        Self {
            success: false,
            available: false,
            status: StockStatus::Unknown,
            status_text: format!("Check failed ({})", error.kind()),
            price: NO_PRICE.to_string(),
            product_name: None,
            error: Some(error.to_string()),
            source: None,
            elapsed_ms,
        }
    }

    pub fn has_price(&self) -> bool {
        self.price != NO_PRICE
    }
}

impl Availability {
    /// `ProbablyInStock` counts as in stock for state tracking; `Unknown`
    /// stays unknown and therefore never opens a notify edge by itself.
    pub fn stock_status(&self) -> StockStatus {
        match self {
            Availability::InStock | Availability::ProbablyInStock => StockStatus::InStock,
            Availability::OutOfStock => StockStatus::OutOfStock,
            Availability::Unknown => StockStatus::Unknown,
        }
    }
}
