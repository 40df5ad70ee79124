use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{StockStatus, generate_id};

/// A (owner, url) pair under monitoring together with its optional
/// extraction rules and the last observed availability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedItem {
    pub id: String,
    pub owner: String,
    pub url: String,

    // Extraction rules
    pub selector: Option<String>,
    pub in_stock_keywords: Option<Vec<String>>,
    pub out_of_stock_keywords: Option<Vec<String>>,

    // Written only by the monitor after a successful check
    pub last_status: StockStatus,
    pub last_checked: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewTrackedItem {
    #[validate(length(min = 1, message = "owner must not be empty"))]
    pub owner: String,
    #[validate(custom(function = "validate_http_url"))]
    pub url: String,
    pub selector: Option<String>,
    pub in_stock_keywords: Option<Vec<String>>,
    pub out_of_stock_keywords: Option<Vec<String>>,
}

impl NewTrackedItem {
    pub fn new(owner: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            url: url.into(),
            selector: None,
            in_stock_keywords: None,
            out_of_stock_keywords: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_in_stock_keywords(mut self, keywords: Vec<String>) -> Self {
        self.in_stock_keywords = Some(keywords);
        self
    }

    pub fn with_out_of_stock_keywords(mut self, keywords: Vec<String>) -> Self {
        self.out_of_stock_keywords = Some(keywords);
        self
    }
}

impl TrackedItem {
    pub fn new(new_item: NewTrackedItem) -> Self {
        Self {
            id: generate_id(),
            owner: new_item.owner,
            url: new_item.url,
            selector: normalize_selector(new_item.selector),
            in_stock_keywords: normalize_keywords(new_item.in_stock_keywords),
            out_of_stock_keywords: normalize_keywords(new_item.out_of_stock_keywords),
            last_status: StockStatus::Unknown,
            last_checked: None,
            created_at: Utc::now(),
        }
    }

    /// Re-adding an existing (owner, url) pair replaces its extraction rules
    /// but keeps the observed state.
    pub fn apply_rules(&mut self, new_item: NewTrackedItem) {
        self.selector = normalize_selector(new_item.selector);
        self.in_stock_keywords = normalize_keywords(new_item.in_stock_keywords);
        self.out_of_stock_keywords = normalize_keywords(new_item.out_of_stock_keywords);
    }

    pub fn record_check(&mut self, status: StockStatus, checked_at: DateTime<Utc>) {
        self.last_status = status;
        self.last_checked = Some(checked_at);
    }
}

/// Blank selectors mean "whole document".
pub fn normalize_selector(selector: Option<String>) -> Option<String> {
    selector
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// An empty keyword list is the same as not supplying one.
pub fn normalize_keywords(keywords: Option<Vec<String>>) -> Option<Vec<String>> {
    keywords
        .map(|list| {
            list.into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|list| !list.is_empty())
}

fn validate_http_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(ValidationError::new("url_scheme")
            .with_message("only http and https URLs can be tracked".into())),
        Err(_) => Err(ValidationError::new("url").with_message("invalid URL".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_defaults_to_unknown() {
        let item = TrackedItem::new(NewTrackedItem::new("42", "https://shop.example/p/1"));

        assert_eq!(item.owner, "42");
        assert_eq!(item.last_status, StockStatus::Unknown);
        assert!(item.last_checked.is_none());
        assert!(item.selector.is_none());
        assert_eq!(item.id.len(), 32);
    }

    #[test]
    fn test_empty_rules_are_normalized_away() {
        let item = TrackedItem::new(
            NewTrackedItem::new("42", "https://shop.example/p/1")
                .with_selector("   ")
                .with_in_stock_keywords(vec!["  ".to_string()])
                .with_out_of_stock_keywords(vec![" sold out ".to_string(), "".to_string()]),
        );

        assert!(item.selector.is_none());
        assert!(item.in_stock_keywords.is_none());
        assert_eq!(item.out_of_stock_keywords, Some(vec!["sold out".to_string()]));
    }

    #[test]
    fn test_apply_rules_keeps_status() {
        let mut item = TrackedItem::new(NewTrackedItem::new("42", "https://shop.example/p/1"));
        item.record_check(StockStatus::OutOfStock, Utc::now());

        item.apply_rules(
            NewTrackedItem::new("42", "https://shop.example/p/1").with_selector(".size-list"),
        );

        assert_eq!(item.selector.as_deref(), Some(".size-list"));
        assert_eq!(item.last_status, StockStatus::OutOfStock);
        assert!(item.last_checked.is_some());
    }

    #[test]
    fn test_validation() {
        assert!(NewTrackedItem::new("42", "https://shop.example/p/1").validate().is_ok());
        assert!(NewTrackedItem::new("", "https://shop.example/p/1").validate().is_err());
        assert!(NewTrackedItem::new("42", "not a url").validate().is_err());
        assert!(NewTrackedItem::new("42", "ftp://shop.example/p/1").validate().is_err());
    }
}
