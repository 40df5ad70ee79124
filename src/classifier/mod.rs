//! Availability and price classification of product pages.
//!
//! [`classify`] runs an ordered chain of independent strategies over the
//! parsed document; the first one that reaches a decision wins. When none
//! does, the verdict is [`Availability::Unknown`], which downstream treats as
//! "not available".

use scraper::Html;
use serde::{Deserialize, Serialize};

pub mod keywords;
pub mod price;
pub mod product;
mod strategies;

use keywords::{DEFAULT_IN_STOCK, DEFAULT_OUT_OF_STOCK};
use strategies::{Page, STRATEGIES};

use crate::models::NO_PRICE;

pub const UNKNOWN_TEXT: &str = "Unknown (no stock indicators)";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    ProbablyInStock,
    OutOfStock,
    Unknown,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::InStock | Availability::ProbablyInStock)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Verdict {
    pub availability: Availability,
    pub available: bool,
    pub status_text: String,
    pub price: String,
    pub product_name: Option<String>,
    /// Strategy that decided, or `"none"`.
    pub matched_by: &'static str,
}

/// Lower-cased, trimmed, de-duplicated phrases matched as substrings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && !normalized.contains(&word) {
                normalized.push(word);
            }
        }
        Self { words: normalized }
    }

    /// A non-empty custom set replaces the defaults entirely.
    pub fn custom_or_default(custom: Option<&[String]>, defaults: &[&str]) -> Self {
        match custom {
            Some(words) => {
                let set = Self::new(words);
                if set.is_empty() {
                    Self::new(defaults.iter().copied())
                } else {
                    set
                }
            }
            None => Self::new(defaults.iter().copied()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn find_in(&self, text: &str) -> Option<&str> {
        self.words
            .iter()
            .find(|word| text.contains(word.as_str()))
            .map(String::as_str)
    }
}

/// Which polarity wins when free text carries both.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordPrecedence {
    #[default]
    OutOfStockFirst,
    InStockFirst,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierOptions {
    pub precedence: KeywordPrecedence,
}

pub fn classify(
    html: &str,
    selector: Option<&str>,
    in_stock_keywords: Option<&[String]>,
    out_of_stock_keywords: Option<&[String]>,
) -> Verdict {
    classify_with(
        html,
        selector,
        in_stock_keywords,
        out_of_stock_keywords,
        ClassifierOptions::default(),
    )
}

pub fn classify_with(
    html: &str,
    selector: Option<&str>,
    in_stock_keywords: Option<&[String]>,
    out_of_stock_keywords: Option<&[String]>,
    options: ClassifierOptions,
) -> Verdict {
    let document = Html::parse_document(html);
    let price = price::extract_price(&document);
    let product_name = product::extract_product_name(&document);

    let page = Page {
        document,
        selector: selector.map(str::trim).filter(|s| !s.is_empty()),
        in_stock: KeywordSet::custom_or_default(in_stock_keywords, DEFAULT_IN_STOCK),
        out_of_stock: KeywordSet::custom_or_default(out_of_stock_keywords, DEFAULT_OUT_OF_STOCK),
        precedence: options.precedence,
        has_price: price != NO_PRICE,
    };

    for &(name, strategy) in STRATEGIES {
        if let Some(decision) = strategy(&page) {
            return Verdict {
                availability: decision.availability,
                available: decision.availability.is_available(),
                status_text: decision.status_text,
                price,
                product_name,
                matched_by: name,
            };
        }
    }

    tracing::debug!("no stock indicators found");
    Verdict {
        availability: Availability::Unknown,
        available: false,
        status_text: UNKNOWN_TEXT.to_string(),
        price,
        product_name,
        matched_by: "none",
    }
}
