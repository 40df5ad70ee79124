use regex::Regex;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::models::NO_PRICE;

/// Price markup, tried in order; the first element carrying a price signal wins.
pub const PRICE_SELECTORS: &[&str] = &[
    "[itemprop='price']",
    ".price",
    ".product-price",
    ".money-amount__main",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    ".a-price .a-offscreen",
    "[data-testid='price']",
    ".current-price",
    ".sale-price",
];

static PRICE_SIGNAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]|[$€£¥₹₺]").expect("price signal pattern is valid"));

/// Best-effort price string for a parsed page. Never fails; `"N/A"` when
/// neither price markup nor a structured Product offer is present.
pub fn extract_price(document: &Html) -> String {
    price_from_selectors(document)
        .or_else(|| price_from_json_ld(document))
        .unwrap_or_else(|| NO_PRICE.to_string())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn price_from_selectors(document: &Html) -> Option<String> {
    for selector_str in PRICE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        for element in document.select(&selector) {
            let text = collapse(&element.text().collect::<String>());
            let candidate = if text.is_empty() {
                element.value().attr("content").map(collapse).unwrap_or_default()
            } else {
                text
            };

            if PRICE_SIGNAL.is_match(&candidate) {
                return Some(candidate);
            }
        }
    }

    None
}

fn price_from_json_ld(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;

    document.select(&selector).find_map(|script| {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => price_from_value(&value),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed JSON-LD block");
                None
            }
        }
    })
}

fn price_from_value(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(price_from_value),
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                if let Some(price) = price_from_value(graph) {
                    return Some(price);
                }
            }

            if is_product(map.get("@type")) {
                map.get("offers").and_then(price_from_offers)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_product(kind: Option<&Value>) -> bool {
    match kind {
        Some(Value::String(s)) => s == "Product",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("Product")),
        _ => false,
    }
}

fn price_from_offers(offers: &Value) -> Option<String> {
    match offers {
        Value::Array(list) => list.iter().find_map(price_from_offer),
        Value::Object(_) => price_from_offer(offers),
        _ => None,
    }
}

fn price_from_offer(offer: &Value) -> Option<String> {
    let amount = offer
        .get("price")
        .and_then(parse_amount)
        .or_else(|| offer.get("lowPrice").and_then(parse_amount))?;

    match offer.get("priceCurrency").and_then(Value::as_str) {
        Some(currency) if !currency.trim().is_empty() => Some(format!("{} {}", amount, currency.trim())),
        _ => Some(amount.to_string()),
    }
}

fn parse_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_str(&trimmed.replace(',', ".")))
                .ok()
        }
        _ => None,
    }
}
