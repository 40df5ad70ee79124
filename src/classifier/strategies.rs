use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use super::{Availability, KeywordPrecedence, KeywordSet};

/// Markup that typically signals the item cannot be bought. An element only
/// decides when its own text carries an out-of-stock phrase.
const OUT_OF_STOCK_SELECTORS: &[&str] = &[
    ".out-of-stock",
    ".sold-out",
    ".soldout",
    "[class*='out-of-stock']",
    "[class*='sold-out']",
    ".product-unavailable",
    "[data-availability='out-of-stock']",
    "[data-qa-action='size-out-of-stock']",
    ".size-selector-list__item--is-disabled",
    ".product-size-info__out-of-stock",
    "button[disabled]",
    "[aria-disabled='true']",
    "option[disabled]",
    "#availability",
    ".availability",
    ".stock-status",
];

/// Purchase controls. Disabled controls are ignored.
const IN_STOCK_SELECTORS: &[&str] = &[
    "#add-to-cart-button",
    "#add-to-cart",
    ".add-to-cart",
    "[class*='add-to-cart']",
    "[data-qa-action='add-to-cart']",
    "button[name='add']",
    "button[name='add-to-cart']",
    "button.product-form__submit",
    "#buy-now-button",
    ".buy-now",
    "[class*='buy-now']",
    "form[action*='cart'] button[type='submit']",
];

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

pub(crate) const PRICE_ONLY_TEXT: &str = "Probably in stock (price found, no stock keywords)";

pub(crate) struct Page<'a> {
    pub document: Html,
    pub selector: Option<&'a str>,
    pub in_stock: KeywordSet,
    pub out_of_stock: KeywordSet,
    pub precedence: KeywordPrecedence,
    pub has_price: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Decision {
    pub availability: Availability,
    pub status_text: String,
}

impl Decision {
    fn new(availability: Availability, status_text: String) -> Self {
        Self {
            availability,
            status_text,
        }
    }
}

pub(crate) type Strategy = fn(&Page<'_>) -> Option<Decision>;

/// Evaluated in order; the first strategy returning a decision wins.
pub(crate) const STRATEGIES: &[(&str, Strategy)] = &[
    ("targeted_out_of_stock", targeted_out_of_stock),
    ("targeted_in_stock", targeted_in_stock),
    ("free_text", free_text),
    ("price_presence", price_presence),
];

fn collapse_lower(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn collect_visible(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) if HIDDEN_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_visible(child_ref, out);
                }
            }
            _ => {}
        }
    }
}

/// Visible text of an element plus the labels a control may carry instead
/// of text content.
fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_visible(element, &mut raw);
    for attr in ["value", "aria-label"] {
        if let Some(label) = element.value().attr(attr) {
            raw.push(' ');
            raw.push_str(label);
        }
    }
    collapse_lower(&raw)
}

fn is_disabled(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("disabled").is_some()
        || value
            .attr("aria-disabled")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn scan_targets(
    page: &Page<'_>,
    selectors: &'static [&'static str],
    keywords: &KeywordSet,
    skip_disabled: bool,
) -> Option<(String, &'static str)> {
    for &selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        for element in page.document.select(&selector) {
            if skip_disabled && is_disabled(element) {
                continue;
            }

            if let Some(keyword) = keywords.find_in(&element_text(element)) {
                return Some((keyword.to_string(), selector_str));
            }
        }
    }

    None
}

fn targeted_out_of_stock(page: &Page<'_>) -> Option<Decision> {
    let (keyword, selector) = scan_targets(page, OUT_OF_STOCK_SELECTORS, &page.out_of_stock, false)?;
    tracing::debug!(selector, keyword = %keyword, "out-of-stock markup matched");
    Some(Decision::new(
        Availability::OutOfStock,
        format!("Out of stock ({})", keyword),
    ))
}

fn targeted_in_stock(page: &Page<'_>) -> Option<Decision> {
    let (keyword, selector) = scan_targets(page, IN_STOCK_SELECTORS, &page.in_stock, true)?;
    tracing::debug!(selector, keyword = %keyword, "purchase control matched");
    Some(Decision::new(
        Availability::InStock,
        format!("In stock ({})", keyword),
    ))
}

fn body_text(document: &Html) -> String {
    let mut raw = String::new();
    match Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
    {
        Some(body) => collect_visible(body, &mut raw),
        None => collect_visible(document.root_element(), &mut raw),
    }
    collapse_lower(&raw)
}

fn scoped_text(page: &Page<'_>) -> String {
    let Some(selector_str) = page.selector else {
        return body_text(&page.document);
    };

    let selector = match Selector::parse(selector_str) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::debug!(selector = selector_str, error = ?e, "invalid selector, scanning whole page");
            return body_text(&page.document);
        }
    };

    let mut raw = String::new();
    let mut matched = false;
    for element in page.document.select(&selector) {
        matched = true;
        collect_visible(element, &mut raw);
    }

    if !matched {
        // The scoped block is often removed from sold-out pages
        tracing::debug!(selector = selector_str, "selector matched nothing, skipping free text");
        return String::new();
    }

    collapse_lower(&raw)
}

fn free_text(page: &Page<'_>) -> Option<Decision> {
    let text = scoped_text(page);

    let out_of_stock = || {
        page.out_of_stock.find_in(&text).map(|keyword| {
            Decision::new(Availability::OutOfStock, format!("Out of stock ({})", keyword))
        })
    };
    let in_stock = || {
        page.in_stock.find_in(&text).map(|keyword| {
            Decision::new(Availability::InStock, format!("In stock ({})", keyword))
        })
    };

    match page.precedence {
        KeywordPrecedence::OutOfStockFirst => out_of_stock().or_else(in_stock),
        KeywordPrecedence::InStockFirst => in_stock().or_else(out_of_stock),
    }
}

fn price_presence(page: &Page<'_>) -> Option<Decision> {
    if !page.has_price {
        return None;
    }

    Some(Decision::new(
        Availability::ProbablyInStock,
        PRICE_ONLY_TEXT.to_string(),
    ))
}
