use scraper::{Html, Selector};

/// Product title markup, tried in order; the first non-empty heading wins.
pub const NAME_SELECTORS: &[&str] = &[
    "h1.product-detail-info__name",
    "h1[data-qa-action='product-detail-title']",
    "h1.product-detail-info__header-name",
    "h1[itemprop='name']",
    "h1.product-title",
    "h1",
];

/// Product name shown in alerts, from the page heading or, failing that,
/// the `og:title` meta tag.
pub fn extract_product_name(document: &Html) -> Option<String> {
    name_from_headings(document).or_else(|| name_from_meta(document))
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn name_from_headings(document: &Html) -> Option<String> {
    for selector_str in NAME_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        for element in document.select(&selector) {
            let name = collapse(&element.text().collect::<String>());
            if !name.is_empty() {
                return Some(name);
            }
        }
    }

    None
}

fn name_from_meta(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[property='og:title']").ok()?;
    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(collapse)
        .find(|name| !name.is_empty())
}
