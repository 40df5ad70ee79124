use restock_watcher::classifier::{Availability, ClassifierOptions, KeywordPrecedence, classify, classify_with};

const JSON_LD_PAGE: &str = r#"<html><head>
    <script type="application/ld+json">
    {
        "@context": "https://schema.org",
        "@graph": [
            {"@type": "BreadcrumbList"},
            {
                "@type": "Product",
                "name": "Linen Shirt",
                "offers": [{"@type": "Offer", "price": "39.90", "priceCurrency": "EUR"}]
            }
        ]
    }
    </script>
</head><body>
    <h1>Linen Shirt</h1>
    <p>Choose your size</p>
</body></html>"#;

#[test]
fn test_structured_data_price_without_keywords_is_probably_in_stock() {
    let verdict = classify(JSON_LD_PAGE, None, None, None);

    assert_eq!(verdict.availability, Availability::ProbablyInStock);
    assert!(verdict.available);
    assert_eq!(verdict.price, "39.90 EUR");
}

#[test]
fn test_custom_keywords_replace_defaults() {
    let html = r#"<html><body>
        <div id="stock">Nur noch wenige Stück</div>
        <div class="footer">Out of stock items are restocked weekly</div>
    </body></html>"#;

    let in_stock = vec!["nur noch wenige".to_string()];
    let out_of_stock = vec!["vergriffen".to_string()];
    let verdict = classify(html, None, Some(in_stock.as_slice()), Some(out_of_stock.as_slice()));

    assert_eq!(verdict.availability, Availability::InStock);
    assert_eq!(verdict.status_text, "In stock (nur noch wenige)");
}

#[test]
fn test_selector_scopes_free_text() {
    let html = r#"<html><body>
        <section id="recommended"><p>Sold out</p></section>
        <section id="product"><p>In stock, ships tomorrow</p></section>
    </body></html>"#;

    let verdict = classify(html, Some("#product"), None, None);
    assert_eq!(verdict.availability, Availability::InStock);

    let verdict = classify(html, None, None, None);
    assert_eq!(verdict.availability, Availability::OutOfStock);
}

#[test]
fn test_precedence_decides_ambiguous_pages() {
    let html = r#"<html><body><p>In stock online, sold out in stores</p></body></html>"#;

    let default = classify(html, None, None, None);
    assert_eq!(default.availability, Availability::OutOfStock);

    let in_stock_first = classify_with(
        html,
        None,
        None,
        None,
        ClassifierOptions {
            precedence: KeywordPrecedence::InStockFirst,
        },
    );
    assert_eq!(in_stock_first.availability, Availability::InStock);
}

#[test]
fn test_page_without_signals_is_unknown() {
    let verdict = classify("<html><body><p>Welcome</p></body></html>", None, None, None);

    assert_eq!(verdict.availability, Availability::Unknown);
    assert!(!verdict.available);
    assert_eq!(verdict.price, "N/A");
}
