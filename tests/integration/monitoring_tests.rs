use super::*;
use restock_watcher::CycleSummary;
use restock_watcher::models::{NewTrackedItem, StockStatus};

#[tokio::test]
async fn test_restock_notifies_once_across_cycles() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page_sequence(&server, "/p/trail-runner", SOLD_OUT_PAGE, IN_STOCK_PAGE).await;

    let store = create_test_store().await?;
    let url = format!("{}/p/trail-runner", server.uri());
    assert!(store.upsert(&NewTrackedItem::new("1001", url.clone())).await);

    let (monitor, notifier) = create_test_monitor(store.clone()).await?;

    // Cycle 1: sold out, nothing to say
    let summary = monitor.run_cycle().await?;
    assert_eq!(
        summary,
        CycleSummary {
            items: 1,
            succeeded: 1,
            failed: 0,
            notifications: 0,
        }
    );
    let item = store.get("1001", &url).await?.expect("item is tracked");
    assert_eq!(item.last_status, StockStatus::OutOfStock);
    assert!(item.last_checked.is_some());

    // Cycle 2: back in stock
    let summary = monitor.run_cycle().await?;
    assert_eq!(summary.notifications, 1);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    let (owner, notification) = &sent[0];
    assert_eq!(owner, "1001");
    assert_eq!(notification.url, url);
    assert_eq!(notification.price, "€19.99");
    assert_eq!(notification.product_name.as_deref(), Some("Trail Runner 2"));
    assert!(notification.message().starts_with("✅ Trail Runner 2 is back in stock!"));
    assert!(notification.message().contains("Price: €19.99"));

    // Cycle 3: still in stock, no repeat alert
    let summary = monitor.run_cycle().await?;
    assert_eq!(summary.notifications, 0);
    assert_eq!(notifier.sent().len(), 1);

    let item = store.get("1001", &url).await?.expect("item is tracked");
    assert_eq!(item.last_status, StockStatus::InStock);

    Ok(())
}

#[tokio::test]
async fn test_first_check_in_stock_notifies() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page_sequence(&server, "/p/1", IN_STOCK_PAGE, IN_STOCK_PAGE).await;

    let store = create_test_store().await?;
    assert!(store.upsert(&NewTrackedItem::new("7", format!("{}/p/1", server.uri()))).await);

    let (monitor, notifier) = create_test_monitor(store).await?;
    monitor.run_cycle().await?;

    // Unknown -> in stock is a restock edge too
    assert_eq!(notifier.sent().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_status() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SOLD_OUT_PAGE))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/p/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = create_test_store().await?;
    let url = format!("{}/p/flaky", server.uri());
    assert!(store.upsert(&NewTrackedItem::new("1001", url.clone())).await);

    let (monitor, notifier) = create_test_monitor(store.clone()).await?;

    monitor.run_cycle().await?;
    let before = store.get("1001", &url).await?.expect("item is tracked");

    let summary = monitor.run_cycle().await?;
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 0);

    let after = store.get("1001", &url).await?.expect("item is tracked");
    assert_eq!(after.last_status, StockStatus::OutOfStock);
    assert_eq!(after.last_checked, before.last_checked);
    assert!(notifier.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_one_bad_item_does_not_stop_the_cycle() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page_sequence(&server, "/p/ok", IN_STOCK_PAGE, IN_STOCK_PAGE).await;

    let store = create_test_store().await?;
    assert!(store.upsert(&NewTrackedItem::new("1", format!("{}/p/gone", server.uri()))).await);
    assert!(store.upsert(&NewTrackedItem::new("2", format!("{}/p/ok", server.uri()))).await);

    let (monitor, notifier) = create_test_monitor(store).await?;
    let summary = monitor.run_cycle().await?;

    assert_eq!(summary.items, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "2");

    Ok(())
}

#[tokio::test]
async fn test_check_now_reports_without_tracking() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_page_sequence(&server, "/p/1", SOLD_OUT_PAGE, SOLD_OUT_PAGE).await;

    let store = create_test_store().await?;
    let (monitor, notifier) = create_test_monitor(store.clone()).await?;

    let result = monitor
        .check_now(&format!("{}/p/1", server.uri()), None, None, None)
        .await;

    assert!(result.success);
    assert!(!result.available);
    assert_eq!(result.status, StockStatus::OutOfStock);
    assert_eq!(result.status_text, "Out of stock (sold out)");
    assert_eq!(result.price, "€19.99");

    assert!(store.list(None).await?.is_empty());
    assert!(notifier.sent().is_empty());

    Ok(())
}
