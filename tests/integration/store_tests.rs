use super::*;
use chrono::Utc;
use restock_watcher::models::{NewTrackedItem, StockStatus};

#[tokio::test]
async fn test_re_adding_updates_rules_in_place() -> anyhow::Result<()> {
    let store = create_test_store().await?;
    let url = "https://shop.example/p/42";

    assert!(store.upsert(&NewTrackedItem::new("1001", url)).await);
    let first = store.get("1001", url).await?.expect("item was stored");
    store
        .update_status(&first.id, StockStatus::OutOfStock, Utc::now())
        .await?;

    let again = NewTrackedItem::new("1001", url)
        .with_selector("#stock")
        .with_in_stock_keywords(vec!["Auf Lager".to_string()]);
    assert!(store.upsert(&again).await);

    let items = store.list(None).await?;
    assert_eq!(items.len(), 1);

    let item = &items[0];
    assert_eq!(item.id, first.id);
    assert_eq!(item.selector.as_deref(), Some("#stock"));
    assert_eq!(item.in_stock_keywords, Some(vec!["Auf Lager".to_string()]));
    // Re-adding never resets what the monitor observed
    assert_eq!(item.last_status, StockStatus::OutOfStock);
    assert!(item.last_checked.is_some());

    Ok(())
}

#[tokio::test]
async fn test_same_url_for_two_owners_is_two_items() -> anyhow::Result<()> {
    let store = create_test_store().await?;
    let url = "https://shop.example/p/42";

    assert!(store.upsert(&NewTrackedItem::new("1", url)).await);
    assert!(store.upsert(&NewTrackedItem::new("2", url)).await);

    assert_eq!(store.list(None).await?.len(), 2);
    assert_eq!(store.list(Some("1")).await?.len(), 1);
    assert!(store.list(Some("3")).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_is_scoped_to_owner() -> anyhow::Result<()> {
    let store = create_test_store().await?;
    let url = "https://shop.example/p/42";
    assert!(store.upsert(&NewTrackedItem::new("1", url)).await);
    let item = store.get("1", url).await?.expect("item was stored");

    assert!(!store.delete("2", &item.id).await?);
    assert_eq!(store.list(None).await?.len(), 1);

    assert!(store.delete("1", &item.id).await?);
    assert!(store.get("1", url).await?.is_none());
    assert!(!store.delete("1", &item.id).await?);

    Ok(())
}

#[tokio::test]
async fn test_list_keeps_insertion_order() -> anyhow::Result<()> {
    let store = create_test_store().await?;
    for n in 1..=3 {
        assert!(store.upsert(&NewTrackedItem::new("1", format!("https://shop.example/p/{}", n))).await);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let urls: Vec<String> = store.list(None).await?.into_iter().map(|i| i.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://shop.example/p/1",
            "https://shop.example/p/2",
            "https://shop.example/p/3",
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_invalid_items_are_rejected() -> anyhow::Result<()> {
    let store = create_test_store().await?;

    assert!(!store.upsert(&NewTrackedItem::new("", "https://shop.example/p/1")).await);
    assert!(!store.upsert(&NewTrackedItem::new("1", "not a url")).await);
    assert!(!store.upsert(&NewTrackedItem::new("1", "ftp://shop.example/p/1")).await);
    assert!(store.list(None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_file_backed_store_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("nested").join("restock.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections: 2,
    };

    {
        let store = SqliteItemStore::connect(&config).await?;
        assert!(store.upsert(&NewTrackedItem::new("1", "https://shop.example/p/1")).await);
        let item = store.get("1", "https://shop.example/p/1").await?.expect("item was stored");
        store.update_status(&item.id, StockStatus::InStock, Utc::now()).await?;
        store.pool().close().await;
    }

    let reopened = SqliteItemStore::connect(&config).await?;
    let items = reopened.list(None).await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].last_status, StockStatus::InStock);

    Ok(())
}
