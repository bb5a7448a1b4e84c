// SPDX-License-Identifier: Apache-2.0

use crate::{CheckoutError, ShopStore};
use pluggin_model::{CustomerName, LineItem, OrderStatus, ProductDraft};
use std::sync::Arc;
use tempfile::TempDir;

async fn test_store() -> (TempDir, Arc<ShopStore>) {
    let dir = TempDir::new().expect("tempdir");
    let store = ShopStore::open(dir.path().join("shop.sqlite"))
        .await
        .expect("open store");
    (dir, store)
}

async fn seed_product(store: &ShopStore, name: &str, price: i64, quantity: i64) -> i64 {
    let draft = ProductDraft::parse(name, price, "", quantity, None, false, Some("hoodie"), false)
        .expect("draft");
    store.create_product(draft).await.expect("create product").id
}

async fn seed_sold_out_product(store: &ShopStore, name: &str) -> i64 {
    let draft =
        ProductDraft::parse(name, 1_000, "", 0, None, false, None, false).expect("draft");
    store.create_product(draft).await.expect("create product").id
}

fn buyer() -> CustomerName {
    CustomerName::parse("Test Buyer").expect("name")
}

#[tokio::test]
async fn happy_path_decrements_stock_and_prices_the_order() {
    let (_dir, store) = test_store().await;
    let id = seed_product(&store, "Box Logo Hoodie", 45_000, 5).await;

    let items = vec![LineItem::parse(id, 2, 45_000).expect("item")];
    let orders = store
        .commit_checkout(items, buyer(), "user-1".to_string())
        .await
        .expect("checkout");

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].product_id, Some(id));
    assert_eq!(orders[0].quantity, 2);
    assert_eq!(orders[0].total_price.minor_units(), 90_000);
    assert_eq!(orders[0].status, OrderStatus::Pending);

    let product = store.get_product(id).await.expect("get").expect("product");
    assert_eq!(product.quantity, 3);
    assert!(!product.is_sold_out);
    assert!(product.sold_out_flag_consistent());
}

#[tokio::test]
async fn exact_depletion_flips_sold_out() {
    let (_dir, store) = test_store().await;
    let id = seed_product(&store, "Last Tee", 12_000, 1).await;

    store
        .commit_checkout(
            vec![LineItem::parse(id, 1, 12_000).expect("item")],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect("checkout");

    let product = store.get_product(id).await.expect("get").expect("product");
    assert_eq!(product.quantity, 0);
    assert!(product.is_sold_out);
}

#[tokio::test]
async fn oversell_is_rejected_and_stock_untouched() {
    let (_dir, store) = test_store().await;
    let id = seed_product(&store, "Scarce Jacket", 80_000, 1).await;

    let err = store
        .commit_checkout(
            vec![LineItem::parse(id, 2, 80_000).expect("item")],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect_err("must reject");
    match err {
        CheckoutError::InsufficientStock {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 1);
            assert_eq!(requested, 2);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    let product = store.get_product(id).await.expect("get").expect("product");
    assert_eq!(product.quantity, 1);
    assert_eq!(store.list_orders().await.expect("orders").len(), 0);
}

#[tokio::test]
async fn sold_out_product_is_rejected() {
    let (_dir, store) = test_store().await;
    let id = seed_sold_out_product(&store, "Gone Pants").await;

    let err = store
        .commit_checkout(
            vec![LineItem::parse(id, 1, 9_000).expect("item")],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::SoldOut { .. }));
}

#[tokio::test]
async fn manually_flagged_product_is_rejected_even_with_stock() {
    let (_dir, store) = test_store().await;
    let draft = ProductDraft::parse("Held Back Deck", 30_000, "", 4, None, false, Some("skate"), true)
        .expect("draft");
    let id = store.create_product(draft).await.expect("create").id;

    let err = store
        .commit_checkout(
            vec![LineItem::parse(id, 1, 30_000).expect("item")],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::SoldOut { .. }));
    let product = store.get_product(id).await.expect("get").expect("product");
    assert_eq!(product.quantity, 4);
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let (_dir, store) = test_store().await;
    let err = store
        .commit_checkout(
            vec![LineItem::parse(404, 1, 1_000).expect("item")],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect_err("must reject");
    assert_eq!(err, CheckoutError::ProductNotFound { product_id: 404 });
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let (_dir, store) = test_store().await;
    let err = store
        .commit_checkout(vec![], buyer(), "user-1".to_string())
        .await
        .expect_err("must reject");
    assert_eq!(err, CheckoutError::EmptyBatch);
}

#[tokio::test]
async fn failing_item_aborts_the_whole_batch() {
    let (_dir, store) = test_store().await;
    let in_stock = seed_product(&store, "Plenty Hoodie", 40_000, 10).await;
    let sold_out = seed_sold_out_product(&store, "Gone Tee").await;

    let err = store
        .commit_checkout(
            vec![
                LineItem::parse(in_stock, 1, 40_000).expect("item"),
                LineItem::parse(sold_out, 1, 12_000).expect("item"),
            ],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::SoldOut { .. }));

    // Item 1 was valid but must remain untouched, and neither item may have
    // produced an order row.
    let survivor = store
        .get_product(in_stock)
        .await
        .expect("get")
        .expect("product");
    assert_eq!(survivor.quantity, 10);
    assert_eq!(store.list_orders().await.expect("orders").len(), 0);
}

#[tokio::test]
async fn repeated_product_in_one_batch_cannot_overdraw() {
    let (_dir, store) = test_store().await;
    let id = seed_product(&store, "Single Skate", 55_000, 1).await;

    // Each line passes pre-flight against the same snapshot; the conditional
    // decrement catches the second one and rolls everything back.
    let err = store
        .commit_checkout(
            vec![
                LineItem::parse(id, 1, 55_000).expect("item"),
                LineItem::parse(id, 1, 55_000).expect("item"),
            ],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect_err("must reject");
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

    let product = store.get_product(id).await.expect("get").expect("product");
    assert_eq!(product.quantity, 1);
    assert!(!product.is_sold_out);
    assert_eq!(store.list_orders().await.expect("orders").len(), 0);
}

#[tokio::test]
async fn validation_verdict_is_stable_on_unchanged_catalog() {
    let (_dir, store) = test_store().await;
    let id = seed_product(&store, "Steady Pant", 20_000, 1).await;

    for _ in 0..3 {
        let err = store
            .commit_checkout(
                vec![LineItem::parse(id, 5, 20_000).expect("item")],
                buyer(),
                "user-1".to_string(),
            )
            .await
            .expect_err("must reject");
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                available: 1,
                requested: 5,
                ..
            }
        ));
    }
}

#[tokio::test]
async fn order_captures_cart_price_not_catalog_price() {
    let (_dir, store) = test_store().await;
    let id = seed_product(&store, "Repriced Hoodie", 50_000, 3).await;

    // The cart locked a lower price before an admin raised it.
    let orders = store
        .commit_checkout(
            vec![LineItem::parse(id, 1, 42_000).expect("item")],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect("checkout");
    assert_eq!(orders[0].total_price.minor_units(), 42_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_checkouts_of_the_last_unit_admit_exactly_one() {
    let (_dir, store) = test_store().await;
    let id = seed_product(&store, "Final Unit", 60_000, 1).await;

    let a = store.commit_checkout(
        vec![LineItem::parse(id, 1, 60_000).expect("item")],
        buyer(),
        "user-a".to_string(),
    );
    let b = store.commit_checkout(
        vec![LineItem::parse(id, 1, 60_000).expect("item")],
        buyer(),
        "user-b".to_string(),
    );
    let (ra, rb) = tokio::join!(a, b);

    let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one concurrent checkout must win");
    let loser = if ra.is_ok() { rb } else { ra };
    assert!(matches!(
        loser.expect_err("loser"),
        CheckoutError::InsufficientStock { .. } | CheckoutError::SoldOut { .. }
    ));

    let product = store.get_product(id).await.expect("get").expect("product");
    assert_eq!(product.quantity, 0);
    assert!(product.is_sold_out);
    assert_eq!(store.list_orders().await.expect("orders").len(), 1);
}

#[tokio::test]
async fn multi_item_batch_commits_every_line() {
    let (_dir, store) = test_store().await;
    let a = seed_product(&store, "Hoodie A", 45_000, 5).await;
    let b = seed_product(&store, "Tee B", 12_000, 2).await;

    let orders = store
        .commit_checkout(
            vec![
                LineItem::parse(a, 2, 45_000).expect("item"),
                LineItem::parse(b, 2, 12_000).expect("item"),
            ],
            buyer(),
            "user-1".to_string(),
        )
        .await
        .expect("checkout");
    assert_eq!(orders.len(), 2);

    let pa = store.get_product(a).await.expect("get").expect("product");
    let pb = store.get_product(b).await.expect("get").expect("product");
    assert_eq!(pa.quantity, 3);
    assert!(!pa.is_sold_out);
    assert_eq!(pb.quantity, 0);
    assert!(pb.is_sold_out);
}
