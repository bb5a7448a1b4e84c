// SPDX-License-Identifier: Apache-2.0

use crate::{ShippingError, ShopStore, SubscribeError};
use pluggin_model::{
    CustomerName, EmailAddress, LineItem, OrderStatus, ProductCategory, ProductDraft, Role,
    ShippingAddressDraft,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn test_store() -> (TempDir, Arc<ShopStore>) {
    let dir = TempDir::new().expect("tempdir");
    let store = ShopStore::open(dir.path().join("shop.sqlite"))
        .await
        .expect("open store");
    (dir, store)
}

fn draft(name: &str, quantity: i64, category: Option<&str>) -> ProductDraft {
    ProductDraft::parse(name, 25_000, "https://cdn.example/p.jpg", quantity, Some(10), true, category, false)
        .expect("draft")
}

async fn place_order(store: &ShopStore, product_id: i64) -> i64 {
    let orders = store
        .commit_checkout(
            vec![LineItem::parse(product_id, 1, 25_000).expect("item")],
            CustomerName::parse("Ada").expect("name"),
            "user-1".to_string(),
        )
        .await
        .expect("checkout");
    orders[0].id
}

#[tokio::test]
async fn ping_answers_on_a_fresh_store() {
    let (_dir, store) = test_store().await;
    store.ping().await.expect("ping");
}

#[tokio::test]
async fn catalog_crud_round_trips() {
    let (_dir, store) = test_store().await;
    let created = store
        .create_product(draft("Washed Hoodie", 4, Some("hoodie")))
        .await
        .expect("create");
    assert_eq!(created.quantity, 4);
    assert_eq!(created.discount_percentage, Some(10));
    assert!(created.is_on_sale);
    assert_eq!(created.category, Some(ProductCategory::Hoodie));

    let fetched = store
        .get_product(created.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(fetched, created);

    let updated = store
        .update_product(created.id, draft("Washed Hoodie v2", 0, Some("hoodie")))
        .await
        .expect("update")
        .expect("present");
    assert_eq!(updated.name, "Washed Hoodie v2");
    assert_eq!(updated.quantity, 0);
    assert!(updated.is_sold_out, "zero stock must re-derive sold out");
    assert_eq!(updated.created_at, created.created_at);

    assert!(store.delete_product(created.id).await.expect("delete"));
    assert!(store.get_product(created.id).await.expect("get").is_none());
    assert!(!store.delete_product(created.id).await.expect("delete again"));
}

#[tokio::test]
async fn update_of_missing_product_reports_none() {
    let (_dir, store) = test_store().await;
    let out = store
        .update_product(999, draft("Ghost", 1, None))
        .await
        .expect("update");
    assert!(out.is_none());
}

#[tokio::test]
async fn listing_filters_by_category_newest_first() {
    let (_dir, store) = test_store().await;
    let hoodie = store
        .create_product(draft("Hoodie", 1, Some("hoodie")))
        .await
        .expect("create");
    let tee = store
        .create_product(draft("Tee", 1, Some("tee")))
        .await
        .expect("create");

    let all = store.list_products(None).await.expect("list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, tee.id, "newest first");

    let hoodies = store
        .list_products(Some(ProductCategory::Hoodie))
        .await
        .expect("list");
    assert_eq!(hoodies.len(), 1);
    assert_eq!(hoodies[0].id, hoodie.id);
}

#[tokio::test]
async fn admin_stock_correction_keeps_invariant() {
    let (_dir, store) = test_store().await;
    let product = store
        .create_product(draft("Restocked Tee", 0, Some("tee")))
        .await
        .expect("create");
    assert!(product.is_sold_out);

    let restocked = store
        .update_product(product.id, draft("Restocked Tee", 7, Some("tee")))
        .await
        .expect("update")
        .expect("present");
    assert_eq!(restocked.quantity, 7);
    assert!(!restocked.is_sold_out, "restock clears the derived flag");
    assert!(restocked.sold_out_flag_consistent());
}

#[tokio::test]
async fn order_status_transitions_and_listing() {
    let (_dir, store) = test_store().await;
    let product = store
        .create_product(draft("Ordered Hoodie", 3, Some("hoodie")))
        .await
        .expect("create");
    let order_id = place_order(&store, product.id).await;

    let listed = store.list_orders().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].order.id, order_id);
    assert_eq!(listed[0].order.status, OrderStatus::Pending);
    assert_eq!(listed[0].product_name.as_deref(), Some("Ordered Hoodie"));

    assert!(store
        .update_order_status(order_id, OrderStatus::Processing)
        .await
        .expect("update"));
    let order = store
        .get_order(order_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(order.status, OrderStatus::Processing);

    assert!(!store
        .update_order_status(9_999, OrderStatus::Completed)
        .await
        .expect("update missing"));
}

#[tokio::test]
async fn deleted_product_leaves_order_history_readable() {
    let (_dir, store) = test_store().await;
    let product = store
        .create_product(draft("Ephemeral Deck", 2, Some("skate")))
        .await
        .expect("create");
    let order_id = place_order(&store, product.id).await;

    assert!(store.delete_product(product.id).await.expect("delete"));
    let order = store
        .get_order(order_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(order.product_id, None);
    let listed = store.list_orders().await.expect("list");
    assert_eq!(listed[0].product_name, None);
}

#[tokio::test]
async fn shipping_address_is_one_to_one_with_its_order() {
    let (_dir, store) = test_store().await;
    let product = store
        .create_product(draft("Shipped Tee", 2, Some("tee")))
        .await
        .expect("create");
    let order_id = place_order(&store, product.id).await;

    let address = ShippingAddressDraft::parse(
        order_id,
        "Ada Lovelace",
        "ada@example.com",
        Some("+250 788 000 111"),
        "12 Main St",
        "Kigali",
        "00000",
    )
    .expect("draft");

    let stored = store
        .insert_shipping_address(address.clone())
        .await
        .expect("insert");
    assert_eq!(stored.order_id, order_id);
    assert_eq!(stored.email.as_str(), "ada@example.com");

    let dup = store.insert_shipping_address(address).await.expect_err("conflict");
    assert_eq!(dup, ShippingError::AlreadyRecorded { order_id });

    let missing = ShippingAddressDraft::parse(
        4_242,
        "Ada",
        "ada@example.com",
        None,
        "12 Main St",
        "Kigali",
        "00000",
    )
    .expect("draft");
    let err = store
        .insert_shipping_address(missing)
        .await
        .expect_err("missing order");
    assert_eq!(err, ShippingError::OrderNotFound { order_id: 4_242 });
}

#[tokio::test]
async fn newsletter_rejects_duplicate_subscribers() {
    let (_dir, store) = test_store().await;
    let email = EmailAddress::parse("fan@example.com").expect("email");

    let first = store
        .subscribe_newsletter(email.clone())
        .await
        .expect("subscribe");
    assert_eq!(first.email, email);

    let err = store
        .subscribe_newsletter(email)
        .await
        .expect_err("duplicate");
    assert_eq!(err, SubscribeError::AlreadySubscribed);
}

#[tokio::test]
async fn otp_codes_are_single_use_and_expire() {
    let (_dir, store) = test_store().await;
    let email = EmailAddress::parse("login@example.com").expect("email");
    let hash = pluggin_core::sha256_hex(b"482913");

    store
        .issue_otp(email.clone(), hash.clone(), 600)
        .await
        .expect("issue");

    assert!(!store
        .consume_otp(email.clone(), pluggin_core::sha256_hex(b"000000"))
        .await
        .expect("wrong code"));
    assert!(store
        .consume_otp(email.clone(), hash.clone())
        .await
        .expect("right code"));
    assert!(
        !store.consume_otp(email.clone(), hash).await.expect("replay"),
        "a code is single-use"
    );

    // Issue with an already-elapsed window: the purge drops it before lookup.
    let stale = pluggin_core::sha256_hex(b"111111");
    store
        .issue_otp(email.clone(), stale.clone(), -1)
        .await
        .expect("issue stale");
    assert!(!store.consume_otp(email, stale).await.expect("expired"));
}

#[tokio::test]
async fn reissuing_a_code_invalidates_the_previous_one() {
    let (_dir, store) = test_store().await;
    let email = EmailAddress::parse("login@example.com").expect("email");
    let first = pluggin_core::sha256_hex(b"111111");
    let second = pluggin_core::sha256_hex(b"222222");

    store
        .issue_otp(email.clone(), first.clone(), 600)
        .await
        .expect("issue first");
    store
        .issue_otp(email.clone(), second.clone(), 600)
        .await
        .expect("issue second");

    assert!(!store
        .consume_otp(email.clone(), first)
        .await
        .expect("old code"));
    assert!(store.consume_otp(email, second).await.expect("new code"));
}

#[tokio::test]
async fn profiles_are_created_once_and_roles_stick() {
    let (_dir, store) = test_store().await;
    let email = EmailAddress::parse("admin@example.com").expect("email");

    let first = store.ensure_profile(email.clone()).await.expect("create");
    let second = store.ensure_profile(email).await.expect("fetch");
    assert_eq!(first.id, second.id);

    assert!(!store
        .has_role(first.id.clone(), Role::Admin)
        .await
        .expect("no role yet"));
    store
        .grant_role(first.id.clone(), Role::Admin)
        .await
        .expect("grant");
    store
        .grant_role(first.id.clone(), Role::Admin)
        .await
        .expect("grant is idempotent");
    assert!(store
        .has_role(first.id, Role::Admin)
        .await
        .expect("role present"));
}
