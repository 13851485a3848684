//! Two stores for the same owner sharing one remote store.
//!
//! There is no cross-device push: a device only learns about the other's
//! writes when it reconciles. Conflicting quantity edits resolve
//! last-remote-write-wins.

use rust_decimal::dec;

use pomelo_core::{ProductId, ProductRef};
use pomelo_integration_tests::TestContext;

fn coffee() -> ProductRef {
    ProductRef::new("sku-coffee", "Coffee Beans 1kg", dec!(14.50), "https://img.example/coffee.png")
}

#[tokio::test]
async fn test_second_device_sees_cart_after_reconcile() {
    let ctx = TestContext::new();
    let phone = ctx.cart_for("alice");
    let tablet = ctx.cart_for("alice");

    phone.add_item(&coffee()).await;
    phone.add_item(&coffee()).await;

    // Tablet starts blind, reconcile pulls the shared cart.
    assert!(tablet.is_empty());
    tablet.reconcile().await;
    assert_eq!(tablet.items().len(), 1);
    assert_eq!(tablet.items()[0].quantity, 2);
}

#[tokio::test]
async fn test_conflicting_quantity_edits_are_last_write_wins() {
    let ctx = TestContext::new();
    let phone = ctx.cart_for("alice");
    let tablet = ctx.cart_for("alice");

    phone.add_item(&coffee()).await;
    tablet.reconcile().await;

    let id = ProductId::new("sku-coffee");
    phone.set_quantity(&id, 2).await;
    tablet.set_quantity(&id, 5).await;

    // Until it reconciles, the phone still shows its own edit.
    assert_eq!(phone.items()[0].quantity, 2);

    phone.reconcile().await;
    assert_eq!(phone.items()[0].quantity, 5);
}

#[tokio::test]
async fn test_removal_on_one_device_propagates_via_reconcile() {
    let ctx = TestContext::new();
    let phone = ctx.cart_for("alice");
    let tablet = ctx.cart_for("alice");

    phone.add_item(&coffee()).await;
    tablet.reconcile().await;

    tablet.remove_item(&ProductId::new("sku-coffee")).await;
    assert_eq!(ctx.remote.count("cart"), 0);

    phone.reconcile().await;
    assert!(phone.is_empty());
}

#[tokio::test]
async fn test_order_on_one_device_keeps_history_for_both() {
    let ctx = TestContext::new();
    let phone = ctx.cart_for("alice");

    phone.add_item(&coffee()).await;
    phone.place_order().await.expect("order placed");

    // Order documents are per-owner history, visible to any device.
    assert_eq!(ctx.remote.count("order"), 1);
    let orders = ctx.remote.dump("order");
    assert_eq!(orders[0].1["ownerId"], "alice");
}
