//! Single-client cart session flows.
//!
//! Each test walks a full session the way the mobile client drives it:
//! reconcile on login, mutate from UI events, and end with an order, a
//! clear, or a logout.

use rust_decimal::dec;

use pomelo_cart::CartStatus;
use pomelo_core::{ProductId, ProductRef};
use pomelo_integration_tests::TestContext;

fn coffee() -> ProductRef {
    ProductRef::new("sku-coffee", "Coffee Beans 1kg", dec!(14.50), "https://img.example/coffee.png")
}

fn mug() -> ProductRef {
    ProductRef::new("sku-mug", "Stoneware Mug", dec!(9.00), "https://img.example/mug.png")
}

// =============================================================================
// Session Flow Tests
// =============================================================================

#[tokio::test]
async fn test_full_session_browse_to_order() {
    let ctx = TestContext::new();
    let cart = ctx.cart_for("alice");

    // Login: empty remote cart, reconcile yields an empty fresh cart.
    cart.reconcile().await;
    assert!(cart.is_empty());
    assert_eq!(cart.status(), CartStatus::Fresh);

    // Shopping.
    cart.add_item(&coffee()).await;
    cart.add_item(&coffee()).await;
    cart.add_item(&mug()).await;
    assert_eq!(cart.total(), dec!(38.00));
    assert_eq!(cart.item_count(), 3);

    // Checkout.
    let order_id = cart.place_order().await.expect("order placed");
    assert!(!order_id.as_str().is_empty());
    assert!(cart.is_empty());
    assert_eq!(ctx.remote.count("order"), 1);
}

#[tokio::test]
async fn test_session_resumes_cart_from_previous_login() {
    let ctx = TestContext::new();

    // First session: shop, then log out.
    {
        let cart = ctx.cart_for("alice");
        cart.reconcile().await;
        cart.add_item(&coffee()).await;
        cart.add_item(&mug()).await;
        cart.forget_local().await;
        assert!(cart.is_empty());
    }

    // Second session: the remote cart comes back.
    let cart = ctx.cart_for("alice");
    cart.reconcile().await;
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.total(), dec!(23.50));
}

#[tokio::test]
async fn test_clear_cart_empties_everything() {
    let ctx = TestContext::new();
    let cart = ctx.cart_for("alice");

    cart.add_item(&coffee()).await;
    cart.add_item(&mug()).await;
    cart.clear().await;

    assert!(cart.is_empty());
    assert_eq!(ctx.remote.count("cart"), 0);

    // A fresh reconcile stays empty: nothing survived anywhere.
    cart.reconcile().await;
    assert!(cart.is_empty());
}

#[tokio::test]
async fn test_quantity_buttons_drive_line_lifecycle() {
    let ctx = TestContext::new();
    let cart = ctx.cart_for("alice");
    let id = ProductId::new("sku-coffee");

    cart.add_item(&coffee()).await;
    cart.adjust_quantity(&id, 1).await;
    cart.adjust_quantity(&id, 1).await;
    assert_eq!(cart.items()[0].quantity, 3);
    assert_eq!(cart.total(), dec!(43.50));

    cart.adjust_quantity(&id, -1).await;
    assert_eq!(cart.items()[0].quantity, 2);

    // Down to zero removes the line remotely too.
    cart.adjust_quantity(&id, -1).await;
    cart.adjust_quantity(&id, -1).await;
    assert!(cart.is_empty());
    assert_eq!(ctx.remote.count("cart"), 0);
}

// =============================================================================
// Offline Behavior Tests
// =============================================================================

#[tokio::test]
async fn test_offline_login_serves_cached_cart() {
    let ctx = TestContext::new();

    // Online session populates the cache mirror.
    let cart = ctx.cart_for("alice");
    cart.add_item(&coffee()).await;
    cart.add_item(&mug()).await;

    // Backend goes down; the next reconcile serves the snapshot.
    ctx.remote.set_unavailable(true);
    cart.reconcile().await;

    assert_eq!(cart.status(), CartStatus::Offline);
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.total(), dec!(23.50));

    // Backend recovers.
    ctx.remote.set_unavailable(false);
    cart.reconcile().await;
    assert_eq!(cart.status(), CartStatus::Fresh);
    assert_eq!(cart.items().len(), 2);
}

#[tokio::test]
async fn test_mutations_during_outage_settle_after_reconcile() {
    let ctx = TestContext::new();
    let cart = ctx.cart_for("alice");

    cart.add_item(&coffee()).await;

    // Every remote write during the outage is silently skipped.
    ctx.remote.set_unavailable(true);
    cart.add_item(&mug()).await;
    cart.set_quantity(&ProductId::new("sku-coffee"), 4).await;

    // The UI keeps working off in-memory state.
    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.item_count(), 5);

    // After recovery, remote truth wins: only the pre-outage write exists.
    ctx.remote.set_unavailable(false);
    cart.reconcile().await;
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 1);
}

// =============================================================================
// Anonymous Cart Tests
// =============================================================================

#[tokio::test]
async fn test_anonymous_cart_is_local_only() {
    let ctx = TestContext::new();
    let cart = ctx.anonymous_cart();

    cart.add_item(&coffee()).await;
    cart.add_item(&coffee()).await;
    cart.reconcile().await;

    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 2);
    assert_eq!(ctx.remote.count("cart"), 0);

    assert!(cart.place_order().await.is_err());
}
