//! Cart store integration tests: offline fallback, degraded state, and the
//! reconciliation protocol against a scripted backend.

#![allow(clippy::unwrap_used)]

mod mock_api;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use rust_decimal::Decimal;

use mock_api::{MockCommerceApi, VALID_COUPON, product, product_variant};
use verdant_client::{ApiError, CartStore, MemoryStore, MutationOutcome, SyncState};
use verdant_core::CurrencyCode;

fn store_over(api: Arc<MockCommerceApi>) -> CartStore {
    CartStore::new(api, Arc::new(MemoryStore::default()), CurrencyCode::USD)
}

#[tokio::test]
async fn test_offline_add_merges_and_degrades() {
    let api = MockCommerceApi::new();
    api.set_online(false);
    let cart = store_over(api);

    let first = cart.add(&product("p1", 1000), 2).await;
    assert!(matches!(first, MutationOutcome::SavedLocally { .. }));

    // Same product again: one line, quantity 5, not two lines
    let second = cart.add(&product("p1", 1000), 3).await;
    assert!(!second.is_synced());

    let snapshot = cart.snapshot().await.unwrap();
    assert!(snapshot.is_local());
    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(snapshot.lines.first().unwrap().quantity, 5);
    assert_eq!(snapshot.subtotal.amount, Decimal::new(5000, 2));
    assert_eq!(cart.sync_state().await, SyncState::Degraded);

    // A different variant of the same product is its own line
    cart.add(&product_variant("p1", "v2", 1200), 1).await;
    assert_eq!(cart.snapshot().await.unwrap().lines.len(), 2);
}

#[tokio::test]
async fn test_offline_zero_quantity_collapses_to_absent() {
    let api = MockCommerceApi::new();
    api.set_online(false);
    let cart = store_over(api);

    cart.add(&product("p1", 1000), 1).await;
    let line_id = cart.snapshot().await.unwrap().lines.first().unwrap().id.clone();

    cart.update_quantity(&line_id, 0).await;
    // Absent, not an empty-but-present session
    assert!(cart.snapshot().await.is_none());
    assert_eq!(cart.item_count().await, 0);
}

#[tokio::test]
async fn test_fetch_failure_leaves_state_untouched() {
    let api = MockCommerceApi::new();
    api.set_online(false);
    let cart = store_over(api.clone());

    cart.add(&product("p1", 1000), 2).await;
    let before = cart.snapshot().await;

    let result = cart.fetch().await;
    assert!(matches!(result, Err(ApiError::Network(_))));
    assert_eq!(cart.snapshot().await, before);
    assert_eq!(cart.sync_state().await, SyncState::Degraded);
}

#[tokio::test]
async fn test_end_to_end_offline_then_reconcile() {
    let api = MockCommerceApi::new();
    let store = Arc::new(MemoryStore::default());
    let cart = CartStore::new(api.clone(), store, CurrencyCode::USD);

    // Anonymous shopper adds P1 (10.00) x2 while the backend is unreachable
    api.set_online(false);
    let outcome = cart.add(&product("p1", 1000), 2).await;
    assert!(matches!(outcome, MutationOutcome::SavedLocally { .. }));

    let local = cart.snapshot().await.unwrap();
    assert_eq!(local.lines.len(), 1);
    assert_eq!(local.lines.first().unwrap().quantity, 2);
    assert_eq!(local.subtotal.amount, Decimal::new(2000, 2));
    assert_eq!(cart.sync_state().await, SyncState::Degraded);

    // Shopper authenticates; the backend is reachable again
    api.set_online(true);
    cart.reconcile().await.unwrap();

    // One remote add per local line, then the canonical fetch
    assert_eq!(api.cart_add_calls.load(Ordering::SeqCst), 1);
    let synced = cart.snapshot().await.unwrap();
    assert!(!synced.is_local());
    assert_eq!(synced.id.as_str(), "srv-cart-1");
    assert_eq!(synced.lines.len(), 1);
    assert_eq!(synced.lines.first().unwrap().quantity, 2);
    assert!(synced.lines.first().unwrap().id.as_str().starts_with("srv-"));
    assert_eq!(cart.sync_state().await, SyncState::Clean);
}

#[tokio::test]
async fn test_reconcile_twice_does_not_duplicate() {
    let api = MockCommerceApi::new();
    let cart = store_over(api.clone());

    api.set_online(false);
    cart.add(&product("p1", 1000), 2).await;

    api.set_online(true);
    cart.reconcile().await.unwrap();
    // Second run against the already-emptied local cache
    cart.reconcile().await.unwrap();

    assert_eq!(api.cart_add_calls.load(Ordering::SeqCst), 1);
    let server = api.server_cart().await.unwrap();
    assert_eq!(server.lines.len(), 1);
    assert_eq!(server.lines.first().unwrap().quantity, 2);
}

#[tokio::test]
async fn test_successful_remote_op_returns_to_clean() {
    let api = MockCommerceApi::new();
    let cart = store_over(api.clone());

    api.set_online(false);
    cart.add(&product("p1", 1000), 1).await;
    assert_eq!(cart.sync_state().await, SyncState::Degraded);

    // Degraded is not terminal: the next successful remote mutation adopts
    // the server snapshot, server ids included
    api.set_online(true);
    let outcome = cart.add(&product("p2", 500), 1).await;
    assert!(outcome.is_synced());
    assert_eq!(cart.sync_state().await, SyncState::Clean);

    let snapshot = cart.snapshot().await.unwrap();
    assert!(snapshot.lines.iter().all(|line| !line.id.is_local()));
}

#[tokio::test]
async fn test_remote_update_and_remove_adopt_server_state() {
    let api = MockCommerceApi::new();
    let cart = store_over(api.clone());

    cart.add(&product("p1", 1000), 2).await;
    cart.add(&product("p2", 500), 1).await;
    let snapshot = cart.snapshot().await.unwrap();
    let p1_line = snapshot.lines.first().unwrap().id.clone();
    let p2_line = snapshot.lines.get(1).unwrap().id.clone();

    assert!(cart.update_quantity(&p1_line, 4).await.is_synced());
    assert_eq!(cart.snapshot().await.unwrap().subtotal.amount, Decimal::new(4500, 2));

    assert!(cart.remove(&p2_line).await.is_synced());
    assert_eq!(cart.snapshot().await.unwrap().lines.len(), 1);

    // Removing the last line collapses the session to absent
    assert!(cart.remove(&p1_line).await.is_synced());
    assert!(cart.snapshot().await.is_none());
}

#[tokio::test]
async fn test_clear_nulls_the_session() {
    let api = MockCommerceApi::new();
    let cart = store_over(api.clone());

    cart.add(&product("p1", 1000), 2).await;
    assert!(cart.clear().await.is_synced());
    assert!(cart.snapshot().await.is_none());
    assert!(api.server_cart().await.is_none());
}

#[tokio::test]
async fn test_coupons_are_remote_only_hard_errors() {
    let api = MockCommerceApi::new();
    let cart = store_over(api.clone());

    cart.add(&product("p1", 1000), 2).await;

    // Rejection surfaces verbatim, no fallback
    let err = cart.apply_coupon("BOGUS").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(cart.sync_state().await, SyncState::Clean);

    cart.apply_coupon(VALID_COUPON).await.unwrap();
    let snapshot = cart.snapshot().await.unwrap();
    assert_eq!(snapshot.discount.amount, Decimal::new(500, 2));
    assert_eq!(snapshot.total.amount, Decimal::new(1500, 2));

    cart.remove_coupon().await.unwrap();
    assert!(cart.snapshot().await.unwrap().discount.is_zero());

    // Offline coupon application is a hard failure too
    api.set_online(false);
    assert!(cart.apply_coupon(VALID_COUPON).await.is_err());
}

#[tokio::test]
async fn test_boot_cache_restores_degraded_cart() {
    let api = MockCommerceApi::new();
    let store = Arc::new(MemoryStore::default());

    {
        let cart = CartStore::new(api.clone(), store.clone(), CurrencyCode::USD);
        api.set_online(false);
        cart.add(&product("p1", 1000), 2).await;
    }

    // A new process over the same boot cache sees the local cart, still
    // marked as pending sync
    let cart = CartStore::new(api, store, CurrencyCode::USD);
    cart.load().await;

    let snapshot = cart.snapshot().await.unwrap();
    assert!(snapshot.is_local());
    assert_eq!(snapshot.subtotal.amount, Decimal::new(2000, 2));
    assert_eq!(cart.sync_state().await, SyncState::Degraded);
}
