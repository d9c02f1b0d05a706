//! Reconciliation wiring.
//!
//! Connects the commerce stores to the auth session's authentication
//! channel: when a session transitions from anonymous to authenticated,
//! any locally accumulated state is pushed into the authoritative store.
//! The stores never import the auth manager - the channel is the only
//! coupling, and a test can drive the same edge by calling
//! `reconcile()` directly.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::warn;

use super::{CartStore, WishlistStore};

/// Spawn the task that reconciles both stores on every transition into the
/// authenticated state.
///
/// The handle may be dropped; the task ends on its own when the auth
/// manager (the channel sender) goes away.
pub fn spawn_reconciler(
    mut auth_rx: watch::Receiver<bool>,
    cart: Arc<CartStore>,
    wishlist: Arc<WishlistStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut was_authenticated = *auth_rx.borrow();
        loop {
            if auth_rx.changed().await.is_err() {
                // Sender dropped: the session manager is gone
                break;
            }
            let authenticated = *auth_rx.borrow_and_update();
            if authenticated && !was_authenticated {
                if let Err(err) = cart.reconcile().await {
                    warn!(error = %err, "cart reconciliation failed");
                }
                if let Err(err) = wishlist.reconcile().await {
                    warn!(error = %err, "wishlist reconciliation failed");
                }
            }
            was_authenticated = authenticated;
        }
    })
}
