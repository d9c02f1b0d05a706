//! The wishlist store.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use verdant_core::{
    CurrencyCode, Money, ProductId, ProductSnapshot, WishlistEntry, WishlistSession,
};

use crate::api::CommerceApi;
use crate::error::ApiError;
use crate::persist::{CommerceRecord, StateStore, keys, load_record, save_record};

use super::{MutationOutcome, SyncState};

#[derive(Debug, Default)]
struct WishlistState {
    session: Option<WishlistSession>,
    sync: SyncState,
}

/// Optimistic, fallback-capable wishlist state container.
///
/// Structurally the cart store's sibling, over a unique product set
/// instead of a line sequence: saving an already-present product is a
/// no-op, and there is no quantity to update.
pub struct WishlistStore {
    api: Arc<dyn CommerceApi>,
    store: Arc<dyn StateStore>,
    state: Mutex<WishlistState>,
}

impl WishlistStore {
    /// Create a wishlist store over the given API and boot cache.
    #[must_use]
    pub fn new(api: Arc<dyn CommerceApi>, store: Arc<dyn StateStore>) -> Self {
        Self {
            api,
            store,
            state: Mutex::new(WishlistState::default()),
        }
    }

    // =========================================================================
    // Boot cache
    // =========================================================================

    /// Rehydrate the wishlist slice from the boot cache.
    pub async fn load(&self) {
        let record = match load_record::<CommerceRecord>(self.store.as_ref(), keys::COMMERCE).await
        {
            Ok(record) => record.unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "persisted commerce state unreadable, starting empty");
                CommerceRecord::default()
            }
        };

        let mut state = self.state.lock().await;
        state.session = record.wishlist;
        state.sync = match &state.session {
            Some(session) if session.is_local() => SyncState::Degraded,
            _ => SyncState::Clean,
        };
    }

    /// Write the wishlist slice of the commerce record.
    async fn persist(&self, session: Option<&WishlistSession>) {
        let mut record = match load_record::<CommerceRecord>(self.store.as_ref(), keys::COMMERCE)
            .await
        {
            Ok(record) => record.unwrap_or_default(),
            Err(_) => CommerceRecord::default(),
        };
        record.wishlist = session.cloned();
        if let Err(err) = save_record(self.store.as_ref(), keys::COMMERCE, &record).await {
            warn!(error = %err, "failed to persist wishlist state");
        }
    }

    // =========================================================================
    // Read-only accessors
    // =========================================================================

    /// The current snapshot, absent when the shopper never saved anything.
    pub async fn snapshot(&self) -> Option<WishlistSession> {
        self.state.lock().await.session.clone()
    }

    /// Whether the snapshot matches the backend.
    pub async fn sync_state(&self) -> SyncState {
        self.state.lock().await.sync
    }

    /// Number of saved products; 0 when the wishlist is absent.
    pub async fn item_count(&self) -> usize {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map_or(0, WishlistSession::item_count)
    }

    /// Sum of the saved products' snapshot prices.
    pub async fn subtotal(&self, currency: CurrencyCode) -> Money {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map_or_else(|| Money::zero(currency), |session| session.subtotal(currency))
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Fetch the authoritative wishlist and replace the local snapshot.
    ///
    /// # Errors
    ///
    /// Raises the [`ApiError`] without mutating state; no local fallback.
    pub async fn fetch(&self) -> Result<Option<WishlistSession>, ApiError> {
        let fetched = self.api.fetch_wishlist().await?;
        let mut state = self.state.lock().await;
        self.adopt(&mut state, fetched.clone()).await;
        Ok(fetched)
    }

    /// Save a product. Saving an already-present product is a no-op.
    pub async fn add(&self, product: &ProductSnapshot) -> MutationOutcome {
        match self.api.add_wishlist_item(product).await {
            Ok(snapshot) => {
                let mut state = self.state.lock().await;
                self.adopt(&mut state, Some(snapshot)).await;
                MutationOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, product = %product.product_id, "wishlist add failed, saving locally");
                let mut state = self.state.lock().await;
                let session = state
                    .session
                    .get_or_insert_with(WishlistSession::new_local);
                session.add_entry(WishlistEntry {
                    product_id: product.product_id.clone(),
                    title: product.title.clone(),
                    unit_price: product.unit_price,
                    added_at: Utc::now(),
                });
                self.degrade(&mut state, &err).await
            }
        }
    }

    /// Remove a saved product. When the last entry goes, the session
    /// collapses to absent.
    pub async fn remove(&self, product_id: &ProductId) -> MutationOutcome {
        match self.api.remove_wishlist_item(product_id).await {
            Ok(snapshot) => {
                let mut state = self.state.lock().await;
                self.adopt(&mut state, snapshot).await;
                MutationOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, product = %product_id, "wishlist remove failed, saving locally");
                let mut state = self.state.lock().await;
                if let Some(session) = state.session.as_mut() {
                    session.remove_entry(product_id);
                }
                if state
                    .session
                    .as_ref()
                    .is_some_and(WishlistSession::is_empty)
                {
                    state.session = None;
                }
                self.degrade(&mut state, &err).await
            }
        }
    }

    /// Clear the wishlist.
    pub async fn clear(&self) -> MutationOutcome {
        match self.api.clear_wishlist().await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                self.adopt(&mut state, None).await;
                MutationOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, "wishlist clear failed, clearing locally");
                let mut state = self.state.lock().await;
                state.session = None;
                self.degrade(&mut state, &err).await
            }
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Push a locally accumulated wishlist into the authoritative store.
    ///
    /// Same protocol as the cart: strictly sequential adds, best-effort per
    /// item, local snapshot discarded only after the loop, then a fetch of
    /// the canonical server state. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Only the final fetch can fail.
    pub async fn reconcile(&self) -> Result<(), ApiError> {
        let entries = {
            let state = self.state.lock().await;
            match &state.session {
                Some(session) if session.is_local() => session.entries.clone(),
                _ => Vec::new(),
            }
        };

        if !entries.is_empty() {
            info!(entries = entries.len(), "reconciling local wishlist");
        }
        for entry in &entries {
            let product = ProductSnapshot {
                product_id: entry.product_id.clone(),
                variant_id: None,
                title: entry.title.clone(),
                unit_price: entry.unit_price,
            };
            if let Err(err) = self.api.add_wishlist_item(&product).await {
                warn!(error = %err, product = %entry.product_id, "reconcile add failed, continuing");
            }
        }

        if !entries.is_empty() {
            let mut state = self.state.lock().await;
            state.session = None;
        }
        self.fetch().await?;
        Ok(())
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// Adopt a server snapshot verbatim and return to the clean state.
    async fn adopt(&self, state: &mut WishlistState, snapshot: Option<WishlistSession>) {
        state.session = snapshot.filter(|session| !session.is_empty());
        state.sync = SyncState::Clean;
        debug!(present = state.session.is_some(), "adopted server wishlist");
        self.persist(state.session.as_ref()).await;
    }

    /// Mark the store degraded after a local fallback and persist it.
    async fn degrade(&self, state: &mut WishlistState, err: &ApiError) -> MutationOutcome {
        state.sync = SyncState::Degraded;
        self.persist(state.session.as_ref()).await;
        MutationOutcome::SavedLocally {
            detail: err.to_string(),
        }
    }
}
