//! The cart store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use verdant_core::{CartSession, CurrencyCode, LineId, Money, ProductSnapshot};

use crate::api::CommerceApi;
use crate::error::ApiError;
use crate::persist::{CommerceRecord, StateStore, keys, load_record, save_record};

use super::{MutationOutcome, SyncState};

#[derive(Debug, Default)]
struct CartState {
    session: Option<CartSession>,
    sync: SyncState,
}

/// Optimistic, fallback-capable cart state container.
///
/// Remote-first: every mutation tries the backend and adopts the server's
/// snapshot verbatim on success. On failure the mutation is applied to the
/// local snapshot instead and the store reports
/// [`MutationOutcome::SavedLocally`]. The one exception is [`Self::fetch`],
/// which has nothing local to fall back to, and the coupon operations,
/// whose discount math only exists server-side.
pub struct CartStore {
    api: Arc<dyn CommerceApi>,
    store: Arc<dyn StateStore>,
    state: Mutex<CartState>,
    currency: CurrencyCode,
}

impl CartStore {
    /// Create a cart store over the given API and boot cache.
    #[must_use]
    pub fn new(
        api: Arc<dyn CommerceApi>,
        store: Arc<dyn StateStore>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            api,
            store,
            state: Mutex::new(CartState::default()),
            currency,
        }
    }

    // =========================================================================
    // Boot cache
    // =========================================================================

    /// Rehydrate the cart slice from the boot cache.
    ///
    /// Called once by the process bootstrap. Totals are recomputed on load
    /// so a stale or hand-edited record can never violate the derived-totals
    /// invariant. An unreadable record is treated as absent.
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
        state.session = record.cart.map(|mut session| {
            session.recompute_totals();
            session
        });
        // A local-sentinel cart has pending work; surface that through the
        // sync state so callers can tell before the first mutation.
        state.sync = match &state.session {
            Some(session) if session.is_local() => SyncState::Degraded,
            _ => SyncState::Clean,
        };
    }

    /// Write the cart slice of the commerce record.
    async fn persist(&self, session: Option<&CartSession>) {
        let mut record = match load_record::<CommerceRecord>(self.store.as_ref(), keys::COMMERCE)
            .await
        {
            Ok(record) => record.unwrap_or_default(),
            Err(_) => CommerceRecord::default(),
        };
        record.cart = session.cloned();
        if let Err(err) = save_record(self.store.as_ref(), keys::COMMERCE, &record).await {
            warn!(error = %err, "failed to persist cart state");
        }
    }

    // =========================================================================
    // Read-only accessors
    // =========================================================================

    /// The current snapshot, absent when the shopper never shopped.
    pub async fn snapshot(&self) -> Option<CartSession> {
        self.state.lock().await.session.clone()
    }

    /// Whether the snapshot matches the backend.
    pub async fn sync_state(&self) -> SyncState {
        self.state.lock().await.sync
    }

    /// Sum of line quantities; 0 when the cart is absent.
    pub async fn item_count(&self) -> u32 {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map_or(0, CartSession::item_count)
    }

    /// Derived subtotal of the current snapshot.
    pub async fn subtotal(&self) -> Option<Money> {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.subtotal)
    }

    /// Derived total of the current snapshot.
    pub async fn total(&self) -> Option<Money> {
        self.state
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.total)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Fetch the authoritative cart and replace the local snapshot.
    ///
    /// # Errors
    ///
    /// Raises the [`ApiError`] without mutating state - this is the one
    /// operation with no local fallback, since there is nothing local to
    /// show yet.
    pub async fn fetch(&self) -> Result<Option<CartSession>, ApiError> {
        let fetched = self.api.fetch_cart().await?;
        let mut state = self.state.lock().await;
        self.adopt(&mut state, fetched.clone()).await;
        Ok(fetched)
    }

    /// Add `quantity` of a product to the cart.
    ///
    /// On remote failure a line is merged into the local snapshot using the
    /// price captured on `product` at call time.
    pub async fn add(&self, product: &ProductSnapshot, quantity: u32) -> MutationOutcome {
        match self.api.add_cart_item(product, quantity).await {
            Ok(snapshot) => {
                let mut state = self.state.lock().await;
                self.adopt(&mut state, Some(snapshot)).await;
                MutationOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, product = %product.product_id, "cart add failed, saving locally");
                let mut state = self.state.lock().await;
                let session = state
                    .session
                    .get_or_insert_with(|| CartSession::new_local(self.currency));
                session.merge_line(product, quantity.max(1));
                self.degrade(&mut state, &err).await
            }
        }
    }

    /// Set a line's quantity; 0 or less removes the line.
    pub async fn update_quantity(&self, line_id: &LineId, quantity: u32) -> MutationOutcome {
        if quantity == 0 {
            return self.remove(line_id).await;
        }
        match self.api.update_cart_item(line_id, quantity).await {
            Ok(snapshot) => {
                let mut state = self.state.lock().await;
                self.adopt(&mut state, Some(snapshot)).await;
                MutationOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, line = %line_id, "cart update failed, saving locally");
                let mut state = self.state.lock().await;
                if let Some(session) = state.session.as_mut() {
                    session.set_quantity(line_id, quantity);
                }
                Self::collapse_if_empty(&mut state);
                self.degrade(&mut state, &err).await
            }
        }
    }

    /// Remove a line. When the last line goes, the whole session collapses
    /// to absent - so the UI can tell "never shopped" from "emptied".
    pub async fn remove(&self, line_id: &LineId) -> MutationOutcome {
        match self.api.remove_cart_item(line_id).await {
            Ok(snapshot) => {
                let mut state = self.state.lock().await;
                self.adopt(&mut state, snapshot).await;
                MutationOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, line = %line_id, "cart remove failed, saving locally");
                let mut state = self.state.lock().await;
                if let Some(session) = state.session.as_mut() {
                    session.remove_line(line_id);
                }
                Self::collapse_if_empty(&mut state);
                self.degrade(&mut state, &err).await
            }
        }
    }

    /// Clear the cart.
    pub async fn clear(&self) -> MutationOutcome {
        match self.api.clear_cart().await {
            Ok(()) => {
                let mut state = self.state.lock().await;
                self.adopt(&mut state, None).await;
                MutationOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, "cart clear failed, clearing locally");
                let mut state = self.state.lock().await;
                state.session = None;
                self.degrade(&mut state, &err).await
            }
        }
    }

    /// Apply a coupon code. Remote-only: discount computation needs
    /// server-side business rules, so failures are hard errors.
    ///
    /// # Errors
    ///
    /// Surfaces the backend's rejection verbatim.
    pub async fn apply_coupon(&self, code: &str) -> Result<(), ApiError> {
        let snapshot = self.api.apply_coupon(code).await?;
        let mut state = self.state.lock().await;
        self.adopt(&mut state, Some(snapshot)).await;
        Ok(())
    }

    /// Remove the applied coupon. Remote-only, like [`Self::apply_coupon`].
    ///
    /// # Errors
    ///
    /// Surfaces the backend's rejection verbatim.
    pub async fn remove_coupon(&self) -> Result<(), ApiError> {
        let snapshot = self.api.remove_coupon().await?;
        let mut state = self.state.lock().await;
        self.adopt(&mut state, Some(snapshot)).await;
        Ok(())
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Push a locally accumulated cart into the authoritative store.
    ///
    /// Runs when a session becomes authenticated and the current snapshot
    /// is local-sentinel-backed. Lines are replayed strictly sequentially -
    /// never concurrently - so two adds of the same product cannot race
    /// into duplicate server lines. Individual failures are logged and the
    /// loop continues; the local snapshot is discarded only once the loop
    /// completes, and the final [`Self::fetch`] adopts the canonical server
    /// state. A second run against the already-emptied local cache is a
    /// no-op plus a fetch, so the protocol is safe to repeat.
    ///
    /// # Errors
    ///
    /// Only the final fetch can fail; the replayed adds are best-effort.
    pub async fn reconcile(&self) -> Result<(), ApiError> {
        let lines = {
            let state = self.state.lock().await;
            match &state.session {
                Some(session) if session.is_local() => session.lines.clone(),
                _ => Vec::new(),
            }
        };

        if !lines.is_empty() {
            info!(lines = lines.len(), "reconciling local cart");
        }
        for line in &lines {
            let product = ProductSnapshot {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                title: line.title.clone(),
                unit_price: line.unit_price,
            };
            if let Err(err) = self.api.add_cart_item(&product, line.quantity).await {
                warn!(error = %err, product = %line.product_id, "reconcile add failed, continuing");
            }
        }

        if !lines.is_empty() {
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
    ///
    /// An empty-but-present server cart collapses to absent, keeping the
    /// "absent means emptied or never shopped" policy uniform.
    async fn adopt(&self, state: &mut CartState, snapshot: Option<CartSession>) {
        state.session = snapshot.filter(|session| !session.is_empty());
        state.sync = SyncState::Clean;
        debug!(present = state.session.is_some(), "adopted server cart");
        self.persist(state.session.as_ref()).await;
    }

    /// Mark the store degraded after a local fallback and persist it.
    async fn degrade(&self, state: &mut CartState, err: &ApiError) -> MutationOutcome {
        state.sync = SyncState::Degraded;
        self.persist(state.session.as_ref()).await;
        MutationOutcome::SavedLocally {
            detail: err.to_string(),
        }
    }

    fn collapse_if_empty(state: &mut CartState) {
        if state
            .session
            .as_ref()
            .is_some_and(CartSession::is_empty)
        {
            state.session = None;
        }
    }
}
