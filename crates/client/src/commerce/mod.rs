//! Commerce state stores.
//!
//! Two structurally similar containers - [`CartStore`] and
//! [`WishlistStore`] - expose optimistic, fallback-capable mutations over
//! their session. Every mutation tries the backend first; when the backend
//! is unreachable the mutation is applied deterministically to the local
//! snapshot and the store enters a degraded-but-usable state, to be
//! reconciled once a session authenticates.

mod cart;
mod sync;
mod wishlist;

pub use cart::CartStore;
pub use sync::spawn_reconciler;
pub use wishlist::WishlistStore;

/// Whether the store's snapshot matches the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// The last mutation reached the backend; the snapshot is the server's.
    #[default]
    Clean,
    /// The last mutation succeeded only locally. Not terminal: any
    /// subsequent successful remote operation returns the store to
    /// [`SyncState::Clean`].
    Degraded,
}

/// The result of a fallback-capable mutation.
///
/// A local save is deliberately distinguishable from a synced success -
/// the distinction decides whether the reconciliation protocol still has
/// work to do, and the UI must say so.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend accepted the mutation and the store adopted its
    /// snapshot.
    Synced,
    /// The backend was unreachable; the mutation was applied locally and
    /// will sync later.
    SavedLocally {
        /// Why the remote attempt failed.
        detail: String,
    },
}

impl MutationOutcome {
    /// Whether the mutation reached the backend.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

impl std::fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Synced => f.write_str("saved"),
            Self::SavedLocally { detail } => {
                write!(f, "saved locally, will sync later ({detail})")
            }
        }
    }
}
