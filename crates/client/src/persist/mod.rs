//! Persistent store adapter: the boot cache.
//!
//! Durable key/value persistence of serialized state across process
//! restarts. Persistence here is a cache, not a source of truth - every
//! record is re-validated on load, and a record the current build cannot
//! read is treated as absent rather than trusted.
//!
//! Two independent records are kept so clearing one never disturbs the
//! other: the commerce slice (`{cart, wishlist}`) and the session slice
//! (`{user, credentials, authenticated}`). A third, transient record holds
//! the login anti-forgery state between the redirect round trip.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use verdant_core::{CartSession, CredentialBundle, UserProfile, WishlistSession};

use crate::error::PersistError;

/// Schema version written into every record envelope.
///
/// Bump this when a record's shape changes; old records are then rejected
/// on load (and fall back to empty state) instead of being silently
/// misread. A migration step can translate old envelopes before the bump
/// lands if the data is worth keeping.
pub const SCHEMA_VERSION: u32 = 1;

/// Well-known record keys.
pub mod keys {
    /// The commerce slice: `{cart, wishlist}`, transient flags excluded.
    pub const COMMERCE: &str = "commerce";
    /// The session slice: `{user, credentials, authenticated}`.
    pub const SESSION: &str = "session";
    /// Anti-forgery state for the login redirect round trip.
    pub const OAUTH_STATE: &str = "oauth_state";
}

/// Durable key/value persistence of serialized state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the raw record stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>, PersistError>;
    /// Store `value` under `key`, replacing any existing record.
    async fn save(&self, key: &str, value: &str) -> Result<(), PersistError>;
    /// Remove the record under `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// Envelope wrapping every persisted record with its schema version.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Load and unwrap a versioned record.
///
/// # Errors
///
/// Fails on storage errors, malformed JSON, or a schema version this build
/// does not read.
pub async fn load_record<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>, PersistError> {
    let Some(raw) = store.load(key).await? else {
        return Ok(None);
    };
    let envelope: Envelope<T> = serde_json::from_str(&raw)?;
    if envelope.version != SCHEMA_VERSION {
        return Err(PersistError::SchemaVersion {
            expected: SCHEMA_VERSION,
            found: envelope.version,
        });
    }
    Ok(Some(envelope.data))
}

/// Wrap a record in a versioned envelope and store it.
///
/// # Errors
///
/// Fails on storage or serialization errors.
pub async fn save_record<T: Serialize + Sync>(
    store: &dyn StateStore,
    key: &str,
    data: &T,
) -> Result<(), PersistError> {
    let raw = serde_json::to_string(&Envelope {
        version: SCHEMA_VERSION,
        data,
    })?;
    store.save(key, &raw).await
}

/// The persisted commerce slice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommerceRecord {
    /// Cart snapshot, absent when the shopper never shopped (or emptied it).
    pub cart: Option<CartSession>,
    /// Wishlist snapshot.
    pub wishlist: Option<WishlistSession>,
}

/// The persisted session slice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    /// User projection decoded from identity claims.
    pub user: Option<UserProfile>,
    /// Credential bundle from the identity provider.
    pub credentials: Option<CredentialBundle>,
    /// Whether the session was authenticated when last persisted.
    pub authenticated: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_through_envelope() {
        let store = MemoryStore::default();
        let record = SessionRecord {
            user: None,
            credentials: None,
            authenticated: false,
        };

        save_record(&store, keys::SESSION, &record).await.unwrap();
        let loaded: Option<SessionRecord> = load_record(&store, keys::SESSION).await.unwrap();
        assert!(loaded.is_some());
    }

    #[tokio::test]
    async fn test_missing_key_loads_as_none() {
        let store = MemoryStore::default();
        let loaded: Option<SessionRecord> = load_record(&store, keys::SESSION).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_future_schema_version_is_rejected() {
        let store = MemoryStore::default();
        store
            .save(keys::COMMERCE, r#"{"version":99,"data":{"cart":null,"wishlist":null}}"#)
            .await
            .unwrap();

        let result: Result<Option<CommerceRecord>, _> =
            load_record(&store, keys::COMMERCE).await;
        assert!(matches!(
            result,
            Err(PersistError::SchemaVersion {
                expected: SCHEMA_VERSION,
                found: 99
            })
        ));
    }

    #[tokio::test]
    async fn test_records_are_independently_keyed() {
        let store = MemoryStore::default();
        save_record(&store, keys::SESSION, &SessionRecord::default())
            .await
            .unwrap();
        save_record(&store, keys::COMMERCE, &CommerceRecord::default())
            .await
            .unwrap();

        store.remove(keys::SESSION).await.unwrap();

        let commerce: Option<CommerceRecord> =
            load_record(&store, keys::COMMERCE).await.unwrap();
        assert!(commerce.is_some());
        let session: Option<SessionRecord> = load_record(&store, keys::SESSION).await.unwrap();
        assert!(session.is_none());
    }
}
