//! In-memory implementation of the persistent store adapter.
//!
//! Used by tests and by callers that want a throwaway session.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::StateStore;
use crate::error::PersistError;

/// A `HashMap`-backed store with no durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.map
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.map.lock().await.remove(key);
        Ok(())
    }
}
