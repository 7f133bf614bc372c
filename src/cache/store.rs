//! Cache Store Module
//!
//! The persistent key-value store the cache manager reads envelopes from,
//! plus an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Convenience Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// == Key-Value Store ==
/// Asynchronous string-blob store. Every operation may fail.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the blob stored under `key`, or None.
    async fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Stores `blob` under `key`, replacing any previous value.
    async fn write(&self, key: &str, blob: String) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Lists every stored key.
    async fn list_keys(&self) -> StoreResult<Vec<String>>;
}

// == Memory Store ==
/// Process-local store backed by a HashMap.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, blob: String) -> StoreResult<()> {
        self.entries.write().await.insert(key.to_string(), blob);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }
}
