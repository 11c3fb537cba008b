// # Memory Store
//
// In-memory implementation of KeyValueStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for tests and for embedders that keep their own durable storage.
//
// ## Crash Behavior
//
// - All cached records are lost on restart
// - The first lookup of every date after a restart goes to the network

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::CacheConfig;
use crate::traits::{KeyValueStore, KeyValueStoreFactory};

/// In-memory key-value store
///
/// Values live in a HashMap protected by a RwLock. Clones share the same map.
///
/// # Example
///
/// ```rust,no_run
/// use apod_core::store::MemoryStore;
/// use apod_core::traits::KeyValueStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStore::new();
///
///     store.write("apod_2024-01-01", "{}").await?;
///     assert_eq!(store.read("apod_2024-01-01").await?.as_deref(), Some("{}"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of keys in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove every key
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing buffered
        Ok(())
    }
}

/// Factory for `"memory"` cache configs
pub struct MemoryStoreFactory;

#[async_trait]
impl KeyValueStoreFactory for MemoryStoreFactory {
    async fn create(&self, config: &CacheConfig) -> Result<Box<dyn KeyValueStore>, Error> {
        match config {
            CacheConfig::Memory => Ok(Box::new(MemoryStore::new())),
            _ => Err(Error::config("Invalid config for memory store")),
        }
    }
}
