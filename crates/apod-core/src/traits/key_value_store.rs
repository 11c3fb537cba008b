// # Key-Value Store Trait
//
// Defines the durable string storage behind the content cache.
//
// ## Purpose
//
// The store lets previously viewed dates survive process restarts, so they
// can be shown offline. It knows nothing about records or dates: the
// `ContentCache` owns key formatting and encoding.
//
// ## Implementations
//
// - `MemoryStore`: process-lifetime only
// - `FileStore`: single JSON document with atomic writes and backup recovery

use async_trait::async_trait;

/// Trait for key-value store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Atomicity
///
/// A write replaces the whole value for its key. A concurrent reader sees
/// either the old value or the new one, never a partial write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The stored value
    /// - `Ok(None)`: Nothing stored
    /// - `Err(Error)`: Storage error
    async fn read(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Store `value` under `key`, replacing any previous value
    async fn write(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Remove `key` (no-op when absent)
    async fn delete(&self, key: &str) -> Result<(), crate::Error>;

    /// List every key in the store
    async fn keys(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}

/// Helper trait for constructing stores from configuration
#[async_trait]
pub trait KeyValueStoreFactory: Send + Sync {
    /// Create a KeyValueStore instance from configuration
    async fn create(
        &self,
        config: &crate::config::CacheConfig,
    ) -> Result<Box<dyn KeyValueStore>, crate::Error>;
}
