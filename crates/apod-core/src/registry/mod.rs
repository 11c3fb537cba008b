//! Plugin-based provider registry
//!
//! The registry maps client and store type names to factories, so an engine
//! can be built from configuration without hardcoded match arms.
//!
//! ## Registration
//!
//! Client crates register themselves during initialization:
//!
//! ```rust,ignore
//! let registry = ProviderRegistry::with_builtin_stores();
//! apod_client_nasa::register(&registry);
//!
//! let client = registry.create_client(&ClientConfig::nasa("DEMO_KEY"))?;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::{CacheConfig, ClientConfig};
use crate::error::{Error, Result};
use crate::store::{FileStoreFactory, MemoryStoreFactory};
use crate::traits::{ContentClient, ContentClientFactory, KeyValueStore, KeyValueStoreFactory};

/// Provider registry for plugin-based client and store creation
///
/// ## Thread Safety
///
/// Interior mutability with RwLock allows concurrent reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    clients: RwLock<HashMap<String, Box<dyn ContentClientFactory>>>,
    stores: RwLock<HashMap<String, Arc<dyn KeyValueStoreFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the `memory` and `file` stores registered
    pub fn with_builtin_stores() -> Self {
        let registry = Self::new();
        registry.register_store("memory", Box::new(MemoryStoreFactory));
        registry.register_store("file", Box::new(FileStoreFactory));
        registry
    }

    /// Register a content client factory
    ///
    /// # Parameters
    ///
    /// - `name`: Client type name (e.g., "nasa")
    /// - `factory`: Factory object for creating client instances
    pub fn register_client(&self, name: impl Into<String>, factory: Box<dyn ContentClientFactory>) {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        clients.insert(name.into(), factory);
    }

    /// Register a key-value store factory
    ///
    /// # Parameters
    ///
    /// - `name`: Store type name (e.g., "file", "memory")
    /// - `factory`: Factory object for creating store instances
    pub fn register_store(&self, name: impl Into<String>, factory: Box<dyn KeyValueStoreFactory>) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(name.into(), Arc::from(factory));
    }

    /// Create a content client from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn ContentClient>)`: Created client instance
    /// - `Err(Error)`: If the client type is not registered or creation fails
    pub fn create_client(&self, config: &ClientConfig) -> Result<Box<dyn ContentClient>> {
        let client_type = config.type_name();
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);

        let factory = clients
            .get(client_type)
            .ok_or_else(|| Error::config(format!("Unknown client type: {}", client_type)))?;

        factory.create(config)
    }

    /// Create a key-value store from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn KeyValueStore>)`: Created store instance
    /// - `Err(Error)`: If the store type is not registered or creation fails
    pub async fn create_store(&self, config: &CacheConfig) -> Result<Box<dyn KeyValueStore>> {
        let store_type = config.type_name();

        // Release the lock before awaiting the factory
        let factory = {
            let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
            stores
                .get(store_type)
                .cloned()
                .ok_or_else(|| Error::config(format!("Unknown store type: {}", store_type)))?
        };

        factory.create(config).await
    }

    /// List all registered client types
    pub fn list_clients(&self) -> Vec<String> {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.keys().cloned().collect()
    }

    /// List all registered store types
    pub fn list_stores(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.keys().cloned().collect()
    }

    /// Check if a client type is registered
    pub fn has_client(&self, name: &str) -> bool {
        let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
        clients.contains_key(name)
    }

    /// Check if a store type is registered
    pub fn has_store(&self, name: &str) -> bool {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores.contains_key(name)
    }
}
