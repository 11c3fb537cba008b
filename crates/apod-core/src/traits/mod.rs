//! Core traits for the APOD core
//!
//! - [`ContentClient`]: Look up one record from the remote publisher
//! - [`KeyValueStore`]: Durable string storage behind the content cache

pub mod content_client;
pub mod key_value_store;

pub use content_client::{ContentClient, ContentClientFactory, FetchOutcome};
pub use key_value_store::{KeyValueStore, KeyValueStoreFactory};
