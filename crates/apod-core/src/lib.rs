// # apod-core
//
// Date resolution and offline cache core for a daily published content item.
//
// ## Architecture Overview
//
// - **ClockResolver**: The publisher's current valid date, in its own timezone
// - **ContentClient**: Trait for one remote lookup (one date, or the latest)
// - **KeyValueStore**: Trait for durable string storage
// - **ContentCache**: Date-keyed cache over a KeyValueStore
// - **DateResolutionEngine**: Clamps the requested date, consults the cache,
//   falls back to the client, caches confirmed successes
// - **ProviderRegistry**: Plugin-based registry for clients and stores
//
// ## Design Principles
//
// 1. **Typed outcomes**: "not yet published", "remote down" and "bad payload"
//    are FetchOutcome variants, never errors
// 2. **No ambient state**: the requested date is an argument, the effective
//    date comes back in the Resolution
// 3. **Explicit retries**: nothing retries behind the caller's back
// 4. **Library-First**: clients and stores are pluggable trait objects

pub mod cache;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod registry;
pub mod share;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use cache::{CacheEntry, ContentCache};
pub use clock::{ClockResolver, FixedClock, PublisherClock};
pub use config::{ApodConfig, CacheConfig, ClientConfig, ClockConfig, EngineConfig};
pub use engine::{DateRequest, DateResolutionEngine, EngineEvent, Origin, Resolution};
pub use error::{Error, Result};
pub use record::{ContentRecord, MediaType};
pub use registry::ProviderRegistry;
pub use share::SharePayload;
pub use store::{FileStore, MemoryStore};
pub use traits::{ContentClient, FetchOutcome, KeyValueStore};
