//! Configuration types for the APOD core
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::env;

use crate::clock::DEFAULT_UTC_OFFSET_SECS;

/// Default endpoint of the NASA APOD API
pub const DEFAULT_NASA_BASE_URL: &str = "https://api.nasa.gov/planetary/apod";

/// Largest publisher offset accepted (±18 hours, as in ISO 8601)
const MAX_UTC_OFFSET_SECS: i32 = 18 * 60 * 60;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApodConfig {
    /// Remote content client configuration
    pub client: ClientConfig,

    /// Cache storage configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Publisher clock configuration
    #[serde(default)]
    pub clock: ClockConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ApodConfig {
    /// Create a configuration for the NASA client with defaults elsewhere
    pub fn nasa(api_key: impl Into<String>) -> Self {
        Self {
            client: ClientConfig::nasa(api_key),
            cache: CacheConfig::default(),
            clock: ClockConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `APOD_API_KEY` (required)
    /// - `APOD_BASE_URL`, `APOD_TIMEOUT_SECS`
    /// - `APOD_CACHE_PATH`: file cache when set, memory cache otherwise
    /// - `APOD_UTC_OFFSET_SECS`, `APOD_KEY_PREFIX`
    pub fn from_env() -> Result<Self, crate::Error> {
        let api_key = env::var("APOD_API_KEY")
            .map_err(|_| crate::Error::config("APOD_API_KEY is required"))?;

        let base_url = env::var("APOD_BASE_URL").unwrap_or_else(|_| default_base_url());
        let timeout_secs = parse_env("APOD_TIMEOUT_SECS")?.unwrap_or_else(default_timeout_secs);

        let cache = match env::var("APOD_CACHE_PATH") {
            Ok(path) => CacheConfig::File { path },
            Err(_) => CacheConfig::Memory,
        };

        let clock = ClockConfig {
            utc_offset_secs: parse_env("APOD_UTC_OFFSET_SECS")?
                .unwrap_or_else(default_utc_offset_secs),
        };

        let mut engine = EngineConfig::default();
        if let Ok(prefix) = env::var("APOD_KEY_PREFIX") {
            engine.key_prefix = prefix;
        }

        let config = Self {
            client: ClientConfig::Nasa {
                api_key,
                base_url,
                timeout_secs,
            },
            cache,
            clock,
            engine,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.client.validate()?;
        self.cache.validate()?;
        self.clock.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, crate::Error> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| crate::Error::config(format!("{} is not a valid number: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Remote content client configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientConfig {
    /// NASA APOD API
    Nasa {
        /// API key, sent as the `api_key` query parameter
        api_key: String,
        /// Endpoint url
        #[serde(default = "default_base_url")]
        base_url: String,
        /// Request timeout in seconds
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom client
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ClientConfig {
    /// NASA client with the default endpoint and timeout
    pub fn nasa(api_key: impl Into<String>) -> Self {
        ClientConfig::Nasa {
            api_key: api_key.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Validate the client configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ClientConfig::Nasa {
                api_key,
                base_url,
                timeout_secs,
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("NASA API key cannot be empty"));
                }
                if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "NASA base url must use HTTP or HTTPS scheme. Got: {}",
                        base_url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Client timeout must be > 0"));
                }
                Ok(())
            }
            ClientConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom client factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom client config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the client type name
    pub fn type_name(&self) -> &str {
        match self {
            ClientConfig::Nasa { .. } => "nasa",
            ClientConfig::Custom { factory, .. } => factory,
        }
    }
}

// The api key is a credential and must not reach logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientConfig::Nasa {
                base_url,
                timeout_secs,
                ..
            } => f
                .debug_struct("Nasa")
                .field("api_key", &"<REDACTED>")
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
            ClientConfig::Custom { factory, config } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", config)
                .finish(),
        }
    }
}

/// Cache storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheConfig {
    /// File-backed store
    File {
        /// Path to the cache file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl CacheConfig {
    /// Validate the cache configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CacheConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Cache file path cannot be empty"))
            }
            CacheConfig::Custom { factory, .. } if factory.is_empty() => {
                Err(crate::Error::config("Custom cache factory cannot be empty"))
            }
            _ => Ok(()),
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            CacheConfig::File { .. } => "file",
            CacheConfig::Memory => "memory",
            CacheConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Publisher clock configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Publisher offset east of UTC, in seconds
    #[serde(default = "default_utc_offset_secs")]
    pub utc_offset_secs: i32,
}

impl ClockConfig {
    /// Validate the clock configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.utc_offset_secs.abs() > MAX_UTC_OFFSET_SECS {
            return Err(crate::Error::config(format!(
                "Publisher UTC offset must be within ±{}s. Got: {}",
                MAX_UTC_OFFSET_SECS, self.utc_offset_secs
            )));
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset_secs: default_utc_offset_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Namespace for cache keys (`<prefix>_<YYYY-MM-DD>`)
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Serialize overlapping lookups for the same date
    ///
    /// When enabled, a second caller waits for the first one's remote call
    /// and is then served from the cache. When disabled, both fetch and the
    /// cache converges on the last successful write.
    #[serde(default = "default_coalesce_requests")]
    pub coalesce_requests: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.key_prefix.is_empty() {
            return Err(crate::Error::config("Cache key prefix cannot be empty"));
        }
        if self.key_prefix.chars().any(char::is_whitespace) {
            return Err(crate::Error::config(format!(
                "Cache key prefix cannot contain whitespace. Got: {:?}",
                self.key_prefix
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            coalesce_requests: default_coalesce_requests(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_NASA_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_utc_offset_secs() -> i32 {
    DEFAULT_UTC_OFFSET_SECS
}

fn default_key_prefix() -> String {
    "apod".to_string()
}

fn default_coalesce_requests() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    100
}
