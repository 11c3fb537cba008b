//! Date-keyed content cache
//!
//! Wraps a [`KeyValueStore`] and owns the key format and encoding:
//!
//! ```text
//! key   = <prefix>_<YYYY-MM-DD>        e.g. apod_2024-01-01
//! value = JSON CacheEntry { key, value: ContentRecord, stored_at }
//! ```
//!
//! Past records are never revised by the publisher, so entries do not expire.
//! There is exactly one entry per date; `put` overwrites.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::ContentRecord;
use crate::traits::KeyValueStore;

/// ISO 8601 calendar date, as used in cache keys
const KEY_DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored record with its key and write time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    key: String,
    value: ContentRecord,
    stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &ContentRecord {
        &self.value
    }

    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    pub fn into_value(self) -> ContentRecord {
        self.value
    }
}

/// Content cache keyed by calendar date
pub struct ContentCache {
    store: Box<dyn KeyValueStore>,
    prefix: String,
}

impl ContentCache {
    /// Create a cache over `store` with the given key namespace
    pub fn new(store: Box<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Key namespace
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Storage key for `date`
    pub fn key_for(&self, date: NaiveDate) -> String {
        format!("{}_{}", self.prefix, date.format(KEY_DATE_FORMAT))
    }

    fn date_from_key(&self, key: &str) -> Option<NaiveDate> {
        let raw = key.strip_prefix(&self.prefix)?.strip_prefix('_')?;
        NaiveDate::parse_from_str(raw, KEY_DATE_FORMAT).ok()
    }

    /// Cached record for `date`, if any
    pub async fn get(&self, date: NaiveDate) -> Result<Option<ContentRecord>> {
        Ok(self.entry(date).await?.map(CacheEntry::into_value))
    }

    /// Full cache entry for `date`, if any
    ///
    /// An entry that no longer decodes, or whose record belongs to another
    /// date, is reported as absent so the next fetch replaces it.
    pub async fn entry(&self, date: NaiveDate) -> Result<Option<CacheEntry>> {
        let key = self.key_for(date);
        let Some(raw) = self.store.read(&key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if entry.value.date() == date => Ok(Some(entry)),
            Ok(entry) => {
                warn!(
                    "Cache entry {} holds a record for {}, ignoring",
                    key,
                    entry.value.date()
                );
                Ok(None)
            }
            Err(e) => {
                warn!("Cache entry {} is unreadable, ignoring: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Store `record` under `date`, replacing any previous entry
    ///
    /// Fails with `InvalidInput` when the record's own date differs from `date`.
    pub async fn put(&self, date: NaiveDate, record: &ContentRecord) -> Result<()> {
        if record.date() != date {
            return Err(Error::invalid_input(format!(
                "Record dated {} cannot be cached under {}",
                record.date(),
                date
            )));
        }

        let entry = CacheEntry {
            key: self.key_for(date),
            value: record.clone(),
            stored_at: Utc::now(),
        };
        let raw = serde_json::to_string(&entry)?;

        self.store.write(&entry.key, &raw).await?;
        debug!("Cached record under {}", entry.key);
        Ok(())
    }

    /// Dates with an entry under this namespace, oldest first
    pub async fn cached_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .store
            .keys()
            .await?
            .iter()
            .filter_map(|key| self.date_from_key(key))
            .collect();
        dates.sort_unstable();
        Ok(dates)
    }

    /// Persist any pending store changes
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
