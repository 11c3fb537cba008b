// # File Store
//
// File-based implementation of KeyValueStore with crash recovery.
//
// ## Purpose
//
// Keeps cached records across restarts so previously viewed dates can be
// shown offline.
//
// ## Crash Recovery
//
// - Atomic writes: write-then-rename, so the file is always a whole document
// - Corruption detection: JSON validation on load
// - Automatic backup: keeps .backup of the previous document
// - Recovery: falls back to backup if corruption detected, else starts empty
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "entries": {
//     "apod_2024-01-01": "{\"key\":\"apod_2024-01-01\",\"value\":{...},\"stored_at\":\"...\"}"
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::CacheConfig;
use crate::traits::{KeyValueStore, KeyValueStoreFactory};

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// File-based key-value store with crash recovery
///
/// Every mutation rewrites the document under the write lock, so writers are
/// serialized and a reader never observes a half-applied write.
///
/// # Example
///
/// ```rust,no_run
/// use apod_core::store::FileStore;
/// use apod_core::traits::KeyValueStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStore::new("/var/cache/apod/cache.json").await?;
///     store.write("apod_2024-01-01", "{}").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Create or load a file store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Load the existing file
    /// 3. If it is corrupted, load the backup
    /// 4. If both fail, start empty
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let entries = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<BTreeMap<String, String>, Error> {
        match Self::load(path).await {
            Ok(entries) => {
                tracing::debug!("Loaded cache file: {} entries", entries.len());
                Ok(entries)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "Cache file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty cache.");
                    return Ok(BTreeMap::new());
                }

                match Self::load(&backup_path).await {
                    Ok(entries) => {
                        tracing::info!("Recovered cache from backup: {} entries", entries.len());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore cache file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(entries)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with empty cache.",
                            backup_err
                        );
                        Ok(BTreeMap::new())
                    }
                }
            }
            Err(other) => Err(other),
        }
    }

    async fn load(path: &Path) -> Result<BTreeMap<String, String>, Error> {
        if !path.exists() {
            tracing::debug!("Cache file does not exist: {}", path.display());
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path).await?;
        let document: StoreFileFormat = serde_json::from_str(&content)?;

        if document.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Cache file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STORE_FILE_VERSION,
                document.version
            );
        }

        Ok(document.entries)
    }

    /// Write the whole document atomically
    ///
    /// Caller holds the write lock.
    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        let document = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            entries: entries.clone(),
        };

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::store(format!("Failed to serialize cache: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!("Failed to create cache backup: {}", e);
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Cache written to file: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn read(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());

        // Readers only see the new value once it is on disk
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);

        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let entries = self.entries.read().await;
        Ok(entries.keys().cloned().collect())
    }

    /// Rewrite the document from memory
    ///
    /// Every successful write is already on disk; this restores a file
    /// removed or damaged behind the store's back.
    async fn flush(&self) -> Result<(), Error> {
        let entries = self.entries.write().await;
        self.persist(&entries).await
    }
}

/// Factory for `"file"` cache configs
pub struct FileStoreFactory;

#[async_trait]
impl KeyValueStoreFactory for FileStoreFactory {
    async fn create(&self, config: &CacheConfig) -> Result<Box<dyn KeyValueStore>, Error> {
        match config {
            CacheConfig::File { path } => Ok(Box::new(FileStore::new(path).await?)),
            _ => Err(Error::config("Invalid config for file store")),
        }
    }
}
