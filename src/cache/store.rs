//! Persistent image cache
//!
//! The store maps derived URL keys to the record of a successful download.
//! It is shared by every fetch task of a run, so all map access goes through
//! a single mutex. File and network I/O always happen outside that lock.

use crate::cache::derive_key;
use crate::{CacheError, CacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Record of one successful image retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The reference exactly as it appeared in the document
    #[serde(rename = "url")]
    pub source_url: String,

    /// Where the downloaded bytes live on disk
    #[serde(rename = "file_path")]
    pub local_path: PathBuf,

    /// When the download completed
    pub fetched_at: DateTime<Utc>,

    /// HTTP status of the retrieval
    pub status_code: u16,
}

impl CacheEntry {
    /// Creates an entry for a download that just completed with HTTP 200
    pub fn downloaded(source_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            local_path: local_path.into(),
            fetched_at: Utc::now(),
            status_code: 200,
        }
    }

    /// Checks whether the cached file is still present on disk
    ///
    /// Entries whose file was deleted are treated as misses by the pipeline.
    pub fn file_exists(&self) -> bool {
        self.local_path.is_file()
    }
}

/// Lock-guarded cache of downloaded images, keyed by [`derive_key`]
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CacheStore {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads entries from a JSON cache file, replacing the current contents
    ///
    /// # Returns
    ///
    /// * `Ok(n)` - Number of entries loaded (`0` when the file does not exist)
    /// * `Err(CacheError::Malformed)` - The file exists but is not a valid cache
    /// * `Err(CacheError::Read)` - The file exists but could not be read
    pub async fn load(&self, path: &Path) -> CacheResult<usize> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Cache file does not exist yet: {}", path.display());
                return Ok(0);
            }
            Err(source) => {
                return Err(CacheError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let entries: HashMap<String, CacheEntry> =
            serde_json::from_str(&content).map_err(|source| CacheError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        let count = entries.len();
        *self.lock() = entries;
        Ok(count)
    }

    /// Writes every entry to `path` as pretty-printed JSON with sorted keys
    ///
    /// The file is overwritten. Missing parent directories are created.
    pub async fn save(&self, path: &Path) -> CacheResult<()> {
        let snapshot = self.snapshot();
        let mut json = serde_json::to_string_pretty(&snapshot)?;
        json.push('\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|source| CacheError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }

        tokio::fs::write(path, json)
            .await
            .map_err(|source| CacheError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Looks up the entry recorded for `url`
    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        let key = derive_key(url);
        self.lock().get(&key).cloned()
    }

    /// Records `entry` for `url`, overwriting any previous entry
    pub fn set(&self, url: &str, entry: CacheEntry) {
        let key = derive_key(url);
        self.lock().insert(key, entry);
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a sorted copy of the entry mapping
    pub fn snapshot(&self) -> BTreeMap<String, CacheEntry> {
        self.lock()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panicking task cannot leave the map half-updated: every critical
        // section is a single insert or lookup.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
