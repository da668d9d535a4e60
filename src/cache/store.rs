//! Persistent cache backends.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, warn};

use super::CacheEntry;

/// A persistent store for cache entries.
///
/// Stores are best-effort: a failed read is a miss, a failed write is
/// logged and dropped. The search path never fails because of the cache.
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Fetch an entry by key, if present
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Persist an entry under its key
    fn put(&self, entry: &CacheEntry);
}

/// In-memory store, used when persistence is disabled and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn put(&self, entry: &CacheEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(entry.key.clone(), entry.clone());
        }
    }
}

/// File-backed store: one JSON file per entry, named by the entry key.
///
/// Keys are hex digests, so they are always safe as file names.
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        if let Err(err) = std::fs::create_dir_all(&directory) {
            warn!(dir = %directory.display(), error = %err, "failed to create cache directory");
        }
        Self { directory }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", key))
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let path = self.path_for(key);
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "discarding unreadable cache file");
                None
            }
        }
    }

    fn put(&self, entry: &CacheEntry) {
        let path = self.path_for(&entry.key);
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "failed to serialize cache entry");
                return;
            }
        };
        if let Err(err) = std::fs::write(&path, raw) {
            warn!(path = %path.display(), error = %err, "failed to write cache entry");
        } else {
            debug!(path = %path.display(), "cached response");
        }
    }
}
