//! Content-addressed request cache.
//!
//! Every outbound page request is identified by a SHA-256 digest over the
//! provider id, the canonical request URL, an auth signature, and any extra
//! request context (for providers whose continuation state is not visible
//! in the URL). Two tiers: a per-process memory map in front of a pluggable
//! persistent [`CacheStore`].
//!
//! Entries are write-once and never expire. Bibliographic search results
//! drift slowly; a caller who wants fresh data points the cache at an empty
//! directory or disables it.

mod store;

pub use store::{CacheStore, FileStore, MemoryStore};

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Request headers whose values participate in the cache key.
///
/// Only credential-bearing headers change what a provider returns for the
/// same URL. Header names are compared case-insensitively; values are
/// hashed, never stored.
const AUTH_HEADER_ALLOW_LIST: [&str; 5] = [
    "authorization",
    "api-key",
    "x-api-key",
    "x-apikey",
    "x-els-apikey",
];

/// One cached provider response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Content-addressed key (SHA-256 hex digest)
    pub key: String,

    /// Provider that served this response
    pub provider: String,

    /// The request URL (stored for inspection, not part of lookups)
    pub url: String,

    /// Raw response payload
    pub payload: String,

    /// Unix timestamp of when the entry was written
    pub cached_at: i64,
}

impl CacheEntry {
    pub fn new(
        key: impl Into<String>,
        provider: impl Into<String>,
        url: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            provider: provider.into(),
            url: url.into(),
            payload: payload.into(),
            cached_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Compute the content-addressed key for one page request.
///
/// The digest covers, in order: provider id, canonical URL, an auth
/// signature derived from allow-listed header values, and the sorted
/// `context` map. Headers outside the allow list never affect the key, so
/// cosmetic headers (user-agent, accept) cannot split the cache.
pub fn request_key(
    provider: &str,
    url: &str,
    headers: &[(String, String)],
    context: &BTreeMap<String, String>,
) -> String {
    let mut auth = Sha256::new();
    for name in AUTH_HEADER_ALLOW_LIST {
        for (header, value) in headers {
            if header.eq_ignore_ascii_case(name) {
                auth.update(name.as_bytes());
                auth.update(b"=");
                auth.update(value.as_bytes());
                auth.update(b"\n");
            }
        }
    }
    let auth_signature = format!("{:x}", auth.finalize());

    let mut hasher = Sha256::new();
    hasher.update(provider.as_bytes());
    hasher.update(b"|");
    hasher.update(url.as_bytes());
    hasher.update(b"|");
    hasher.update(auth_signature.as_bytes());
    for (key, value) in context {
        hasher.update(b"|");
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Two-tier request cache: memory map in front of a persistent store.
#[derive(Debug, Clone)]
pub struct RequestCache {
    memory: Arc<Mutex<HashMap<String, CacheEntry>>>,
    store: Arc<dyn CacheStore>,
}

impl RequestCache {
    /// Build a cache over the given persistent store
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            memory: Arc::new(Mutex::new(HashMap::new())),
            store,
        }
    }

    /// A cache with no persistence beyond this process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// A cache persisted as JSON files under `directory`
    pub fn on_disk(directory: impl Into<std::path::PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(directory)))
    }

    /// Look up a cached payload. A hit in the persistent tier is promoted
    /// into the memory tier.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        if let Ok(memory) = self.memory.lock() {
            if let Some(entry) = memory.get(key) {
                debug!(key, "cache hit (memory)");
                return Some(entry.clone());
            }
        }

        let entry = self.store.get(key)?;
        debug!(key, "cache hit (store)");
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(key.to_string(), entry.clone());
        }
        Some(entry)
    }

    /// Store a payload in both tiers. Entries are write-once: an existing
    /// entry under the same key is left untouched.
    pub fn put(&self, entry: CacheEntry) {
        if let Ok(mut memory) = self.memory.lock() {
            if memory.contains_key(&entry.key) {
                return;
            }
            memory.insert(entry.key.clone(), entry.clone());
        }
        self.store.put(&entry);
    }
}
