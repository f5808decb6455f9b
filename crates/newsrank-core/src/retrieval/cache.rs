//! Injectable search result cache.
//!
//! Entries expire after a TTL and the map is bounded; when full, the oldest
//! entry is evicted. The cache is owned by whoever builds the engine, never
//! process-wide.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::engine::SearchOutcome;
use super::modes::SearchMode;

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds an entry stays valid.
    pub ttl_secs: u64,
    /// Upper bound on stored entries.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    limit: usize,
    mode: SearchMode,
}

impl CacheKey {
    fn new(query: &str, limit: usize, mode: SearchMode) -> Self {
        Self {
            query: normalize_query(query),
            limit,
            mode,
        }
    }
}

struct CacheEntry {
    outcome: SearchOutcome,
    inserted_at: Instant,
}

/// TTL + size bounded cache of search outcomes.
pub struct SearchCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SearchCache {
    /// Create a cache from its settings.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            max_entries: config.max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a live entry. Expired entries are removed on access.
    pub async fn get(&self, query: &str, limit: usize, mode: SearchMode) -> Option<SearchOutcome> {
        let key = CacheKey::new(query, limit, mode);
        let mut entries = self.entries.lock().await;

        let expired = match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.outcome.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(&key);
        }
        None
    }

    /// Store an outcome, evicting expired entries and then the oldest one
    /// if the cache is full.
    pub async fn insert(&self, query: &str, limit: usize, mode: SearchMode, outcome: SearchOutcome) {
        let key = CacheKey::new(query, limit, mode);
        let mut entries = self.entries.lock().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                outcome,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, including any not yet swept after expiry.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

/// Collapse runs of whitespace and trim. Case is kept because the
/// embedder sees the query as written.
pub(crate) fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}
