//! TTL cache for merged search results.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::backend::SearchHit;

use super::types::CacheKey;

#[derive(Debug, Clone)]
struct CacheEntry {
    hits: Vec<SearchHit>,
    fetched_at: Instant,
}

/// Process-lifetime result cache.
///
/// Entries expire lazily on read; stale entries are also swept whenever a new
/// entry is inserted, so unique-query traffic cannot grow it forever.
pub struct SearchCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SearchCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached hits for `key` if the entry is no older than the TTL.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<SearchHit>> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() <= self.ttl {
            return Some(entry.hits.clone());
        }
        entries.remove(key);
        debug!(query = %key.query, "Search cache entry expired");
        None
    }

    pub async fn insert(&self, key: CacheKey, hits: Vec<SearchHit>) {
        let mut entries = self.entries.lock().await;
        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at.elapsed() <= ttl);
        let swept = before - entries.len();
        if swept > 0 {
            debug!(swept = swept, "Swept stale search cache entries");
        }
        entries.insert(
            key,
            CacheEntry {
                hits,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
