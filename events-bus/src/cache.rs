//! Data cache implementations

use std::future::Future;

use moka::sync::Cache;
use parking_lot::Mutex;
use tracing::debug;

use crate::entity::CacheKey;
use crate::router::DataCache;

/// Moka-backed query cache keyed by logical query identity
pub struct QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    entries: Cache<CacheKey, V>,
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.entries.get(key)
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        self.entries.insert(key, value);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Cached value, or the result of `fetch` stored under `key`
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.entries.get(&key) {
            return Ok(value);
        }

        debug!(cache_key = %key, "Cache miss, fetching");
        let value = fetch().await?;
        self.entries.insert(key, value.clone());
        Ok(value)
    }
}

impl<V> DataCache for QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn invalidate(&self, key: &CacheKey) {
        self.entries.invalidate(key);
    }
}

/// Cache that only remembers which keys were invalidated
#[derive(Debug, Default)]
pub struct RecordingCache {
    invalidations: Mutex<Vec<CacheKey>>,
}

impl RecordingCache {
    pub fn invalidations(&self) -> Vec<CacheKey> {
        self.invalidations.lock().clone()
    }
}

impl DataCache for RecordingCache {
    fn invalidate(&self, key: &CacheKey) {
        self.invalidations.lock().push(*key);
    }
}
