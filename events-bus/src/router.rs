//! Change events to cache invalidations

use std::sync::Arc;

use tracing::trace;

use crate::entity::CacheKey;
use crate::event::ChangeEvent;

/// Client-side query cache as seen by the router
///
/// Invalidation marks a result set stale; the next read re-fetches it.
/// It cannot fail observably.
#[cfg_attr(test, mockall::automock)]
pub trait DataCache: Send + Sync {
    fn invalidate(&self, key: &CacheKey);
}

pub struct ChangeRouter {
    cache: Arc<dyn DataCache>,
}

impl ChangeRouter {
    pub fn new(cache: Arc<dyn DataCache>) -> Self {
        Self { cache }
    }

    /// Invalidate every key configured for the event's entity; returns how many
    pub fn route(&self, event: &ChangeEvent) -> usize {
        let keys = event.entity.cache_keys();
        for key in keys {
            trace!(table = event.entity.table(), cache_key = %key, "Invalidating cache key");
            self.cache.invalidate(key);
        }
        keys.len()
    }
}
