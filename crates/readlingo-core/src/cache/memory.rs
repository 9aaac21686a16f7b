use chrono::{DateTime, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::EvictionPolicy;
use crate::model::TranslationResult;

struct Slot {
    result: TranslationResult,
    expires_at: DateTime<Utc>,
}

/// Bounded in-memory tier.
///
/// Under [`EvictionPolicy::Fifo`] reads use `peek`, so recency order is
/// insertion order and the oldest insertion is evicted first. Writing an
/// existing key counts as a fresh insertion. Under [`EvictionPolicy::Lru`]
/// reads also refresh an entry's position.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, Slot>>,
    policy: EvictionPolicy,
}

impl MemoryCache {
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live entry for `key`, dropping it if it expired before `now`.
    pub fn get(&self, key: &str, now: DateTime<Utc>) -> Option<TranslationResult> {
        let mut entries = self.lock();

        {
            let slot = match self.policy {
                EvictionPolicy::Fifo => entries.peek(key),
                EvictionPolicy::Lru => entries.get(key),
            }?;
            if now <= slot.expires_at {
                return Some(slot.result.clone());
            }
        }

        entries.pop(key);
        None
    }

    pub fn insert(&self, key: String, result: TranslationResult, expires_at: DateTime<Utc>) {
        self.lock().put(key, Slot { result, expires_at });
    }

    pub fn remove(&self, key: &str) {
        self.lock().pop(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
