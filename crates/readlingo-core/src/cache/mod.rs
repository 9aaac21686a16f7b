mod disk;
mod key;
mod memory;
mod store;

pub use disk::SledStore;
pub use key::{CacheKey, normalize};
pub use memory::MemoryCache;
pub use store::{CacheStore, EphemeralStore};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, CacheConfig};
use crate::error::{Error, Result};
use crate::model::{CacheEntry, CacheStats, TranslationResult};

/// Two-tier translation cache.
///
/// The persistent store is the source of truth. The bounded memory tier is
/// written through on every successful `set` and populated on persistent hits;
/// it never holds a live value that differs from the store.
///
/// Store writes take `write_gate` exclusively. A lookup that falls through to
/// the store holds it shared from the store read until the memory promotion,
/// so a promotion can never overwrite a newer write.
pub struct TranslationCache {
    memory: MemoryCache,
    store: Arc<dyn CacheStore>,
    write_gate: RwLock<()>,
    clock: Arc<dyn Clock>,
    ttl_days: u32,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            memory: MemoryCache::new(config.memory_capacity, config.eviction),
            store,
            write_gate: RwLock::new(()),
            clock: Arc::new(SystemClock),
            ttl_days: config.ttl_days,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create a cache from configuration, opening the sled store unless disk
    /// persistence is disabled.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn CacheStore> = if config.cache.disk_enabled {
            Arc::new(SledStore::open(config.disk_path())?)
        } else {
            Arc::new(EphemeralStore::new())
        };
        Ok(Self::new(store, &config.cache))
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get a cached translation if present and not expired.
    ///
    /// Persistent-tier read failures are logged and reported as a miss.
    pub async fn get(&self, text: &str) -> Option<TranslationResult> {
        let key = CacheKey::new(text);
        let now = self.clock.now();

        if let Some(result) = self.memory.get(key.as_str(), now) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(result);
        }

        let _gate = self.write_gate.read().await;
        let entry = match self.store.get(key.as_str()).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                warn!("Failed to read translation cache for '{}': {}", key, e);
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if entry.is_expired_at(now) {
            debug!("Dropping expired cache entry '{}'", key);
            if let Err(e) = self.store.delete(key.as_str()).await {
                warn!("Failed to delete expired cache entry '{}': {}", key, e);
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.memory
            .insert(key.into_string(), entry.result.clone(), entry.expires_at);
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.result)
    }

    /// Store a translation with the configured lifetime.
    pub async fn set(&self, text: &str, result: TranslationResult) -> Result<()> {
        self.set_with_ttl(text, result, self.ttl_days).await
    }

    /// Store a translation that expires `ttl_days` from now.
    ///
    /// The memory tier is only updated once the persistent write succeeded.
    pub async fn set_with_ttl(
        &self,
        text: &str,
        result: TranslationResult,
        ttl_days: u32,
    ) -> Result<()> {
        let entry = self.entry(CacheKey::new(text), result, ttl_days);
        let (key, result, expires_at) = (entry.key.clone(), entry.result.clone(), entry.expires_at);

        let _gate = self.write_gate.write().await;
        self.store.put(entry).await?;
        self.memory.insert(key, result, expires_at);
        Ok(())
    }

    fn entry(&self, key: CacheKey, result: TranslationResult, ttl_days: u32) -> CacheEntry {
        let now = self.clock.now();
        CacheEntry {
            key: key.into_string(),
            result,
            cached_at: now,
            expires_at: expiry_after(now, ttl_days),
        }
    }

    /// Check whether a live translation is cached. Counts as a lookup.
    pub async fn has(&self, text: &str) -> bool {
        self.get(text).await.is_some()
    }

    /// Remove one translation from both tiers.
    pub async fn delete(&self, text: &str) -> Result<()> {
        let key = CacheKey::new(text);
        let _gate = self.write_gate.write().await;
        self.store.delete(key.as_str()).await?;
        self.memory.remove(key.as_str());
        Ok(())
    }

    /// Clear both tiers and reset the hit/miss counters.
    pub async fn clear(&self) -> Result<()> {
        let _gate = self.write_gate.write().await;
        self.store.clear().await?;
        self.memory.clear();
        self.reset_stats();
        Ok(())
    }

    /// Delete every persistent entry that has expired, returning how many
    /// were removed.
    ///
    /// The memory tier is left alone: its slots carry their own expiry and are
    /// re-validated on read.
    pub async fn clean_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let _gate = self.write_gate.write().await;
        let keys: Vec<String> = self
            .store
            .expired_before(now)
            .await?
            .into_iter()
            .map(|entry| entry.key)
            .collect();

        if keys.is_empty() {
            return Ok(0);
        }

        let removed = self.store.bulk_delete(&keys).await?;
        debug!("Removed {} expired translation cache entries", removed);
        Ok(removed)
    }

    /// Bulk-write `(text, result)` pairs at the default lifetime, bypassing
    /// the per-entry path.
    pub async fn preload(&self, entries: Vec<(String, TranslationResult)>) -> Result<usize> {
        let records: Vec<CacheEntry> = entries
            .into_iter()
            .map(|(text, result)| self.entry(CacheKey::new(&text), result, self.ttl_days))
            .collect();
        let count = records.len();

        let _gate = self.write_gate.write().await;
        // Stale memory slots for overwritten keys would otherwise shadow the store
        for record in &records {
            self.memory.remove(&record.key);
        }

        self.store.bulk_put(records).await?;
        Ok(count)
    }

    pub async fn stats(&self) -> CacheStats {
        let total_entries = match self.store.count().await {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to count translation cache entries: {}", e);
                0
            }
        };

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            memory_entries: self.memory.len(),
            total_entries,
            hit_rate,
        }
    }

    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Every persisted entry, for export.
    pub async fn entries(&self) -> Result<Vec<CacheEntry>> {
        self.store.scan().await
    }

    /// Approximate size in bytes of the persisted entries, measured as JSON.
    pub async fn size_estimate(&self) -> Result<usize> {
        let entries = self.entries().await?;
        serde_json::to_vec(&entries)
            .map(|bytes| bytes.len())
            .map_err(|e| Error::CacheRead(e.to_string()))
    }

    /// Whether `text` is currently served from the memory tier.
    pub fn in_memory(&self, text: &str) -> bool {
        self.memory.contains(CacheKey::new(text).as_str())
    }
}

/// `now + ttl_days`, capped at the last second of year 9999 so the
/// expiry stays representable in RFC 3339.
fn expiry_after(now: DateTime<Utc>, ttl_days: u32) -> DateTime<Utc> {
    let latest = NaiveDate::from_ymd_opt(9999, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map_or(DateTime::<Utc>::MAX_UTC, |at| at.and_utc());

    Duration::try_days(i64::from(ttl_days))
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map_or(latest, |at| at.min(latest))
}
