use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::model::CacheEntry;

/// Persistent tier contract.
///
/// Keys are normalized texts. Implementations must not assume anything about
/// how the cache layer above them batches or orders calls.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace the entry under `entry.key`
    async fn put(&self, entry: CacheEntry) -> Result<()>;

    async fn bulk_put(&self, entries: Vec<CacheEntry>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every listed key, returning how many existed
    async fn bulk_delete(&self, keys: &[String]) -> Result<usize>;

    async fn count(&self) -> Result<usize>;

    /// Entries whose expiry lies strictly before `now`
    async fn expired_before(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>>;

    /// Every stored entry
    async fn scan(&self) -> Result<Vec<CacheEntry>>;

    async fn clear(&self) -> Result<()>;
}

/// In-process store, used when disk persistence is disabled.
#[derive(Default)]
pub struct EphemeralStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for EphemeralStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        self.entries.write().await.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn bulk_put(&self, entries: Vec<CacheEntry>) -> Result<()> {
        let mut map = self.entries.write().await;
        for entry in entries {
            map.insert(entry.key.clone(), entry);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn bulk_delete(&self, keys: &[String]) -> Result<usize> {
        let mut map = self.entries.write().await;
        Ok(keys.iter().filter(|key| map.remove(key.as_str()).is_some()).count())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    async fn expired_before(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|entry| entry.expires_at < now)
            .cloned()
            .collect())
    }

    async fn scan(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
