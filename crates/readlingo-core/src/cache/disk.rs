use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sled::{Batch, Db, Tree};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use super::store::CacheStore;
use crate::error::{Error, Result};
use crate::model::CacheEntry;

const ENTRIES_TREE: &str = "entries";
const EXPIRY_INDEX_TREE: &str = "by_expiry";

/// Disk-backed persistent tier using sled.
///
/// `entries` maps normalized text to a JSON-encoded [`CacheEntry`]. `by_expiry`
/// is a secondary index keyed by big-endian expiry millis followed by the
/// entry key, so expired entries can be found with a range scan.
pub struct SledStore {
    db: Db,
    entries: Tree,
    by_expiry: Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::CacheInit(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let db = sled::open(path).map_err(|e| {
            let err_str = e.to_string();
            // Lock errors get an actionable hint
            if err_str.contains("WouldBlock") || err_str.contains("lock") {
                Error::CacheInit(format!(
                    "Cache locked at {}\n\n\
                    Another process is using the cache, or a previous instance crashed.\n\
                    To fix: rm {}/db/LOCK",
                    path.display(),
                    path.display()
                ))
            } else {
                Error::CacheInit(format!("Failed to open cache at {}: {}", path.display(), e))
            }
        })?;

        debug!("Opened disk cache at {}", path.display());
        Self::from_db(db)
    }

    /// Throwaway database, removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| Error::CacheInit(e.to_string()))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        let entries = db
            .open_tree(ENTRIES_TREE)
            .map_err(|e| Error::CacheInit(e.to_string()))?;
        let by_expiry = db
            .open_tree(EXPIRY_INDEX_TREE)
            .map_err(|e| Error::CacheInit(e.to_string()))?;

        Ok(Self {
            db,
            entries,
            by_expiry,
        })
    }

    fn decode(bytes: &[u8]) -> Result<CacheEntry> {
        serde_json::from_slice(bytes).map_err(|e| Error::CacheRead(e.to_string()))
    }

    fn encode(entry: &CacheEntry) -> Result<Vec<u8>> {
        serde_json::to_vec(entry).map_err(|e| Error::CacheWrite(e.to_string()))
    }

    fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        self.entries
            .get(key.as_bytes())
            .map_err(|e| Error::CacheRead(e.to_string()))?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    /// Stage the primary and index writes for one entry, dropping the index
    /// record of any entry it replaces.
    fn stage_put(&self, entry: &CacheEntry, primary: &mut Batch, index: &mut Batch) -> Result<()> {
        if let Some(previous) = self.read(&entry.key)? {
            index.remove(index_key(previous.expires_at, &previous.key));
        }
        primary.insert(entry.key.as_bytes(), Self::encode(entry)?);
        index.insert(index_key(entry.expires_at, &entry.key), &[] as &[u8]);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| Error::CacheWrite(format!("Flush failed: {e}")))?;
        Ok(())
    }

    fn apply(&self, primary: Batch, index: Batch) -> Result<()> {
        self.entries
            .apply_batch(primary)
            .map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.by_expiry
            .apply_batch(index)
            .map_err(|e| Error::CacheWrite(e.to_string()))?;
        Ok(())
    }
}

fn expiry_millis(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp_millis()).unwrap_or(0)
}

fn index_key(expires_at: DateTime<Utc>, key: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + key.len());
    out.extend_from_slice(&expiry_millis(expires_at).to_be_bytes());
    out.extend_from_slice(key.as_bytes());
    out
}

#[async_trait]
impl CacheStore for SledStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        self.read(key)
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let mut primary = Batch::default();
        let mut index = Batch::default();
        self.stage_put(&entry, &mut primary, &mut index)?;
        self.apply(primary, index)?;
        self.flush().await
    }

    async fn bulk_put(&self, entries: Vec<CacheEntry>) -> Result<()> {
        // Later entries for a key replace earlier ones, as sequential puts would
        let latest: HashMap<String, CacheEntry> = entries
            .into_iter()
            .map(|entry| (entry.key.clone(), entry))
            .collect();

        let mut primary = Batch::default();
        let mut index = Batch::default();
        for entry in latest.values() {
            self.stage_put(entry, &mut primary, &mut index)?;
        }
        self.apply(primary, index)?;
        self.flush().await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self
            .entries
            .remove(key.as_bytes())
            .map_err(|e| Error::CacheWrite(e.to_string()))?;

        if let Some(bytes) = removed
            && let Ok(entry) = Self::decode(&bytes)
        {
            self.by_expiry
                .remove(index_key(entry.expires_at, &entry.key))
                .map_err(|e| Error::CacheWrite(e.to_string()))?;
        }
        Ok(())
    }

    async fn bulk_delete(&self, keys: &[String]) -> Result<usize> {
        let mut primary = Batch::default();
        let mut index = Batch::default();
        let mut removed = 0;

        for key in keys {
            if let Some(entry) = self.read(key)? {
                primary.remove(key.as_bytes());
                index.remove(index_key(entry.expires_at, &entry.key));
                removed += 1;
            }
        }

        self.apply(primary, index)?;
        self.flush().await?;
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    async fn expired_before(&self, now: DateTime<Utc>) -> Result<Vec<CacheEntry>> {
        // Index keys are millisecond-truncated; include all of `now`'s millisecond
        let upper = expiry_millis(now).saturating_add(1).to_be_bytes();
        let mut expired = Vec::new();

        for item in self.by_expiry.range(..upper.as_slice()) {
            let (index_key, _) = item.map_err(|e| Error::CacheRead(e.to_string()))?;
            let Ok(key) = std::str::from_utf8(&index_key[8..]) else {
                continue;
            };

            // The index may briefly lag the primary tree; trust the entry itself
            match self.read(key) {
                Ok(Some(entry)) if entry.expires_at < now => expired.push(entry),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable cache entry {}: {}", key, e),
            }
        }

        Ok(expired)
    }

    async fn scan(&self) -> Result<Vec<CacheEntry>> {
        let mut all = Vec::with_capacity(self.entries.len());
        for item in self.entries.iter() {
            let (key, value) = item.map_err(|e| Error::CacheRead(e.to_string()))?;
            match Self::decode(&value) {
                Ok(entry) => all.push(entry),
                Err(e) => warn!("Skipping unreadable cache entry {:?}: {}", key, e),
            }
        }
        Ok(all)
    }

    async fn clear(&self) -> Result<()> {
        self.entries.clear().map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.by_expiry.clear().map_err(|e| Error::CacheWrite(e.to_string()))?;
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TranslationResult;
    use chrono::Duration;

    fn entry(key: &str, expires_at: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            result: TranslationResult::new(format!("{key}-zh")),
            cached_at: expires_at - Duration::days(30),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = SledStore::temporary().unwrap();
        let now = Utc::now();

        store.put(entry("hello", now)).await.unwrap();
        let loaded = store.get("hello").await.unwrap().unwrap();
        assert_eq!(loaded.result.translation, "hello-zh");
        assert_eq!(store.count().await.unwrap(), 1);

        store.delete("hello").await.unwrap();
        assert!(store.get("hello").await.unwrap().is_none());
        assert!(store.expired_before(now + Duration::days(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_before_uses_index() {
        let store = SledStore::temporary().unwrap();
        let now = Utc::now();

        store
            .bulk_put(vec![
                entry("old", now - Duration::days(2)),
                entry("older", now - Duration::days(5)),
                entry("fresh", now + Duration::days(5)),
            ])
            .await
            .unwrap();

        let mut expired: Vec<String> = store
            .expired_before(now)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        expired.sort();
        assert_eq!(expired, vec!["old".to_string(), "older".to_string()]);
    }

    #[tokio::test]
    async fn test_replacing_entry_moves_index_record() {
        let store = SledStore::temporary().unwrap();
        let now = Utc::now();

        store.put(entry("word", now - Duration::days(1))).await.unwrap();
        store.put(entry("word", now + Duration::days(30))).await.unwrap();

        assert!(store.expired_before(now).await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_counts_existing_only() {
        let store = SledStore::temporary().unwrap();
        let now = Utc::now();
        store.put(entry("a", now)).await.unwrap();
        store.put(entry("b", now)).await.unwrap();

        let removed = store
            .bulk_delete(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache");

        {
            let store = SledStore::open(&path).unwrap();
            store.put(entry("persist", Utc::now())).await.unwrap();
        }

        let store = SledStore::open(&path).unwrap();
        assert!(store.get("persist").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_bulk_put_collapses_duplicate_keys() {
        let store = SledStore::temporary().unwrap();
        let now = Utc::now();

        store
            .bulk_put(vec![
                entry("apple", now - Duration::days(3)),
                entry("apple", now + Duration::days(30)),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.by_expiry.len(), 1);
        assert!(store.expired_before(now).await.unwrap().is_empty());
        assert_eq!(
            store.get("apple").await.unwrap().unwrap().expires_at,
            now + Duration::days(30)
        );
    }

    #[tokio::test]
    async fn test_expired_within_same_millisecond_is_found() {
        let store = SledStore::temporary().unwrap();
        let expires_at = DateTime::from_timestamp_micros(1_700_000_000_000_100).unwrap();
        let now = DateTime::from_timestamp_micros(1_700_000_000_000_500).unwrap();

        store.put(entry("blink", expires_at)).await.unwrap();
        store.put(entry("later", now + Duration::microseconds(200))).await.unwrap();

        let expired: Vec<String> = store
            .expired_before(now)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(expired, vec!["blink".to_string()]);
    }
}
