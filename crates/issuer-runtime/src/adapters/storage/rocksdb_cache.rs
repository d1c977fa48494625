//! Durable [`KeyValueCache`] on the `cache` column family.
//!
//! Each key holds one JSON entry `{fields, expires_at}` with `expires_at` in
//! wall-clock milliseconds. Expired entries read as missing and are removed
//! by the next write touching the key.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vc_01_document_store::{CacheError, CacheFields, KeyValueCache};

use super::rocksdb_adapter::{BatchOp, Locked, RocksDbError, RocksDbStore, CF_CACHE};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEntry {
    fields: CacheFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
}

impl StoredEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at.is_some_and(|at| now_ms >= at)
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct RocksDbCache {
    store: Arc<RocksDbStore>,
}

impl RocksDbCache {
    pub fn new(store: Arc<RocksDbStore>) -> Self {
        Self { store }
    }

    /// The live entry at `key`, `None` when missing or expired.
    fn live(db: &Locked<'_>, key: &str) -> Result<Option<StoredEntry>, RocksDbError> {
        let Some(raw) = db.get(CF_CACHE, key.as_bytes())? else {
            return Ok(None);
        };
        let entry: StoredEntry = serde_json::from_slice(&raw)?;
        Ok((!entry.is_expired(now_ms())).then_some(entry))
    }

    fn write(db: &Locked<'_>, key: &str, entry: &StoredEntry) -> Result<(), RocksDbError> {
        let value = serde_json::to_vec(entry)?;
        db.commit(vec![BatchOp::put(CF_CACHE, key.as_bytes(), value)])
    }

    fn read<T>(
        &self,
        key: &str,
        f: impl FnOnce(Option<StoredEntry>) -> T,
    ) -> Result<T, CacheError> {
        Ok(self.store.with_read(|db| Ok(f(Self::live(db, key)?)))?)
    }
}

#[async_trait]
impl KeyValueCache for RocksDbCache {
    async fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<(), CacheError> {
        Ok(self.store.with_write(|db| {
            let mut entry = Self::live(db, key)?.unwrap_or_default();
            entry.fields.extend(fields);
            Self::write(db, key, &entry)
        })?)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.read(key, |e| e.and_then(|mut e| e.fields.remove(field)))
    }

    async fn hgetall(&self, key: &str) -> Result<CacheFields, CacheError> {
        self.read(key, |e| e.map(|e| e.fields).unwrap_or_default())
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        self.read(key, |e| e.is_some_and(|e| e.fields.contains_key(field)))
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<usize, CacheError> {
        Ok(self.store.with_write(|db| {
            let Some(mut entry) = Self::live(db, key)? else {
                // Drop an expired leftover, if any.
                db.commit(vec![BatchOp::delete(CF_CACHE, key.as_bytes())])?;
                return Ok(0);
            };
            let removed = fields
                .iter()
                .filter(|f| entry.fields.remove(**f).is_some())
                .count();
            if entry.fields.is_empty() {
                db.commit(vec![BatchOp::delete(CF_CACHE, key.as_bytes())])?;
            } else if removed > 0 {
                Self::write(db, key, &entry)?;
            }
            Ok(removed)
        })?)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.read(key, |e| e.is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        Ok(self.store.with_write(|db| {
            let Some(mut entry) = Self::live(db, key)? else {
                return Ok(false);
            };
            let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            entry.expires_at = Some(now_ms().saturating_add(ttl_ms));
            Self::write(db, key, &entry)?;
            Ok(true)
        })?)
    }
}
