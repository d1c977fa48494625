//! # Outbound Ports
//!
//! The key-value cache the store runs on, and its clock.
//!
//! Production: `RocksDbCache` in issuer-runtime/adapters/storage.
//! Testing: in-memory implementations below.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{now_unix, UnixSeconds};
use tokio::time::Instant;

use crate::domain::CacheError;

/// Field map stored under one key.
pub type CacheFields = HashMap<String, String>;

/// Hash-style key-value cache with per-key expiry.
///
/// Expired keys behave exactly like missing keys. A key whose last field
/// is deleted disappears.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Upsert `fields` into the map at `key`.
    async fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<(), CacheError>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    /// All fields at `key`, empty when the key is absent.
    async fn hgetall(&self, key: &str) -> Result<CacheFields, CacheError>;

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, CacheError>;

    /// Remove `fields`, returning how many existed.
    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<usize, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Start an expiry countdown. `false` when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;
}

/// Abstract clock for timestamps.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> UnixSeconds;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> UnixSeconds {
        now_unix()
    }
}

/// Settable clock for tests.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    now: AtomicI64,
}

impl MockTimeSource {
    #[must_use]
    pub fn new(now: UnixSeconds) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: UnixSeconds) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> UnixSeconds {
        self.now.load(Ordering::SeqCst)
    }
}

struct CacheEntry {
    fields: CacheFields,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-memory cache for tests and development.
///
/// Expiry uses `tokio::time::Instant`, so tests can drive it with a paused
/// clock. Expired entries are dropped lazily on access and by
/// [`InMemoryCache::purge_expired`].
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_live<T>(&self, key: &str, f: impl FnOnce(Option<&CacheEntry>) -> T) -> T {
        let now = Instant::now();
        let entries = self.entries.read();
        f(entries.get(key).filter(|e| !e.is_expired(now)))
    }
}

#[async_trait]
impl KeyValueCache for InMemoryCache {
    async fn hset(&self, key: &str, fields: Vec<(String, String)>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
        }
        let entry = entries.entry(key.to_string()).or_insert_with(|| CacheEntry {
            fields: HashMap::new(),
            expires_at: None,
        });
        entry.fields.extend(fields);
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        Ok(self.read_live(key, |e| e.and_then(|e| e.fields.get(field).cloned())))
    }

    async fn hgetall(&self, key: &str) -> Result<CacheFields, CacheError> {
        Ok(self.read_live(key, |e| e.map(|e| e.fields.clone()).unwrap_or_default()))
    }

    async fn hexists(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        Ok(self.read_live(key, |e| e.is_some_and(|e| e.fields.contains_key(field))))
    }

    async fn hdel(&self, key: &str, fields: &[&str]) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let Some(entry) = entries.get_mut(key) else {
            return Ok(0);
        };
        if entry.is_expired(now) {
            entries.remove(key);
            return Ok(0);
        }
        let removed = fields
            .iter()
            .filter(|f| entry.fields.remove(**f).is_some())
            .count();
        if entry.fields.is_empty() {
            entries.remove(key);
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.read_live(key, |e| e.is_some()))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = Instant::now();
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = Some(now + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
