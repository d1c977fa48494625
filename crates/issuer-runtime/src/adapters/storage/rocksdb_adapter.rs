//! # RocksDB Storage Adapter
//!
//! One RocksDB instance backs the cache, the queues and the record
//! collection of a single issuer process.
//!
//! ## Features
//!
//! - Atomic batch writes (WriteBatch)
//! - Column families per concern
//! - Snappy compression
//! - Bloom filters for point lookups
//! - Optional fsync on write
//!
//! ## Column Families
//!
//! - `cache` - document lifecycle buckets ([`super::RocksDbCache`])
//! - `queues` - pending and in-flight tasks ([`super::RocksDbQueueBackend`])
//! - `records` - persistent records and unique indexes ([`super::RocksDbRecordBackend`])
//! - `metadata` - sequence counters
//!
//! Every read-modify-write runs under the store's write lock, so each
//! adapter call is atomic with respect to the others.

use std::sync::Arc;

use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use shared_queue::QueueError;
use thiserror::Error;
use vc_01_document_store::CacheError;
use vc_02_persistent_store::PersistentError;

pub const CF_CACHE: &str = "cache";
pub const CF_QUEUES: &str = "queues";
pub const CF_RECORDS: &str = "records";
pub const CF_METADATA: &str = "metadata";

/// All column families opened by [`RocksDbStore`].
pub const COLUMN_FAMILIES: &[&str] = &[CF_CACHE, CF_QUEUES, CF_RECORDS, CF_METADATA];

#[derive(Debug, Error)]
pub enum RocksDbError {
    #[error("Failed to open RocksDB at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rocksdb::Error,
    },

    #[error("Column family {0} is missing")]
    MissingColumnFamily(&'static str),

    #[error("RocksDB operation failed: {0}")]
    Db(#[from] rocksdb::Error),

    #[error("Stored value is corrupt: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Stored counter {key} is corrupt")]
    Counter { key: &'static str },
}

impl From<RocksDbError> for CacheError {
    fn from(err: RocksDbError) -> Self {
        CacheError::Transport(err.to_string())
    }
}

impl From<RocksDbError> for QueueError {
    fn from(err: RocksDbError) -> Self {
        QueueError::Backend(err.to_string())
    }
}

impl From<RocksDbError> for PersistentError {
    fn from(err: RocksDbError) -> Self {
        PersistentError::Backend(err.to_string())
    }
}

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// Enable fsync after each write (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/rocksdb".to_string(),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

/// A single write of a batch.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Put {
        cf: &'static str,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: &'static str,
        key: Vec<u8>,
    },
}

impl BatchOp {
    pub fn put(cf: &'static str, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self::Put {
            cf,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(cf: &'static str, key: impl Into<Vec<u8>>) -> Self {
        Self::Delete {
            cf,
            key: key.into(),
        }
    }
}

/// Shared RocksDB handle.
pub struct RocksDbStore {
    db: Arc<RwLock<DB>>,
    config: RocksDbConfig,
}

/// Access to the database while the store lock is held.
pub struct Locked<'a> {
    db: &'a DB,
    sync_writes: bool,
}

impl Locked<'_> {
    fn cf(&self, name: &'static str) -> Result<&rocksdb::ColumnFamily, RocksDbError> {
        self.db
            .cf_handle(name)
            .ok_or(RocksDbError::MissingColumnFamily(name))
    }

    pub fn get(&self, cf: &'static str, key: &[u8]) -> Result<Option<Vec<u8>>, RocksDbError> {
        Ok(self.db.get_cf(self.cf(cf)?, key)?)
    }

    /// Every entry whose key starts with `prefix`, in key order.
    pub fn prefix_scan(
        &self,
        cf: &'static str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, RocksDbError> {
        let iter = self
            .db
            .iterator_cf(self.cf(cf)?, IteratorMode::From(prefix, Direction::Forward));

        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    /// Read a big-endian `u64` counter from the metadata family.
    pub fn counter(&self, key: &'static str) -> Result<u64, RocksDbError> {
        match self.get(CF_METADATA, key.as_bytes())? {
            None => Ok(0),
            Some(raw) => {
                let bytes: [u8; 8] = raw
                    .as_slice()
                    .try_into()
                    .map_err(|_| RocksDbError::Counter { key })?;
                Ok(u64::from_be_bytes(bytes))
            }
        }
    }

    /// Apply `ops` atomically.
    pub fn commit(&self, ops: Vec<BatchOp>) -> Result<(), RocksDbError> {
        let mut batch = WriteBatch::default();
        for op in ops {
            match op {
                BatchOp::Put { cf, key, value } => batch.put_cf(self.cf(cf)?, key, value),
                BatchOp::Delete { cf, key } => batch.delete_cf(self.cf(cf)?, key),
            }
        }

        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        Ok(self.db.write_opt(batch, &write_opts)?)
    }
}

/// Write op setting counter `key` to `value`.
pub fn counter_op(key: &'static str, value: u64) -> BatchOp {
    BatchOp::put(CF_METADATA, key.as_bytes(), value.to_be_bytes().to_vec())
}

impl RocksDbStore {
    /// Open or create a RocksDB database
    pub fn open(config: RocksDbConfig) -> Result<Self, RocksDbError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(|source| {
            RocksDbError::Open {
                path: config.path.clone(),
                source,
            }
        })?;

        Ok(Self {
            db: Arc::new(RwLock::new(db)),
            config,
        })
    }

    pub fn config(&self) -> &RocksDbConfig {
        &self.config
    }

    /// Run `f` under the shared lock.
    pub fn with_read<T>(
        &self,
        f: impl FnOnce(&Locked<'_>) -> Result<T, RocksDbError>,
    ) -> Result<T, RocksDbError> {
        let db = self.db.read();
        f(&Locked {
            db: &db,
            sync_writes: self.config.sync_writes,
        })
    }

    /// Run `f` under the exclusive lock. Use for every read-modify-write.
    pub fn with_write<T>(
        &self,
        f: impl FnOnce(&Locked<'_>) -> Result<T, RocksDbError>,
    ) -> Result<T, RocksDbError> {
        let db = self.db.write();
        f(&Locked {
            db: &db,
            sync_writes: self.config.sync_writes,
        })
    }
}
