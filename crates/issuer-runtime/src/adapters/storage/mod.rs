//! # Durable Storage Adapters
//!
//! RocksDB implementations of the three outbound ports the pipeline runs
//! on. Enable the `rocksdb` feature to build them:
//!
//! ```toml
//! issuer-runtime = { path = "...", features = ["rocksdb"] }
//! ```
//!
//! | Port | Adapter | Column family |
//! |------|---------|---------------|
//! | `KeyValueCache` | [`RocksDbCache`] | `cache` |
//! | `QueueBackend` | [`RocksDbQueueBackend`] | `queues` |
//! | `RecordBackend` | [`RocksDbRecordBackend`] | `records` |
//!
//! All three share one [`RocksDbStore`].

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;
#[cfg(feature = "rocksdb")]
mod rocksdb_cache;
#[cfg(feature = "rocksdb")]
mod rocksdb_queue;
#[cfg(feature = "rocksdb")]
mod rocksdb_records;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{
    RocksDbConfig, RocksDbError, RocksDbStore, CF_CACHE, CF_METADATA, CF_QUEUES, CF_RECORDS,
    COLUMN_FAMILIES,
};
#[cfg(feature = "rocksdb")]
pub use rocksdb_cache::RocksDbCache;
#[cfg(feature = "rocksdb")]
pub use rocksdb_queue::RocksDbQueueBackend;
#[cfg(feature = "rocksdb")]
pub use rocksdb_records::RocksDbRecordBackend;

// In-memory adapters for tests and development
pub use shared_queue::InMemoryQueueBackend;
pub use vc_01_document_store::InMemoryCache;
pub use vc_02_persistent_store::InMemoryRecordBackend;
