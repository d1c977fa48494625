//! # Service Container
//!
//! Builds the stores, the queue backend and the signing client from an
//! [`IssuerConfig`] and hands them to the queue service as a [`Pipeline`].
//!
//! ## Backend Selection
//!
//! ```text
//! storage.backend = "memory"   → InMemoryCache, InMemoryQueueBackend, InMemoryRecordBackend
//! storage.backend = "rocksdb"  → one RocksDbStore at {data_dir}/rocksdb shared by
//!                                RocksDbCache, RocksDbQueueBackend, RocksDbRecordBackend
//! ```

use std::sync::Arc;

use shared_queue::{InMemoryQueueBackend, QueueBackend};
use thiserror::Error;
use tracing::info;
use vc_01_document_store::{DocumentStore, InMemoryCache, KeyValueCache};
use vc_02_persistent_store::{InMemoryRecordBackend, PersistentStore, RecordBackend};
use vc_03_signing_client::{HttpSigningClient, SigningAuthority, SigningError};

use crate::container::config::{ConfigError, IssuerConfig, StorageBackend};
use crate::handlers::Pipeline;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("storage initialization failed: {0}")]
    Storage(String),

    /// The configured backend was not compiled in.
    #[error("storage backend {0} requires the `{0}` feature")]
    BackendUnavailable(&'static str),
}

/// Backends of the three storage ports.
struct Backends {
    cache: Arc<dyn KeyValueCache>,
    queues: Arc<dyn QueueBackend>,
    records: Arc<dyn RecordBackend>,
}

impl Backends {
    fn memory() -> Self {
        Self {
            cache: Arc::new(InMemoryCache::new()),
            queues: Arc::new(InMemoryQueueBackend::new()),
            records: Arc::new(InMemoryRecordBackend::new()),
        }
    }

    #[cfg(feature = "rocksdb")]
    fn rocksdb(config: &IssuerConfig) -> Result<Self, ContainerError> {
        use crate::adapters::storage::{
            RocksDbCache, RocksDbConfig, RocksDbQueueBackend, RocksDbRecordBackend, RocksDbStore,
        };

        let path = config.storage.data_dir.join("rocksdb");
        let store = RocksDbStore::open(RocksDbConfig {
            path: path.to_string_lossy().to_string(),
            ..Default::default()
        })
        .map_err(|e| ContainerError::Storage(e.to_string()))?;
        let store = Arc::new(store);
        info!(path = %path.display(), "[container] RocksDB opened");

        Ok(Self {
            cache: Arc::new(RocksDbCache::new(store.clone())),
            queues: Arc::new(RocksDbQueueBackend::new(store.clone())),
            records: Arc::new(RocksDbRecordBackend::new(store)),
        })
    }

    #[cfg(not(feature = "rocksdb"))]
    fn rocksdb(_config: &IssuerConfig) -> Result<Self, ContainerError> {
        Err(ContainerError::BackendUnavailable("rocksdb"))
    }
}

/// Every service the runtime needs, built once at startup.
pub struct ServiceContainer {
    pub config: IssuerConfig,
    pub queue_backend: Arc<dyn QueueBackend>,
    pub documents: Arc<DocumentStore>,
    pub persistent: Arc<PersistentStore>,
    pub signing: Arc<dyn SigningAuthority>,
}

impl ServiceContainer {
    /// Build all services from a validated configuration.
    pub fn new(config: IssuerConfig) -> Result<Self, ContainerError> {
        config.validate()?;

        let backends = match config.storage.backend {
            StorageBackend::Memory => Backends::memory(),
            StorageBackend::Rocksdb => Backends::rocksdb(&config)?,
        };
        let signing = Arc::new(HttpSigningClient::new(config.signing.clone())?);

        info!(
            backend = ?config.storage.backend,
            signing_url = %config.signing.url,
            revocation_policy = config.key_value.revocation_policy.as_str(),
            "[container] Services initialized"
        );
        Ok(Self::assemble(config, backends, signing))
    }

    /// Build with caller-supplied backends and signing authority.
    pub fn with_parts(
        config: IssuerConfig,
        cache: Arc<dyn KeyValueCache>,
        queue_backend: Arc<dyn QueueBackend>,
        records: Arc<dyn RecordBackend>,
        signing: Arc<dyn SigningAuthority>,
    ) -> Self {
        let backends = Backends {
            cache,
            queues: queue_backend,
            records,
        };
        Self::assemble(config, backends, signing)
    }

    fn assemble(
        config: IssuerConfig,
        backends: Backends,
        signing: Arc<dyn SigningAuthority>,
    ) -> Self {
        let documents = Arc::new(DocumentStore::new(
            backends.cache,
            config.key_value.store_config(),
        ));
        let persistent = Arc::new(PersistentStore::new(backends.records));
        Self {
            config,
            queue_backend: backends.queues,
            documents,
            persistent,
            signing,
        }
    }

    /// Downstream services for the queue handlers.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        Pipeline {
            documents: self.documents.clone(),
            persistent: self.persistent.clone(),
            signing: self.signing.clone(),
        }
    }
}
