//! # Queue Service - Explicit Queue Registry
//!
//! Owns every named queue of the process and the worker draining each one.
//! There are no globals: producers reach a queue through
//! [`QueueService::queue`] / [`QueueService::typed`] with a [`QueueKind`].
//!
//! ## Lifecycle
//!
//! ```text
//! QueueService::start()
//!   ├─ register 7 queues (one backend, one handle per name)
//!   ├─ recover_in_flight() on each           ← redelivery after crash
//!   └─ spawn one Worker per queue
//!
//! QueueService::close()
//!   ├─ shutdown_tx.send(true)
//!   └─ join every worker, report the first failure
//! ```
//!
//! ## Queue Kinds
//!
//! | Kind | Default name | Payload |
//! |------|--------------|---------|
//! | `LadokSign` | `ladok_sign` | `Document` |
//! | `LadokValidate` | `ladok_validate` | `Document` |
//! | `LadokDelSigned` | `ladok_del_signed` | `Document` |
//! | `LadokPersistentSave` | `ladok_persistent_save` | `Document` |
//! | `VcPersistentSave` | `vc_persistent_save` | `PersistentRecord` |
//! | `VcPersistentReplace` | `vc_persistent_replace` | `PersistentRecord` |
//! | `VcPersistentDelete` | `vc_persistent_delete` | `MetaData` |

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use shared_queue::{
    NamedQueue, PayloadSchema, QueueBackend, QueueError, QueuePayload, ShutdownSignal, TaskHandle,
    TypedQueue,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use vc_telemetry::{QUEUE_DEPTH, TASKS_ENQUEUED};

use crate::container::config::QueuesConfig;
use crate::handlers::{
    DelSignedHandler, DocumentPersistHandler, Pipeline, RecordDeleteHandler,
    RecordReplaceHandler, RecordSaveHandler, SignHandler, ValidateHandler,
};
use crate::worker::{TaskHandler, Worker, WorkerError};

/// Every queue the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueKind {
    LadokSign,
    LadokValidate,
    LadokDelSigned,
    LadokPersistentSave,
    VcPersistentSave,
    VcPersistentReplace,
    VcPersistentDelete,
}

impl QueueKind {
    pub const ALL: [QueueKind; 7] = [
        Self::LadokSign,
        Self::LadokValidate,
        Self::LadokDelSigned,
        Self::LadokPersistentSave,
        Self::VcPersistentSave,
        Self::VcPersistentReplace,
        Self::VcPersistentDelete,
    ];

    /// Queue name used when the configuration does not override it.
    #[must_use]
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::LadokSign => "ladok_sign",
            Self::LadokValidate => "ladok_validate",
            Self::LadokDelSigned => "ladok_del_signed",
            Self::LadokPersistentSave => "ladok_persistent_save",
            Self::VcPersistentSave => "vc_persistent_save",
            Self::VcPersistentReplace => "vc_persistent_replace",
            Self::VcPersistentDelete => "vc_persistent_delete",
        }
    }

    /// Payload shape carried by this queue.
    #[must_use]
    pub fn schema(&self) -> PayloadSchema {
        match self {
            Self::LadokSign
            | Self::LadokValidate
            | Self::LadokDelSigned
            | Self::LadokPersistentSave => PayloadSchema::Document,
            Self::VcPersistentSave | Self::VcPersistentReplace => PayloadSchema::PersistentRecord,
            Self::VcPersistentDelete => PayloadSchema::MetaData,
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.default_name())
    }
}

type WorkerHandle = JoinHandle<Result<(), WorkerError>>;

/// Registry of named queues plus their workers.
pub struct QueueService {
    queues: HashMap<QueueKind, NamedQueue>,
    shutdown_tx: watch::Sender<bool>,
    workers: Vec<(QueueKind, WorkerHandle)>,
}

impl QueueService {
    /// Register every queue on `backend` without starting workers.
    pub fn new(config: &QueuesConfig, backend: Arc<dyn QueueBackend>) -> Self {
        let queues = QueueKind::ALL
            .into_iter()
            .map(|kind| {
                let queue = NamedQueue::new(config.name(kind), kind.schema(), backend.clone());
                (kind, queue)
            })
            .collect();
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            queues,
            shutdown_tx,
            workers: Vec::new(),
        }
    }

    /// Register the queues, requeue unacknowledged tasks and start one
    /// worker per queue with the built-in handlers.
    pub async fn start(
        config: &QueuesConfig,
        backend: Arc<dyn QueueBackend>,
        pipeline: Pipeline,
    ) -> Result<Self, WorkerError> {
        let mut service = Self::new(config, backend);
        service.recover_in_flight().await?;

        service.spawn_worker(
            QueueKind::LadokSign,
            Arc::new(SignHandler::new(pipeline.clone())),
        )?;
        service.spawn_worker(
            QueueKind::LadokValidate,
            Arc::new(ValidateHandler::new(pipeline.clone())),
        )?;
        service.spawn_worker(
            QueueKind::LadokDelSigned,
            Arc::new(DelSignedHandler::new(pipeline.clone())),
        )?;
        service.spawn_worker(
            QueueKind::LadokPersistentSave,
            Arc::new(DocumentPersistHandler::new(pipeline.clone())),
        )?;
        service.spawn_worker(
            QueueKind::VcPersistentSave,
            Arc::new(RecordSaveHandler::new(pipeline.clone())),
        )?;
        service.spawn_worker(
            QueueKind::VcPersistentReplace,
            Arc::new(RecordReplaceHandler::new(pipeline.clone())),
        )?;
        service.spawn_worker(
            QueueKind::VcPersistentDelete,
            Arc::new(RecordDeleteHandler::new(pipeline)),
        )?;

        info!(workers = service.workers.len(), "[registry] Queue service started");
        Ok(service)
    }

    /// Move tasks left in flight by a previous process back to their queues.
    pub async fn recover_in_flight(&self) -> Result<usize, QueueError> {
        let mut total = 0;
        for kind in QueueKind::ALL {
            let queue = self.queue(kind);
            let recovered = queue.recover_in_flight().await?;
            if recovered > 0 {
                warn!(
                    queue = queue.name(),
                    recovered, "[registry] Requeued unacknowledged tasks"
                );
            }
            total += recovered;
        }
        Ok(total)
    }

    /// Start a worker draining `kind` with `handler`.
    ///
    /// Fails with [`QueueError::SchemaMismatch`] when the handler's payload
    /// type is not the one the queue carries.
    pub fn spawn_worker<H: TaskHandler>(
        &mut self,
        kind: QueueKind,
        handler: Arc<H>,
    ) -> Result<(), WorkerError> {
        let worker = Worker::new(
            self.queue(kind).clone(),
            handler,
            self.shutdown_tx.subscribe(),
        )?;
        self.workers.push((kind, tokio::spawn(worker.run())));
        Ok(())
    }

    /// The handle for `kind`. Every kind is registered by [`QueueService::new`].
    #[must_use]
    pub fn queue(&self, kind: QueueKind) -> &NamedQueue {
        &self.queues[&kind]
    }

    /// Typed producer handle for `kind`.
    pub fn typed<P: QueuePayload>(&self, kind: QueueKind) -> Result<TypedQueue<P>, QueueError> {
        self.queue(kind).typed()
    }

    /// Enqueue `message` on `kind`.
    pub async fn enqueue<P: QueuePayload>(
        &self,
        kind: QueueKind,
        message: &P,
    ) -> Result<TaskHandle, QueueError> {
        let queue = self.queue(kind);
        let handle = queue.enqueue(message).await?;
        TASKS_ENQUEUED.with_label_values(&[queue.name()]).inc();
        Ok(handle)
    }

    /// Publish the pending depth of every queue to the depth gauge.
    pub async fn sample_depths(&self) -> Result<(), QueueError> {
        for queue in self.queues.values() {
            let depth = queue.len().await?;
            QUEUE_DEPTH
                .with_label_values(&[queue.name()])
                .set(depth as f64);
        }
        Ok(())
    }

    /// A receiver of the service-wide shutdown signal.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_tx.subscribe()
    }

    /// Number of running workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Signal shutdown and wait for every worker.
    ///
    /// All workers are joined even when one of them failed; the first
    /// failure is returned.
    pub async fn close(self) -> Result<(), WorkerError> {
        info!(workers = self.workers.len(), "[registry] Closing queue service");
        // No receivers left is fine: no worker was spawned.
        let _ = self.shutdown_tx.send(true);

        let mut first_error = None;
        for (kind, handle) in self.workers {
            let result = match handle.await {
                Ok(result) => result,
                Err(_) => Err(WorkerError::Join {
                    queue: self.queues[&kind].name().to_string(),
                }),
            };
            if let Err(e) = result {
                error!(queue = %kind, error = %e, "[registry] Worker ended with error");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("[registry] Queue service closed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shared_queue::InMemoryQueueBackend;
    use shared_types::{Document, MetaData, PersistentRecord};
    use vc_01_document_store::{DocumentStore, DocumentStoreConfig, InMemoryCache};
    use vc_02_persistent_store::{InMemoryRecordBackend, PersistentStore};
    use vc_03_signing_client::MockSigningAuthority;

    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline {
            documents: Arc::new(DocumentStore::new(
                Arc::new(InMemoryCache::new()),
                DocumentStoreConfig::default(),
            )),
            persistent: Arc::new(PersistentStore::new(Arc::new(InMemoryRecordBackend::new()))),
            signing: Arc::new(MockSigningAuthority::new()),
        }
    }

    #[test]
    fn test_schema_per_kind() {
        assert_eq!(QueueKind::LadokSign.schema(), PayloadSchema::Document);
        assert_eq!(
            QueueKind::VcPersistentReplace.schema(),
            PayloadSchema::PersistentRecord
        );
        assert_eq!(
            QueueKind::VcPersistentDelete.schema(),
            PayloadSchema::MetaData
        );
    }

    #[test]
    fn test_default_names_are_distinct() {
        let mut names: Vec<_> = QueueKind::ALL.iter().map(QueueKind::default_name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), QueueKind::ALL.len());
    }

    #[tokio::test]
    async fn test_configured_names_are_used() {
        let config = QueuesConfig {
            ladok_sign: "sign_v2".to_string(),
            ..Default::default()
        };
        let service = QueueService::new(&config, Arc::new(InMemoryQueueBackend::new()));
        assert_eq!(service.queue(QueueKind::LadokSign).name(), "sign_v2");
        assert_eq!(
            service.queue(QueueKind::LadokValidate).name(),
            "ladok_validate"
        );
    }

    #[tokio::test]
    async fn test_typed_handle_checks_schema() {
        let service = QueueService::new(
            &QueuesConfig::default(),
            Arc::new(InMemoryQueueBackend::new()),
        );
        assert!(service.typed::<Document>(QueueKind::LadokSign).is_ok());
        assert!(service
            .typed::<MetaData>(QueueKind::VcPersistentDelete)
            .is_ok());
        assert!(matches!(
            service.typed::<Document>(QueueKind::VcPersistentSave),
            Err(QueueError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            service
                .enqueue(QueueKind::LadokSign, &PersistentRecord::default())
                .await,
            Err(QueueError::SchemaMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_spawn_worker_rejects_mismatched_handler() {
        let mut service = QueueService::new(
            &QueuesConfig::default(),
            Arc::new(InMemoryQueueBackend::new()),
        );
        let result = service.spawn_worker(
            QueueKind::VcPersistentDelete,
            Arc::new(SignHandler::new(pipeline())),
        );
        assert!(matches!(
            result,
            Err(WorkerError::Queue(QueueError::SchemaMismatch { .. }))
        ));
        assert_eq!(service.worker_count(), 0);
    }

    #[tokio::test]
    async fn test_start_and_close() {
        let service = QueueService::start(
            &QueuesConfig::default(),
            Arc::new(InMemoryQueueBackend::new()),
            pipeline(),
        )
        .await
        .unwrap();
        assert_eq!(service.worker_count(), QueueKind::ALL.len());

        tokio::time::timeout(Duration::from_secs(2), service.close())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_start_recovers_in_flight_tasks() {
        let backend: Arc<dyn QueueBackend> = Arc::new(InMemoryQueueBackend::new());
        let config = QueuesConfig::default();

        // A consumer claims a task and dies before acknowledging it.
        let stale = QueueService::new(&config, backend.clone());
        stale
            .enqueue(QueueKind::LadokDelSigned, &Document::new("t1", ""))
            .await
            .unwrap();
        let (_tx, mut rx) = watch::channel(false);
        stale
            .queue(QueueKind::LadokDelSigned)
            .wait(&mut rx)
            .await
            .unwrap();

        let service = QueueService::new(&config, backend.clone());
        assert_eq!(service.recover_in_flight().await.unwrap(), 1);
        let queue = service.queue(QueueKind::LadokDelSigned);
        assert_eq!(queue.len().await.unwrap(), 1);
        assert_eq!(queue.in_flight().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sample_depths() {
        let service = QueueService::new(
            &QueuesConfig::default(),
            Arc::new(InMemoryQueueBackend::new()),
        );
        service
            .enqueue(QueueKind::LadokSign, &Document::new("t1", "Zm9v"))
            .await
            .unwrap();
        service.sample_depths().await.unwrap();

        let depth = QUEUE_DEPTH.with_label_values(&["ladok_sign"]).get();
        assert!(depth >= 1.0);
    }
}
