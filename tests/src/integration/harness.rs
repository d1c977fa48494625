//! Shared fixtures for the integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use issuer_runtime::{IssuerConfig, QueueKind, QueueService, ServiceContainer};
use parking_lot::Mutex;
use shared_queue::{InMemoryQueueBackend, QueueBackend};
use shared_types::{now_unix, Validation};
use vc_01_document_store::InMemoryCache;
use vc_02_persistent_store::InMemoryRecordBackend;
use vc_03_signing_client::{
    ReplyMeta, SignReply, SignatureValue, SigningAuthority, SigningError, UnsignedDocument,
};

/// A running runtime: services plus started queue workers.
pub(crate) struct Harness {
    pub container: ServiceContainer,
    pub queues: QueueService,
}

impl Harness {
    pub async fn start(signing: Arc<dyn SigningAuthority>) -> Self {
        Self::start_on(Arc::new(InMemoryQueueBackend::new()), signing).await
    }

    /// Start on an existing queue backend, as a restarted process would.
    pub async fn start_on(
        queue_backend: Arc<dyn QueueBackend>,
        signing: Arc<dyn SigningAuthority>,
    ) -> Self {
        let container = ServiceContainer::with_parts(
            IssuerConfig::default(),
            Arc::new(InMemoryCache::new()),
            queue_backend,
            Arc::new(InMemoryRecordBackend::new()),
            signing,
        );
        let queues = QueueService::start(
            &container.config.queues,
            container.queue_backend.clone(),
            container.pipeline(),
        )
        .await
        .unwrap();
        Self { container, queues }
    }

    /// Wait until `kind` has nothing pending and nothing in flight.
    pub async fn drained(&self, kind: QueueKind) {
        let queue = self.queues.queue(kind);
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if queue.len().await.unwrap() == 0 && queue.in_flight().await.unwrap() == 0 {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("queue {kind} did not drain"));
    }

    pub async fn close(self) {
        tokio::time::timeout(Duration::from_secs(2), self.queues.close())
            .await
            .unwrap()
            .unwrap();
    }
}

/// Signs as `sig:<id>` and records the order in which ids arrive.
#[derive(Default)]
pub(crate) struct RecordingAuthority {
    pub signed: Mutex<Vec<String>>,
}

#[async_trait]
impl SigningAuthority for RecordingAuthority {
    async fn sign_documents(
        &self,
        documents: Vec<UnsignedDocument>,
    ) -> Result<SignReply, SigningError> {
        let mut signed = self.signed.lock();
        let signature_values = documents
            .into_iter()
            .map(|d| {
                signed.push(d.id.clone());
                SignatureValue {
                    signature: format!("sig:{}", d.id),
                    id: d.id,
                }
            })
            .collect();
        Ok(SignReply {
            meta: ReplyMeta::default(),
            signature_values,
        })
    }

    async fn validate_document(
        &self,
        document: UnsignedDocument,
    ) -> Result<Validation, SigningError> {
        Ok(Validation {
            valid_signature: document.data == format!("sig:{}", document.id),
            transaction_id: document.id,
            validated_at: now_unix(),
            ..Default::default()
        })
    }
}
