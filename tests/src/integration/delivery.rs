//! # Delivery Guarantees
//!
//! Ordering, redelivery and shutdown behaviour of the queue service as a
//! whole, observed through the stores and the signing authority.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shared_queue::{InMemoryQueueBackend, QueueBackend};
    use shared_types::Document;
    use tokio::sync::watch;
    use vc_01_document_store::DocumentLifecycle;
    use vc_02_persistent_store::PersistentStoreApi;
    use vc_03_signing_client::MockSigningAuthority;

    use issuer_runtime::{IssuerConfig, QueueKind, QueueService};

    use crate::integration::harness::{Harness, RecordingAuthority};

    #[tokio::test]
    async fn test_tasks_are_processed_in_enqueue_order() {
        let authority = Arc::new(RecordingAuthority::default());
        let harness = Harness::start(authority.clone()).await;

        let ids: Vec<String> = (0..10).map(|n| format!("t{n}")).collect();
        for id in &ids {
            harness
                .queues
                .enqueue(QueueKind::LadokSign, &Document::new(id.as_str(), "Zm9v"))
                .await
                .unwrap();
        }
        harness.drained(QueueKind::LadokSign).await;

        assert_eq!(*authority.signed.lock(), ids);
        harness.close().await;
    }

    #[tokio::test]
    async fn test_unacknowledged_task_is_redelivered_after_restart() {
        let backend: Arc<dyn QueueBackend> = Arc::new(InMemoryQueueBackend::new());
        let config = IssuerConfig::default();

        // The previous process claimed the task and died before acking.
        let stale = QueueService::new(&config.queues, backend.clone());
        stale
            .enqueue(QueueKind::LadokPersistentSave, &Document::new("abc", "Zm9v"))
            .await
            .unwrap();
        let (_tx, mut rx) = watch::channel(false);
        let claimed = stale
            .queue(QueueKind::LadokPersistentSave)
            .wait(&mut rx)
            .await
            .unwrap();
        assert_eq!(claimed.attempt, 1);
        drop(stale);

        let harness = Harness::start_on(backend, Arc::new(MockSigningAuthority::new())).await;
        harness.drained(QueueKind::LadokPersistentSave).await;

        let stored = harness.container.persistent.get("abc").await.unwrap();
        assert_eq!(stored.data, "Zm9v");
        harness.close().await;
    }

    #[tokio::test]
    async fn test_undecodable_payload_does_not_block_queue() {
        let harness = Harness::start(Arc::new(MockSigningAuthority::new())).await;
        let queue = harness.queues.queue(QueueKind::LadokPersistentSave);

        queue.push_raw("{not json".to_string()).await.unwrap();
        harness
            .queues
            .enqueue(QueueKind::LadokPersistentSave, &Document::new("abc", "Zm9v"))
            .await
            .unwrap();
        harness.drained(QueueKind::LadokPersistentSave).await;

        assert!(harness.container.persistent.get("abc").await.is_ok());
        harness.close().await;
    }

    #[tokio::test]
    async fn test_no_processing_after_shutdown() {
        let signing = MockSigningAuthority::new();
        let Harness { container, queues } = Harness::start(Arc::new(signing.clone())).await;

        tokio::time::timeout(Duration::from_secs(2), queues.close())
            .await
            .unwrap()
            .unwrap();

        let producer = QueueService::new(&container.config.queues, container.queue_backend.clone());
        producer
            .enqueue(QueueKind::LadokSign, &Document::new("t1", "Zm9v"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(signing.call_count(), 0);
        let queue = producer.queue(QueueKind::LadokSign);
        assert_eq!(queue.len().await.unwrap(), 1);
        assert_eq!(queue.in_flight().await.unwrap(), 0);
        assert!(!container.documents.exists_unsigned("t1").await.unwrap());
    }
}
