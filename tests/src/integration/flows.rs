//! # Pipeline Flows
//!
//! Each test enqueues work the way an API front end would and checks the
//! stores once the worker for that queue has drained it.
//!
//! ## Flows Tested:
//!
//! 1. **ladok_sign**: unsigned copy, signing authority, signed copy with TTL
//! 2. **ladok_validate**: signature check plus revocation status
//! 3. **ladok_del_signed**: signed copy cleared
//! 4. **ladok_persistent_save**: document lands in the persistent store
//! 5. **vc_persistent_***: record save, replace and delete by metadata

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{Document, MetaData, PersistentRecord};
    use vc_01_document_store::{DocumentError, DocumentLifecycle};
    use vc_02_persistent_store::{PersistentError, PersistentStoreApi};
    use vc_03_signing_client::MockSigningAuthority;

    use issuer_runtime::QueueKind;

    use crate::integration::harness::{Harness, RecordingAuthority};

    fn record(document_id: &str, data: &str) -> PersistentRecord {
        PersistentRecord {
            transaction_id: format!("tx-{document_id}"),
            meta: MetaData {
                authentic_source: "SUNET".to_string(),
                document_type: "PDA1".to_string(),
                document_id: document_id.to_string(),
                ..Default::default()
            },
            data: data.to_string(),
            ..Default::default()
        }
    }

    // =========================================================================
    // LADOK DOCUMENT FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_persistent_save_queue_stores_document() {
        let harness = Harness::start(Arc::new(MockSigningAuthority::new())).await;

        harness
            .queues
            .enqueue(QueueKind::LadokPersistentSave, &Document::new("abc", "Zm9v"))
            .await
            .unwrap();
        harness.drained(QueueKind::LadokPersistentSave).await;

        let stored = harness.container.persistent.get("abc").await.unwrap();
        assert_eq!(stored.transaction_id, "abc");
        assert_eq!(stored.data, "Zm9v");
        harness.close().await;
    }

    #[tokio::test]
    async fn test_sign_queue_produces_signed_document() {
        let signing = MockSigningAuthority::new();
        let harness = Harness::start(Arc::new(signing.clone())).await;

        harness
            .queues
            .enqueue(QueueKind::LadokSign, &Document::new("t1", "Zm9v"))
            .await
            .unwrap();
        harness.drained(QueueKind::LadokSign).await;

        let documents = &harness.container.documents;
        assert!(documents.exists_signed("t1").await.unwrap());
        let signed = documents.get_signed("t1").await.unwrap();
        assert_eq!(signed.data, "signed:Zm9v");
        assert!(signed.signed_at > 0);
        assert!(signed.error.is_none());
        // The unsigned copy is cleared once the signed one is written.
        assert!(documents.get_unsigned("t1").await.unwrap().data.is_empty());
        assert_eq!(signing.call_count(), 1);
        harness.close().await;
    }

    #[tokio::test]
    async fn test_sign_failure_is_recorded_and_worker_continues() {
        let harness = Harness::start(Arc::new(MockSigningAuthority::failing())).await;

        for id in ["t1", "t2"] {
            harness
                .queues
                .enqueue(QueueKind::LadokSign, &Document::new(id, "Zm9v"))
                .await
                .unwrap();
        }
        harness.drained(QueueKind::LadokSign).await;

        let documents = &harness.container.documents;
        for id in ["t1", "t2"] {
            let signed = documents.get_signed(id).await.unwrap();
            assert!(signed.error.unwrap().contains("Mock failure"));
            assert_eq!(documents.get_unsigned(id).await.unwrap().data, "Zm9v");
        }
        harness.close().await;
    }

    #[tokio::test]
    async fn test_sign_then_validate() {
        let harness = Harness::start(Arc::new(RecordingAuthority::default())).await;
        let documents = harness.container.documents.clone();

        harness
            .queues
            .enqueue(QueueKind::LadokSign, &Document::new("t1", "Zm9v"))
            .await
            .unwrap();
        harness.drained(QueueKind::LadokSign).await;

        let signed = documents.get_signed("t1").await.unwrap();
        documents.save_revoked("t1").await.unwrap();
        harness
            .queues
            .enqueue(QueueKind::LadokValidate, &signed)
            .await
            .unwrap();
        harness.drained(QueueKind::LadokValidate).await;

        let report = documents.get_validation("t1").await.unwrap();
        assert!(report.valid_signature);
        assert!(report.is_revoked);
        harness.close().await;
    }

    #[tokio::test]
    async fn test_del_signed_queue_clears_signed_copy() {
        let harness = Harness::start(Arc::new(MockSigningAuthority::new())).await;
        let documents = harness.container.documents.clone();
        let mut doc = Document::new("t1", "signed:Zm9v");
        doc.signed_at = 1;
        documents.save_signed(&doc).await.unwrap();

        harness
            .queues
            .enqueue(QueueKind::LadokDelSigned, &Document::new("t1", ""))
            .await
            .unwrap();
        harness.drained(QueueKind::LadokDelSigned).await;

        assert!(documents.get_signed("t1").await.unwrap().data.is_empty());
        harness.close().await;
    }

    #[tokio::test]
    async fn test_save_signed_rejects_empty_data() {
        let harness = Harness::start(Arc::new(MockSigningAuthority::new())).await;
        let documents = &harness.container.documents;

        let err = documents
            .save_signed(&Document::new("t1", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::DataEmpty));
        assert!(!documents.exists_signed("t1").await.unwrap());

        documents
            .save_signed(&Document::new("t1", "signed:Zm9v"))
            .await
            .unwrap();
        assert!(documents.exists_signed("t1").await.unwrap());
        harness.close().await;
    }

    // =========================================================================
    // VC RECORD FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_record_save_replace_delete() {
        let harness = Harness::start(Arc::new(MockSigningAuthority::new())).await;
        let persistent = harness.container.persistent.clone();

        harness
            .queues
            .enqueue(QueueKind::VcPersistentSave, &record("d1", "v1"))
            .await
            .unwrap();
        harness.drained(QueueKind::VcPersistentSave).await;
        let found = persistent.get_document("SUNET", "PDA1", "d1").await.unwrap();
        assert_eq!(found.data, "v1");

        harness
            .queues
            .enqueue(QueueKind::VcPersistentReplace, &record("d1", "v2"))
            .await
            .unwrap();
        harness.drained(QueueKind::VcPersistentReplace).await;
        let found = persistent.get_document("SUNET", "PDA1", "d1").await.unwrap();
        assert_eq!(found.data, "v2");

        harness
            .queues
            .enqueue(QueueKind::VcPersistentDelete, &record("d1", "").meta)
            .await
            .unwrap();
        harness.drained(QueueKind::VcPersistentDelete).await;
        assert!(matches!(
            persistent.get_document("SUNET", "PDA1", "d1").await,
            Err(PersistentError::NotFound)
        ));
        harness.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_record_save_keeps_first() {
        let harness = Harness::start(Arc::new(MockSigningAuthority::new())).await;

        for data in ["v1", "v2"] {
            harness
                .queues
                .enqueue(QueueKind::VcPersistentSave, &record("d1", data))
                .await
                .unwrap();
        }
        harness.drained(QueueKind::VcPersistentSave).await;

        let found = harness
            .container
            .persistent
            .get_document("SUNET", "PDA1", "d1")
            .await
            .unwrap();
        assert_eq!(found.data, "v1");
        harness.close().await;
    }
}
