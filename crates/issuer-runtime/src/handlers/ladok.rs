//! Handlers for the document (`ladok_*`) queues.

use async_trait::async_trait;
use shared_types::{now_unix, Document, PersistentRecord};
use tracing::{info, warn};
use vc_02_persistent_store::PersistentError;
use vc_03_signing_client::{SigningError, UnsignedDocument};
use vc_telemetry::{DOCUMENTS_SIGNED, SIGNING_FAILURES};

use super::{HandlerError, Pipeline};
use crate::worker::TaskHandler;

/// Sign one document.
///
/// Saves the unsigned copy, has the authority sign it, saves the signed
/// copy, drops the unsigned payload and starts the signed TTL. When
/// signing fails the error is recorded in the signed bucket instead.
pub struct SignHandler {
    pipeline: Pipeline,
}

impl SignHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    async fn sign(&self, doc: &Document) -> Result<Document, SigningError> {
        let reply = self
            .pipeline
            .signing
            .sign_documents(vec![UnsignedDocument::from(doc)])
            .await?;
        let signature =
            reply
                .signature_for(&doc.transaction_id)
                .ok_or_else(|| SigningError::MissingSignature {
                    id: doc.transaction_id.clone(),
                })?;

        Ok(Document {
            data: signature.to_string(),
            signed_at: now_unix(),
            error: None,
            ..doc.clone()
        })
    }
}

#[async_trait]
impl TaskHandler for SignHandler {
    type Payload = Document;

    fn name(&self) -> &'static str {
        "ladok_sign"
    }

    async fn handle(&self, doc: Document) -> Result<(), HandlerError> {
        let documents = &self.pipeline.documents;
        documents.save_unsigned(&doc).await?;

        let signed = match self.sign(&doc).await {
            Ok(signed) => signed,
            Err(e) => {
                SIGNING_FAILURES.inc();
                documents
                    .save_signing_failure(&doc.transaction_id, &e.to_string())
                    .await?;
                return Err(e.into());
            }
        };

        documents.save_signed(&signed).await?;
        DOCUMENTS_SIGNED.inc();
        documents.del_unsigned(&doc.transaction_id).await?;
        documents.add_ttl_signed(&doc.transaction_id).await?;

        info!(transaction_id = %doc.transaction_id, "[ladok] Document signed");
        Ok(())
    }
}

/// Validate a signed document and store the report in the ladok bucket.
pub struct ValidateHandler {
    pipeline: Pipeline,
}

impl ValidateHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for ValidateHandler {
    type Payload = Document;

    fn name(&self) -> &'static str {
        "ladok_validate"
    }

    async fn handle(&self, doc: Document) -> Result<(), HandlerError> {
        doc.require_transaction_id()
            .map_err(vc_01_document_store::DocumentError::from)?;

        let mut report = self
            .pipeline
            .signing
            .validate_document(UnsignedDocument::from(&doc))
            .await?;
        report.is_revoked = self
            .pipeline
            .documents
            .is_revoked(&doc.transaction_id)
            .await?;

        self.pipeline.documents.save_validation(&report).await?;
        info!(
            transaction_id = %doc.transaction_id,
            valid = report.valid_signature,
            revoked = report.is_revoked,
            "[ladok] Document validated"
        );
        Ok(())
    }
}

/// Drop the signed payload of a document.
pub struct DelSignedHandler {
    pipeline: Pipeline,
}

impl DelSignedHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for DelSignedHandler {
    type Payload = Document;

    fn name(&self) -> &'static str {
        "ladok_del_signed"
    }

    async fn handle(&self, doc: Document) -> Result<(), HandlerError> {
        self.pipeline
            .documents
            .del_signed(&doc.transaction_id)
            .await?;
        Ok(())
    }
}

/// Persist a record derived from a document.
pub struct DocumentPersistHandler {
    pipeline: Pipeline,
}

impl DocumentPersistHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for DocumentPersistHandler {
    type Payload = Document;

    fn name(&self) -> &'static str {
        "ladok_persistent_save"
    }

    async fn handle(&self, doc: Document) -> Result<(), HandlerError> {
        let record = PersistentRecord::from(&doc);
        match self.pipeline.persistent.save(&record).await {
            Ok(()) => Ok(()),
            Err(PersistentError::Duplicate { index, value }) => {
                warn!(index, value = %value, "[ladok] Record already persisted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vc_01_document_store::{
        DocumentError, DocumentLifecycle, DocumentStore, DocumentStoreConfig, InMemoryCache,
    };
    use vc_02_persistent_store::{InMemoryRecordBackend, PersistentStore, PersistentStoreApi};
    use vc_03_signing_client::MockSigningAuthority;

    use super::*;

    struct Fixture {
        documents: Arc<DocumentStore>,
        persistent: Arc<PersistentStore>,
        signing: MockSigningAuthority,
        pipeline: Pipeline,
    }

    fn fixture(signing: MockSigningAuthority) -> Fixture {
        let documents = Arc::new(DocumentStore::new(
            Arc::new(InMemoryCache::new()),
            DocumentStoreConfig::default(),
        ));
        let persistent = Arc::new(PersistentStore::new(Arc::new(InMemoryRecordBackend::new())));
        let pipeline = Pipeline {
            documents: documents.clone(),
            persistent: persistent.clone(),
            signing: Arc::new(signing.clone()),
        };
        Fixture {
            documents,
            persistent,
            signing,
            pipeline,
        }
    }

    #[tokio::test]
    async fn test_sign_flow() {
        let f = fixture(MockSigningAuthority::new());
        SignHandler::new(f.pipeline.clone())
            .handle(Document::new("abc", "Zm9v"))
            .await
            .unwrap();

        let signed = f.documents.get_signed("abc").await.unwrap();
        assert_eq!(signed.data, "signed:Zm9v");
        assert!(signed.signed_at > 0);
        assert!(f.documents.get_unsigned("abc").await.unwrap().data.is_empty());
        assert_eq!(f.signing.call_count(), 1);
    }

    #[tokio::test]
    async fn test_sign_failure_is_recorded() {
        let f = fixture(MockSigningAuthority::failing());
        let err = SignHandler::new(f.pipeline.clone())
            .handle(Document::new("abc", "Zm9v"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Signing(_)));

        // Unsigned copy kept for a later attempt; failure stored alongside.
        assert!(f.documents.exists_unsigned("abc").await.unwrap());
        let signed = f.documents.get_signed("abc").await.unwrap();
        assert!(signed.data.is_empty());
        assert!(signed.error.unwrap().contains("Mock failure"));
    }

    #[tokio::test]
    async fn test_retry_after_failure_clears_error() {
        let f = fixture(MockSigningAuthority::failing());
        SignHandler::new(f.pipeline.clone())
            .handle(Document::new("abc", "Zm9v"))
            .await
            .unwrap_err();

        let retry = Pipeline {
            signing: Arc::new(MockSigningAuthority::new()),
            ..f.pipeline.clone()
        };
        SignHandler::new(retry)
            .handle(Document::new("abc", "Zm9v"))
            .await
            .unwrap();

        let signed = f.documents.get_signed("abc").await.unwrap();
        assert_eq!(signed.data, "signed:Zm9v");
        assert!(signed.error.is_none());
    }

    #[tokio::test]
    async fn test_sign_without_transaction_id_never_calls_authority() {
        let f = fixture(MockSigningAuthority::new());
        let err = SignHandler::new(f.pipeline.clone())
            .handle(Document::new("", "Zm9v"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Document(DocumentError::NoTransactionId)
        ));
        assert_eq!(f.signing.call_count(), 0);
    }

    #[tokio::test]
    async fn test_validate_stores_report_with_revocation() {
        let f = fixture(MockSigningAuthority::new());
        f.documents.save_revoked("abc").await.unwrap();

        ValidateHandler::new(f.pipeline.clone())
            .handle(Document::new("abc", "signed:Zm9v"))
            .await
            .unwrap();

        let report = f.documents.get_validation("abc").await.unwrap();
        assert!(report.valid_signature);
        assert!(report.is_revoked);
    }

    #[tokio::test]
    async fn test_del_signed_drops_payload() {
        let f = fixture(MockSigningAuthority::new());
        f.documents
            .save_signed(&Document::new("abc", "c2ln"))
            .await
            .unwrap();

        DelSignedHandler::new(f.pipeline.clone())
            .handle(Document::new("abc", ""))
            .await
            .unwrap();
        assert!(f.documents.get_signed("abc").await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn test_persist_is_idempotent() {
        let f = fixture(MockSigningAuthority::new());
        let handler = DocumentPersistHandler::new(f.pipeline.clone());
        handler.handle(Document::new("abc", "")).await.unwrap();
        handler.handle(Document::new("abc", "")).await.unwrap();

        assert_eq!(f.persistent.get("abc").await.unwrap().transaction_id, "abc");
    }
}
