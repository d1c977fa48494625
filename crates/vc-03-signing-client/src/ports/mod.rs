//! # Ports Module
//!
//! The signing authority as seen by the issuance workers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{now_unix, Validation};

use crate::domain::{ReplyMeta, SignReply, SignatureValue, SigningError, UnsignedDocument};

/// External key holder that signs and validates documents.
#[async_trait]
pub trait SigningAuthority: Send + Sync {
    /// Sign a batch. The reply holds one signature value per document id.
    async fn sign_documents(
        &self,
        documents: Vec<UnsignedDocument>,
    ) -> Result<SignReply, SigningError>;

    /// Check the signature on a signed document.
    async fn validate_document(
        &self,
        document: UnsignedDocument,
    ) -> Result<Validation, SigningError>;
}

/// Mock authority for testing.
///
/// Signs by wrapping the payload as `signed:<data>` and accepts exactly
/// those payloads as validly signed.
#[derive(Debug, Clone, Default)]
pub struct MockSigningAuthority {
    /// Should fail?
    pub should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockSigningAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Requests received so far, shared across clones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(SigningError::Rejected {
                status: 503,
                message: "Mock failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SigningAuthority for MockSigningAuthority {
    async fn sign_documents(
        &self,
        documents: Vec<UnsignedDocument>,
    ) -> Result<SignReply, SigningError> {
        self.record_call()?;
        Ok(SignReply {
            meta: ReplyMeta {
                version: 1,
                encoding: "base64".to_string(),
                signer_public_key: "mock-key".to_string(),
                signature_algorithm: "mock".to_string(),
            },
            signature_values: documents
                .into_iter()
                .map(|d| SignatureValue {
                    signature: format!("signed:{}", d.data),
                    id: d.id,
                })
                .collect(),
        })
    }

    async fn validate_document(
        &self,
        document: UnsignedDocument,
    ) -> Result<Validation, SigningError> {
        self.record_call()?;
        let valid = document.data.starts_with("signed:");
        Ok(Validation {
            transaction_id: document.id,
            valid_signature: valid,
            message: if valid { "ok" } else { "signature mismatch" }.to_string(),
            validated_at: now_unix(),
            ..Default::default()
        })
    }
}
