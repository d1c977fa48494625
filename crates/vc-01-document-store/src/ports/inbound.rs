//! # Inbound Ports
//!
//! What the lifecycle store offers to workers and readers.

use async_trait::async_trait;
use shared_types::{Document, UnixSeconds, Validation};

use crate::domain::DocumentError;

/// Document lifecycle API.
///
/// Saves are upserts. Gets fail with [`DocumentError::Revoked`] for a
/// revoked id regardless of bucket content; `exists_*` ignore revocation.
#[async_trait]
pub trait DocumentLifecycle: Send + Sync {
    async fn save_unsigned(&self, doc: &Document) -> Result<(), DocumentError>;
    async fn get_unsigned(&self, transaction_id: &str) -> Result<Document, DocumentError>;
    async fn exists_unsigned(&self, transaction_id: &str) -> Result<bool, DocumentError>;
    /// Remove the `data` and `ts` fields, keeping the rest of the entry.
    async fn del_unsigned(&self, transaction_id: &str) -> Result<(), DocumentError>;
    async fn add_ttl_unsigned(&self, transaction_id: &str) -> Result<(), DocumentError>;

    /// Rejects empty `data` with [`DocumentError::DataEmpty`] and writes nothing.
    async fn save_signed(&self, doc: &Document) -> Result<(), DocumentError>;
    async fn get_signed(&self, transaction_id: &str) -> Result<Document, DocumentError>;
    async fn exists_signed(&self, transaction_id: &str) -> Result<bool, DocumentError>;
    async fn del_signed(&self, transaction_id: &str) -> Result<(), DocumentError>;
    async fn add_ttl_signed(&self, transaction_id: &str) -> Result<(), DocumentError>;

    /// Record the revocation time of `transaction_id`.
    async fn save_revoked(&self, transaction_id: &str) -> Result<(), DocumentError>;
    async fn get_revoked(&self, transaction_id: &str) -> Result<UnixSeconds, DocumentError>;
    /// Transport failures are returned, never folded into `false`.
    async fn is_revoked(&self, transaction_id: &str) -> Result<bool, DocumentError>;

    /// Store a signing failure in the signed bucket. No data is written.
    async fn save_signing_failure(
        &self,
        transaction_id: &str,
        message: &str,
    ) -> Result<(), DocumentError>;

    async fn save_validation(&self, report: &Validation) -> Result<(), DocumentError>;
    async fn get_validation(&self, transaction_id: &str) -> Result<Validation, DocumentError>;
}
