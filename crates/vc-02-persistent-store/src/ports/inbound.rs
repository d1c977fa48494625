//! # Inbound Ports
//!
//! API trait defining what the persistent store can do.

use async_trait::async_trait;
use shared_types::{Identity, MetaData, PersistentRecord};

use crate::domain::{PersistentError, PortalQuery, RecordFilter};

/// Persistent store API.
#[async_trait]
pub trait PersistentStoreApi: Send + Sync {
    async fn save(&self, record: &PersistentRecord) -> Result<(), PersistentError>;

    /// Replace the record with the same authentic source and document id,
    /// or with the same transaction id when the record has no document id.
    async fn replace(&self, record: &PersistentRecord) -> Result<(), PersistentError>;

    /// Delete every match. Returns the count; zero is not an error.
    async fn delete(&self, query: &RecordFilter) -> Result<usize, PersistentError>;

    /// Delete the record named by `meta`: authentic source, document type
    /// and document id. Source and id must be non-empty; since the document
    /// id is uniquely indexed at most one record is removed.
    async fn delete_document(&self, meta: &MetaData) -> Result<bool, PersistentError>;

    async fn get(&self, transaction_id: &str) -> Result<PersistentRecord, PersistentError>;

    async fn get_document(
        &self,
        authentic_source: &str,
        document_type: &str,
        document_id: &str,
    ) -> Result<PersistentRecord, PersistentError>;

    async fn get_document_collect_id(
        &self,
        authentic_source: &str,
        collect_id: &str,
        document_type: &str,
        identity: &Identity,
    ) -> Result<PersistentRecord, PersistentError>;

    async fn get_by_revocation_id(
        &self,
        authentic_source: &str,
        document_type: &str,
        revocation_id: &str,
    ) -> Result<PersistentRecord, PersistentError>;

    /// All records of one person, possibly empty.
    async fn portal_data(
        &self,
        query: &PortalQuery,
    ) -> Result<Vec<PersistentRecord>, PersistentError>;

    /// Resolve an identity to the authentic source's person id.
    async fn id_mapping(
        &self,
        authentic_source: &str,
        identity: &Identity,
    ) -> Result<String, PersistentError>;

    async fn search(
        &self,
        query: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<PersistentRecord>, PersistentError>;

    async fn revoke(&self, transaction_id: &str) -> Result<(), PersistentError>;

    /// [`PersistentError::NotFound`] when no record exists.
    async fn is_revoked(&self, transaction_id: &str) -> Result<bool, PersistentError>;

    /// Revoke every record of `owner_id`. Returns how many changed.
    async fn revoke_by_owner(&self, owner_id: &str) -> Result<usize, PersistentError>;

    async fn status(&self) -> Result<(), PersistentError>;
}
