//! # Persistent Store Service
//!
//! Implements [`PersistentStoreApi`] over any [`RecordBackend`].

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{now_unix, Identity, MetaData, PersistentRecord};
use tracing::{debug, info};

use crate::domain::{IdentityMatch, PersistentError, PortalQuery, RecordFilter, RecordUpdate};
use crate::ports::inbound::PersistentStoreApi;
use crate::ports::outbound::RecordBackend;

pub struct PersistentStore {
    backend: Arc<dyn RecordBackend>,
}

impl PersistentStore {
    #[must_use]
    pub fn new(backend: Arc<dyn RecordBackend>) -> Self {
        Self { backend }
    }

    /// Exactly one record or [`PersistentError::NotFound`].
    async fn find_one(&self, filter: &RecordFilter) -> Result<PersistentRecord, PersistentError> {
        self.backend
            .find(filter, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or(PersistentError::NotFound)
    }

    fn replace_filter(record: &PersistentRecord) -> RecordFilter {
        if record.meta.document_id.is_empty() {
            RecordFilter::new().transaction_id(record.transaction_id.clone())
        } else {
            RecordFilter::for_document(&record.meta)
        }
    }
}

#[async_trait]
impl PersistentStoreApi for PersistentStore {
    async fn save(&self, record: &PersistentRecord) -> Result<(), PersistentError> {
        record.validate()?;
        self.backend.insert(record.clone()).await?;
        debug!(
            transaction_id = %record.transaction_id,
            document_id = %record.meta.document_id,
            "[vc-02] Record saved"
        );
        Ok(())
    }

    async fn replace(&self, record: &PersistentRecord) -> Result<(), PersistentError> {
        record.validate()?;
        let filter = Self::replace_filter(record);
        if !self.backend.replace_one(&filter, record.clone()).await? {
            return Err(PersistentError::NotFound);
        }
        debug!(
            transaction_id = %record.transaction_id,
            document_id = %record.meta.document_id,
            "[vc-02] Record replaced"
        );
        Ok(())
    }

    async fn delete(&self, query: &RecordFilter) -> Result<usize, PersistentError> {
        let removed = self.backend.delete_many(query).await?;
        debug!(removed, "[vc-02] Records deleted");
        Ok(removed)
    }

    async fn delete_document(&self, meta: &MetaData) -> Result<bool, PersistentError> {
        meta.require_document_key()?;
        let removed = self
            .backend
            .delete_many(&RecordFilter::for_deletion(meta))
            .await?;
        debug!(
            authentic_source = %meta.authentic_source,
            document_type = %meta.document_type,
            document_id = %meta.document_id,
            removed,
            "[vc-02] Document deleted"
        );
        Ok(removed > 0)
    }

    async fn get(&self, transaction_id: &str) -> Result<PersistentRecord, PersistentError> {
        self.find_one(&RecordFilter::new().transaction_id(transaction_id))
            .await
    }

    async fn get_document(
        &self,
        authentic_source: &str,
        document_type: &str,
        document_id: &str,
    ) -> Result<PersistentRecord, PersistentError> {
        let filter = RecordFilter::new()
            .authentic_source(authentic_source)
            .document_type(document_type)
            .document_id(document_id);
        self.find_one(&filter).await
    }

    async fn get_document_collect_id(
        &self,
        authentic_source: &str,
        collect_id: &str,
        document_type: &str,
        identity: &Identity,
    ) -> Result<PersistentRecord, PersistentError> {
        let filter = RecordFilter::new()
            .authentic_source(authentic_source)
            .collect_id(collect_id)
            .document_type(document_type)
            .identity(IdentityMatch::Person(identity.clone()));
        self.find_one(&filter).await
    }

    async fn get_by_revocation_id(
        &self,
        authentic_source: &str,
        document_type: &str,
        revocation_id: &str,
    ) -> Result<PersistentRecord, PersistentError> {
        let filter = RecordFilter::new()
            .authentic_source(authentic_source)
            .document_type(document_type)
            .revocation_id(revocation_id);
        self.find_one(&filter).await
    }

    async fn portal_data(
        &self,
        query: &PortalQuery,
    ) -> Result<Vec<PersistentRecord>, PersistentError> {
        self.backend.find(&RecordFilter::from(query), None).await
    }

    async fn id_mapping(
        &self,
        authentic_source: &str,
        identity: &Identity,
    ) -> Result<String, PersistentError> {
        let filter = RecordFilter::new()
            .authentic_source(authentic_source)
            .identity(IdentityMatch::Name(identity.clone()));
        let record = self.find_one(&filter).await?;
        Ok(record.meta.authentic_source_person_id)
    }

    async fn search(
        &self,
        query: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<PersistentRecord>, PersistentError> {
        self.backend.find(query, limit).await
    }

    async fn revoke(&self, transaction_id: &str) -> Result<(), PersistentError> {
        let filter = RecordFilter::new().transaction_id(transaction_id);
        let changed = self
            .backend
            .update_many(&filter, &RecordUpdate::Revoke { at: now_unix() })
            .await?;
        if changed == 0 {
            // Either absent or already revoked.
            self.find_one(&filter).await?;
            return Ok(());
        }
        info!(transaction_id, "[vc-02] Record revoked");
        Ok(())
    }

    async fn is_revoked(&self, transaction_id: &str) -> Result<bool, PersistentError> {
        Ok(self.get(transaction_id).await?.is_revoked())
    }

    async fn revoke_by_owner(&self, owner_id: &str) -> Result<usize, PersistentError> {
        let changed = self
            .backend
            .update_many(
                &RecordFilter::new().owner_id(owner_id),
                &RecordUpdate::Revoke { at: now_unix() },
            )
            .await?;
        info!(owner_id, changed, "[vc-02] Owner records revoked");
        Ok(changed)
    }

    async fn status(&self) -> Result<(), PersistentError> {
        self.backend.ping().await
    }
}
