//! Handlers for the `vc_persistent_*` queues.

use async_trait::async_trait;
use shared_types::{MetaData, PersistentRecord};
use tracing::{debug, warn};
use vc_02_persistent_store::PersistentError;

use super::{HandlerError, Pipeline};
use crate::worker::TaskHandler;

pub struct RecordSaveHandler {
    pipeline: Pipeline,
}

impl RecordSaveHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for RecordSaveHandler {
    type Payload = PersistentRecord;

    fn name(&self) -> &'static str {
        "vc_persistent_save"
    }

    async fn handle(&self, record: PersistentRecord) -> Result<(), HandlerError> {
        match self.pipeline.persistent.save(&record).await {
            Ok(()) => Ok(()),
            // A redelivered save finds its own earlier insert.
            Err(PersistentError::Duplicate { index, value }) => {
                warn!(index, value = %value, "[vc-persistent] Record already saved");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

pub struct RecordReplaceHandler {
    pipeline: Pipeline,
}

impl RecordReplaceHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for RecordReplaceHandler {
    type Payload = PersistentRecord;

    fn name(&self) -> &'static str {
        "vc_persistent_replace"
    }

    async fn handle(&self, record: PersistentRecord) -> Result<(), HandlerError> {
        self.pipeline.persistent.replace(&record).await?;
        Ok(())
    }
}

/// Delete the record named by the metadata (authentic source, document
/// type and document id).
pub struct RecordDeleteHandler {
    pipeline: Pipeline,
}

impl RecordDeleteHandler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for RecordDeleteHandler {
    type Payload = MetaData;

    fn name(&self) -> &'static str {
        "vc_persistent_delete"
    }

    async fn handle(&self, meta: MetaData) -> Result<(), HandlerError> {
        let removed = self.pipeline.persistent.delete_document(&meta).await?;
        if !removed {
            debug!(
                authentic_source = %meta.authentic_source,
                document_id = %meta.document_id,
                "[vc-persistent] Nothing to delete"
            );
        }
        Ok(())
    }
}
