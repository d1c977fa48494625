//! # Payload Schemas
//!
//! Binds each queue to the one payload shape its worker decodes.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{Document, MetaData, PersistentRecord};

/// The payload shape a queue carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSchema {
    /// A full [`Document`].
    Document,
    /// A [`MetaData`] projection (authentic source, document id).
    MetaData,
    /// A complete [`PersistentRecord`].
    PersistentRecord,
}

impl PayloadSchema {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::MetaData => "meta_data",
            Self::PersistentRecord => "persistent_record",
        }
    }
}

impl fmt::Display for PayloadSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type that may travel on a queue.
pub trait QueuePayload: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Schema tag checked against the queue at registration.
    const SCHEMA: PayloadSchema;
}

impl QueuePayload for Document {
    const SCHEMA: PayloadSchema = PayloadSchema::Document;
}

impl QueuePayload for MetaData {
    const SCHEMA: PayloadSchema = PayloadSchema::MetaData;
}

impl QueuePayload for PersistentRecord {
    const SCHEMA: PayloadSchema = PayloadSchema::PersistentRecord;
}
