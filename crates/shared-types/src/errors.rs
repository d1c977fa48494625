//! # Error Types
//!
//! Validation errors raised by the entities themselves, before any store
//! is touched.

use thiserror::Error;

/// An entity failed its own shape checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// The transaction id is empty.
    #[error("no transaction id")]
    MissingTransactionId,

    /// The payload is empty where content is required.
    #[error("data is empty")]
    EmptyData,

    /// Neither of the identifying fields of a record is set.
    #[error("record has neither transaction_id nor meta.document_id")]
    MissingIdentifier,

    /// Metadata does not name a single document.
    #[error("metadata needs both authentic_source and document_id")]
    IncompleteDocumentKey,
}
