//! # Domain Errors

use shared_types::EntityError;
use thiserror::Error;

use super::bucket::Bucket;

/// Errors reported by a [`crate::KeyValueCache`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The cache could not be reached or the operation failed in transit.
    #[error("cache transport error: {0}")]
    Transport(String),

    /// A stored value could not be decoded.
    #[error("corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors of the document lifecycle store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("no transaction id")]
    NoTransactionId,

    #[error("data is empty")]
    DataEmpty,

    /// The document is revoked; its bucket content is not readable.
    #[error("document is revoked: {transaction_id}")]
    Revoked { transaction_id: String },

    #[error("document not found: {transaction_id} in {bucket}")]
    NotFound {
        transaction_id: String,
        bucket: Bucket,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl DocumentError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Cache(CacheError::Transport(_)))
    }
}

impl From<EntityError> for DocumentError {
    fn from(err: EntityError) -> Self {
        match err {
            EntityError::MissingTransactionId | EntityError::MissingIdentifier => {
                Self::NoTransactionId
            }
            EntityError::EmptyData => Self::DataEmpty,
        }
    }
}
