//! # Domain Errors

use shared_types::EntityError;
use thiserror::Error;

/// Errors of the persistent store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistentError {
    /// A unique index already holds this value.
    #[error("duplicate key on index {index}: {value}")]
    Duplicate { index: &'static str, value: String },

    /// No record matched. An expected negative result.
    #[error("no record found")]
    NotFound,

    #[error("invalid record: {0}")]
    Invalid(#[from] EntityError),

    /// The backing database failed.
    #[error("database error: {0}")]
    Backend(String),
}

impl PersistentError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
