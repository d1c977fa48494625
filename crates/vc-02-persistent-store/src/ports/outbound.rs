//! # Outbound Ports
//!
//! The document database the store runs on.

use async_trait::async_trait;
use shared_types::PersistentRecord;

use crate::domain::{PersistentError, RecordFilter, RecordUpdate};

/// Record collection with unique indexes on transaction id and document id.
///
/// Implementations must make each call atomic per record, and must check
/// the unique indexes and write in one step.
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Insert a new record. [`PersistentError::Duplicate`] on index clash.
    async fn insert(&self, record: PersistentRecord) -> Result<(), PersistentError>;

    /// Replace the first record matching `filter`. `false` when none matched.
    async fn replace_one(
        &self,
        filter: &RecordFilter,
        record: PersistentRecord,
    ) -> Result<bool, PersistentError>;

    /// Delete every match, returning the count.
    async fn delete_many(&self, filter: &RecordFilter) -> Result<usize, PersistentError>;

    /// Matches in insertion order, at most `limit` when given.
    async fn find(
        &self,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<PersistentRecord>, PersistentError>;

    /// Apply `update` to every match, returning how many changed.
    async fn update_many(
        &self,
        filter: &RecordFilter,
        update: &RecordUpdate,
    ) -> Result<usize, PersistentError>;

    /// Health check.
    async fn ping(&self) -> Result<(), PersistentError>;
}
