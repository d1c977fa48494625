//! # Unique Indexes

use shared_types::PersistentRecord;

/// A unique index over one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueIndex {
    TransactionId,
    DocumentId,
}

impl UniqueIndex {
    pub const ALL: [UniqueIndex; 2] = [UniqueIndex::TransactionId, UniqueIndex::DocumentId];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionId => "transaction_id",
            Self::DocumentId => "document_id",
        }
    }

    /// Indexed value of `record`, `None` when the field is empty.
    #[must_use]
    pub fn value<'a>(&self, record: &'a PersistentRecord) -> Option<&'a str> {
        let value = match self {
            Self::TransactionId => record.transaction_id.as_str(),
            Self::DocumentId => record.meta.document_id.as_str(),
        };
        (!value.is_empty()).then_some(value)
    }
}
