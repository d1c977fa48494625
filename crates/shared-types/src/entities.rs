//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Lifecycle**: [`Document`], [`Validation`]
//! - **Persistence**: [`PersistentRecord`], [`MetaData`], [`Revocation`],
//!   [`Identity`]

use serde::{Deserialize, Serialize};

use crate::errors::EntityError;

/// Seconds since the Unix epoch. `0` means "not set".
pub type UnixSeconds = i64;

/// Current wall clock time in Unix seconds.
#[must_use]
pub fn now_unix() -> UnixSeconds {
    chrono::Utc::now().timestamp()
}

// =============================================================================
// CLUSTER A: LIFECYCLE
// =============================================================================

/// The unit of work moving through the signing pipeline.
///
/// A document with a non-zero `revoked_at` is unreadable through the
/// ordinary get operations of the lifecycle store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    /// Primary identifier, unique within a lifecycle bucket.
    pub transaction_id: String,
    /// Opaque payload, usually base64 encoded.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub created_at: UnixSeconds,
    #[serde(skip_serializing_if = "is_zero")]
    pub signed_at: UnixSeconds,
    #[serde(skip_serializing_if = "is_zero")]
    pub revoked_at: UnixSeconds,
    /// Upstream batch or UID the document belongs to. Used for bulk revoke.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner_id: String,
    /// Set when signing failed; the signed bucket then carries no data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Document {
    /// Create a document with a transaction id and payload.
    #[must_use]
    pub fn new(transaction_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            data: data.into(),
            ..Default::default()
        }
    }

    /// Attach the owner (batch/UID) of this document.
    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = owner_id.into();
        self
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at != 0
    }

    /// Fails when the transaction id is empty.
    pub fn require_transaction_id(&self) -> Result<(), EntityError> {
        if self.transaction_id.is_empty() {
            return Err(EntityError::MissingTransactionId);
        }
        Ok(())
    }

    /// Fails when the payload is empty.
    pub fn require_data(&self) -> Result<(), EntityError> {
        if self.data.is_empty() {
            return Err(EntityError::EmptyData);
        }
        Ok(())
    }
}

/// Outcome of validating a signed document against the signing authority.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Validation {
    pub transaction_id: String,
    pub valid_signature: bool,
    pub is_revoked: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub validated_at: UnixSeconds,
}

// =============================================================================
// CLUSTER B: PERSISTENCE
// =============================================================================

/// Revocation state carried in a record's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Revocation {
    /// Identifier issuers use to revoke without knowing the document id.
    pub id: String,
    pub revoked: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub revoked_at: UnixSeconds,
}

/// Natural person a document was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub version: String,
    pub family_name: String,
    pub given_name: String,
    /// ISO 8601 date (`YYYY-MM-DD`).
    #[serde(skip_serializing_if = "String::is_empty")]
    pub birth_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uuid: String,
}

impl Identity {
    /// Version and name match, birth date ignored.
    #[must_use]
    pub fn matches_name(&self, other: &Identity) -> bool {
        self.version == other.version
            && self.family_name == other.family_name
            && self.given_name == other.given_name
    }

    /// Version, name and birth date match.
    #[must_use]
    pub fn matches_person(&self, other: &Identity) -> bool {
        self.matches_name(other) && self.birth_date == other.birth_date
    }
}

/// Indexable metadata of a persistent record.
///
/// Also the payload of persistent-delete tasks, where only
/// `authentic_source`, `document_type` and `document_id` are meaningful.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaData {
    pub authentic_source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub authentic_source_person_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub document_version: String,
    pub document_type: String,
    pub document_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub collect_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub member_state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation: Option<Revocation>,
    #[serde(skip_serializing_if = "is_zero")]
    pub valid_from: UnixSeconds,
    #[serde(skip_serializing_if = "is_zero")]
    pub valid_to: UnixSeconds,
    #[serde(skip_serializing_if = "is_zero")]
    pub created_at: UnixSeconds,
}

impl MetaData {
    /// Both halves of the document key must be set.
    pub fn require_document_key(&self) -> Result<(), EntityError> {
        if self.authentic_source.is_empty() || self.document_id.is_empty() {
            return Err(EntityError::IncompleteDocumentKey);
        }
        Ok(())
    }

    /// Revocation id, if the record carries one.
    #[must_use]
    pub fn revocation_id(&self) -> Option<&str> {
        self.revocation
            .as_ref()
            .map(|r| r.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Durable counterpart of a [`Document`] plus indexable metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentRecord {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub transaction_id: String,
    pub meta: MetaData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identities: Vec<Identity>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub document_data: serde_json::Value,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub owner_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub revoked_at: UnixSeconds,
}

impl PersistentRecord {
    /// A record must be addressable by transaction id or document id.
    pub fn validate(&self) -> Result<(), EntityError> {
        if self.transaction_id.is_empty() && self.meta.document_id.is_empty() {
            return Err(EntityError::MissingIdentifier);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at != 0 || self.meta.revocation.as_ref().is_some_and(|r| r.revoked)
    }

    /// Mark the record revoked at `at`.
    pub fn revoke(&mut self, at: UnixSeconds) {
        self.revoked_at = at;
        let revocation = self.meta.revocation.get_or_insert_with(Revocation::default);
        revocation.revoked = true;
        revocation.revoked_at = at;
    }
}

impl From<&Document> for PersistentRecord {
    fn from(doc: &Document) -> Self {
        Self {
            transaction_id: doc.transaction_id.clone(),
            meta: MetaData {
                created_at: doc.created_at,
                ..Default::default()
            },
            owner_id: doc.owner_id.clone(),
            data: doc.data.clone(),
            revoked_at: doc.revoked_at,
            ..Default::default()
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}
