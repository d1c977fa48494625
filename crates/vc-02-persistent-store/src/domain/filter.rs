//! # Record Filters
//!
//! Equality filters over indexed metadata. Every set field must match; an
//! empty filter matches everything.

use shared_types::{Identity, MetaData, PersistentRecord, UnixSeconds};

/// How an identity criterion is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMatch {
    /// Version, family name and given name.
    Name(Identity),
    /// Name criteria plus birth date.
    Person(Identity),
}

impl IdentityMatch {
    fn matches(&self, identities: &[Identity]) -> bool {
        match self {
            Self::Name(wanted) => identities.iter().any(|i| i.matches_name(wanted)),
            Self::Person(wanted) => identities.iter().any(|i| i.matches_person(wanted)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub transaction_id: Option<String>,
    pub authentic_source: Option<String>,
    pub document_type: Option<String>,
    pub document_id: Option<String>,
    pub collect_id: Option<String>,
    pub revocation_id: Option<String>,
    pub person_id: Option<String>,
    pub owner_id: Option<String>,
    pub identity: Option<IdentityMatch>,
    /// `meta.valid_from >= value`
    pub valid_from_gte: Option<UnixSeconds>,
    /// `meta.valid_to <= value`
    pub valid_to_lte: Option<UnixSeconds>,
}

fn eq(wanted: &Option<String>, actual: &str) -> bool {
    wanted.as_deref().map_or(true, |w| w == actual)
}

impl RecordFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn transaction_id(mut self, value: impl Into<String>) -> Self {
        self.transaction_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn authentic_source(mut self, value: impl Into<String>) -> Self {
        self.authentic_source = Some(value.into());
        self
    }

    #[must_use]
    pub fn document_type(mut self, value: impl Into<String>) -> Self {
        self.document_type = Some(value.into());
        self
    }

    #[must_use]
    pub fn document_id(mut self, value: impl Into<String>) -> Self {
        self.document_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn collect_id(mut self, value: impl Into<String>) -> Self {
        self.collect_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn revocation_id(mut self, value: impl Into<String>) -> Self {
        self.revocation_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn person_id(mut self, value: impl Into<String>) -> Self {
        self.person_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn owner_id(mut self, value: impl Into<String>) -> Self {
        self.owner_id = Some(value.into());
        self
    }

    #[must_use]
    pub fn identity(mut self, criterion: IdentityMatch) -> Self {
        self.identity = Some(criterion);
        self
    }

    /// Filter addressing the record a replace task names.
    #[must_use]
    pub fn for_document(meta: &MetaData) -> Self {
        Self::new()
            .authentic_source(meta.authentic_source.clone())
            .document_id(meta.document_id.clone())
    }

    /// Filter addressing the record a delete task names. The document type
    /// must match too, empty included.
    #[must_use]
    pub fn for_deletion(meta: &MetaData) -> Self {
        Self::for_document(meta).document_type(meta.document_type.clone())
    }

    #[must_use]
    pub fn matches(&self, record: &PersistentRecord) -> bool {
        let meta = &record.meta;
        eq(&self.transaction_id, &record.transaction_id)
            && eq(&self.authentic_source, &meta.authentic_source)
            && eq(&self.document_type, &meta.document_type)
            && eq(&self.document_id, &meta.document_id)
            && eq(&self.collect_id, &meta.collect_id)
            && eq(&self.person_id, &meta.authentic_source_person_id)
            && eq(&self.owner_id, &record.owner_id)
            && self
                .revocation_id
                .as_deref()
                .map_or(true, |w| meta.revocation_id() == Some(w))
            && self
                .identity
                .as_ref()
                .map_or(true, |c| c.matches(&record.identities))
            && self.valid_from_gte.map_or(true, |v| meta.valid_from >= v)
            && self.valid_to_lte.map_or(true, |v| meta.valid_to <= v)
    }
}

/// Portal listing criteria for one person at one authentic source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalQuery {
    pub authentic_source: String,
    pub authentic_source_person_id: String,
    pub valid_from: Option<UnixSeconds>,
    pub valid_to: Option<UnixSeconds>,
    pub document_type: Option<String>,
}

impl From<&PortalQuery> for RecordFilter {
    fn from(q: &PortalQuery) -> Self {
        RecordFilter {
            authentic_source: Some(q.authentic_source.clone()),
            person_id: Some(q.authentic_source_person_id.clone()),
            document_type: q.document_type.clone(),
            valid_from_gte: q.valid_from,
            valid_to_lte: q.valid_to,
            ..Default::default()
        }
    }
}

/// Multi-record mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordUpdate {
    Revoke { at: UnixSeconds },
}

impl RecordUpdate {
    /// Apply to `record`. Returns `false` when nothing changed.
    pub fn apply(&self, record: &mut PersistentRecord) -> bool {
        match self {
            Self::Revoke { at } => {
                if record.is_revoked() {
                    return false;
                }
                record.revoke(*at);
                true
            }
        }
    }
}
