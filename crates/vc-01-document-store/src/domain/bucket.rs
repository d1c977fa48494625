//! # Lifecycle Buckets

use std::fmt;

/// Independent key space for one lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Unsigned,
    Signed,
    /// Holds only the revocation timestamp.
    Revoked,
    /// Validation reports.
    Ladok,
}

impl Bucket {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unsigned => "unsigned",
            Self::Signed => "signed",
            Self::Revoked => "revoked",
            Self::Ladok => "ladok",
        }
    }

    /// Cache key: `doc:<transaction_id>:<bucket>`.
    #[must_use]
    pub fn key(&self, transaction_id: &str) -> String {
        format!("doc:{}:{}", transaction_id, self.as_str())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
