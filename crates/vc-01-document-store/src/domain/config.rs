//! # Store Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a get treats a failing revocation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationPolicy {
    /// Surface the transport error; the document stays unreadable.
    #[default]
    FailClosed,
    /// Log the error and read the bucket as if not revoked.
    FailOpen,
}

impl RevocationPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailClosed => "fail_closed",
            Self::FailOpen => "fail_open",
        }
    }
}

impl std::str::FromStr for RevocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_closed" | "closed" => Ok(Self::FailClosed),
            "fail_open" | "open" => Ok(Self::FailOpen),
            other => Err(format!("unknown revocation policy: {other}")),
        }
    }
}

/// Retention and revocation settings of the lifecycle store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStoreConfig {
    /// TTL applied by `add_ttl_unsigned`.
    pub keep_unsigned: Duration,
    /// TTL applied by `add_ttl_signed`.
    pub keep_signed: Duration,
    pub revocation_policy: RevocationPolicy,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            keep_unsigned: Duration::from_secs(60 * 60),
            keep_signed: Duration::from_secs(24 * 60 * 60),
            revocation_policy: RevocationPolicy::FailClosed,
        }
    }
}
