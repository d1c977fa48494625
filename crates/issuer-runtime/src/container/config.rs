//! # Issuer Configuration
//!
//! Unified configuration for the stores, the queues and the signing client.
//!
//! ## Sources
//!
//! 1. Built-in defaults
//! 2. TOML file named by `VC_CONFIG` (optional)
//! 3. Environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VC_DATA_DIR` | `storage.data_dir` |
//! | `VC_STORAGE_BACKEND` | `storage.backend` |
//! | `VC_SIGNING_URL` | `signing.url` |
//! | `VC_SIGNING_TOKEN` | `signing.token` |
//! | `VC_KEEP_SIGNED_SECS` | `key_value.keep_signed_secs` |
//! | `VC_KEEP_UNSIGNED_SECS` | `key_value.keep_unsigned_secs` |
//! | `VC_REVOCATION_POLICY` | `key_value.revocation_policy` |

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use vc_01_document_store::{DocumentStoreConfig, RevocationPolicy};
use vc_03_signing_client::SigningClientConfig;

use crate::registry::QueueKind;

/// Complete issuer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerConfig {
    /// Lifecycle store retention and revocation.
    pub key_value: KeyValueConfig,
    /// Queue name per queue kind.
    pub queues: QueuesConfig,
    /// Signing authority client.
    pub signing: SigningClientConfig,
    /// Storage backend selection.
    pub storage: StorageConfig,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value}")]
    Env { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyValueConfig {
    pub keep_unsigned_secs: u64,
    pub keep_signed_secs: u64,
    pub revocation_policy: RevocationPolicy,
}

impl Default for KeyValueConfig {
    fn default() -> Self {
        let defaults = DocumentStoreConfig::default();
        Self {
            keep_unsigned_secs: defaults.keep_unsigned.as_secs(),
            keep_signed_secs: defaults.keep_signed.as_secs(),
            revocation_policy: defaults.revocation_policy,
        }
    }
}

impl KeyValueConfig {
    #[must_use]
    pub fn store_config(&self) -> DocumentStoreConfig {
        DocumentStoreConfig {
            keep_unsigned: Duration::from_secs(self.keep_unsigned_secs),
            keep_signed: Duration::from_secs(self.keep_signed_secs),
            revocation_policy: self.revocation_policy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueuesConfig {
    pub ladok_sign: String,
    pub ladok_validate: String,
    pub ladok_del_signed: String,
    pub ladok_persistent_save: String,
    pub vc_persistent_save: String,
    pub vc_persistent_replace: String,
    pub vc_persistent_delete: String,
}

impl Default for QueuesConfig {
    fn default() -> Self {
        Self {
            ladok_sign: QueueKind::LadokSign.default_name().to_string(),
            ladok_validate: QueueKind::LadokValidate.default_name().to_string(),
            ladok_del_signed: QueueKind::LadokDelSigned.default_name().to_string(),
            ladok_persistent_save: QueueKind::LadokPersistentSave.default_name().to_string(),
            vc_persistent_save: QueueKind::VcPersistentSave.default_name().to_string(),
            vc_persistent_replace: QueueKind::VcPersistentReplace.default_name().to_string(),
            vc_persistent_delete: QueueKind::VcPersistentDelete.default_name().to_string(),
        }
    }
}

impl QueuesConfig {
    /// Configured name of `kind`.
    #[must_use]
    pub fn name(&self, kind: QueueKind) -> &str {
        match kind {
            QueueKind::LadokSign => &self.ladok_sign,
            QueueKind::LadokValidate => &self.ladok_validate,
            QueueKind::LadokDelSigned => &self.ladok_del_signed,
            QueueKind::LadokPersistentSave => &self.ladok_persistent_save,
            QueueKind::VcPersistentSave => &self.vc_persistent_save,
            QueueKind::VcPersistentReplace => &self.vc_persistent_replace,
            QueueKind::VcPersistentDelete => &self.vc_persistent_delete,
        }
    }
}

/// Where caches, queues and records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory. Lost on restart.
    #[default]
    Memory,
    /// RocksDB under `data_dir`. Requires the `rocksdb` feature.
    Rocksdb,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" => Ok(Self::Rocksdb),
            other => Err(format!("unknown storage backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl IssuerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from `VC_CONFIG` (if set), apply environment overrides, validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("VC_CONFIG") {
            Ok(path) => {
                info!(path = %path, "Loading configuration file");
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("VC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup("VC_STORAGE_BACKEND") {
            self.storage.backend = value.parse().map_err(|_| ConfigError::Env {
                var: "VC_STORAGE_BACKEND",
                value,
            })?;
        }
        if let Some(url) = lookup("VC_SIGNING_URL") {
            self.signing.url = url;
        }
        if let Some(token) = lookup("VC_SIGNING_TOKEN") {
            self.signing.token = token;
        }
        if let Some(value) = lookup("VC_KEEP_SIGNED_SECS") {
            self.key_value.keep_signed_secs = parse_secs("VC_KEEP_SIGNED_SECS", value)?;
        }
        if let Some(value) = lookup("VC_KEEP_UNSIGNED_SECS") {
            self.key_value.keep_unsigned_secs = parse_secs("VC_KEEP_UNSIGNED_SECS", value)?;
        }
        if let Some(value) = lookup("VC_REVOCATION_POLICY") {
            self.key_value.revocation_policy = value.parse().map_err(|_| ConfigError::Env {
                var: "VC_REVOCATION_POLICY",
                value,
            })?;
        }
        Ok(())
    }

    /// Reject configurations the runtime cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_value.keep_signed_secs == 0 || self.key_value.keep_unsigned_secs == 0 {
            return Err(ConfigError::Invalid(
                "keep durations must be greater than zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for kind in QueueKind::ALL {
            let name = self.queues.name(kind);
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "queue name for {} is empty",
                    kind.default_name()
                )));
            }
            // ':' separates the queue name from the sequence in storage keys.
            if name.contains(':') {
                return Err(ConfigError::Invalid(format!(
                    "queue name {name} must not contain ':'"
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "queue name {name} is used twice"
                )));
            }
        }

        if self.signing.url.is_empty() {
            return Err(ConfigError::Invalid("signing.url is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_secs(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
