//! # Signing Client Configuration

use serde::{Deserialize, Serialize};

use super::types::RequestMeta;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningClientConfig {
    /// Base URL of the authority, without trailing path.
    pub url: String,
    /// Bearer token. Empty means no `Authorization` header.
    pub token: String,
    pub key_label: String,
    pub key_type: String,
    pub encoding: String,
    pub version: u32,
    pub timeout_secs: u64,
}

impl Default for SigningClientConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            token: String::new(),
            key_label: "pkcs11_sign_test15".to_string(),
            key_type: "secp256r1".to_string(),
            encoding: "base64".to_string(),
            version: 1,
            timeout_secs: 10,
        }
    }
}

impl SigningClientConfig {
    #[must_use]
    pub fn request_meta(&self) -> RequestMeta {
        RequestMeta {
            version: self.version,
            key_label: self.key_label.clone(),
            encoding: self.encoding.clone(),
            key_type: self.key_type.clone(),
        }
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), path)
    }
}
