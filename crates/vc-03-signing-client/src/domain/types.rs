//! # Wire Types

use serde::{Deserialize, Serialize};
use shared_types::{now_unix, Document, Validation};

/// Key selection sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub version: u32,
    pub key_label: String,
    pub encoding: String,
    pub key_type: String,
}

/// One document to sign or validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedDocument {
    pub id: String,
    pub data: String,
}

impl From<&Document> for UnsignedDocument {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.transaction_id.clone(),
            data: doc.data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    pub meta: RequestMeta,
    pub documents: Vec<UnsignedDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyMeta {
    pub version: u32,
    pub encoding: String,
    pub signer_public_key: String,
    pub signature_algorithm: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureValue {
    pub id: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignReply {
    pub meta: ReplyMeta,
    pub signature_values: Vec<SignatureValue>,
}

impl SignReply {
    /// Signature for document `id`, if the authority returned one.
    #[must_use]
    pub fn signature_for(&self, id: &str) -> Option<&str> {
        self.signature_values
            .iter()
            .find(|v| v.id == id)
            .map(|v| v.signature.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub meta: RequestMeta,
    pub document: UnsignedDocument,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidateReply {
    pub valid_signature: bool,
    pub message: String,
}

impl ValidateReply {
    /// Validation report for document `id`. Revocation is annotated later.
    #[must_use]
    pub fn into_validation(self, id: &str) -> Validation {
        Validation {
            transaction_id: id.to_string(),
            valid_signature: self.valid_signature,
            message: self.message,
            validated_at: now_unix(),
            ..Default::default()
        }
    }
}

/// Body of any non-2xx reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorReply {
    pub message: String,
}
