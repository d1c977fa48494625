//! # Field-Map Codec
//!
//! Every bucket entry is a flat map of string fields. Unset values (empty
//! strings, zero timestamps, `None`) are not written. A save removes the
//! fields it does not write, so decoding an entry yields the exact document
//! that was saved last.

use std::collections::HashMap;

use shared_types::{Document, UnixSeconds, Validation};

use super::errors::CacheError;

pub const TRANSACTION_ID: &str = "transaction_id";
pub const DATA: &str = "data";
/// Last modification time, bookkeeping only.
pub const TS: &str = "ts";
pub const CREATED_AT: &str = "created_at";
pub const SIGNED_AT: &str = "signed_at";
pub const REVOKED_AT: &str = "revoked_at";
pub const UID: &str = "uid";
pub const ERROR: &str = "error";

pub const VALID_SIGNATURE: &str = "valid_signature";
pub const IS_REVOKED: &str = "is_revoked";
pub const MESSAGE: &str = "message";
pub const VALIDATED_AT: &str = "validated_at";

/// Fields removed by `del_unsigned` / `del_signed`.
pub const PAYLOAD_FIELDS: &[&str] = &[DATA, TS];

/// Every field a document entry can hold.
pub const DOCUMENT_FIELDS: &[&str] = &[
    TRANSACTION_ID,
    DATA,
    TS,
    CREATED_AT,
    SIGNED_AT,
    REVOKED_AT,
    UID,
    ERROR,
];

/// Every field a validation entry can hold.
pub const VALIDATION_FIELDS: &[&str] = &[
    TRANSACTION_ID,
    VALID_SIGNATURE,
    IS_REVOKED,
    MESSAGE,
    ERROR,
    VALIDATED_AT,
    TS,
];

/// Names in `all` that `encoded` leaves unset.
#[must_use]
pub fn unset_fields(all: &[&'static str], encoded: &[(String, String)]) -> Vec<&'static str> {
    all.iter()
        .copied()
        .filter(|name| !encoded.iter().any(|(k, _)| k == name))
        .collect()
}

fn push_str(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    if !value.is_empty() {
        fields.push((name.to_string(), value.to_string()));
    }
}

fn push_ts(fields: &mut Vec<(String, String)>, name: &str, value: UnixSeconds) {
    if value != 0 {
        fields.push((name.to_string(), value.to_string()));
    }
}

fn parse_ts(
    key: &str,
    map: &HashMap<String, String>,
    name: &str,
) -> Result<UnixSeconds, CacheError> {
    match map.get(name) {
        None => Ok(0),
        Some(raw) => raw.parse().map_err(|_| CacheError::Corrupt {
            key: key.to_string(),
            reason: format!("field {name} is not a unix timestamp: {raw:?}"),
        }),
    }
}

fn parse_bool(key: &str, map: &HashMap<String, String>, name: &str) -> Result<bool, CacheError> {
    match map.get(name).map(String::as_str) {
        None => Ok(false),
        Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(raw) => Err(CacheError::Corrupt {
            key: key.to_string(),
            reason: format!("field {name} is not a boolean: {raw:?}"),
        }),
    }
}

/// Encode a document, stamping `ts` with `now`.
#[must_use]
pub fn encode_document(doc: &Document, now: UnixSeconds) -> Vec<(String, String)> {
    let mut fields = Vec::with_capacity(8);
    push_str(&mut fields, TRANSACTION_ID, &doc.transaction_id);
    push_str(&mut fields, DATA, &doc.data);
    push_ts(&mut fields, CREATED_AT, doc.created_at);
    push_ts(&mut fields, SIGNED_AT, doc.signed_at);
    push_ts(&mut fields, REVOKED_AT, doc.revoked_at);
    push_str(&mut fields, UID, &doc.owner_id);
    if let Some(error) = &doc.error {
        push_str(&mut fields, ERROR, error);
    }
    fields.push((TS.to_string(), now.to_string()));
    fields
}

/// Decode a bucket entry. `key` is only used in error messages.
pub fn decode_document(key: &str, map: &HashMap<String, String>) -> Result<Document, CacheError> {
    Ok(Document {
        transaction_id: map.get(TRANSACTION_ID).cloned().unwrap_or_default(),
        data: map.get(DATA).cloned().unwrap_or_default(),
        created_at: parse_ts(key, map, CREATED_AT)?,
        signed_at: parse_ts(key, map, SIGNED_AT)?,
        revoked_at: parse_ts(key, map, REVOKED_AT)?,
        owner_id: map.get(UID).cloned().unwrap_or_default(),
        error: map.get(ERROR).cloned(),
    })
}

#[must_use]
pub fn encode_validation(report: &Validation, now: UnixSeconds) -> Vec<(String, String)> {
    let mut fields = Vec::with_capacity(7);
    push_str(&mut fields, TRANSACTION_ID, &report.transaction_id);
    fields.push((VALID_SIGNATURE.to_string(), report.valid_signature.to_string()));
    fields.push((IS_REVOKED.to_string(), report.is_revoked.to_string()));
    push_str(&mut fields, MESSAGE, &report.message);
    if let Some(error) = &report.error {
        push_str(&mut fields, ERROR, error);
    }
    push_ts(&mut fields, VALIDATED_AT, report.validated_at);
    fields.push((TS.to_string(), now.to_string()));
    fields
}

pub fn decode_validation(
    key: &str,
    map: &HashMap<String, String>,
) -> Result<Validation, CacheError> {
    Ok(Validation {
        transaction_id: map.get(TRANSACTION_ID).cloned().unwrap_or_default(),
        valid_signature: parse_bool(key, map, VALID_SIGNATURE)?,
        is_revoked: parse_bool(key, map, IS_REVOKED)?,
        message: map.get(MESSAGE).cloned().unwrap_or_default(),
        error: map.get(ERROR).cloned(),
        validated_at: parse_ts(key, map, VALIDATED_AT)?,
    })
}

/// Parse the revocation timestamp stored under `ts`.
pub fn parse_revoked_ts(key: &str, raw: &str) -> Result<UnixSeconds, CacheError> {
    raw.parse().map_err(|_| CacheError::Corrupt {
        key: key.to_string(),
        reason: format!("revocation ts is not a unix timestamp: {raw:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_map(fields: Vec<(String, String)>) -> HashMap<String, String> {
        fields.into_iter().collect()
    }

    #[test]
    fn test_unset_fields_are_not_written() {
        let fields = encode_document(&Document::new("abc", ""), 42);
        let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec![TRANSACTION_ID, TS]);
    }

    #[test]
    fn test_document_decodes_to_what_was_encoded() {
        let doc = Document {
            transaction_id: "abc".into(),
            data: "Zm9v".into(),
            created_at: 10,
            signed_at: 20,
            owner_id: "uid-1".into(),
            error: Some("hsm offline".into()),
            ..Default::default()
        };
        let map = to_map(encode_document(&doc, 99));
        assert_eq!(map.get(TS).map(String::as_str), Some("99"));
        assert_eq!(decode_document("k", &map).unwrap(), doc);
    }

    #[test]
    fn test_unset_fields_lists_what_encode_skips() {
        let doc = Document {
            transaction_id: "abc".into(),
            data: "Zm9v".into(),
            signed_at: 20,
            ..Default::default()
        };
        let stale = unset_fields(DOCUMENT_FIELDS, &encode_document(&doc, 1));
        assert_eq!(stale, vec![CREATED_AT, REVOKED_AT, UID, ERROR]);
    }

    #[test]
    fn test_corrupt_timestamp() {
        let mut map = HashMap::new();
        map.insert(CREATED_AT.to_string(), "yesterday".to_string());
        let err = decode_document("doc:x:signed", &map).unwrap_err();
        assert!(matches!(err, CacheError::Corrupt { key, .. } if key == "doc:x:signed"));
    }

    #[test]
    fn test_validation_fields() {
        let report = Validation {
            transaction_id: "abc".into(),
            valid_signature: true,
            message: "signature ok".into(),
            validated_at: 7,
            ..Default::default()
        };
        let map = to_map(encode_validation(&report, 8));
        assert_eq!(decode_validation("k", &map).unwrap(), report);
    }
}
