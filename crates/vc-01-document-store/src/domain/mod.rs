//! # Domain Module
//!
//! Buckets, the field-map codec, configuration and errors.

pub mod bucket;
pub mod config;
pub mod errors;
pub mod fields;

pub use bucket::Bucket;
pub use config::{DocumentStoreConfig, RevocationPolicy};
pub use errors::{CacheError, DocumentError};
