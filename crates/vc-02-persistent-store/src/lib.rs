//! # Persistent Store (vc-02)
//!
//! Durable, queryable document records that survive cache eviction.
//!
//! ## Indexes
//!
//! | Index | Field | Rule |
//! |-------|-------|------|
//! | `transaction_id` | `transaction_id` | unique, empty values not indexed |
//! | `document_id` | `meta.document_id` | unique, empty values not indexed |
//!
//! ## Queries
//!
//! All reads are equality filters over the indexed metadata, expressed as a
//! [`RecordFilter`]. "No record found" is [`PersistentError::NotFound`],
//! never folded into a backend failure, so callers such as revocation
//! checks can tell the two apart. Reads return full records.
//!
//! ## Crate Structure
//!
//! - `domain/` - filters, updates, errors
//! - `ports/` - [`PersistentStoreApi`] (inbound), [`RecordBackend`] (outbound)
//! - `adapters/` - [`InMemoryRecordBackend`]
//! - `service/` - [`PersistentStore`]
//!
//! The RocksDB backend lives with the runtime's storage adapters.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryRecordBackend;
pub use domain::{
    IdentityMatch, PersistentError, PortalQuery, RecordFilter, RecordUpdate, UniqueIndex,
};
pub use ports::inbound::PersistentStoreApi;
pub use ports::outbound::RecordBackend;
pub use service::PersistentStore;
