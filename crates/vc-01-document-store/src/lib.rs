//! # Document Store (vc-01)
//!
//! Holds documents keyed by `(transaction_id, bucket)` in a fast key-value
//! cache, with explicit TTL and revocation semantics. Workers are the main
//! caller but any component may read through [`DocumentLifecycle`].
//!
//! ## Lifecycle
//!
//! ```text
//! save_unsigned ──▶ doc:<id>:unsigned ─┐
//!                                      │  (worker signs)
//! save_signed ────▶ doc:<id>:signed  ◀─┘   del_unsigned cleans up
//!                        │
//! save_revoked ───▶ doc:<id>:revoked  (timestamp only, overrides reads)
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Transaction id required | Every save rejects an empty id |
//! | Signed data required | `save_signed` rejects empty data, no write |
//! | Buckets independent | Writing `signed` never touches `unsigned` |
//! | Explicit TTL | Expiry only starts on `add_ttl_*` |
//! | Revocation override | A revoked id is unreadable in every bucket |
//!
//! ## Revocation Policy
//!
//! [`RevocationPolicy`] decides what a get does when the revocation check
//! itself fails: `FailClosed` (default) surfaces the error, `FailOpen`
//! logs it and reads the bucket as if the id were not revoked.
//!
//! ## Crate Structure
//!
//! - `domain/` - buckets, field codec, config, errors
//! - `ports/` - [`DocumentLifecycle`] (inbound), [`KeyValueCache`] and
//!   [`TimeSource`] (outbound) with in-memory adapters
//! - `service/` - [`DocumentStore`], the application service

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{Bucket, CacheError, DocumentError, DocumentStoreConfig, RevocationPolicy};
pub use ports::inbound::DocumentLifecycle;
pub use ports::outbound::{
    CacheFields, InMemoryCache, KeyValueCache, MockTimeSource, SystemTimeSource, TimeSource,
};
pub use service::DocumentStore;
