//! # Shared Types Crate
//!
//! Domain entities that travel through the issuance pipeline: the
//! [`Document`] handled by the lifecycle store, the [`PersistentRecord`]
//! kept by the durable store, and the [`MetaData`] projection used by
//! delete tasks.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every queue payload is defined here.
//! - **JSON on the wire**: all entities derive `Serialize`/`Deserialize` and
//!   default missing fields, so older producers stay readable.
//! - **Unix seconds**: every timestamp is an `i64` count of seconds, `0`
//!   meaning "not set".

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
