//! # Domain Module

pub mod errors;
pub mod filter;
pub mod index;

pub use errors::PersistentError;
pub use filter::{IdentityMatch, PortalQuery, RecordFilter, RecordUpdate};
pub use index::UniqueIndex;
