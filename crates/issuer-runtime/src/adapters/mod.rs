//! # Adapter Implementations
//!
//! Concrete implementations of the outbound ports of the document store
//! (`KeyValueCache`), the persistent store (`RecordBackend`) and the queues
//! (`QueueBackend`).

pub mod storage;

pub use storage::*;
