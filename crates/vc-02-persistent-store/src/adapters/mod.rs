//! # Adapters Module
//!
//! - `memory`: in-process record backend for tests and single-node runs

pub mod memory;

pub use memory::InMemoryRecordBackend;
