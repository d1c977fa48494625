//! # Domain Module
//!
//! Wire envelopes exchanged with the signing authority.

pub mod config;
pub mod errors;
pub mod types;

pub use config::SigningClientConfig;
pub use errors::SigningError;
pub use types::*;
