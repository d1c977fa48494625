//! # Signing Client (vc-03)
//!
//! Talks to the external signing authority that holds the issuer keys.
//!
//! ## Protocol
//!
//! ```text
//! POST {url}/sign       SignRequest     -> SignReply | ErrorReply
//! POST {url}/validate   ValidateRequest -> ValidateReply | ErrorReply
//! ```
//!
//! Requests carry a bearer token when one is configured. A call is made
//! exactly once; retrying is left to whoever re-enqueues the work.
//!
//! ## Crate Structure
//!
//! - `domain/` - wire envelopes, config, errors
//! - `ports/` - [`SigningAuthority`] and its mock
//! - `adapters/` - [`HttpSigningClient`]

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::HttpSigningClient;
pub use domain::{
    ErrorReply, ReplyMeta, RequestMeta, SignReply, SignRequest, SignatureValue,
    SigningClientConfig, SigningError, UnsignedDocument, ValidateReply, ValidateRequest,
};
pub use ports::{MockSigningAuthority, SigningAuthority};
