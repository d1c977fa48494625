//! # Domain Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SigningError {
    /// Connection, timeout or body transfer failed.
    #[error("signing authority unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The authority answered with a non-success status.
    #[error("signing authority rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("failed to parse signing reply: {0}")]
    Parse(String),

    /// The reply did not contain a signature for this document.
    #[error("no signature returned for {id}")]
    MissingSignature { id: String },

    #[error("invalid signing client configuration: {0}")]
    Config(String),
}
