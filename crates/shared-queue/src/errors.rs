//! # Queue Errors

use thiserror::Error;

use crate::payload::PayloadSchema;

/// Errors from queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The message could not be serialized. Caller error, never retried.
    #[error("Failed to serialize payload for queue {queue}: {reason}")]
    Serialization { queue: String, reason: String },

    /// A stored payload does not decode into the expected type.
    #[error("Failed to decode task {task_id} on queue {queue}: {reason}")]
    Decode {
        queue: String,
        task_id: String,
        reason: String,
    },

    /// Payload type and queue schema disagree.
    #[error("Queue {queue} carries {expected} payloads, got {actual}")]
    SchemaMismatch {
        queue: String,
        expected: PayloadSchema,
        actual: PayloadSchema,
    },

    /// The shutdown signal fired while waiting.
    #[error("Wait cancelled by shutdown")]
    Cancelled,

    /// The backing store failed.
    #[error("Queue backend error: {0}")]
    Backend(String),
}

impl QueueError {
    /// Transport failures are the only errors that stop a worker.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, QueueError::Backend(_))
    }
}
