//! # Tasks
//!
//! The unit of queue transport.

use serde::{Deserialize, Serialize};
use shared_types::{now_unix, UnixSeconds};
use uuid::Uuid;

use crate::errors::QueueError;
use crate::payload::QueuePayload;

/// Unique task identifier.
pub type TaskId = Uuid;

/// One enqueued unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Name of the queue the task was enqueued on.
    pub queue: String,
    /// JSON-serialized payload.
    pub payload: String,
    pub enqueued_at: UnixSeconds,
    /// Delivery count. Greater than 1 after crash recovery.
    pub attempt: u32,
}

impl Task {
    /// Create a fresh task with a random id.
    #[must_use]
    pub fn new(queue: impl Into<String>, payload: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue: queue.into(),
            payload,
            enqueued_at: now_unix(),
            attempt: 0,
        }
    }

    #[must_use]
    pub fn handle(&self) -> TaskHandle {
        TaskHandle {
            id: self.id,
            queue: self.queue.clone(),
        }
    }

    /// Decode the payload into the queue's payload type.
    pub fn decode<P: QueuePayload>(&self) -> Result<P, QueueError> {
        serde_json::from_str(&self.payload).map_err(|e| QueueError::Decode {
            queue: self.queue.clone(),
            task_id: self.id.to_string(),
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn is_redelivery(&self) -> bool {
        self.attempt > 1
    }
}

/// Identifies a stored task. Returned by `enqueue`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: TaskId,
    pub queue: String,
}
