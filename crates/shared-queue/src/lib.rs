//! # Shared Queue - Named Task Queues for the Issuance Pipeline
//!
//! Decouples request ingestion from signing, validation and persistence.
//! Producers enqueue JSON payloads on a named queue; one worker per queue
//! blocks on [`NamedQueue::wait`] and acknowledges with
//! [`NamedQueue::dequeue`] once the task has been handled.
//!
//! ## Delivery Model
//!
//! ```text
//!  enqueue()          wait()                  dequeue()
//! ──────────▶ pending ───────▶ in-flight ─────────────▶ (removed)
//!               ▲                  │
//!               └──────────────────┘
//!                recover_in_flight()  (on boot)
//! ```
//!
//! - **FIFO** within one queue, no ordering across queues.
//! - **At-least-once**: a task claimed by `wait` but never acknowledged
//!   (process crash) is moved back to the head of its queue by
//!   [`NamedQueue::recover_in_flight`], with `attempt` incremented.
//! - **Cancellable wait**: `wait` returns [`QueueError::Cancelled`] as soon
//!   as the shutdown signal flips, so a fetch task never outlives shutdown.
//!
//! ## Typed Payloads
//!
//! Every queue is bound to one [`PayloadSchema`] at construction.
//! [`TypedQueue<P>`] only accepts `P`, and obtaining one for a payload type
//! whose schema disagrees with the queue fails up front with
//! [`QueueError::SchemaMismatch`].

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod backend;
pub mod errors;
pub mod payload;
pub mod queue;
pub mod task;

// Re-export main types
pub use backend::{InMemoryQueueBackend, QueueBackend, QueueNotifiers};
pub use errors::QueueError;
pub use payload::{PayloadSchema, QueuePayload};
pub use queue::{NamedQueue, TypedQueue};
pub use task::{Task, TaskHandle, TaskId};

/// Shutdown signal shared by queues and workers. `true` means stop.
pub type ShutdownSignal = tokio::sync::watch::Receiver<bool>;
