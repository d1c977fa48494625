//! # Queue Backends
//!
//! Storage side of the queues. One backend instance is shared by every
//! named queue in the process.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

use crate::errors::QueueError;
use crate::task::{Task, TaskId};

/// Durable FIFO storage for tasks, keyed by queue name.
///
/// `pop` is non-blocking; blocking consumption is built on top of it by
/// [`crate::NamedQueue::wait`] using the backend's notifiers.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Append a task to the tail of its queue.
    async fn push(&self, task: Task) -> Result<(), QueueError>;

    /// Claim the head of `queue`, moving it to the in-flight set and
    /// incrementing its `attempt`. `None` when the queue is empty.
    async fn pop(&self, queue: &str) -> Result<Option<Task>, QueueError>;

    /// Remove an in-flight task. Acknowledging an unknown id is a no-op.
    async fn ack(&self, queue: &str, id: &TaskId) -> Result<(), QueueError>;

    /// Move every in-flight task of `queue` back to its head, preserving
    /// their original order. Returns how many were moved.
    async fn recover_in_flight(&self, queue: &str) -> Result<usize, QueueError>;

    /// Number of pending (unclaimed) tasks.
    async fn len(&self, queue: &str) -> Result<usize, QueueError>;

    /// Number of claimed but unacknowledged tasks.
    async fn in_flight(&self, queue: &str) -> Result<usize, QueueError>;

    /// Wakeup handle signalled whenever `queue` receives a task.
    fn notifier(&self, queue: &str) -> Arc<Notify>;
}

/// Per-queue wakeup handles shared by backend implementations.
#[derive(Default)]
pub struct QueueNotifiers {
    inner: Mutex<HashMap<String, Arc<Notify>>>,
}

impl QueueNotifiers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for `queue`, created on first use.
    pub fn get(&self, queue: &str) -> Arc<Notify> {
        let mut map = self.inner.lock();
        Arc::clone(
            map.entry(queue.to_string())
                .or_insert_with(|| Arc::new(Notify::new())),
        )
    }

    /// Wake the consumer of `queue`.
    pub fn notify(&self, queue: &str) {
        self.get(queue).notify_one();
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Task>,
    /// Claimed tasks in claim order.
    in_flight: Vec<Task>,
}

/// In-memory backend for tests and single-process development.
///
/// Survives neither restarts nor crashes; `recover_in_flight` only matters
/// when a consumer is replaced within the same process.
pub struct InMemoryQueueBackend {
    queues: Mutex<HashMap<String, QueueState>>,
    notifiers: QueueNotifiers,
    pushed: AtomicU64,
}

impl InMemoryQueueBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            notifiers: QueueNotifiers::new(),
            pushed: AtomicU64::new(0),
        }
    }

    /// Total tasks ever pushed, across all queues.
    #[must_use]
    pub fn tasks_pushed(&self) -> u64 {
        self.pushed.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryQueueBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueBackend for InMemoryQueueBackend {
    async fn push(&self, task: Task) -> Result<(), QueueError> {
        let queue = task.queue.clone();
        {
            let mut queues = self.queues.lock();
            queues.entry(queue.clone()).or_default().pending.push_back(task);
        }
        self.pushed.fetch_add(1, Ordering::Relaxed);
        self.notifiers.notify(&queue);
        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<Task>, QueueError> {
        let mut queues = self.queues.lock();
        let Some(state) = queues.get_mut(queue) else {
            return Ok(None);
        };
        let Some(mut task) = state.pending.pop_front() else {
            return Ok(None);
        };
        task.attempt += 1;
        state.in_flight.push(task.clone());
        Ok(Some(task))
    }

    async fn ack(&self, queue: &str, id: &TaskId) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        if let Some(state) = queues.get_mut(queue) {
            state.in_flight.retain(|t| &t.id != id);
        }
        Ok(())
    }

    async fn recover_in_flight(&self, queue: &str) -> Result<usize, QueueError> {
        let recovered = {
            let mut queues = self.queues.lock();
            let Some(state) = queues.get_mut(queue) else {
                return Ok(0);
            };
            let claimed = std::mem::take(&mut state.in_flight);
            let count = claimed.len();
            for task in claimed.into_iter().rev() {
                state.pending.push_front(task);
            }
            count
        };
        if recovered > 0 {
            debug!(queue, recovered, "Recovered in-flight tasks");
            self.notifiers.notify(queue);
        }
        Ok(recovered)
    }

    async fn len(&self, queue: &str) -> Result<usize, QueueError> {
        Ok(self
            .queues
            .lock()
            .get(queue)
            .map_or(0, |s| s.pending.len()))
    }

    async fn in_flight(&self, queue: &str) -> Result<usize, QueueError> {
        Ok(self
            .queues
            .lock()
            .get(queue)
            .map_or(0, |s| s.in_flight.len()))
    }

    fn notifier(&self, queue: &str) -> Arc<Notify> {
        self.notifiers.get(queue)
    }
}
