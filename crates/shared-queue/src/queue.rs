//! # Named Queues
//!
//! The producer/consumer handle over a shared [`QueueBackend`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::QueueBackend;
use crate::errors::QueueError;
use crate::payload::{PayloadSchema, QueuePayload};
use crate::task::{Task, TaskHandle};
use crate::ShutdownSignal;

/// Handle to one named queue.
///
/// Cheap to clone; all clones share the backend connection.
#[derive(Clone)]
pub struct NamedQueue {
    name: String,
    schema: PayloadSchema,
    backend: Arc<dyn QueueBackend>,
}

impl fmt::Debug for NamedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedQueue")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl NamedQueue {
    /// Bind `name` to `schema` on `backend`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        schema: PayloadSchema,
        backend: Arc<dyn QueueBackend>,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            backend,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> PayloadSchema {
        self.schema
    }

    /// Fails unless `P` is the payload type this queue carries.
    pub fn check_schema<P: QueuePayload>(&self) -> Result<(), QueueError> {
        if P::SCHEMA != self.schema {
            return Err(QueueError::SchemaMismatch {
                queue: self.name.clone(),
                expected: self.schema,
                actual: P::SCHEMA,
            });
        }
        Ok(())
    }

    /// Typed producer/consumer view of this queue.
    pub fn typed<P: QueuePayload>(&self) -> Result<TypedQueue<P>, QueueError> {
        self.check_schema::<P>()?;
        Ok(TypedQueue {
            inner: self.clone(),
            _payload: PhantomData,
        })
    }

    /// Serialize `message` and append it to the queue.
    pub async fn enqueue<P: QueuePayload>(&self, message: &P) -> Result<TaskHandle, QueueError> {
        self.check_schema::<P>()?;
        let payload = serde_json::to_string(message).map_err(|e| QueueError::Serialization {
            queue: self.name.clone(),
            reason: e.to_string(),
        })?;
        self.push_raw(payload).await
    }

    /// Append an already-serialized payload. No schema check.
    pub async fn push_raw(&self, payload: String) -> Result<TaskHandle, QueueError> {
        let task = Task::new(self.name.clone(), payload);
        let handle = task.handle();
        self.backend.push(task).await?;
        debug!(queue = %self.name, task_id = %handle.id, "Task enqueued");
        Ok(handle)
    }

    /// Block until a task is available or `shutdown` turns `true`.
    ///
    /// The returned task is in flight until [`NamedQueue::dequeue`] is
    /// called with it.
    pub async fn wait(&self, shutdown: &mut ShutdownSignal) -> Result<Task, QueueError> {
        let notify = self.backend.notifier(&self.name);
        loop {
            if *shutdown.borrow() {
                return Err(QueueError::Cancelled);
            }

            // Register interest before polling so a push between the poll
            // and the select is not missed.
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(task) = self.backend.pop(&self.name).await? {
                return Ok(task);
            }

            tokio::select! {
                _ = &mut notified => {}
                () = async {
                    let _ = shutdown.wait_for(|stop| *stop).await;
                } => {
                    return Err(QueueError::Cancelled);
                }
            }
        }
    }

    /// Acknowledge `task`, removing it from the in-flight set.
    pub async fn dequeue(&self, task: &Task) -> Result<(), QueueError> {
        if task.queue != self.name {
            warn!(
                queue = %self.name,
                task_queue = %task.queue,
                task_id = %task.id,
                "Acknowledging task from another queue"
            );
        }
        self.backend.ack(&self.name, &task.id).await
    }

    /// Requeue tasks claimed by a previous consumer that never acknowledged.
    pub async fn recover_in_flight(&self) -> Result<usize, QueueError> {
        self.backend.recover_in_flight(&self.name).await
    }

    pub async fn len(&self) -> Result<usize, QueueError> {
        self.backend.len(&self.name).await
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }

    pub async fn in_flight(&self) -> Result<usize, QueueError> {
        self.backend.in_flight(&self.name).await
    }
}

/// A queue handle that only accepts and yields `P`.
pub struct TypedQueue<P> {
    inner: NamedQueue,
    _payload: PhantomData<fn() -> P>,
}

impl<P> Clone for TypedQueue<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _payload: PhantomData,
        }
    }
}

impl<P: QueuePayload> fmt::Debug for TypedQueue<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedQueue")
            .field("name", &self.inner.name)
            .field("payload", &P::SCHEMA)
            .finish()
    }
}

impl<P: QueuePayload> TypedQueue<P> {
    pub async fn enqueue(&self, message: &P) -> Result<TaskHandle, QueueError> {
        self.inner.enqueue(message).await
    }

    /// Wait for the next task and decode it. The raw task is returned for
    /// acknowledgement.
    ///
    /// A task that fails to decode is acknowledged before the error is
    /// returned; it would fail the same way on every redelivery.
    pub async fn wait(&self, shutdown: &mut ShutdownSignal) -> Result<(Task, P), QueueError> {
        let task = self.inner.wait(shutdown).await?;
        match task.decode() {
            Ok(payload) => Ok((task, payload)),
            Err(e) => {
                warn!(queue = %self.inner.name, task_id = %task.id, "Dropping undecodable task");
                self.inner.dequeue(&task).await?;
                Err(e)
            }
        }
    }

    pub async fn dequeue(&self, task: &Task) -> Result<(), QueueError> {
        self.inner.dequeue(task).await
    }

    #[must_use]
    pub fn untyped(&self) -> &NamedQueue {
        &self.inner
    }
}
