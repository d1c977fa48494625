//! # Queue Worker
//!
//! One worker per queue. Each worker is a fetch task plus a dispatch loop:
//!
//! ```text
//!  ┌──────────────┐  mpsc(1)  ┌────────────────────┐
//!  │ fetch task   │──────────▶│ dispatch loop      │──▶ handler.handle()
//!  │ queue.wait() │           │ select!{shutdown,  │──▶ queue.dequeue()
//!  └──────┬───────┘           │  fetch error, task}│
//!         │ oneshot(error)    └────────────────────┘
//!         └──────────────────────────▲
//! ```
//!
//! Per task: decode, handle, acknowledge. A payload that does not decode is
//! logged and acknowledged without reaching the handler. A handler error is
//! logged and counted; the task is still acknowledged. Only a transport
//! error from `wait` stops the worker, with [`WorkerError::FetchFailed`].

use std::sync::Arc;

use async_trait::async_trait;
use shared_queue::{NamedQueue, QueueError, QueuePayload, ShutdownSignal, Task};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use vc_telemetry::{HistogramTimer, TASKS_FAILED, TASKS_PROCESSED, TASK_DURATION};

use crate::handlers::HandlerError;

/// Resolves once `shutdown` is `true` or its sender is gone.
async fn stopped(shutdown: &mut ShutdownSignal) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Downstream operation for one queue's payloads.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    type Payload: QueuePayload;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, payload: Self::Payload) -> Result<(), HandlerError>;
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// `wait` failed with a transport error; the queue is no longer consumed.
    #[error("worker for queue {queue} failed: {source}")]
    FetchFailed {
        queue: String,
        #[source]
        source: QueueError,
    },

    #[error("worker task for queue {queue} panicked or was aborted")]
    Join { queue: String },
}

pub struct Worker<H: TaskHandler> {
    queue: NamedQueue,
    handler: Arc<H>,
    shutdown: ShutdownSignal,
}

impl<H: TaskHandler> Worker<H> {
    /// Bind `handler` to `queue`. Fails when the handler's payload type does
    /// not match the queue's schema.
    pub fn new(
        queue: NamedQueue,
        handler: Arc<H>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, WorkerError> {
        queue.check_schema::<H::Payload>()?;
        Ok(Self {
            queue,
            handler,
            shutdown,
        })
    }

    /// Run until shutdown or a fetch failure.
    pub async fn run(self) -> Result<(), WorkerError> {
        let queue_name = self.queue.name().to_string();
        info!(
            queue = %queue_name,
            handler = self.handler.name(),
            "[worker] Started"
        );

        let (task_tx, mut task_rx) = mpsc::channel::<Task>(1);
        let (err_tx, mut err_rx) = oneshot::channel::<QueueError>();

        let fetch_queue = self.queue.clone();
        let mut fetch_shutdown = self.shutdown.clone();
        let fetch = tokio::spawn(async move {
            loop {
                match fetch_queue.wait(&mut fetch_shutdown).await {
                    Ok(task) => {
                        if task_tx.send(task).await.is_err() {
                            break;
                        }
                    }
                    Err(QueueError::Cancelled) => break,
                    Err(e) => {
                        let _ = err_tx.send(e);
                        break;
                    }
                }
            }
        });

        let mut shutdown = self.shutdown.clone();
        let result = loop {
            tokio::select! {
                biased;

                () = stopped(&mut shutdown) => {
                    info!(queue = %queue_name, "[worker] Shutdown signal received");
                    break Ok(());
                }
                fetch_result = &mut err_rx => {
                    match fetch_result {
                        Ok(source) => {
                            error!(queue = %queue_name, error = %source, "[worker] worker failed");
                            break Err(WorkerError::FetchFailed {
                                queue: queue_name.clone(),
                                source,
                            });
                        }
                        // Fetch ended without an error: it observed shutdown.
                        Err(_) => break Ok(()),
                    }
                }
                Some(task) = task_rx.recv() => {
                    self.process(task).await;
                }
            }
        };

        drop(task_rx);
        if fetch.await.is_err() {
            warn!(queue = %queue_name, "[worker] Fetch task did not finish cleanly");
        }
        info!(queue = %queue_name, "[worker] Stopped");
        result
    }

    async fn process(&self, task: Task) {
        let queue = self.queue.name();
        TASKS_PROCESSED.with_label_values(&[queue]).inc();

        match task.decode::<H::Payload>() {
            Err(e) => {
                warn!(
                    queue,
                    task_id = %task.id,
                    error = %e,
                    "[worker] Dropping task with undecodable payload"
                );
                TASKS_FAILED.with_label_values(&[queue, "decode"]).inc();
            }
            Ok(payload) => {
                if task.is_redelivery() {
                    info!(
                        queue,
                        task_id = %task.id,
                        attempt = task.attempt,
                        "[worker] Handling redelivered task"
                    );
                }
                let result = {
                    let _timer = HistogramTimer::new(&TASK_DURATION.with_label_values(&[queue]));
                    self.handler.handle(payload).await
                };
                match result {
                    Ok(()) => debug!(queue, task_id = %task.id, "[worker] Task handled"),
                    Err(e) => {
                        error!(
                            queue,
                            task_id = %task.id,
                            handler = self.handler.name(),
                            error = %e,
                            "[worker] Task failed"
                        );
                        TASKS_FAILED.with_label_values(&[queue, "handle"]).inc();
                    }
                }
            }
        }

        if let Err(e) = self.queue.dequeue(&task).await {
            error!(queue, task_id = %task.id, error = %e, "[worker] Failed to acknowledge task");
        }
    }
}
