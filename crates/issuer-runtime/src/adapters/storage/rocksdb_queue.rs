//! Durable [`QueueBackend`] on the `queues` column family.
//!
//! ```text
//! pending:{queue}:{seq:020}   -> Task JSON   (FIFO by seq)
//! inflight:{queue}:{seq:020}  -> Task JSON   (claimed, not yet acked)
//! metadata/queue_seq          -> next seq
//! ```
//!
//! A claimed task keeps its sequence number, so recovery puts it back ahead
//! of everything enqueued after it.

use std::sync::Arc;

use async_trait::async_trait;
use shared_queue::{QueueBackend, QueueError, QueueNotifiers, Task, TaskId};
use tokio::sync::Notify;
use tracing::debug;

use super::rocksdb_adapter::{counter_op, BatchOp, Locked, RocksDbError, RocksDbStore, CF_QUEUES};

const QUEUE_SEQ: &str = "queue_seq";

fn pending_prefix(queue: &str) -> String {
    format!("pending:{queue}:")
}

fn inflight_prefix(queue: &str) -> String {
    format!("inflight:{queue}:")
}

/// Sequence suffix of a queue key.
fn seq_suffix(key: &[u8]) -> &[u8] {
    let start = key.iter().rposition(|b| *b == b':').map_or(0, |i| i + 1);
    &key[start..]
}

fn decode(raw: &[u8]) -> Result<Task, RocksDbError> {
    Ok(serde_json::from_slice(raw)?)
}

pub struct RocksDbQueueBackend {
    store: Arc<RocksDbStore>,
    notifiers: QueueNotifiers,
}

impl RocksDbQueueBackend {
    pub fn new(store: Arc<RocksDbStore>) -> Self {
        Self {
            store,
            notifiers: QueueNotifiers::new(),
        }
    }

    fn count(db: &Locked<'_>, prefix: &str) -> Result<usize, RocksDbError> {
        Ok(db.prefix_scan(CF_QUEUES, prefix.as_bytes())?.len())
    }
}

#[async_trait]
impl QueueBackend for RocksDbQueueBackend {
    async fn push(&self, task: Task) -> Result<(), QueueError> {
        let queue = task.queue.clone();
        self.store.with_write(|db| {
            let seq = db.counter(QUEUE_SEQ)?;
            let key = format!("{}{seq:020}", pending_prefix(&task.queue));
            db.commit(vec![
                BatchOp::put(CF_QUEUES, key, serde_json::to_vec(&task)?),
                counter_op(QUEUE_SEQ, seq + 1),
            ])
        })?;
        self.notifiers.notify(&queue);
        Ok(())
    }

    async fn pop(&self, queue: &str) -> Result<Option<Task>, QueueError> {
        Ok(self.store.with_write(|db| {
            let head = db
                .prefix_scan(CF_QUEUES, pending_prefix(queue).as_bytes())?
                .into_iter()
                .next();
            let Some((key, raw)) = head else {
                return Ok(None);
            };

            let mut task = decode(&raw)?;
            task.attempt += 1;
            let mut inflight_key = inflight_prefix(queue).into_bytes();
            inflight_key.extend_from_slice(seq_suffix(&key));

            db.commit(vec![
                BatchOp::delete(CF_QUEUES, key),
                BatchOp::put(CF_QUEUES, inflight_key, serde_json::to_vec(&task)?),
            ])?;
            Ok(Some(task))
        })?)
    }

    async fn ack(&self, queue: &str, id: &TaskId) -> Result<(), QueueError> {
        Ok(self.store.with_write(|db| {
            for (key, raw) in db.prefix_scan(CF_QUEUES, inflight_prefix(queue).as_bytes())? {
                if decode(&raw)?.id == *id {
                    return db.commit(vec![BatchOp::delete(CF_QUEUES, key)]);
                }
            }
            debug!(queue, task_id = %id, "[rocksdb] Ack for unknown task");
            Ok(())
        })?)
    }

    async fn recover_in_flight(&self, queue: &str) -> Result<usize, QueueError> {
        let recovered = self.store.with_write(|db| {
            let claimed = db.prefix_scan(CF_QUEUES, inflight_prefix(queue).as_bytes())?;
            let mut ops = Vec::with_capacity(claimed.len() * 2);
            for (key, raw) in &claimed {
                let mut pending_key = pending_prefix(queue).into_bytes();
                pending_key.extend_from_slice(seq_suffix(key));
                ops.push(BatchOp::delete(CF_QUEUES, key.clone()));
                ops.push(BatchOp::put(CF_QUEUES, pending_key, raw.clone()));
            }
            if !ops.is_empty() {
                db.commit(ops)?;
            }
            Ok(claimed.len())
        })?;

        if recovered > 0 {
            self.notifiers.notify(queue);
        }
        Ok(recovered)
    }

    async fn len(&self, queue: &str) -> Result<usize, QueueError> {
        Ok(self
            .store
            .with_read(|db| Self::count(db, &pending_prefix(queue)))?)
    }

    async fn in_flight(&self, queue: &str) -> Result<usize, QueueError> {
        Ok(self
            .store
            .with_read(|db| Self::count(db, &inflight_prefix(queue)))?)
    }

    fn notifier(&self, queue: &str) -> Arc<Notify> {
        self.notifiers.get(queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::RocksDbConfig;
    use tempfile::TempDir;

    fn open(temp_dir: &TempDir) -> RocksDbQueueBackend {
        let config = RocksDbConfig::for_testing(temp_dir.path().to_string_lossy().to_string());
        RocksDbQueueBackend::new(Arc::new(RocksDbStore::open(config).unwrap()))
    }

    fn task(queue: &str, payload: &str) -> Task {
        Task::new(queue, payload.to_string())
    }

    #[tokio::test]
    async fn test_fifo_and_ack() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open(&temp_dir);

        for n in 0..3 {
            backend.push(task("q", &n.to_string())).await.unwrap();
        }
        assert_eq!(backend.len("q").await.unwrap(), 3);

        let first = backend.pop("q").await.unwrap().unwrap();
        assert_eq!(first.payload, "0");
        assert_eq!(first.attempt, 1);
        assert_eq!(backend.in_flight("q").await.unwrap(), 1);

        backend.ack("q", &first.id).await.unwrap();
        assert_eq!(backend.in_flight("q").await.unwrap(), 0);
        assert_eq!(backend.pop("q").await.unwrap().unwrap().payload, "1");
    }

    #[tokio::test]
    async fn test_queues_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open(&temp_dir);

        backend.push(task("a", "x")).await.unwrap();
        assert!(backend.pop("b").await.unwrap().is_none());
        assert_eq!(backend.len("a").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unacked_tasks_return_to_head_after_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let backend = open(&temp_dir);
            for n in 0..3 {
                backend.push(task("q", &n.to_string())).await.unwrap();
            }
            backend.pop("q").await.unwrap();
            backend.pop("q").await.unwrap();
            // Process dies here without acknowledging.
        }

        let backend = open(&temp_dir);
        assert_eq!(backend.in_flight("q").await.unwrap(), 2);
        assert_eq!(backend.recover_in_flight("q").await.unwrap(), 2);
        assert_eq!(backend.len("q").await.unwrap(), 3);

        backend.push(task("q", "3")).await.unwrap();
        let mut order = Vec::new();
        while let Some(t) = backend.pop("q").await.unwrap() {
            order.push((t.payload, t.attempt));
        }
        assert_eq!(
            order,
            vec![
                ("0".to_string(), 2),
                ("1".to_string(), 2),
                ("2".to_string(), 1),
                ("3".to_string(), 1),
            ]
        );
    }
}
