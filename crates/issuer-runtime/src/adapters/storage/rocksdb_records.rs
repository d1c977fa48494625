//! Durable [`RecordBackend`] on the `records` column family.
//!
//! ```text
//! rec:{seq:020}           -> PersistentRecord JSON (insertion order)
//! idx:{index}:{value}     -> seq of the owning record
//! metadata/record_seq     -> next seq
//! ```
//!
//! Queries scan `rec:` and apply the filter in process; the unique indexes
//! are point lookups.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::PersistentRecord;
use vc_02_persistent_store::{
    PersistentError, RecordBackend, RecordFilter, RecordUpdate, UniqueIndex,
};

use super::rocksdb_adapter::{
    counter_op, BatchOp, Locked, RocksDbError, RocksDbStore, CF_RECORDS,
};

const RECORD_SEQ: &str = "record_seq";
const RECORD_PREFIX: &str = "rec:";

fn index_key(index: UniqueIndex, value: &str) -> String {
    format!("idx:{}:{value}", index.name())
}

type Stored = (Vec<u8>, PersistentRecord);

pub struct RocksDbRecordBackend {
    store: Arc<RocksDbStore>,
}

impl RocksDbRecordBackend {
    pub fn new(store: Arc<RocksDbStore>) -> Self {
        Self { store }
    }

    fn matching(db: &Locked<'_>, filter: &RecordFilter) -> Result<Vec<Stored>, RocksDbError> {
        let mut found = Vec::new();
        for (key, raw) in db.prefix_scan(CF_RECORDS, RECORD_PREFIX.as_bytes())? {
            let record: PersistentRecord = serde_json::from_slice(&raw)?;
            if filter.matches(&record) {
                found.push((key, record));
            }
        }
        Ok(found)
    }

    /// First unique index `record` would clash on, ignoring the record at
    /// key `except`.
    fn clash(
        db: &Locked<'_>,
        record: &PersistentRecord,
        except: Option<&[u8]>,
    ) -> Result<Option<PersistentError>, RocksDbError> {
        for index in UniqueIndex::ALL {
            let Some(value) = index.value(record) else {
                continue;
            };
            match db.get(CF_RECORDS, index_key(index, value).as_bytes())? {
                Some(owner) if Some(owner.as_slice()) != except => {
                    return Ok(Some(PersistentError::Duplicate {
                        index: index.name(),
                        value: value.to_string(),
                    }));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn link(key: &[u8], record: &PersistentRecord, ops: &mut Vec<BatchOp>) {
        for index in UniqueIndex::ALL {
            if let Some(value) = index.value(record) {
                ops.push(BatchOp::put(CF_RECORDS, index_key(index, value), key.to_vec()));
            }
        }
    }

    fn unlink(record: &PersistentRecord, ops: &mut Vec<BatchOp>) {
        for index in UniqueIndex::ALL {
            if let Some(value) = index.value(record) {
                ops.push(BatchOp::delete(CF_RECORDS, index_key(index, value)));
            }
        }
    }
}

#[async_trait]
impl RecordBackend for RocksDbRecordBackend {
    async fn insert(&self, record: PersistentRecord) -> Result<(), PersistentError> {
        self.store.with_write(|db| {
            if let Some(err) = Self::clash(db, &record, None)? {
                return Ok(Err(err));
            }
            let seq = db.counter(RECORD_SEQ)?;
            let key = format!("{RECORD_PREFIX}{seq:020}").into_bytes();

            let mut ops = vec![
                BatchOp::put(CF_RECORDS, key.clone(), serde_json::to_vec(&record)?),
                counter_op(RECORD_SEQ, seq + 1),
            ];
            Self::link(&key, &record, &mut ops);
            db.commit(ops)?;
            Ok(Ok(()))
        })?
    }

    async fn replace_one(
        &self,
        filter: &RecordFilter,
        record: PersistentRecord,
    ) -> Result<bool, PersistentError> {
        self.store.with_write(|db| {
            let Some((key, old)) = Self::matching(db, filter)?.into_iter().next() else {
                return Ok(Ok(false));
            };
            if let Some(err) = Self::clash(db, &record, Some(key.as_slice()))? {
                return Ok(Err(err));
            }

            let mut ops = Vec::new();
            Self::unlink(&old, &mut ops);
            Self::link(&key, &record, &mut ops);
            ops.push(BatchOp::put(CF_RECORDS, key, serde_json::to_vec(&record)?));
            db.commit(ops)?;
            Ok(Ok(true))
        })?
    }

    async fn delete_many(&self, filter: &RecordFilter) -> Result<usize, PersistentError> {
        Ok(self.store.with_write(|db| {
            let found = Self::matching(db, filter)?;
            let mut ops = Vec::new();
            for (key, record) in &found {
                Self::unlink(record, &mut ops);
                ops.push(BatchOp::delete(CF_RECORDS, key.clone()));
            }
            if !ops.is_empty() {
                db.commit(ops)?;
            }
            Ok(found.len())
        })?)
    }

    async fn find(
        &self,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<PersistentRecord>, PersistentError> {
        Ok(self.store.with_read(|db| {
            Ok(Self::matching(db, filter)?
                .into_iter()
                .map(|(_, record)| record)
                .take(limit.unwrap_or(usize::MAX))
                .collect())
        })?)
    }

    async fn update_many(
        &self,
        filter: &RecordFilter,
        update: &RecordUpdate,
    ) -> Result<usize, PersistentError> {
        Ok(self.store.with_write(|db| {
            let mut ops = Vec::new();
            for (key, mut record) in Self::matching(db, filter)? {
                if update.apply(&mut record) {
                    ops.push(BatchOp::put(CF_RECORDS, key, serde_json::to_vec(&record)?));
                }
            }
            let changed = ops.len();
            if changed > 0 {
                db.commit(ops)?;
            }
            Ok(changed)
        })?)
    }

    async fn ping(&self) -> Result<(), PersistentError> {
        self.store.with_read(|db| db.counter(RECORD_SEQ))?;
        Ok(())
    }
}
