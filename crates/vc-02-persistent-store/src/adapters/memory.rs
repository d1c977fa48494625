//! In-memory record backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::PersistentRecord;

use crate::domain::{PersistentError, RecordFilter, RecordUpdate, UniqueIndex};
use crate::ports::outbound::RecordBackend;

#[derive(Default)]
struct Collection {
    /// Keyed by insertion sequence so iteration follows insertion order.
    records: BTreeMap<u64, PersistentRecord>,
    index: HashMap<(UniqueIndex, String), u64>,
    next_id: u64,
}

impl Collection {
    /// First index `record` would clash on, ignoring the slot `except`.
    fn clash(&self, record: &PersistentRecord, except: Option<u64>) -> Option<PersistentError> {
        UniqueIndex::ALL.iter().find_map(|idx| {
            let value = idx.value(record)?;
            match self.index.get(&(*idx, value.to_string())) {
                Some(id) if Some(*id) != except => Some(PersistentError::Duplicate {
                    index: idx.name(),
                    value: value.to_string(),
                }),
                _ => None,
            }
        })
    }

    fn link(&mut self, id: u64, record: &PersistentRecord) {
        for idx in UniqueIndex::ALL {
            if let Some(value) = idx.value(record) {
                self.index.insert((idx, value.to_string()), id);
            }
        }
    }

    fn unlink(&mut self, record: &PersistentRecord) {
        for idx in UniqueIndex::ALL {
            if let Some(value) = idx.value(record) {
                self.index.remove(&(idx, value.to_string()));
            }
        }
    }

    fn matching(&self, filter: &RecordFilter) -> Vec<u64> {
        self.records
            .iter()
            .filter(|(_, r)| filter.matches(r))
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Record collection held in process memory.
#[derive(Default)]
pub struct InMemoryRecordBackend {
    inner: RwLock<Collection>,
}

impl InMemoryRecordBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordBackend for InMemoryRecordBackend {
    async fn insert(&self, record: PersistentRecord) -> Result<(), PersistentError> {
        let mut inner = self.inner.write();
        if let Some(err) = inner.clash(&record, None) {
            return Err(err);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.link(id, &record);
        inner.records.insert(id, record);
        Ok(())
    }

    async fn replace_one(
        &self,
        filter: &RecordFilter,
        record: PersistentRecord,
    ) -> Result<bool, PersistentError> {
        let mut inner = self.inner.write();
        let Some(id) = inner.matching(filter).first().copied() else {
            return Ok(false);
        };
        if let Some(err) = inner.clash(&record, Some(id)) {
            return Err(err);
        }
        if let Some(old) = inner.records.remove(&id) {
            inner.unlink(&old);
        }
        inner.link(id, &record);
        inner.records.insert(id, record);
        Ok(true)
    }

    async fn delete_many(&self, filter: &RecordFilter) -> Result<usize, PersistentError> {
        let mut inner = self.inner.write();
        let ids = inner.matching(filter);
        for id in &ids {
            if let Some(old) = inner.records.remove(id) {
                inner.unlink(&old);
            }
        }
        Ok(ids.len())
    }

    async fn find(
        &self,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<PersistentRecord>, PersistentError> {
        let inner = self.inner.read();
        Ok(inner
            .records
            .values()
            .filter(|r| filter.matches(r))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn update_many(
        &self,
        filter: &RecordFilter,
        update: &RecordUpdate,
    ) -> Result<usize, PersistentError> {
        let mut inner = self.inner.write();
        let changed = inner
            .records
            .values_mut()
            .filter(|r| filter.matches(r))
            .map(|r| update.apply(r))
            .filter(|changed| *changed)
            .count();
        Ok(changed)
    }

    async fn ping(&self) -> Result<(), PersistentError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tx: &str, doc: &str) -> PersistentRecord {
        let mut r = PersistentRecord {
            transaction_id: tx.into(),
            ..Default::default()
        };
        r.meta.authentic_source = "SUNET".into();
        r.meta.document_id = doc.into();
        r
    }

    #[tokio::test]
    async fn test_unique_transaction_id() {
        let backend = InMemoryRecordBackend::new();
        backend.insert(record("t1", "d1")).await.unwrap();

        let err = backend.insert(record("t1", "d2")).await.unwrap_err();
        assert!(matches!(
            err,
            PersistentError::Duplicate { index: "transaction_id", .. }
        ));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_unique_document_id() {
        let backend = InMemoryRecordBackend::new();
        backend.insert(record("t1", "d1")).await.unwrap();

        let err = backend.insert(record("t2", "d1")).await.unwrap_err();
        assert!(matches!(
            err,
            PersistentError::Duplicate { index: "document_id", .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_document_ids_do_not_clash() {
        let backend = InMemoryRecordBackend::new();
        backend.insert(record("t1", "")).await.unwrap();
        backend.insert(record("t2", "")).await.unwrap();
        assert_eq!(backend.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_frees_index_slot() {
        let backend = InMemoryRecordBackend::new();
        backend.insert(record("t1", "d1")).await.unwrap();

        let removed = backend
            .delete_many(&RecordFilter::new().document_id("d1"))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        backend.insert(record("t1", "d1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_keeps_position_and_reindexes() {
        let backend = InMemoryRecordBackend::new();
        backend.insert(record("t1", "d1")).await.unwrap();
        backend.insert(record("t2", "d2")).await.unwrap();

        let replaced = backend
            .replace_one(&RecordFilter::new().document_id("d1"), record("t9", "d1"))
            .await
            .unwrap();
        assert!(replaced);

        let all = backend.find(&RecordFilter::new(), None).await.unwrap();
        assert_eq!(all[0].transaction_id, "t9");
        assert_eq!(all[1].transaction_id, "t2");

        // old transaction id is free again
        backend.insert(record("t1", "d3")).await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_rejects_clash_with_other_record() {
        let backend = InMemoryRecordBackend::new();
        backend.insert(record("t1", "d1")).await.unwrap();
        backend.insert(record("t2", "d2")).await.unwrap();

        let result = backend
            .replace_one(&RecordFilter::new().document_id("d1"), record("t2", "d1"))
            .await;
        assert!(matches!(result, Err(PersistentError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_find_limit() {
        let backend = InMemoryRecordBackend::new();
        for i in 0..5 {
            backend
                .insert(record(&format!("t{i}"), &format!("d{i}")))
                .await
                .unwrap();
        }
        let found = backend.find(&RecordFilter::new(), Some(2)).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].transaction_id, "t0");
    }
}
