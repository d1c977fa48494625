use serde_json::json;
use shared_types::{Document, EntityError, MetaData, Revocation};

use super::*;
use crate::adapters::InMemoryRecordBackend;

fn store() -> PersistentStore {
    PersistentStore::new(Arc::new(InMemoryRecordBackend::new()))
}

fn saga() -> Identity {
    Identity {
        version: "1.0.0".into(),
        family_name: "Castor".into(),
        given_name: "Saga".into(),
        birth_date: "1990-01-01".into(),
        ..Default::default()
    }
}

fn record(tx: &str, doc_id: &str) -> PersistentRecord {
    PersistentRecord {
        transaction_id: tx.into(),
        meta: MetaData {
            authentic_source: "SUNET".into(),
            authentic_source_person_id: "p-1".into(),
            document_type: "PDA1".into(),
            document_id: doc_id.into(),
            collect_id: format!("collect-{doc_id}"),
            revocation: Some(Revocation {
                id: format!("rev-{doc_id}"),
                ..Default::default()
            }),
            valid_from: 1_000,
            valid_to: 2_000,
            ..Default::default()
        },
        identities: vec![saga()],
        document_data: json!({"social_security_pin": "12345"}),
        owner_id: "owner-1".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_save_then_get_by_transaction_id() {
    let store = store();
    let doc = Document::new("abc", "");
    store.save(&PersistentRecord::from(&doc)).await.unwrap();

    let got = store.get("abc").await.unwrap();
    assert_eq!(got.transaction_id, "abc");
}

#[tokio::test]
async fn test_save_requires_an_identifier() {
    let store = store();
    let err = store.save(&PersistentRecord::default()).await.unwrap_err();
    assert!(matches!(err, PersistentError::Invalid(_)));
}

#[tokio::test]
async fn test_duplicate_document_id_rejected() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();
    let err = store.save(&record("t2", "d1")).await.unwrap_err();
    assert!(matches!(err, PersistentError::Duplicate { .. }));
}

#[tokio::test]
async fn test_missing_record_is_not_found() {
    let store = store();
    let err = store.get("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_replace_by_document_id() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();

    let mut updated = record("t1", "d1");
    updated.document_data = json!({"version": 2});
    store.replace(&updated).await.unwrap();

    let got = store.get_document("SUNET", "PDA1", "d1").await.unwrap();
    assert_eq!(got.document_data, json!({"version": 2}));
}

#[tokio::test]
async fn test_replace_without_match_is_not_found() {
    let store = store();
    let err = store.replace(&record("t1", "d1")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_replace_by_transaction_id_when_no_document_id() {
    let store = store();
    store.save(&record("t1", "")).await.unwrap();

    let mut updated = record("t1", "");
    updated.data = "signed".into();
    store.replace(&updated).await.unwrap();
    assert_eq!(store.get("t1").await.unwrap().data, "signed");
}

#[tokio::test]
async fn test_delete_by_metadata() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();
    store.save(&record("t2", "d2")).await.unwrap();

    let meta = MetaData {
        authentic_source: "SUNET".into(),
        document_id: "d1".into(),
        ..Default::default()
    };
    let removed = store.delete(&RecordFilter::for_document(&meta)).await.unwrap();
    assert_eq!(removed, 1);
    assert!(store.get("t1").await.unwrap_err().is_not_found());
    assert!(store.get("t2").await.is_ok());

    // Nothing left to delete is not an error.
    assert_eq!(store.delete(&RecordFilter::for_document(&meta)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_document_matches_full_key() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();
    store.save(&record("t2", "d2")).await.unwrap();

    let mut meta = record("t1", "d1").meta;
    meta.document_type = "EHIC".into();
    assert!(!store.delete_document(&meta).await.unwrap());

    meta.document_type = "PDA1".into();
    assert!(store.delete_document(&meta).await.unwrap());
    assert!(store.get("t1").await.unwrap_err().is_not_found());
    assert!(store.get("t2").await.is_ok());
}

#[tokio::test]
async fn test_delete_document_needs_source_and_id() {
    let store = store();
    store
        .save(&PersistentRecord::from(&Document::new("t1", "")))
        .await
        .unwrap();

    for meta in [
        MetaData::default(),
        MetaData {
            authentic_source: "SUNET".into(),
            ..Default::default()
        },
        MetaData {
            document_id: "d1".into(),
            ..Default::default()
        },
    ] {
        assert!(matches!(
            store.delete_document(&meta).await,
            Err(PersistentError::Invalid(EntityError::IncompleteDocumentKey))
        ));
    }
    assert!(store.get("t1").await.is_ok());
}

#[tokio::test]
async fn test_get_document_collect_id_requires_birth_date() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();

    let found = store
        .get_document_collect_id("SUNET", "collect-d1", "PDA1", &saga())
        .await
        .unwrap();
    assert_eq!(found.transaction_id, "t1");

    let mut other = saga();
    other.birth_date = "1991-02-02".into();
    let err = store
        .get_document_collect_id("SUNET", "collect-d1", "PDA1", &other)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_by_revocation_id() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();

    let found = store
        .get_by_revocation_id("SUNET", "PDA1", "rev-d1")
        .await
        .unwrap();
    assert_eq!(found.meta.document_id, "d1");
}

#[tokio::test]
async fn test_portal_data_filters_by_window() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();
    let mut late = record("t2", "d2");
    late.meta.valid_from = 5_000;
    late.meta.valid_to = 6_000;
    store.save(&late).await.unwrap();

    let mut query = PortalQuery {
        authentic_source: "SUNET".into(),
        authentic_source_person_id: "p-1".into(),
        ..Default::default()
    };
    assert_eq!(store.portal_data(&query).await.unwrap().len(), 2);

    query.valid_to = Some(2_000);
    let hits = store.portal_data(&query).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].transaction_id, "t1");

    query.authentic_source_person_id = "p-2".into();
    assert!(store.portal_data(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_id_mapping_ignores_birth_date() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();

    let mut query = saga();
    query.birth_date.clear();
    assert_eq!(store.id_mapping("SUNET", &query).await.unwrap(), "p-1");

    query.given_name = "Someone".into();
    assert!(store.id_mapping("SUNET", &query).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_revoke_and_is_revoked() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();
    assert!(!store.is_revoked("t1").await.unwrap());

    store.revoke("t1").await.unwrap();
    assert!(store.is_revoked("t1").await.unwrap());
    // Repeat revocation is accepted.
    store.revoke("t1").await.unwrap();

    assert!(store.revoke("missing").await.unwrap_err().is_not_found());
    assert!(store.is_revoked("missing").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_revoke_by_owner() {
    let store = store();
    store.save(&record("t1", "d1")).await.unwrap();
    store.save(&record("t2", "d2")).await.unwrap();
    let mut foreign = record("t3", "d3");
    foreign.owner_id = "owner-2".into();
    store.save(&foreign).await.unwrap();

    assert_eq!(store.revoke_by_owner("owner-1").await.unwrap(), 2);
    assert!(!store.is_revoked("t3").await.unwrap());
}

#[tokio::test]
async fn test_search_with_limit_and_status() {
    let store = store();
    for i in 0..3 {
        store
            .save(&record(&format!("t{i}"), &format!("d{i}")))
            .await
            .unwrap();
    }
    let hits = store
        .search(&RecordFilter::new().document_type("PDA1"), Some(2))
        .await
        .unwrap();
    assert_eq!(hits.len(), 2);
    store.status().await.unwrap();
}
