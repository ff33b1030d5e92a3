//! Resubmission, atomicity and concurrent overlapping batches

use crate::common::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;
use tracedb::storage::FaultyStore;
use tracedb::Error;

#[test]
fn test_same_batch_twice_reports_same_count() {
    let (store, db) = memory_db();
    let batch = json!([
        record("a", "r1", "TRACE"),
        {"id": "b", "request_id": "r1", "type": "TRACE", "parent_id": "a", "start": 1.0},
        {"id": "c", "request_id": "r1", "type": "LOG", "parent_id": "a", "message": "m"}
    ]);

    let first = db.ingest(&batch).unwrap();
    let snapshot = store.list_by_request_id("r1").unwrap();
    let second = db.ingest(&batch).unwrap();

    assert_eq!(first.accepted, 3);
    assert_eq!(second.accepted, 3);
    assert_eq!(second.created, 0);
    assert_eq!(store.list_by_request_id("r1").unwrap(), snapshot);
}

#[test]
fn test_overlapping_batches_only_add_new_ids() {
    let (store, db) = memory_db();
    db.ingest(&json!([record("a", "r1", "TRACE"), record("b", "r1", "TRACE")]))
        .unwrap();
    let receipt = db
        .ingest(&json!([record("b", "r1", "TRACE"), record("c", "r1", "TRACE")]))
        .unwrap();

    assert_eq!(receipt.accepted, 2);
    assert_eq!(receipt.created, 1);
    assert_eq!(store.len().unwrap(), 3);
}

#[test]
fn test_malformed_record_persists_nothing() {
    let (store, db) = memory_db();
    let err = db
        .ingest(&json!([
            record("a", "r1", "TRACE"),
            record("b", "r1", "TRACE"),
            {"id": "c", "request_id": "r1"}
        ]))
        .unwrap_err();

    assert!(err.is_client_error());
    assert!(matches!(err, Error::InvalidRecord { index: 2, .. }));
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_storage_failure_persists_nothing() {
    let store = Arc::new(FaultyStore::new());
    let db = TraceDatabase::with_store(store.clone(), TraceDbConfig::default());
    db.ingest(&json!([record("existing", "r0", "TRACE")])).unwrap();

    store.fail_next(1);
    let err = db
        .ingest(&json!([
            record("existing", "r0", "TRACE"),
            record("a", "r1", "TRACE"),
            record("b", "r1", "TRACE")
        ]))
        .unwrap_err();

    assert!(!err.is_client_error());
    assert_eq!(store.len().unwrap(), 1);
    assert!(store.get_by_id("a").unwrap().is_none());
}

#[test]
fn test_concurrent_overlapping_batches() {
    let (store, db) = memory_db();
    let batches: Vec<Value> = (0..8)
        .map(|t| {
            // Each batch shares half its ids with the next one
            let records: Vec<Value> = (t * 10..t * 10 + 20)
                .map(|i| record(&format!("e{i}"), "r1", "TRACE"))
                .collect();
            Value::Array(records)
        })
        .collect();

    let handles: Vec<_> = batches
        .into_iter()
        .map(|batch| {
            let db = db.clone();
            thread::spawn(move || db.ingest(&batch).unwrap())
        })
        .collect();

    let created: usize = handles.into_iter().map(|h| h.join().unwrap().created).sum();
    assert_eq!(created, 90);
    assert_eq!(store.len().unwrap(), 90);
}

#[test]
fn test_first_writer_wins_across_batches() {
    let (store, db) = memory_db();
    db.ingest(&json!([{"id": "x", "request_id": "r2", "type": "LOG", "message": "hi"}]))
        .unwrap();
    db.ingest(&json!([{"id": "x", "request_id": "r2", "type": "LOG", "message": "bye",
                       "level": "ERROR"}]))
        .unwrap();

    let x = store.get_by_id("x").unwrap().unwrap();
    assert_eq!(x.message.as_deref(), Some("hi"));
    assert_eq!(x.level, None);
}
