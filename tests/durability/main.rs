//! Integration tests for the batch log.
//!
//! These exercise the open → ingest → close → reopen lifecycle through
//! `TraceDatabase`, including a log whose tail was cut off mid-record.

#[path = "../common/mod.rs"]
mod common;

use common::*;
use serde_json::json;
use std::fs::{self, OpenOptions};
use tracedb::storage::LOG_FILE_NAME;
use tracedb::{ErrorKind, MAX_RECORD_DEPTH};

#[test]
fn test_reopen_preserves_views() {
    let mut t = TestDb::new();
    t.db.ingest(&json!([
        {"id": "a", "request_id": "r1", "type": "TRACE", "start": 0.0, "status_code": 200,
         "timestamp": 1.0},
        {"id": "b", "request_id": "r1", "type": "TRACE", "parent_id": "a", "start": 5.0,
         "timestamp": 2.0},
        {"id": "c", "request_id": "r1", "type": "TRACE", "parent_id": "a", "start": 2.0,
         "timestamp": 3.0}
    ]))
    .unwrap();
    let before = t.db.request_view("r1").unwrap();

    t.reopen();
    let after = t.db.request_view("r1").unwrap();
    assert_eq!(ids(&after.events), ids(&before.events));
    assert_eq!(child_ids(after.tree.as_ref().unwrap()), vec!["c", "b"]);
    assert_eq!(after.summary, before.summary);
}

#[test]
fn test_create_only_survives_reopen() {
    let mut t = TestDb::new();
    t.db.ingest(&json!([{"id": "x", "request_id": "r2", "type": "LOG", "message": "hi"}]))
        .unwrap();
    t.db.ingest(&json!([{"id": "x", "request_id": "r2", "type": "LOG", "message": "other"}]))
        .unwrap();

    t.reopen();
    let view = t.db.trace_view("x").unwrap();
    assert_eq!(view.event.message.as_deref(), Some("hi"));
    assert_eq!(t.db.len().unwrap(), 1);
}

#[test]
fn test_torn_last_batch_is_dropped_whole() {
    let mut t = TestDb::new();
    t.db.ingest(&json!([record("a", "r1", "TRACE")])).unwrap();
    t.db.ingest(&json!([
        record("b", "r2", "TRACE"),
        record("c", "r2", "TRACE")
    ]))
    .unwrap();

    let path = t.dir.path().join(LOG_FILE_NAME);
    let len = fs::metadata(&path).unwrap().len();
    let file = OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(len - 3).unwrap();
    drop(file);

    t.reopen();
    assert!(t.db.trace_view("a").is_ok());
    assert!(t.db.trace_view("b").is_err());
    assert!(t.db.trace_view("c").is_err());

    // The dropped batch can be resent
    let receipt = t
        .db
        .ingest(&json!([
            record("b", "r2", "TRACE"),
            record("c", "r2", "TRACE")
        ]))
        .unwrap();
    assert_eq!(receipt.created, 2);
    t.reopen();
    assert_eq!(t.db.len().unwrap(), 3);
}

#[test]
fn test_standard_mode_roundtrip() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = TraceDbConfig {
        data_dir: Some(dir.path().to_path_buf()),
        durability: "standard".to_string(),
        ..TraceDbConfig::default()
    };
    {
        let db = TraceDatabase::open(config.clone()).unwrap();
        db.ingest(&json!([record("a", "r1", "TRACE")])).unwrap();
    }
    let db = TraceDatabase::open(config).unwrap();
    assert_eq!(db.len().unwrap(), 1);
}

/// Batch body with one record whose `args` nests `levels` arrays deep
fn nested_body(id: &str, levels: usize) -> Vec<u8> {
    format!(
        r#"[{{"id":"{id}","request_id":"deep","type":"TRACE","args":{}1{}}}]"#,
        "[".repeat(levels),
        "]".repeat(levels)
    )
    .into_bytes()
}

#[test]
fn test_deepest_accepted_record_survives_reopen() {
    let mut t = TestDb::new();

    // The record object itself is one level
    let receipt = t.db.ingest_bytes(&nested_body("deep", MAX_RECORD_DEPTH - 1)).unwrap();
    assert_eq!(receipt.created, 1);
    t.db.ingest(&json!([record("later", "r2", "LOG")])).unwrap();

    t.reopen();
    assert_eq!(t.db.len().unwrap(), 2);
    let deep = t.db.trace_view("deep").unwrap();
    assert_eq!(deep.event.args.as_ref().map(Vec::len), Some(1));
    assert!(t.db.trace_view("later").is_ok());
}

#[test]
fn test_overly_nested_record_is_rejected_before_logging() {
    let mut t = TestDb::new();
    let err = t.db.ingest_bytes(&nested_body("deep", 125)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Client);
    t.db.ingest(&json!([record("later", "r2", "LOG")])).unwrap();

    t.reopen();
    assert_eq!(t.db.len().unwrap(), 1);
    assert!(t.db.trace_view("later").is_ok());
}

#[test]
fn test_unreadable_record_fails_open_without_truncating() {
    let t = TestDb::new();
    t.db.ingest(&json!([record("a", "r1", "TRACE")])).unwrap();
    t.db.ingest(&json!([record("b", "r1", "TRACE")])).unwrap();
    let path = t.dir.path().join(LOG_FILE_NAME);
    drop(t.db);

    // Rewrite the first payload in place so its checksum still matches
    let mut bytes = fs::read(&path).unwrap();
    let total = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let (start, end) = (5, total);
    let broken = String::from_utf8(bytes[start..end].to_vec())
        .unwrap()
        .replace("\"events\"", "\"evxnts\"");
    assert_eq!(broken.len(), end - start);
    bytes.splice(start..end, broken.into_bytes());
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&bytes[4..end]);
    bytes[end..end + 4].copy_from_slice(&hasher.finalize().to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    let err = TraceDatabase::open(always_config(t.dir.path())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(fs::read(&path).unwrap(), bytes);
}
