//! Concrete ingest-then-view scenarios

use crate::common::*;
use serde_json::json;
use tracedb::{build_tree, Error, RootSelection, TraceForest};

#[test]
fn test_children_ordered_by_start() {
    let events = vec![
        TraceEvent::span("a", "r1").with_start(0.0),
        TraceEvent::span("b", "r1").with_parent("a").with_start(5.0),
        TraceEvent::span("c", "r1").with_parent("a").with_start(2.0),
    ];
    let tree = build_tree(events).unwrap();
    assert_eq!(tree.event.id, "a");
    assert_eq!(child_ids(&tree), vec!["c", "b"]);
}

#[test]
fn test_reingest_with_different_message_keeps_original() {
    let (store, db) = memory_db();
    db.ingest(&json!([{"id": "x", "request_id": "r2", "type": "LOG", "message": "hi"}]))
        .unwrap();
    db.ingest(&json!([{"id": "x", "request_id": "r2", "type": "LOG", "message": "changed"}]))
        .unwrap();
    assert_eq!(
        store.get_by_id("x").unwrap().unwrap().message.as_deref(),
        Some("hi")
    );
}

#[test]
fn test_non_array_payload_creates_nothing() {
    let (store, db) = memory_db();
    let err = db.ingest(&json!({"not": "an array"})).unwrap_err();
    assert!(matches!(err, Error::InvalidPayload(_)));
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_trace_view_from_any_event_of_request() {
    let (_, db) = memory_db();
    db.ingest(&json!([
        {"id": "root", "request_id": "req", "type": "TRACE", "name": "POST /orders",
         "start": 10.0, "status_code": 201, "timestamp": 10.0},
        {"id": "validate", "request_id": "req", "type": "TRACE", "parent_id": "root",
         "start": 10.1, "timestamp": 10.1},
        {"id": "save", "request_id": "req", "type": "TRACE", "parent_id": "root",
         "start": 10.3, "timestamp": 10.3},
        {"id": "warn", "request_id": "req", "type": "LOG", "parent_id": "save",
         "level": "WARNING", "message": "slow insert", "start": 10.4, "timestamp": 10.4}
    ]))
    .unwrap();

    for id in ["root", "validate", "save", "warn"] {
        let view = db.trace_view(id).unwrap();
        assert_eq!(view.event.id, id);
        let tree = view.tree.unwrap();
        assert_eq!(tree.event.id, "root");
        assert_eq!(child_ids(&tree), vec!["validate", "save"]);
        assert_eq!(child_ids(&tree.children[1]), vec!["warn"]);
        assert_eq!(view.summary.status_code, Some(201));
        assert_eq!(view.summary.node_count, 4);
    }
}

#[test]
fn test_request_with_orphans_and_two_roots() {
    let (_, db) = memory_db();
    db.ingest(&json!([
        {"id": "first", "request_id": "req", "type": "TRACE", "status_code": 500, "timestamp": 1.0},
        {"id": "second", "request_id": "req", "type": "TRACE", "status_code": 200, "timestamp": 2.0},
        {"id": "lost", "request_id": "req", "type": "LOG", "parent_id": "elsewhere", "timestamp": 3.0}
    ]))
    .unwrap();

    let view = db.request_view("req").unwrap();
    let tree = view.tree.unwrap();
    assert_eq!(tree.event.id, "second");
    assert_eq!(view.summary.status_code, Some(200));
    assert_eq!(view.summary.root_shape, "multiple");
    assert_eq!(view.summary.unattached, 2);

    let forest = TraceForest::build(view.events);
    assert_eq!(forest.root_selection(), RootSelection::Multiple(2));
    assert_eq!(forest.detached().len(), 1);
}

#[test]
fn test_request_without_root() {
    let (_, db) = memory_db();
    db.ingest(&json!([
        {"id": "child", "request_id": "req", "type": "TRACE", "parent_id": "never-sent"}
    ]))
    .unwrap();

    let view = db.trace_view("child").unwrap();
    assert!(view.tree.is_none());
    assert_eq!(view.summary.status_code, None);
    assert_eq!(view.summary.root_shape, "none");
}

#[test]
fn test_recent_roots_newest_first() {
    let (_, db) = memory_db();
    db.ingest(&json!([
        {"id": "old", "request_id": "r1", "type": "TRACE", "timestamp": 1.0},
        {"id": "new", "request_id": "r2", "type": "TRACE", "timestamp": 3.0},
        {"id": "child", "request_id": "r2", "type": "TRACE", "parent_id": "new", "timestamp": 4.0},
        {"id": "mid", "request_id": "r3", "type": "TRACE", "timestamp": 2.0}
    ]))
    .unwrap();

    let rows = db.recent_roots(None).unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}
