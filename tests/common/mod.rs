//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
pub use tracedb::{
    EventStore, MemoryStore, TraceDatabase, TraceDbConfig, TraceEvent, TraceTree,
};

/// Config with a batch log in `dir` and fsync on every batch
pub fn always_config(dir: &Path) -> TraceDbConfig {
    TraceDbConfig {
        data_dir: Some(dir.to_path_buf()),
        durability: "always".to_string(),
        ..TraceDbConfig::default()
    }
}

/// Durable database in a fresh temp dir
pub struct TestDb {
    pub db: TraceDatabase,
    pub dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let db = TraceDatabase::open(always_config(dir.path())).expect("open");
        Self { db, dir }
    }

    /// Drop the current handle and open the same directory again
    pub fn reopen(&mut self) {
        self.db = TraceDatabase::open(always_config(self.dir.path())).expect("reopen");
    }
}

/// In-memory database sharing its store with the caller
pub fn memory_db() -> (Arc<MemoryStore>, TraceDatabase) {
    let store = Arc::new(MemoryStore::new());
    let db = TraceDatabase::with_store(store.clone(), TraceDbConfig::default());
    (store, db)
}

/// Wire record with the required fields
pub fn record(id: &str, request_id: &str, kind: &str) -> Value {
    json!({"id": id, "request_id": request_id, "type": kind})
}

/// Ids of a tree's direct children
pub fn child_ids(tree: &TraceTree) -> Vec<&str> {
    tree.children.iter().map(|c| c.event.id.as_str()).collect()
}

/// Ids of events in store order
pub fn ids(events: &[TraceEvent]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}
