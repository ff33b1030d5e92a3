//! TraceDB - request-scoped execution trace store
//!
//! TraceDB ingests trace events (function spans and log lines) emitted by
//! instrumented programs and reconstructs per-request call trees from them.
//!
//! # Quick Start
//!
//! ```ignore
//! use tracedb::{TraceDatabase, build_tree};
//! use serde_json::json;
//!
//! let db = TraceDatabase::ephemeral();
//! db.ingest(&json!([
//!     {"id": "a", "request_id": "r1", "type": "TRACE", "start": 0.0},
//!     {"id": "b", "request_id": "r1", "type": "LOG", "parent_id": "a", "message": "hi"}
//! ]))?;
//!
//! let view = db.trace_view("b")?;
//! assert_eq!(view.tree.unwrap().event.id, "a");
//! ```
//!
//! # Architecture
//!
//! - `tracedb-core`: event model and error taxonomy
//! - `tracedb-storage`: create-only event store with request and root indices
//! - `tracedb-durability`: append-only batch log
//! - `tracedb-engine`: ingestion, tree reconstruction, projection, config
//! - `tracedb-server`: HTTP API and the `tracedb` binary

pub use tracedb_core::{Error, ErrorKind, EventType, Result, TraceEvent};
pub use tracedb_engine::*;
pub use tracedb_storage::{DurableStore, EventStore, MemoryStore, UpsertOutcome};

/// Store implementations and test helpers
pub use tracedb_storage as storage;
