//! End-to-end tests for ingestion and call-tree reconstruction.
//!
//! These go through `TraceDatabase` the same way the HTTP layer does:
//! ingest a batch, then read it back as a request view or trace view.

#[path = "../common/mod.rs"]
mod common;

mod idempotency;
mod scenarios;
