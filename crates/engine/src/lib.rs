//! Trace engine
//!
//! This crate sits on top of the store and provides:
//! - Ingestion: batch validation and the atomic create-only submit
//! - Tree: call-tree reconstruction from parent references
//! - Projection: summary fields for display
//! - TraceDatabase: configuration, store selection and the read views
//!
//! The engine is the only component that knows about:
//! - How a request's events become a tree
//! - Which store backs a deployment

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod ingest;
pub mod projection;
pub mod tree;

pub use database::{RequestView, TraceDatabase, TraceDbConfig, TraceView, CONFIG_FILE_NAME};
pub use ingest::{IngestReceipt, IngestService, MAX_RECORD_DEPTH};
pub use projection::{RootRow, TraceSummary};
pub use tree::{build_tree, RootSelection, TraceForest, TraceTree};
