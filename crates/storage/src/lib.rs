//! Storage layer for TraceDB
//!
//! This crate implements the Trace Event Store:
//! - EventStore: the contract consumed by ingestion and read paths
//! - MemoryStore: FxHashMap primary table + secondary indices under one RwLock
//! - DurableStore: MemoryStore fronted by the batch log (log before apply)
//! - Secondary indices (request index, root index) ordered by timestamp
//! - Fault injection store for exercising rollback paths in tests
//!
//! # Write Model
//!
//! Writes are create-only: an id that already exists is left untouched.
//! A batch is applied under a single write lock, so readers observe either
//! none or all of its new events.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod durable;
pub mod index;
pub mod memory;
pub mod testing;
pub mod traits;

pub use durable::{DurableStore, LOG_FILE_NAME};
pub use index::{OrderKey, RequestIndex, RootIndex};
pub use memory::MemoryStore;
pub use testing::FaultyStore;
pub use traits::{EventStore, UpsertOutcome};
