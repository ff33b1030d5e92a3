//! Durability layer for TraceDB
//!
//! This crate handles everything that touches disk:
//!
//! - Batch log: append-only file with one record per committed ingestion batch
//! - Durability modes: Cache, Standard (default), Always
//! - Record framing with CRC32 checksums
//!
//! A batch is durable once its record has been appended. Replay returns
//! every intact record in order and drops a torn or corrupted tail, so a
//! batch is either fully recovered or not recovered at all.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod log;
pub mod mode;

pub use encoding::BatchRecord;
pub use log::BatchLog;
pub use mode::DurabilityMode;
