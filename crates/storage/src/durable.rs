//! DurableStore: MemoryStore backed by the batch log
//!
//! Every batch that creates at least one event is appended to the log
//! before it is applied in memory. On open the log is replayed in commit
//! order to rebuild the table and indices.
//!
//! ## Ordering
//!
//! Log append happens under the store's write lock, so the log order
//! matches the order batches became visible. A failed append leaves both
//! the log (truncated back) and the table unchanged.

use parking_lot::Mutex;
use std::fs;
use std::path::Path;
use tracedb_core::{Result, TraceEvent};
use tracedb_durability::{BatchLog, DurabilityMode};
use tracing::info;

use crate::memory::MemoryStore;
use crate::traits::{EventStore, UpsertOutcome};

/// File name of the batch log inside the data directory
pub const LOG_FILE_NAME: &str = "batches.log";

/// Trace event store persisted through an append-only batch log
#[derive(Debug)]
pub struct DurableStore {
    memory: MemoryStore,
    log: Mutex<BatchLog>,
}

impl DurableStore {
    /// Open or create a store in `dir`
    ///
    /// Creates the directory if needed and replays `batches.log`.
    ///
    /// # Errors
    ///
    /// - `Io` if the directory or log cannot be created or read
    /// - `InvalidConfig` if `mode` is [`DurabilityMode::Cache`]
    pub fn open<P: AsRef<Path>>(dir: P, mode: DurabilityMode) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let (log, replay) = BatchLog::open(dir.join(LOG_FILE_NAME), mode)?;
        let memory = MemoryStore::new();
        let batches = replay.records.len();
        let mut restored = 0;
        for record in replay.records {
            restored += memory.restore(record.events);
        }

        info!(
            dir = %dir.display(),
            mode = %mode,
            batches,
            events = restored,
            discarded_bytes = replay.discarded_bytes,
            "Recovered trace store"
        );

        Ok(Self {
            memory,
            log: Mutex::new(log),
        })
    }

    /// Force pending log appends to disk
    #[cfg(test)]
    pub(crate) fn sync(&self) -> Result<()> {
        self.log.lock().sync()
    }
}

impl EventStore for DurableStore {
    fn upsert_create_only(&self, events: Vec<TraceEvent>) -> Result<UpsertOutcome> {
        self.memory.commit_with(events, |fresh| {
            self.log.lock().append(fresh).map(|_| ())
        })
    }

    fn list_roots(&self, limit: usize) -> Result<Vec<TraceEvent>> {
        self.memory.list_roots(limit)
    }

    fn list_by_request_id(&self, request_id: &str) -> Result<Vec<TraceEvent>> {
        self.memory.list_by_request_id(request_id)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<TraceEvent>> {
        self.memory.get_by_id(id)
    }

    fn len(&self) -> Result<usize> {
        self.memory.len()
    }
}
