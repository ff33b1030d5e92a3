//! Fault injection store

use std::sync::atomic::{AtomicUsize, Ordering};
use tracedb_core::{Error, Result, TraceEvent};

use crate::memory::MemoryStore;
use crate::traits::{EventStore, UpsertOutcome};

/// MemoryStore whose next N committing upserts fail with `Error::Storage`
///
/// The failure is raised at the point where a durable store would append
/// to its log, so new events have been selected but not applied. Batches
/// with nothing new never reach that point and do not consume a fault.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    pending_faults: AtomicUsize,
    injected: AtomicUsize,
}

impl FaultyStore {
    /// Create a store with no faults armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `n` more failures
    pub fn fail_next(&self, n: usize) {
        self.pending_faults.fetch_add(n, Ordering::SeqCst);
    }

    /// Disarm all pending failures
    pub fn heal(&self) {
        self.pending_faults.store(0, Ordering::SeqCst);
    }

    /// Number of failures raised so far
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::SeqCst)
    }

    fn take_fault(&self) -> bool {
        self.pending_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl EventStore for FaultyStore {
    fn upsert_create_only(&self, events: Vec<TraceEvent>) -> Result<UpsertOutcome> {
        self.inner.commit_with(events, |fresh| {
            if self.take_fault() {
                self.injected.fetch_add(1, Ordering::SeqCst);
                Err(Error::storage(format!(
                    "injected fault while committing {} events",
                    fresh.len()
                )))
            } else {
                Ok(())
            }
        })
    }

    fn list_roots(&self, limit: usize) -> Result<Vec<TraceEvent>> {
        self.inner.list_roots(limit)
    }

    fn list_by_request_id(&self, request_id: &str) -> Result<Vec<TraceEvent>> {
        self.inner.list_by_request_id(request_id)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<TraceEvent>> {
        self.inner.get_by_id(id)
    }

    fn len(&self) -> Result<usize> {
        self.inner.len()
    }
}
