//! Trace Event Store contract

use std::sync::Arc;
use tracedb_core::{Result, TraceEvent};

/// Result of a create-only batch upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertOutcome {
    /// Events in the batch, counting no-ops
    pub accepted: usize,
    /// Events that did not exist before and were inserted
    pub created: usize,
}

impl UpsertOutcome {
    /// Events that were no-ops because their id already existed
    pub fn skipped(&self) -> usize {
        self.accepted - self.created
    }
}

/// Durable table of trace events
///
/// Implementations must be safe to share between threads; calls may block
/// on I/O.
pub trait EventStore: Send + Sync {
    /// Persist each event unless its id already exists
    ///
    /// An id that exists in the store, or appears earlier in the same batch,
    /// is a no-op. The whole batch is one atomic unit: on `Err` nothing of
    /// it is visible, on `Ok` all of it is.
    fn upsert_create_only(&self, events: Vec<TraceEvent>) -> Result<UpsertOutcome>;

    /// Root events (no parent), most recent `timestamp` first
    ///
    /// Events without a timestamp are listed after all timed ones.
    fn list_roots(&self, limit: usize) -> Result<Vec<TraceEvent>>;

    /// All events of a request, oldest `timestamp` first
    ///
    /// Events without a timestamp are listed after all timed ones.
    fn list_by_request_id(&self, request_id: &str) -> Result<Vec<TraceEvent>>;

    /// Look up one event
    fn get_by_id(&self, id: &str) -> Result<Option<TraceEvent>>;

    /// Number of stored events
    fn len(&self) -> Result<usize>;

    /// True if nothing has been stored
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    fn upsert_create_only(&self, events: Vec<TraceEvent>) -> Result<UpsertOutcome> {
        (**self).upsert_create_only(events)
    }

    fn list_roots(&self, limit: usize) -> Result<Vec<TraceEvent>> {
        (**self).list_roots(limit)
    }

    fn list_by_request_id(&self, request_id: &str) -> Result<Vec<TraceEvent>> {
        (**self).list_by_request_id(request_id)
    }

    fn get_by_id(&self, id: &str) -> Result<Option<TraceEvent>> {
        (**self).get_by_id(id)
    }

    fn len(&self) -> Result<usize> {
        (**self).len()
    }
}
