//! MemoryStore: in-memory trace event table with secondary indices
//!
//! This module implements the EventStore trait using:
//! - `FxHashMap<String, TraceEvent>` as the primary table keyed by event id
//! - `RequestIndex` and `RootIndex` for the two read paths
//! - One `parking_lot::RwLock` over table, indices and sequence counter
//!
//! # Design Notes
//!
//! - **Create-only**: an existing id is never overwritten, not even its
//!   timestamp; index positions are fixed at first insert
//! - **Single write lock per batch**: new events, their index entries and
//!   the sequence counter change together, so a reader sees a batch fully
//!   or not at all
//! - **Commit hook**: `commit_with` runs a fallible hook after selecting the
//!   new events and before applying them; the durable store appends to the
//!   batch log there, and a hook error leaves the table untouched

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tracedb_core::{Result, TraceEvent};

use crate::index::{OrderKey, RequestIndex, RootIndex};
use crate::traits::{EventStore, UpsertOutcome};

#[derive(Debug, Default)]
struct Inner {
    events: FxHashMap<String, TraceEvent>,
    requests: RequestIndex,
    roots: RootIndex,
    next_seq: u64,
}

impl Inner {
    fn insert(&mut self, event: TraceEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let key = OrderKey::new(event.timestamp, seq);
        self.requests.insert(&event.request_id, key, event.id.clone());
        if event.is_root() {
            self.roots.insert(key, event.id.clone());
        }
        self.events.insert(event.id.clone(), event);
    }

    fn resolve<'a>(&self, ids: impl Iterator<Item = &'a str>) -> Vec<TraceEvent> {
        ids.filter_map(|id| self.events.get(id)).cloned().collect()
    }
}

/// In-memory trace event store
///
/// Thread-safe through a single `parking_lot::RwLock`. Not durable on its
/// own; see [`crate::DurableStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a batch, running `hook` on the new events before they become
    /// visible
    ///
    /// The hook is called with the write lock held and only if at least one
    /// event is new. If it fails, the store is unchanged and the error is
    /// returned.
    pub(crate) fn commit_with<F>(&self, events: Vec<TraceEvent>, hook: F) -> Result<UpsertOutcome>
    where
        F: FnOnce(&[TraceEvent]) -> Result<()>,
    {
        let accepted = events.len();
        let mut inner = self.inner.write();

        let fresh = {
            let mut seen = FxHashSet::default();
            events
                .into_iter()
                .filter(|e| !inner.events.contains_key(&e.id) && seen.insert(e.id.clone()))
                .collect::<Vec<_>>()
        };

        if fresh.is_empty() {
            return Ok(UpsertOutcome {
                accepted,
                created: 0,
            });
        }

        hook(&fresh)?;

        let created = fresh.len();
        for event in fresh {
            inner.insert(event);
        }
        Ok(UpsertOutcome { accepted, created })
    }

    /// Insert events recovered from the batch log
    ///
    /// Ids already present are skipped, same as a live upsert.
    pub(crate) fn restore(&self, events: Vec<TraceEvent>) -> usize {
        let mut inner = self.inner.write();
        let mut restored = 0;
        for event in events {
            if !inner.events.contains_key(&event.id) {
                inner.insert(event);
                restored += 1;
            }
        }
        restored
    }

    /// Number of distinct request ids seen
    #[cfg(test)]
    pub(crate) fn request_count(&self) -> usize {
        self.inner.read().requests.len()
    }
}

impl EventStore for MemoryStore {
    fn upsert_create_only(&self, events: Vec<TraceEvent>) -> Result<UpsertOutcome> {
        self.commit_with(events, |_| Ok(()))
    }

    fn list_roots(&self, limit: usize) -> Result<Vec<TraceEvent>> {
        let inner = self.inner.read();
        Ok(inner.resolve(inner.roots.newest_first().take(limit)))
    }

    fn list_by_request_id(&self, request_id: &str) -> Result<Vec<TraceEvent>> {
        let inner = self.inner.read();
        Ok(inner.resolve(inner.requests.ids(request_id)))
    }

    fn get_by_id(&self, id: &str) -> Result<Option<TraceEvent>> {
        Ok(self.inner.read().events.get(id).cloned())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.inner.read().events.len())
    }
}
