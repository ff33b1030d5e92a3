//! Secondary indices for efficient query patterns
//!
//! This module provides secondary indices that answer the two read paths
//! without scanning the primary table:
//! - RequestIndex: request id → event ids, oldest first
//! - RootIndex: ids of events without a parent, ordered by timestamp
//!
//! Both are keyed by [`OrderKey`], which sorts timed events by timestamp
//! and puts untimed events after them. The insertion sequence breaks ties
//! so every listing is deterministic.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Timestamp with a total order (`f64::total_cmp`)
#[derive(Debug, Clone, Copy)]
pub struct Timestamp(pub f64);

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Position of an event in a timestamp-ordered index
///
/// `Timed` keys sort before every `Untimed` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderKey {
    /// Event with a timestamp, then its insertion sequence
    Timed(Timestamp, u64),
    /// Event without a timestamp, by insertion sequence
    Untimed(u64),
}

impl OrderKey {
    /// Build the key for an event
    pub fn new(timestamp: Option<f64>, seq: u64) -> Self {
        match timestamp {
            Some(ts) => OrderKey::Timed(Timestamp(ts), seq),
            None => OrderKey::Untimed(seq),
        }
    }

    const FIRST_UNTIMED: OrderKey = OrderKey::Untimed(0);
}

/// Secondary index: request id → ordered event ids
#[derive(Debug, Default)]
pub struct RequestIndex {
    index: FxHashMap<String, BTreeMap<OrderKey, String>>,
}

impl RequestIndex {
    /// Create a new empty RequestIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event id under its request
    pub fn insert(&mut self, request_id: &str, key: OrderKey, id: String) {
        self.index
            .entry(request_id.to_string())
            .or_default()
            .insert(key, id);
    }

    /// Event ids of a request, oldest first, untimed last
    pub fn ids(&self, request_id: &str) -> impl Iterator<Item = &str> {
        self.index
            .get(request_id)
            .into_iter()
            .flat_map(|ids| ids.values().map(String::as_str))
    }

    /// Number of requests in the index
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the index is empty
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Secondary index: root event ids ordered by timestamp
#[derive(Debug, Default)]
pub struct RootIndex {
    index: BTreeMap<OrderKey, String>,
}

impl RootIndex {
    /// Create a new empty RootIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root event id
    pub fn insert(&mut self, key: OrderKey, id: String) {
        self.index.insert(key, id);
    }

    /// Root ids, most recent first, untimed last (newest untimed first)
    pub fn newest_first(&self) -> impl Iterator<Item = &str> {
        let timed = self.index.range(..OrderKey::FIRST_UNTIMED).rev();
        let untimed = self.index.range(OrderKey::FIRST_UNTIMED..).rev();
        timed.chain(untimed).map(|(_, id)| id.as_str())
    }

    /// Number of roots
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    /// Check if the index is empty
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
