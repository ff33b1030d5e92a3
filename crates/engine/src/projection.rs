//! Summary fields for display
//!
//! Pure field selection over already-built trees and stored events.
//! Absent values stay absent; nothing is defaulted.

use serde::Serialize;
use tracedb_core::TraceEvent;

use crate::tree::TraceForest;

/// Request-level summary shown alongside a call tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceSummary {
    /// Request the tree belongs to
    pub request_id: String,
    /// Outcome code of the selected root, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    /// Id of the selected root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_id: Option<String>,
    /// Name of the selected root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_name: Option<String>,
    /// Events in the selected tree
    pub node_count: usize,
    /// Events of the request not reachable from the selected root
    pub unattached: usize,
    /// `single`, `multiple` or `none`
    pub root_shape: &'static str,
}

impl TraceSummary {
    /// Summarize a reconstructed request
    pub fn from_forest(request_id: &str, forest: &TraceForest) -> Self {
        let root = forest.selected_root();
        Self {
            request_id: request_id.to_string(),
            status_code: root.and_then(|t| t.event.status_code),
            root_id: root.map(|t| t.event.id.clone()),
            root_name: root.and_then(|t| t.event.name.clone()),
            node_count: root.map_or(0, |t| t.node_count()),
            unattached: forest.unattached_count(),
            root_shape: forest.root_selection().as_str(),
        }
    }
}

/// One row of the recent-roots listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootRow {
    /// Event id
    pub id: String,
    /// Request id
    pub request_id: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Span start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Outcome code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    /// Ordering timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl RootRow {
    /// Select the listing fields of a root event
    pub fn from_event(event: &TraceEvent) -> Self {
        Self {
            id: event.id.clone(),
            request_id: event.request_id.clone(),
            name: event.name.clone(),
            start: event.start,
            duration: event.duration,
            status_code: event.status_code,
            timestamp: event.timestamp,
        }
    }
}
