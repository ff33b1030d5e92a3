//! TraceDatabase: store selection and the read/write operations
//!
//! This module provides the facade the HTTP layer talks to. It:
//! - Picks the store from configuration (in-memory or batch-log backed)
//! - Replays the batch log on open
//! - Routes ingestion through [`IngestService`]
//! - Assembles the trace, request and recent-roots views
//!
//! ## Persistence vs Durability
//!
//! | data_dir | durability | Store |
//! |----------|------------|-------|
//! | unset | (ignored) | `MemoryStore`, lost on exit |
//! | set | cache | `MemoryStore`, no files written |
//! | set | standard | `DurableStore`, periodic fsync |
//! | set | always | `DurableStore`, fsync per batch |
//!
//! All operations are blocking; async callers should run them on a
//! blocking thread.

pub mod config;

pub use config::{TraceDbConfig, CONFIG_FILE_NAME};

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracedb_core::{Error, Result, TraceEvent};
use tracedb_storage::{DurableStore, EventStore, MemoryStore};
use tracing::{info, warn};

use crate::ingest::{IngestReceipt, IngestService};
use crate::projection::{RootRow, TraceSummary};
use crate::tree::{TraceForest, TraceTree};

// ============================================================================
// Views
// ============================================================================

/// One event, the call tree of its request and the request summary
#[derive(Debug, Clone, Serialize)]
pub struct TraceView {
    /// The event that was asked for
    pub event: TraceEvent,
    /// Tree under the request's selected root, if it has one
    pub tree: Option<TraceTree>,
    /// Request-level summary
    pub summary: TraceSummary,
}

/// All events of one request with its call tree
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    /// Request id
    pub request_id: String,
    /// Events, oldest first
    pub events: Vec<TraceEvent>,
    /// Tree under the request's selected root, if it has one
    pub tree: Option<TraceTree>,
    /// Request-level summary
    pub summary: TraceSummary,
}

fn assemble(request_id: &str, events: Vec<TraceEvent>) -> (Option<TraceTree>, TraceSummary) {
    let forest = TraceForest::build(events);
    let summary = TraceSummary::from_forest(request_id, &forest);
    if !forest.cycle_ids().is_empty() || !forest.duplicate_ids().is_empty() {
        warn!(
            request_id,
            cycles = forest.cycle_ids().len(),
            duplicates = forest.duplicate_ids().len(),
            "Request has events that cannot be placed in a tree"
        );
    }
    (forest.into_selected_root(), summary)
}

// ============================================================================
// TraceDatabase
// ============================================================================

/// Trace store plus ingestion and read paths
#[derive(Clone)]
pub struct TraceDatabase {
    store: Arc<dyn EventStore>,
    ingest: IngestService,
    config: TraceDbConfig,
}

impl std::fmt::Debug for TraceDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceDatabase")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TraceDatabase {
    /// Open the store described by `config`
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the config does not validate
    /// - `Io` if the data directory or batch log cannot be opened
    pub fn open(config: TraceDbConfig) -> Result<Self> {
        config.validate()?;
        let mode = config.durability_mode()?;

        let store: Arc<dyn EventStore> = match &config.data_dir {
            Some(dir) if mode.requires_log() => Arc::new(DurableStore::open(dir, mode)?),
            Some(dir) => {
                warn!(
                    dir = %dir.display(),
                    "Cache durability selected; data_dir is ignored and traces stay in memory"
                );
                Arc::new(MemoryStore::new())
            }
            None => {
                info!("No data_dir configured; traces stay in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::with_store(store, config))
    }

    /// In-memory database with default settings
    pub fn ephemeral() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), TraceDbConfig::default())
    }

    /// Wrap an existing store
    pub fn with_store(store: Arc<dyn EventStore>, config: TraceDbConfig) -> Self {
        let ingest =
            IngestService::new(Arc::clone(&store)).with_max_batch_events(config.max_batch_events);
        Self {
            store,
            ingest,
            config,
        }
    }

    /// Configuration in effect
    pub fn config(&self) -> &TraceDbConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn EventStore> {
        &self.store
    }

    /// Ingest a parsed batch
    pub fn ingest(&self, raw: &Value) -> Result<IngestReceipt> {
        self.ingest.ingest(raw)
    }

    /// Ingest a raw request body
    pub fn ingest_bytes(&self, body: &[u8]) -> Result<IngestReceipt> {
        self.ingest.ingest_bytes(body)
    }

    /// Most recent root events
    ///
    /// `limit` defaults to the configured root limit and is capped by
    /// `max_root_limit`.
    pub fn recent_roots(&self, limit: Option<usize>) -> Result<Vec<RootRow>> {
        let limit = self.config.effective_root_limit(limit);
        let roots = self.store.list_roots(limit)?;
        Ok(roots.iter().map(RootRow::from_event).collect())
    }

    /// One event with the call tree of its request
    ///
    /// # Errors
    ///
    /// `NotFound` if no event has this id.
    pub fn trace_view(&self, id: &str) -> Result<TraceView> {
        let event = self
            .store
            .get_by_id(id)?
            .ok_or_else(|| Error::NotFound(format!("trace {id}")))?;
        let events = self.store.list_by_request_id(&event.request_id)?;
        let (tree, summary) = assemble(&event.request_id, events);
        Ok(TraceView {
            event,
            tree,
            summary,
        })
    }

    /// All events of a request with its call tree
    ///
    /// # Errors
    ///
    /// `NotFound` if the request has no events.
    pub fn request_view(&self, request_id: &str) -> Result<RequestView> {
        let events = self.store.list_by_request_id(request_id)?;
        if events.is_empty() {
            return Err(Error::NotFound(format!("request {request_id}")));
        }
        let (tree, summary) = assemble(request_id, events.clone());
        Ok(RequestView {
            request_id: request_id.to_string(),
            events,
            tree,
            summary,
        })
    }

    /// Number of stored events
    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    /// True if nothing has been stored
    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }
}
