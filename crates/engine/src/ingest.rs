//! Batch ingestion
//!
//! Validates a producer batch in full, then hands it to the store as one
//! create-only upsert. Either every event of the batch is applied (as a
//! create or a no-op) or none is.
//!
//! ## Validation
//!
//! - The body must be a JSON array; each element a JSON object
//! - `id`, `request_id` and `type` must be non-empty strings
//! - Recognized optional keys must carry the right JSON type (`null` means
//!   unset); unknown keys are ignored
//! - A record may nest at most [`MAX_RECORD_DEPTH`] levels of arrays and
//!   objects, counting itself, so the batch log can always replay it
//! - The first failing record rejects the whole batch before any store
//!   access

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracedb_core::{Error, Result, TraceEvent};
use tracedb_storage::{EventStore, UpsertOutcome};
use tracing::{debug, info};

/// Fields every record must carry as non-empty strings
const REQUIRED_FIELDS: [&str; 3] = ["id", "request_id", "type"];

/// Deepest array/object nesting accepted in one record, counting the record
///
/// The batch log adds two levels around each record and must stay within
/// `serde_json`'s parse depth of 128 on replay.
pub const MAX_RECORD_DEPTH: usize = 64;

/// Outcome of one ingested batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IngestReceipt {
    /// Records in the batch, counting ids that already existed
    pub accepted: usize,
    /// Records that were newly stored
    pub created: usize,
}

impl From<UpsertOutcome> for IngestReceipt {
    fn from(outcome: UpsertOutcome) -> Self {
        Self {
            accepted: outcome.accepted,
            created: outcome.created,
        }
    }
}

/// Validates batches and submits them to an [`EventStore`]
#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn EventStore>,
    max_batch_events: Option<usize>,
}

impl std::fmt::Debug for IngestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestService")
            .field("max_batch_events", &self.max_batch_events)
            .finish_non_exhaustive()
    }
}

impl IngestService {
    /// Create a service writing to `store`, with no batch size limit
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            max_batch_events: None,
        }
    }

    /// Reject batches with more than `max` records
    pub fn with_max_batch_events(mut self, max: usize) -> Self {
        self.max_batch_events = Some(max);
        self
    }

    /// Parse a raw request body and ingest it
    ///
    /// # Errors
    ///
    /// - `InvalidPayload` if the body is not JSON
    /// - anything [`IngestService::ingest`] returns
    pub fn ingest_bytes(&self, body: &[u8]) -> Result<IngestReceipt> {
        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| Error::InvalidPayload(format!("body is not valid JSON: {e}")))?;
        self.ingest(&raw)
    }

    /// Validate and store one batch
    ///
    /// # Errors
    ///
    /// - `InvalidPayload` if `raw` is not an array
    /// - `BatchTooLarge` if the configured limit is exceeded
    /// - `InvalidRecord` for the first malformed record
    /// - storage errors from the store, unchanged
    pub fn ingest(&self, raw: &Value) -> Result<IngestReceipt> {
        let records = raw
            .as_array()
            .ok_or_else(|| Error::InvalidPayload("expected a JSON array of events".to_string()))?;

        if let Some(max) = self.max_batch_events {
            if records.len() > max {
                return Err(Error::BatchTooLarge {
                    len: records.len(),
                    max,
                });
            }
        }

        let events = records
            .iter()
            .enumerate()
            .map(|(index, record)| decode_record(index, record))
            .collect::<Result<Vec<_>>>()?;

        if events.is_empty() {
            debug!("Empty batch, nothing to store");
            return Ok(IngestReceipt::default());
        }

        let receipt = IngestReceipt::from(self.store.upsert_create_only(events)?);
        info!(
            accepted = receipt.accepted,
            created = receipt.created,
            "Ingested trace batch"
        );
        Ok(receipt)
    }
}

/// Decode one batch element into a [`TraceEvent`]
pub fn decode_record(index: usize, record: &Value) -> Result<TraceEvent> {
    let invalid = |reason: String| Error::InvalidRecord { index, reason };

    let object = record
        .as_object()
        .ok_or_else(|| invalid("expected a JSON object".to_string()))?;

    for field in REQUIRED_FIELDS {
        match object.get(field) {
            None | Some(Value::Null) => {
                return Err(invalid(format!("missing required field `{field}`")))
            }
            Some(Value::String(s)) if s.is_empty() => {
                return Err(invalid(format!("field `{field}` must not be empty")))
            }
            Some(Value::String(_)) => {}
            Some(_) => return Err(invalid(format!("field `{field}` must be a string"))),
        }
    }

    if exceeds_depth(record, MAX_RECORD_DEPTH) {
        return Err(invalid(format!(
            "nested deeper than {MAX_RECORD_DEPTH} levels"
        )));
    }

    TraceEvent::deserialize(record).map_err(|e| invalid(e.to_string()))
}

/// True if `value` nests arrays/objects more than `max` levels deep
fn exceeds_depth(value: &Value, max: usize) -> bool {
    let mut stack = vec![(value, 0usize)];
    while let Some((value, above)) = stack.pop() {
        let depth = above + 1;
        match value {
            Value::Array(_) | Value::Object(_) if depth > max => return true,
            Value::Array(items) => stack.extend(items.iter().map(|child| (child, depth))),
            Value::Object(map) => stack.extend(map.values().map(|child| (child, depth))),
            _ => {}
        }
    }
    false
}
