//! Trace event data model
//!
//! A [`TraceEvent`] is one observed occurrence within a traced request:
//! either a function/span invocation (`TRACE`) or a point-in-time log
//! message (`LOG`). Events reference their parent by id and are grouped by
//! request id.
//!
//! ## Unset vs. zero
//!
//! Every optional field is an `Option`. `None` means the producer did not
//! send the field (or sent `null`); `Some(0)`, `Some(0.0)` and `Some("")`
//! are stored values and survive ingestion unchanged.
//!
//! ## Wire format
//!
//! Serde attributes match the ingestion wire keys (`request_id`,
//! `parent_id`, `type`, `status_code`, ...). Deserialization ignores unknown
//! keys and rejects known keys carrying the wrong JSON type. Serialization
//! omits unset fields.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of trace event
///
/// Serialized as the producer's string (`"TRACE"`, `"LOG"`); any other
/// string is preserved verbatim in [`EventType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    /// A function or span invocation
    Trace,
    /// A point-in-time log message
    Log,
    /// Producer-defined type
    Other(String),
}

impl EventType {
    /// Wire name of this type
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Trace => "TRACE",
            EventType::Log => "LOG",
            EventType::Other(name) => name,
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "TRACE" => EventType::Trace,
            "LOG" => EventType::Log,
            _ => EventType::Other(s),
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        EventType::from(s.to_string())
    }
}

impl From<EventType> for String {
    fn from(t: EventType) -> Self {
        match t {
            EventType::Trace => "TRACE".to_string(),
            EventType::Log => "LOG".to_string(),
            EventType::Other(name) => name,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded occurrence within a traced request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Globally unique id, supplied by the producer
    pub id: String,
    /// Groups all events of one traced request
    pub request_id: String,
    /// Parent event id; `None` marks a root event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// TRACE, LOG or a producer-defined kind
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Display name of the traced call site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Module of the traced call site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Qualified function name of the traced call site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Span start, seconds since epoch (fractional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    /// Span end, seconds since epoch (fractional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
    /// Span duration in seconds; stored as sent, never re-derived from start/end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    /// Outcome code, usually on the request's root span
    #[serde(
        default,
        deserialize_with = "deserialize_status_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<i64>,
    /// Severity of a LOG event, stored verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Text of a LOG event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Positional call inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    /// Keyword call inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwargs: Option<Map<String, Value>>,
    /// Call result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error raised by the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Exception class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_type: Option<String>,
    /// Exception details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<Value>,

    /// Occurrence time used for list ordering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Accept integral JSON numbers, including floats such as `200.0`
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number: Option<serde_json::Number> = Option::deserialize(deserializer)?;
    let Some(number) = number else {
        return Ok(None);
    };
    if let Some(code) = number.as_i64() {
        return Ok(Some(code));
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(Some(f as i64))
        }
        _ => Err(D::Error::custom(format!(
            "status_code must be an integer, got {}",
            number
        ))),
    }
}

impl TraceEvent {
    /// Create an event with only the required fields set
    pub fn new(
        id: impl Into<String>,
        request_id: impl Into<String>,
        event_type: impl Into<EventType>,
    ) -> Self {
        Self {
            id: id.into(),
            request_id: request_id.into(),
            parent_id: None,
            event_type: event_type.into(),
            name: None,
            module: None,
            function: None,
            start: None,
            end: None,
            duration: None,
            status_code: None,
            level: None,
            message: None,
            args: None,
            kwargs: None,
            result: None,
            error: None,
            exception_type: None,
            exception: None,
            timestamp: None,
        }
    }

    /// Shorthand for a TRACE event
    pub fn span(id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(id, request_id, EventType::Trace)
    }

    /// Shorthand for a LOG event
    pub fn log(id: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(id, request_id, EventType::Log)
    }

    /// Set the parent id
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set span start
    pub fn with_start(mut self, start: f64) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the ordering timestamp
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the outcome code
    pub fn with_status_code(mut self, code: i64) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Set level and message of a LOG event
    pub fn with_message(mut self, level: impl Into<String>, message: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self.message = Some(message.into());
        self
    }

    /// True if this event has no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
