//! Core types for TraceDB
//!
//! This crate defines the foundational types used throughout the system:
//! - TraceEvent: One observed call span or log line within a request
//! - EventType: TRACE / LOG discriminator (extensible)
//! - Error: Error type hierarchy with client/server classification

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;

pub use error::{Error, ErrorKind, Result};
pub use event::{EventType, TraceEvent};
