//! Error types for TraceDB
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Every error carries a classification ([`ErrorKind`]) so that outer
//! surfaces can decide who has to act on it:
//!
//! | Kind | Variants | Who acts |
//! |------|----------|----------|
//! | Client | `InvalidPayload`, `InvalidRecord`, `BatchTooLarge` | caller must fix input |
//! | NotFound | `NotFound` | nothing to fix, entity is absent |
//! | Server | `Io`, `Storage`, `Corruption`, `Serialization` | caller may retry the same request |
//! | Server | `InvalidConfig` | operator must fix the deployment |

use std::io;
use thiserror::Error;

/// Result type alias for TraceDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for TraceDB
#[derive(Debug, Error)]
pub enum Error {
    /// Ingestion body is not a JSON array (or not JSON at all)
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// One record of an ingestion batch failed validation
    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord {
        /// Position of the offending record in the batch
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// Batch holds more records than the configured maximum
    #[error("Batch too large: {len} events (maximum is {max})")]
    BatchTooLarge {
        /// Number of records received
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error (batch log file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage layer error (transaction abort, poisoned state, ...)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persisted data failed an integrity check
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration value or file is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request; no side effects happened
    Client,
    /// The entity asked for is absent
    NotFound,
    /// Infrastructure failure; the operation was rolled back
    Server,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidPayload(_) | Error::InvalidRecord { .. } | Error::BatchTooLarge { .. } => {
                ErrorKind::Client
            }
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Io(_)
            | Error::Storage(_)
            | Error::Corruption(_)
            | Error::Serialization(_)
            | Error::InvalidConfig(_) => ErrorKind::Server,
        }
    }

    /// True if the caller sent something malformed
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Client
    }

    /// Build a storage error from anything displayable
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
