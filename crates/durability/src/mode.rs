//! Durability mode configuration
//!
//! Controls batch log sync behavior (Cache, Standard, Always).

use std::fmt;
use std::str::FromStr;
use tracedb_core::{Error, Result};

/// Durability mode for batch log operations
///
/// # Modes
///
/// | Mode | fsync | Data Loss Window |
/// |------|-------|-----------------|
/// | Cache | Never (no file) | Everything on exit |
/// | Always | Every batch | Zero |
/// | Standard | Periodic | Up to interval/batch |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// In-memory only; the batch log is never opened
    Cache,

    /// fsync after every appended batch
    Always,

    /// fsync every N batches OR when T milliseconds have passed since the
    /// last fsync, checked on append. Pending data is synced on drop.
    Standard {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum appended batches between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires a batch log file
    pub fn requires_log(&self) -> bool {
        !matches!(self, DurabilityMode::Cache)
    }

    /// Check if this mode fsyncs on every append
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Always)
    }

    /// Create a standard mode with recommended defaults
    ///
    /// Returns `Standard { interval_ms: 100, batch_size: 1000 }`.
    pub fn standard_default() -> Self {
        DurabilityMode::Standard {
            interval_ms: 100,
            batch_size: 1000,
        }
    }

    /// Config-file name of this mode
    pub fn name(&self) -> &'static str {
        match self {
            DurabilityMode::Cache => "cache",
            DurabilityMode::Always => "always",
            DurabilityMode::Standard { .. } => "standard",
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::standard_default()
    }
}

impl fmt::Display for DurabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DurabilityMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cache" => Ok(DurabilityMode::Cache),
            "standard" => Ok(DurabilityMode::standard_default()),
            "always" => Ok(DurabilityMode::Always),
            other => Err(Error::InvalidConfig(format!(
                "invalid durability mode '{}': expected \"cache\", \"standard\" or \"always\"",
                other
            ))),
        }
    }
}
