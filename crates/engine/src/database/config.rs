//! Server configuration via `tracedb.toml`
//!
//! On first start a default `tracedb.toml` is written next to the binary's
//! working directory (or wherever `--config` points). To change settings,
//! edit the file and restart. Command-line flags override file values.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracedb_core::{Error, Result};
use tracedb_durability::DurabilityMode;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "tracedb.toml";

/// Configuration loaded from `tracedb.toml`
///
/// # Example
///
/// ```toml
/// bind = "0.0.0.0:3000"
/// # data_dir = "./tracedb-data"
/// durability = "standard"
/// root_limit = 100
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TraceDbConfig {
    /// Socket address the HTTP server listens on
    pub bind: String,
    /// Directory holding the batch log; absent means in-memory only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// `"cache"`, `"standard"` or `"always"`
    pub durability: String,
    /// Roots listed when the caller gives no limit
    pub root_limit: usize,
    /// Upper bound for a caller-supplied listing limit
    pub max_root_limit: usize,
    /// Largest accepted batch, in events
    pub max_batch_events: usize,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl Default for TraceDbConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            data_dir: None,
            durability: "standard".to_string(),
            root_limit: 100,
            max_root_limit: 1000,
            max_batch_events: 10_000,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

impl TraceDbConfig {
    /// Parse the durability string into a `DurabilityMode`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for anything but `cache`, `standard` or `always`.
    pub fn durability_mode(&self) -> Result<DurabilityMode> {
        self.durability.parse()
    }

    /// Check values that deserialize fine but cannot work
    pub fn validate(&self) -> Result<()> {
        self.durability_mode()?;
        if self.root_limit == 0 || self.max_root_limit == 0 {
            return Err(Error::InvalidConfig(
                "root_limit and max_root_limit must be positive".to_string(),
            ));
        }
        if self.root_limit > self.max_root_limit {
            return Err(Error::InvalidConfig(format!(
                "root_limit ({}) exceeds max_root_limit ({})",
                self.root_limit, self.max_root_limit
            )));
        }
        if self.max_batch_events == 0 || self.max_body_bytes == 0 {
            return Err(Error::InvalidConfig(
                "max_batch_events and max_body_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Listing limit for a request: the default if absent, capped at the maximum
    pub fn effective_root_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.root_limit)
            .min(self.max_root_limit)
    }

    /// Returns the default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# TraceDB configuration

# Address the HTTP API listens on
bind = "0.0.0.0:3000"

# Directory for the batch log. Leave unset to keep traces in memory only.
# data_dir = "./tracedb-data"

# Durability mode: "standard" (default), "always" or "cache"
#   "standard" = periodic fsync (~100ms), may lose last interval on crash
#   "always"   = fsync every batch, zero data loss
#   "cache"    = no batch log even if data_dir is set
durability = "standard"

# Number of root events on the recent-traces listing
root_limit = 100
# Largest ?limit= a caller may ask for
max_root_limit = 1000

# Ingestion limits
max_batch_events = 10000
max_body_bytes = 16777216
"#
    }

    /// Read and parse config from a file path
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: TraceDbConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
