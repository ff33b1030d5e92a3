//! Testing utilities for storage failure handling
//!
//! - **FaultyStore**: an EventStore whose commits can be made to fail, for
//!   checking that a failed batch leaves no trace
//!
//! # Example
//!
//! ```ignore
//! use tracedb_storage::testing::FaultyStore;
//!
//! let store = FaultyStore::new();
//! store.fail_next(1);
//! assert!(store.upsert_create_only(batch).is_err());
//! ```

mod faulty;

pub use faulty::FaultyStore;
