//! Batch record encoding and decoding
//!
//! ## Record Format
//!
//! ```text
//! [length: u32][kind: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: Total size of kind + payload + crc (NOT including length itself)
//! - **kind**: Record kind tag (1 = ingestion batch)
//! - **payload**: JSON-serialized [`BatchRecord`]
//! - **crc32**: CRC32 checksum over \[kind\]\[payload\]
//!
//! The payload is JSON so that arbitrary structured values (`args`,
//! `result`, ...) round-trip unchanged.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use tracedb_core::{Error, Result, TraceEvent};

/// Record kind tag for an ingestion batch
pub const KIND_BATCH: u8 = 1;

/// Length prefix (4) + kind (1) + crc (4)
const MIN_FRAME: usize = 4 + 1 + 4;

/// One committed ingestion batch
///
/// Holds only the events the batch actually created; ids that already
/// existed were no-ops and are not logged again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Commit sequence number, strictly increasing within a log
    pub seq: u64,
    /// Events created by this batch, in batch order
    pub events: Vec<TraceEvent>,
}

#[derive(Serialize)]
struct BatchRecordRef<'a> {
    seq: u64,
    events: &'a [TraceEvent],
}

/// Outcome of decoding at a given offset
#[derive(Debug)]
pub enum Decoded {
    /// A complete, checksum-valid record and the number of bytes it used
    Record(BatchRecord, usize),
    /// The buffer ends in the middle of a record (torn write)
    Incomplete {
        /// Bytes available from the offset
        have: usize,
        /// Bytes the record needs
        needed: usize,
    },
}

/// Encode a batch to bytes
///
/// Format: `[length: u32][kind: u8][payload: bytes][crc32: u32]`
pub fn encode_record(seq: u64, events: &[TraceEvent]) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(&BatchRecordRef { seq, events })?;

    // kind(1) + payload + crc(4)
    let total_len = 1 + payload.len() + 4;
    let total_len_u32 = u32::try_from(total_len).map_err(|_| {
        Error::Serialization(format!("batch record of {} bytes is too large", total_len))
    })?;

    let mut buf = Vec::with_capacity(4 + total_len);
    buf.extend_from_slice(&total_len_u32.to_le_bytes());
    buf.push(KIND_BATCH);
    buf.extend_from_slice(&payload);

    let mut hasher = Hasher::new();
    hasher.update(&[KIND_BATCH]);
    hasher.update(&payload);
    buf.extend_from_slice(&hasher.finalize().to_le_bytes());

    Ok(buf)
}

/// Decode one record from the start of `buf`
///
/// `offset` is the file offset of `buf[0]` and only used in error messages.
///
/// # Errors
///
/// - `Error::Corruption` when the declared length is impossible or the CRC
///   does not match: the frame itself is damaged
/// - `Error::Serialization` when the frame is intact but its kind tag is
///   unknown or its payload does not deserialize
///
/// A buffer that simply ends early is `Decoded::Incomplete`, not an error.
pub fn decode_record(buf: &[u8], offset: u64) -> Result<Decoded> {
    if buf.len() < 4 {
        return Ok(Decoded::Incomplete {
            have: buf.len(),
            needed: 4,
        });
    }
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&buf[..4]);
    let total_len = u32::from_le_bytes(len_bytes) as usize;

    if 4 + total_len < MIN_FRAME {
        return Err(Error::Corruption(format!(
            "offset {}: invalid record length {} (minimum is 5 bytes: kind(1) + crc(4))",
            offset, total_len
        )));
    }
    if buf.len() < 4 + total_len {
        return Ok(Decoded::Incomplete {
            have: buf.len(),
            needed: 4 + total_len,
        });
    }

    let kind = buf[4];
    let payload = &buf[5..4 + total_len - 4];
    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&buf[4 + total_len - 4..4 + total_len]);
    let expected_crc = u32::from_le_bytes(crc_bytes);

    let mut hasher = Hasher::new();
    hasher.update(&[kind]);
    hasher.update(payload);
    let actual_crc = hasher.finalize();
    if actual_crc != expected_crc {
        return Err(Error::Corruption(format!(
            "offset {}: CRC mismatch: expected {:08x}, got {:08x}",
            offset, expected_crc, actual_crc
        )));
    }

    if kind != KIND_BATCH {
        return Err(Error::Serialization(format!(
            "offset {}: unknown record kind {}",
            offset, kind
        )));
    }

    let record: BatchRecord = serde_json::from_slice(payload).map_err(|e| {
        Error::Serialization(format!("offset {}: deserialization failed: {}", offset, e))
    })?;

    Ok(Decoded::Record(record, 4 + total_len))
}
