//! Append-only batch log
//!
//! ## File Operations
//!
//! - `BatchLog::open()` - Open or create the log, replay intact records,
//!   cut off a torn or corrupted tail
//! - `BatchLog::append()` - Write one record for a committed batch
//! - `BatchLog::sync()` - Force pending appends to disk
//!
//! ## Failure Handling
//!
//! An append that fails part-way, including a failed sync after the write,
//! truncates the file back to its previous length, so a failed batch never
//! leaves bytes that a later replay could misread. The caller treats the
//! failure as a rolled-back batch. If that truncation fails too, the log is
//! poisoned and refuses further appends.
//!
//! On open, a torn or checksum-failing tail is cut off. A record whose frame
//! is intact but whose payload cannot be decoded fails the open instead.

use crate::encoding::{decode_record, encode_record, BatchRecord, Decoded};
use crate::mode::DurabilityMode;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracedb_core::{Error, Result, TraceEvent};
use tracing::{debug, error, warn};

/// Result of replaying a batch log on open
#[derive(Debug, Default)]
pub struct Replay {
    /// Intact records in commit order
    pub records: Vec<BatchRecord>,
    /// Bytes discarded from the end of the file
    pub discarded_bytes: u64,
}

/// Append-only log of committed ingestion batches
#[derive(Debug)]
pub struct BatchLog {
    path: PathBuf,
    file: File,
    mode: DurabilityMode,
    /// Current logical file length; everything before it is intact
    len: u64,
    next_seq: u64,
    unsynced: usize,
    last_sync: Instant,
    /// Set when a failed append could not be rolled back
    poisoned: Option<String>,
    #[cfg(test)]
    faults: InjectedFaults,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct InjectedFaults {
    sync: bool,
    truncate: bool,
}

impl BatchLog {
    /// Open an existing log or create a new one
    ///
    /// Replays every intact record. The first record that is torn or fails
    /// its checksum ends the replay; it and everything after it are
    /// truncated away so new appends start from a clean boundary.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be opened, read or truncated
    /// - `InvalidConfig` if called with [`DurabilityMode::Cache`]
    /// - `Corruption` if a checksum-valid record cannot be decoded; the file
    ///   is left untouched
    pub fn open<P: AsRef<Path>>(path: P, mode: DurabilityMode) -> Result<(Self, Replay)> {
        if !mode.requires_log() {
            return Err(Error::InvalidConfig(
                "cache durability mode does not use a batch log".to_string(),
            ));
        }
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let mut replay = Replay::default();
        let mut offset = 0usize;
        while offset < buf.len() {
            match decode_record(&buf[offset..], offset as u64) {
                Ok(Decoded::Record(record, used)) => {
                    replay.records.push(record);
                    offset += used;
                }
                Ok(Decoded::Incomplete { have, needed }) => {
                    warn!(offset, have, needed, "Discarding torn batch record");
                    break;
                }
                Err(Error::Corruption(reason)) => {
                    warn!(offset, error = %reason, "Discarding corrupted batch log tail");
                    break;
                }
                Err(e) => {
                    return Err(Error::Corruption(format!(
                        "{}: intact record cannot be replayed: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        let len = offset as u64;
        replay.discarded_bytes = buf.len() as u64 - len;
        if replay.discarded_bytes > 0 {
            file.set_len(len)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(len))?;

        let next_seq = replay.records.last().map(|r| r.seq + 1).unwrap_or(1);
        debug!(
            path = %path.display(),
            records = replay.records.len(),
            next_seq,
            "Opened batch log"
        );

        Ok((
            Self {
                path,
                file,
                mode,
                len,
                next_seq,
                unsynced: 0,
                last_sync: Instant::now(),
                poisoned: None,
                #[cfg(test)]
                faults: InjectedFaults::default(),
            },
            replay,
        ))
    }

    /// Append one committed batch
    ///
    /// Returns the sequence number assigned to the record. On error the
    /// file is restored to its previous length.
    ///
    /// # Errors
    ///
    /// - `Io` if the write or a due sync fails
    /// - `Storage` if the log is poisoned by an earlier failed rollback
    pub fn append(&mut self, events: &[TraceEvent]) -> Result<u64> {
        if let Some(reason) = &self.poisoned {
            return Err(Error::Storage(format!(
                "batch log {} is unusable: {}",
                self.path.display(),
                reason
            )));
        }

        let seq = self.next_seq;
        let bytes = encode_record(seq, events)?;

        let unsynced = self.unsynced;
        let written = self.write_frame(&bytes).and_then(|()| {
            self.unsynced += 1;
            self.maybe_sync()
        });
        if let Err(e) = written {
            self.unsynced = unsynced;
            self.rollback();
            return Err(e);
        }

        self.len += bytes.len() as u64;
        self.next_seq += 1;
        Ok(seq)
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()?;
        if self.mode.requires_immediate_fsync() {
            self.sync_file()?;
        }
        Ok(())
    }

    /// Cut the file back to the last intact record, poisoning the log if
    /// that fails
    fn rollback(&mut self) {
        let len = self.len;
        let restored = self
            .truncate_file(len)
            .and_then(|_| self.file.seek(SeekFrom::Start(len)))
            .map(|_| ());
        if let Err(e) = restored {
            error!(path = %self.path.display(), error = %e, "Failed to roll back batch log");
            self.poisoned = Some(format!("rollback to {len} bytes failed: {e}"));
        }
    }

    fn sync_file(&mut self) -> io::Result<()> {
        #[cfg(test)]
        if self.faults.sync {
            return Err(io::Error::other("injected sync failure"));
        }
        self.file.sync_data()
    }

    fn truncate_file(&mut self, len: u64) -> io::Result<()> {
        #[cfg(test)]
        if self.faults.truncate {
            return Err(io::Error::other("injected truncate failure"));
        }
        self.file.set_len(len)
    }

    fn maybe_sync(&mut self) -> Result<()> {
        match self.mode {
            DurabilityMode::Always => {
                self.unsynced = 0;
                self.last_sync = Instant::now();
                Ok(())
            }
            DurabilityMode::Standard {
                interval_ms,
                batch_size,
            } => {
                if self.unsynced >= batch_size
                    || self.last_sync.elapsed() >= Duration::from_millis(interval_ms)
                {
                    self.sync()
                } else {
                    Ok(())
                }
            }
            DurabilityMode::Cache => Ok(()),
        }
    }

    /// Force all appended records to disk
    pub fn sync(&mut self) -> Result<()> {
        self.sync_file()?;
        self.unsynced = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Durability mode in effect
    #[cfg(test)]
    pub(crate) fn mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Bytes of intact records in the file
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True if no record has been written yet
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sequence number the next append will receive
    #[cfg(test)]
    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

impl Drop for BatchLog {
    fn drop(&mut self) {
        if self.unsynced > 0 {
            if let Err(e) = self.file.sync_data() {
                warn!(path = %self.path.display(), error = %e, "Failed to sync batch log on close");
            }
        }
    }
}
