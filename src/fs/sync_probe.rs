//! Observe modification times around synchronous writes
//!
//! Appends the same payload three times, once per write mode, and records
//! the file's mtime right after the write and again after the descriptor
//! is closed.

use crate::error::{IoResultExt, Operation, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Write mode of one probe round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Ordinary buffered write
    Plain,
    /// `O_SYNC`: data and metadata reach the device before write returns
    Sync,
    /// `O_DSYNC`: data reaches the device before write returns
    DataSync,
}

impl SyncMode {
    /// All modes in probe order
    pub const ALL: [SyncMode; 3] = [SyncMode::Plain, SyncMode::Sync, SyncMode::DataSync];

    fn open_options(&self, first: bool) -> OpenOptions {
        let mut options = OpenOptions::new();
        if first {
            options.write(true).create(true).truncate(true);
        } else {
            options.append(true);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            match self {
                Self::Plain => {}
                Self::Sync => {
                    options.custom_flags(libc::O_SYNC);
                }
                Self::DataSync => {
                    options.custom_flags(libc::O_DSYNC);
                }
            }
        }

        options
    }
}

/// What one round observed
#[derive(Debug, Clone, Serialize)]
pub struct SyncSample {
    /// Write mode of the round
    pub mode: SyncMode,
    /// Bytes written
    pub bytes_written: usize,
    /// mtime right after the write
    pub mtime_after_write: DateTime<Local>,
    /// mtime after the descriptor was closed
    pub mtime_after_close: DateTime<Local>,
}

fn mtime(path: &Path) -> Result<DateTime<Local>> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_op(Operation::Stat, path)?;
    Ok(DateTime::<Local>::from(modified))
}

fn write_round(path: &Path, mode: SyncMode, first: bool, payload: &[u8]) -> Result<SyncSample> {
    let mut file: File = mode
        .open_options(first)
        .open(path)
        .with_op(if first { Operation::Create } else { Operation::Open }, path)?;

    file.write_all(payload).with_op(Operation::Write, path)?;
    let mtime_after_write = mtime(path)?;
    drop(file);
    let mtime_after_close = mtime(path)?;

    Ok(SyncSample {
        mode,
        bytes_written: payload.len(),
        mtime_after_write,
        mtime_after_close,
    })
}

/// Run the three rounds against `path`, sleeping `pause` before each
/// write after the first.
pub fn probe_sync_writes<P: AsRef<Path>>(path: P, payload: &[u8], pause: Duration) -> Result<Vec<SyncSample>> {
    let path = path.as_ref();
    let mut samples = Vec::with_capacity(SyncMode::ALL.len());

    for (round, mode) in SyncMode::ALL.iter().enumerate() {
        if round > 0 && !pause.is_zero() {
            std::thread::sleep(pause);
        }
        let sample = write_round(path, *mode, round == 0, payload)?;
        debug!("{:?} write: mtime {} / {}", mode, sample.mtime_after_write, sample.mtime_after_close);
        samples.push(sample);
    }

    Ok(samples)
}
