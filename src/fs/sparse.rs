//! Sparse-aware file copy
//!
//! Copies a file one block at a time. A full block that is entirely zero
//! is not written: the destination position is moved past it instead, so
//! the filesystem can leave that range unallocated. Everything else,
//! including a short final block, is written as-is.
//!
//! Detection is purely content-based; no hole-reporting API is consulted.
//! A failed copy leaves the partial destination behind. Callers that need
//! atomicity should copy to a temporary name and rename.

use crate::error::{HoleWalkError, IoResultExt, Operation, Result};
use serde::Serialize;
use std::fs::{File, Metadata, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::debug;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Block size used when the destination does not report one
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Result of a sparse copy operation
#[derive(Debug, Clone, Serialize)]
pub struct SparseCopyResult {
    /// Bytes read from the source
    pub bytes_read: u64,
    /// Bytes actually written (holes excluded)
    pub bytes_written: u64,
    /// Full zero blocks turned into holes
    pub holes_skipped: u64,
    /// Block size used for scanning
    pub block_size: usize,
    /// Final length of the destination
    pub logical_size: u64,
    /// Wall time of the copy
    pub duration: Duration,
}

impl SparseCopyResult {
    /// Bytes that were skipped instead of written
    pub fn space_saved(&self) -> u64 {
        self.holes_skipped * self.block_size as u64
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("Copied:       {}", humansize::format_size(self.logical_size, humansize::BINARY));
        println!("Written:      {}", humansize::format_size(self.bytes_written, humansize::BINARY));
        println!(
            "Holes:        {} x {} ({} skipped)",
            self.holes_skipped,
            humansize::format_size(self.block_size as u64, humansize::BINARY),
            humansize::format_size(self.space_saved(), humansize::BINARY)
        );
        println!("Duration:     {:.2?}", self.duration);
    }
}

/// Running totals of the block loop
#[derive(Debug, Default)]
struct Tally {
    bytes_read: u64,
    bytes_written: u64,
    holes_skipped: u64,
}

/// Sparse file copier with zero-block detection
#[derive(Debug, Clone, Default)]
pub struct SparseCopier {
    /// Fixed block size; None = use the destination's preferred I/O size
    block_size: Option<usize>,
}

impl SparseCopier {
    /// Create a copier that sizes blocks from the destination filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a copier with a fixed block size
    pub fn with_block_size(block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(HoleWalkError::invalid("block size must be greater than zero"));
        }
        Ok(Self {
            block_size: Some(block_size),
        })
    }

    /// Copy `src` to `dst`, recreating zero blocks as holes.
    ///
    /// The destination is created with the source's permission bits, or
    /// truncated if it exists. Its final length always equals the number
    /// of bytes read from the source, even when the copy ends on a skipped
    /// block.
    pub fn copy<P: AsRef<Path>, Q: AsRef<Path>>(&self, src: P, dst: Q) -> Result<SparseCopyResult> {
        let src = src.as_ref();
        let dst = dst.as_ref();
        let start = Instant::now();

        let mut src_file = File::open(src).with_op(Operation::Open, src)?;
        let src_meta = src_file.metadata().with_op(Operation::Stat, src)?;

        let mut dst_file = create_like(dst, &src_meta)?;
        let dst_meta = dst_file.metadata().with_op(Operation::Stat, dst)?;

        let block_size = self.block_size.unwrap_or_else(|| preferred_block_size(&dst_meta));
        let mut block = vec![0u8; block_size];

        let tally = transfer(&mut src_file, &mut dst_file, &mut block, src, dst)?;

        // Skipped blocks only move the position; the length has to be set
        // explicitly or a trailing hole is lost.
        dst_file.set_len(tally.bytes_read).with_op(Operation::Truncate, dst)?;

        debug!(
            "Copied {} -> {}: {} read, {} written, {} holes of {}",
            src.display(),
            dst.display(),
            tally.bytes_read,
            tally.bytes_written,
            tally.holes_skipped,
            block_size
        );

        Ok(SparseCopyResult {
            bytes_read: tally.bytes_read,
            bytes_written: tally.bytes_written,
            holes_skipped: tally.holes_skipped,
            block_size,
            logical_size: tally.bytes_read,
            duration: start.elapsed(),
        })
    }
}

/// Copy `src` to `dst` with a default [`SparseCopier`]
pub fn sparse_copy<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<SparseCopyResult> {
    SparseCopier::new().copy(src, dst)
}

/// Create or truncate `dst` for writing, with the source's mode on creation
fn create_like(dst: &Path, src_meta: &Metadata) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(src_meta.permissions().mode() & 0o7777);
    }
    #[cfg(not(unix))]
    let _ = src_meta;

    options.open(dst).with_op(Operation::Create, dst)
}

/// Preferred I/O size reported for an open file
#[cfg(unix)]
fn preferred_block_size(meta: &Metadata) -> usize {
    match meta.blksize() {
        0 => DEFAULT_BLOCK_SIZE,
        size => size as usize,
    }
}

#[cfg(not(unix))]
fn preferred_block_size(_meta: &Metadata) -> usize {
    DEFAULT_BLOCK_SIZE
}

/// The block loop. Generic over the handles so short reads can be tested.
fn transfer<R: Read, W: Write + Seek>(
    reader: &mut R,
    writer: &mut W,
    block: &mut [u8],
    src: &Path,
    dst: &Path,
) -> Result<Tally> {
    let mut tally = Tally::default();

    loop {
        let filled = fill_block(reader, block).with_op(Operation::Read, src)?;
        if filled == 0 {
            break;
        }
        tally.bytes_read += filled as u64;

        if filled == block.len() && is_zero_block(block) {
            writer
                .seek(SeekFrom::Current(filled as i64))
                .with_op(Operation::Seek, dst)?;
            tally.holes_skipped += 1;
        } else {
            writer.write_all(&block[..filled]).with_op(Operation::Write, dst)?;
            tally.bytes_written += filled as u64;
        }
    }

    Ok(tally)
}

/// Read until `block` is full or the reader is exhausted.
/// A short read is not end of file; only a zero-length read is.
fn fill_block<R: Read>(reader: &mut R, block: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < block.len() {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Check if a block contains only zeros
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Bytes actually allocated on disk for `path`
#[cfg(unix)]
pub fn allocated_bytes<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).with_op(Operation::Stat, path)?;
    // st_blocks is always in 512-byte units
    Ok(metadata.blocks() * 512)
}

/// Bytes actually allocated on disk for `path` (logical size off Unix)
#[cfg(not(unix))]
pub fn allocated_bytes<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path).with_op(Operation::Stat, path)?;
    Ok(metadata.len())
}

/// Check if a file is likely sparse
pub fn is_sparse<P: AsRef<Path>>(path: P) -> Result<bool> {
    let path = path.as_ref();
    let logical_size = std::fs::metadata(path).with_op(Operation::Stat, path)?.len();
    let allocated = allocated_bytes(path)?;

    // File is sparse if allocated blocks < logical size (with some tolerance)
    Ok(allocated < logical_size.saturating_sub(4096))
}
