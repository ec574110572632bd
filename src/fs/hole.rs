//! Create a file with a hole
//!
//! Writes a short head, seeks well past the end, and writes a tail. The
//! range in between is never written, so on most filesystems it takes no
//! space and reads back as zeros.

use crate::error::{HoleWalkError, IoResultExt, Operation, Result};
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tracing::debug;

/// Layout of a file with one hole
#[derive(Debug, Clone)]
pub struct HoleSpec {
    /// Bytes written at offset 0
    pub head: Vec<u8>,
    /// Absolute offset of the tail
    pub offset: u64,
    /// Bytes written at `offset`
    pub tail: Vec<u8>,
    /// Fail if the file already exists
    pub exclusive: bool,
}

impl Default for HoleSpec {
    fn default() -> Self {
        Self {
            head: b"abcdefghij".to_vec(),
            offset: 16384,
            tail: b"ABCDEFGHIJ".to_vec(),
            exclusive: false,
        }
    }
}

impl HoleSpec {
    /// Final length of a file built from this layout
    pub fn len(&self) -> u64 {
        self.offset + self.tail.len() as u64
    }

    /// Is the resulting file empty?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Create `path` following `spec` and return the resulting length
pub fn create_file_with_hole<P: AsRef<Path>>(path: P, spec: &HoleSpec) -> Result<u64> {
    let path = path.as_ref();

    if spec.offset < spec.head.len() as u64 {
        return Err(HoleWalkError::invalid(format!(
            "hole offset {} overlaps the {}-byte head",
            spec.offset,
            spec.head.len()
        )));
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if spec.exclusive {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path).with_op(Operation::Create, path)?;

    file.write_all(&spec.head).with_op(Operation::Write, path)?;
    file.seek(SeekFrom::Start(spec.offset)).with_op(Operation::Seek, path)?;
    file.write_all(&spec.tail).with_op(Operation::Write, path)?;

    debug!("Created {} with a hole at {}..{}", path.display(), spec.head.len(), spec.offset);
    Ok(spec.len())
}
