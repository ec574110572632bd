//! Buffer relay between two streams
//!
//! Plain read/write loop through one fixed buffer. With synchronous
//! writes turned on for the output, every write waits for the device,
//! which makes the cost of `O_SYNC` directly visible.

use crate::error::{HoleWalkError, IoResultExt, Operation, Result};
use std::io::{self, Read, Write};
use std::path::Path;

/// Default relay buffer, one page
pub const DEFAULT_RELAY_BUFFER: usize = 4096;

/// Copy everything from `reader` to `writer` through a `buffer_size` buffer.
/// Returns the number of bytes relayed.
pub fn relay<R: Read, W: Write>(reader: &mut R, writer: &mut W, buffer_size: usize) -> Result<u64> {
    if buffer_size == 0 {
        return Err(HoleWalkError::invalid("relay buffer size must be greater than zero"));
    }

    let mut buffer = vec![0u8; buffer_size];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(HoleWalkError::io(Operation::Read, "<input>", e)),
        };
        writer.write_all(&buffer[..n]).with_op(Operation::Write, "<output>")?;
        total += n as u64;
    }

    writer.flush().with_op(Operation::Write, "<output>")?;
    Ok(total)
}

/// Turn on `O_SYNC` for an open descriptor, keeping its other status flags.
///
/// Linux accepts the call but ignores `O_SYNC` in `F_SETFL`; open with
/// `custom_flags` there when the flag has to stick.
#[cfg(unix)]
pub fn enable_sync_writes<F: std::os::fd::AsRawFd>(fd: &F, label: &Path) -> Result<()> {
    use nix::fcntl::{fcntl, FcntlArg, OFlag};

    let raw = fd.as_raw_fd();
    let current = fcntl(raw, FcntlArg::F_GETFL)
        .map_err(io::Error::from)
        .with_op(Operation::Fcntl, label)?;
    let flags = OFlag::from_bits_truncate(current) | OFlag::O_SYNC;
    fcntl(raw, FcntlArg::F_SETFL(flags))
        .map_err(io::Error::from)
        .with_op(Operation::Fcntl, label)?;
    Ok(())
}
