//! Duplicate a descriptor onto a chosen number with plain `dup`
//!
//! `dup` always hands back the lowest free descriptor, so calling it
//! repeatedly walks upward until the wanted number comes back. The
//! intermediate duplicates are owned and closed when they drop.

use crate::error::{HoleWalkError, IoResultExt, Operation, Result};
use nix::fcntl::{fcntl, FcntlArg};
use nix::unistd::{sysconf, SysconfVar};
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::Path;
use tracing::trace;

/// `try_clone_to_owned` never returns a standard stream number
const FIRST_DUP_FD: RawFd = 3;

/// Is `fd` an open descriptor?
fn is_open(fd: RawFd) -> bool {
    fcntl(fd, FcntlArg::F_GETFD).is_ok()
}

/// Highest descriptor number the process may use, plus one
fn open_max() -> Result<i64> {
    match sysconf(SysconfVar::OPEN_MAX) {
        Ok(Some(limit)) => Ok(limit as i64),
        // No limit reported; fall back to the traditional default
        Ok(None) => Ok(1024),
        Err(errno) => Err(HoleWalkError::io(Operation::Dup, Path::new("<sysconf>"), io::Error::from(errno))),
    }
}

/// Duplicate `fd` so that the copy has descriptor number `target`.
///
/// `target` must be free, below the open-file limit, and different from
/// `fd`; the function never closes a descriptor it did not create.
pub fn dup_to(fd: BorrowedFd<'_>, target: RawFd) -> Result<OwnedFd> {
    let source = fd.as_raw_fd();

    if target < 0 || i64::from(target) >= open_max()? {
        return Err(HoleWalkError::invalid(format!("descriptor {} is out of range", target)));
    }
    if target < FIRST_DUP_FD {
        return Err(HoleWalkError::invalid(format!(
            "descriptor {} is below {}, the lowest number a duplicate can get",
            target, FIRST_DUP_FD
        )));
    }
    if !is_open(source) {
        return Err(HoleWalkError::invalid(format!("descriptor {} is not open", source)));
    }
    if target == source {
        return Err(HoleWalkError::invalid(format!("descriptor {} is the source itself", target)));
    }
    if is_open(target) {
        return Err(HoleWalkError::invalid(format!("descriptor {} is already in use", target)));
    }

    let label = format!("<fd {}>", source);
    let mut intermediates: Vec<OwnedFd> = Vec::new();

    loop {
        let dup = fd.try_clone_to_owned().with_op(Operation::Dup, &label)?;
        let raw = dup.as_raw_fd();

        if raw == target {
            trace!("dup reached {} after {} intermediates", target, intermediates.len());
            return Ok(dup);
        }
        if raw > target {
            // Someone else took the target while we were climbing
            return Err(HoleWalkError::invalid(format!("descriptor {} was taken concurrently", target)));
        }
        intermediates.push(dup);
    }
}

/// Convenience wrapper for anything that owns a descriptor
pub fn dup_fd_to<F: AsFd>(file: &F, target: RawFd) -> Result<OwnedFd> {
    dup_to(file.as_fd(), target)
}
