//! Error types for holewalk
//!
//! Every I/O failure carries the operation that failed and the path it
//! was applied to, so the CLI can print one line that says both.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The filesystem operation that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Opening an existing file
    Open,
    /// Creating or truncating a file
    Create,
    /// Querying metadata
    Stat,
    /// Reading file data
    Read,
    /// Writing file data
    Write,
    /// Moving the file position
    Seek,
    /// Setting the file length
    Truncate,
    /// Listing a directory
    ReadDir,
    /// Querying or changing descriptor flags
    Fcntl,
    /// Duplicating a descriptor
    Dup,
}

impl Operation {
    /// Short lowercase name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Create => "create",
            Self::Stat => "stat",
            Self::Read => "read",
            Self::Write => "write",
            Self::Seek => "seek",
            Self::Truncate => "truncate",
            Self::ReadDir => "read directory",
            Self::Fcntl => "fcntl",
            Self::Dup => "dup",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main error type for holewalk operations
#[derive(Error, Debug)]
pub enum HoleWalkError {
    /// File or directory not found
    #[error("{op} failed, path not found: {}", path.display())]
    NotFound { op: Operation, path: PathBuf },

    /// Permission denied
    #[error("{op} failed, permission denied: {}", path.display())]
    PermissionDenied { op: Operation, path: PathBuf },

    /// A path component that had to be a directory was not one
    #[error("{op} failed, not a directory: {}", path.display())]
    NotADirectory { op: Operation, path: PathBuf },

    /// Any other I/O error
    #[error("{op} failed at '{}': {source}", path.display())]
    Io {
        op: Operation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Caller supplied a value the operation cannot work with
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl HoleWalkError {
    /// Classify an I/O error for `op` on `path`
    pub fn io(op: Operation, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { op, path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { op, path },
            _ if source.raw_os_error() == Some(libc::ENOTDIR) => Self::NotADirectory { op, path },
            _ => Self::Io { op, path, source },
        }
    }

    /// Create an invalid argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// The operation that failed, if this is an I/O error
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::NotFound { op, .. }
            | Self::PermissionDenied { op, .. }
            | Self::NotADirectory { op, .. }
            | Self::Io { op, .. } => Some(*op),
            Self::InvalidArgument(_) => None,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::NotADirectory { path, .. }
            | Self::Io { path, .. } => Some(path),
            Self::InvalidArgument(_) => None,
        }
    }
}

/// Result type alias for holewalk operations
pub type Result<T> = std::result::Result<T, HoleWalkError>;

/// Extension trait for adding operation and path context to `std::io::Result`
pub trait IoResultExt<T> {
    /// Attach the failing operation and its path
    fn with_op(self, op: Operation, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_op(self, op: Operation, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| HoleWalkError::io(op, path, e))
    }
}
