//! # holewalk - low-level filesystem toolkit
//!
//! A handful of tools that work directly against file I/O semantics:
//!
//! - **Walker**: depth-first traversal that classifies every entry
//!   (regular file, directory, device, FIFO, symlink, socket) and reports
//!   per-entry failures to a visitor instead of aborting
//! - **Sparse copy**: block-by-block copy that turns all-zero blocks into
//!   holes in the destination
//! - **Hole creation**, **buffer relay**, **descriptor duplication** and a
//!   **sync-write probe**
//!
//! ## Quick Start
//!
//! ```no_run
//! use holewalk::fs::{count_tree, sparse_copy, EntryKind, WalkConfig};
//! use std::path::Path;
//!
//! let report = count_tree(Path::new("/usr/share"), WalkConfig::default());
//! println!("{:.2}% regular files", report.counts.percentage(EntryKind::RegularFile));
//!
//! let result = sparse_copy("/var/lib/disk.img", "/backup/disk.img").unwrap();
//! println!("{} holes preserved", result.holes_skipped);
//! ```
//!
//! ## Custom visitors
//!
//! ```no_run
//! use holewalk::fs::{Entry, EntryKind, Flow, Walker};
//! use std::path::Path;
//!
//! let mut first_socket = None;
//! let flow = Walker::default().walk(Path::new("/run"), &mut |entry: &Entry<'_>| {
//!     if entry.kind == EntryKind::Socket {
//!         first_socket = Some(entry.path.to_path_buf());
//!         return Flow::Stop(1);
//!     }
//!     Flow::Continue
//! });
//! assert_eq!(flow.is_stop(), first_socket.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fs;

// Re-export commonly used types
pub use config::{CopyConfig, OutputFormat, WalkSettings};
pub use error::{HoleWalkError, Result};
pub use fs::{sparse_copy, SparseCopier, WalkCounts, Walker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
