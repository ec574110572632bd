//! File system operations module
//!
//! Directory walking with entry classification, sparse-aware copying,
//! and the small low-level I/O utilities built around them.

pub mod hole;
pub mod relay;
pub mod sparse;
pub mod sync_probe;
pub mod walker;

#[cfg(unix)]
pub mod descriptor;

pub use hole::{create_file_with_hole, HoleSpec};
pub use relay::{relay, DEFAULT_RELAY_BUFFER};
pub use sparse::{allocated_bytes, is_sparse, sparse_copy, SparseCopier, SparseCopyResult};
pub use sync_probe::{probe_sync_writes, SyncMode, SyncSample};
pub use walker::{count_tree, Entry, EntryKind, Flow, TypeCounter, Visitor, WalkConfig, WalkCounts, WalkReport, Walker};

#[cfg(unix)]
pub use descriptor::{dup_fd_to, dup_to};
#[cfg(unix)]
pub use relay::enable_sync_writes;
