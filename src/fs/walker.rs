//! Recursive directory walker with entry classification
//!
//! Depth-first, pre-order traversal. Every entry is classified from its
//! `lstat` metadata and handed to a [`Visitor`]; failures to stat an entry
//! or to list a directory are classified too and go to the visitor instead
//! of aborting the walk. The visitor decides whether to keep going.
//!
//! Children are addressed by joining their name onto the parent's path, so
//! the walker never touches the process working directory and several
//! walks can run at once.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{FileType, Metadata};
use std::io;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Classification of a single filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file
    RegularFile,
    /// Directory
    Directory,
    /// Block special device
    BlockDevice,
    /// Character special device
    CharDevice,
    /// Named pipe
    Fifo,
    /// Symbolic link (never followed)
    SymbolicLink,
    /// Unix domain socket
    Socket,
    /// Directory whose listing could not be read
    UnreadableDirectory,
    /// Entry whose metadata could not be read
    StatFailed,
}

impl EntryKind {
    /// The seven classifications that carry a counter, in report order
    pub const COUNTED: [EntryKind; 7] = [
        EntryKind::RegularFile,
        EntryKind::Directory,
        EntryKind::BlockDevice,
        EntryKind::CharDevice,
        EntryKind::Fifo,
        EntryKind::SymbolicLink,
        EntryKind::Socket,
    ];

    /// Classify by file type bits
    pub fn from_file_type(file_type: FileType) -> Self {
        if file_type.is_dir() {
            return Self::Directory;
        }
        if file_type.is_symlink() {
            return Self::SymbolicLink;
        }
        if file_type.is_file() {
            return Self::RegularFile;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;

            if file_type.is_block_device() {
                return Self::BlockDevice;
            }
            if file_type.is_char_device() {
                return Self::CharDevice;
            }
            if file_type.is_fifo() {
                return Self::Fifo;
            }
            if file_type.is_socket() {
                return Self::Socket;
            }
        }

        // Nothing else exists on the platforms we build for; count it as a
        // regular file rather than dropping it.
        Self::RegularFile
    }

    /// Is this a failure classification?
    pub fn is_error(&self) -> bool {
        matches!(self, Self::UnreadableDirectory | Self::StatFailed)
    }

    /// Label used in the text report
    pub fn label(&self) -> &'static str {
        match self {
            Self::RegularFile => "regular files",
            Self::Directory => "directories",
            Self::BlockDevice => "block special",
            Self::CharDevice => "char special",
            Self::Fifo => "FIFOs",
            Self::SymbolicLink => "symbolic links",
            Self::Socket => "sockets",
            Self::UnreadableDirectory => "unreadable directories",
            Self::StatFailed => "stat failures",
        }
    }
}

/// Visitor decision after seeing an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep walking
    Continue,
    /// Stop the whole walk with this (non-zero) status code
    Stop(i32),
}

impl Flow {
    /// Process exit code for this outcome
    pub fn code(&self) -> i32 {
        match self {
            Self::Continue => 0,
            Self::Stop(code) => *code,
        }
    }

    /// Did the visitor ask to stop?
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

/// An entry as seen by a [`Visitor`]
#[derive(Debug)]
pub struct Entry<'a> {
    /// Full path of the entry (root joined with every name below it)
    pub path: &'a Path,
    /// `lstat` metadata; `None` only for `StatFailed`
    pub metadata: Option<&'a Metadata>,
    /// Classification
    pub kind: EntryKind,
    /// The error behind a failure classification
    pub error: Option<&'a io::Error>,
    /// Distance from the root (root is 0)
    pub depth: usize,
}

/// Receives every entry of a walk
pub trait Visitor {
    /// Inspect an entry and decide whether the walk continues
    fn visit(&mut self, entry: &Entry<'_>) -> Flow;
}

impl<F> Visitor for F
where
    F: FnMut(&Entry<'_>) -> Flow,
{
    fn visit(&mut self, entry: &Entry<'_>) -> Flow {
        self(entry)
    }
}

/// Configuration for a walk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Maximum depth to list (None = unlimited). Directories at the limit
    /// are still visited, just not listed.
    pub max_depth: Option<usize>,
    /// Visit children in name order instead of listing order
    pub sorted: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            sorted: true,
        }
    }
}

/// Depth-first directory walker
#[derive(Debug, Clone, Default)]
pub struct Walker {
    config: WalkConfig,
}

impl Walker {
    /// Create a walker with the given configuration
    pub fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    /// Walk the tree rooted at `root`, handing every entry to `visitor`.
    ///
    /// Returns `Flow::Continue` when every entry was visited, or the first
    /// `Flow::Stop` the visitor returned.
    pub fn walk<V: Visitor + ?Sized>(&self, root: &Path, visitor: &mut V) -> Flow {
        debug!("Walking {}", root.display());
        self.walk_path(root, 0, visitor)
    }

    fn walk_path<V: Visitor + ?Sized>(&self, path: &Path, depth: usize, visitor: &mut V) -> Flow {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(err) => {
                return visitor.visit(&Entry {
                    path,
                    metadata: None,
                    kind: EntryKind::StatFailed,
                    error: Some(&err),
                    depth,
                });
            }
        };

        let kind = EntryKind::from_file_type(metadata.file_type());
        let flow = visitor.visit(&Entry {
            path,
            metadata: Some(&metadata),
            kind,
            error: None,
            depth,
        });
        if kind != EntryKind::Directory || flow.is_stop() {
            return flow;
        }

        if self.config.max_depth.is_some_and(|max| depth >= max) {
            trace!("Not listing {} (depth limit)", path.display());
            return Flow::Continue;
        }

        let names = match self.list_names(path) {
            Ok(names) => names,
            Err(err) => {
                return visitor.visit(&Entry {
                    path,
                    metadata: Some(&metadata),
                    kind: EntryKind::UnreadableDirectory,
                    error: Some(&err),
                    depth,
                });
            }
        };

        for name in names {
            let flow = self.walk_path(&path.join(&name), depth + 1, visitor);
            if flow.is_stop() {
                return flow;
            }
        }

        Flow::Continue
    }

    /// Read a directory listing. `read_dir` already leaves out `.` and `..`.
    fn list_names(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let mut names = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.file_name()))
            .collect::<io::Result<Vec<_>>>()?;

        if self.config.sorted {
            names.sort();
        }
        Ok(names)
    }
}

/// Aggregate counts from a walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkCounts {
    /// Regular files
    pub regular_files: u64,
    /// Directories (root included)
    pub directories: u64,
    /// Block special devices
    pub block_devices: u64,
    /// Character special devices
    pub char_devices: u64,
    /// FIFOs
    pub fifos: u64,
    /// Symbolic links
    pub symlinks: u64,
    /// Sockets
    pub sockets: u64,
    /// Directories that could not be listed (not part of the total)
    pub unreadable_dirs: u64,
    /// Entries that could not be stat'd (not part of the total)
    pub stat_failures: u64,
}

impl WalkCounts {
    /// Count one entry of the given kind
    pub fn record(&mut self, kind: EntryKind) {
        *self.slot(kind) += 1;
    }

    /// Count for one classification
    pub fn get(&self, kind: EntryKind) -> u64 {
        match kind {
            EntryKind::RegularFile => self.regular_files,
            EntryKind::Directory => self.directories,
            EntryKind::BlockDevice => self.block_devices,
            EntryKind::CharDevice => self.char_devices,
            EntryKind::Fifo => self.fifos,
            EntryKind::SymbolicLink => self.symlinks,
            EntryKind::Socket => self.sockets,
            EntryKind::UnreadableDirectory => self.unreadable_dirs,
            EntryKind::StatFailed => self.stat_failures,
        }
    }

    fn slot(&mut self, kind: EntryKind) -> &mut u64 {
        match kind {
            EntryKind::RegularFile => &mut self.regular_files,
            EntryKind::Directory => &mut self.directories,
            EntryKind::BlockDevice => &mut self.block_devices,
            EntryKind::CharDevice => &mut self.char_devices,
            EntryKind::Fifo => &mut self.fifos,
            EntryKind::SymbolicLink => &mut self.symlinks,
            EntryKind::Socket => &mut self.sockets,
            EntryKind::UnreadableDirectory => &mut self.unreadable_dirs,
            EntryKind::StatFailed => &mut self.stat_failures,
        }
    }

    /// Sum of the seven classified counters
    pub fn total(&self) -> u64 {
        EntryKind::COUNTED.iter().map(|kind| self.get(*kind)).sum()
    }

    /// Number of error classifications seen
    pub fn errors(&self) -> u64 {
        self.unreadable_dirs + self.stat_failures
    }

    /// Share of the total for one classification, in percent.
    /// An empty total is treated as one.
    pub fn percentage(&self, kind: EntryKind) -> f64 {
        self.get(kind) as f64 * 100.0 / self.total().max(1) as f64
    }

    /// Report lines, one per classified category
    pub fn report_lines(&self) -> Vec<String> {
        EntryKind::COUNTED
            .iter()
            .map(|kind| {
                format!(
                    "{} = {:7}, {:5.2}%",
                    kind.label(),
                    self.get(*kind),
                    self.percentage(*kind)
                )
            })
            .collect()
    }

    /// Print the report to stdout
    pub fn print_summary(&self) {
        for line in self.report_lines() {
            println!("{}", line);
        }
    }
}

/// Visitor that tallies classifications and logs per-entry failures
#[derive(Debug, Default)]
pub struct TypeCounter {
    counts: WalkCounts,
}

impl TypeCounter {
    /// Create an empty counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts so far
    pub fn counts(&self) -> &WalkCounts {
        &self.counts
    }

    /// Consume the counter and return its counts
    pub fn into_counts(self) -> WalkCounts {
        self.counts
    }
}

impl Visitor for TypeCounter {
    fn visit(&mut self, entry: &Entry<'_>) -> Flow {
        self.counts.record(entry.kind);

        match (entry.kind, entry.error) {
            (EntryKind::UnreadableDirectory, Some(err)) => {
                warn!("can't read directory {}: {}", entry.path.display(), err);
            }
            (EntryKind::StatFailed, Some(err)) => {
                warn!("stat error for {}: {}", entry.path.display(), err);
            }
            (kind, _) => {
                trace!("{:?} {}", kind, entry.path.display());
            }
        }

        Flow::Continue
    }
}

/// Result of [`count_tree`]
#[derive(Debug, Clone, Serialize)]
pub struct WalkReport {
    /// Aggregate counts
    pub counts: WalkCounts,
    /// Exit status of the walk (0 = ran to completion)
    pub status: i32,
}

/// Walk `root` with a [`TypeCounter`] and return its counts
pub fn count_tree(root: &Path, config: WalkConfig) -> WalkReport {
    let mut counter = TypeCounter::new();
    let flow = Walker::new(config).walk(root, &mut counter);
    WalkReport {
        counts: counter.into_counts(),
        status: flow.code(),
    }
}
