//! Configuration settings for holewalk
//!
//! Defines the CLI arguments, subcommands and the runtime configuration
//! structs built from them.

use crate::fs::WalkConfig;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// holewalk - low-level filesystem toolkit
#[derive(Parser, Debug, Clone)]
#[command(name = "holewalk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Walk trees, copy sparse files, poke at raw file I/O")]
#[command(long_about = r#"
holewalk groups a few small tools that exercise file I/O directly.

Examples:
  holewalk walk /usr/share                 # Count entries by type
  holewalk walk /etc --format json         # Same, as JSON
  holewalk copy disk.img backup.img        # Copy, keeping zero blocks as holes
  holewalk hole file.hole                  # Create a file with a 16 KiB hole
  holewalk relay --sync < in > out         # Relay stdin to stdout
"#)]
pub struct CliArgs {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl CliArgs {
    /// Default log filter for the requested verbosity
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Walk a tree and count entries by type
    #[command(name = "walk")]
    Walk {
        /// Starting path
        path: PathBuf,
        /// Output format for the report
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
        /// Do not list directories deeper than this
        #[arg(long, value_name = "DEPTH")]
        max_depth: Option<usize>,
        /// Visit entries in directory listing order
        #[arg(long)]
        unsorted: bool,
    },

    /// Copy a file, recreating zero blocks as holes
    #[command(name = "copy")]
    Copy {
        /// Source file
        source: PathBuf,
        /// Destination file (created or truncated)
        destination: PathBuf,
        /// Fixed block size (e.g., 4K); default is the destination's I/O size
        #[arg(short = 'b', long, value_name = "SIZE")]
        block_size: Option<String>,
    },

    /// Create a file with a hole in the middle
    #[command(name = "hole")]
    Hole {
        /// File to create
        path: PathBuf,
        /// Offset of the data after the hole
        #[arg(long, default_value = "16384", value_name = "OFFSET")]
        offset: u64,
        /// Fail if the file already exists
        #[arg(long)]
        exclusive: bool,
    },

    /// Relay standard input to standard output
    #[command(name = "relay")]
    Relay {
        /// Put standard output into synchronous-write mode first
        #[arg(long)]
        sync: bool,
        /// Relay buffer size (e.g., 4K)
        #[arg(short = 'b', long, default_value = "4K", value_name = "SIZE")]
        buffer_size: String,
    },

    /// Duplicate an open file onto a specific descriptor number
    #[command(name = "dup")]
    Dup {
        /// File to open read-only
        file: PathBuf,
        /// Wanted descriptor number
        #[arg(default_value = "100")]
        fd: i32,
    },

    /// Append with plain, O_SYNC and O_DSYNC writes and show mtimes
    #[command(name = "sync-probe")]
    SyncProbe {
        /// File to write (created or truncated)
        #[arg(default_value = "./sample.txt")]
        file: PathBuf,
        /// Pause between rounds in milliseconds
        #[arg(long, default_value = "1000", value_name = "MS")]
        pause_ms: u64,
    },
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration for the `walk` command
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalkSettings {
    /// Starting path
    pub root: PathBuf,
    /// Report format
    pub format: OutputFormat,
    /// Walker options
    pub walk: WalkConfig,
}

impl WalkSettings {
    /// Create settings from the `walk` subcommand
    pub fn from_cli(command: &Commands) -> Result<Self, String> {
        match command {
            Commands::Walk {
                path,
                format,
                max_depth,
                unsorted,
            } => Ok(Self {
                root: path.clone(),
                format: *format,
                walk: WalkConfig {
                    max_depth: *max_depth,
                    sorted: !*unsorted,
                },
            }),
            _ => Err("not a walk command".to_string()),
        }
    }
}

/// Runtime configuration for the `copy` command
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CopyConfig {
    /// Source path
    pub source: PathBuf,
    /// Destination path
    pub destination: PathBuf,
    /// Fixed block size in bytes (None = destination's preferred size)
    pub block_size: Option<usize>,
}

impl CopyConfig {
    /// Create config from the `copy` subcommand
    pub fn from_cli(command: &Commands) -> Result<Self, String> {
        match command {
            Commands::Copy {
                source,
                destination,
                block_size,
            } => {
                let block_size = block_size
                    .as_deref()
                    .map(parse_size)
                    .transpose()
                    .map_err(|e| format!("Invalid block size: {}", e))?
                    .map(|size| size as usize);

                Ok(Self {
                    source: source.clone(),
                    destination: destination.clone(),
                    block_size,
                })
            }
            _ => Err("not a copy command".to_string()),
        }
    }
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(['G', 'B']), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(['M', 'B']), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(['K', 'B']), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("Size too large: {}", size))
}
