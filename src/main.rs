//! holewalk CLI - low-level filesystem toolkit

use clap::Parser;
use holewalk::config::{CliArgs, Commands, CopyConfig, OutputFormat, WalkSettings};
use holewalk::error::{HoleWalkError, Result};
use holewalk::fs::{self, HoleSpec, SparseCopier, WalkCounts};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle result
    match run(&args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Run the selected subcommand and return the process exit code
fn run(args: &CliArgs) -> Result<i32> {
    match &args.command {
        Commands::Walk { .. } => {
            let settings = WalkSettings::from_cli(&args.command).map_err(HoleWalkError::InvalidArgument)?;
            cmd_walk(&settings)
        }
        Commands::Copy { .. } => {
            let config = CopyConfig::from_cli(&args.command).map_err(HoleWalkError::InvalidArgument)?;
            cmd_copy(&config, args.quiet)
        }
        Commands::Hole { path, offset, exclusive } => cmd_hole(path, *offset, *exclusive, args.quiet),
        Commands::Relay { sync, buffer_size } => cmd_relay(*sync, buffer_size),
        Commands::Dup { file, fd } => cmd_dup(file, *fd),
        Commands::SyncProbe { file, pause_ms } => cmd_sync_probe(file, *pause_ms),
    }
}

#[derive(Serialize)]
struct JsonWalkReport<'a> {
    root: &'a Path,
    status: i32,
    total: u64,
    counts: &'a WalkCounts,
    percentages: Vec<(&'static str, f64)>,
}

fn cmd_walk(settings: &WalkSettings) -> Result<i32> {
    let report = fs::count_tree(&settings.root, settings.walk.clone());

    match settings.format {
        OutputFormat::Text => report.counts.print_summary(),
        OutputFormat::Json => {
            let json = JsonWalkReport {
                root: &settings.root,
                status: report.status,
                total: report.counts.total(),
                counts: &report.counts,
                percentages: fs::EntryKind::COUNTED
                    .iter()
                    .map(|kind| (kind.label(), report.counts.percentage(*kind)))
                    .collect(),
            };
            let text = serde_json::to_string_pretty(&json)
                .map_err(|e| HoleWalkError::invalid(format!("cannot serialize report: {}", e)))?;
            println!("{}", text);
        }
    }

    Ok(report.status)
}

fn cmd_copy(config: &CopyConfig, quiet: bool) -> Result<i32> {
    let copier = match config.block_size {
        Some(size) => SparseCopier::with_block_size(size)?,
        None => SparseCopier::new(),
    };

    let result = copier.copy(&config.source, &config.destination)?;

    if !quiet {
        result.print_summary();
        if let Ok(allocated) = fs::allocated_bytes(&config.destination) {
            println!("Allocated:    {}", humansize::format_size(allocated, humansize::BINARY));
        }
    }

    Ok(0)
}

fn cmd_hole(path: &Path, offset: u64, exclusive: bool, quiet: bool) -> Result<i32> {
    let spec = HoleSpec {
        offset,
        exclusive,
        ..Default::default()
    };
    let len = fs::create_file_with_hole(path, &spec)?;

    if !quiet {
        println!("{}: {} bytes, sparse: {}", path.display(), len, fs::is_sparse(path)?);
    }
    Ok(0)
}

fn cmd_relay(sync: bool, buffer_size: &str) -> Result<i32> {
    let buffer_size = holewalk::config::parse_size(buffer_size)
        .map_err(|e| HoleWalkError::invalid(format!("Invalid buffer size: {}", e)))? as usize;

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();

    if sync {
        #[cfg(unix)]
        fs::enable_sync_writes(&stdout, Path::new("<stdout>"))?;
        #[cfg(not(unix))]
        tracing::warn!("synchronous writes are not supported on this platform");
    }

    let total = fs::relay(&mut stdin.lock(), &mut stdout.lock(), buffer_size)?;
    tracing::info!("Relayed {} bytes", total);
    Ok(0)
}

#[cfg(unix)]
fn cmd_dup(file: &Path, fd: i32) -> Result<i32> {
    use holewalk::error::{IoResultExt, Operation};
    use std::os::fd::AsRawFd;

    let opened = std::fs::File::open(file).with_op(Operation::Open, file)?;
    let dup = fs::dup_fd_to(&opened, fd)?;
    println!("{}", dup.as_raw_fd());
    Ok(0)
}

#[cfg(not(unix))]
fn cmd_dup(_file: &Path, _fd: i32) -> Result<i32> {
    Err(HoleWalkError::invalid("descriptor duplication needs a Unix platform"))
}

fn cmd_sync_probe(file: &Path, pause_ms: u64) -> Result<i32> {
    let samples = fs::probe_sync_writes(file, b"helloworld\n", Duration::from_millis(pause_ms))?;

    for sample in samples {
        println!(
            "{:<9} wrote {} bytes, mtime after write {}, after close {}",
            format!("{:?}", sample.mode),
            sample.bytes_written,
            sample.mtime_after_write.format("%H:%M:%S%.6f"),
            sample.mtime_after_close.format("%H:%M:%S%.6f")
        );
    }
    Ok(0)
}
