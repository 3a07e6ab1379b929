//! Tilewright CLI - command-line interface
//!
//! This binary drives the tile pyramid maintenance stages from the command
//! line: one subcommand per stage, a shared worker pool width and an
//! explicit verbosity level.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use tilewright::config::{Verbosity, DEFAULT_WORKERS};
use tilewright::logging::{self, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};
use tilewright::pool::WorkerPool;

use crate::commands::common::StageContext;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "tilewright")]
#[command(version = tilewright::VERSION)]
#[command(about = "Maintain raster map tile pyramids", long_about = None)]
struct Cli {
    /// Number of concurrent jobs being processed
    #[arg(short = 't', long, global = true, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Verbosity level: 0 errors, 1 warnings, 2 progress info, 3 debug
    #[arg(short = 'v', long, global = true, default_value_t = 1)]
    verbosity: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build overview levels by downsampling child tiles
    Overviews(commands::overviews::OverviewsArgs),
    /// Trim blank border regions off tilesets
    Trim(commands::trim::TrimArgs),
    /// Merge several source tilesets into one output tileset
    Merge(commands::merge::MergeArgs),
    /// Composite a remote overlay layer onto base tiles
    Overlay(commands::overlay::OverlayArgs),
    /// Tile source rasters into XYZ trees via GDAL
    Ingest(commands::ingest::IngestArgs),
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = match logging::init_logging(
        Verbosity::from_level(cli.verbosity),
        DEFAULT_LOG_DIR,
        DEFAULT_LOG_FILE,
    ) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            eprintln!("interrupt received, finishing in-flight jobs");
            shutdown.cancel();
        }) {
            CliError::Runtime(format!("failed to install interrupt handler: {e}")).exit();
        }
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => CliError::Runtime(e.to_string()).exit(),
    };

    let pool = match WorkerPool::new(cli.workers) {
        Ok(pool) => pool,
        Err(e) => CliError::Pool(e).exit(),
    };
    info!(workers = pool.width(), "starting run");

    let ctx = StageContext { pool, shutdown };
    let result = match cli.command {
        Command::Overviews(args) => commands::overviews::run(args, &runtime, &ctx),
        Command::Trim(args) => commands::trim::run(args, &runtime, &ctx),
        Command::Merge(args) => commands::merge::run(args, &runtime, &ctx),
        Command::Overlay(args) => commands::overlay::run(args, &runtime, &ctx),
        Command::Ingest(args) => commands::ingest::run(args, &ctx),
    };

    if let Err(e) = result {
        e.exit();
    }
}
