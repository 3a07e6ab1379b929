//! `trim` subcommand: trim blank tileset borders.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tokio::runtime::Runtime;

use tilewright::config::{DEFAULT_LEAF_ZOOM, DEFAULT_TILE_EXT};
use tilewright::imaging::ImageCompositor;
use tilewright::trim::trim_tilesets;

use crate::commands::common::{report_messages, StageContext};
use crate::error::CliError;

/// Arguments of the `trim` subcommand.
#[derive(Debug, Args)]
pub struct TrimArgs {
    /// Tileset root directories to trim, one pool job each
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Reference zoom level holding the leaf tiles
    #[arg(long, default_value_t = DEFAULT_LEAF_ZOOM)]
    pub zoom: u8,

    /// Tile file extension
    #[arg(long, default_value = DEFAULT_TILE_EXT)]
    pub ext: String,
}

/// Trims every given tileset root concurrently.
pub fn run(args: TrimArgs, runtime: &Runtime, ctx: &StageContext) -> Result<(), CliError> {
    let messages = runtime.block_on(trim_tilesets(
        &ctx.pool,
        args.input,
        Arc::new(ImageCompositor::new()),
        args.zoom,
        args.ext,
        ctx.shutdown.clone(),
    ));

    report_messages("trim", &messages);
    Ok(())
}
