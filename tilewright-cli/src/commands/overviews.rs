//! `overviews` subcommand: build overview levels.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tokio::runtime::Runtime;

use tilewright::config::{DEFAULT_LEAF_ZOOM, DEFAULT_TILE_EXT};
use tilewright::imaging::ImageCompositor;
use tilewright::overview::OverviewBuilder;
use tilewright::tileset::Tileset;

use crate::commands::common::{report_messages, StageContext};
use crate::error::CliError;

/// Arguments of the `overviews` subcommand.
#[derive(Debug, Args)]
pub struct OverviewsArgs {
    /// Root directory of the tileset
    #[arg(short, long)]
    pub input: PathBuf,

    /// Deepest zoom level; its tiles feed the first overview level
    #[arg(long, default_value_t = DEFAULT_LEAF_ZOOM)]
    pub max_zoom: u8,

    /// Shallowest overview level to build
    #[arg(long, default_value_t = 8)]
    pub min_zoom: u8,

    /// Tile file extension
    #[arg(long, default_value = DEFAULT_TILE_EXT)]
    pub ext: String,
}

/// Builds every overview level from `max_zoom - 1` down to `min_zoom`.
pub fn run(args: OverviewsArgs, runtime: &Runtime, ctx: &StageContext) -> Result<(), CliError> {
    let tiles = Tileset::open(&args.input, args.ext.as_str()).map_err(CliError::Tileset)?;
    let builder = OverviewBuilder::new(tiles, Arc::new(ImageCompositor::new()));

    let messages = runtime
        .block_on(builder.build_levels(&ctx.pool, args.max_zoom, args.min_zoom, &ctx.shutdown))
        .map_err(CliError::Overviews)?;

    report_messages("overviews", &messages);
    Ok(())
}
