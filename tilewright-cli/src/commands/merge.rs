//! `merge` subcommand: merge source tilesets.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tokio::runtime::Runtime;

use tilewright::config::DEFAULT_TILE_EXT;
use tilewright::imaging::ImageCompositor;
use tilewright::merge::{SourceIndex, TilesetMerger};
use tilewright::tileset::Tileset;

use crate::commands::common::{report_messages, StageContext};
use crate::error::CliError;

/// Arguments of the `merge` subcommand.
#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Source tileset roots; their order decides blending order
    #[arg(short, long, required = true, num_args = 1..)]
    pub sources: Vec<PathBuf>,

    /// Output tileset root
    #[arg(short, long)]
    pub output: PathBuf,

    /// Tile file extension
    #[arg(long, default_value = DEFAULT_TILE_EXT)]
    pub ext: String,
}

/// Merges every coordinate present in any source into the output tree.
pub fn run(args: MergeArgs, runtime: &Runtime, ctx: &StageContext) -> Result<(), CliError> {
    let index = SourceIndex::build(&args.sources, &args.ext).map_err(CliError::Merge)?;
    let merger = TilesetMerger::new(
        Arc::new(index),
        Tileset::new(&args.output, args.ext.as_str()),
        Arc::new(ImageCompositor::new()),
    );

    let messages = runtime.block_on(merger.run(&ctx.pool, ctx.shutdown.clone()));

    report_messages("merge", &messages);
    Ok(())
}
