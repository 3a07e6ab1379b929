//! `overlay` subcommand: composite a remote overlay onto base tiles.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tokio::runtime::Runtime;

use tilewright::config::DEFAULT_TILE_EXT;
use tilewright::imaging::ImageCompositor;
use tilewright::overlay::OverlayAugmenter;
use tilewright::provider::{OverlayProvider, ReqwestClient, FSTOPO_BASE_URL};
use tilewright::tileset::Tileset;

use crate::commands::common::{report_messages, StageContext};
use crate::error::CliError;

/// Arguments of the `overlay` subcommand.
#[derive(Debug, Args)]
pub struct OverlayArgs {
    /// Root directory of the base tileset
    #[arg(short, long)]
    pub input: PathBuf,

    /// Overlay tile service root (expects <root>/<z>/<y>/<x>)
    #[arg(long, default_value = FSTOPO_BASE_URL)]
    pub url: String,

    /// Request timeout in seconds for overlay fetches
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Tile file extension
    #[arg(long, default_value = DEFAULT_TILE_EXT)]
    pub ext: String,
}

/// Fetches, caches and composites the overlay for every base tile.
pub fn run(args: OverlayArgs, runtime: &Runtime, ctx: &StageContext) -> Result<(), CliError> {
    let tiles = Tileset::open(&args.input, args.ext.as_str()).map_err(CliError::Tileset)?;
    let jobs = tiles.tile_paths().map_err(CliError::Tileset)?;

    let client = ReqwestClient::with_timeout(args.timeout)
        .map_err(|e| CliError::HttpClient(e.to_string()))?;
    let augmenter = OverlayAugmenter::new(
        OverlayProvider::with_base_url(client, args.url),
        Arc::new(ImageCompositor::new()),
    );

    let messages = runtime.block_on(augmenter.run(&ctx.pool, jobs, ctx.shutdown.clone()));

    report_messages("overlay", &messages);
    Ok(())
}
