//! `ingest` subcommand: tile source rasters via GDAL.

use std::path::PathBuf;

use clap::Args;

use tilewright::config::DEFAULT_LEAF_ZOOM;
use tilewright::raster::RasterIngestor;

use crate::commands::common::{report_messages, StageContext};
use crate::error::CliError;

/// Arguments of the `ingest` subcommand.
#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Directory scanned recursively for *.tif source rasters
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory; each raster tiles into a numbered subtree
    #[arg(short, long)]
    pub output: PathBuf,

    /// Zoom level to generate
    #[arg(long, default_value_t = DEFAULT_LEAF_ZOOM)]
    pub zoom: u8,
}

/// Converts and tiles every source raster found under the input directory.
///
/// The GDAL tools parallelize internally, so the pool width is forwarded as
/// their process count rather than running sources concurrently.
pub fn run(args: IngestArgs, ctx: &StageContext) -> Result<(), CliError> {
    let ingestor = RasterIngestor::new(args.zoom, ctx.pool.width()).map_err(CliError::Ingest)?;
    let messages = ingestor
        .ingest(&args.input, &args.output)
        .map_err(CliError::Ingest)?;

    report_messages("ingest", &messages);
    Ok(())
}
