//! Source raster ingestion.
//!
//! Upstream of the pyramid algorithms, source rasters (GeoTIFFs) are turned
//! into XYZ tile trees by the external GDAL tools: `gdal_translate` expands
//! each raster into an RGBA VRT, then `gdal2tiles.py` cuts the VRT into
//! tiles at the requested zoom level. Both run as subprocesses; this module
//! treats them as an opaque batch step and only shepherds inputs, outputs
//! and failures.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::ResultMessage;

/// Errors that can occur during raster ingestion.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The ingestor was configured without any worker process.
    #[error("ingestion requires at least one process")]
    NoProcesses,

    /// Enumeration pattern could not be built.
    #[error("glob error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// The tool could not be spawned (typically: not installed).
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    /// The tool ran and reported failure.
    #[error("{tool} failed with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Converts source rasters into XYZ tile trees via GDAL.
#[derive(Debug, Clone)]
pub struct RasterIngestor {
    zoom: u8,
    processes: usize,
}

impl RasterIngestor {
    /// Creates an ingestor tiling at `zoom` with `processes` GDAL workers.
    ///
    /// # Errors
    ///
    /// Returns `RasterError::NoProcesses` when `processes` is zero.
    pub fn new(zoom: u8, processes: usize) -> Result<Self, RasterError> {
        if processes == 0 {
            return Err(RasterError::NoProcesses);
        }
        Ok(Self { zoom, processes })
    }

    /// Tiles every `*.tif` under `source_dir` into numbered trees below
    /// `output_dir`.
    ///
    /// Sources are processed sequentially; `gdal2tiles.py` parallelizes
    /// internally with the configured process count, and `--resume` skips
    /// tiles produced by an earlier interrupted run. A failing source is
    /// reported in its result message and does not stop the batch.
    pub fn ingest(
        &self,
        source_dir: &Path,
        output_dir: &Path,
    ) -> Result<Vec<ResultMessage>, RasterError> {
        let pattern = format!("{}/**/*.tif", source_dir.display());
        let sources: Vec<PathBuf> = glob::glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable raster");
                    None
                }
            })
            .collect();
        info!(
            rasters = sources.len(),
            zoom = self.zoom,
            "ingesting source rasters"
        );

        let mut messages = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let subject = source.display().to_string();
            let tiles_dir = output_dir.join(index.to_string());
            match self.tile_raster(source, &tiles_dir) {
                Ok(()) => messages.push(ResultMessage::new(subject, "tiled")),
                Err(e) => {
                    warn!(raster = %subject, error = %e, "raster ingestion failed");
                    messages.push(ResultMessage::new(subject, format!("ingestion failed: {e}")));
                }
            }
        }
        Ok(messages)
    }

    /// Runs the two-step GDAL conversion for one source raster.
    fn tile_raster(&self, source: &Path, tiles_dir: &Path) -> Result<(), RasterError> {
        let vrt = source.with_extension("vrt");

        run_tool(
            "gdal_translate",
            Command::new("gdal_translate")
                .args(["-of", "vrt", "-expand", "rgba"])
                .arg(source)
                .arg(&vrt),
        )?;

        run_tool(
            "gdal2tiles.py",
            Command::new("gdal2tiles.py")
                .arg(format!("--zoom={}", self.zoom))
                .arg(format!("--processes={}", self.processes))
                .args(["--xyz", "--resume"])
                .arg(&vrt)
                .arg(tiles_dir),
        )
    }
}

fn run_tool(tool: &'static str, command: &mut Command) -> Result<(), RasterError> {
    debug!(%tool, "running external tool");
    let output = command
        .output()
        .map_err(|source| RasterError::Spawn { tool, source })?;
    if !output.status.success() {
        return Err(RasterError::ToolFailed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_zero_processes_rejected() {
        assert!(matches!(
            RasterIngestor::new(17, 0),
            Err(RasterError::NoProcesses)
        ));
        assert!(RasterIngestor::new(17, 4).is_ok());
    }

    #[test]
    fn test_ingest_without_rasters_is_empty() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let ingestor = RasterIngestor::new(17, 2).unwrap();

        let messages = ingestor.ingest(source.path(), output.path()).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_failing_source_is_reported_not_fatal() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        // Not a real GeoTIFF; gdal_translate (if present) fails on it, and
        // a missing gdal_translate fails the spawn. Either way the batch
        // completes with an error message for this source.
        fs::write(source.path().join("broken.tif"), b"not a tiff").unwrap();

        let ingestor = RasterIngestor::new(17, 1).unwrap();
        let messages = ingestor.ingest(source.path(), output.path()).unwrap();

        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.contains("ingestion failed"));
    }
}
