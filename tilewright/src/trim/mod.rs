//! Blank-edge trimming.
//!
//! The [`EdgeTrimmer`] shrinks a tileset's bounding box one border line at a
//! time: as long as the whole line along one side classifies as blank, the
//! line is marked for removal and the box moves one tile inward on that
//! side. After all four sides the marked tiles are deleted and column
//! directories left empty are pruned.
//!
//! The bounding box is owned by the trimming thread for the duration of the
//! loop; it is never shared across workers. Concurrency happens one level
//! up, by trimming several tileset roots as independent pool jobs.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::bbox::{BBoxError, Side, TileBBox};
use crate::imaging::{CompositeError, Compositor};
use crate::pool::{ResultMessage, WorkerPool};
use crate::tileset::{Tileset, TilesetError};

/// Errors that can occur while trimming a tileset.
#[derive(Debug, Error)]
pub enum TrimError {
    /// Tileset scan or cleanup failure.
    #[error(transparent)]
    Tileset(#[from] TilesetError),

    /// Bounding box bookkeeping failure.
    #[error(transparent)]
    BBox(#[from] BBoxError),

    /// The blank classifier failed.
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// Outcome of one trim run.
#[derive(Debug, Clone)]
pub struct TrimReport {
    /// Bounding box remaining after the trim.
    pub bounds: TileBBox,
    /// Number of tile files deleted.
    pub tiles_removed: usize,
    /// Number of emptied column directories pruned.
    pub dirs_pruned: usize,
}

impl std::fmt::Display for TrimReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "trimmed to {} ({} tiles removed, {} dirs pruned)",
            self.bounds, self.tiles_removed, self.dirs_pruned
        )
    }
}

/// Shrinks a tileset's extent by discarding blank border lines.
pub struct EdgeTrimmer {
    tiles: Tileset,
    compositor: Arc<dyn Compositor>,
    zoom: u8,
}

impl EdgeTrimmer {
    /// Creates a trimmer over one tileset at the given reference zoom level.
    pub fn new(tiles: Tileset, compositor: Arc<dyn Compositor>, zoom: u8) -> Self {
        Self {
            tiles,
            compositor,
            zoom,
        }
    }

    /// Runs the four-sided shrink loop and deletes the trimmed tiles.
    ///
    /// Termination is guaranteed: every iteration moves one edge inward by
    /// one tile and the box empties rather than inverting, so a fully blank
    /// tileset trims to the empty box.
    ///
    /// Directory cleanup only inspects the immediate children of the
    /// reference level directory; deeper nesting is left untouched.
    pub fn trim(&self) -> Result<TrimReport, TrimError> {
        let mut bounds = self.tiles.extent(self.zoom)?;
        info!(root = %self.tiles.root().display(), bounds = %bounds, "trimming tileset");

        let mut tiles_removed = 0;
        for side in Side::ALL {
            let mut removed = TileBBox::new_empty(self.zoom)?;
            let mut line = bounds.side_line(side);

            while !line.is_empty() && self.is_line_blank(&line)? {
                removed.include(&line)?;
                bounds.shrink(side);
                line = bounds.side_line(side);
            }

            if !removed.is_empty() {
                debug!(%side, removed = %removed, "removing blank border lines");
                tiles_removed += self.tiles.remove_tiles(&removed);
            }
        }

        let dirs_pruned = self.tiles.prune_empty_columns(self.zoom)?;
        Ok(TrimReport {
            bounds,
            tiles_removed,
            dirs_pruned,
        })
    }

    fn is_line_blank(&self, line: &TileBBox) -> Result<bool, CompositeError> {
        let paths: Vec<PathBuf> = line.coords().map(|c| self.tiles.tile_path(&c)).collect();
        self.compositor.is_line_blank(&paths)
    }
}

/// Trims several tileset roots concurrently; the driver of this stage.
///
/// Each root is one pool job running a full [`EdgeTrimmer`] pass; failures
/// are folded into that root's result message.
pub async fn trim_tilesets(
    pool: &WorkerPool,
    roots: Vec<PathBuf>,
    compositor: Arc<dyn Compositor>,
    zoom: u8,
    extension: String,
    shutdown: CancellationToken,
) -> Vec<ResultMessage> {
    pool
        .run_until_cancelled(
            roots,
            move |root| {
                let subject = root.display().to_string();
                let trimmed = Tileset::open(&root, extension.clone())
                    .map_err(TrimError::from)
                    .and_then(|tiles| {
                        EdgeTrimmer::new(tiles, Arc::clone(&compositor), zoom).trim()
                    });
                match trimmed {
                    Ok(report) => ResultMessage::new(subject, report.to_string()),
                    Err(e) => ResultMessage::new(subject, format!("trim failed: {e}")),
                }
            },
            shutdown,
        )
        .await
}
