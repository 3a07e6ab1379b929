//! Overview tile synthesis.
//!
//! An overview tile is the downsampled combination of its four children one
//! zoom level deeper. The [`OverviewBuilder`] handles a single pyramid level
//! per pool run: jobs are parent coordinates, children are located through
//! sibling arithmetic, and the pixel work is delegated to the
//! [`Compositor`]. Building a full pyramid walks levels from the deepest
//! upward, one pool invocation per level.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coord::{CoordError, TileCoord};
use crate::imaging::{CompositeError, Compositor};
use crate::pool::{ResultMessage, WorkerPool};
use crate::tileset::{ensure_parent, Tileset, TilesetError};

/// Errors that can occur while building overview levels.
#[derive(Debug, Error)]
pub enum OverviewError {
    /// Zoom range given to the driver is not descending.
    #[error("invalid level range: shallowest {shallowest} must be below deepest {deepest}")]
    InvalidRange { shallowest: u8, deepest: u8 },

    /// Coordinate arithmetic failure.
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// Tileset scan failure.
    #[error(transparent)]
    Tileset(#[from] TilesetError),

    /// Output directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The four-way combine failed.
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// Builds one overview level from the level beneath it.
#[derive(Clone)]
pub struct OverviewBuilder {
    tiles: Tileset,
    compositor: Arc<dyn Compositor>,
}

impl OverviewBuilder {
    /// Creates a builder over one tileset.
    pub fn new(tiles: Tileset, compositor: Arc<dyn Compositor>) -> Self {
        Self { tiles, compositor }
    }

    /// Enumerates the parent coordinates to build at `parent_zoom`.
    ///
    /// A parent is relevant when at least one of its children exists on
    /// disk; each parent appears once, in ascending coordinate order.
    pub fn parent_jobs(&self, parent_zoom: u8) -> Result<Vec<TileCoord>, OverviewError> {
        let children = self.tiles.enumerate_level(parent_zoom + 1)?;
        let parents: BTreeSet<TileCoord> = children.iter().map(TileCoord::parent).collect();
        Ok(parents.into_iter().collect())
    }

    /// Builds a single overview tile; the worker function of this stage.
    ///
    /// Failures are folded into the returned message and never written as
    /// partial output.
    pub fn build_parent(&self, parent: &TileCoord) -> ResultMessage {
        let output = self.tiles.tile_path(parent);
        let subject = output.display().to_string();
        match self.combine_into(parent, &output) {
            Ok(()) => ResultMessage::new(subject, "overview built"),
            Err(e) => ResultMessage::new(subject, format!("overview failed: {e}")),
        }
    }

    fn combine_into(&self, parent: &TileCoord, output: &Path) -> Result<(), OverviewError> {
        let origin = parent.child_origin()?;
        let children = [
            self.tiles.tile_path(&origin),
            self.tiles.tile_path(&origin.right()),
            self.tiles.tile_path(&origin.down()),
            self.tiles.tile_path(&origin.right().down()),
        ];

        ensure_parent(output)?;
        self.compositor.combine_children(&children, output)?;
        Ok(())
    }

    /// Builds every level from `deepest - 1` down to `shallowest`.
    ///
    /// Runs one pool invocation per level so that each level's parents see
    /// the children produced by the previous invocation.
    ///
    /// # Errors
    ///
    /// Fails before any job is enqueued when the range is not descending or
    /// a level scan fails; per-tile failures stay inside the messages.
    pub async fn build_levels(
        &self,
        pool: &WorkerPool,
        deepest: u8,
        shallowest: u8,
        shutdown: &CancellationToken,
    ) -> Result<Vec<ResultMessage>, OverviewError> {
        if shallowest >= deepest || deepest > crate::coord::MAX_ZOOM {
            return Err(OverviewError::InvalidRange {
                shallowest,
                deepest,
            });
        }

        let mut messages = Vec::new();
        for parent_zoom in (shallowest..deepest).rev() {
            if shutdown.is_cancelled() {
                break;
            }
            let jobs = self.parent_jobs(parent_zoom)?;
            info!(
                level = parent_zoom,
                tiles = jobs.len(),
                "building overview level"
            );
            let builder = self.clone();
            let results = pool
                .run_until_cancelled(
                    jobs,
                    move |coord| builder.build_parent(&coord),
                    shutdown.clone(),
                )
                .await;
            debug!(level = parent_zoom, results = results.len(), "level done");
            messages.extend(results);
        }
        Ok(messages)
    }
}
