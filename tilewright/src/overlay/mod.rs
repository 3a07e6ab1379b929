//! Overlay augmentation.
//!
//! For every base tile the [`OverlayAugmenter`] fetches the remote overlay
//! tile covering the same coordinate, caches it in the parallel `-topo`
//! tree, and composites it onto the base tile in the parallel `-merged`
//! tree. Fetches go through a staging file so the cache never holds a
//! half-written tile, and a failed fetch degrades to hard-linking the base
//! tile as the merged output, so the run always produces a usable tile.
//!
//! Re-running over the same base tiles is idempotent: cached overlay tiles
//! are not fetched again and the merged output is rewritten identically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::coord::{self, CoordError, TileCoord};
use crate::imaging::{CompositeError, Compositor};
use crate::pool::{ResultMessage, WorkerPool};
use crate::provider::{HttpClient, OverlayProvider, ProviderError};
use crate::tileset::{ensure_parent, Tileset};

/// Root suffix of the overlay cache tree.
pub const TOPO_SUFFIX: &str = "-topo";

/// Root suffix of the merged output tree.
pub const MERGED_SUFFIX: &str = "-merged";

/// Errors that can occur while augmenting a base tile.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// The job path does not address a tile.
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// The job path has no file extension to mirror.
    #[error("tile path {} has no file extension", .0.display())]
    MissingExtension(PathBuf),

    /// Remote fetch failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Cache or output filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Compositing failure.
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// Augments base tiles with a remotely fetched overlay.
pub struct OverlayAugmenter<C: HttpClient> {
    provider: Arc<OverlayProvider<C>>,
    compositor: Arc<dyn Compositor>,
}

impl<C: HttpClient> Clone for OverlayAugmenter<C> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            compositor: Arc::clone(&self.compositor),
        }
    }
}

impl<C: HttpClient + 'static> OverlayAugmenter<C> {
    /// Creates an augmenter fetching through `provider`.
    pub fn new(provider: OverlayProvider<C>, compositor: Arc<dyn Compositor>) -> Self {
        Self {
            provider: Arc::new(provider),
            compositor,
        }
    }

    /// Augments a single base tile; the worker function of this stage.
    pub fn augment(&self, base_tile: &Path) -> ResultMessage {
        let subject = base_tile.display().to_string();
        match self.augment_inner(base_tile) {
            Ok(description) => ResultMessage::new(subject, description),
            Err(e) => ResultMessage::new(subject, format!("overlay failed: {e}")),
        }
    }

    fn augment_inner(&self, base_tile: &Path) -> Result<String, OverlayError> {
        let (coord, root) = coord::from_tile_path(base_tile)?;
        let extension = base_tile
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| OverlayError::MissingExtension(base_tile.to_path_buf()))?;

        let base_tiles = Tileset::new(&root, extension);
        let topo_path = topo_tile_path(&base_tiles, &coord);
        let merged_path = base_tiles.parallel_tree(MERGED_SUFFIX).tile_path(&coord);

        if topo_path.is_file() {
            debug!(tile = %coord, "overlay tile already cached");
        } else if let Err(e) = self.fetch_to_cache(&coord, &topo_path) {
            warn!(tile = %coord, error = %e, "overlay fetch failed, falling back to base tile");
            ensure_parent(&merged_path)?;
            if !merged_path.exists() {
                fs::hard_link(base_tile, &merged_path)?;
            }
            return Ok("overlay unavailable; linked base tile".to_string());
        }

        ensure_parent(&merged_path)?;
        self
            .compositor
            .composite_overlay(base_tile, &topo_path, &merged_path)?;
        Ok("merged overlay onto base tile".to_string())
    }

    /// Fetches the overlay tile into the cache through a staging file.
    ///
    /// The staging file is removed on every failure path; the cache path
    /// only ever sees complete tiles.
    fn fetch_to_cache(&self, coord: &TileCoord, topo_path: &Path) -> Result<(), OverlayError> {
        let bytes = self.provider.fetch_tile(coord)?;

        ensure_parent(topo_path)?;
        let staging = staging_path(topo_path);
        fs::write(&staging, &bytes)?;
        if let Err(e) = fs::rename(&staging, topo_path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        debug!(tile = %coord, cache = %topo_path.display(), "cached overlay tile");
        Ok(())
    }

    /// Augments every base tile path through the pool.
    pub async fn run(
        &self,
        pool: &WorkerPool,
        base_tiles: Vec<PathBuf>,
        shutdown: CancellationToken,
    ) -> Vec<ResultMessage> {
        let augmenter = self.clone();
        pool
            .run_until_cancelled(
                base_tiles,
                move |path| augmenter.augment(&path),
                shutdown,
            )
            .await
    }
}

/// Cache path of the overlay tile: `<root>-topo/<z>/<x>/<y>-topo.<ext>`.
fn topo_tile_path(base_tiles: &Tileset, coord: &TileCoord) -> PathBuf {
    base_tiles
        .parallel_tree(TOPO_SUFFIX)
        .root()
        .join(coord.path_zx())
        .join(format!("{}{}.{}", coord.y, TOPO_SUFFIX, base_tiles.extension()))
}

fn staging_path(topo_path: &Path) -> PathBuf {
    let mut name = topo_path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
