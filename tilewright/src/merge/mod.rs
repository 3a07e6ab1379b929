//! Tileset merging.
//!
//! Merging combines tiles produced independently by several source trees
//! into one output tree. A [`SourceIndex`] is built once per run by
//! enumerating every source; afterwards each coordinate is one pool job:
//! tiles held by a single source are hard-linked into place (no data copy),
//! tiles held by several sources are blended in source order, which keeps
//! the output deterministic.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coord::TileCoord;
use crate::imaging::{CompositeError, Compositor};
use crate::pool::{ResultMessage, WorkerPool};
use crate::tileset::{ensure_parent, Tileset, TilesetError};

/// Errors that can occur while merging tilesets.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The merge was started without any source tree.
    #[error("at least one source tileset is required")]
    NoSources,

    /// A coordinate was enqueued that no source holds.
    #[error("no source holds tile {0}")]
    NoCandidates(TileCoord),

    /// Source enumeration failure.
    #[error(transparent)]
    Tileset(#[from] TilesetError),

    /// Hard link or directory creation failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Blending failure.
    #[error(transparent)]
    Composite(#[from] CompositeError),
}

/// Maps every tile coordinate to the ordered source trees that hold it.
///
/// Built once per merge run, read-only afterwards. Source order is the
/// order the roots were given; it decides blending order.
#[derive(Debug)]
pub struct SourceIndex {
    sources: Vec<Tileset>,
    locations: BTreeMap<TileCoord, Vec<usize>>,
}

impl SourceIndex {
    /// Scans every source tree and records which sources hold which tiles.
    ///
    /// # Errors
    ///
    /// Fails when no source is given or any source root is unreadable;
    /// both are detected before any job runs.
    pub fn build(roots: &[PathBuf], extension: &str) -> Result<Self, MergeError> {
        if roots.is_empty() {
            return Err(MergeError::NoSources);
        }

        let mut sources = Vec::with_capacity(roots.len());
        for root in roots {
            sources.push(Tileset::open(root, extension)?);
        }

        let mut locations: BTreeMap<TileCoord, Vec<usize>> = BTreeMap::new();
        for (index, source) in sources.iter().enumerate() {
            for coord in source.enumerate_all()? {
                locations.entry(coord).or_default().push(index);
            }
        }

        info!(
            sources = sources.len(),
            tiles = locations.len(),
            "built source location index"
        );
        Ok(Self { sources, locations })
    }

    /// Every indexed coordinate in ascending order; the job list.
    pub fn coords(&self) -> Vec<TileCoord> {
        self.locations.keys().copied().collect()
    }

    /// Number of distinct tile coordinates.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// True when no source holds any tile.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Concrete candidate paths for one coordinate, in source order.
    pub fn candidate_paths(&self, coord: &TileCoord) -> Vec<PathBuf> {
        self
            .locations
            .get(coord)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| self.sources[i].tile_path(coord))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Merges N source trees into one output tree.
#[derive(Clone)]
pub struct TilesetMerger {
    index: Arc<SourceIndex>,
    output: Tileset,
    compositor: Arc<dyn Compositor>,
}

impl TilesetMerger {
    /// Creates a merger writing into `output`.
    pub fn new(index: Arc<SourceIndex>, output: Tileset, compositor: Arc<dyn Compositor>) -> Self {
        Self {
            index,
            output,
            compositor,
        }
    }

    /// Merges a single coordinate; the worker function of this stage.
    pub fn merge_tile(&self, coord: &TileCoord) -> ResultMessage {
        let output = self.output.tile_path(coord);
        let subject = output.display().to_string();
        match self.write_merged(coord, &output) {
            Ok(description) => ResultMessage::new(subject, description),
            Err(e) => ResultMessage::new(subject, format!("merge failed: {e}")),
        }
    }

    fn write_merged(&self, coord: &TileCoord, output: &Path) -> Result<String, MergeError> {
        let candidates = self.index.candidate_paths(coord);
        let existing: Vec<PathBuf> = candidates.into_iter().filter(|p| p.is_file()).collect();

        ensure_parent(output)?;
        match existing.len() {
            0 => Err(MergeError::NoCandidates(*coord)),
            1 => {
                fs::hard_link(&existing[0], output)?;
                Ok("linked single source".to_string())
            }
            n => {
                self.compositor.blend(&existing, output)?;
                Ok(format!("blended {n} sources"))
            }
        }
    }

    /// Merges every indexed coordinate through the pool.
    pub async fn run(
        &self,
        pool: &WorkerPool,
        shutdown: CancellationToken,
    ) -> Vec<ResultMessage> {
        let jobs = self.index.coords();
        debug!(jobs = jobs.len(), "starting tileset merge");
        let merger = self.clone();
        pool
            .run_until_cancelled(jobs, move |coord| merger.merge_tile(&coord), shutdown)
            .await
    }
}
