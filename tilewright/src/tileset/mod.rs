//! On-disk tileset conventions.
//!
//! A tileset is a directory tree of tiles stored at `<root>/<z>/<x>/<y>.<ext>`.
//! This module owns every path derivation and filesystem scan over that
//! layout: enumeration, extent computation, bulk deletion and the pruning of
//! emptied column directories. The overlay pipeline's parallel trees
//! (`<root>-topo`, `<root>-merged`) are derived here as well.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::bbox::{BBoxError, TileBBox};
use crate::coord::{self, TileCoord};

/// Errors that can occur while working with a tileset directory tree.
#[derive(Debug, Error)]
pub enum TilesetError {
    /// The tileset root is missing or not a directory.
    #[error("tileset root {} is not a readable directory", .0.display())]
    BadRoot(PathBuf),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Enumeration pattern could not be built.
    #[error("glob error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Bounding box accumulation failed.
    #[error(transparent)]
    BBox(#[from] BBoxError),
}

/// Creates the parent directory of `path` if it does not exist yet.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(dir) => fs::create_dir_all(dir),
        None => Ok(()),
    }
}

/// Handle to one tileset directory tree.
#[derive(Debug, Clone)]
pub struct Tileset {
    root: PathBuf,
    extension: String,
}

impl Tileset {
    /// Creates a handle without touching the filesystem.
    ///
    /// Use this for output trees that may not exist yet; use
    /// [`Tileset::open`] when the tree must already be readable.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Opens an existing tileset, validating that the root is a directory.
    ///
    /// # Errors
    ///
    /// Returns `TilesetError::BadRoot` when the root is absent or not a
    /// directory. This is the fatal-before-start check for every read stage.
    pub fn open(root: impl Into<PathBuf>, extension: impl Into<String>) -> Result<Self, TilesetError> {
        let tileset = Self::new(root, extension);
        if !tileset.root.is_dir() {
            return Err(TilesetError::BadRoot(tileset.root));
        }
        Ok(tileset)
    }

    /// Tileset root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tile file extension (without the dot).
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Full path of the tile at `coord`: `<root>/<z>/<x>/<y>.<ext>`.
    pub fn tile_path(&self, coord: &TileCoord) -> PathBuf {
        self
            .root
            .join(format!("{}.{}", coord.path(), self.extension))
    }

    /// True when the tile file exists.
    pub fn tile_exists(&self, coord: &TileCoord) -> bool {
        self.tile_path(coord).is_file()
    }

    /// Directory holding one zoom level: `<root>/<z>`.
    pub fn level_dir(&self, zoom: u8) -> PathBuf {
        self.root.join(zoom.to_string())
    }

    /// Handle to a parallel tree whose root carries a name suffix, keeping
    /// the same extension (e.g. suffix `-merged` for `<root>-merged`).
    pub fn parallel_tree(&self, suffix: &str) -> Tileset {
        let mut name = self.root.as_os_str().to_os_string();
        name.push(suffix);
        Tileset {
            root: PathBuf::from(name),
            extension: self.extension.clone(),
        }
    }

    /// Paths of every tile file in the tree, any zoom level.
    ///
    /// Only files following the `<z>/<x>/<y>.<ext>` convention are
    /// returned; strays are skipped with a warning.
    pub fn tile_paths(&self) -> Result<Vec<PathBuf>, TilesetError> {
        self.matching_paths(&format!(
            "{}/*/*/*.{}",
            self.root.display(),
            self.extension
        ))
    }

    /// Paths of every tile file at one zoom level.
    pub fn level_tile_paths(&self, zoom: u8) -> Result<Vec<PathBuf>, TilesetError> {
        self.matching_paths(&format!(
            "{}/{}/*/*.{}",
            self.root.display(),
            zoom,
            self.extension
        ))
    }

    fn matching_paths(&self, pattern: &str) -> Result<Vec<PathBuf>, TilesetError> {
        let mut paths = Vec::new();
        for entry in glob::glob(pattern)? {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => warn!(error = %e, "skipping unreadable tileset entry"),
            }
        }
        Ok(paths)
    }

    /// Coordinates of every tile present at one zoom level.
    pub fn enumerate_level(&self, zoom: u8) -> Result<Vec<TileCoord>, TilesetError> {
        Ok(self.decode_paths(self.level_tile_paths(zoom)?))
    }

    /// Coordinates of every tile present in the tree, any zoom level.
    pub fn enumerate_all(&self) -> Result<Vec<TileCoord>, TilesetError> {
        Ok(self.decode_paths(self.tile_paths()?))
    }

    fn decode_paths(&self, paths: Vec<PathBuf>) -> Vec<TileCoord> {
        paths
            .into_iter()
            .filter_map(|path| match coord::from_tile_path(&path) {
                Ok((coord, _)) => Some(coord),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping non-tile file");
                    None
                }
            })
            .collect()
    }

    /// Bounding box covering every tile stored at one zoom level.
    ///
    /// Returns the empty box when the level holds no tiles.
    pub fn extent(&self, zoom: u8) -> Result<TileBBox, TilesetError> {
        let mut bounds = TileBBox::new_empty(zoom)?;
        for coord in self.enumerate_level(zoom)? {
            bounds.include_coord(&coord)?;
        }
        Ok(bounds)
    }

    /// Deletes every stored tile inside `bounds`.
    ///
    /// Tiles that are already absent are skipped silently; other filesystem
    /// failures are logged and skipped. Returns the number of files removed.
    pub fn remove_tiles(&self, bounds: &TileBBox) -> usize {
        let mut removed = 0;
        for coord in bounds.coords() {
            let path = self.tile_path(&coord);
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove tile"),
            }
        }
        debug!(bounds = %bounds, removed, "removed tiles in bounds");
        removed
    }

    /// Removes column directories of one zoom level that are now empty.
    ///
    /// Only the immediate children of `<root>/<z>` are inspected; a column
    /// directory that still contains an empty subdirectory is left in
    /// place. Returns the number of directories removed.
    pub fn prune_empty_columns(&self, zoom: u8) -> Result<usize, TilesetError> {
        let level_dir = self.level_dir(zoom);
        if !level_dir.is_dir() {
            return Ok(0);
        }
        let mut pruned = 0;
        for entry in fs::read_dir(&level_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if fs::read_dir(&path)?.next().is_none() {
                match fs::remove_dir(&path) {
                    Ok(()) => pruned += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to prune directory"),
                }
            }
        }
        Ok(pruned)
    }
}
