//! Tile coordinate module
//!
//! Provides the Z/X/Y addressing used throughout a tile pyramid, the
//! derived-address arithmetic (siblings, overview parent) and the canonical
//! on-disk path encoding `<z>/<x>/<y>`.

mod types;

pub use types::{CoordError, TileCoord, MAX_ZOOM, MIN_ZOOM};

use std::path::{Path, PathBuf};

/// Parses a tile file path back into its coordinate and tileset root.
///
/// The path must end in `<z>/<x>/<y>.<ext>`; everything before the zoom
/// component is returned as the tileset root. This is the exact inverse of
/// joining a root with [`TileCoord::path`] plus a file extension.
///
/// # Arguments
///
/// * `path` - Path to a tile file, e.g. `/data/tiles/18/1234/5678.png`
///
/// # Returns
///
/// The decoded coordinate and the tileset root directory.
///
/// # Errors
///
/// Returns `CoordError::MalformedPath` if the path has fewer than three
/// components or any component fails to parse as a tile index, and the
/// range errors of [`TileCoord::new`] if the indices exceed the zoom level.
pub fn from_tile_path(path: &Path) -> Result<(TileCoord, PathBuf), CoordError> {
    let malformed = || CoordError::MalformedPath(path.display().to_string());

    let y = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(malformed)?;

    let x_dir = path.parent().ok_or_else(malformed)?;
    let x = x_dir
        .file_name()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(malformed)?;

    let z_dir = x_dir.parent().ok_or_else(malformed)?;
    let zoom = z_dir
        .file_name()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse::<u8>().ok())
        .ok_or_else(malformed)?;

    let root = z_dir.parent().unwrap_or_else(|| Path::new(""));

    Ok((TileCoord::new(zoom, x, y)?, root.to_path_buf()))
}
