//! Imaging collaborator abstraction.
//!
//! The pyramid algorithms never touch pixels themselves; they delegate to a
//! [`Compositor`], a narrow trait covering the four operations the pipeline
//! needs: the four-way combine-and-downsample behind overview tiles, N-way
//! blending for merged tilesets, overlay compositing, and the blank test
//! used by the edge trimmer.
//!
//! The shipped implementation, [`ImageCompositor`], decodes and encodes
//! through the `image` crate. The trait seam allows swapping in a
//! subprocess-backed or remote implementation without changing the
//! algorithms.

mod ops;

pub use ops::{ImageCompositor, DEFAULT_TILE_SIZE};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur inside a compositor implementation.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// I/O failure reading or writing a tile.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A tile could not be decoded or encoded.
    #[error("image error for {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Blend was invoked with no input tiles.
    #[error("blend requires at least one input tile")]
    NoInputs,
}

/// Image operations the tile pipeline delegates to.
///
/// Implementations must be thread-safe (`Send + Sync`); workers call them
/// concurrently for distinct tiles.
pub trait Compositor: Send + Sync {
    /// Combines four child tiles into their downsampled parent tile.
    ///
    /// `children` is ordered north-west, north-east, south-west, south-east.
    /// How missing children are rendered is the implementation's choice;
    /// [`ImageCompositor`] substitutes a transparent quadrant.
    ///
    /// # Errors
    ///
    /// No output is written when the combine fails.
    fn combine_children(
        &self,
        children: &[PathBuf; 4],
        output: &Path,
    ) -> Result<(), CompositeError>;

    /// Blends several tiles covering one coordinate into a single tile.
    ///
    /// Inputs are composited in the given order: later tiles are laid over
    /// earlier ones.
    fn blend(&self, inputs: &[PathBuf], output: &Path) -> Result<(), CompositeError>;

    /// Lays an overlay tile over a base tile.
    fn composite_overlay(
        &self,
        base: &Path,
        overlay: &Path,
        output: &Path,
    ) -> Result<(), CompositeError>;

    /// Classifies a single tile as blank (carrying no content).
    fn is_blank(&self, tile: &Path) -> Result<bool, CompositeError>;

    /// Classifies a whole border line of tiles; blank iff every tile is.
    fn is_line_blank(&self, tiles: &[PathBuf]) -> Result<bool, CompositeError> {
        for tile in tiles {
            if !self.is_blank(tile)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
