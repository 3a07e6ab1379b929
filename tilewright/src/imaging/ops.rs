//! Compositor implementation on the `image` crate.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::trace;

use super::{CompositeError, Compositor};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Pixel-level compositor backed by the `image` crate.
///
/// All operations normalize tiles to RGBA. Output format follows the output
/// path's file extension.
#[derive(Debug, Clone)]
pub struct ImageCompositor {
    tile_size: u32,
}

impl ImageCompositor {
    /// Creates a compositor for the standard 256 px tiles.
    pub fn new() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
        }
    }

    /// Creates a compositor for a custom tile edge length.
    pub fn with_tile_size(tile_size: u32) -> Self {
        Self { tile_size }
    }

    /// Tile edge length in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Loads a tile as RGBA, resizing to the expected edge length.
    fn load(&self, path: &Path) -> Result<RgbaImage, CompositeError> {
        let decoded = image::open(path).map_err(|source| CompositeError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        if rgba.width() != self.tile_size || rgba.height() != self.tile_size {
            Ok(imageops::resize(
                &rgba,
                self.tile_size,
                self.tile_size,
                FilterType::Lanczos3,
            ))
        } else {
            Ok(rgba)
        }
    }

    /// Loads a tile, substituting a transparent tile when it is absent.
    fn load_or_transparent(&self, path: &Path) -> Result<RgbaImage, CompositeError> {
        if path.is_file() {
            self.load(path)
        } else {
            trace!(path = %path.display(), "missing input tile, using transparent quadrant");
            Ok(RgbaImage::new(self.tile_size, self.tile_size))
        }
    }

    fn save(&self, img: &RgbaImage, output: &Path) -> Result<(), CompositeError> {
        img.save(output).map_err(|source| CompositeError::Image {
            path: output.to_path_buf(),
            source,
        })
    }
}

impl Default for ImageCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor for ImageCompositor {
    fn combine_children(
        &self,
        children: &[PathBuf; 4],
        output: &Path,
    ) -> Result<(), CompositeError> {
        let size = self.tile_size;
        let mut canvas = RgbaImage::new(size * 2, size * 2);

        let offsets = [(0, 0), (size, 0), (0, size), (size, size)];
        for (child, (dx, dy)) in children.iter().zip(offsets) {
            let tile = self.load_or_transparent(child)?;
            imageops::overlay(&mut canvas, &tile, i64::from(dx), i64::from(dy));
        }

        let parent = imageops::resize(&canvas, size, size, FilterType::Triangle);
        self.save(&parent, output)
    }

    fn blend(&self, inputs: &[PathBuf], output: &Path) -> Result<(), CompositeError> {
        let (first, rest) = inputs.split_first().ok_or(CompositeError::NoInputs)?;

        let mut canvas = self.load(first)?;
        for input in rest {
            let layer = self.load(input)?;
            imageops::overlay(&mut canvas, &layer, 0, 0);
        }
        self.save(&canvas, output)
    }

    fn composite_overlay(
        &self,
        base: &Path,
        overlay: &Path,
        output: &Path,
    ) -> Result<(), CompositeError> {
        let mut canvas = self.load(base)?;
        let top = self.load(overlay)?;
        imageops::overlay(&mut canvas, &top, 0, 0);
        self.save(&canvas, output)
    }

    fn is_blank(&self, tile: &Path) -> Result<bool, CompositeError> {
        // Tiles outside the stored extent and undecodable tiles both count
        // as blank, so trimming can walk past ragged tileset borders.
        if !tile.is_file() {
            return Ok(true);
        }
        let Ok(decoded) = image::open(tile) else {
            return Ok(true);
        };
        let rgba = decoded.to_rgba8();
        Ok(rgba.pixels().all(|p| {
            let [r, g, b, a] = p.0;
            a == 0 || (r == 255 && g == 255 && b == 255)
        }))
    }
}
