//! Tile-space bounding boxes.
//!
//! A [`TileBBox`] describes a rectangular region of tiles at one fixed zoom
//! level, stored as a minimum corner plus dimensions so that the empty box
//! (`width == 0 || height == 0`) has a representation. The edge trimmer
//! relies on that: its accumulator of removed tiles starts empty, and a
//! fully blank tileset shrinks down to the empty box instead of inverting
//! its corners.
//!
//! All coordinates are inclusive on the maximum side; `x_max = x_min +
//! width - 1` for a non-empty box.

use std::fmt;

use thiserror::Error;

use crate::coord::{CoordError, TileCoord, MAX_ZOOM};

/// One side of a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Western edge (minimum x).
    Left,
    /// Eastern edge (maximum x).
    Right,
    /// Northern edge (minimum y).
    Top,
    /// Southern edge (maximum y).
    Bottom,
}

impl Side {
    /// All four sides in the order the trimmer walks them.
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// A rectangular region of tiles at a single zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBBox {
    zoom: u8,
    x_min: u32,
    y_min: u32,
    width: u32,
    height: u32,
}

impl TileBBox {
    /// Creates a box from inclusive corner coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the zoom level is unsupported, a corner lies
    /// outside the zoom level's index range, or the corners are inverted.
    pub fn new(zoom: u8, x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Result<Self, BBoxError> {
        if zoom > MAX_ZOOM {
            return Err(BBoxError::Coord(CoordError::InvalidZoom(zoom)));
        }
        let max = (1u32 << zoom) - 1;
        if x_max > max || y_max > max {
            return Err(BBoxError::OutOfRange {
                x_max,
                y_max,
                zoom,
            });
        }
        if x_min > x_max || y_min > y_max {
            return Err(BBoxError::Inverted {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self {
            zoom,
            x_min,
            y_min,
            width: x_max - x_min + 1,
            height: y_max - y_min + 1,
        })
    }

    /// Creates the empty box at the given zoom level.
    pub fn new_empty(zoom: u8) -> Result<Self, BBoxError> {
        if zoom > MAX_ZOOM {
            return Err(BBoxError::Coord(CoordError::InvalidZoom(zoom)));
        }
        Ok(Self {
            zoom,
            x_min: 0,
            y_min: 0,
            width: 0,
            height: 0,
        })
    }

    /// Creates a single-tile box covering `coord`.
    pub fn from_coord(coord: TileCoord) -> Self {
        Self {
            zoom: coord.zoom,
            x_min: coord.x,
            y_min: coord.y,
            width: 1,
            height: 1,
        }
    }

    /// Zoom level of the box.
    #[inline]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Minimum x coordinate (meaningless when empty).
    #[inline]
    pub fn x_min(&self) -> u32 {
        self.x_min
    }

    /// Minimum y coordinate (meaningless when empty).
    #[inline]
    pub fn y_min(&self) -> u32 {
        self.y_min
    }

    /// Maximum x coordinate, inclusive.
    #[inline]
    pub fn x_max(&self) -> u32 {
        (self.x_min + self.width).saturating_sub(1)
    }

    /// Maximum y coordinate, inclusive.
    #[inline]
    pub fn y_max(&self) -> u32 {
        (self.y_min + self.height).saturating_sub(1)
    }

    /// Width in tiles.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of tiles covered.
    pub fn count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// True when the box covers no tiles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// North-west corner tile, `None` for the empty box.
    pub fn origin(&self) -> Option<TileCoord> {
        if self.is_empty() {
            return None;
        }
        Some(TileCoord {
            zoom: self.zoom,
            x: self.x_min,
            y: self.y_min,
        })
    }

    /// South-east corner tile, `None` for the empty box.
    pub fn extent(&self) -> Option<TileCoord> {
        if self.is_empty() {
            return None;
        }
        Some(TileCoord {
            zoom: self.zoom,
            x: self.x_max(),
            y: self.y_max(),
        })
    }

    /// True if `coord` lies inside the box (same zoom level required).
    pub fn contains(&self, coord: &TileCoord) -> bool {
        !self.is_empty()
            && coord.zoom == self.zoom
            && coord.x >= self.x_min
            && coord.x <= self.x_max()
            && coord.y >= self.y_min
            && coord.y <= self.y_max()
    }

    /// Expands the box to include a single tile coordinate.
    ///
    /// An empty box becomes the single-tile box at `coord`.
    ///
    /// # Errors
    ///
    /// Returns `BBoxError::ZoomMismatch` if the coordinate is at a different
    /// zoom level.
    pub fn include_coord(&mut self, coord: &TileCoord) -> Result<(), BBoxError> {
        if coord.zoom != self.zoom {
            return Err(BBoxError::ZoomMismatch {
                expected: self.zoom,
                found: coord.zoom,
            });
        }
        if self.is_empty() {
            *self = Self::from_coord(*coord);
            return Ok(());
        }
        let x_max = self.x_max().max(coord.x);
        let y_max = self.y_max().max(coord.y);
        self.x_min = self.x_min.min(coord.x);
        self.y_min = self.y_min.min(coord.y);
        self.width = x_max - self.x_min + 1;
        self.height = y_max - self.y_min + 1;
        Ok(())
    }

    /// Expands the box to the smallest box containing both boxes.
    ///
    /// Including an empty box is a no-op; an empty box adopts the other box.
    ///
    /// # Errors
    ///
    /// Returns `BBoxError::ZoomMismatch` if the zoom levels differ.
    pub fn include(&mut self, other: &TileBBox) -> Result<(), BBoxError> {
        if other.zoom != self.zoom {
            return Err(BBoxError::ZoomMismatch {
                expected: self.zoom,
                found: other.zoom,
            });
        }
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = *other;
            return Ok(());
        }
        let x_max = self.x_max().max(other.x_max());
        let y_max = self.y_max().max(other.y_max());
        self.x_min = self.x_min.min(other.x_min);
        self.y_min = self.y_min.min(other.y_min);
        self.width = x_max - self.x_min + 1;
        self.height = y_max - self.y_min + 1;
        Ok(())
    }

    /// Returns the one-tile-wide border line along the given side.
    ///
    /// The line of an empty box is empty.
    pub fn side_line(&self, side: Side) -> TileBBox {
        if self.is_empty() {
            return Self {
                zoom: self.zoom,
                x_min: 0,
                y_min: 0,
                width: 0,
                height: 0,
            };
        }
        let (x_min, y_min, width, height) = match side {
            Side::Left => (self.x_min, self.y_min, 1, self.height),
            Side::Right => (self.x_max(), self.y_min, 1, self.height),
            Side::Top => (self.x_min, self.y_min, self.width, 1),
            Side::Bottom => (self.x_min, self.y_max(), self.width, 1),
        };
        Self {
            zoom: self.zoom,
            x_min,
            y_min,
            width,
            height,
        }
    }

    /// Moves the given edge inward by one tile.
    ///
    /// Shrinking a one-wide box empties it; shrinking an empty box is a
    /// no-op. The box therefore never inverts its corners, which guarantees
    /// the trim loop terminates.
    pub fn shrink(&mut self, side: Side) {
        if self.is_empty() {
            return;
        }
        match side {
            Side::Left => {
                self.x_min += 1;
                self.width -= 1;
            }
            Side::Right => {
                self.width -= 1;
            }
            Side::Top => {
                self.y_min += 1;
                self.height -= 1;
            }
            Side::Bottom => {
                self.height -= 1;
            }
        }
    }

    /// Iterates all covered coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        let zoom = self.zoom;
        let x_min = self.x_min;
        let width = self.width;
        (self.y_min..self.y_min + self.height).flat_map(move |y| {
            (x_min..x_min + width).map(move |x| TileCoord { zoom, x, y })
        })
    }
}

impl fmt::Display for TileBBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "z{} empty", self.zoom)
        } else {
            write!(
                f,
                "z{} [{},{} .. {},{}]",
                self.zoom,
                self.x_min,
                self.y_min,
                self.x_max(),
                self.y_max()
            )
        }
    }
}

/// Errors that can occur when constructing or combining bounding boxes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BBoxError {
    /// Invalid coordinate input.
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// A corner exceeds the index range of the zoom level.
    #[error("corner ({x_max}, {y_max}) out of range at zoom {zoom}")]
    OutOfRange { x_max: u32, y_max: u32, zoom: u8 },

    /// Minimum corner lies beyond the maximum corner.
    #[error("inverted corners ({x_min}, {y_min}) > ({x_max}, {y_max})")]
    Inverted {
        x_min: u32,
        y_min: u32,
        x_max: u32,
        y_max: u32,
    },

    /// Operands live at different zoom levels.
    #[error("zoom mismatch: expected {expected}, found {found}")]
    ZoomMismatch { expected: u8, found: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bb(zoom: u8, x0: u32, y0: u32, x1: u32, y1: u32) -> TileBBox {
        TileBBox::new(zoom, x0, y0, x1, y1).unwrap()
    }

    #[test]
    fn test_new_validates() {
        assert!(TileBBox::new(4, 0, 0, 15, 15).is_ok());
        assert!(matches!(
            TileBBox::new(4, 0, 0, 16, 0),
            Err(BBoxError::OutOfRange { .. })
        ));
        assert!(matches!(
            TileBBox::new(4, 5, 0, 4, 0),
            Err(BBoxError::Inverted { .. })
        ));
        assert!(TileBBox::new(31, 0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_dimensions_and_corners() {
        let b = bb(5, 2, 3, 4, 7);
        assert_eq!(b.width(), 3);
        assert_eq!(b.height(), 5);
        assert_eq!(b.count(), 15);
        assert_eq!(b.origin(), Some(TileCoord::new(5, 2, 3).unwrap()));
        assert_eq!(b.extent(), Some(TileCoord::new(5, 4, 7).unwrap()));
        assert!(!b.is_empty());
    }

    #[test]
    fn test_empty_box() {
        let b = TileBBox::new_empty(6).unwrap();
        assert!(b.is_empty());
        assert_eq!(b.count(), 0);
        assert_eq!(b.origin(), None);
        assert_eq!(b.extent(), None);
        assert_eq!(b.coords().count(), 0);
    }

    #[test]
    fn test_contains() {
        let b = bb(5, 2, 3, 4, 7);
        assert!(b.contains(&TileCoord::new(5, 2, 3).unwrap()));
        assert!(b.contains(&TileCoord::new(5, 4, 7).unwrap()));
        assert!(!b.contains(&TileCoord::new(5, 5, 3).unwrap()));
        assert!(!b.contains(&TileCoord::new(5, 2, 8).unwrap()));
        // different zoom level never matches
        assert!(!b.contains(&TileCoord::new(6, 3, 4).unwrap()));
    }

    #[test]
    fn test_include_coord_grows_minimally() {
        let mut b = TileBBox::new_empty(4).unwrap();
        b.include_coord(&TileCoord::new(4, 3, 5).unwrap()).unwrap();
        assert_eq!(b, bb(4, 3, 5, 3, 5));

        b.include_coord(&TileCoord::new(4, 6, 2).unwrap()).unwrap();
        assert_eq!(b, bb(4, 3, 2, 6, 5));

        assert!(b.include_coord(&TileCoord::new(5, 0, 0).unwrap()).is_err());
    }

    #[test]
    fn test_include_union() {
        let mut a = bb(4, 4, 4, 6, 6);
        let b = bb(4, 2, 5, 8, 7);
        a.include(&b).unwrap();
        assert_eq!(a, bb(4, 2, 4, 8, 7));

        // empty operand is a no-op
        let empty = TileBBox::new_empty(4).unwrap();
        a.include(&empty).unwrap();
        assert_eq!(a, bb(4, 2, 4, 8, 7));

        // empty receiver adopts the operand
        let mut e = TileBBox::new_empty(4).unwrap();
        e.include(&b).unwrap();
        assert_eq!(e, b);

        let other_zoom = bb(5, 0, 0, 1, 1);
        assert!(a.include(&other_zoom).is_err());
    }

    #[test]
    fn test_side_lines() {
        let b = bb(5, 2, 3, 4, 7);
        assert_eq!(b.side_line(Side::Left), bb(5, 2, 3, 2, 7));
        assert_eq!(b.side_line(Side::Right), bb(5, 4, 3, 4, 7));
        assert_eq!(b.side_line(Side::Top), bb(5, 2, 3, 4, 3));
        assert_eq!(b.side_line(Side::Bottom), bb(5, 2, 7, 4, 7));
    }

    #[test]
    fn test_side_line_of_empty_box_is_empty() {
        let b = TileBBox::new_empty(5).unwrap();
        for side in Side::ALL {
            assert!(b.side_line(side).is_empty());
        }
    }

    #[test]
    fn test_shrink_each_side() {
        let mut b = bb(5, 2, 3, 4, 7);
        b.shrink(Side::Left);
        assert_eq!(b, bb(5, 3, 3, 4, 7));
        b.shrink(Side::Right);
        assert_eq!(b, bb(5, 3, 3, 3, 7));
        b.shrink(Side::Top);
        assert_eq!(b, bb(5, 3, 4, 3, 7));
        b.shrink(Side::Bottom);
        assert_eq!(b, bb(5, 3, 4, 3, 6));
    }

    #[test]
    fn test_shrink_never_inverts() {
        let mut b = bb(5, 2, 2, 2, 2);
        b.shrink(Side::Left);
        assert!(b.is_empty());
        // further shrinking stays empty instead of wrapping around
        for side in Side::ALL {
            b.shrink(side);
            assert!(b.is_empty());
        }
    }

    #[test]
    fn test_repeated_shrink_terminates() {
        let mut b = bb(6, 10, 10, 14, 13);
        let mut steps = 0;
        while !b.is_empty() {
            b.shrink(Side::Left);
            steps += 1;
            assert!(steps <= 5, "shrink loop failed to terminate");
        }
        assert_eq!(steps, 5);
    }

    #[test]
    fn test_coords_row_major() {
        let b = bb(4, 1, 2, 2, 3);
        let coords: Vec<_> = b.coords().collect();
        assert_eq!(
            coords,
            vec![
                TileCoord::new(4, 1, 2).unwrap(),
                TileCoord::new(4, 2, 2).unwrap(),
                TileCoord::new(4, 1, 3).unwrap(),
                TileCoord::new(4, 2, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(bb(5, 2, 3, 4, 7).to_string(), "z5 [2,3 .. 4,7]");
        assert_eq!(TileBBox::new_empty(3).unwrap().to_string(), "z3 empty");
    }
}
