//! Tilewright - raster map tile pyramid maintenance
//!
//! This library maintains XYZ tile pyramids on disk: it synthesizes
//! lower-zoom overview tiles from their four children, trims blank border
//! regions off a tileset, merges tilesets produced by independent sources,
//! and augments base tiles with a remotely fetched overlay layer.
//!
//! Every stage follows the same shape: a driver enumerates tile
//! coordinates or paths, feeds them into a [`pool::WorkerPool`] configured
//! with the stage's worker function, and collects one status message per
//! job. The pixel work is delegated to an [`imaging::Compositor`]
//! implementation.

pub mod bbox;
pub mod config;
pub mod coord;
pub mod imaging;
pub mod logging;
pub mod merge;
pub mod overlay;
pub mod overview;
pub mod pool;
pub mod provider;
pub mod raster;
pub mod tileset;
pub mod trim;

/// Version of the Tilewright library and CLI.
///
/// This is synchronized across all components in the workspace. The version
/// is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
