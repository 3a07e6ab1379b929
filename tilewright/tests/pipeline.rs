//! End-to-end pipeline tests over real tileset directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use tilewright::coord::TileCoord;
use tilewright::imaging::{Compositor, ImageCompositor};
use tilewright::merge::{SourceIndex, TilesetMerger};
use tilewright::overview::OverviewBuilder;
use tilewright::pool::WorkerPool;
use tilewright::tileset::{ensure_parent, Tileset};
use tilewright::trim::EdgeTrimmer;

const SIZE: u32 = 8;
const LEAF_ZOOM: u8 = 18;

const WHITE: [u8; 4] = [255, 255, 255, 255];
const FOREST: [u8; 4] = [34, 80, 40, 255];

fn write_tile(root: &Path, coord: &TileCoord, color: [u8; 4]) -> PathBuf {
    let tiles = Tileset::new(root, "png");
    let path = tiles.tile_path(coord);
    ensure_parent(&path).unwrap();
    RgbaImage::from_pixel(SIZE, SIZE, Rgba(color))
        .save(&path)
        .unwrap();
    path
}

fn compositor() -> Arc<dyn Compositor> {
    Arc::new(ImageCompositor::with_tile_size(SIZE))
}

#[test]
fn trim_reduces_quadrant_to_single_content_tile() {
    let dir = TempDir::new().unwrap();

    // A 2x2 grid of leaf tiles: three blank, one carrying content.
    let coords = [
        (100_000, 125_184, WHITE),
        (100_001, 125_184, WHITE),
        (100_000, 125_185, WHITE),
        (100_001, 125_185, FOREST),
    ];
    for (x, y, color) in coords {
        write_tile(dir.path(), &TileCoord::new(LEAF_ZOOM, x, y).unwrap(), color);
    }

    let tiles = Tileset::open(dir.path(), "png").unwrap();
    let report = EdgeTrimmer::new(tiles.clone(), compositor(), LEAF_ZOOM)
        .trim()
        .unwrap();

    assert_eq!(report.bounds.count(), 1);
    assert_eq!(report.tiles_removed, 3);

    let survivor = TileCoord::new(LEAF_ZOOM, 100_001, 125_185).unwrap();
    assert_eq!(report.bounds.origin(), Some(survivor));
    assert!(tiles.tile_exists(&survivor));
    for (x, y, _) in &coords[..3] {
        assert!(!tiles.tile_exists(&TileCoord::new(LEAF_ZOOM, *x, *y).unwrap()));
    }
}

#[tokio::test]
async fn overview_pyramid_builds_from_leaf_level() {
    let dir = TempDir::new().unwrap();
    let tiles = Tileset::new(dir.path(), "png");

    // A full quadrant of leaf tiles under one zoom-17 parent.
    let leaf_origin = TileCoord::new(LEAF_ZOOM, 131_072, 93_322).unwrap();
    for leaf in [
        leaf_origin,
        leaf_origin.right(),
        leaf_origin.down(),
        leaf_origin.right().down(),
    ] {
        write_tile(dir.path(), &leaf, FOREST);
    }

    let builder = OverviewBuilder::new(tiles.clone(), compositor());
    let pool = WorkerPool::new(4).unwrap();
    let messages = builder
        .build_levels(&pool, LEAF_ZOOM, 15, &CancellationToken::new())
        .await
        .unwrap();

    // One overview per level: 17, 16, 15.
    assert_eq!(messages.len(), 3);
    assert!(tiles.tile_exists(&leaf_origin.parent()));
    assert!(tiles.tile_exists(&leaf_origin.parent().parent()));
    assert!(tiles.tile_exists(&leaf_origin.parent().parent().parent()));

    let overview = image::open(tiles.tile_path(&leaf_origin.parent()))
        .unwrap()
        .to_rgba8();
    assert_eq!(overview.dimensions(), (SIZE, SIZE));
    // A solid quadrant stays solid after downsampling.
    assert_eq!(overview.get_pixel(4, 4).0, FOREST);
}

#[tokio::test]
async fn merge_prefers_links_for_single_source_tiles() {
    let s1 = TempDir::new().unwrap();
    let s2 = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let shared = TileCoord::new(12, 700, 1500).unwrap();
    let exclusive = TileCoord::new(12, 701, 1500).unwrap();
    write_tile(s1.path(), &shared, FOREST);
    write_tile(s2.path(), &shared, [90, 90, 200, 255]);
    let exclusive_src = write_tile(s2.path(), &exclusive, [10, 10, 10, 255]);

    let index = Arc::new(
        SourceIndex::build(&[s1.path().to_path_buf(), s2.path().to_path_buf()], "png").unwrap(),
    );
    let output = Tileset::new(out.path(), "png");
    let merger = TilesetMerger::new(index, output.clone(), compositor());

    let pool = WorkerPool::new(2).unwrap();
    let results = merger.run(&pool, CancellationToken::new()).await;

    assert_eq!(results.len(), 2);
    let blended = results
        .iter()
        .find(|r| r.subject.ends_with("700/1500.png"))
        .unwrap();
    assert!(blended.message.contains("blended 2 sources"));

    // The exclusive tile is linked byte-for-byte.
    assert_eq!(
        fs::read(output.tile_path(&exclusive)).unwrap(),
        fs::read(&exclusive_src).unwrap()
    );
}

#[tokio::test]
async fn full_run_trim_then_overview() {
    let dir = TempDir::new().unwrap();
    let tiles = Tileset::new(dir.path(), "png");

    // Quadrant with content plus a blank column to its west.
    let origin = TileCoord::new(LEAF_ZOOM, 2000, 3000).unwrap();
    for leaf in [origin, origin.right(), origin.down(), origin.right().down()] {
        write_tile(dir.path(), &leaf, FOREST);
    }
    write_tile(
        dir.path(),
        &TileCoord::new(LEAF_ZOOM, 1999, 3000).unwrap(),
        WHITE,
    );
    write_tile(
        dir.path(),
        &TileCoord::new(LEAF_ZOOM, 1999, 3001).unwrap(),
        WHITE,
    );

    let report = EdgeTrimmer::new(tiles.clone(), compositor(), LEAF_ZOOM)
        .trim()
        .unwrap();
    assert_eq!(report.tiles_removed, 2);
    assert_eq!(report.bounds.count(), 4);

    let builder = OverviewBuilder::new(tiles.clone(), compositor());
    let pool = WorkerPool::new(2).unwrap();
    let messages = builder
        .build_levels(&pool, LEAF_ZOOM, LEAF_ZOOM - 1, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(messages.len(), 1);
    assert!(tiles.tile_exists(&origin.parent()));
}
