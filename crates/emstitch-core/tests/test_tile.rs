#[allow(dead_code)]
mod common;

use std::path::PathBuf;

use emstitch_core::io::image_io::save_png;
use emstitch_core::spatial::Rectangle;
use emstitch_core::tile::{create_tiles, whole_image_offset, Tile};
use emstitch_core::transform::RigidTransform;

#[test]
fn test_missing_tiles_are_skipped() {
    let transforms = vec![RigidTransform::translation((8.0, 8.0), (0.0, 0.0))];
    let paths = vec![PathBuf::from("/nonexistent/tile.png")];
    assert!(create_tiles(transforms, paths).is_empty());
}

#[test]
fn test_bounding_boxes_follow_the_transform() {
    let tile = Tile::new(
        3,
        RigidTransform::translation((100.0, 50.0), (10.0, 20.0)),
        PathBuf::from("unused.png"),
    );
    assert_eq!(tile.id(), 3);
    assert_eq!(
        tile.fixed_bounding_box(),
        Rectangle::from_bounds(10.0, 20.0, 110.0, 70.0)
    );
    assert_eq!(
        tile.mapped_bounding_box(),
        Rectangle::from_bounds(0.0, 0.0, 100.0, 50.0)
    );
}

#[test]
fn test_lazy_caches_and_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let image = common::textured_image(40, 60);
    let path = dir.path().join("tile.png");
    save_png(&image, &path).unwrap();

    let mut tile = Tile::new(0, RigidTransform::translation((40.0, 60.0), (0.0, 0.0)), path);

    assert_eq!(tile.image().unwrap().dim(), (40, 60));
    // 40 / 0.75 -> 64, 60 / 0.75 -> 128
    assert_eq!(tile.padded_image().unwrap().dim(), (64, 128));
    assert_eq!(tile.fft().unwrap().dim(), (64, 128));

    tile.evict_caches();
    assert_eq!(tile.image().unwrap().dim(), (40, 60));
}

#[test]
fn test_missing_image_load_fails() {
    let tile = Tile::new(
        0,
        RigidTransform::translation((8.0, 8.0), (0.0, 0.0)),
        PathBuf::from("/nonexistent/tile.png"),
    );
    assert!(tile.image().is_err());
    assert!(tile.precalculate().is_err());
}

#[test]
fn test_whole_image_offset_of_identical_tiles() {
    let dir = tempfile::tempdir().unwrap();
    let image = common::textured_image(48, 48);
    let path = dir.path().join("tile.png");
    save_png(&image, &path).unwrap();

    let a = Tile::new(0, RigidTransform::translation((48.0, 48.0), (0.0, 0.0)), path.clone());
    let b = Tile::new(1, RigidTransform::translation((48.0, 48.0), (0.0, 0.0)), path);
    a.precalculate().unwrap();

    let record = whole_image_offset(&a, &b).unwrap();
    assert!(record.peak.0.abs() <= 1.0);
    assert!(record.peak.1.abs() <= 1.0);
    assert!(record.weight > 0.0);
}
