#[allow(dead_code)]
mod common;

use ndarray::Array2;

use emstitch_core::assemble::distance::{cached_distance_image, create_distance_image};
use emstitch_core::assemble::{
    composite_with_zbuffer, tiles_to_image, transform_tile, AssembleOptions, TransformedTile,
};
use emstitch_core::consts::MAX_Z;
use emstitch_core::image::Image;
use emstitch_core::io::image_io::{load_image, save_png};
use emstitch_core::spatial::Rectangle;
use emstitch_core::transform::RigidTransform;
use emstitch_core::pool::WorkerPools;

#[test]
fn test_distance_image_is_radially_monotone() {
    let d = create_distance_image(9, 9);
    assert_eq!(d[[4, 4]], 0.0);
    assert!(d[[4, 5]] < d[[4, 6]]);
    assert!(d[[0, 0]] > d[[2, 2]]);
    // Symmetric about the centre.
    assert_eq!(d[[4, 0]], d[[4, 8]]);
    assert_eq!(d[[0, 4]], d[[8, 4]]);
}

#[test]
fn test_distance_cache_round_trip_and_corruption_recovery() {
    let dir = tempfile::tempdir().unwrap();

    let first = cached_distance_image(dir.path(), 16, 24);
    let cache_file = dir.path().join("distance16x24.emsd");
    assert!(cache_file.exists());

    let second = cached_distance_image(dir.path(), 16, 24);
    assert_eq!(first, second);

    // A corrupt cache entry is silently regenerated.
    std::fs::write(&cache_file, b"garbage").unwrap();
    let third = cached_distance_image(dir.path(), 16, 24);
    assert_eq!(first, third);
}

#[test]
fn test_transform_tile_marks_uncovered_pixels() {
    let image = common::textured_image(16, 16);
    let distance = create_distance_image(16, 16);
    let transform = RigidTransform::translation((16.0, 16.0), (0.0, 0.0));

    // Region extends past the tile on the right.
    let region = Rectangle::from_bounds(0.0, 8.0, 16.0, 32.0);
    let warped = transform_tile(&transform, &image, &distance, &region);

    assert_eq!(warped.image.dim(), (16, 24));
    // Covered half matches the source.
    assert!((warped.image[[4, 0]] - image.data[[4, 8]]).abs() < 1e-4);
    assert!(warped.depth[[4, 0]] < MAX_Z);
    // Uncovered half is empty at max depth.
    assert_eq!(warped.image[[4, 20]], 0.0);
    assert_eq!(warped.depth[[4, 20]], MAX_Z);
}

#[test]
fn test_composite_rejects_out_of_bounds_region() {
    let mut canvas = Array2::<f32>::zeros((8, 8));
    let mut zbuffer = Array2::<f32>::from_elem((8, 8), MAX_Z);
    let tile = TransformedTile {
        image: Array2::<f32>::zeros((4, 4)),
        depth: Array2::<f32>::zeros((4, 4)),
    };
    assert!(composite_with_zbuffer(&mut canvas, &mut zbuffer, &tile, (6, 6)).is_err());
    assert!(composite_with_zbuffer(&mut canvas, &mut zbuffer, &tile, (4, 4)).is_ok());
}

/// Rendering a region inside a single tile's support reproduces that tile.
#[test]
fn test_single_tile_region_reproduces_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let pools = WorkerPools::with_threads(2, 1);

    let image = common::textured_image(64, 64);
    let path = dir.path().join("tile.png");
    save_png(&image, &path).unwrap();
    let loaded = load_image(&path).unwrap();

    let transform = RigidTransform::translation((64.0, 64.0), (10.0, 20.0));
    let options = AssembleOptions {
        fixed_region: Some(Rectangle::from_bounds(14.0, 24.0, 60.0, 70.0)),
        cache_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let (out, mask) = tiles_to_image(&[transform], &[path], &options, &pools).unwrap();

    assert_eq!(out.dim(), (46, 46));
    assert!(mask.iter().all(|&m| m));
    for r in 0..46 {
        for c in 0..46 {
            let want = loaded.data[[r + 4, c + 4]];
            let got = out.data[[r, c]];
            assert!(
                (got - want).abs() < 1e-3,
                "pixel ({r}, {c}): got {got}, want {want}"
            );
        }
    }
}

/// In the overlap of two tiles, every output pixel comes from the tile whose
/// centre is closer; the seam is the perpendicular bisector of the centres.
#[test]
fn test_zbuffer_prefers_closer_tile_center() {
    let dir = tempfile::tempdir().unwrap();
    let pools = WorkerPools::with_threads(2, 1);

    let mut a = Image::zeros(80, 80);
    a.data.fill(0.25);
    let mut b = Image::zeros(80, 80);
    b.data.fill(0.75);
    let a_path = dir.path().join("a.png");
    let b_path = dir.path().join("b.png");
    save_png(&a, &a_path).unwrap();
    save_png(&b, &b_path).unwrap();

    let size = (80.0, 80.0);
    let transforms = vec![
        RigidTransform::translation(size, (0.0, 0.0)),
        RigidTransform::translation(size, (0.0, 40.0)),
    ];
    let options = AssembleOptions {
        cache_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let (out, mask) =
        tiles_to_image(&transforms, &[a_path, b_path], &options, &pools).unwrap();

    assert_eq!(out.dim(), (80, 120));
    assert!(mask.iter().all(|&m| m));

    // Centres sit at x = 40 and x = 80; the bisector is x = 60.
    for r in [0usize, 20, 40, 79] {
        assert!((out.data[[r, 55]] - 0.25).abs() < 0.01, "left of seam");
        assert!((out.data[[r, 65]] - 0.75).abs() < 0.01, "right of seam");
    }
    // Outside the overlap each tile renders itself.
    assert!((out.data[[40, 10]] - 0.25).abs() < 0.01);
    assert!((out.data[[40, 110]] - 0.75).abs() < 0.01);
}

/// The output canvas is clamped to [0, 1] and the mask marks coverage.
#[test]
fn test_uncovered_region_is_masked_out() {
    let dir = tempfile::tempdir().unwrap();
    let pools = WorkerPools::with_threads(1, 1);

    let image = common::textured_image(32, 32);
    let path = dir.path().join("tile.png");
    save_png(&image, &path).unwrap();

    let transform = RigidTransform::translation((32.0, 32.0), (0.0, 0.0));
    let options = AssembleOptions {
        fixed_region: Some(Rectangle::from_bounds(0.0, 0.0, 32.0, 64.0)),
        cache_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let (out, mask) = tiles_to_image(&[transform], &[path], &options, &pools).unwrap();
    assert!(mask[[16, 10]]);
    assert!(!mask[[16, 50]]);
    assert_eq!(out.data[[16, 50]], 0.0);
    assert!(out.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
}
