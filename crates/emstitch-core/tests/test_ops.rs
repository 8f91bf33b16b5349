#[allow(dead_code)]
mod common;

use ndarray::Array2;

use emstitch_core::image::Image;
use emstitch_core::ops::{
    bilinear_sample, crop, cubic_sample, nearest_sample, pad_for_phase_correlation, pad_to_shape,
    reduce, replace_extrema_with_noise, rotate, scalar_for_max_dimension, CropFill,
};

#[test]
fn test_bilinear_halfway_between_pixels() {
    let mut data = Array2::<f32>::zeros((4, 4));
    data[[1, 1]] = 1.0;
    assert!((bilinear_sample(&data, 1.0, 1.0, 0.0) - 1.0).abs() < 1e-6);
    assert!((bilinear_sample(&data, 1.0, 1.5, 0.0) - 0.5).abs() < 1e-6);
}

#[test]
fn test_bilinear_fill_value_outside_array() {
    let data = Array2::<f32>::zeros((4, 4));
    assert_eq!(bilinear_sample(&data, -3.0, 1.0, 0.9), 0.9);
    // Halfway off the edge blends the fill value in.
    assert!((bilinear_sample(&data, -0.5, 1.0, 1.0) - 0.5).abs() < 1e-6);
}

#[test]
fn test_cubic_reproduces_grid_values() {
    let mut data = Array2::<f32>::zeros((6, 6));
    data[[2, 3]] = 0.8;
    assert!((cubic_sample(&data, 2.0, 3.0, 0.0) - 0.8).abs() < 1e-6);
}

#[test]
fn test_cubic_interpolates_constant_region_exactly() {
    let data = Array2::from_elem((8, 8), 0.5f32);
    // Catmull-Rom weights sum to 1, so a constant patch stays constant.
    assert!((cubic_sample(&data, 3.5, 4.25, 0.0) - 0.5).abs() < 1e-5);
}

#[test]
fn test_nearest_outside_returns_cval() {
    let data = Array2::<f32>::zeros((2, 2));
    assert_eq!(nearest_sample(&data, -5.0, 0.0, 9.0), 9.0);
    assert_eq!(nearest_sample(&data, 1.4, 0.6, 9.0), 0.0);
}

#[test]
fn test_padded_dims_are_powers_of_two() {
    let img = Image::zeros(100, 150);
    let padded = pad_for_phase_correlation(&img, 0.75).unwrap();
    // 100 / 0.75 = 133.3 -> 256; 150 / 0.75 = 200 -> 256
    assert_eq!(padded.dim(), (256, 256));

    let tight = pad_for_phase_correlation(&img, 1.0).unwrap();
    assert_eq!(tight.dim(), (128, 256));
}

#[test]
fn test_pad_places_source_at_origin_and_fills_in_range() {
    let mut img = Image::zeros(10, 10);
    img.data.fill(0.5);
    let padded = pad_for_phase_correlation(&img, 0.5).unwrap();
    for r in 0..10 {
        for c in 0..10 {
            assert_eq!(padded.data[[r, c]], 0.5);
        }
    }
    assert!(padded.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_pad_to_shape_never_shrinks() {
    let img = Image::zeros(100, 40);
    let padded = pad_to_shape(&img, 64, 64);
    assert_eq!(padded.dim(), (128, 64));
}

#[test]
fn test_invalid_min_overlap_is_rejected() {
    let img = Image::zeros(8, 8);
    assert!(pad_for_phase_correlation(&img, 0.0).is_err());
    assert!(pad_for_phase_correlation(&img, 1.5).is_err());
}

#[test]
fn test_extrema_are_replaced_and_midtones_kept() {
    let mut data = Array2::<f32>::from_elem((8, 8), 0.4);
    data[[0, 0]] = 0.0;
    data[[7, 7]] = 1.0;
    let out = replace_extrema_with_noise(&Image::new(data), 0.5, 0.25);

    assert_eq!(out.data[[3, 3]], 0.4);
    assert!(out.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

#[test]
fn test_interior_crop_copies_pixels() {
    let img = common::textured_image(10, 10);
    let out = crop(&img, (2, 3), (4, 5), CropFill::Constant(0.0));
    assert_eq!(out.dim(), (4, 5));
    for r in 0..4 {
        for c in 0..5 {
            assert_eq!(out.data[[r, c]], img.data[[r + 2, c + 3]]);
        }
    }
}

#[test]
fn test_crop_constant_fill_outside_source() {
    let img = common::textured_image(4, 4);
    let out = crop(&img, (-2, -2), (4, 4), CropFill::Constant(0.7));
    assert_eq!(out.data[[0, 0]], 0.7);
    assert_eq!(out.data[[2, 2]], img.data[[0, 0]]);
}

#[test]
fn test_crop_noise_fill_stays_in_unit_range() {
    let img = common::textured_image(6, 6);
    let out = crop(&img, (3, 3), (8, 8), CropFill::Noise);
    assert!(out.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    assert_eq!(out.data[[0, 0]], img.data[[3, 3]]);
}

#[test]
fn test_reduce_keeps_constant_image() {
    let mut img = Image::zeros(8, 8);
    img.data.fill(0.6);
    let out = reduce(&img, 0.5).unwrap();
    assert_eq!(out.dim(), (4, 4));
    assert!(out.data.iter().all(|&v| (v - 0.6).abs() < 1e-6));
}

#[test]
fn test_reduce_preserves_mean_of_checkerboard() {
    let mut img = Image::zeros(8, 8);
    for r in 0..8 {
        for c in 0..8 {
            if (r + c) % 2 == 0 {
                img.data[[r, c]] = 1.0;
            }
        }
    }
    let out = reduce(&img, 0.5).unwrap();
    assert!(out.data.iter().all(|&v| (v - 0.5).abs() < 1e-6));
}

#[test]
fn test_reduce_rejects_out_of_range_scalar() {
    let img = Image::zeros(4, 4);
    assert!(reduce(&img, 0.0).is_err());
    assert!(reduce(&img, 2.0).is_err());
}

#[test]
fn test_scalar_for_max_dimension() {
    let s = scalar_for_max_dimension(100, &[(50, 80), (200, 60)]);
    assert!((s - 0.5).abs() < 1e-12);
    assert_eq!(scalar_for_max_dimension(100, &[(40, 40)]), 1.0);
}

#[test]
fn test_zero_rotation_is_identity() {
    let img = common::textured_image(5, 7);
    let out = rotate(&img, 0.0);
    assert_eq!(out.data, img.data);
}

#[test]
fn test_quarter_turn_swaps_dimensions() {
    let img = Image::zeros(10, 20);
    let out = rotate(&img, 90.0);
    // Allow one pixel of slack from the ceil of the rotated bounds.
    assert!(out.height() >= 20 && out.height() <= 21);
    assert!(out.width() >= 10 && out.width() <= 11);
}

#[test]
fn test_image_stats() {
    let img = Image::new(Array2::from_elem((4, 4), 0.25f32));
    assert_eq!(img.median(), 0.25);
    assert_eq!(img.std_dev(), 0.0);

    let mut data = Array2::<f32>::zeros((2, 4));
    for c in 0..4 {
        data[[1, c]] = 1.0;
    }
    let img = Image::new(data);
    assert_eq!(img.median(), 0.5);
    assert!((img.std_dev() - 0.5).abs() < 1e-6);
}
