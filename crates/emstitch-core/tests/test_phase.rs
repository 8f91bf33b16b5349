#[allow(dead_code)]
mod common;

use ndarray::Array2;

use emstitch_core::correlate::fft2d::{fft2d_forward, fftshift, ifft2d_real};
use emstitch_core::correlate::{find_offset, find_offset_prepared};
use emstitch_core::error::StitchError;
use emstitch_core::image::Image;

#[test]
fn test_fft_forward_inverse_round_trip() {
    let mut data = Array2::<f32>::zeros((16, 16));
    data[[3, 5]] = 1.0;
    data[[10, 2]] = 0.5;

    let spectrum = fft2d_forward(&data);
    let restored = ifft2d_real(&spectrum);

    for r in 0..16 {
        for c in 0..16 {
            assert!((restored[[r, c]] - data[[r, c]] as f64).abs() < 1e-9);
        }
    }
}

#[test]
fn test_fftshift_moves_origin_to_center() {
    let mut data = Array2::<f64>::zeros((8, 8));
    data[[0, 0]] = 1.0;
    let shifted = fftshift(&data);
    assert_eq!(shifted[[4, 4]], 1.0);
}

#[test]
fn test_dc_term_is_image_sum() {
    let data = Array2::<f32>::from_elem((8, 8), 0.25);
    let spectrum = fft2d_forward(&data);
    assert!((spectrum[[0, 0]].re - 16.0).abs() < 1e-9);
    assert!(spectrum[[0, 0]].im.abs() < 1e-9);
}

/// Aligning an image to itself yields a zero offset.
#[test]
fn test_self_alignment() {
    let img = common::textured_image(64, 64);
    let record = find_offset(&img, &img).unwrap();

    assert_eq!(record.angle, 0.0);
    assert!(record.peak.0.abs() <= 1.0, "dy = {}", record.peak.0);
    assert!(record.peak.1.abs() <= 1.0, "dx = {}", record.peak.1);
    assert!(record.weight > 0.5, "weight = {}", record.weight);
}

/// A known translation is recovered within a pixel.
#[test]
fn test_translation_recovery() {
    let img = common::textured_image(64, 64);

    for &(dy, dx) in &[(3i64, 5i64), (-7, 2), (0, -12), (15, 15), (-16, -9)] {
        let moved = common::translate_wrapped(&img, dy, dx);
        let record = find_offset(&img, &moved).unwrap();
        assert!(
            (record.peak.0 - dy as f64).abs() <= 1.0,
            "dy: got {} want {}",
            record.peak.0,
            dy
        );
        assert!(
            (record.peak.1 - dx as f64).abs() <= 1.0,
            "dx: got {} want {}",
            record.peak.1,
            dx
        );
        assert!(record.weight > 0.0);
    }
}

#[test]
fn test_shape_mismatch_is_rejected() {
    let a = Image::zeros(32, 32);
    let b = Image::zeros(32, 64);
    assert!(matches!(
        find_offset(&a, &b),
        Err(StitchError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_nan_input_is_rejected() {
    let a = common::textured_image(16, 16);
    let mut b = common::textured_image(16, 16);
    b.data[[3, 3]] = f32::NAN;
    assert!(matches!(
        find_offset(&a, &b),
        Err(StitchError::InvalidInput(_))
    ));
}

#[test]
fn test_prepared_ffts_match_direct_path() {
    let a = common::textured_image(32, 32);
    let b = common::translate_wrapped(&a, 4, -3);

    let direct = find_offset(&a, &b).unwrap();
    let prepared =
        find_offset_prepared(&fft2d_forward(&a.data), &fft2d_forward(&b.data)).unwrap();

    assert!((direct.peak.0 - prepared.peak.0).abs() < 1e-9);
    assert!((direct.peak.1 - prepared.peak.1).abs() < 1e-9);
    assert!((direct.weight - prepared.weight).abs() < 1e-9);
}

#[test]
fn test_prepared_shape_mismatch_is_rejected() {
    let a = common::textured_image(16, 16);
    let b = common::textured_image(32, 32);
    assert!(matches!(
        find_offset_prepared(&fft2d_forward(&a.data), &fft2d_forward(&b.data)),
        Err(StitchError::ShapeMismatch { .. })
    ));
}

/// An ambiguous surface (periodic content) scores lower than a distinct one.
#[test]
fn test_periodic_content_is_down_weighted() {
    let distinct = common::textured_image(64, 64);
    let distinct_weight = find_offset(&distinct, &distinct).unwrap().weight;

    let mut periodic = Image::zeros(64, 64);
    for r in 0..64 {
        for c in 0..64 {
            if c % 8 < 4 {
                periodic.data[[r, c]] = 0.9;
            } else {
                periodic.data[[r, c]] = 0.1;
            }
        }
    }
    let periodic_weight = find_offset(&periodic, &periodic).unwrap().weight;

    assert!(
        periodic_weight < distinct_weight,
        "periodic {periodic_weight} vs distinct {distinct_weight}"
    );
}
