#[allow(dead_code)]
mod common;

use emstitch_core::brute::{find_best_angle, slice_to_slice_brute_force, BruteForceOptions};
use emstitch_core::ops::rotate;
use emstitch_core::pool::WorkerPools;

fn coarse_grid() -> Vec<f64> {
    (0..180).map(|i| -180.0 + i as f64 * 2.0).collect()
}

/// Rotation recovery over the coarse grid: the winning angle lands within
/// the grid spacing of the applied rotation.
#[test]
fn test_rotation_recovery_coarse() {
    let fixed = common::textured_image(48, 48);
    let pools = WorkerPools::with_threads(2, 1);

    for &theta in &[-45.0, -10.0, 0.0, 7.0, 33.0] {
        let moving = rotate(&fixed, theta);
        let options = BruteForceOptions {
            angle_list: Some(coarse_grid()),
            ..Default::default()
        };
        let record = slice_to_slice_brute_force(&fixed, &moving, &options, &pools).unwrap();
        assert!(
            (record.angle - theta).abs() <= 2.0,
            "recovered {} for applied {theta}",
            record.angle
        );
    }
}

/// With no caller-supplied grid the fine pass runs and sharpens the answer.
#[test]
fn test_rotation_recovery_refined() {
    let fixed = common::textured_image(48, 48);
    let moving = rotate(&fixed, 7.3);
    let pools = WorkerPools::with_threads(2, 1);

    let record =
        slice_to_slice_brute_force(&fixed, &moving, &BruteForceOptions::default(), &pools)
            .unwrap();
    assert!(
        (record.angle - 7.3).abs() <= 0.3,
        "refined angle {} for applied 7.3",
        record.angle
    );
}

/// Identical sections need no rotation: angle 0 wins the tie-break even when
/// neighbouring angles score similarly.
#[test]
fn test_identical_sections_prefer_zero_angle() {
    let fixed = common::textured_image(48, 48);
    let pools = WorkerPools::with_threads(2, 1);

    let options = BruteForceOptions {
        angle_list: Some(vec![-4.0, -2.0, 0.0, 2.0, 4.0]),
        ..Default::default()
    };
    let record = slice_to_slice_brute_force(&fixed, &fixed.clone(), &options, &pools).unwrap();
    assert_eq!(record.angle, 0.0);
    assert!(record.peak.0.abs() <= 1.0);
    assert!(record.peak.1.abs() <= 1.0);
}

/// Downscaled searches report the peak in full-resolution pixels.
#[test]
fn test_downscaled_peak_is_rescaled() {
    let fixed = common::textured_image(96, 96);
    let moving = common::translate_wrapped(&fixed, 8, -6);
    let pools = WorkerPools::with_threads(2, 1);

    let options = BruteForceOptions {
        angle_list: Some(vec![0.0]),
        largest_dimension: Some(48),
        ..Default::default()
    };
    let record = slice_to_slice_brute_force(&fixed, &moving, &options, &pools).unwrap();
    assert!(
        (record.peak.0 - 8.0).abs() <= 2.0,
        "dy = {}",
        record.peak.0
    );
    assert!(
        (record.peak.1 + 6.0).abs() <= 2.0,
        "dx = {}",
        record.peak.1
    );
}

#[test]
fn test_bad_angle_lists_are_rejected() {
    let img = common::textured_image(16, 16);
    let pools = WorkerPools::with_threads(1, 1);
    assert!(find_best_angle(&img, &img, &[], 0.75, &pools).is_err());
    assert!(find_best_angle(&img, &img, &[0.0, f64::NAN], 0.75, &pools).is_err());
}
