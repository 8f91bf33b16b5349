//! Scenario tests against captured TEM sections. These need real data and
//! run only when TESTINPUTPATH points at a directory containing the images.

#[allow(dead_code)]
mod common;

use emstitch_core::correlate::find_offset;
use emstitch_core::io::image_io::load_image;
use emstitch_core::ops::{pad_for_phase_correlation, pad_to_shape};

/// Moran Eye Center JEOL sections: Fixed.png vs Moving.png.
#[test]
fn test_moran_fixed_vs_moving() {
    let Some(dir) = common::test_input_dir() else {
        eprintln!("TESTINPUTPATH not set, skipping Moran scenario");
        return;
    };

    let fixed = load_image(&dir.join("Fixed.png")).unwrap();
    let moving = load_image(&dir.join("Moving.png")).unwrap();

    let padded_fixed = pad_for_phase_correlation(&fixed, 0.75).unwrap();
    let (h, w) = padded_fixed.dim();
    let padded_moving = pad_to_shape(&moving, h, w);

    let record = find_offset(&padded_fixed, &padded_moving).unwrap();
    assert_eq!(record.angle, 0.0);
    assert!(
        (record.peak.0 - 88.5).abs() <= 1.0,
        "dy = {}",
        record.peak.0
    );
    assert!(
        (record.peak.1 - 107.0).abs() <= 1.0,
        "dx = {}",
        record.peak.1
    );

    let stos = record.to_stos(
        &dir.join("Fixed.png"),
        &dir.join("Moving.png"),
        fixed.dim(),
        moving.dim(),
        1.0,
    );
    stos.save(&common::test_output_dir().join("moran.stos")).unwrap();
}

/// Brandeis TEM captures from a different scope: B030.png vs B029.png.
#[test]
fn test_brandeis_b030_vs_b029() {
    let Some(dir) = common::test_input_dir() else {
        eprintln!("TESTINPUTPATH not set, skipping Brandeis scenario");
        return;
    };

    let fixed = load_image(&dir.join("B030.png")).unwrap();
    let moving = load_image(&dir.join("B029.png")).unwrap();

    let padded_fixed = pad_for_phase_correlation(&fixed, 0.75).unwrap();
    let (h, w) = padded_fixed.dim();
    let padded_moving = pad_to_shape(&moving, h, w);

    let record = find_offset(&padded_fixed, &padded_moving).unwrap();
    assert_eq!(record.angle, 0.0);
    assert!(
        (record.peak.0 - 452.0).abs() <= 1.5,
        "dy = {}",
        record.peak.0
    );
    assert!(
        (record.peak.1 + 10.0).abs() <= 1.5,
        "dx = {}",
        record.peak.1
    );
}
