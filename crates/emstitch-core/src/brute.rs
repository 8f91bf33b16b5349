//! Brute-force slice-to-slice registration: find the rotation angle which
//! best aligns two section images, by running phase correlation over a grid
//! of candidate angles.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::{
    COARSE_ANGLE_STEP, DEFAULT_EXTREMA_MEAN, DEFAULT_EXTREMA_STDDEV, DEFAULT_MIN_OVERLAP,
    FINE_ANGLE_COUNT, FINE_ANGLE_STEP,
};
use crate::correlate::find_offset;
use crate::error::{Result, StitchError};
use crate::image::Image;
use crate::ops::{pad_to_shape, reduce, replace_extrema_with_noise, rotate, scalar_for_max_dimension};
use crate::pool::WorkerPools;
use crate::record::AlignmentRecord;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BruteForceOptions {
    /// Candidate angles in degrees. `None` runs the coarse -180..180 grid
    /// followed by a fine refinement pass around the winner.
    pub angle_list: Option<Vec<f64>>,
    /// Minimum-overlap ratio used when padding for phase correlation.
    pub min_overlap: f64,
    /// Downscale both images so the largest dimension does not exceed this.
    /// The returned peak is always in full-resolution pixels.
    pub largest_dimension: Option<usize>,
}

impl Default for BruteForceOptions {
    fn default() -> Self {
        Self {
            angle_list: None,
            min_overlap: DEFAULT_MIN_OVERLAP,
            largest_dimension: None,
        }
    }
}

/// Evaluate the hypothesis that the moving image sits `angle` degrees
/// rotated relative to the fixed image: un-rotate it, pad both images to a
/// common power-of-two shape and phase correlate.
fn test_one_angle(
    fixed: &Image,
    moving: &Image,
    angle: f64,
    min_overlap: f64,
) -> Result<AlignmentRecord> {
    let rotated = rotate(moving, -angle);

    // Both operands must share a shape; the slack keeps the wrap-around
    // ambiguity away from plausible offsets.
    let (rh, rw) = rotated.dim();
    let (fh, fw) = fixed.dim();
    let target_h = ((rh as f64 / min_overlap).ceil() as usize).max(fh);
    let target_w = ((rw as f64 / min_overlap).ceil() as usize).max(fw);

    let padded_moving = pad_to_shape(&rotated, target_h, target_w);
    let padded_fixed = pad_to_shape(fixed, target_h, target_w);

    let record = find_offset(&padded_fixed, &padded_moving)?;
    Ok(AlignmentRecord::new(record.peak, record.weight, angle))
}

/// True when `a` beats `b`: higher weight, ties broken by smaller |angle|,
/// then smaller |peak|.
fn better_record(a: &AlignmentRecord, b: &AlignmentRecord) -> bool {
    if a.weight != b.weight {
        return a.weight > b.weight;
    }
    let (aa, ab) = (a.angle.abs(), b.angle.abs());
    if aa != ab {
        return aa < ab;
    }
    let norm = |r: &AlignmentRecord| r.peak.0 * r.peak.0 + r.peak.1 * r.peak.1;
    norm(a) < norm(b)
}

/// Run the phase correlator at every candidate angle on the compute pool and
/// keep the best record.
pub fn find_best_angle(
    fixed: &Image,
    moving: &Image,
    angles: &[f64],
    min_overlap: f64,
    pools: &WorkerPools,
) -> Result<AlignmentRecord> {
    if angles.is_empty() {
        return Err(StitchError::InvalidInput("empty angle list".into()));
    }
    if angles.iter().any(|a| !a.is_finite()) {
        return Err(StitchError::InvalidInput(
            "angle list contains a non-finite angle".into(),
        ));
    }

    let records: Result<Vec<AlignmentRecord>> = pools.compute.install(|| {
        angles
            .par_iter()
            .map(|&angle| test_one_angle(fixed, moving, angle, min_overlap))
            .collect()
    });
    let records = records?;

    let mut best = records[0].clone();
    for record in &records[1..] {
        if better_record(record, &best) {
            best = record.clone();
        }
    }
    debug!(angle = best.angle, weight = best.weight, "best angle");
    Ok(best)
}

/// Find the rotation angle and offset that best align `moving` onto `fixed`.
///
/// When no angle list is supplied, a coarse pass covers -180..180 degrees at
/// 2 degree spacing and a fine pass then evaluates 0.1 degree steps across
/// [coarse - 1, coarse + 1]. The returned peak refers to full-resolution
/// pixels even when the search ran on reduced images.
pub fn slice_to_slice_brute_force(
    fixed: &Image,
    moving: &Image,
    options: &BruteForceOptions,
    pools: &WorkerPools,
) -> Result<AlignmentRecord> {
    let mut scalar = 1.0;
    if let Some(largest) = options.largest_dimension {
        scalar = scalar_for_max_dimension(largest, &[fixed.dim(), moving.dim()]);
    }

    let (fixed, moving) = if scalar < 1.0 {
        (reduce(fixed, scalar)?, reduce(moving, scalar)?)
    } else {
        (fixed.clone(), moving.clone())
    };

    let fixed = replace_extrema_with_noise(&fixed, DEFAULT_EXTREMA_MEAN, DEFAULT_EXTREMA_STDDEV);
    let moving = replace_extrema_with_noise(&moving, DEFAULT_EXTREMA_MEAN, DEFAULT_EXTREMA_STDDEV);

    let user_defined_angles = options.angle_list.is_some();
    let coarse_angles: Vec<f64> = match &options.angle_list {
        Some(list) => list.clone(),
        None => {
            let steps = (360.0 / COARSE_ANGLE_STEP) as i64;
            (0..steps)
                .map(|i| -180.0 + i as f64 * COARSE_ANGLE_STEP)
                .collect()
        }
    };

    let best = find_best_angle(&fixed, &moving, &coarse_angles, options.min_overlap, pools)?;

    // Refine around the coarse winner when the caller left the grid to us.
    let mut refined = if user_defined_angles {
        best
    } else {
        let fine_angles: Vec<f64> = (0..FINE_ANGLE_COUNT)
            .map(|i| best.angle - 1.0 + i as f64 * FINE_ANGLE_STEP)
            .collect();
        find_best_angle(&fixed, &moving, &fine_angles, options.min_overlap, pools)?
    };

    if scalar < 1.0 {
        refined.scale_peak(1.0 / scalar);
    }

    info!(
        angle = refined.angle,
        dy = refined.peak.0,
        dx = refined.peak.1,
        weight = refined.weight,
        "slice-to-slice registration"
    );
    Ok(refined)
}
