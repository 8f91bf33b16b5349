//! FFT phase correlation between two equally shaped images.

use ndarray::Array2;
use num_complex::Complex;

use crate::consts::PEAK_EXCLUSION_RADIUS;
use crate::error::{Result, StitchError};
use crate::image::Image;
use crate::record::AlignmentRecord;

use super::fft2d::{fft2d_forward, fftshift, ifft2d_real};
use super::peak::{center_of_mass, find_peak, normalize_surface, second_peak_value};

/// Normalised cross-power spectrum of A against B. The inverse transform of
/// this spectrum peaks at the translation that overlays B onto A.
pub(crate) fn normalized_cross_power(
    a_fft: &Array2<Complex<f64>>,
    b_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let (h, w) = a_fft.dim();
    let mut result = Array2::<Complex<f64>>::zeros((h, w));

    for row in 0..h {
        for col in 0..w {
            let cross = a_fft[[row, col]] * b_fft[[row, col]].conj();
            let mag = cross.norm();
            result[[row, col]] = if mag > 1e-12 {
                cross / mag
            } else {
                Complex::new(0.0, 0.0)
            };
        }
    }

    result
}

/// Estimate the translation between `fixed` and `moving` by phase
/// correlation.
///
/// The returned peak is (dy, dx): translating the moving image by the peak
/// aligns it onto the fixed image. Weight is the normalised peak amplitude
/// scaled by the margin over the second-highest local maximum; a peak on the
/// surface boundary gets weight 0.
pub fn find_offset(fixed: &Image, moving: &Image) -> Result<AlignmentRecord> {
    let (h, w) = fixed.dim();
    let (th, tw) = moving.dim();
    if h != th || w != tw {
        return Err(StitchError::ShapeMismatch {
            a_height: h,
            a_width: w,
            b_height: th,
            b_width: tw,
        });
    }
    if fixed.has_nan() || moving.has_nan() {
        return Err(StitchError::InvalidInput(
            "phase correlation input contains NaN".into(),
        ));
    }

    let fixed_fft = fft2d_forward(&fixed.data);
    let moving_fft = fft2d_forward(&moving.data);

    find_offset_prepared(&fixed_fft, &moving_fft)
}

/// Phase correlation on precomputed forward FFTs, for callers that cache
/// spectra per tile.
pub fn find_offset_prepared(
    fixed_fft: &Array2<Complex<f64>>,
    moving_fft: &Array2<Complex<f64>>,
) -> Result<AlignmentRecord> {
    let (h, w) = fixed_fft.dim();
    let (th, tw) = moving_fft.dim();
    if h != th || w != tw {
        return Err(StitchError::ShapeMismatch {
            a_height: h,
            a_width: w,
            b_height: th,
            b_width: tw,
        });
    }

    let cross = normalized_cross_power(fixed_fft, moving_fft);
    let correlation = ifft2d_real(&cross);
    let mut surface = fftshift(&correlation);
    normalize_surface(&mut surface);

    let (peak_row, peak_col, peak_val) = find_peak(&surface);

    let cy = (h / 2) as f64;
    let cx = (w / 2) as f64;

    // A boundary peak cannot be disambiguated from its wrap-around twin.
    if peak_row == 0 || peak_row == h - 1 || peak_col == 0 || peak_col == w - 1 {
        return Ok(AlignmentRecord::new(
            (peak_row as f64 - cy, peak_col as f64 - cx),
            0.0,
            0.0,
        ));
    }

    let (sub_row, sub_col) = center_of_mass(&surface, peak_row, peak_col, 1);
    let second = second_peak_value(&surface, peak_row, peak_col, PEAK_EXCLUSION_RADIUS);
    let weight = (peak_val * (1.0 - second)).max(0.0);

    Ok(AlignmentRecord::new(
        (sub_row - cy, sub_col - cx),
        weight,
        0.0,
    ))
}
