//! 2D FFTs for the phase correlator, built on 1D rustfft plans.
//!
//! The 2D transform runs as two passes of row transforms with a transpose in
//! between, so forward and inverse share one row driver and every pass works
//! on contiguous memory.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftDirection, FftPlanner};

/// Run a planned 1D FFT over every row, rows in parallel.
fn run_rows(data: &mut Array2<Complex<f64>>, fft: &dyn Fft<f64>) {
    data.axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut row| {
            if let Some(slice) = row.as_slice_mut() {
                fft.process(slice);
            } else {
                let mut buffer = row.to_vec();
                fft.process(&mut buffer);
                for (dst, value) in row.iter_mut().zip(buffer) {
                    *dst = value;
                }
            }
        });
}

fn transposed(spectrum: Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    spectrum.reversed_axes().as_standard_layout().into_owned()
}

/// Transform rows, transpose, transform the (former) columns, transpose back.
fn transform_2d(
    mut spectrum: Array2<Complex<f64>>,
    direction: FftDirection,
) -> Array2<Complex<f64>> {
    let mut planner = FftPlanner::new();
    for _ in 0..2 {
        let fft = planner.plan_fft(spectrum.ncols(), direction);
        run_rows(&mut spectrum, fft.as_ref());
        spectrum = transposed(spectrum);
    }
    spectrum
}

/// Forward 2D FFT of a real image. The DC term lands at index (0, 0).
pub fn fft2d_forward(image: &Array2<f32>) -> Array2<Complex<f64>> {
    let spectrum = image.mapv(|v| Complex::new(v as f64, 0.0));
    transform_2d(spectrum, FftDirection::Forward)
}

/// Inverse 2D FFT, returning the real part normalised by `1/(h*w)`.
pub fn ifft2d_real(spectrum: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = spectrum.dim();
    let scale = 1.0 / (h * w) as f64;
    transform_2d(spectrum.clone(), FftDirection::Inverse).mapv(|v| v.re * scale)
}

/// Move the zero-offset bin to the geometric centre (h/2, w/2).
pub fn fftshift(data: &Array2<f64>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut result = Array2::<f64>::zeros((h, w));
    for row in 0..h {
        for col in 0..w {
            result[[(row + h / 2) % h, (col + w / 2) % w]] = data[[row, col]];
        }
    }
    result
}
