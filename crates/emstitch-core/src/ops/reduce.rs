use ndarray::Array2;

use crate::error::{Result, StitchError};
use crate::image::Image;

/// Downsample by `scalar` < 1 using an area-weighted box filter. Each output
/// pixel averages the source box it covers, with fractional edge coverage.
pub fn reduce(image: &Image, scalar: f64) -> Result<Image> {
    if !(scalar > 0.0 && scalar <= 1.0) {
        return Err(StitchError::InvalidInput(format!(
            "reduce scalar must be in (0, 1], got {scalar}"
        )));
    }
    if scalar == 1.0 {
        return Ok(image.clone());
    }

    let (h, w) = image.dim();
    let new_h = ((h as f64 * scalar).round() as usize).max(1);
    let new_w = ((w as f64 * scalar).round() as usize).max(1);
    let sy = h as f64 / new_h as f64;
    let sx = w as f64 / new_w as f64;

    let mut data = Array2::<f32>::zeros((new_h, new_w));
    for r in 0..new_h {
        let y0 = r as f64 * sy;
        let y1 = ((r + 1) as f64 * sy).min(h as f64);
        for c in 0..new_w {
            let x0 = c as f64 * sx;
            let x1 = ((c + 1) as f64 * sx).min(w as f64);

            let mut acc = 0.0f64;
            let mut total = 0.0f64;
            let mut iy = y0.floor() as usize;
            while (iy as f64) < y1 {
                let wy = (y1.min((iy + 1) as f64) - y0.max(iy as f64)).max(0.0);
                let mut ix = x0.floor() as usize;
                while (ix as f64) < x1 {
                    let wx = (x1.min((ix + 1) as f64) - x0.max(ix as f64)).max(0.0);
                    acc += image.data[[iy.min(h - 1), ix.min(w - 1)]] as f64 * wy * wx;
                    total += wy * wx;
                    ix += 1;
                }
                iy += 1;
            }
            data[[r, c]] = if total > 0.0 { (acc / total) as f32 } else { 0.0 };
        }
    }

    Ok(Image::new(data))
}

/// Scalar <= 1 that brings the largest dimension of any of the shapes down to
/// `max_dimension`.
pub fn scalar_for_max_dimension(max_dimension: usize, shapes: &[(usize, usize)]) -> f64 {
    let largest = shapes
        .iter()
        .map(|&(h, w)| h.max(w))
        .max()
        .unwrap_or(0);
    if largest == 0 || largest <= max_dimension {
        1.0
    } else {
        max_dimension as f64 / largest as f64
    }
}
