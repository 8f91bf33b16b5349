use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::SERIAL_RESAMPLE_LIMIT;
use crate::image::Image;

use super::sample::bilinear_sample;

/// Rotate about the image centre by `degrees` (counter-clockwise in (x, y))
/// using bilinear interpolation. The canvas expands to the rotated bounds;
/// uncovered pixels are 0.
pub fn rotate(image: &Image, degrees: f64) -> Image {
    if degrees == 0.0 {
        return image.clone();
    }

    let (h, w) = image.dim();
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();

    let new_w = (w as f64 * cos.abs() + h as f64 * sin.abs()).ceil() as usize;
    let new_h = (h as f64 * cos.abs() + w as f64 * sin.abs()).ceil() as usize;

    let src_cy = (h as f64 - 1.0) / 2.0;
    let src_cx = (w as f64 - 1.0) / 2.0;
    let dst_cy = (new_h as f64 - 1.0) / 2.0;
    let dst_cx = (new_w as f64 - 1.0) / 2.0;

    let sample_row = |row: usize| -> Vec<f32> {
        let y = row as f64 - dst_cy;
        (0..new_w)
            .map(|col| {
                let x = col as f64 - dst_cx;
                // Inverse rotation back into source coordinates.
                let sy = -x * sin + y * cos + src_cy;
                let sx = x * cos + y * sin + src_cx;
                bilinear_sample(&image.data, sy, sx, 0.0)
            })
            .collect()
    };

    let rows: Vec<Vec<f32>> = if new_h * new_w < SERIAL_RESAMPLE_LIMIT {
        (0..new_h).map(sample_row).collect()
    } else {
        (0..new_h).into_par_iter().map(sample_row).collect()
    };

    let mut data = Array2::<f32>::zeros((new_h, new_w));
    for (row, row_data) in rows.into_iter().enumerate() {
        for (col, val) in row_data.into_iter().enumerate() {
            data[[row, col]] = val;
        }
    }
    Image::new(data)
}
