use ndarray::Array2;

use crate::error::{Result, StitchError};
use crate::image::Image;

use super::noise::NoiseSampler;

/// Smallest power of two that accommodates `dim` with the overlap slack
/// implied by `min_overlap`.
fn padded_dim(dim: usize, min_overlap: f64) -> usize {
    let target = (dim as f64 / min_overlap).ceil() as usize;
    target.max(dim).max(1).next_power_of_two()
}

fn pad_with_dims(image: &Image, height: usize, width: usize) -> Image {
    let (h, w) = image.dim();
    let mut sampler = NoiseSampler::for_image(image);

    let mut data = Array2::<f32>::zeros((height, width));
    for r in 0..height {
        for c in 0..width {
            data[[r, c]] = if r < h && c < w {
                image.data[[r, c]]
            } else {
                sampler.sample()
            };
        }
    }
    Image::new(data)
}

/// Pad an image for phase correlation.
///
/// Target dimensions are `dim / min_overlap` rounded up to the next power of
/// two. The source is placed at (0, 0); the padding region is filled with
/// gaussian noise drawn from the image's own median and standard deviation.
pub fn pad_for_phase_correlation(image: &Image, min_overlap: f64) -> Result<Image> {
    if !(min_overlap > 0.0 && min_overlap <= 1.0) {
        return Err(StitchError::InvalidInput(format!(
            "min_overlap must be in (0, 1], got {min_overlap}"
        )));
    }
    let (h, w) = image.dim();
    let th = padded_dim(h, min_overlap);
    let tw = padded_dim(w, min_overlap);
    Ok(pad_with_dims(image, th, tw))
}

/// Pad to an explicit target shape; the target is rounded up to the next
/// power of two and never shrinks below the source dimensions.
pub fn pad_to_shape(image: &Image, height: usize, width: usize) -> Image {
    let (h, w) = image.dim();
    let th = height.max(h).max(1).next_power_of_two();
    let tw = width.max(w).max(1).next_power_of_two();
    pad_with_dims(image, th, tw)
}
