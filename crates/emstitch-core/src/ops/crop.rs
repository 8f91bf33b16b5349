use ndarray::Array2;

use crate::image::Image;

use super::noise::NoiseSampler;

/// Fill for crop regions that fall outside the source image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CropFill {
    /// Gaussian noise from the source image's median and standard deviation,
    /// the same contract as phase-correlation padding.
    Noise,
    Constant(f32),
}

/// Extract a `size` = (height, width) region whose bottom-left corner sits at
/// `origin` = (Yo, Xo) in the source. The origin may be negative and the
/// region may extend past the source; uncovered pixels take the fill value.
pub fn crop(image: &Image, origin: (i64, i64), size: (usize, usize), fill: CropFill) -> Image {
    let (h, w) = image.dim();
    let (height, width) = size;

    let mut sampler = match fill {
        CropFill::Noise => Some(NoiseSampler::for_image(image)),
        CropFill::Constant(_) => None,
    };

    let mut data = Array2::<f32>::zeros((height, width));
    for r in 0..height {
        let sr = origin.0 + r as i64;
        for c in 0..width {
            let sc = origin.1 + c as i64;
            data[[r, c]] = if sr >= 0 && sr < h as i64 && sc >= 0 && sc < w as i64 {
                image.data[[sr as usize, sc as usize]]
            } else {
                match (&mut sampler, fill) {
                    (Some(s), _) => s.sample(),
                    (None, CropFill::Constant(v)) => v,
                    (None, CropFill::Noise) => unreachable!(),
                }
            };
        }
    }
    Image::new(data)
}
