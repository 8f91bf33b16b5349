//! Gaussian noise synthesis for padding and saturated-extrema repair.
//!
//! Padding regions and saturated pixels are filled with samples drawn from a
//! normal distribution matched to the image body, so the correlation surface
//! is not dominated by step discontinuities or flat saturated patches.

use rand::rngs::ThreadRng;
use rand_distr::{Distribution, Normal};

use crate::image::Image;

/// Draws clipped gaussian samples in [0, 1].
pub(crate) struct NoiseSampler {
    normal: Normal<f32>,
    rng: ThreadRng,
}

impl NoiseSampler {
    pub fn new(mean: f32, std_dev: f32) -> Self {
        let std_dev = if std_dev.is_finite() && std_dev > 0.0 {
            std_dev
        } else {
            1e-4
        };
        let mean = if mean.is_finite() { mean } else { 0.5 };
        Self {
            normal: Normal::new(mean, std_dev).expect("finite gaussian parameters"),
            rng: rand::rng(),
        }
    }

    /// Sampler matched to the image's own median and standard deviation.
    pub fn for_image(image: &Image) -> Self {
        Self::new(image.median(), image.std_dev())
    }

    pub fn sample(&mut self) -> f32 {
        self.normal.sample(&mut self.rng).clamp(0.0, 1.0)
    }
}

/// Replace saturated samples (exactly 0 or 1) with gaussian noise.
pub fn replace_extrema_with_noise(image: &Image, mean: f32, std_dev: f32) -> Image {
    let mut sampler = NoiseSampler::new(mean, std_dev);
    let data = image.data.mapv(|v| {
        if v <= 0.0 || v >= 1.0 {
            sampler.sample()
        } else {
            v
        }
    });
    Image::new(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn extrema_are_replaced_and_midtones_kept() {
        let mut data = Array2::<f32>::from_elem((8, 8), 0.4);
        data[[0, 0]] = 0.0;
        data[[7, 7]] = 1.0;
        let out = replace_extrema_with_noise(&Image::new(data), 0.5, 0.25);

        assert!(out.data[[0, 0]] > 0.0 || out.data[[0, 0]] < 1.0);
        assert_eq!(out.data[[3, 3]], 0.4);
        assert!(out.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn sampler_stays_in_unit_range() {
        let mut sampler = NoiseSampler::new(0.5, 0.25);
        for _ in 0..1000 {
            let v = sampler.sample();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn degenerate_std_dev_is_tolerated() {
        let mut sampler = NoiseSampler::new(0.5, 0.0);
        let v = sampler.sample();
        assert!((v - 0.5).abs() < 0.01);
    }
}
