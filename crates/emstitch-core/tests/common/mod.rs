use std::env;
use std::path::PathBuf;

use ndarray::Array2;

use emstitch_core::image::Image;

/// Directory holding captured test images, from TESTINPUTPATH. Scenario
/// tests that need real data skip when this is unset.
pub fn test_input_dir() -> Option<PathBuf> {
    env::var_os("TESTINPUTPATH").map(PathBuf::from)
}

/// Directory for test output artifacts, from TESTOUTPUTPATH or a fresh temp
/// directory.
pub fn test_output_dir() -> PathBuf {
    match env::var_os("TESTOUTPUTPATH") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let dir = env::temp_dir().join("emstitch-tests");
            std::fs::create_dir_all(&dir).expect("create test output dir");
            dir
        }
    }
}

/// A deterministic textured image: enough structure for an unambiguous
/// correlation peak, no saturated extrema.
pub fn textured_image(height: usize, width: usize) -> Image {
    let mut data = Array2::<f32>::zeros((height, width));
    for r in 0..height {
        for c in 0..width {
            let hash = (r.wrapping_mul(2654435761) ^ c.wrapping_mul(40503)) % 97;
            let wave = ((r as f32 / 6.0).sin() + (c as f32 / 4.5).cos()) * 0.15;
            data[[r, c]] = (0.25 + hash as f32 / 194.0 + wave).clamp(0.02, 0.98);
        }
    }
    Image::new(data)
}

/// Translate an image by (dy, dx), wrapping around the edges so the result
/// keeps the same statistics. Translating the result back by (dy, dx)
/// restores the original, so phase correlation against the source recovers
/// exactly (dy, dx).
pub fn translate_wrapped(image: &Image, dy: i64, dx: i64) -> Image {
    let (h, w) = image.dim();
    let mut data = Array2::<f32>::zeros((h, w));
    for r in 0..h {
        for c in 0..w {
            let sr = (r as i64 + dy).rem_euclid(h as i64) as usize;
            let sc = (c as i64 + dx).rem_euclid(w as i64) as usize;
            data[[r, c]] = image.data[[sr, sc]];
        }
    }
    Image::new(data)
}
