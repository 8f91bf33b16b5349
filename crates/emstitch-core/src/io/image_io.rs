use std::path::Path;

use ::image::{GrayImage, ImageFormat, Luma};
use ndarray::Array2;

use crate::error::Result;
use crate::image::Image;

/// Load a grayscale image file, normalising samples to [0, 1].
pub fn load_image(path: &Path) -> Result<Image> {
    let img = ::image::open(path)?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let mut data = Array2::<f32>::zeros((h as usize, w as usize));

    for row in 0..h as usize {
        for col in 0..w as usize {
            let pixel = gray.get_pixel(col as u32, row as u32);
            data[[row, col]] = pixel.0[0] as f32 / 65535.0;
        }
    }

    Ok(Image::new(data))
}

/// Save an image as 16-bit grayscale TIFF.
pub fn save_tiff(image: &Image, path: &Path) -> Result<()> {
    let h = image.height();
    let w = image.width();

    let mut pixels: Vec<u16> = Vec::with_capacity(h * w);
    for row in 0..h {
        for col in 0..w {
            let val = (image.data[[row, col]].clamp(0.0, 1.0) * 65535.0) as u16;
            pixels.push(val);
        }
    }

    let img = ::image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .expect("buffer size matches dimensions");
    img.save(path)?;
    Ok(())
}

/// Save an image as 8-bit grayscale PNG.
pub fn save_png(image: &Image, path: &Path) -> Result<()> {
    let h = image.height();
    let w = image.width();

    let mut img = GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let val = (image.data[[row, col]].clamp(0.0, 1.0) * 255.0) as u8;
            img.put_pixel(col as u32, row as u32, Luma([val]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save an image, choosing format from the file extension.
pub fn save_image(image: &Image, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("tiff" | "tif") => save_tiff(image, path),
        Some("png") => save_png(image, path),
        _ => save_tiff(image, path),
    }
}

/// Save a boolean coverage mask as an 8-bit PNG (255 = covered).
pub fn save_mask_png(mask: &Array2<bool>, path: &Path) -> Result<()> {
    let (h, w) = mask.dim();

    let mut img = GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let val = if mask[[row, col]] { 255u8 } else { 0u8 };
            img.put_pixel(col as u32, row as u32, Luma([val]));
        }
    }

    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Read only the dimensions of an image file as (height, width).
pub fn image_size(path: &Path) -> Result<(usize, usize)> {
    let (w, h) = ::image::image_dimensions(path)?;
    Ok((h as usize, w as usize))
}
