//! A tile: one acquired image plus its current best transform into fixed
//! space. The pixel data and its derived products are loaded on demand and
//! can be dropped; id, path and transform persist.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ndarray::Array2;
use num_complex::Complex;
use tracing::warn;

use crate::consts::DEFAULT_MIN_OVERLAP;
use crate::correlate::fft2d::fft2d_forward;
use crate::correlate::find_offset_prepared;
use crate::error::Result;
use crate::image::Image;
use crate::io::image_io::load_image;
use crate::ops::pad_for_phase_correlation;
use crate::record::AlignmentRecord;
use crate::spatial::Rectangle;
use crate::transform::RigidTransform;

pub struct Tile {
    id: usize,
    transform: RigidTransform,
    image_path: PathBuf,
    image: OnceLock<Image>,
    padded: OnceLock<Image>,
    fft: OnceLock<Array2<Complex<f64>>>,
}

impl Tile {
    pub fn new(id: usize, transform: RigidTransform, image_path: PathBuf) -> Self {
        Self {
            id,
            transform,
            image_path,
            image: OnceLock::new(),
            padded: OnceLock::new(),
            fft: OnceLock::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn transform(&self) -> &RigidTransform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut RigidTransform {
        &mut self.transform
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Bounding box in fixed (output) space.
    pub fn fixed_bounding_box(&self) -> Rectangle {
        self.transform.fixed_bounding_box()
    }

    /// Bounding box in the tile's own pixel grid.
    pub fn mapped_bounding_box(&self) -> Rectangle {
        self.transform.mapped_bounding_box()
    }

    /// The tile image, loaded from disk on first access.
    pub fn image(&self) -> Result<&Image> {
        if let Some(image) = self.image.get() {
            return Ok(image);
        }
        let loaded = load_image(&self.image_path)?;
        Ok(self.image.get_or_init(|| loaded))
    }

    /// The image padded for phase correlation, computed on first access.
    pub fn padded_image(&self) -> Result<&Image> {
        if let Some(padded) = self.padded.get() {
            return Ok(padded);
        }
        let padded = pad_for_phase_correlation(self.image()?, DEFAULT_MIN_OVERLAP)?;
        Ok(self.padded.get_or_init(|| padded))
    }

    /// Forward FFT of the padded image, computed on first access.
    pub fn fft(&self) -> Result<&Array2<Complex<f64>>> {
        if let Some(fft) = self.fft.get() {
            return Ok(fft);
        }
        let fft = fft2d_forward(&self.padded_image()?.data);
        Ok(self.fft.get_or_init(|| fft))
    }

    /// Force the image, padded image and FFT caches to be populated.
    pub fn precalculate(&self) -> Result<()> {
        self.fft().map(|_| ())
    }

    /// Drop cached pixel data and derived products.
    pub fn evict_caches(&mut self) {
        self.image.take();
        self.padded.take();
        self.fft.take();
    }
}

/// Create tiles from matching transform/path lists, assigning dense 0-based
/// ids. Tiles whose image file is missing are skipped with a warning, as a
/// pruned capture session routinely has holes.
pub fn create_tiles(transforms: Vec<RigidTransform>, image_paths: Vec<PathBuf>) -> Vec<Tile> {
    let mut tiles = Vec::with_capacity(transforms.len());
    for (i, (transform, path)) in transforms.into_iter().zip(image_paths).enumerate() {
        if !path.exists() {
            warn!(tile = i, path = %path.display(), "missing tile image");
            continue;
        }
        tiles.push(Tile::new(i, transform, path));
    }
    tiles
}

/// Align two whole tiles through their cached padded FFTs. Both tiles must
/// have the same padded shape, which holds for uniform capture sessions.
pub fn whole_image_offset(a: &Tile, b: &Tile) -> Result<AlignmentRecord> {
    find_offset_prepared(a.fft()?, b.fft()?)
}
