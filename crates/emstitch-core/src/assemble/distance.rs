//! Per-pixel distance-to-centre images and their on-disk cache.
//!
//! The distance image depends only on the tile shape, so it is cached on disk
//! keyed by (height, width). Writes are atomic (write to a temp file in the
//! cache directory, then rename); an unreadable cache entry is unlinked and
//! regenerated.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;
use tracing::warn;

use crate::error::{Result, StitchError};

const CACHE_MAGIC: &[u8; 4] = b"EMSD";

/// Euclidean distance from each pixel to the geometric centre of the image.
pub fn create_distance_image(height: usize, width: usize) -> Array2<f32> {
    let cy = (height as f64 - 1.0) / 2.0;
    let cx = (width as f64 - 1.0) / 2.0;

    let mut distance = Array2::<f32>::zeros((height, width));
    for r in 0..height {
        let dy = r as f64 - cy;
        for c in 0..width {
            let dx = c as f64 - cx;
            distance[[r, c]] = ((dy * dy + dx * dx).sqrt()) as f32;
        }
    }
    distance
}

fn cache_path(cache_dir: &Path, height: usize, width: usize) -> PathBuf {
    cache_dir.join(format!("distance{height}x{width}.emsd"))
}

fn read_cache(path: &Path, height: usize, width: usize) -> Result<Array2<f32>> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    let h = reader.read_u32::<LittleEndian>()? as usize;
    let w = reader.read_u32::<LittleEndian>()? as usize;
    if &magic != CACHE_MAGIC || h != height || w != width {
        return Err(StitchError::InvalidInput(format!(
            "distance cache {} does not match {height}x{width}",
            path.display()
        )));
    }

    let mut data = vec![0f32; h * w];
    reader.read_f32_into::<LittleEndian>(&mut data)?;

    Array2::from_shape_vec((h, w), data)
        .map_err(|e| StitchError::InvalidInput(format!("distance cache shape: {e}")))
}

fn write_cache(path: &Path, distance: &Array2<f32>) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        writer.write_all(CACHE_MAGIC)?;
        let (h, w) = distance.dim();
        writer.write_u32::<LittleEndian>(h as u32)?;
        writer.write_u32::<LittleEndian>(w as u32)?;
        for &v in distance.iter() {
            writer.write_f32::<LittleEndian>(v)?;
        }
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| StitchError::Io(e.error))?;
    Ok(())
}

/// Fetch the distance image for a tile shape, reading the cache when present
/// and regenerating it otherwise. Never fails: cache trouble costs only the
/// recomputation.
pub fn cached_distance_image(cache_dir: &Path, height: usize, width: usize) -> Array2<f32> {
    let path = cache_path(cache_dir, height, width);

    if path.exists() {
        match read_cache(&path, height, width) {
            Ok(distance) => return distance,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt distance cache");
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "unable to unlink distance cache");
                }
            }
        }
    }

    let distance = create_distance_image(height, width);
    if let Err(e) = write_cache(&path, &distance) {
        warn!(path = %path.display(), error = %e, "unable to write distance cache");
    }
    distance
}
