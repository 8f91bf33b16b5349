//! Mosaic files: a plain-text enumeration of tile images and their
//! fixed-space transforms at a given pixel spacing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StitchError};
use crate::stos::{affine_transform_string, parse_transform};
use crate::transform::RigidTransform;

#[derive(Clone, Debug, PartialEq)]
pub struct MosaicTile {
    pub image: String,
    pub transform: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MosaicFile {
    pub pixel_spacing: f64,
    pub tiles: Vec<MosaicTile>,
}

impl MosaicFile {
    pub fn parse(text: &str) -> Result<Self> {
        let mut pixel_spacing = None;
        let mut tiles = Vec::new();

        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once(':').ok_or_else(|| {
                StitchError::InvalidMosaic(format!("expected 'Key: value', got '{line}'"))
            })?;
            let value = value.trim_start();
            match key {
                "Format" => {}
                "Pixel Spacing" => {
                    pixel_spacing = Some(value.parse::<f64>().map_err(|_| {
                        StitchError::InvalidMosaic(format!("bad pixel spacing '{value}'"))
                    })?)
                }
                "Number of Tiles" => {}
                "Tile" => {
                    let (image, transform) = value.split_once(' ').ok_or_else(|| {
                        StitchError::InvalidMosaic(format!("bad tile entry '{value}'"))
                    })?;
                    tiles.push(MosaicTile {
                        image: image.to_string(),
                        transform: transform.to_string(),
                    });
                }
                other => {
                    return Err(StitchError::InvalidMosaic(format!(
                        "unknown field '{other}'"
                    )));
                }
            }
        }

        Ok(MosaicFile {
            pixel_spacing: pixel_spacing
                .ok_or_else(|| StitchError::InvalidMosaic("missing 'Pixel Spacing'".into()))?,
            tiles,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }

    /// Resolve the enumerated tiles into transforms and image paths rooted at
    /// `tile_dir`.
    pub fn to_tile_set(&self, tile_dir: &Path) -> Result<(Vec<RigidTransform>, Vec<PathBuf>)> {
        let mut transforms = Vec::with_capacity(self.tiles.len());
        let mut paths = Vec::with_capacity(self.tiles.len());
        for tile in &self.tiles {
            let spec = parse_transform(&tile.transform)
                .map_err(|e| StitchError::InvalidMosaic(format!("tile '{}': {e}", tile.image)))?;
            transforms.push(spec.to_rigid());
            paths.push(tile_dir.join(&tile.image));
        }
        Ok((transforms, paths))
    }

    /// Build a mosaic file from transforms and the image names they place.
    pub fn from_tile_set(
        transforms: &[RigidTransform],
        image_names: &[String],
        pixel_spacing: f64,
    ) -> Self {
        let tiles = transforms
            .iter()
            .zip(image_names)
            .map(|(t, name)| MosaicTile {
                image: name.clone(),
                transform: affine_transform_string(t),
            })
            .collect();
        MosaicFile {
            pixel_spacing,
            tiles,
        }
    }
}

impl fmt::Display for MosaicFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Format: 1.0")?;
        writeln!(f, "Pixel Spacing: {}", self.pixel_spacing)?;
        writeln!(f, "Number of Tiles: {}", self.tiles.len())?;
        for tile in &self.tiles {
            writeln!(f, "Tile: {} {}", tile.image, tile.transform)?;
        }
        Ok(())
    }
}
