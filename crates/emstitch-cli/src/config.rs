use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use emstitch_core::brute::BruteForceOptions;

/// Optional TOML configuration overriding registration defaults.
#[derive(Debug, Default, Deserialize)]
pub struct StitchConfig {
    #[serde(default)]
    pub register: RegisterConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
}

#[derive(Debug, Deserialize)]
pub struct RegisterConfig {
    /// Rotation search parameters.
    #[serde(flatten)]
    pub options: BruteForceOptions,
    /// Pixel spacing written into the output .stos.
    #[serde(default = "default_pixel_spacing")]
    pub pixel_spacing: f64,
}

#[derive(Debug, Deserialize)]
pub struct TranslateConfig {
    /// Overlap fraction of the smaller bounding box required to treat two
    /// tiles as neighbours.
    #[serde(default = "default_tile_min_overlap")]
    pub min_overlap_fraction: f64,
    /// Relaxation stops once the largest weighted tension drops below this.
    #[serde(default = "default_tension_cutoff")]
    pub max_tension_cutoff: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_relax_step")]
    pub relax_step: f64,
}

fn default_pixel_spacing() -> f64 {
    1.0
}

fn default_tile_min_overlap() -> f64 {
    emstitch_core::consts::DEFAULT_TILE_MIN_OVERLAP
}

fn default_tension_cutoff() -> f64 {
    emstitch_core::consts::DEFAULT_MAX_TENSION_CUTOFF
}

fn default_max_iterations() -> usize {
    emstitch_core::consts::DEFAULT_MAX_RELAX_ITERATIONS
}

fn default_relax_step() -> f64 {
    emstitch_core::consts::RELAX_STEP
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            options: BruteForceOptions::default(),
            pixel_spacing: default_pixel_spacing(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            min_overlap_fraction: default_tile_min_overlap(),
            max_tension_cutoff: default_tension_cutoff(),
            max_iterations: default_max_iterations(),
            relax_step: default_relax_step(),
        }
    }
}

impl StitchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
