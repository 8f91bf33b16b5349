//! Section-to-section (.stos) transform files: a plain-text record of a
//! control image, a mapped image and the transform string aligning them.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Result, StitchError};
use crate::transform::RigidTransform;

#[derive(Clone, Debug, PartialEq)]
pub struct StosFile {
    pub control_image_name: String,
    pub control_image_path: String,
    pub mapped_image_name: String,
    pub mapped_image_path: String,
    pub control_mask_name: Option<String>,
    pub control_mask_path: Option<String>,
    pub mapped_mask_name: Option<String>,
    pub mapped_mask_path: Option<String>,
    /// (width, height)
    pub control_dim: (u32, u32),
    /// (width, height)
    pub mapped_dim: (u32, u32),
    pub downsample: f64,
    pub transform: String,
}

impl StosFile {
    pub fn parse(text: &str) -> Result<Self> {
        let mut control_image_name = None;
        let mut control_image_path = None;
        let mut mapped_image_name = None;
        let mut mapped_image_path = None;
        let mut control_mask_name = None;
        let mut control_mask_path = None;
        let mut mapped_mask_name = None;
        let mut mapped_mask_path = None;
        let mut control_dim = None;
        let mut mapped_dim = None;
        let mut downsample = None;
        let mut transform = None;

        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let (key, value) = line.split_once(':').ok_or_else(|| {
                StitchError::InvalidStos(format!("expected 'Key: value', got '{line}'"))
            })?;
            let value = value.trim_start().to_string();
            match key {
                "ControlImageName" => control_image_name = Some(value),
                "ControlImagePath" => control_image_path = Some(value),
                "MappedImageName" => mapped_image_name = Some(value),
                "MappedImagePath" => mapped_image_path = Some(value),
                "ControlMaskName" => control_mask_name = Some(value),
                "ControlMaskPath" => control_mask_path = Some(value),
                "MappedMaskName" => mapped_mask_name = Some(value),
                "MappedMaskPath" => mapped_mask_path = Some(value),
                "ControlImageDim" => control_dim = Some(parse_dim(&value)?),
                "MappedImageDim" => mapped_dim = Some(parse_dim(&value)?),
                "Downsample" => {
                    downsample = Some(value.parse::<f64>().map_err(|_| {
                        StitchError::InvalidStos(format!("bad downsample '{value}'"))
                    })?)
                }
                "Transform" => transform = Some(value),
                other => {
                    return Err(StitchError::InvalidStos(format!("unknown field '{other}'")));
                }
            }
        }

        let missing = |field: &str| StitchError::InvalidStos(format!("missing field '{field}'"));
        Ok(StosFile {
            control_image_name: control_image_name.ok_or_else(|| missing("ControlImageName"))?,
            control_image_path: control_image_path.ok_or_else(|| missing("ControlImagePath"))?,
            mapped_image_name: mapped_image_name.ok_or_else(|| missing("MappedImageName"))?,
            mapped_image_path: mapped_image_path.ok_or_else(|| missing("MappedImagePath"))?,
            control_mask_name,
            control_mask_path,
            mapped_mask_name,
            mapped_mask_path,
            control_dim: control_dim.ok_or_else(|| missing("ControlImageDim"))?,
            mapped_dim: mapped_dim.ok_or_else(|| missing("MappedImageDim"))?,
            downsample: downsample.ok_or_else(|| missing("Downsample"))?,
            transform: transform.ok_or_else(|| missing("Transform"))?,
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

    pub fn parsed_transform(&self) -> Result<TransformSpec> {
        parse_transform(&self.transform)
    }
}

fn parse_dim(value: &str) -> Result<(u32, u32)> {
    let mut parts = value.split_whitespace();
    let w = parts.next().and_then(|v| v.parse::<u32>().ok());
    let h = parts.next().and_then(|v| v.parse::<u32>().ok());
    match (w, h, parts.next()) {
        (Some(w), Some(h), None) => Ok((w, h)),
        _ => Err(StitchError::InvalidStos(format!(
            "bad dimension field '{value}'"
        ))),
    }
}

impl fmt::Display for StosFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ControlImageName: {}", self.control_image_name)?;
        writeln!(f, "ControlImagePath: {}", self.control_image_path)?;
        writeln!(
            f,
            "ControlImageDim: {} {}",
            self.control_dim.0, self.control_dim.1
        )?;
        writeln!(f, "MappedImageName: {}", self.mapped_image_name)?;
        writeln!(f, "MappedImagePath: {}", self.mapped_image_path)?;
        writeln!(
            f,
            "MappedImageDim: {} {}",
            self.mapped_dim.0, self.mapped_dim.1
        )?;
        if let (Some(name), Some(path)) = (&self.control_mask_name, &self.control_mask_path) {
            writeln!(f, "ControlMaskName: {name}")?;
            writeln!(f, "ControlMaskPath: {path}")?;
        }
        if let (Some(name), Some(path)) = (&self.mapped_mask_name, &self.mapped_mask_path) {
            writeln!(f, "MappedMaskName: {name}")?;
            writeln!(f, "MappedMaskPath: {path}")?;
        }
        writeln!(f, "Downsample: {}", self.downsample)?;
        writeln!(f, "Transform: {}", self.transform)
    }
}

/// A parsed transform string from a stos or mosaic file.
#[derive(Clone, Debug, PartialEq)]
pub enum TransformSpec {
    /// `FixedCenterOfRotationAffineTransform_double_2_2 vp 8
    ///  c -s s c x y 1 1 fp 2 halfW halfH`
    FixedCenterRotation {
        cos: f64,
        sin: f64,
        /// Translation in (x, y) order as written on disk.
        translation: (f64, f64),
        /// (halfW, halfH)
        center: (f64, f64),
    },
    /// `GridTransform_double_2_2 vp 8 <8 floats> fp 7 0 1 1 0 0 (W-1) (H-1)`
    /// with the four warped-space corners in fixed space, (x, y) order,
    /// bottom-left, bottom-right, top-left, top-right.
    Grid {
        corners: [(f64, f64); 4],
        /// W - 1
        mapped_width: f64,
        /// H - 1
        mapped_height: f64,
    },
}

pub const AFFINE_TRANSFORM_NAME: &str = "FixedCenterOfRotationAffineTransform_double_2_2";
pub const GRID_TRANSFORM_NAME: &str = "GridTransform_double_2_2";

/// Serialise fixed-space corners ((y, x) in memory) as a grid transform
/// string. Corner coordinates flip to (x, y) on disk.
pub fn grid_transform_string(corners: &[(f64, f64)], width: f64, height: f64) -> String {
    let mut s = format!("{GRID_TRANSFORM_NAME} vp 8");
    for &(y, x) in corners {
        s.push_str(&format!(" {x} {y}"));
    }
    s.push_str(&format!(" fp 7 0 1 1 0 0 {width} {height}"));
    s
}

/// Serialise a rigid transform as a fixed-centre affine string.
pub fn affine_transform_string(transform: &RigidTransform) -> String {
    let (sin, cos) = transform.angle().sin_cos();
    let (dy, dx) = transform.translation_vector();
    let (h, w) = transform.source_size();
    format!(
        "{AFFINE_TRANSFORM_NAME} vp 8 {cos} {} {sin} {cos} {dx} {dy} 1 1 fp 2 {} {}",
        -sin,
        w / 2.0,
        h / 2.0
    )
}

pub fn parse_transform(text: &str) -> Result<TransformSpec> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(StitchError::InvalidStos("empty transform string".into()));
    }

    let name = tokens[0];
    let floats = |range: std::ops::Range<usize>| -> Result<Vec<f64>> {
        tokens
            .get(range.clone())
            .filter(|s| s.len() == range.len())
            .ok_or_else(|| StitchError::InvalidStos(format!("truncated transform '{text}'")))?
            .iter()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| StitchError::InvalidStos(format!("bad float '{t}'")))
            })
            .collect()
    };

    match name {
        AFFINE_TRANSFORM_NAME => {
            // name vp 8 <8 floats> fp 2 <2 floats>
            if tokens.len() != 15 || tokens[1] != "vp" || tokens[2] != "8" || tokens[11] != "fp" {
                return Err(StitchError::InvalidStos(format!(
                    "malformed affine transform '{text}'"
                )));
            }
            let vp = floats(3..11)?;
            let fp = floats(13..15)?;
            Ok(TransformSpec::FixedCenterRotation {
                cos: vp[0],
                sin: vp[2],
                translation: (vp[4], vp[5]),
                center: (fp[0], fp[1]),
            })
        }
        GRID_TRANSFORM_NAME => {
            // name vp 8 <8 floats> fp 7 <7 floats>
            if tokens.len() != 20 || tokens[1] != "vp" || tokens[2] != "8" || tokens[11] != "fp" {
                return Err(StitchError::InvalidStos(format!(
                    "malformed grid transform '{text}'"
                )));
            }
            let vp = floats(3..11)?;
            let fp = floats(13..20)?;
            let corners = [
                (vp[0], vp[1]),
                (vp[2], vp[3]),
                (vp[4], vp[5]),
                (vp[6], vp[7]),
            ];
            Ok(TransformSpec::Grid {
                corners,
                mapped_width: fp[5],
                mapped_height: fp[6],
            })
        }
        other => Err(StitchError::InvalidStos(format!(
            "unknown transform type '{other}'"
        ))),
    }
}

impl TransformSpec {
    /// Reconstruct the rigid transform this spec describes.
    pub fn to_rigid(&self) -> RigidTransform {
        match self {
            TransformSpec::FixedCenterRotation {
                cos,
                sin,
                translation,
                center,
            } => {
                let angle = sin.atan2(*cos);
                let source_size = (center.1 * 2.0, center.0 * 2.0);
                RigidTransform::new(source_size, angle, (translation.1, translation.0))
            }
            TransformSpec::Grid {
                corners,
                mapped_width,
                mapped_height,
            } => {
                let w = mapped_width + 1.0;
                let h = mapped_height + 1.0;
                // Corners are (x, y); bottom-left to bottom-right spans the
                // mapped x axis.
                let (blx, bly) = corners[0];
                let (brx, bry) = corners[1];
                let angle = (bry - bly).atan2(brx - blx);
                let mean_x = corners.iter().map(|c| c.0).sum::<f64>() / 4.0;
                let mean_y = corners.iter().map(|c| c.1).sum::<f64>() / 4.0;
                let translation = (
                    mean_y - (h - 1.0) / 2.0,
                    mean_x - (w - 1.0) / 2.0,
                );
                RigidTransform::new((h, w), angle, translation)
            }
        }
    }

    pub fn to_transform_string(&self) -> String {
        match self {
            TransformSpec::FixedCenterRotation {
                cos,
                sin,
                translation,
                center,
            } => format!(
                "{AFFINE_TRANSFORM_NAME} vp 8 {cos} {} {sin} {cos} {} {} 1 1 fp 2 {} {}",
                -sin, translation.0, translation.1, center.0, center.1
            ),
            TransformSpec::Grid {
                corners,
                mapped_width,
                mapped_height,
            } => {
                let mut s = format!("{GRID_TRANSFORM_NAME} vp 8");
                for &(x, y) in corners {
                    s.push_str(&format!(" {x} {y}"));
                }
                s.push_str(&format!(" fp 7 0 1 1 0 0 {mapped_width} {mapped_height}"));
                s
            }
        }
    }
}
