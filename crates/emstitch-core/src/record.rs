//! Registration result: an angle and an offset between a fixed and a moving
//! image.

use std::path::Path;

use crate::stos::{grid_transform_string, StosFile};
use crate::transform::RigidTransform;

/// Registers a moving image against a fixed image: the moving image sits
/// `angle` degrees rotated relative to the fixed one, and translating it by
/// `peak` = (dy, dx) overlays it onto the fixed image. A zero peak means the
/// centres of both images coincide.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentRecord {
    pub peak: (f64, f64),
    pub weight: f64,
    pub angle: f64,
}

impl AlignmentRecord {
    pub fn new(peak: (f64, f64), weight: f64, angle: f64) -> Self {
        debug_assert!(weight.is_finite() && weight >= 0.0);
        Self {
            peak,
            weight,
            angle,
        }
    }

    /// A record that carries no alignment evidence.
    pub fn zero_weight(angle: f64) -> Self {
        Self::new((0.0, 0.0), 0.0, angle)
    }

    /// Rotation in radians.
    pub fn rangle(&self) -> f64 {
        self.angle.to_radians()
    }

    /// Rescale the peak to a different pixel scale. The angle is unaffected.
    pub fn scale_peak(&mut self, value: f64) {
        self.peak.0 *= value;
        self.peak.1 *= value;
    }

    /// Translate the peak by (dy, dx).
    pub fn translate(&mut self, value: (f64, f64)) {
        self.peak.0 += value.0;
        self.peak.1 += value.1;
    }

    /// Same alignment expressed from the other image's frame of reference.
    pub fn invert(&self) -> Self {
        Self::new((-self.peak.0, -self.peak.1), self.weight, self.angle)
    }

    /// Rigid transform mapping the moving image into the fixed image's
    /// space. Sizes are (height, width).
    pub fn to_transform(
        &self,
        fixed_size: (usize, usize),
        warped_size: (usize, usize),
    ) -> RigidTransform {
        let warped = (warped_size.0 as f64, warped_size.1 as f64);
        let fixed_center = (fixed_size.0 as f64 / 2.0, fixed_size.1 as f64 / 2.0);
        let warped_center = (warped.0 / 2.0, warped.1 / 2.0);
        let translation = (
            fixed_center.0 + self.peak.0 - warped_center.0,
            fixed_center.1 + self.peak.1 - warped_center.1,
        );
        RigidTransform::new(warped, self.rangle(), translation)
    }

    /// Serialise this record as a section-to-section transform file.
    ///
    /// Sizes are (height, width); the grid transform string flips corner
    /// coordinates to (x, y) order.
    pub fn to_stos(
        &self,
        control_image_path: &Path,
        warped_image_path: &Path,
        control_size: (usize, usize),
        warped_size: (usize, usize),
        pixel_spacing: f64,
    ) -> StosFile {
        let transform = self.to_transform(control_size, warped_size);

        let (h, w) = (warped_size.0 as f64, warped_size.1 as f64);
        // Pixel-centre corners, bottom-left first.
        let corners = [
            (0.0, 0.0),
            (0.0, w - 1.0),
            (h - 1.0, 0.0),
            (h - 1.0, w - 1.0),
        ];
        let fixed_corners = transform.transform(&corners);

        let file_name = |p: &Path| -> String {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        let dir_name = |p: &Path| -> String {
            p.parent()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        StosFile {
            control_image_name: file_name(control_image_path),
            control_image_path: dir_name(control_image_path),
            mapped_image_name: file_name(warped_image_path),
            mapped_image_path: dir_name(warped_image_path),
            control_mask_name: None,
            control_mask_path: None,
            mapped_mask_name: None,
            mapped_mask_path: None,
            // Dims are written (W, H).
            control_dim: (control_size.1 as u32, control_size.0 as u32),
            mapped_dim: (warped_size.1 as u32, warped_size.0 as u32),
            downsample: pixel_spacing,
            transform: grid_transform_string(&fixed_corners, w - 1.0, h - 1.0),
        }
    }
}

impl std::fmt::Display for AlignmentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "angle: {} offset: ({}, {}) weight: {}",
            self.angle, self.peak.0, self.peak.1, self.weight
        )
    }
}
