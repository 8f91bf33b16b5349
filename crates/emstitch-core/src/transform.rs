//! Rigid (rotation + translation) transforms between a tile's own pixel grid
//! ("mapped space") and the shared output canvas ("fixed space").

use crate::spatial::Rectangle;

/// Rotation about the centre of the source bounding box followed by a
/// translation. Points are (y, x); the angle is counter-clockwise in the
/// (x, y) plane.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidTransform {
    angle: f64,
    translation: (f64, f64),
    source_size: (f64, f64),
}

impl RigidTransform {
    /// `source_size` is the (height, width) of the mapped-space image,
    /// `angle` is in radians, `translation` is (dy, dx) in fixed space.
    pub fn new(source_size: (f64, f64), angle: f64, translation: (f64, f64)) -> Self {
        Self {
            angle,
            translation,
            source_size,
        }
    }

    /// Pure translation placing a tile of `source_size` at `offset`.
    pub fn translation(source_size: (f64, f64), offset: (f64, f64)) -> Self {
        Self::new(source_size, 0.0, offset)
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn translation_vector(&self) -> (f64, f64) {
        self.translation
    }

    pub fn source_size(&self) -> (f64, f64) {
        self.source_size
    }

    fn center(&self) -> (f64, f64) {
        (self.source_size.0 / 2.0, self.source_size.1 / 2.0)
    }

    /// Map a mapped-space point into fixed space.
    pub fn transform_point(&self, p: (f64, f64)) -> (f64, f64) {
        let (cy, cx) = self.center();
        let (sin, cos) = self.angle.sin_cos();
        let y = p.0 - cy;
        let x = p.1 - cx;
        let ry = x * sin + y * cos;
        let rx = x * cos - y * sin;
        (ry + cy + self.translation.0, rx + cx + self.translation.1)
    }

    /// Map a fixed-space point back into mapped space.
    pub fn inverse_transform_point(&self, p: (f64, f64)) -> (f64, f64) {
        let (cy, cx) = self.center();
        let (sin, cos) = self.angle.sin_cos();
        let y = p.0 - self.translation.0 - cy;
        let x = p.1 - self.translation.1 - cx;
        // Inverse rotation.
        let ry = -x * sin + y * cos;
        let rx = x * cos + y * sin;
        (ry + cy, rx + cx)
    }

    pub fn transform(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        points.iter().map(|&p| self.transform_point(p)).collect()
    }

    pub fn inverse_transform(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        points
            .iter()
            .map(|&p| self.inverse_transform_point(p))
            .collect()
    }

    /// Bounding box of the source image in its own pixel grid.
    pub fn mapped_bounding_box(&self) -> Rectangle {
        Rectangle::from_bounds(0.0, 0.0, self.source_size.0, self.source_size.1)
    }

    /// Bounding box of the transformed source corners in fixed space.
    pub fn fixed_bounding_box(&self) -> Rectangle {
        let (h, w) = self.source_size;
        let corners = [(0.0, 0.0), (0.0, w), (h, 0.0), (h, w)];
        Rectangle::from_points(&self.transform(&corners))
    }

    /// Uniformly rescale the transform to a different pixel scale.
    pub fn scaled(&self, scalar: f64) -> Self {
        Self {
            angle: self.angle,
            translation: (self.translation.0 * scalar, self.translation.1 * scalar),
            source_size: (self.source_size.0 * scalar, self.source_size.1 * scalar),
        }
    }

    /// Shift the fixed-space placement by (dy, dx).
    pub fn translate(&mut self, offset: (f64, f64)) {
        self.translation.0 += offset.0;
        self.translation.1 += offset.1;
    }

    /// Replace the translation so the fixed bounding box centre lands on
    /// `center`.
    pub fn set_fixed_center(&mut self, center: (f64, f64)) {
        let current = self.fixed_bounding_box().center();
        self.translate((center.0 - current.0, center.1 - current.1));
    }
}
