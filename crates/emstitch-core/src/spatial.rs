//! Axis-aligned rectangles in (Y, X) coordinates.

/// Axis-aligned rectangle with f64 bounds. `min_*` is inclusive, `max_*`
/// exclusive when the rectangle describes a pixel region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    pub min_y: f64,
    pub min_x: f64,
    pub max_y: f64,
    pub max_x: f64,
}

impl Rectangle {
    pub fn from_bounds(min_y: f64, min_x: f64, max_y: f64, max_x: f64) -> Self {
        Self {
            min_y,
            min_x,
            max_y,
            max_x,
        }
    }

    /// Build from a bottom-left origin (y, x) and a (height, width) size.
    pub fn from_point_and_size(origin: (f64, f64), size: (f64, f64)) -> Self {
        Self {
            min_y: origin.0,
            min_x: origin.1,
            max_y: origin.0 + size.0,
            max_x: origin.1 + size.1,
        }
    }

    /// Bounding rectangle of a set of (y, x) points.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let mut min_y = f64::INFINITY;
        let mut min_x = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        for &(y, x) in points {
            min_y = min_y.min(y);
            min_x = min_x.min(x);
            max_y = max_y.max(y);
            max_x = max_x.max(x);
        }
        Self {
            min_y,
            min_x,
            max_y,
            max_x,
        }
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn area(&self) -> f64 {
        self.height().max(0.0) * self.width().max(0.0)
    }

    /// Centre as (y, x).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_y + self.max_y) / 2.0,
            (self.min_x + self.max_x) / 2.0,
        )
    }

    /// Intersection, or `None` when the rectangles do not overlap.
    pub fn intersect(&self, other: &Rectangle) -> Option<Rectangle> {
        let min_y = self.min_y.max(other.min_y);
        let min_x = self.min_x.max(other.min_x);
        let max_y = self.max_y.min(other.max_y);
        let max_x = self.max_x.min(other.max_x);
        if max_y > min_y && max_x > min_x {
            Some(Rectangle {
                min_y,
                min_x,
                max_y,
                max_x,
            })
        } else {
            None
        }
    }

    /// True if `other` lies entirely within this rectangle.
    pub fn contains(&self, other: &Rectangle) -> bool {
        self.min_y <= other.min_y
            && self.min_x <= other.min_x
            && self.max_y >= other.max_y
            && self.max_x >= other.max_x
    }

    /// Overlapping area as a fraction of the smaller rectangle's area.
    pub fn overlap_fraction(a: &Rectangle, b: &Rectangle) -> f64 {
        let smaller = a.area().min(b.area());
        if smaller <= 0.0 {
            return 0.0;
        }
        match a.intersect(b) {
            Some(o) => o.area() / smaller,
            None => 0.0,
        }
    }

    /// Scale the area about the centre. `scalar` applies to each linear
    /// dimension as sqrt(scalar) so that area grows by exactly `scalar`.
    pub fn scale_about_center(&self, scalar: f64) -> Rectangle {
        let (cy, cx) = self.center();
        let half_h = self.height() / 2.0 * scalar.sqrt();
        let half_w = self.width() / 2.0 * scalar.sqrt();
        Rectangle {
            min_y: cy - half_h,
            min_x: cx - half_w,
            max_y: cy + half_h,
            max_x: cx + half_w,
        }
    }

    /// Round mins down and maxs up to integer pixel bounds.
    pub fn round_outward(&self) -> Rectangle {
        Rectangle {
            min_y: self.min_y.floor(),
            min_x: self.min_x.floor(),
            max_y: self.max_y.ceil(),
            max_x: self.max_x.ceil(),
        }
    }

    /// Multiply all bounds by a scalar (change of pixel scale).
    pub fn scaled(&self, scalar: f64) -> Rectangle {
        Rectangle {
            min_y: self.min_y * scalar,
            min_x: self.min_x * scalar,
            max_y: self.max_y * scalar,
            max_x: self.max_x * scalar,
        }
    }

    pub fn translated(&self, dy: f64, dx: f64) -> Rectangle {
        Rectangle {
            min_y: self.min_y + dy,
            min_x: self.min_x + dx,
            max_y: self.max_y + dy,
            max_x: self.max_x + dx,
        }
    }

    /// Rebuild with this rectangle's origin and the given (height, width).
    /// Used to force two overlap windows to congruent sizes.
    pub fn with_size(&self, size: (f64, f64)) -> Rectangle {
        Rectangle::from_point_and_size((self.min_y, self.min_x), size)
    }
}
