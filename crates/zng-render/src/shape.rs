use zng_unit::{LayoutPoint, LayoutRect, LayoutSize};

use crate::Canvas;

/// Rectangle with rounded corners.
///
/// All corners use the same elliptical `radius`, the radius is clamped to half the rectangle size.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RoundedRect {
    /// Bounds.
    pub rect: LayoutRect,
    /// Corner radius.
    pub radius: LayoutSize,
}
impl RoundedRect {
    /// New rounded rectangle.
    pub fn new(rect: LayoutRect, radius: LayoutSize) -> Self {
        let radius = LayoutSize::new(
            radius.width.clamp(0.0, rect.size.width.max(0.0) / 2.0),
            radius.height.clamp(0.0, rect.size.height.max(0.0) / 2.0),
        );
        Self { rect, radius }
    }

    /// If `point` is inside the rounded rectangle.
    pub fn contains(&self, point: LayoutPoint) -> bool {
        if !self.rect.contains(point) {
            return false;
        }
        if self.radius.width <= 0.0 || self.radius.height <= 0.0 {
            return true;
        }

        let min = self.rect.min();
        let max = self.rect.max();
        let cx = if point.x < min.x + self.radius.width {
            min.x + self.radius.width
        } else if point.x > max.x - self.radius.width {
            max.x - self.radius.width
        } else {
            return true;
        };
        let cy = if point.y < min.y + self.radius.height {
            min.y + self.radius.height
        } else if point.y > max.y - self.radius.height {
            max.y - self.radius.height
        } else {
            return true;
        };

        // point is in a corner square, test against the corner ellipse.
        Ellipse::new(LayoutPoint::new(cx, cy), self.radius).contains(point)
    }
}

/// Ellipse defined by center and radii.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ellipse {
    /// Center point.
    pub center: LayoutPoint,
    /// Horizontal and vertical radius.
    pub radii: LayoutSize,
}
impl Ellipse {
    /// New ellipse.
    pub fn new(center: LayoutPoint, radii: LayoutSize) -> Self {
        Self { center, radii }
    }

    /// Largest ellipse that fits the `rect`.
    pub fn from_rect(rect: LayoutRect) -> Self {
        Self::new(rect.center(), rect.size / 2.0)
    }

    /// Bounding box.
    pub fn bounds(&self) -> LayoutRect {
        LayoutRect::new(self.center - self.radii.to_vector(), self.radii * 2.0)
    }

    /// If `point` is inside the ellipse.
    ///
    /// An ellipse with a zero radius contains no point.
    pub fn contains(&self, point: LayoutPoint) -> bool {
        if self.radii.width <= 0.0 || self.radii.height <= 0.0 {
            return false;
        }
        let dx = (point.x - self.center.x) / self.radii.width;
        let dy = (point.y - self.center.y) / self.radii.height;
        dx * dx + dy * dy <= 1.0
    }
}

/// Represents a shape that can be used as a clip region.
pub trait ClipShape {
    /// Intersect the current clip of the `canvas` with the shape.
    fn push_clip(&self, canvas: &mut dyn Canvas);

    /// If the `point` is inside the clip region.
    fn contains(&self, point: LayoutPoint) -> bool;

    /// Bounding box of the clip region.
    fn bounds(&self) -> LayoutRect;
}
impl ClipShape for LayoutRect {
    fn push_clip(&self, canvas: &mut dyn Canvas) {
        canvas.clip_rect(*self);
    }

    fn contains(&self, point: LayoutPoint) -> bool {
        LayoutRect::contains(self, point)
    }

    fn bounds(&self) -> LayoutRect {
        *self
    }
}
impl ClipShape for RoundedRect {
    fn push_clip(&self, canvas: &mut dyn Canvas) {
        canvas.clip_rounded_rect(*self);
    }

    fn contains(&self, point: LayoutPoint) -> bool {
        RoundedRect::contains(self, point)
    }

    fn bounds(&self) -> LayoutRect {
        self.rect
    }
}
impl ClipShape for Ellipse {
    fn push_clip(&self, canvas: &mut dyn Canvas) {
        canvas.clip_ellipse(*self);
    }

    fn contains(&self, point: LayoutPoint) -> bool {
        Ellipse::contains(self, point)
    }

    fn bounds(&self) -> LayoutRect {
        Ellipse::bounds(self)
    }
}
