use serde::{Deserialize, Serialize};

use crate::Factor;

/// Unit tag of layout pixels, device independent pixels already scaled by the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayoutPixel;

/// A size in layout pixels.
pub type LayoutSize = euclid::Size2D<f32, LayoutPixel>;
/// A point in layout pixels.
pub type LayoutPoint = euclid::Point2D<f32, LayoutPixel>;
/// A vector in layout pixels.
pub type LayoutVector = euclid::Vector2D<f32, LayoutPixel>;
/// A rectangle in layout pixels.
pub type LayoutRect = euclid::Rect<f32, LayoutPixel>;
/// Side offsets in layout pixels.
pub type LayoutSideOffsets = euclid::SideOffsets2D<f32, LayoutPixel>;

/// Extension methods for layout sizes.
pub trait LayoutSizeExt {
    /// Size is positive and finite on both dimensions, zero is valid.
    fn is_valid_layout(&self) -> bool;

    /// Multiply both dimensions by the `scale`.
    fn scale_by(self, scale: Factor) -> LayoutSize;
}
impl LayoutSizeExt for LayoutSize {
    fn is_valid_layout(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    fn scale_by(self, scale: Factor) -> LayoutSize {
        LayoutSize::new(self.width * scale.0, self.height * scale.0)
    }
}

/// Defines the layout flow direction.
///
/// This affects inline layout, some UI containers also use it to decide the order of child items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    /// left-to-right.
    #[default]
    LTR,
    /// Right-to-left.
    RTL,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_validity() {
        assert!(LayoutSize::zero().is_valid_layout());
        assert!(LayoutSize::new(10.0, 0.0).is_valid_layout());
        assert!(!LayoutSize::new(-1.0, 3.0).is_valid_layout());
        assert!(!LayoutSize::new(f32::INFINITY, 3.0).is_valid_layout());
    }
}
