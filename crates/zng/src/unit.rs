//! Layout units.
//!
//! Sizes, points and rectangles are [`euclid`] types in the [`LayoutPixel`] space, [`Factor`] is a scale.
//!
//! ```
//! use zng::unit::*;
//!
//! let size = LayoutSize::new(10.0, 5.0);
//! assert_eq!(LayoutSize::new(20.0, 10.0), size.scale_by(2.fct()));
//! ```
//!
//! # Full API
//!
//! See [`zng_unit`] for the full API.

pub use zng_unit::{
    EPSILON, EPSILON_100, Factor, FactorUnits, LayoutDirection, LayoutPixel, LayoutPoint, LayoutRect, LayoutSideOffsets, LayoutSize,
    LayoutSizeExt, LayoutVector, about_eq, about_eq_hash, euclid,
};
