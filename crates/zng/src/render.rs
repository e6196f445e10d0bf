//! Canvas surface, display list and shapes.
//!
//! Delegates paint on a [`Canvas`], render nodes record delegate output in a [`DisplayList`] and replay it
//! while it is not stale.
//!
//! # Full API
//!
//! See [`zng_render`] for the full API.

pub use zng_render::{Canvas, ClipShape, DisplayItem, DisplayList, Ellipse, Img, Rgba, RoundedRect, with_saved};
