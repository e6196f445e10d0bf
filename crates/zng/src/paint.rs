//! Custom paint delegate.
//!
//! A [`CustomPaint`] paints in an area, the [`PaintNode`] retains a background and a foreground delegate and caches
//! their output. Delegates that return [`HitTest::UseDefault`] are hit by the [`default_hit_test`] of their
//! [`PaintLayer`].
//!
//! # Full API
//!
//! See [`zng_wgt_custom::paint`] for the full API.

pub use zng_wgt_custom::paint::{AnyCustomPaint, CustomPaint, HitTest, PaintFn, PaintLayer, PaintNode, default_hit_test, paint_fn};
