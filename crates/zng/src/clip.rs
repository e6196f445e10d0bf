//! Custom clip delegate.
//!
//! A [`CustomClip`] computes a clip shape for a size, the [`ClipNode`] caches the shape until the size changes,
//! the delegate is replaced by one that [`should_reclip`] or the delegate [`reclip`] notifier signals.
//!
//! ```
//! use zng::prelude::*;
//!
//! let mut node = ClipNode::new(RoundedRectClip::new(LayoutSize::splat(4.0)));
//! node.layout(LayoutSize::new(20.0, 10.0));
//! assert!(node.hit_test(LayoutPoint::new(10.0, 5.0), |_| true));
//! assert!(!node.hit_test(LayoutPoint::new(0.2, 0.2), |_| true));
//! ```
//!
//! [`should_reclip`]: CustomClip::should_reclip
//! [`reclip`]: CustomClip::reclip
//!
//! # Full API
//!
//! See [`zng_wgt_custom::clip`] for the full API.

pub use zng_wgt_custom::clip::{
    AnyCustomClip, ClipFn, ClipNode, CustomClip, EllipseClip, RectClip, RoundedRectClip, clip_fn, default_approximate_bounds,
};
