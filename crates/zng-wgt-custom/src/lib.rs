#![doc(html_favicon_url = "https://zng-ui.github.io/res/zng-logo-icon.png")]
#![doc(html_logo_url = "https://zng-ui.github.io/res/zng-logo.png")]
//!
//! Custom clip and paint delegates.
//!
//! A delegate is a caller supplied object that decides what to clip or paint. Delegates are immutable, a new
//! visual is expressed by creating a new delegate and replacing the old one in the render node. The node then
//! asks the new delegate if the output of the old one is stale, see [`CustomClip::should_reclip`] and
//! [`CustomPaint::should_repaint`]. Delegates can also request a new clip or paint without being replaced, by
//! providing a [`ChangeNotifier`].
//!
//! # Crate
//!
#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]

pub mod clip;
pub mod paint;

#[doc(no_inline)]
pub use zng_notify::ChangeNotifier;

pub use clip::{ClipNode, CustomClip, default_approximate_bounds};
pub use paint::{CustomPaint, HitTest, PaintLayer, PaintNode, default_hit_test};
