#![doc(html_favicon_url = "https://zng-ui.github.io/res/zng-logo-icon.png")]
#![doc(html_logo_url = "https://zng-ui.github.io/res/zng-logo.png")]
//!
//! Custom clip and paint delegates and image stream subscriptions.
//!
//! # Delegates
//!
//! A delegate is an immutable object that decides what to clip or paint. A render node retains the delegate
//! and caches its output, replacing the delegate asks the new one if the cached output is stale. Delegates
//! can also signal that they have new output through a [`ChangeNotifier`].
//!
//! ```
//! use zng::prelude::*;
//!
//! struct Dot(Rgba);
//! impl CustomPaint for Dot {
//!     fn paint(&self, canvas: &mut dyn Canvas, size: LayoutSize) {
//!         canvas.fill_ellipse(Ellipse::from_rect(LayoutRect::from_size(size)), self.0);
//!     }
//!
//!     fn should_repaint(&self, previous: &Self) -> bool {
//!         self.0 != previous.0
//!     }
//! }
//!
//! let mut node = PaintNode::new().with_background(Dot(Rgba::BLACK));
//! node.layout(LayoutSize::new(10.0, 10.0));
//!
//! let mut list = DisplayList::new();
//! node.render(&mut list, |_| {});
//! assert_eq!(1, list.len());
//!
//! // equal delegate, cached output is reused.
//! assert!(!node.set_background(Dot(Rgba::BLACK)));
//! ```
//!
//! # Images
//!
//! The [`image`] module provides the image cache and the [`ImageSubscription`] state machine that connects a
//! presenter to an image stream.
//!
//! [`ChangeNotifier`]: crate::notify::ChangeNotifier
//! [`ImageSubscription`]: crate::image::ImageSubscription
//!
//! # Crate
//!
#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]

pub mod clip;
pub mod image;
pub mod notify;
pub mod paint;
pub mod render;
pub mod unit;

/// Types for general use.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::clip::{ClipNode, CustomClip, EllipseClip, RectClip, RoundedRectClip, clip_fn};
    #[doc(no_inline)]
    pub use crate::notify::{ChangeNotifier, NotifyHandle};
    #[doc(no_inline)]
    pub use crate::paint::{CustomPaint, HitTest, PaintLayer, PaintNode, paint_fn};
    #[doc(no_inline)]
    pub use crate::render::{Canvas, ClipShape, DisplayList, Ellipse, Img, Rgba, RoundedRect};
    #[doc(no_inline)]
    pub use crate::unit::{Factor, FactorUnits as _, LayoutPoint, LayoutRect, LayoutSize, LayoutVector};

    #[cfg(feature = "image")]
    #[doc(no_inline)]
    pub use crate::image::{ImageConfig, ImageFit, ImageOptions, ImageSource, ImageSpec, ImageSubscription, Images};
}
