#![doc(html_favicon_url = "https://zng-ui.github.io/res/zng-logo-icon.png")]
#![doc(html_logo_url = "https://zng-ui.github.io/res/zng-logo.png")]
//!
//! Image stream subscription and image painter.
//!
//! The [`ImageSubscription`] connects an image presenter to the image pipeline, the [`ImagePainter`] it
//! creates draws the current frame in a [`PaintNode`].
//!
//! [`PaintNode`]: zng_wgt_custom::PaintNode
//!
//! # Crate
//!
#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]

mod painter;
mod subscription;

pub use painter::*;
pub use subscription::{DisplayState, ImageOptions, ImageSubscription, SubscriptionState};
