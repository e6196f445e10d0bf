#![cfg(feature = "image")]

//! Image pipeline and image subscription.
//!
//! The [`Images`] cache resolves an [`ImageSpec`] in an ambient [`ImageConfig`] to an [`ImageStream`], requests
//! that resolve to the same [`ImageKey`] share the stream. An [`ImageSubscription`] manages the listener a presenter
//! registers in the stream, and its [`ImagePainter`] draws the current frame.
//!
//! ```
//! use zng::image::*;
//! use zng::prelude::*;
//!
//! let images = Images::new(|_: &ImageSpec, _: &ImageConfig, c: ImageCompleter| {
//!     c.set_frame(ImageFrame::new(Img::flood(1, 1, Rgba::BLACK), 1.fct()));
//! });
//!
//! let mut sub = ImageSubscription::new(ImageSpec::new(ImageSource::asset("logo")), images);
//! sub.dependencies_changed(ImageConfig::scale_factor(2.fct()), true);
//!
//! // cached frame delivered inside the attach.
//! assert!(sub.display().was_synchronously_loaded);
//! sub.deinit();
//! ```
//!
//! # Full API
//!
//! See [`zng_ext_image`] and [`zng_wgt_image`] for the full API.

pub use zng_ext_image::{
    ImageCacheMode, ImageChunk, ImageCompleter, ImageConfig, ImageError, ImageFrame, ImageHash, ImageHasher, ImageKey, ImageListener,
    ImageLoader, ImageProvider, ImageResolver, ImageSource, ImageSpec, ImageStream, ImageStreamImpl, ImageStreamKey, Images,
    KeepAliveHandle,
};
pub use zng_wgt_image::{DisplayState, ImageFit, ImageOptions, ImagePainter, ImageSubscription, SubscriptionState};
