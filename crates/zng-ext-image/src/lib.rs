#![doc(html_favicon_url = "https://zng-ui.github.io/res/zng-logo-icon.png")]
#![doc(html_logo_url = "https://zng-ui.github.io/res/zng-logo.png")]
//!
//! Image sources, streams and cache.
//!
//! # Crate
//!
#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]

use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;

mod stream;
mod types;

pub use stream::*;
pub use types::*;

/// Image decoder.
///
/// The loader receives every request not served by the cache, except [`ImageSource::Provider`] sources that
/// load themselves.
pub trait ImageLoader: Send + Sync {
    /// Start loading the image.
    ///
    /// The loader must eventually call [`ImageCompleter::set_frame`] or [`ImageCompleter::set_error`],
    /// it can do so before returning.
    fn load(&self, spec: &ImageSpec, config: &ImageConfig, completer: ImageCompleter);
}
impl<F: Fn(&ImageSpec, &ImageConfig, ImageCompleter) + Send + Sync> ImageLoader for F {
    fn load(&self, spec: &ImageSpec, config: &ImageConfig, completer: ImageCompleter) {
        self(spec, config, completer)
    }
}

/// Resolves image requests to streams.
pub trait ImageResolver: Send + Sync {
    /// Get the stream for the `spec` in the `config`.
    ///
    /// Returns immediately, the stream may not have a frame yet.
    fn resolve(&self, spec: &ImageSpec, config: &ImageConfig, cache_mode: ImageCacheMode) -> ImageStream;
}

struct ImagesData {
    loader: Box<dyn ImageLoader>,
    cache: Mutex<HashMap<ImageKey, ImageCompleter>>,
    generation: AtomicU64,
}

/// Image loading and cache service.
///
/// Requests with the same [`ImageKey`] share one [`ImageCompleter`] while cached, the frames are owned by
/// the cache entry and listeners only own their registration.
///
/// Entries are never removed automatically, the host must call [`clean`] or [`clean_all`] to drop unused
/// images, or [`evict`] and [`clear`] to force new loads.
///
/// This is a shared reference, clones use the same cache.
///
/// [`clean`]: Images::clean
/// [`clean_all`]: Images::clean_all
/// [`evict`]: Images::evict
/// [`clear`]: Images::clear
#[derive(Clone)]
pub struct Images(Arc<ImagesData>);
impl Images {
    /// New empty cache that loads using the `loader`.
    pub fn new(loader: impl ImageLoader + 'static) -> Self {
        Self(Arc::new(ImagesData {
            loader: Box::new(loader),
            cache: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }))
    }

    /// Request an image.
    pub fn image(&self, spec: &ImageSpec, config: &ImageConfig, cache_mode: ImageCacheMode) -> ImageStream {
        self.completer(spec, config, cache_mode).stream()
    }

    /// Request an image, returns the completer.
    pub fn completer(&self, spec: &ImageSpec, config: &ImageConfig, cache_mode: ImageCacheMode) -> ImageCompleter {
        let key = spec.key(config);

        let completer = {
            let mut cache = self.0.cache.lock();
            match cache_mode {
                ImageCacheMode::Ignore => self.new_completer(key),
                ImageCacheMode::Cache => match cache.get(&key) {
                    Some(c) => {
                        tracing::trace!("{key:?} cache hit");
                        return c.clone();
                    }
                    None => {
                        let c = self.new_completer(key);
                        cache.insert(key, c.clone());
                        c
                    }
                },
                ImageCacheMode::Retry => match cache.get(&key) {
                    Some(c) if !c.is_error() => {
                        tracing::trace!("{key:?} cache hit");
                        return c.clone();
                    }
                    _ => {
                        let c = self.new_completer(key);
                        cache.insert(key, c.clone());
                        c
                    }
                },
                ImageCacheMode::Reload => {
                    let c = self.new_completer(key);
                    cache.insert(key, c.clone());
                    c
                }
            }
        };

        tracing::debug!("loading {:?} as {key:?}, {cache_mode:?}", spec.source);
        match &spec.source {
            ImageSource::Provider(p) => p.load(config, completer.clone()),
            _ => self.0.loader.load(spec, config, completer.clone()),
        }
        completer
    }

    fn new_completer(&self, image: ImageKey) -> ImageCompleter {
        let generation = self.0.generation.fetch_add(1, Ordering::Relaxed);
        ImageCompleter::new(ImageStreamKey { image, generation })
    }

    /// Remove the image from the cache, even if it is still in use.
    ///
    /// Listeners of the removed entry keep receiving its updates, the next request loads a new entry.
    ///
    /// Returns `true` if the image was cached.
    pub fn evict(&self, key: ImageKey) -> bool {
        self.0.cache.lock().remove(&key).is_some()
    }

    /// Remove the image from the cache if it has no listeners and is not kept alive.
    pub fn clean(&self, key: ImageKey) -> bool {
        let mut cache = self.0.cache.lock();
        match cache.get(&key) {
            Some(c) if c.is_unused() => {
                cache.remove(&key);
                true
            }
            _ => false,
        }
    }

    /// Remove all images that have no listeners and are not kept alive.
    pub fn clean_all(&self) {
        self.0.cache.lock().retain(|_, c| !c.is_unused());
    }

    /// Remove all images.
    pub fn clear(&self) {
        self.0.cache.lock().clear();
    }

    /// If an image is cached for the key.
    pub fn is_cached(&self, key: ImageKey) -> bool {
        self.0.cache.lock().contains_key(&key)
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.0.cache.lock().len()
    }

    /// If no image is cached.
    pub fn is_empty(&self) -> bool {
        self.0.cache.lock().is_empty()
    }
}
impl ImageResolver for Images {
    fn resolve(&self, spec: &ImageSpec, config: &ImageConfig, cache_mode: ImageCacheMode) -> ImageStream {
        self.image(spec, config, cache_mode)
    }
}
impl fmt::Debug for Images {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Images").field("len", &self.len()).finish_non_exhaustive()
    }
}
