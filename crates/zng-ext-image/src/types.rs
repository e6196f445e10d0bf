use std::{
    fmt,
    hash::Hash as _,
    path::PathBuf,
    sync::Arc,
};

use zng_render::Img;
use zng_unit::{Factor, LayoutDirection, LayoutSize};

use crate::ImageCompleter;

/// SHA-512/256 digest that identifies image data and [`ImageKey`] entries.
///
/// The `Debug` output is the URL-safe base64 of the digest, use the alternate `{:#?}` for the raw bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ImageHash([u8; 32]);
impl ImageHash {
    /// Digest of `data`, sampled if the data is large, see [`ImageHasher::update`].
    pub fn compute(data: &[u8]) -> Self {
        let mut h = ImageHasher::new();
        h.update(data);
        h.into_hash()
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
impl fmt::Debug for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use base64::Engine as _;

        if f.alternate() {
            return f.debug_tuple("ImageHash").field(&self.0).finish();
        }
        f.write_str(&base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.0))
    }
}
impl fmt::Display for ImageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
impl std::hash::Hash for ImageHash {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // already a digest, the prefix is enough for hash maps.
        let mut prefix = [0; 8];
        prefix.copy_from_slice(&self.0[..8]);
        state.write_u64(u64::from_ne_bytes(prefix));
    }
}

/// Incremental [`ImageHash`] builder.
///
/// Also implements [`std::hash::Hasher`] so key parts can be fed with [`Hash::hash`].
///
/// [`Hash::hash`]: std::hash::Hash::hash
#[derive(Clone, Default)]
pub struct ImageHasher(sha2::Sha512_256);
impl ImageHasher {
    /// Data up to this length is fully digested.
    pub const FULL_DIGEST_LEN: usize = 4_000_000;
    const SAMPLES: usize = 1000;
    const SAMPLE_LEN: usize = 1024;

    /// New empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `data`.
    ///
    /// Data longer than [`FULL_DIGEST_LEN`] is sampled, one kilobyte at evenly spaced offsets.
    ///
    /// [`FULL_DIGEST_LEN`]: Self::FULL_DIGEST_LEN
    pub fn update(&mut self, data: &[u8]) {
        use sha2::Digest as _;

        if data.len() <= Self::FULL_DIGEST_LEN {
            self.0.update(data);
            return;
        }
        let stride = data.len() / Self::SAMPLES;
        for sample in data.chunks(stride).take(Self::SAMPLES) {
            self.0.update(&sample[..sample.len().min(Self::SAMPLE_LEN)]);
        }
    }

    /// Finalize the digest.
    pub fn into_hash(self) -> ImageHash {
        use sha2::Digest as _;

        let mut bytes = [0; 32];
        bytes.copy_from_slice(&self.0.finalize());
        ImageHash(bytes)
    }
}
impl std::hash::Hasher for ImageHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }

    fn finish(&self) -> u64 {
        tracing::warn!("`Hasher::finish` truncates the image hash, use `ImageHasher::into_hash`");
        let hash = self.clone().into_hash();
        let mut prefix = [0; 8];
        prefix.copy_from_slice(&hash.0[..8]);
        u64::from_le_bytes(prefix)
    }
}

/// Custom image source.
///
/// Providers compute their own key from the ambient configuration and load into the completer
/// given by the [`Images`] cache, instead of using the cache loader.
///
/// [`Images`]: crate::Images
pub trait ImageProvider: Send + Sync {
    /// Hash the identity of the image this provider loads for the `config`.
    ///
    /// Only hash the config fields that affect the output.
    fn hash_key(&self, config: &ImageConfig, hasher: &mut ImageHasher);

    /// Start loading the image.
    ///
    /// The provider must eventually call [`ImageCompleter::set_frame`] or [`ImageCompleter::set_error`],
    /// it can do so before returning.
    fn load(&self, config: &ImageConfig, completer: ImageCompleter);
}

/// Where the encoded image comes from.
#[derive(Clone)]
#[non_exhaustive]
pub enum ImageSource {
    /// File path.
    ///
    /// Two paths are two images, even if the files have the same content.
    Read(PathBuf),
    /// HTTP GET of the URI, with an optional `Accept` header value.
    ///
    /// Compared by URI and `Accept` value.
    Download(String, Option<String>),
    /// Named image in an asset bundle.
    ///
    /// Assets can have variants for each scale factor, locale, platform and layout direction, so
    /// the key of an asset depends on these ambient configuration values.
    Asset {
        /// Asset name.
        name: String,
        /// Bundle name, or the default bundle.
        bundle: Option<String>,
    },
    /// Encoded bytes already in memory.
    ///
    /// Compared by the hash only, [`from_data`] uses the digest of the bytes.
    ///
    /// [`from_data`]: ImageSource::from_data
    Data(ImageHash, Arc<[u8]>),
    /// Custom source.
    ///
    /// Image equality is defined by the pointer and the key the provider computes.
    Provider(Arc<dyn ImageProvider>),
}
impl ImageSource {
    /// Source from encoded bytes, hashing them.
    pub fn from_data(data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        Self::Data(ImageHash::compute(&data), data)
    }

    /// New source from asset name in the default bundle.
    pub fn asset(name: impl Into<String>) -> Self {
        Self::Asset {
            name: name.into(),
            bundle: None,
        }
    }

    /// New source from a custom provider.
    pub fn provider(provider: impl ImageProvider + 'static) -> Self {
        Self::Provider(Arc::new(provider))
    }

    fn hash_key(&self, config: &ImageConfig, h: &mut ImageHasher) {
        match self {
            ImageSource::Read(p) => {
                0u8.hash(h);
                p.hash(h);
            }
            ImageSource::Download(uri, accept) => {
                1u8.hash(h);
                uri.hash(h);
                accept.hash(h);
            }
            ImageSource::Asset { name, bundle } => {
                2u8.hash(h);
                name.hash(h);
                bundle.hash(h);
                config.scale_factor.hash(h);
                config.locale.hash(h);
                config.platform.hash(h);
                config.direction.hash(h);
            }
            ImageSource::Data(hash, _) => {
                3u8.hash(h);
                hash.0.hash(h);
            }
            ImageSource::Provider(p) => {
                4u8.hash(h);
                (Arc::as_ptr(p) as *const () as usize).hash(h);
                p.hash_key(config, h);
            }
        }
    }
}
impl PartialEq for ImageSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Read(a), Self::Read(b)) => a == b,
            (Self::Download(a, aa), Self::Download(b, ba)) => a == b && aa == ba,
            (
                Self::Asset { name: a, bundle: ab },
                Self::Asset { name: b, bundle: bb },
            ) => a == b && ab == bb,
            (Self::Data(a, _), Self::Data(b, _)) => a == b,
            (Self::Provider(a), Self::Provider(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "ImageSource::")?;
        }
        match self {
            ImageSource::Read(p) => f.debug_tuple("Read").field(p).finish(),
            ImageSource::Download(u, a) => f.debug_tuple("Download").field(u).field(a).finish(),
            ImageSource::Asset { name, bundle } => f.debug_struct("Asset").field("name", name).field("bundle", bundle).finish(),
            ImageSource::Data(h, _) => f.debug_tuple("Data").field(h).finish_non_exhaustive(),
            ImageSource::Provider(p) => write!(f, "Provider({:p})", Arc::as_ptr(p)),
        }
    }
}
impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Read(path)
    }
}
impl From<&std::path::Path> for ImageSource {
    fn from(path: &std::path::Path) -> Self {
        ImageSource::Read(path.to_owned())
    }
}

/// Image source with the decode scale and request headers.
///
/// This is the full identity of an image request, resolved against an [`ImageConfig`] to an [`ImageKey`].
#[derive(Clone, PartialEq, Debug)]
#[non_exhaustive]
pub struct ImageSpec {
    /// Image source.
    pub source: ImageSource,
    /// Scale of the decoded pixels, a 2x image is drawn at half its pixel size.
    pub scale: Factor,
    /// HTTP headers for [`ImageSource::Download`].
    pub headers: Vec<(String, String)>,
}
impl ImageSpec {
    /// New spec with scale `1.0` and no headers.
    pub fn new(source: impl Into<ImageSource>) -> Self {
        Self {
            source: source.into(),
            scale: Factor(1.0),
            headers: vec![],
        }
    }

    /// Set the decode scale.
    pub fn with_scale(mut self, scale: impl Into<Factor>) -> Self {
        self.scale = scale.into();
        self
    }

    /// Add an HTTP header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Compute the key of the image this spec resolves to in the `config`.
    pub fn key(&self, config: &ImageConfig) -> ImageKey {
        let mut h = ImageHasher::new();
        self.source.hash_key(config, &mut h);
        self.scale.hash(&mut h);
        self.headers.hash(&mut h);
        ImageKey(h.into_hash())
    }
}
impl From<ImageSource> for ImageSpec {
    fn from(source: ImageSource) -> Self {
        ImageSpec::new(source)
    }
}

/// Ambient configuration an image is resolved against.
///
/// All values are optional, sources only depend on the values they need, see [`ImageSpec::key`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Device pixel ratio.
    pub scale_factor: Option<Factor>,
    /// Locale identifier, like `"en-US"`.
    pub locale: Option<String>,
    /// Layout direction.
    pub direction: Option<LayoutDirection>,
    /// Size the image will be displayed at.
    pub size: Option<LayoutSize>,
    /// Platform identifier, like `"linux"`.
    pub platform: Option<String>,
}
impl ImageConfig {
    /// Config with only the scale factor set.
    pub fn scale_factor(scale_factor: impl Into<Factor>) -> Self {
        Self {
            scale_factor: Some(scale_factor.into()),
            ..Default::default()
        }
    }
}

/// Identity of an image request resolved in an ambient configuration.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageKey(ImageHash);
impl ImageKey {
    /// Key from a precomputed hash.
    pub fn from_hash(hash: ImageHash) -> Self {
        Self(hash)
    }

    /// The hash.
    pub fn image_hash(&self) -> ImageHash {
        self.0
    }
}
impl fmt::Debug for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageKey({:?})", self.0)
    }
}

/// A decoded image frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    /// Pixels.
    pub img: Img,
    /// Scale of the pixels.
    pub scale: Factor,
}
impl ImageFrame {
    /// New frame.
    pub fn new(img: Img, scale: impl Into<Factor>) -> Self {
        Self { img, scale: scale.into() }
    }

    /// Size in layout units, the pixel size divided by the scale.
    pub fn size(&self) -> LayoutSize {
        let s = self.img.size();
        if self.scale.0 <= 0.0 {
            return LayoutSize::zero();
        }
        LayoutSize::new(s.width / self.scale.0, s.height / self.scale.0)
    }
}

/// Image loading progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageChunk {
    /// Bytes loaded so far.
    pub cumulative_bytes: u64,
    /// Total bytes expected, if known.
    pub expected_total: Option<u64>,
}
impl ImageChunk {
    /// Progress in the `0.0..=1.0` range, if the total is known.
    pub fn progress(&self) -> Option<Factor> {
        match self.expected_total {
            Some(0) => Some(Factor(1.0)),
            Some(t) => Some(Factor((self.cumulative_bytes as f64 / t as f64).min(1.0) as f32)),
            None => None,
        }
    }
}

/// Error loading or decoding an image.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ImageError {
    /// Failed to read or download the encoded data.
    Io(Arc<std::io::Error>),
    /// Data is not a supported image.
    Decode(String),
    /// Asset or file not found.
    NotFound(String),
    /// No loader handles the source.
    Unsupported(String),
}
impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Io(e) => write!(f, "image io error, {e}"),
            ImageError::Decode(e) => write!(f, "cannot decode image, {e}"),
            ImageError::NotFound(e) => write!(f, "image `{e}` not found"),
            ImageError::Unsupported(e) => write!(f, "unsupported image source, {e}"),
        }
    }
}
impl std::error::Error for ImageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImageError::Io(e) => Some(&**e),
            _ => None,
        }
    }
}
impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        ImageError::Io(Arc::new(e))
    }
}

/// Cache mode of an image request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ImageCacheMode {
    /// Always load a new uncached stream.
    Ignore,
    /// Share the cached stream, loading and caching it on the first request.
    #[default]
    Cache,
    /// Like [`Cache`], but a cached stream that failed is loaded again.
    ///
    /// [`Cache`]: ImageCacheMode::Cache
    Retry,
    /// Replace the cached stream with a new load.
    ///
    /// Listeners of the replaced stream stay on it.
    Reload,
}
impl fmt::Debug for ImageCacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "ImageCacheMode::")?;
        }
        let name = match self {
            Self::Ignore => "Ignore",
            Self::Cache => "Cache",
            Self::Retry => "Retry",
            Self::Reload => "Reload",
        };
        f.write_str(name)
    }
}
impl From<bool> for ImageCacheMode {
    fn from(cache: bool) -> Self {
        if cache { ImageCacheMode::Cache } else { ImageCacheMode::Ignore }
    }
}
