use std::{
    any::Any,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;
use zng_notify::ListenerId;

use crate::{ImageChunk, ImageError, ImageFrame, ImageKey};

type FrameFn = Arc<dyn Fn(&ImageFrame, bool) + Send + Sync>;
type ChunkFn = Arc<dyn Fn(&ImageChunk) + Send + Sync>;
type ErrorFn = Arc<dyn Fn(&ImageError) + Send + Sync>;

/// Callbacks registered in an [`ImageStream`].
///
/// The listener is identified by its [`id`], removing uses only the ID.
///
/// [`id`]: ImageListener::id
#[derive(Clone)]
pub struct ImageListener {
    id: ListenerId,
    on_frame: FrameFn,
    on_chunk: Option<ChunkFn>,
    on_error: Option<ErrorFn>,
}
impl ImageListener {
    /// New listener with a new unique ID.
    ///
    /// The `on_frame` closure is called for each frame, the `bool` is `true` when the frame is delivered
    /// synchronously inside the `add_listener` call.
    pub fn new(on_frame: impl Fn(&ImageFrame, bool) + Send + Sync + 'static) -> Self {
        Self::with_id(ListenerId::new_unique(), on_frame)
    }

    /// New listener with a given ID.
    pub fn with_id(id: ListenerId, on_frame: impl Fn(&ImageFrame, bool) + Send + Sync + 'static) -> Self {
        Self {
            id,
            on_frame: Arc::new(on_frame),
            on_chunk: None,
            on_error: None,
        }
    }

    /// Set the loading progress callback.
    pub fn on_chunk(mut self, on_chunk: impl Fn(&ImageChunk) + Send + Sync + 'static) -> Self {
        self.on_chunk = Some(Arc::new(on_chunk));
        self
    }

    /// Set the error callback.
    pub fn on_error(mut self, on_error: impl Fn(&ImageError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    /// Listener ID.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Call the frame callback.
    pub fn notify_frame(&self, frame: &ImageFrame, synchronous: bool) {
        (self.on_frame)(frame, synchronous)
    }

    /// Call the chunk callback, if set.
    pub fn notify_chunk(&self, chunk: &ImageChunk) {
        if let Some(f) = &self.on_chunk {
            f(chunk)
        }
    }

    /// Call the error callback, if set.
    pub fn notify_error(&self, error: &ImageError) {
        if let Some(f) = &self.on_error {
            f(error)
        }
    }
}
impl fmt::Debug for ImageListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageListener")
            .field("id", &self.id)
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Identity of an [`ImageStream`].
///
/// Two streams with the same key are the same logical stream, re-resolving an image to an equal key
/// does not need to re-subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageStreamKey {
    /// Key of the requested image.
    pub image: ImageKey,
    /// Load generation, a reloaded image gets a new generation.
    pub generation: u64,
}

/// Holds an image stream alive while no listener is registered.
///
/// The handle is released when dropped.
#[derive(Default)]
#[must_use = "the stream is only kept alive while the handle is held"]
pub struct KeepAliveHandle(Option<Box<dyn Any + Send + Sync>>);
impl KeepAliveHandle {
    /// New handle that owns `token` until dropped.
    pub fn new(token: impl Any + Send + Sync) -> Self {
        Self(Some(Box::new(token)))
    }

    /// Handle that holds nothing.
    pub fn dummy() -> Self {
        Self(None)
    }

    /// If the handle holds nothing.
    pub fn is_dummy(&self) -> bool {
        self.0.is_none()
    }
}
impl fmt::Debug for KeepAliveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dummy() {
            write!(f, "KeepAliveHandle(<dummy>)")
        } else {
            write!(f, "KeepAliveHandle(_)")
        }
    }
}

/// Implementation of an [`ImageStream`].
///
/// Implementers may call the listener back inside [`add_listener`], callers must not hold locks
/// the listener needs while adding.
///
/// [`add_listener`]: ImageStreamImpl::add_listener
pub trait ImageStreamImpl: Send + Sync {
    /// Stream identity.
    fn key(&self) -> ImageStreamKey;

    /// Register the listener.
    fn add_listener(&self, listener: ImageListener);

    /// Unregister the listener with the `id`.
    fn remove_listener(&self, id: ListenerId);

    /// Keep the stream alive while the handle is held.
    fn keep_alive(&self) -> KeepAliveHandle;
}

/// Handle to a resolved image that delivers frames to listeners.
///
/// Equality is by [`key`].
///
/// [`key`]: ImageStream::key
#[derive(Clone)]
pub struct ImageStream(Arc<dyn ImageStreamImpl>);
impl ImageStream {
    /// New from implementation.
    pub fn new(stream: impl ImageStreamImpl + 'static) -> Self {
        Self(Arc::new(stream))
    }

    /// Stream identity.
    pub fn key(&self) -> ImageStreamKey {
        self.0.key()
    }

    /// Register the listener, it may be called before this method returns.
    pub fn add_listener(&self, listener: ImageListener) {
        self.0.add_listener(listener)
    }

    /// Unregister the listener.
    pub fn remove_listener(&self, id: ListenerId) {
        self.0.remove_listener(id)
    }

    /// Keep the stream alive while no listener is registered.
    pub fn keep_alive(&self) -> KeepAliveHandle {
        self.0.keep_alive()
    }
}
impl PartialEq for ImageStream {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl fmt::Debug for ImageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ImageStream").field(&self.key()).finish()
    }
}

#[derive(Default)]
struct CompleterState {
    listeners: Vec<ImageListener>,
    frame: Option<ImageFrame>,
    chunk: Option<ImageChunk>,
    error: Option<ImageError>,
}

struct CompleterData {
    key: ImageStreamKey,
    state: Mutex<CompleterState>,
    keep_alive: AtomicUsize,
}

struct KeepAliveToken(Arc<CompleterData>);
impl Drop for KeepAliveToken {
    fn drop(&mut self) {
        self.0.keep_alive.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Image stream that is completed by a loader.
///
/// The completer retains the last frame and error, a listener added after they were set receives them
/// synchronously. Listener callbacks are called outside the internal lock, they can add or remove listeners.
///
/// This is a shared reference, clones complete the same stream.
#[derive(Clone)]
pub struct ImageCompleter(Arc<CompleterData>);
impl ImageCompleter {
    /// New empty completer.
    pub fn new(key: ImageStreamKey) -> Self {
        Self(Arc::new(CompleterData {
            key,
            state: Mutex::new(CompleterState::default()),
            keep_alive: AtomicUsize::new(0),
        }))
    }

    /// Stream identity.
    pub fn key(&self) -> ImageStreamKey {
        self.0.key
    }

    /// New stream handle for this completer.
    pub fn stream(&self) -> ImageStream {
        ImageStream::new(self.clone())
    }

    /// Set the current frame and notify all listeners.
    ///
    /// Clears the error.
    pub fn set_frame(&self, frame: ImageFrame) {
        let listeners = {
            let mut s = self.0.state.lock();
            s.frame = Some(frame.clone());
            s.error = None;
            s.listeners.clone()
        };
        tracing::trace!("{:?} frame ready, {} listeners", self.0.key.image, listeners.len());
        for l in &listeners {
            l.notify_frame(&frame, false);
        }
    }

    /// Report loading progress to all listeners.
    pub fn report_chunk(&self, chunk: ImageChunk) {
        let listeners = {
            let mut s = self.0.state.lock();
            s.chunk = Some(chunk);
            s.listeners.clone()
        };
        for l in &listeners {
            l.notify_chunk(&chunk);
        }
    }

    /// Set the error and notify all listeners.
    ///
    /// The current frame is retained.
    pub fn set_error(&self, error: ImageError) {
        tracing::debug!("{:?} load error, {error}", self.0.key.image);
        let listeners = {
            let mut s = self.0.state.lock();
            s.error = Some(error.clone());
            s.listeners.clone()
        };
        for l in &listeners {
            l.notify_error(&error);
        }
    }

    /// Current frame.
    pub fn frame(&self) -> Option<ImageFrame> {
        self.0.state.lock().frame.clone()
    }

    /// Last progress report.
    pub fn chunk(&self) -> Option<ImageChunk> {
        self.0.state.lock().chunk
    }

    /// Last error.
    pub fn error(&self) -> Option<ImageError> {
        self.0.state.lock().error.clone()
    }

    /// If the last update was an error.
    pub fn is_error(&self) -> bool {
        self.0.state.lock().error.is_some()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.0.state.lock().listeners.len()
    }

    /// If any [`KeepAliveHandle`] for this completer is held.
    pub fn is_kept_alive(&self) -> bool {
        self.0.keep_alive.load(Ordering::Relaxed) > 0
    }

    /// If the completer has no listeners and is not kept alive.
    pub fn is_unused(&self) -> bool {
        !self.is_kept_alive() && self.listener_count() == 0
    }
}
impl ImageStreamImpl for ImageCompleter {
    fn key(&self) -> ImageStreamKey {
        self.0.key
    }

    fn add_listener(&self, listener: ImageListener) {
        let (frame, error) = {
            let mut s = self.0.state.lock();
            if s.listeners.iter().any(|l| l.id == listener.id) {
                tracing::warn!("{:?} already registered in {:?}", listener.id, self.0.key.image);
                return;
            }
            s.listeners.push(listener.clone());
            (s.frame.clone(), s.error.clone())
        };
        if let Some(frame) = frame {
            listener.notify_frame(&frame, true);
        }
        if let Some(error) = error {
            listener.notify_error(&error);
        }
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut s = self.0.state.lock();
        let len = s.listeners.len();
        s.listeners.retain(|l| l.id != id);
        if s.listeners.len() == len {
            tracing::trace!("{id:?} not registered in {:?}", self.0.key.image);
        }
    }

    fn keep_alive(&self) -> KeepAliveHandle {
        self.0.keep_alive.fetch_add(1, Ordering::Relaxed);
        KeepAliveHandle::new(KeepAliveToken(self.0.clone()))
    }
}
impl fmt::Debug for ImageCompleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCompleter")
            .field("key", &self.0.key)
            .field("listener_count", &self.listener_count())
            .field("is_kept_alive", &self.is_kept_alive())
            .finish_non_exhaustive()
    }
}
