use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use zng_ext_image::{
    ImageCacheMode, ImageChunk, ImageConfig, ImageError, ImageFrame, ImageListener, ImageResolver, ImageSpec, ImageStream,
    KeepAliveHandle,
};
use zng_notify::{ChangeNotifier, ListenerId};

use crate::{ImageFit, ImagePainter};

/// Options of an [`ImageSubscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    /// Retain the current frame when the stream changes, until the new stream delivers a frame.
    ///
    /// Is `false` by default, the frame is cleared immediately.
    pub gapless_playback: bool,
    /// Cache mode used to resolve the image.
    pub cache_mode: ImageCacheMode,
}

/// State of an [`ImageSubscription`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// No stream resolved yet.
    Unresolved,
    /// Listening to the stream.
    Attached,
    /// Has a stream, but is not listening to it.
    Detached,
    /// Torn down, no longer responds to events.
    Deinited,
}

/// What the subscription presents.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    /// Current frame, `None` shows nothing.
    pub frame: Option<ImageFrame>,
    /// Frames received from the current stream.
    pub frame_number: u64,
    /// Loading progress of the current stream.
    pub chunk: Option<ImageChunk>,
    /// Error from the current stream.
    pub error: Option<ImageError>,
    /// If a frame of the current stream was delivered inside the attach call.
    pub was_synchronously_loaded: bool,
}
impl DisplayState {
    /// If the current stream has not delivered a frame or error yet.
    pub fn is_loading(&self) -> bool {
        self.frame_number == 0 && self.error.is_none()
    }
}

type UpdateFn = Arc<dyn Fn(&DisplayState) + Send + Sync>;

struct SharedState {
    display: DisplayState,
    // listener allowed to update the display.
    active: Option<ListenerId>,
}

pub(crate) struct Shared {
    state: Mutex<SharedState>,
    on_update: Mutex<Option<UpdateFn>>,
    pub(crate) repaint: ChangeNotifier,
}
impl Shared {
    pub(crate) fn frame(&self) -> Option<ImageFrame> {
        self.state.lock().display.frame.clone()
    }

    /// Update the display and notify, if `from` is still the active listener.
    fn update(&self, from: Option<ListenerId>, f: impl FnOnce(&mut DisplayState)) {
        let display = {
            let mut s = self.state.lock();
            if let Some(id) = from
                && s.active != Some(id)
            {
                tracing::trace!("ignoring image update from detached {id:?}");
                return;
            }
            f(&mut s.display);
            s.display.clone()
        };

        let on_update = self.on_update.lock().clone();
        if let Some(h) = on_update {
            h(&display);
        }
        self.repaint.notify();
    }

    fn set_active(&self, id: Option<ListenerId>) {
        self.state.lock().active = id;
    }
}

/// Manages the subscription of a presenter to an image stream.
///
/// The subscription is a state machine driven by the host lifecycle events:
///
/// * [`dependencies_changed`] on first attach and when the ambient configuration changes.
/// * [`source_replaced`] when the image spec changes.
/// * [`set_listening`] when the presenter context pauses or resumes.
/// * [`reload`] after the image cache was flushed.
/// * [`deinit`] on teardown, also called on drop.
///
/// Each event that resolves compares the new stream with the current one, an equal stream is a no-op. Otherwise
/// the listener is removed from the old stream before it is added to the new one, at most one listener is
/// attached at any time.
///
/// Streams may deliver a cached frame inside the attach call, the display is updated before the event
/// method returns in this case.
///
/// [`dependencies_changed`]: ImageSubscription::dependencies_changed
/// [`source_replaced`]: ImageSubscription::source_replaced
/// [`set_listening`]: ImageSubscription::set_listening
/// [`reload`]: ImageSubscription::reload
/// [`deinit`]: ImageSubscription::deinit
pub struct ImageSubscription {
    resolver: Arc<dyn ImageResolver>,
    spec: ImageSpec,
    config: ImageConfig,
    options: ImageOptions,

    stream: Option<ImageStream>,
    listener: Option<ListenerId>,
    keep_alive: KeepAliveHandle,
    listening: bool,
    resolved: bool,
    deinited: bool,

    shared: Arc<Shared>,
}
impl ImageSubscription {
    /// New unresolved subscription.
    ///
    /// Nothing is resolved until the first host event.
    pub fn new(spec: impl Into<ImageSpec>, resolver: impl ImageResolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
            spec: spec.into(),
            config: ImageConfig::default(),
            options: ImageOptions::default(),
            stream: None,
            listener: None,
            keep_alive: KeepAliveHandle::dummy(),
            listening: false,
            resolved: false,
            deinited: false,
            shared: Arc::new(Shared {
                state: Mutex::new(SharedState {
                    display: DisplayState::default(),
                    active: None,
                }),
                on_update: Mutex::new(None),
                repaint: ChangeNotifier::new(),
            }),
        }
    }

    /// Set the options.
    pub fn with_options(mut self, options: ImageOptions) -> Self {
        self.options = options;
        self
    }

    /// Set a closure called after the display state changes.
    ///
    /// The closure can be called from the loader thread, and inside the event methods.
    pub fn on_update(self, handler: impl Fn(&DisplayState) + Send + Sync + 'static) -> Self {
        *self.shared.on_update.lock() = Some(Arc::new(handler));
        self
    }

    /// The ambient configuration or listening state changed.
    ///
    /// Resolves the [`ImageSpec`] in the `config` and attaches to the stream if `listening`. If the spec
    /// key in the new `config` is the key of the current stream the stream is kept, even in the
    /// [`Ignore`] and [`Reload`] cache modes.
    ///
    /// [`Ignore`]: ImageCacheMode::Ignore
    /// [`Reload`]: ImageCacheMode::Reload
    pub fn dependencies_changed(&mut self, config: ImageConfig, listening: bool) {
        if self.is_deinited("dependencies_changed") {
            return;
        }
        self.config = config;
        self.listening = listening;
        let key = self.spec.key(&self.config);
        if self.stream.as_ref().is_some_and(|s| s.key().image == key) {
            tracing::trace!("{key:?} unchanged in new config");
        } else {
            self.resolve();
        }
        if listening {
            self.attach();
        } else {
            self.detach(true);
        }
    }

    /// The image spec was replaced.
    ///
    /// Resolves the new `spec` even if the configuration did not change. Before the first
    /// [`dependencies_changed`] the spec is only stored, the configuration is not known yet.
    ///
    /// [`dependencies_changed`]: Self::dependencies_changed
    pub fn source_replaced(&mut self, spec: impl Into<ImageSpec>) {
        if self.is_deinited("source_replaced") {
            return;
        }
        self.spec = spec.into();
        if self.resolved {
            self.resolve();
        }
    }

    /// Replace the options.
    ///
    /// Resolves again if the cache mode changed and a stream was already resolved.
    pub fn set_options(&mut self, options: ImageOptions) {
        if self.is_deinited("set_options") {
            return;
        }
        let cache_changed = self.options.cache_mode != options.cache_mode;
        self.options = options;
        if cache_changed && self.resolved {
            self.resolve();
        }
    }

    /// Enable or disable listening to the stream.
    ///
    /// While disabled the stream is kept alive, but frames are not observed.
    pub fn set_listening(&mut self, listening: bool) {
        if self.is_deinited("set_listening") {
            return;
        }
        self.listening = listening;
        if listening {
            self.attach();
        } else {
            self.detach(true);
        }
    }

    /// Resolve again with the current spec and configuration.
    ///
    /// Use after flushing the image cache, the resolver may now return a new stream for the same image.
    /// Does nothing before the first [`dependencies_changed`].
    ///
    /// [`dependencies_changed`]: Self::dependencies_changed
    pub fn reload(&mut self) {
        if self.is_deinited("reload") || !self.resolved {
            return;
        }
        self.resolve();
    }

    /// Tear down the subscription.
    ///
    /// Detaches from the stream and releases it. The subscription must have resolved at least once, this is
    /// asserted in debug builds. Calling again is a no-op.
    pub fn deinit(&mut self) {
        if self.deinited {
            return;
        }
        let resolved = self.resolved;
        self.teardown();
        debug_assert!(resolved, "image subscription deinited without ever resolving a stream");
    }

    fn teardown(&mut self) {
        if !self.resolved {
            tracing::error!("image subscription for {:?} deinited without ever resolving", self.spec.source);
        }
        self.detach(false);
        self.stream = None;
        self.keep_alive = KeepAliveHandle::dummy();
        self.deinited = true;
    }

    fn is_deinited(&self, event: &str) -> bool {
        if self.deinited {
            tracing::warn!("ignoring `{event}`, image subscription is deinited");
        }
        self.deinited
    }

    fn resolve(&mut self) {
        let stream = self.resolver.resolve(&self.spec, &self.config, self.options.cache_mode);
        self.resolved = true;

        if self.stream.as_ref() == Some(&stream) {
            tracing::trace!("{:?} already resolved", stream.key());
            return;
        }
        tracing::debug!("image stream changed to {:?}", stream.key());

        self.detach(false);
        self.keep_alive = KeepAliveHandle::dummy();

        let gapless = self.options.gapless_playback;
        self.shared.update(None, |d| {
            if !gapless {
                d.frame = None;
            }
            d.frame_number = 0;
            d.chunk = None;
            d.error = None;
            d.was_synchronously_loaded = false;
        });

        self.stream = Some(stream);
        if self.listening {
            self.attach();
        } else {
            self.keep_alive = self.stream.as_ref().map(ImageStream::keep_alive).unwrap_or_default();
        }
    }

    fn attach(&mut self) {
        if self.listener.is_some() {
            return;
        }
        let Some(stream) = &self.stream else {
            return;
        };

        let id = ListenerId::new_unique();
        self.listener = Some(id);
        self.shared.set_active(Some(id));

        let frame_shared = self.shared.clone();
        let chunk_shared = self.shared.clone();
        let error_shared = self.shared.clone();
        let listener = ImageListener::with_id(id, move |frame, synchronous| {
            frame_shared.update(Some(id), |d| {
                d.frame = Some(frame.clone());
                d.frame_number += 1;
                d.chunk = None;
                d.error = None;
                d.was_synchronously_loaded |= synchronous;
            })
        })
        .on_chunk(move |chunk| chunk_shared.update(Some(id), |d| d.chunk = Some(*chunk)))
        .on_error(move |error| {
            error_shared.update(Some(id), |d| {
                d.chunk = None;
                d.error = Some(error.clone());
            })
        });

        // no lock held, the stream may call the listener before returning.
        stream.add_listener(listener);
        self.keep_alive = KeepAliveHandle::dummy();
    }

    fn detach(&mut self, keep_alive: bool) {
        let Some(id) = self.listener.take() else {
            return;
        };
        self.shared.set_active(None);
        if let Some(stream) = &self.stream {
            if keep_alive {
                self.keep_alive = stream.keep_alive();
            }
            stream.remove_listener(id);
        }
    }

    /// Current state.
    pub fn state(&self) -> SubscriptionState {
        if self.deinited {
            SubscriptionState::Deinited
        } else if self.listener.is_some() {
            SubscriptionState::Attached
        } else if self.stream.is_some() {
            SubscriptionState::Detached
        } else {
            SubscriptionState::Unresolved
        }
    }

    /// Snapshot of the display state.
    pub fn display(&self) -> DisplayState {
        self.shared.state.lock().display.clone()
    }

    /// Current frame.
    pub fn frame(&self) -> Option<ImageFrame> {
        self.shared.frame()
    }

    /// Current stream.
    pub fn stream(&self) -> Option<&ImageStream> {
        self.stream.as_ref()
    }

    /// Current spec.
    pub fn spec(&self) -> &ImageSpec {
        &self.spec
    }

    /// Current configuration.
    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// Current options.
    pub fn options(&self) -> ImageOptions {
        self.options
    }

    /// If listening is enabled.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// If a listener is attached to the stream.
    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// If the stream is held alive while detached.
    pub fn is_keeping_alive(&self) -> bool {
        !self.keep_alive.is_dummy()
    }

    /// Notifier that signals every display state change.
    pub fn repaint(&self) -> &ChangeNotifier {
        &self.shared.repaint
    }

    /// New paint delegate that draws the current frame.
    ///
    /// The painter repaints on every display state change, it remains valid after the subscription is dropped,
    /// painting the last frame.
    pub fn painter(&self, fit: ImageFit) -> ImagePainter {
        ImagePainter::new(self.shared.clone(), fit)
    }
}
impl Drop for ImageSubscription {
    fn drop(&mut self) {
        if !self.deinited {
            self.teardown();
        }
    }
}
impl fmt::Debug for ImageSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSubscription")
            .field("spec", &self.spec)
            .field("state", &self.state())
            .field("stream", &self.stream)
            .field("listening", &self.listening)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
