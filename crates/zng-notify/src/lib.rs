#![doc(html_favicon_url = "https://zng-ui.github.io/res/zng-logo-icon.png")]
#![doc(html_logo_url = "https://zng-ui.github.io/res/zng-logo.png")]
//!
//! Change notifier and listener handles.
//!
//! # Crate
//!
#![doc = include_str!(concat!("../", std::env!("CARGO_PKG_README")))]
#![warn(unused_extern_crates)]
#![warn(missing_docs)]

use std::{
    fmt,
    num::NonZeroU64,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;

/// Unique identifier of a listener registered in a [`ChangeNotifier`] or other listener list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(NonZeroU64);
impl ListenerId {
    /// New unique ID.
    pub fn new_unique() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::MIN.saturating_add(id))
    }

    /// Raw value.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}
impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.debug_tuple("ListenerId").field(&self.0).finish()
        } else {
            write!(f, "ListenerId({})", self.0)
        }
    }
}

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct NotifierData {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    // handles to the sources of a merged notifier.
    sources: Mutex<Vec<NotifyHandle>>,
}

/// Push based change notification source, without payload.
///
/// The notifier is a shared reference, clones notify the same listeners. Any number of independent listeners can
/// be registered, each call to [`notify`] calls all listeners registered at the time of the call.
///
/// This is the channel a custom paint or clip delegate uses to request a new paint or clip without
/// being replaced.
///
/// [`notify`]: ChangeNotifier::notify
#[derive(Clone, Default)]
pub struct ChangeNotifier(Arc<NotifierData>);
impl ChangeNotifier {
    /// New notifier without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// New notifier that notifies when any of the `sources` notifies.
    ///
    /// The merged notifier only holds weak references to itself in the sources, dropping it
    /// removes the forwarding listeners from the sources.
    pub fn merge(sources: impl IntoIterator<Item = ChangeNotifier>) -> Self {
        let merged = Self::new();
        let handles: Vec<_> = sources
            .into_iter()
            .map(|s| {
                let wk = Arc::downgrade(&merged.0);
                s.subscribe(move || {
                    if let Some(n) = wk.upgrade() {
                        ChangeNotifier(n).notify();
                    }
                })
            })
            .collect();
        *merged.0.sources.lock() = handles;
        merged
    }

    /// Register a listener, returns an ID that can be used to [`remove_listener`].
    ///
    /// [`remove_listener`]: Self::remove_listener
    pub fn add_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId::new_unique();
        self.0.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove the listener.
    ///
    /// Returns `true` if the listener was registered. Removing a listener that is not registered is not an error.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut l = self.0.listeners.lock();
        if let Some(i) = l.iter().position(|(l_id, _)| *l_id == id) {
            l.remove(i);
            true
        } else {
            tracing::trace!("{id:?} not registered in notifier");
            false
        }
    }

    /// Register a listener that is removed when the returned handle is dropped.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> NotifyHandle {
        let id = self.add_listener(listener);
        NotifyHandle(Some(Arc::new(NotifyHandleData {
            notifier: Arc::downgrade(&self.0),
            id,
            perm: AtomicBool::new(false),
        })))
    }

    /// Call all listeners.
    ///
    /// Listeners are called outside of the internal lock, they can register or remove listeners. A listener removed by
    /// another listener during the same notification is not called.
    pub fn notify(&self) {
        let snapshot: Vec<_> = self.0.listeners.lock().clone();
        for (id, listener) in snapshot {
            let is_registered = self.0.listeners.lock().iter().any(|(l_id, _)| *l_id == id);
            if is_registered {
                listener();
            }
        }
    }

    /// Number of listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.0.listeners.lock().len()
    }

    /// If any listener is registered.
    pub fn has_listeners(&self) -> bool {
        !self.0.listeners.lock().is_empty()
    }

    /// If `self` and `other` are the same notifier.
    pub fn ptr_eq(&self, other: &ChangeNotifier) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl PartialEq for ChangeNotifier {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listener_count", &self.listener_count())
            .finish_non_exhaustive()
    }
}

struct NotifyHandleData {
    notifier: Weak<NotifierData>,
    id: ListenerId,
    perm: AtomicBool,
}
impl Drop for NotifyHandleData {
    fn drop(&mut self) {
        if !self.perm.load(Ordering::Relaxed)
            && let Some(n) = self.notifier.upgrade()
        {
            ChangeNotifier(n).remove_listener(self.id);
        }
    }
}

/// Handle to a listener registered in a [`ChangeNotifier`].
///
/// Dropping the handle removes the listener.
#[must_use = "dropping the handle removes the listener"]
#[derive(Default)]
pub struct NotifyHandle(Option<Arc<NotifyHandleData>>);
impl NotifyHandle {
    /// Handle to no listener.
    pub const fn dummy() -> Self {
        NotifyHandle(None)
    }

    /// Returns `true` if the handle is a [`dummy`].
    ///
    /// [`dummy`]: NotifyHandle::dummy
    pub fn is_dummy(&self) -> bool {
        self.0.is_none()
    }

    /// ID of the listener, if not dummy.
    pub fn listener_id(&self) -> Option<ListenerId> {
        self.0.as_ref().map(|d| d.id)
    }

    /// Drop the handle without removing the listener.
    pub fn perm(self) {
        if let Some(d) = &self.0 {
            d.perm.store(true, Ordering::Relaxed);
        }
    }
}
impl PartialEq for NotifyHandle {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
impl fmt::Debug for NotifyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(d) => f.debug_tuple("NotifyHandle").field(&d.id).finish(),
            None => write!(f, "NotifyHandle(<dummy>)"),
        }
    }
}

/// Subscribe to the `notifier` if it is set.
///
/// Returns a dummy handle if `notifier` is `None`.
pub fn subscribe_notifier(notifier: Option<&ChangeNotifier>, listener: impl Fn() + Send + Sync + 'static) -> NotifyHandle {
    match notifier {
        Some(n) => n.subscribe(listener),
        None => NotifyHandle::dummy(),
    }
}

/// Remove the `listener` from the `notifier` if it is set.
///
/// Does nothing if `notifier` is `None` or the listener is not registered.
pub fn unsubscribe_notifier(notifier: Option<&ChangeNotifier>, listener: ListenerId) {
    if let Some(n) = notifier {
        n.remove_listener(listener);
    }
}
