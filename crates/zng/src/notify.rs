//! Change notifier.
//!
//! A [`ChangeNotifier`] is a push channel without payload, delegates use it to request a new clip or paint
//! without being replaced. Each listener is owned by a [`NotifyHandle`], dropping the handle removes the listener.
//!
//! ```
//! use zng::notify::*;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! let n = ChangeNotifier::new();
//! let count = Arc::new(AtomicUsize::new(0));
//! let c = count.clone();
//! let handle = n.subscribe(move || { c.fetch_add(1, Ordering::Relaxed); });
//!
//! n.notify();
//! drop(handle);
//! n.notify();
//!
//! assert_eq!(1, count.load(Ordering::Relaxed));
//! ```
//!
//! # Full API
//!
//! See [`zng_notify`] for the full API.

pub use zng_notify::{ChangeNotifier, ListenerId, NotifyHandle, subscribe_notifier, unsubscribe_notifier};
