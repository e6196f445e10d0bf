use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use zng::{
    image::*,
    notify::ListenerId,
    prelude::*,
};

type Log = Arc<Mutex<Vec<String>>>;

struct MockData {
    name: &'static str,
    key: ImageStreamKey,
    log: Log,
    listeners: Mutex<Vec<ImageListener>>,
    frame: Mutex<Option<ImageFrame>>,
}

/// Stream that records every call and delivers its frame synchronously to new listeners.
#[derive(Clone)]
struct MockStream(Arc<MockData>);
impl MockStream {
    fn new(name: &'static str, log: &Log) -> Self {
        Self(Arc::new(MockData {
            name,
            key: ImageStreamKey {
                image: ImageKey::from_hash(ImageHash::compute(name.as_bytes())),
                generation: 0,
            },
            log: log.clone(),
            listeners: Mutex::new(vec![]),
            frame: Mutex::new(None),
        }))
    }

    fn deliver(&self, frame: ImageFrame) {
        *self.0.frame.lock() = Some(frame.clone());
        let listeners = self.0.listeners.lock().clone();
        for l in listeners {
            l.notify_frame(&frame, false);
        }
    }

    fn listener_count(&self) -> usize {
        self.0.listeners.lock().len()
    }
}
impl ImageStreamImpl for MockStream {
    fn key(&self) -> ImageStreamKey {
        self.0.key
    }

    fn add_listener(&self, listener: ImageListener) {
        self.0.log.lock().push(format!("add:{}", self.0.name));
        {
            let mut ls = self.0.listeners.lock();
            if ls.iter().any(|l| l.id() == listener.id()) {
                self.0.log.lock().push(format!("duplicate:{}", self.0.name));
            }
            ls.push(listener.clone());
        }
        let frame = self.0.frame.lock().clone();
        if let Some(f) = frame {
            listener.notify_frame(&f, true);
        }
        self.0.log.lock().push(format!("add-returned:{}", self.0.name));
    }

    fn remove_listener(&self, id: ListenerId) {
        let mut ls = self.0.listeners.lock();
        let len = ls.len();
        ls.retain(|l| l.id() != id);
        let tag = if ls.len() == len { "remove-unknown" } else { "remove" };
        self.0.log.lock().push(format!("{tag}:{}", self.0.name));
    }

    fn keep_alive(&self) -> KeepAliveHandle {
        KeepAliveHandle::new(self.0.clone())
    }
}

struct MockResolver(HashMap<&'static str, MockStream>);
impl ImageResolver for MockResolver {
    fn resolve(&self, spec: &ImageSpec, _: &ImageConfig, _: ImageCacheMode) -> ImageStream {
        match &spec.source {
            ImageSource::Asset { name, .. } => ImageStream::new(self.0[name.as_str()].clone()),
            s => panic!("unexpected source {s:?}"),
        }
    }
}

fn setup(names: &[&'static str]) -> (Log, HashMap<&'static str, MockStream>, MockResolver) {
    let log = Log::default();
    let streams: HashMap<_, _> = names.iter().map(|n| (*n, MockStream::new(*n, &log))).collect();
    let resolver = MockResolver(streams.clone());
    (log, streams, resolver)
}

fn asset(name: &str) -> ImageSpec {
    ImageSpec::new(ImageSource::asset(name))
}

fn frame(color: Rgba) -> ImageFrame {
    ImageFrame::new(Img::flood(1, 1, color), 1.fct())
}

/// Subscription that logs the frame state on each update.
fn subscription(spec: ImageSpec, resolver: MockResolver, log: &Log, gapless: bool) -> ImageSubscription {
    let log = log.clone();
    ImageSubscription::new(spec, resolver)
        .with_options(ImageOptions {
            gapless_playback: gapless,
            ..Default::default()
        })
        .on_update(move |d| {
            let state = if d.frame.is_some() { "frame" } else { "empty" };
            log.lock().push(format!("update:{state}"));
        })
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.lock())
}

fn init_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn end_to_end() {
    init_logger();
    let (log, streams, resolver) = setup(&["a", "b"]);
    let f1 = frame(Rgba::BLACK);
    streams["a"].deliver(f1.clone());

    let mut sub = subscription(asset("a"), resolver, &log, false);
    sub.dependencies_changed(ImageConfig::default(), false);
    assert_eq!(vec!["update:empty"], take(&log));
    assert_eq!(SubscriptionState::Detached, sub.state());

    sub.set_listening(true);
    assert_eq!(vec!["add:a", "update:frame", "add-returned:a"], take(&log));
    assert_eq!(Some(f1), sub.frame());
    assert!(sub.display().was_synchronously_loaded);

    sub.source_replaced(asset("b"));
    assert_eq!(vec!["remove:a", "update:empty", "add:b", "add-returned:b"], take(&log));
    assert_eq!(None, sub.frame());

    let f2 = frame(Rgba::WHITE);
    streams["b"].deliver(f2.clone());
    assert_eq!(vec!["update:frame"], take(&log));
    assert_eq!(Some(f2), sub.frame());
    assert!(!sub.display().was_synchronously_loaded);

    sub.deinit();
    assert_eq!(vec!["remove:b"], take(&log));
}

#[test]
fn gapless_retains_frame_until_new() {
    let (log, streams, resolver) = setup(&["a", "b"]);
    let f1 = frame(Rgba::BLACK);
    streams["a"].deliver(f1.clone());

    let mut sub = subscription(asset("a"), resolver, &log, true);
    sub.dependencies_changed(ImageConfig::default(), true);
    take(&log);

    sub.source_replaced(asset("b"));
    assert_eq!(vec!["remove:a", "update:frame", "add:b", "add-returned:b"], take(&log));
    assert_eq!(Some(f1), sub.frame());

    let f2 = frame(Rgba::WHITE);
    streams["b"].deliver(f2.clone());
    assert_eq!(Some(f2), sub.frame());
}

#[test]
fn idempotent_resolution() {
    let (log, _streams, resolver) = setup(&["a"]);
    let mut sub = subscription(asset("a"), resolver, &log, false);
    sub.dependencies_changed(ImageConfig::default(), true);
    take(&log);

    for _ in 0..3 {
        sub.dependencies_changed(ImageConfig::default(), true);
        sub.source_replaced(asset("a"));
        sub.reload();
    }
    assert!(take(&log).is_empty());
}

#[test]
fn no_duplicate_subscriptions() {
    let (log, streams, resolver) = setup(&["a", "b", "c"]);
    streams["b"].deliver(frame(Rgba::BLACK));
    let mut sub = subscription(asset("a"), resolver, &log, false);

    // deterministic pseudo-random event sequence.
    let mut seed = 0x2545_f491_u32;
    let names = ["a", "b", "c"];
    for _ in 0..500 {
        seed ^= seed << 13;
        seed ^= seed >> 17;
        seed ^= seed << 5;
        let name = names[(seed >> 8) as usize % names.len()];
        match seed % 5 {
            0 => sub.dependencies_changed(ImageConfig::default(), seed & 0x100 != 0),
            1 => sub.set_listening(true),
            2 => sub.set_listening(false),
            3 => sub.source_replaced(asset(name)),
            _ => sub.reload(),
        }

        let total: usize = streams.values().map(MockStream::listener_count).sum();
        assert!(total <= 1, "{total} listeners attached");
        assert_eq!(sub.is_attached() as usize, total);
        if sub.is_attached() {
            let current = sub.stream().map(|s| s.key());
            let attached = streams.values().find(|s| s.listener_count() == 1).map(|s| s.key());
            assert_eq!(current, attached);
        }
    }

    let log = take(&log);
    assert!(!log.iter().any(|l| l.starts_with("duplicate") || l.starts_with("remove-unknown")));
    sub.deinit();
}

#[test]
fn detach_before_attach() {
    let (log, _streams, resolver) = setup(&["a", "b", "c"]);
    let mut sub = subscription(asset("a"), resolver, &log, false);
    sub.dependencies_changed(ImageConfig::default(), true);
    sub.source_replaced(asset("b"));
    sub.set_listening(false);
    sub.source_replaced(asset("c"));
    sub.set_listening(true);
    sub.source_replaced(asset("a"));

    let calls: Vec<_> = take(&log)
        .into_iter()
        .filter(|l| l.starts_with("add:") || l.starts_with("remove:"))
        .collect();
    assert_eq!(
        vec!["add:a", "remove:a", "add:b", "remove:b", "add:c", "remove:c", "add:a"],
        calls
    );
}

#[test]
fn cache_shared_between_subscriptions() {
    let loads = Arc::new(Mutex::new(0));
    let l = loads.clone();
    let images = Images::new(move |_: &ImageSpec, config: &ImageConfig, c: ImageCompleter| {
        *l.lock() += 1;
        let scale = config.scale_factor.unwrap_or(1.fct());
        c.set_frame(ImageFrame::new(Img::flood(2, 2, Rgba::BLACK), scale));
    });

    let mut a = ImageSubscription::new(asset("logo"), images.clone());
    let mut b = ImageSubscription::new(asset("logo"), images.clone());
    a.dependencies_changed(ImageConfig::scale_factor(2.fct()), true);
    b.dependencies_changed(ImageConfig::scale_factor(2.fct()), true);
    assert_eq!(1, *loads.lock());
    assert_eq!(a.frame(), b.frame());
    assert_eq!(1, images.len());

    // assets depend on the scale factor.
    b.dependencies_changed(ImageConfig::scale_factor(1.fct()), true);
    assert_eq!(2, *loads.lock());
    assert_ne!(a.frame(), b.frame());

    // flushed cache entry is loaded again on reload.
    images.clear();
    let before = a.stream().cloned();
    a.reload();
    assert_eq!(3, *loads.lock());
    assert_ne!(before, a.stream().cloned());
    assert!(a.display().was_synchronously_loaded);
}
