//! Custom clip delegate and node.

use std::{
    any::Any,
    fmt,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use zng_notify::{ChangeNotifier, NotifyHandle, subscribe_notifier};
use zng_render::{Canvas, ClipShape, Ellipse, RoundedRect, with_saved};
use zng_unit::{LayoutPoint, LayoutRect, LayoutSideOffsets, LayoutSize, LayoutSizeExt as _};

/// Delegate that defines a clip region for a size.
///
/// Only [`clip`] and [`should_reclip`] are required, the other methods have defaults that call the
/// free functions of this module.
///
/// [`clip`]: CustomClip::clip
/// [`should_reclip`]: CustomClip::should_reclip
pub trait CustomClip: Any + Send + Sync {
    /// Clip shape produced by the delegate.
    type Clip: ClipShape + Clone + 'static;

    /// Compute the clip region for a widget of the `size`.
    ///
    /// Can be called any number of times, even if the delegate was never compared. Must not panic for
    /// zero area sizes, return a degenerate empty region instead.
    fn clip(&self, size: LayoutSize) -> Self::Clip;

    /// Approximate axis aligned bounds of the clip region.
    ///
    /// Used for hit-test and accessibility estimates, it does not need to be exact. The default
    /// is [`default_approximate_bounds`].
    fn approximate_bounds(&self, size: LayoutSize) -> LayoutRect {
        default_approximate_bounds(size)
    }

    /// Returns `true` if the clip of `self` is different from the clip of `previous`.
    ///
    /// This is called when a node replaces `previous` with `self`. Must not have side effects, returning `false`
    /// is only a hint, the node may still compute a new clip.
    fn should_reclip(&self, previous: &Self) -> bool
    where
        Self: Sized;

    /// Notifier that signals the clip must be computed again, without replacing the delegate.
    fn reclip(&self) -> Option<&ChangeNotifier> {
        None
    }
}

/// Full `size` rectangle at the origin.
pub fn default_approximate_bounds(size: LayoutSize) -> LayoutRect {
    LayoutRect::from_size(size)
}

/// Type erased [`CustomClip`] for clip shape `S`.
pub trait AnyCustomClip<S>: Any + Send + Sync {
    /// Access to `dyn Any` methods.
    fn as_any(&self) -> &dyn Any;

    /// [`CustomClip::clip`].
    fn clip_any(&self, size: LayoutSize) -> S;

    /// [`CustomClip::approximate_bounds`].
    fn approximate_bounds_any(&self, size: LayoutSize) -> LayoutRect;

    /// [`CustomClip::should_reclip`] if `previous` is the same type, or `true` if it is not.
    fn should_reclip_any(&self, previous: &dyn AnyCustomClip<S>) -> bool;

    /// [`CustomClip::reclip`].
    fn reclip_any(&self) -> Option<&ChangeNotifier>;
}
impl<C: CustomClip> AnyCustomClip<C::Clip> for C {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clip_any(&self, size: LayoutSize) -> C::Clip {
        self.clip(size)
    }

    fn approximate_bounds_any(&self, size: LayoutSize) -> LayoutRect {
        self.approximate_bounds(size)
    }

    fn should_reclip_any(&self, previous: &dyn AnyCustomClip<C::Clip>) -> bool {
        match previous.as_any().downcast_ref::<C>() {
            Some(p) => self.should_reclip(p),
            None => true,
        }
    }

    fn reclip_any(&self) -> Option<&ChangeNotifier> {
        self.reclip()
    }
}

fn inner_rect(size: LayoutSize, insets: LayoutSideOffsets) -> LayoutRect {
    let size = LayoutSize::new(size.width.max(0.0), size.height.max(0.0));
    let origin = LayoutPoint::new(insets.left.min(size.width), insets.top.min(size.height));
    let size = LayoutSize::new(
        (size.width - insets.horizontal()).max(0.0),
        (size.height - insets.vertical()).max(0.0),
    );
    LayoutRect::new(origin, size)
}

/// Clips to the rectangle of the size, deflated by `insets`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectClip {
    /// Deflate the clip rectangle.
    pub insets: LayoutSideOffsets,
}
impl RectClip {
    /// New with insets.
    pub fn new(insets: LayoutSideOffsets) -> Self {
        Self { insets }
    }
}
impl CustomClip for RectClip {
    type Clip = LayoutRect;

    fn clip(&self, size: LayoutSize) -> LayoutRect {
        inner_rect(size, self.insets)
    }

    fn approximate_bounds(&self, size: LayoutSize) -> LayoutRect {
        inner_rect(size, self.insets)
    }

    fn should_reclip(&self, previous: &Self) -> bool {
        self != previous
    }
}

/// Clips to the rectangle of the size with rounded corners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoundedRectClip {
    /// Corner radius.
    pub radius: LayoutSize,
}
impl RoundedRectClip {
    /// New with corner radius.
    pub fn new(radius: LayoutSize) -> Self {
        Self { radius }
    }
}
impl CustomClip for RoundedRectClip {
    type Clip = RoundedRect;

    fn clip(&self, size: LayoutSize) -> RoundedRect {
        RoundedRect::new(inner_rect(size, LayoutSideOffsets::zero()), self.radius)
    }

    fn should_reclip(&self, previous: &Self) -> bool {
        self != previous
    }
}

/// Clips to the ellipse that fills the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EllipseClip;
impl CustomClip for EllipseClip {
    type Clip = Ellipse;

    fn clip(&self, size: LayoutSize) -> Ellipse {
        Ellipse::from_rect(inner_rect(size, LayoutSideOffsets::zero()))
    }

    fn should_reclip(&self, _: &Self) -> bool {
        false
    }
}

/// Clip delegate from a closure, see [`clip_fn`].
pub struct ClipFn<S, F> {
    clip: F,
    reclip: Option<ChangeNotifier>,
    _shape: PhantomData<fn() -> S>,
}
impl<S, F> ClipFn<S, F> {
    /// Set a notifier that signals the closure must be called again.
    pub fn with_reclip(mut self, reclip: ChangeNotifier) -> Self {
        self.reclip = Some(reclip);
        self
    }
}
impl<S, F> fmt::Debug for ClipFn<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipFn").field("reclip", &self.reclip).finish_non_exhaustive()
    }
}
impl<S, F> CustomClip for ClipFn<S, F>
where
    S: ClipShape + Clone + 'static,
    F: Fn(LayoutSize) -> S + Send + Sync + 'static,
{
    type Clip = S;

    fn clip(&self, size: LayoutSize) -> S {
        (self.clip)(size)
    }

    fn approximate_bounds(&self, size: LayoutSize) -> LayoutRect {
        (self.clip)(size).bounds()
    }

    /// Closures cannot be compared, always reclips.
    fn should_reclip(&self, _: &Self) -> bool {
        true
    }

    fn reclip(&self) -> Option<&ChangeNotifier> {
        self.reclip.as_ref()
    }
}

/// New clip delegate from a closure.
///
/// The closure is called on every reclip, replacing the delegate always reclips.
pub fn clip_fn<S, F>(clip: F) -> ClipFn<S, F>
where
    S: ClipShape + Clone + 'static,
    F: Fn(LayoutSize) -> S + Send + Sync + 'static,
{
    ClipFn {
        clip,
        reclip: None,
        _shape: PhantomData,
    }
}

/// Render node that retains a [`CustomClip`] and caches the computed clip.
///
/// The cached clip is reused until the size changes, the delegate is replaced by one that [`should_reclip`] or
/// the delegate [`reclip`] notifier signals.
///
/// [`should_reclip`]: CustomClip::should_reclip
/// [`reclip`]: CustomClip::reclip
pub struct ClipNode<S: ClipShape + Clone + 'static> {
    clipper: Box<dyn AnyCustomClip<S>>,
    size: LayoutSize,
    clip: Option<S>,
    stale: Arc<AtomicBool>,
    on_reclip: Option<Arc<dyn Fn() + Send + Sync>>,
    reclip_handle: NotifyHandle,
    is_inited: bool,
}
impl<S: ClipShape + Clone + 'static> ClipNode<S> {
    /// New node with the initial clipper.
    pub fn new(clipper: impl CustomClip<Clip = S>) -> Self {
        Self {
            clipper: Box::new(clipper),
            size: LayoutSize::zero(),
            clip: None,
            stale: Arc::new(AtomicBool::new(true)),
            on_reclip: None,
            reclip_handle: NotifyHandle::dummy(),
            is_inited: false,
        }
    }

    /// Set a closure called when the clipper notifies a reclip.
    ///
    /// The host can use this to request a new frame.
    pub fn on_reclip(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reclip = Some(Arc::new(handler));
        self
    }

    /// Subscribe to the clipper notifier.
    pub fn init(&mut self) {
        self.is_inited = true;
        self.subscribe();
    }

    /// Drop the clipper notifier subscription.
    pub fn deinit(&mut self) {
        self.is_inited = false;
        self.reclip_handle = NotifyHandle::dummy();
    }

    fn subscribe(&mut self) {
        let stale = self.stale.clone();
        let on_reclip = self.on_reclip.clone();
        self.reclip_handle = subscribe_notifier(self.clipper.reclip_any(), move || {
            stale.store(true, Ordering::Relaxed);
            if let Some(h) = &on_reclip {
                h();
            }
        });
    }

    /// Replace the clipper.
    ///
    /// Returns `true` if the cached clip is now stale.
    pub fn set_clipper(&mut self, clipper: impl CustomClip<Clip = S>) -> bool {
        let clipper: Box<dyn AnyCustomClip<S>> = Box::new(clipper);
        let reclip = clipper.should_reclip_any(&*self.clipper);
        self.clipper = clipper;

        if self.is_inited {
            // drop old subscription before subscribing to the new notifier.
            self.reclip_handle = NotifyHandle::dummy();
            self.subscribe();
        }

        if reclip {
            tracing::trace!("clipper replaced, reclip");
            self.stale.store(true, Ordering::Relaxed);
        }
        reclip
    }

    /// Update the size, a different size invalidates the cached clip.
    pub fn layout(&mut self, size: LayoutSize) {
        debug_assert!(size.is_valid_layout(), "invalid layout size {size:?}");
        if self.size != size {
            self.size = size;
            self.stale.store(true, Ordering::Relaxed);
        }
    }

    /// Current size.
    pub fn size(&self) -> LayoutSize {
        self.size
    }

    /// If the next [`clip`] call will ask the clipper for a new clip.
    ///
    /// [`clip`]: Self::clip
    pub fn needs_reclip(&self) -> bool {
        self.clip.is_none() || self.stale.load(Ordering::Relaxed)
    }

    /// Get the cached clip or compute a new one.
    pub fn clip(&mut self) -> &S {
        if self.stale.swap(false, Ordering::Relaxed) {
            self.clip = None;
        }
        let size = self.size;
        let clipper = &self.clipper;
        self.clip.get_or_insert_with(|| clipper.clip_any(size))
    }

    /// Approximate bounds of the clip.
    pub fn approximate_bounds(&self) -> LayoutRect {
        self.clipper.approximate_bounds_any(self.size)
    }

    /// Render the `child` clipped.
    pub fn render(&mut self, canvas: &mut dyn Canvas, child: impl FnOnce(&mut dyn Canvas)) {
        let clip = self.clip().clone();
        with_saved(canvas, |canvas| {
            clip.push_clip(canvas);
            child(canvas);
        });
    }

    /// Hit-test the `point` in the node.
    ///
    /// Points outside the clip never hit, inside the `child` is tested.
    pub fn hit_test(&mut self, point: LayoutPoint, child: impl FnOnce(LayoutPoint) -> bool) -> bool {
        self.clip().contains(point) && child(point)
    }
}
impl<S: ClipShape + Clone + fmt::Debug + 'static> fmt::Debug for ClipNode<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipNode")
            .field("size", &self.size)
            .field("clip", &self.clip)
            .field("is_inited", &self.is_inited)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use zng_render::{DisplayItem, DisplayList, Rgba};

    use super::*;

    struct CountingClip {
        radius: f32,
        calls: Arc<AtomicUsize>,
        reclip: Option<ChangeNotifier>,
    }
    impl CustomClip for CountingClip {
        type Clip = RoundedRect;

        fn clip(&self, size: LayoutSize) -> RoundedRect {
            self.calls.fetch_add(1, Ordering::Relaxed);
            RoundedRect::new(LayoutRect::from_size(size), LayoutSize::splat(self.radius))
        }

        fn should_reclip(&self, previous: &Self) -> bool {
            self.radius != previous.radius
        }

        fn reclip(&self) -> Option<&ChangeNotifier> {
            self.reclip.as_ref()
        }
    }

    fn counting(radius: f32, calls: &Arc<AtomicUsize>) -> CountingClip {
        CountingClip {
            radius,
            calls: calls.clone(),
            reclip: None,
        }
    }

    #[test]
    fn default_bounds_is_full_size() {
        let b = EllipseClip.approximate_bounds(LayoutSize::new(10.0, 20.0));
        assert_eq!(LayoutRect::from_size(LayoutSize::new(10.0, 20.0)), b);
    }

    #[test]
    fn zero_size_clip_is_empty() {
        let r = RectClip::new(LayoutSideOffsets::new_all_same(5.0)).clip(LayoutSize::zero());
        assert!(r.is_empty());
        let e = EllipseClip.clip(LayoutSize::zero());
        assert!(!e.contains(LayoutPoint::zero()));
        let rr = RoundedRectClip::new(LayoutSize::splat(3.0)).clip(LayoutSize::zero());
        assert!(rr.rect.is_empty());
    }

    #[test]
    fn rect_clip_insets() {
        let r = RectClip::new(LayoutSideOffsets::new(1.0, 2.0, 3.0, 4.0)).clip(LayoutSize::new(20.0, 10.0));
        assert_eq!(LayoutRect::new(LayoutPoint::new(4.0, 1.0), LayoutSize::new(14.0, 6.0)), r);
    }

    #[test]
    fn cached_until_reclip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut node = ClipNode::new(counting(2.0, &calls));
        node.init();
        node.layout(LayoutSize::new(10.0, 10.0));

        node.clip();
        node.clip();
        assert_eq!(1, calls.load(Ordering::Relaxed));

        // equal clipper, keeps cache
        assert!(!node.set_clipper(counting(2.0, &calls)));
        node.clip();
        assert_eq!(1, calls.load(Ordering::Relaxed));

        // different clipper
        assert!(node.set_clipper(counting(4.0, &calls)));
        assert_eq!(LayoutSize::splat(4.0), node.clip().radius);
        assert_eq!(2, calls.load(Ordering::Relaxed));

        // size change
        node.layout(LayoutSize::new(20.0, 10.0));
        assert!(node.needs_reclip());
        node.clip();
        assert_eq!(3, calls.load(Ordering::Relaxed));
    }

    #[test]
    fn different_type_always_reclips() {
        let mut node = ClipNode::new(RectClip::default());
        node.layout(LayoutSize::new(10.0, 10.0));
        node.clip();
        assert!(node.set_clipper(clip_fn(LayoutRect::from_size)));
        assert!(node.needs_reclip());
    }

    #[test]
    fn reclip_notifier() {
        let calls = Arc::new(AtomicUsize::new(0));
        let reclip = ChangeNotifier::new();
        let requests = Arc::new(AtomicUsize::new(0));
        let r = requests.clone();
        let mut node = ClipNode::new(CountingClip {
            radius: 1.0,
            calls: calls.clone(),
            reclip: Some(reclip.clone()),
        })
        .on_reclip(move || {
            r.fetch_add(1, Ordering::Relaxed);
        });
        node.init();
        assert_eq!(1, reclip.listener_count());

        node.layout(LayoutSize::new(10.0, 10.0));
        node.clip();
        assert!(!node.needs_reclip());

        reclip.notify();
        assert!(node.needs_reclip());
        assert_eq!(1, requests.load(Ordering::Relaxed));
        node.clip();
        assert_eq!(2, calls.load(Ordering::Relaxed));

        // replacing moves the subscription
        let other = ChangeNotifier::new();
        node.set_clipper(CountingClip {
            radius: 1.0,
            calls: calls.clone(),
            reclip: Some(other.clone()),
        });
        assert_eq!(0, reclip.listener_count());
        assert_eq!(1, other.listener_count());

        node.deinit();
        assert_eq!(0, other.listener_count());
    }

    #[test]
    fn render_pushes_clip_in_saved_state() {
        let mut node = ClipNode::new(RectClip::default());
        node.layout(LayoutSize::new(8.0, 8.0));
        let mut list = DisplayList::new();
        node.render(&mut list, |c| c.fill_rect(LayoutRect::from_size(LayoutSize::new(16.0, 16.0)), Rgba::BLACK));

        let clip = LayoutRect::from_size(LayoutSize::new(8.0, 8.0));
        assert_eq!(
            &[
                DisplayItem::Save,
                DisplayItem::ClipRect(clip),
                DisplayItem::FillRect(LayoutRect::from_size(LayoutSize::new(16.0, 16.0)), Rgba::BLACK),
                DisplayItem::Restore,
            ],
            list.items()
        );
    }

    #[test]
    fn hit_test_uses_clip_shape() {
        let mut node = ClipNode::new(EllipseClip);
        node.layout(LayoutSize::new(10.0, 10.0));
        assert!(node.hit_test(LayoutPoint::new(5.0, 5.0), |_| true));
        assert!(!node.hit_test(LayoutPoint::new(5.0, 5.0), |_| false));
        assert!(!node.hit_test(LayoutPoint::new(0.5, 0.5), |_| true));
    }
}
