//! Custom paint delegate and node.

use std::{
    any::Any,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use zng_notify::{ChangeNotifier, NotifyHandle, subscribe_notifier};
use zng_render::{Canvas, DisplayList};
use zng_unit::{LayoutPoint, LayoutRect, LayoutSize, LayoutSizeExt as _};

/// Position of a painter relative to the node child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PaintLayer {
    /// Painted before the child.
    Background,
    /// Painted after the child.
    Foreground,
}

/// Result of a custom paint hit-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum HitTest {
    /// Point hits the painted content.
    Hit,
    /// Point does not hit the painted content.
    Miss,
    /// Use the [`default_hit_test`] of the painter layer.
    #[default]
    UseDefault,
}
impl HitTest {
    /// Resolve to hit (`true`) or miss, for a painter in the `layer`.
    pub fn resolve(self, layer: PaintLayer) -> bool {
        match self {
            HitTest::Hit => true,
            HitTest::Miss => false,
            HitTest::UseDefault => default_hit_test(layer),
        }
    }
}
impl From<bool> for HitTest {
    fn from(hit: bool) -> Self {
        if hit { HitTest::Hit } else { HitTest::Miss }
    }
}
impl From<Option<bool>> for HitTest {
    fn from(hit: Option<bool>) -> Self {
        match hit {
            Some(h) => h.into(),
            None => HitTest::UseDefault,
        }
    }
}

/// Hit-test policy for painters that return [`HitTest::UseDefault`].
///
/// Background painters are hit at any point inside the bounds, foreground painters are never hit.
pub fn default_hit_test(layer: PaintLayer) -> bool {
    match layer {
        PaintLayer::Background => true,
        PaintLayer::Foreground => false,
    }
}

/// Delegate that paints in a canvas area.
///
/// Only [`paint`] and [`should_repaint`] are required.
///
/// The delegate can request a repaint without being replaced by returning a [`repaint`] notifier. The notifier
/// can be shared with other code, an animation for example, or be owned by the delegate itself and signaled
/// when it has new content, both cases are the same for the node.
///
/// [`paint`]: CustomPaint::paint
/// [`should_repaint`]: CustomPaint::should_repaint
/// [`repaint`]: CustomPaint::repaint
pub trait CustomPaint: Any + Send + Sync {
    /// Paint in the `[0, 0, size.width, size.height]` area of the `canvas`.
    ///
    /// Painting outside the area has no defined effect, it may or may not be clipped. Every `save` must be paired
    /// with a `restore`.
    fn paint(&self, canvas: &mut dyn Canvas, size: LayoutSize);

    /// Returns `true` if the painted output of `previous` is stale for `self`.
    ///
    /// This is called when a node replaces `previous` with `self`. Must not have side effects, the node may
    /// repaint anyway, or not call this method at all if a repaint is already needed.
    fn should_repaint(&self, previous: &Self) -> bool
    where
        Self: Sized;

    /// Custom hit-test at a `point` in the same space as the last [`paint`].
    ///
    /// Default is [`HitTest::UseDefault`].
    ///
    /// [`paint`]: CustomPaint::paint
    fn hit_test(&self, point: LayoutPoint) -> HitTest {
        let _ = point;
        HitTest::UseDefault
    }

    /// Notifier that signals the delegate must paint again.
    fn repaint(&self) -> Option<&ChangeNotifier> {
        None
    }
}

/// Type erased [`CustomPaint`].
pub trait AnyCustomPaint: Any + Send + Sync {
    /// Access to `dyn Any` methods.
    fn as_any(&self) -> &dyn Any;

    /// [`CustomPaint::paint`].
    fn paint_any(&self, canvas: &mut dyn Canvas, size: LayoutSize);

    /// [`CustomPaint::should_repaint`] if `previous` is the same type, or `true` if it is not.
    fn should_repaint_any(&self, previous: &dyn AnyCustomPaint) -> bool;

    /// [`CustomPaint::hit_test`].
    fn hit_test_any(&self, point: LayoutPoint) -> HitTest;

    /// [`CustomPaint::repaint`].
    fn repaint_any(&self) -> Option<&ChangeNotifier>;
}
impl<P: CustomPaint> AnyCustomPaint for P {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn paint_any(&self, canvas: &mut dyn Canvas, size: LayoutSize) {
        self.paint(canvas, size)
    }

    fn should_repaint_any(&self, previous: &dyn AnyCustomPaint) -> bool {
        match previous.as_any().downcast_ref::<P>() {
            Some(p) => self.should_repaint(p),
            None => true,
        }
    }

    fn hit_test_any(&self, point: LayoutPoint) -> HitTest {
        self.hit_test(point)
    }

    fn repaint_any(&self) -> Option<&ChangeNotifier> {
        self.repaint()
    }
}

/// Paint delegate from a closure, see [`paint_fn`].
pub struct PaintFn<F> {
    paint: F,
    repaint: Option<ChangeNotifier>,
}
impl<F> PaintFn<F> {
    /// Set a notifier that signals the closure must be called again.
    pub fn with_repaint(mut self, repaint: ChangeNotifier) -> Self {
        self.repaint = Some(repaint);
        self
    }
}
impl<F> fmt::Debug for PaintFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintFn").field("repaint", &self.repaint).finish_non_exhaustive()
    }
}
impl<F: Fn(&mut dyn Canvas, LayoutSize) + Send + Sync + 'static> CustomPaint for PaintFn<F> {
    fn paint(&self, canvas: &mut dyn Canvas, size: LayoutSize) {
        (self.paint)(canvas, size)
    }

    /// Closures cannot be compared, always repaints.
    fn should_repaint(&self, _: &Self) -> bool {
        true
    }

    fn repaint(&self) -> Option<&ChangeNotifier> {
        self.repaint.as_ref()
    }
}

/// New paint delegate from a closure.
pub fn paint_fn<F: Fn(&mut dyn Canvas, LayoutSize) + Send + Sync + 'static>(paint: F) -> PaintFn<F> {
    PaintFn { paint, repaint: None }
}

struct Painter {
    painter: Box<dyn AnyCustomPaint>,
    layer: PaintLayer,
    cache: DisplayList,
    stale: Arc<AtomicBool>,
    repaint_handle: NotifyHandle,
}
impl Painter {
    fn new(painter: Box<dyn AnyCustomPaint>, layer: PaintLayer) -> Self {
        Self {
            painter,
            layer,
            cache: DisplayList::new(),
            stale: Arc::new(AtomicBool::new(true)),
            repaint_handle: NotifyHandle::dummy(),
        }
    }

    fn subscribe(&mut self, on_repaint: &Option<Arc<dyn Fn() + Send + Sync>>) {
        let stale = self.stale.clone();
        let on_repaint = on_repaint.clone();
        self.repaint_handle = subscribe_notifier(self.painter.repaint_any(), move || {
            stale.store(true, Ordering::Relaxed);
            if let Some(h) = &on_repaint {
                h();
            }
        });
    }

    fn invalidate(&self) {
        self.stale.store(true, Ordering::Relaxed);
    }

    fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Relaxed)
    }

    fn render(&mut self, canvas: &mut dyn Canvas, size: LayoutSize) {
        if self.stale.swap(false, Ordering::Relaxed) {
            self.cache.clear();
            self.painter.paint_any(&mut self.cache, size);

            let count = self.cache.save_count();
            if count != 0 {
                tracing::error!("{:?} painter has {count} unpaired canvas saves", self.layer);
                self.cache.restore_to_count(0);
            }
        } else {
            tracing::trace!("{:?} painter reused", self.layer);
        }
        self.cache.replay(canvas);
    }

    fn hit_test(&self, point: LayoutPoint) -> bool {
        self.painter.hit_test_any(point).resolve(self.layer)
    }
}

/// Render node that retains a background and foreground [`CustomPaint`] and caches their painted output.
///
/// The background painter paints before the child, the foreground painter after. Each painter output is recorded
/// in a [`DisplayList`] that is replayed until the size changes, the painter is replaced by one that
/// [`should_repaint`], the painter [`repaint`] notifier signals or the node is [`invalidate`]d.
///
/// [`should_repaint`]: CustomPaint::should_repaint
/// [`repaint`]: CustomPaint::repaint
/// [`invalidate`]: PaintNode::invalidate
#[derive(Default)]
pub struct PaintNode {
    background: Option<Painter>,
    foreground: Option<Painter>,
    size: LayoutSize,
    on_repaint: Option<Arc<dyn Fn() + Send + Sync>>,
    is_inited: bool,
}
impl PaintNode {
    /// New node without painters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the background painter.
    pub fn with_background(mut self, painter: impl CustomPaint) -> Self {
        self.set_background(painter);
        self
    }

    /// Set the foreground painter.
    pub fn with_foreground(mut self, painter: impl CustomPaint) -> Self {
        self.set_foreground(painter);
        self
    }

    /// Set a closure called when a painter notifies a repaint.
    ///
    /// The host can use this to request a new frame.
    pub fn on_repaint(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_repaint = Some(Arc::new(handler));
        self
    }

    /// Subscribe to the painters notifiers.
    pub fn init(&mut self) {
        self.is_inited = true;
        for p in [&mut self.background, &mut self.foreground].into_iter().flatten() {
            p.subscribe(&self.on_repaint);
        }
    }

    /// Drop the painters notifiers subscriptions.
    pub fn deinit(&mut self) {
        self.is_inited = false;
        for p in [&mut self.background, &mut self.foreground].into_iter().flatten() {
            p.repaint_handle = NotifyHandle::dummy();
        }
    }

    /// Replace or set the background painter.
    ///
    /// Returns `true` if the painted output is now stale.
    pub fn set_background(&mut self, painter: impl CustomPaint) -> bool {
        Self::replace(&mut self.background, Some(Box::new(painter)), PaintLayer::Background, self.is_inited, &self.on_repaint)
    }

    /// Replace or set the foreground painter.
    ///
    /// Returns `true` if the painted output is now stale.
    pub fn set_foreground(&mut self, painter: impl CustomPaint) -> bool {
        Self::replace(&mut self.foreground, Some(Box::new(painter)), PaintLayer::Foreground, self.is_inited, &self.on_repaint)
    }

    /// Remove the background painter.
    ///
    /// Returns `true` if a painter was removed.
    pub fn clear_background(&mut self) -> bool {
        Self::replace(&mut self.background, None, PaintLayer::Background, self.is_inited, &self.on_repaint)
    }

    /// Remove the foreground painter.
    ///
    /// Returns `true` if a painter was removed.
    pub fn clear_foreground(&mut self) -> bool {
        Self::replace(&mut self.foreground, None, PaintLayer::Foreground, self.is_inited, &self.on_repaint)
    }

    fn replace(
        slot: &mut Option<Painter>,
        new: Option<Box<dyn AnyCustomPaint>>,
        layer: PaintLayer,
        is_inited: bool,
        on_repaint: &Option<Arc<dyn Fn() + Send + Sync>>,
    ) -> bool {
        let Some(new) = new else {
            return slot.take().is_some();
        };
        match slot {
            Some(old) => {
                let repaint = new.should_repaint_any(&*old.painter);
                old.repaint_handle = NotifyHandle::dummy();
                old.painter = new;
                if is_inited {
                    old.subscribe(on_repaint);
                }
                if repaint {
                    old.invalidate();
                }
                repaint
            }
            None => {
                let mut p = Painter::new(new, layer);
                if is_inited {
                    p.subscribe(on_repaint);
                }
                *slot = Some(p);
                true
            }
        }
    }

    /// Update the size, a different size invalidates the painted output.
    pub fn layout(&mut self, size: LayoutSize) {
        debug_assert!(size.is_valid_layout(), "invalid layout size {size:?}");
        if self.size != size {
            self.size = size;
            self.invalidate();
        }
    }

    /// Current size.
    pub fn size(&self) -> LayoutSize {
        self.size
    }

    /// Force the painters to paint again on the next render.
    pub fn invalidate(&mut self) {
        for p in [&self.background, &self.foreground].into_iter().flatten() {
            p.invalidate();
        }
    }

    /// If the next render will call a painter.
    pub fn needs_repaint(&self) -> bool {
        [&self.background, &self.foreground].into_iter().flatten().any(Painter::is_stale)
    }

    /// Render the background painter, the `child` and the foreground painter.
    pub fn render(&mut self, canvas: &mut dyn Canvas, child: impl FnOnce(&mut dyn Canvas)) {
        if let Some(p) = &mut self.background {
            p.render(canvas, self.size);
        }
        child(canvas);
        if let Some(p) = &mut self.foreground {
            p.render(canvas, self.size);
        }
    }

    /// Hit-test the `point` in the node.
    ///
    /// Points outside the size never hit. Inside the foreground painter is tested first, then the `child`, then
    /// the background painter.
    pub fn hit_test(&self, point: LayoutPoint, child: impl FnOnce(LayoutPoint) -> bool) -> bool {
        if !LayoutRect::from_size(self.size).contains(point) {
            return false;
        }
        if let Some(p) = &self.foreground
            && p.hit_test(point)
        {
            return true;
        }
        if child(point) {
            return true;
        }
        match &self.background {
            Some(p) => p.hit_test(point),
            None => false,
        }
    }
}
impl fmt::Debug for PaintNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaintNode")
            .field("has_background", &self.background.is_some())
            .field("has_foreground", &self.foreground.is_some())
            .field("size", &self.size)
            .field("is_inited", &self.is_inited)
            .finish_non_exhaustive()
    }
}
