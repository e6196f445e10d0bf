use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use zng::{
    prelude::*,
    render::with_saved,
    unit::{LayoutSideOffsets, LayoutVector},
};

#[derive(Clone, Copy)]
struct RasterState {
    offset: LayoutVector,
    clip: LayoutRect,
}

/// Minimal software canvas, samples each pixel center.
struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
    state: RasterState,
    stack: Vec<RasterState>,
}
impl Raster {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width * height],
            state: RasterState {
                offset: LayoutVector::zero(),
                clip: LayoutRect::from_size(LayoutSize::new(width as f32, height as f32)),
            },
            stack: vec![],
        }
    }

    fn fill(&mut self, color: Rgba, contains: impl Fn(LayoutPoint) -> bool) {
        for y in 0..self.height {
            for x in 0..self.width {
                let p = LayoutPoint::new(x as f32 + 0.5, y as f32 + 0.5);
                if self.state.clip.contains(p) && contains(p - self.state.offset) {
                    self.pixels[y * self.width + x] = color;
                }
            }
        }
    }

    fn to_local(&self, rect: LayoutRect) -> LayoutRect {
        rect.translate(self.state.offset)
    }
}
impl Canvas for Raster {
    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(s) = self.stack.pop() {
            self.state = s;
        }
    }

    fn save_count(&self) -> usize {
        self.stack.len()
    }

    fn translate(&mut self, offset: LayoutVector) {
        self.state.offset += offset;
    }

    fn clip_rect(&mut self, rect: LayoutRect) {
        let rect = self.to_local(rect);
        self.state.clip = self.state.clip.intersection(&rect).unwrap_or(LayoutRect::zero());
    }

    fn clip_rounded_rect(&mut self, rect: RoundedRect) {
        // bounds are enough for these tests.
        self.clip_rect(rect.rect);
    }

    fn clip_ellipse(&mut self, ellipse: Ellipse) {
        self.clip_rect(ellipse.bounds());
    }

    fn fill_rect(&mut self, rect: LayoutRect, color: Rgba) {
        self.fill(color, |p| rect.contains(p));
    }

    fn fill_rounded_rect(&mut self, rect: RoundedRect, color: Rgba) {
        self.fill(color, |p| rect.contains(p));
    }

    fn fill_ellipse(&mut self, ellipse: Ellipse, color: Rgba) {
        self.fill(color, |p| ellipse.contains(p));
    }

    fn draw_image(&mut self, _: &Img, rect: LayoutRect) {
        self.fill_rect(rect, Rgba::WHITE);
    }
}

/// Paints a bar of `value` width that animates through a shared notifier.
struct Bar {
    value: Arc<Mutex<f32>>,
    color: Rgba,
    animation: ChangeNotifier,
    paints: Arc<AtomicUsize>,
}
impl CustomPaint for Bar {
    fn paint(&self, canvas: &mut dyn Canvas, size: LayoutSize) {
        self.paints.fetch_add(1, Ordering::Relaxed);
        let w = size.width * *self.value.lock();
        with_saved(canvas, |c| {
            c.translate(LayoutVector::new(1.0, 1.0));
            c.fill_rect(LayoutRect::from_size(LayoutSize::new(w, size.height - 2.0)), self.color);
        });
    }

    fn should_repaint(&self, previous: &Self) -> bool {
        self.color != previous.color || !Arc::ptr_eq(&self.value, &previous.value)
    }

    fn repaint(&self) -> Option<&ChangeNotifier> {
        Some(&self.animation)
    }
}

fn bar(value: &Arc<Mutex<f32>>, color: Rgba, animation: &ChangeNotifier, paints: &Arc<AtomicUsize>) -> Bar {
    Bar {
        value: value.clone(),
        color,
        animation: animation.clone(),
        paints: paints.clone(),
    }
}

#[test]
fn compare_short_circuit_same_pixels() {
    let value = Arc::new(Mutex::new(0.5));
    let animation = ChangeNotifier::new();
    let paints = Arc::new(AtomicUsize::new(0));
    let size = LayoutSize::new(16.0, 8.0);

    let mut cached = PaintNode::new().with_background(bar(&value, Rgba::BLACK, &animation, &paints));
    let mut forced = PaintNode::new().with_background(bar(&value, Rgba::BLACK, &animation, &paints));
    cached.layout(size);
    forced.layout(size);

    let mut a = Raster::new(16, 8);
    let mut b = Raster::new(16, 8);
    cached.render(&mut a, |_| {});
    forced.render(&mut b, |_| {});

    assert!(!cached.set_background(bar(&value, Rgba::BLACK, &animation, &paints)));
    forced.set_background(bar(&value, Rgba::BLACK, &animation, &paints));
    forced.invalidate();
    assert_eq!(2, paints.load(Ordering::Relaxed));

    let mut a = Raster::new(16, 8);
    let mut b = Raster::new(16, 8);
    cached.render(&mut a, |_| {});
    forced.render(&mut b, |_| {});
    assert_eq!(3, paints.load(Ordering::Relaxed));
    assert_eq!(a.pixels, b.pixels);
    assert_eq!(Rgba::BLACK, a.pixels[16 + 1]);
    assert_eq!(Rgba::TRANSPARENT, a.pixels[0]);
}

#[test]
fn shared_animation_notifier() {
    let value = Arc::new(Mutex::new(0.25));
    let animation = ChangeNotifier::new();
    let paints = Arc::new(AtomicUsize::new(0));
    let frames = Arc::new(AtomicUsize::new(0));

    let f = frames.clone();
    let mut one = PaintNode::new()
        .on_repaint(move || {
            f.fetch_add(1, Ordering::Relaxed);
        })
        .with_background(bar(&value, Rgba::BLACK, &animation, &paints));
    let mut two = PaintNode::new().with_foreground(bar(&value, Rgba::WHITE, &animation, &paints));
    for n in [&mut one, &mut two] {
        n.init();
        n.layout(LayoutSize::new(8.0, 4.0));
        n.render(&mut Raster::new(8, 4), |_| {});
    }
    assert_eq!(2, animation.listener_count());

    *value.lock() = 1.0;
    animation.notify();
    assert_eq!(1, frames.load(Ordering::Relaxed));
    assert!(one.needs_repaint());
    assert!(two.needs_repaint());

    two.deinit();
    assert_eq!(1, animation.listener_count());
    animation.notify();
    assert_eq!(2, frames.load(Ordering::Relaxed));

    let mut r = Raster::new(8, 4);
    one.render(&mut r, |_| {});
    assert_eq!(Rgba::BLACK, r.pixels[8 + 6]);
}

#[test]
fn foreground_background_around_child() {
    let mut node = PaintNode::new()
        .with_background(paint_fn(|c, s| c.fill_rect(LayoutRect::from_size(s), Rgba::BLACK)))
        .with_foreground(paint_fn(|c, _| c.fill_rect(LayoutRect::from_size(LayoutSize::splat(1.0)), Rgba::WHITE)));
    node.layout(LayoutSize::new(4.0, 4.0));

    let mut r = Raster::new(4, 4);
    node.render(&mut r, |c| {
        c.fill_rect(LayoutRect::from_size(LayoutSize::splat(2.0)), Rgba::new(1.0, 0.0, 0.0, 1.0))
    });
    assert_eq!(Rgba::WHITE, r.pixels[0]);
    assert_eq!(Rgba::new(1.0, 0.0, 0.0, 1.0), r.pixels[1]);
    assert_eq!(Rgba::BLACK, r.pixels[3]);

    // background hit everywhere in bounds, foreground never by default.
    for y in 0..4 {
        for x in 0..4 {
            assert!(node.hit_test(LayoutPoint::new(x as f32 + 0.5, y as f32 + 0.5), |_| false));
        }
    }
    assert!(!node.hit_test(LayoutPoint::new(5.0, 5.0), |_| true));
}

#[test]
fn clip_node_clips_child() {
    let reclip = ChangeNotifier::new();
    let mut node = ClipNode::new(RectClip::new(LayoutSideOffsets::new_all_same(1.0)));
    node.init();
    node.layout(LayoutSize::new(4.0, 4.0));

    let mut r = Raster::new(4, 4);
    node.render(&mut r, |c| c.fill_rect(LayoutRect::from_size(LayoutSize::splat(4.0)), Rgba::BLACK));
    assert_eq!(Rgba::TRANSPARENT, r.pixels[0]);
    assert_eq!(Rgba::BLACK, r.pixels[4 + 1]);
    assert_eq!(0, r.save_count());

    // closure clip that moves with an external notifier.
    let inset = Arc::new(Mutex::new(0.0f32));
    let i = inset.clone();
    node.set_clipper(
        clip_fn(move |size: LayoutSize| {
            let i = *i.lock();
            LayoutRect::new(LayoutPoint::new(i, i), LayoutSize::new(size.width - i * 2.0, size.height - i * 2.0).max(LayoutSize::zero()))
        })
        .with_reclip(reclip.clone()),
    );
    assert!(node.hit_test(LayoutPoint::new(0.5, 0.5), |_| true));

    *inset.lock() = 1.0;
    reclip.notify();
    assert!(node.needs_reclip());
    assert!(!node.hit_test(LayoutPoint::new(0.5, 0.5), |_| true));
    assert!(node.hit_test(LayoutPoint::new(1.5, 1.5), |_| true));
}
