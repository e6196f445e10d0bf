use zng_unit::{LayoutRect, LayoutVector};

use crate::{Ellipse, Img, Rgba, RoundedRect};

/// Immediate mode drawing surface.
///
/// The canvas keeps a stack of saved states, each state is the current translation and clip. Every [`save`] must be
/// paired with a [`restore`], an unpaired save affects all subsequent painting on the canvas.
///
/// [`save`]: Canvas::save
/// [`restore`]: Canvas::restore
pub trait Canvas {
    /// Push a copy of the current translation and clip on the state stack.
    fn save(&mut self);

    /// Pop the state stack, restoring the translation and clip of the matching [`save`].
    ///
    /// Implementers must ignore a restore without matching save.
    ///
    /// [`save`]: Canvas::save
    fn restore(&mut self);

    /// Number of saves not yet restored.
    fn save_count(&self) -> usize;

    /// Restore until the [`save_count`] is `count`.
    ///
    /// [`save_count`]: Canvas::save_count
    fn restore_to_count(&mut self, count: usize) {
        while self.save_count() > count {
            self.restore();
        }
    }

    /// Translate the current coordinate space.
    fn translate(&mut self, offset: LayoutVector);

    /// Intersect the current clip with the rectangle.
    fn clip_rect(&mut self, rect: LayoutRect);

    /// Intersect the current clip with the rounded rectangle.
    fn clip_rounded_rect(&mut self, rect: RoundedRect);

    /// Intersect the current clip with the ellipse.
    fn clip_ellipse(&mut self, ellipse: Ellipse);

    /// Fill the rectangle with a color.
    fn fill_rect(&mut self, rect: LayoutRect, color: Rgba);

    /// Fill the rounded rectangle with a color.
    fn fill_rounded_rect(&mut self, rect: RoundedRect, color: Rgba);

    /// Fill the ellipse with a color.
    fn fill_ellipse(&mut self, ellipse: Ellipse, color: Rgba);

    /// Draw the image scaled to the rectangle.
    fn draw_image(&mut self, img: &Img, rect: LayoutRect);
}

/// Calls `f` between a [`save`] and [`restore`] of the `canvas`.
///
/// [`save`]: Canvas::save
/// [`restore`]: Canvas::restore
pub fn with_saved<C: Canvas + ?Sized, R>(canvas: &mut C, f: impl FnOnce(&mut C) -> R) -> R {
    canvas.save();
    let count = canvas.save_count();
    let r = f(canvas);
    if canvas.save_count() != count {
        tracing::error!(
            "unbalanced canvas save/restore, expected save count {count}, was {}",
            canvas.save_count()
        );
        canvas.restore_to_count(count);
    }
    canvas.restore();
    r
}

/// Display item recorded by [`DisplayList`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DisplayItem {
    /// [`Canvas::save`].
    Save,
    /// [`Canvas::restore`].
    Restore,
    /// [`Canvas::translate`].
    Translate(LayoutVector),
    /// [`Canvas::clip_rect`].
    ClipRect(LayoutRect),
    /// [`Canvas::clip_rounded_rect`].
    ClipRoundedRect(RoundedRect),
    /// [`Canvas::clip_ellipse`].
    ClipEllipse(Ellipse),
    /// [`Canvas::fill_rect`].
    FillRect(LayoutRect, Rgba),
    /// [`Canvas::fill_rounded_rect`].
    FillRoundedRect(RoundedRect, Rgba),
    /// [`Canvas::fill_ellipse`].
    FillEllipse(Ellipse, Rgba),
    /// [`Canvas::draw_image`].
    Image(Img, LayoutRect),
}

/// Canvas that records display items.
///
/// The list can be replayed on another canvas, this is how painted output is cached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
    save_count: usize,
}
impl DisplayList {
    /// New empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded items.
    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    /// If no item was recorded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of recorded items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.save_count = 0;
    }

    /// Append all items to the `canvas`.
    pub fn replay(&self, canvas: &mut dyn Canvas) {
        for item in &self.items {
            match item {
                DisplayItem::Save => canvas.save(),
                DisplayItem::Restore => canvas.restore(),
                DisplayItem::Translate(v) => canvas.translate(*v),
                DisplayItem::ClipRect(r) => canvas.clip_rect(*r),
                DisplayItem::ClipRoundedRect(r) => canvas.clip_rounded_rect(*r),
                DisplayItem::ClipEllipse(e) => canvas.clip_ellipse(*e),
                DisplayItem::FillRect(r, c) => canvas.fill_rect(*r, *c),
                DisplayItem::FillRoundedRect(r, c) => canvas.fill_rounded_rect(*r, *c),
                DisplayItem::FillEllipse(e, c) => canvas.fill_ellipse(*e, *c),
                DisplayItem::Image(img, r) => canvas.draw_image(img, *r),
            }
        }
    }
}
impl Canvas for DisplayList {
    fn save(&mut self) {
        self.save_count += 1;
        self.items.push(DisplayItem::Save);
    }

    fn restore(&mut self) {
        if self.save_count == 0 {
            tracing::warn!("ignoring canvas restore without matching save");
            return;
        }
        self.save_count -= 1;
        self.items.push(DisplayItem::Restore);
    }

    fn save_count(&self) -> usize {
        self.save_count
    }

    fn translate(&mut self, offset: LayoutVector) {
        self.items.push(DisplayItem::Translate(offset));
    }

    fn clip_rect(&mut self, rect: LayoutRect) {
        self.items.push(DisplayItem::ClipRect(rect));
    }

    fn clip_rounded_rect(&mut self, rect: RoundedRect) {
        self.items.push(DisplayItem::ClipRoundedRect(rect));
    }

    fn clip_ellipse(&mut self, ellipse: Ellipse) {
        self.items.push(DisplayItem::ClipEllipse(ellipse));
    }

    fn fill_rect(&mut self, rect: LayoutRect, color: Rgba) {
        self.items.push(DisplayItem::FillRect(rect, color));
    }

    fn fill_rounded_rect(&mut self, rect: RoundedRect, color: Rgba) {
        self.items.push(DisplayItem::FillRoundedRect(rect, color));
    }

    fn fill_ellipse(&mut self, ellipse: Ellipse, color: Rgba) {
        self.items.push(DisplayItem::FillEllipse(ellipse, color));
    }

    fn draw_image(&mut self, img: &Img, rect: LayoutRect) {
        self.items.push(DisplayItem::Image(img.clone(), rect));
    }
}
