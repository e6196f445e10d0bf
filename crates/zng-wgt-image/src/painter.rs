use std::{fmt, sync::Arc};

use zng_notify::ChangeNotifier;
use zng_render::{Canvas, with_saved};
use zng_unit::{LayoutPoint, LayoutRect, LayoutSize};
use zng_wgt_custom::CustomPaint;

use crate::subscription::Shared;

/// Image layout mode.
///
/// The image is centered in the painter area in all modes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ImageFit {
    /// The image original size is preserved, the image is clipped if larger then the area.
    None,
    /// The image is resized to fill the area, the aspect-ratio is not preserved.
    Fill,
    /// The image is resized to fit the area, preserving the aspect-ratio.
    #[default]
    Contain,
    /// The image is resized to fill the area while preserving the aspect-ratio.
    /// If the aspect ratio of the area differs from the image, it is clipped.
    Cover,
    /// If the image is smaller then the area applies the [`None`] layout, if its larger applies the [`Contain`] layout.
    ///
    /// [`None`]: ImageFit::None
    /// [`Contain`]: ImageFit::Contain
    ScaleDown,
}
impl ImageFit {
    /// Compute the image rectangle for an image of `img_size` in an area of `area` size.
    ///
    /// The rectangle can exceed the area for [`None`] and [`Cover`].
    ///
    /// [`None`]: ImageFit::None
    /// [`Cover`]: ImageFit::Cover
    pub fn fit(self, img_size: LayoutSize, area: LayoutSize) -> LayoutRect {
        if img_size.is_empty() || area.is_empty() {
            return LayoutRect::zero();
        }

        let size = match self {
            ImageFit::None => img_size,
            ImageFit::Fill => area,
            ImageFit::Contain => img_size * (area.width / img_size.width).min(area.height / img_size.height),
            ImageFit::Cover => img_size * (area.width / img_size.width).max(area.height / img_size.height),
            ImageFit::ScaleDown => {
                if img_size.width < area.width && img_size.height < area.height {
                    return ImageFit::None.fit(img_size, area);
                } else {
                    return ImageFit::Contain.fit(img_size, area);
                }
            }
        };
        let origin = LayoutPoint::new((area.width - size.width) / 2.0, (area.height - size.height) / 2.0);
        LayoutRect::new(origin, size)
    }
}
impl fmt::Debug for ImageFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "ImageFit::")?
        }
        match self {
            Self::None => write!(f, "None"),
            Self::Fill => write!(f, "Fill"),
            Self::Contain => write!(f, "Contain"),
            Self::Cover => write!(f, "Cover"),
            Self::ScaleDown => write!(f, "ScaleDown"),
        }
    }
}

/// Paint delegate that draws the current frame of an [`ImageSubscription`].
///
/// The painter notifies a repaint on every display update of the subscription.
///
/// [`ImageSubscription`]: crate::ImageSubscription
pub struct ImagePainter {
    shared: Arc<Shared>,
    fit: ImageFit,
}
impl ImagePainter {
    pub(crate) fn new(shared: Arc<Shared>, fit: ImageFit) -> Self {
        Self { shared, fit }
    }

    /// Layout mode.
    pub fn fit(&self) -> ImageFit {
        self.fit
    }
}
impl CustomPaint for ImagePainter {
    fn paint(&self, canvas: &mut dyn Canvas, size: LayoutSize) {
        let Some(frame) = self.shared.frame() else {
            return;
        };
        let area = LayoutRect::from_size(size);
        let rect = self.fit.fit(frame.size(), size);
        if rect.is_empty() {
            return;
        }
        if area.contains_rect(&rect) {
            canvas.draw_image(&frame.img, rect);
        } else {
            with_saved(canvas, |c| {
                c.clip_rect(area);
                c.draw_image(&frame.img, rect);
            });
        }
    }

    fn should_repaint(&self, previous: &Self) -> bool {
        !Arc::ptr_eq(&self.shared, &previous.shared) || self.fit != previous.fit
    }

    fn repaint(&self) -> Option<&ChangeNotifier> {
        Some(&self.shared.repaint)
    }
}
impl fmt::Debug for ImagePainter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePainter").field("fit", &self.fit).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use parking_lot::Mutex;
    use zng_ext_image::{ImageCompleter, ImageConfig, ImageFrame, ImageSpec, Images};
    use zng_render::{DisplayItem, DisplayList, Img, Rgba};
    use zng_unit::FactorUnits as _;
    use zng_wgt_custom::PaintNode;

    use super::*;
    use crate::ImageSubscription;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> LayoutRect {
        LayoutRect::new(LayoutPoint::new(x, y), LayoutSize::new(w, h))
    }

    #[test]
    fn fit_modes() {
        let img = LayoutSize::new(20.0, 10.0);
        let area = LayoutSize::new(40.0, 40.0);
        assert_eq!(rect(0.0, 0.0, 40.0, 40.0), ImageFit::Fill.fit(img, area));
        assert_eq!(rect(0.0, 10.0, 40.0, 20.0), ImageFit::Contain.fit(img, area));
        assert_eq!(rect(-20.0, 0.0, 80.0, 40.0), ImageFit::Cover.fit(img, area));
        assert_eq!(rect(10.0, 15.0, 20.0, 10.0), ImageFit::None.fit(img, area));
        assert_eq!(ImageFit::None.fit(img, area), ImageFit::ScaleDown.fit(img, area));

        let small = LayoutSize::new(10.0, 10.0);
        assert_eq!(ImageFit::Contain.fit(img, small), ImageFit::ScaleDown.fit(img, small));
        assert_eq!(LayoutRect::zero(), ImageFit::Contain.fit(LayoutSize::zero(), area));
    }

    #[test]
    fn paints_delivered_frame() {
        let pending = Arc::new(Mutex::new(vec![]));
        let p = pending.clone();
        let images = Images::new(move |_: &ImageSpec, _: &ImageConfig, c: ImageCompleter| p.lock().push(c));

        let mut sub = ImageSubscription::new(ImageSpec::new(PathBuf::from("a.png")), images);
        let mut node = PaintNode::new().with_background(sub.painter(ImageFit::Fill));
        node.init();
        node.layout(LayoutSize::new(10.0, 10.0));
        sub.dependencies_changed(ImageConfig::default(), true);

        let mut list = DisplayList::new();
        node.render(&mut list, |_| {});
        assert!(list.is_empty());
        assert!(!node.needs_repaint());

        let img = Img::flood(2, 2, Rgba::WHITE);
        pending.lock()[0].set_frame(ImageFrame::new(img.clone(), 1.fct()));
        assert!(node.needs_repaint());

        let mut list = DisplayList::new();
        node.render(&mut list, |_| {});
        assert_eq!(&[DisplayItem::Image(img, rect(0.0, 0.0, 10.0, 10.0))], list.items());
    }

    #[test]
    fn cover_is_clipped() {
        let pending = Arc::new(Mutex::new(vec![]));
        let p = pending.clone();
        let images = Images::new(move |_: &ImageSpec, _: &ImageConfig, c: ImageCompleter| p.lock().push(c));
        let mut sub = ImageSubscription::new(ImageSpec::new(PathBuf::from("a.png")), images);
        sub.dependencies_changed(ImageConfig::default(), true);
        pending.lock()[0].set_frame(ImageFrame::new(Img::flood(20, 10, Rgba::BLACK), 1.fct()));

        let painter = sub.painter(ImageFit::Cover);
        let mut list = DisplayList::new();
        painter.paint(&mut list, LayoutSize::new(10.0, 10.0));
        assert_eq!(DisplayItem::ClipRect(rect(0.0, 0.0, 10.0, 10.0)), list.items()[1]);
        assert_eq!(0, list.save_count());
    }

    #[test]
    fn same_subscription_same_fit_is_cached() {
        let images = Images::new(|_: &ImageSpec, _: &ImageConfig, _: ImageCompleter| {});
        let mut sub = ImageSubscription::new(ImageSpec::new(PathBuf::from("a.png")), images);
        sub.dependencies_changed(ImageConfig::default(), false);
        let a = sub.painter(ImageFit::Contain);
        assert!(!sub.painter(ImageFit::Contain).should_repaint(&a));
        assert!(sub.painter(ImageFit::Cover).should_repaint(&a));
    }
}
