use std::{fmt, sync::Arc};

use zng_unit::LayoutSize;

use crate::Rgba;

struct ImgData {
    width: u32,
    height: u32,
    bgra8: Arc<[u8]>,
}

/// Decoded image pixels.
///
/// This is a shared reference, clones share the same pixels and equality is by reference.
#[derive(Clone)]
pub struct Img(Arc<ImgData>);
impl Img {
    /// New from premultiplied BGRA8 pixels.
    ///
    /// # Panics
    ///
    /// Panics if the length of `bgra8` is not `width * height * 4`.
    pub fn new(width: u32, height: u32, bgra8: impl Into<Arc<[u8]>>) -> Self {
        let bgra8 = bgra8.into();
        assert_eq!(
            bgra8.len(),
            width as usize * height as usize * 4,
            "expected {width}x{height} BGRA8 pixels"
        );
        Self(Arc::new(ImgData { width, height, bgra8 }))
    }

    /// New image of a solid color.
    pub fn flood(width: u32, height: u32, color: Rgba) -> Self {
        let bgra = color.to_bgra_bytes();
        let pixels: Vec<u8> = bgra.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Self::new(width, height, pixels)
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.0.width
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.0.height
    }

    /// Pixel size, as layout units.
    pub fn size(&self) -> LayoutSize {
        LayoutSize::new(self.0.width as f32, self.0.height as f32)
    }

    /// The pixels.
    pub fn bgra8(&self) -> &[u8] {
        &self.0.bgra8
    }

    /// If `self` and `other` share the same pixels.
    pub fn ptr_eq(&self, other: &Img) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl PartialEq for Img {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
impl fmt::Debug for Img {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Img")
            .field("width", &self.0.width)
            .field("height", &self.0.height)
            .finish_non_exhaustive()
    }
}
