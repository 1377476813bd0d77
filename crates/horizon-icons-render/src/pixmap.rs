//! Reference counted RGBA pixmaps.
//!
//! [`Pixmap`] is the image type handed out by the icon loader. Clones share
//! the same pixel storage until one of them is mutated, so cached icons can be
//! returned to many callers without copying.
//!
//! Pixel data is always straight (non-premultiplied) RGBA8. The device pixel
//! ratio records how many device pixels make up one logical pixel.

use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

use crate::color::Color;
use crate::error::{RenderError, RenderResult};

/// A shareable RGBA image with a device pixel ratio.
#[derive(Clone, PartialEq)]
pub struct Pixmap {
    image: Arc<RgbaImage>,
    device_pixel_ratio: f32,
}

impl Pixmap {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Create a new fully transparent pixmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_image(RgbaImage::new(width, height))
    }

    /// A pixmap without pixels.
    pub fn null() -> Self {
        Self::new(0, 0)
    }

    /// Create a pixmap filled with a solid color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self::from_image(RgbaImage::from_pixel(
            width,
            height,
            Rgba(color.to_array()),
        ))
    }

    /// Wrap an existing RGBA image.
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
            device_pixel_ratio: 1.0,
        }
    }

    /// Convert any decoded image into a pixmap.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::from_image(image.into_rgba8())
    }

    /// Decode a raster image file.
    pub fn from_file(path: impl AsRef<Path>) -> RenderResult<Self> {
        let image = image::open(path.as_ref())
            .map_err(|e| RenderError::ImageLoad(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(Self::from_dynamic(image))
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Whether the pixmap has no pixels at all.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    #[inline]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f32) {
        self.device_pixel_ratio = if ratio > 0.0 { ratio } else { 1.0 };
    }

    /// Get the color of a single pixel, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width() && y < self.height() {
            Some(Color::from_array(self.image.get_pixel(x, y).0))
        } else {
            None
        }
    }

    /// Raw RGBA bytes in row-major order.
    #[inline]
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    #[inline]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Mutable access to the pixels, detaching from shared storage if needed.
    pub fn image_mut(&mut self) -> &mut RgbaImage {
        Arc::make_mut(&mut self.image)
    }

    // ========================================================================
    // GEOMETRY
    // ========================================================================

    /// Resample to exactly the given size.
    #[must_use]
    pub fn scaled(&self, width: u32, height: u32) -> Self {
        if self.dimensions() == (width, height) {
            return self.clone();
        }
        Self {
            image: Arc::new(imageops::resize(
                &*self.image,
                width,
                height,
                FilterType::Triangle,
            )),
            device_pixel_ratio: self.device_pixel_ratio,
        }
    }

    /// Resample to the largest size fitting in the box while keeping aspect.
    #[must_use]
    pub fn scaled_to_fit(&self, width: u32, height: u32) -> Self {
        let (w, h) = fit_size(self.dimensions(), (width, height));
        self.scaled(w, h)
    }

    /// Place this pixmap at the center of a transparent canvas.
    ///
    /// The offset is `((W - w) / 2, (H - h) / 2)` using integer division.
    #[must_use]
    pub fn centered_in(&self, width: u32, height: u32) -> Self {
        if self.dimensions() == (width, height) {
            return self.clone();
        }

        let mut canvas = RgbaImage::new(width, height);
        let x = (width as i64 - self.width() as i64) / 2;
        let y = (height as i64 - self.height() as i64) / 2;
        imageops::replace(&mut canvas, &*self.image, x, y);

        Self {
            image: Arc::new(canvas),
            device_pixel_ratio: self.device_pixel_ratio,
        }
    }

    /// Alpha-blend another pixmap on top of this one at `(x, y)`.
    ///
    /// Pixels falling outside of this pixmap are clipped.
    pub fn draw(&mut self, other: &Pixmap, x: i64, y: i64) {
        let target = self.image_mut();
        let (tw, th) = (target.width() as i64, target.height() as i64);

        for (ox, oy, src) in other.image.enumerate_pixels() {
            let dx = x + ox as i64;
            let dy = y + oy as i64;
            if dx < 0 || dy < 0 || dx >= tw || dy >= th {
                continue;
            }

            let dst = target.get_pixel_mut(dx as u32, dy as u32);
            *dst = blend_over(*dst, *src);
        }
    }
}

impl Default for Pixmap {
    fn default() -> Self {
        Self::null()
    }
}

impl std::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("device_pixel_ratio", &self.device_pixel_ratio)
            .finish()
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Largest size with the aspect ratio of `size` that fits inside `bounds`.
///
/// Degenerate sources fill the whole box.
pub fn fit_size(size: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = (size.0 as u64, size.1 as u64);
    let (bw, bh) = (bounds.0 as u64, bounds.1 as u64);
    if w == 0 || h == 0 || bw == 0 || bh == 0 {
        return bounds;
    }

    let rw = bh * w / h;
    if rw <= bw {
        ((rw.max(1)) as u32, bh as u32)
    } else {
        (bw as u32, ((bw * h / w).max(1)) as u32)
    }
}

/// Source-over compositing of straight alpha pixels.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let [sr, sg, sb, sa] = src.0;
    let [dr, dg, db, da] = dst.0;

    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let src_a = sa as f32 / 255.0;
    let dst_a = da as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let blend = |s: u8, d: u8| -> u8 {
        let result = (s as f32 * src_a + d as f32 * dst_a * (1.0 - src_a)) / out_a;
        result.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend(sr, dr),
        blend(sg, dg),
        blend(sb, db),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_transparent() {
        let pixmap = Pixmap::new(4, 3);
        assert_eq!(pixmap.dimensions(), (4, 3));
        assert!(!pixmap.is_null());
        assert_eq!(pixmap.pixel(3, 2), Some(Color::TRANSPARENT));
        assert_eq!(pixmap.pixel(4, 0), None);
        assert!(Pixmap::null().is_null());
    }

    #[test]
    fn test_fit_size_keeps_aspect() {
        assert_eq!(fit_size((40, 20), (40, 40)), (40, 20));
        assert_eq!(fit_size((20, 40), (40, 40)), (20, 40));
        assert_eq!(fit_size((22, 22), (22, 26)), (22, 22));
        assert_eq!(fit_size((16, 16), (32, 32)), (32, 32));
        assert_eq!(fit_size((0, 10), (8, 8)), (8, 8));
    }

    #[test]
    fn test_centered_in_offsets() {
        let red = Color::rgb(255, 0, 0);
        let pixmap = Pixmap::filled(22, 22, red).centered_in(22, 26);

        assert_eq!(pixmap.dimensions(), (22, 26));
        assert_eq!(pixmap.pixel(0, 1), Some(Color::TRANSPARENT));
        assert_eq!(pixmap.pixel(0, 2), Some(red));
        assert_eq!(pixmap.pixel(21, 23), Some(red));
        assert_eq!(pixmap.pixel(21, 24), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_centered_in_same_size_is_identity() {
        let pixmap = Pixmap::filled(8, 8, Color::WHITE);
        assert_eq!(pixmap.centered_in(8, 8), pixmap);
    }

    #[test]
    fn test_draw_opaque_and_clipped() {
        let mut base = Pixmap::filled(4, 4, Color::WHITE);
        let overlay = Pixmap::filled(2, 2, Color::BLACK);
        base.draw(&overlay, 3, 3);

        assert_eq!(base.pixel(3, 3), Some(Color::BLACK));
        assert_eq!(base.pixel(2, 2), Some(Color::WHITE));
    }

    #[test]
    fn test_draw_transparent_source_keeps_destination() {
        let mut base = Pixmap::filled(2, 2, Color::rgb(10, 20, 30));
        base.draw(&Pixmap::new(2, 2), 0, 0);
        assert_eq!(base.pixel(1, 1), Some(Color::rgb(10, 20, 30)));
    }

    #[test]
    fn test_clone_detaches_on_write() {
        let original = Pixmap::filled(2, 2, Color::WHITE);
        let mut copy = original.clone();
        copy.image_mut().put_pixel(0, 0, Rgba([0, 0, 0, 255]));

        assert_eq!(original.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(copy.pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_scaled_to_fit() {
        let pixmap = Pixmap::filled(40, 20, Color::WHITE).scaled_to_fit(20, 20);
        assert_eq!(pixmap.dimensions(), (20, 10));
    }
}
