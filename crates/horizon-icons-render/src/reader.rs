//! Decoding icon files into pixmaps.
//!
//! [`IconReader`] hides the difference between raster formats (decoded with
//! the `image` crate) and vector formats (rendered with `resvg`). Vector icons
//! are rendered directly at the requested size so they stay sharp.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use image::imageops::FilterType;
use resvg::tiny_skia;
use resvg::usvg;

use crate::error::{RenderError, RenderResult};
use crate::pixmap::{Pixmap, fit_size};
use crate::recolor::read_svg_source;

/// Whether the path names an SVG or SVGZ document.
pub fn is_svg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg") || ext.eq_ignore_ascii_case("svgz"))
}

/// A decoded icon source, ready to be rendered at any size.
#[derive(Clone)]
pub enum IconReader {
    Raster(Arc<DynamicImage>),
    Vector(Arc<usvg::Tree>),
}

impl IconReader {
    /// Open an icon file, choosing the decoder from the file extension.
    pub fn open(path: &Path) -> RenderResult<Self> {
        if is_svg_path(path) {
            let data = read_svg_source(path)?;
            return Self::from_svg_bytes(&data);
        }

        let data = std::fs::read(path).map_err(|e| RenderError::io(path, e))?;
        Self::from_raster_bytes(&data)
            .map_err(|e| RenderError::ImageLoad(format!("{}: {}", path.display(), e)))
    }

    /// Parse an SVG document held in memory. Gzip input is accepted.
    pub fn from_svg_bytes(data: &[u8]) -> RenderResult<Self> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(data, &options)
            .map_err(|e| RenderError::Svg(format!("failed to parse SVG: {}", e)))?;
        Ok(Self::Vector(Arc::new(tree)))
    }

    /// Decode a raster image held in memory.
    pub fn from_raster_bytes(data: &[u8]) -> RenderResult<Self> {
        let image = image::load_from_memory(data)
            .map_err(|e| RenderError::ImageLoad(e.to_string()))?;
        Ok(Self::Raster(Arc::new(image)))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    /// Whether the source can take a color-scheme stylesheet.
    ///
    /// Only vector sources qualify; the stylesheet itself is spliced in by
    /// [`crate::recolor`] before the document is parsed.
    pub fn supports_stylesheet(&self) -> bool {
        self.is_vector()
    }

    /// The intrinsic pixel size of the source.
    pub fn natural_size(&self) -> (u32, u32) {
        match self {
            Self::Raster(image) => (image.width(), image.height()),
            Self::Vector(tree) => {
                let size = tree.size();
                (
                    size.width().ceil().max(1.0) as u32,
                    size.height().ceil().max(1.0) as u32,
                )
            }
        }
    }

    /// Render at the natural size.
    pub fn decode(&self) -> RenderResult<Pixmap> {
        let (width, height) = self.natural_size();
        self.render_exact(width, height)
    }

    /// Render at the largest size that fits `width` x `height` with the
    /// source aspect ratio preserved. The result is not padded.
    pub fn decode_fitted(&self, width: u32, height: u32) -> RenderResult<Pixmap> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let (w, h) = fit_size(self.natural_size(), (width, height));
        self.render_exact(w, h)
    }

    fn render_exact(&self, width: u32, height: u32) -> RenderResult<Pixmap> {
        match self {
            Self::Raster(image) => {
                if (image.width(), image.height()) == (width, height) {
                    Ok(Pixmap::from_image(image.to_rgba8()))
                } else {
                    Ok(Pixmap::from_dynamic(image.resize_exact(
                        width,
                        height,
                        FilterType::Triangle,
                    )))
                }
            }
            Self::Vector(tree) => render_svg(tree, width, height),
        }
    }
}

impl std::fmt::Debug for IconReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_vector() { "Vector" } else { "Raster" };
        f.debug_struct("IconReader")
            .field("kind", &kind)
            .field("natural_size", &self.natural_size())
            .finish()
    }
}

fn render_svg(tree: &usvg::Tree, width: u32, height: u32) -> RenderResult<Pixmap> {
    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or(RenderError::InvalidDimensions { width, height })?;

    let size = tree.size();
    let sx = width as f32 / size.width();
    let sy = height as f32 / size.height();
    resvg::render(tree, tiny_skia::Transform::from_scale(sx, sy), &mut pixmap.as_mut());

    // Convert from premultiplied RGBA to straight RGBA
    let mut image = image::RgbaImage::new(width, height);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        dst.0 = [color.red(), color.green(), color.blue(), color.alpha()];
    }
    Ok(Pixmap::from_image(image))
}
