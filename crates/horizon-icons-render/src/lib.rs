//! Image primitives for the Horizon icon subsystem.
//!
//! This crate contains everything that touches pixels:
//!
//! - [`Pixmap`]: a shareable RGBA image with a device pixel ratio
//! - [`IconReader`]: decoding of PNG and other raster formats as well as
//!   SVG/SVGZ rendering through `resvg`
//! - [`effect`]: per-pixel state effects (gray, colorize, gamma, desaturate,
//!   monochrome, semi-transparency) and [`EffectSpec`]
//! - [`recolor`]: stylesheet injection for color-scheme aware SVGs
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use horizon_icons_render::{EffectKind, EffectSpec, IconReader};
//!
//! # fn example() -> horizon_icons_render::RenderResult<()> {
//! let reader = IconReader::open(Path::new("/usr/share/icons/hicolor/scalable/apps/kde.svg"))?;
//! let mut pixmap = reader.decode_fitted(32, 32)?.centered_in(32, 32);
//!
//! EffectSpec::new(EffectKind::ToGray, 1.0)
//!     .with_semi_transparent(true)
//!     .apply(pixmap.image_mut());
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod effect;
mod error;
mod pixmap;
mod reader;
pub mod recolor;

pub use color::Color;
pub use effect::{EffectKind, EffectSpec};
pub use error::{RenderError, RenderResult};
pub use pixmap::{Pixmap, fit_size};
pub use reader::{IconReader, is_svg_path};
pub use recolor::{COLOR_SCHEME_STYLE_ID, recolor_svg, recolor_svg_file};

// Pixel buffer type used by the effect functions
pub use image::RgbaImage;
