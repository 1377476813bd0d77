//! Pixel effects applied to icons depending on their state.
//!
//! Each effect is a pure function over an RGBA image. [`EffectSpec`] bundles
//! an effect kind with its parameters and knows how to apply itself and how to
//! describe itself as a short fingerprint string suitable for cache keys.

use image::{Rgba, RgbaImage};

use crate::color::{Color, gray};

/// The kind of per-pixel effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectKind {
    /// Leave the pixels untouched.
    #[default]
    NoEffect,
    /// Blend toward the gray value of each pixel.
    ToGray,
    /// Tint with a color while preserving luminance.
    Colorize,
    /// Apply a gamma curve.
    ToGamma,
    /// Reduce saturation in HSV space.
    DeSaturate,
    /// Map to a two color image split at the mean brightness.
    ToMonochrome,
}

impl EffectKind {
    /// Parse the identifier used in settings files.
    pub fn from_config_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::NoEffect),
            "togray" => Some(Self::ToGray),
            "colorize" => Some(Self::Colorize),
            "togamma" => Some(Self::ToGamma),
            "desaturate" => Some(Self::DeSaturate),
            "tomonochrome" => Some(Self::ToMonochrome),
            _ => None,
        }
    }

    /// The identifier used in settings files.
    pub fn as_config_str(self) -> &'static str {
        match self {
            Self::NoEffect => "none",
            Self::ToGray => "togray",
            Self::Colorize => "colorize",
            Self::ToGamma => "togamma",
            Self::DeSaturate => "desaturate",
            Self::ToMonochrome => "tomonochrome",
        }
    }

    fn index(self) -> u8 {
        match self {
            Self::NoEffect => 0,
            Self::ToGray => 1,
            Self::Colorize => 2,
            Self::ToGamma => 3,
            Self::DeSaturate => 4,
            Self::ToMonochrome => 5,
        }
    }
}

/// An effect kind together with all of its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectSpec {
    pub kind: EffectKind,
    /// Strength in `[0, 1]`.
    pub strength: f32,
    /// Tint for colorize, dark color for monochrome.
    pub color: Color,
    /// Light color for monochrome.
    pub color2: Color,
    /// Halve the alpha channel after the effect.
    pub semi_transparent: bool,
}

impl EffectSpec {
    /// The identity effect.
    pub const fn none() -> Self {
        Self {
            kind: EffectKind::NoEffect,
            strength: 1.0,
            color: Color::BLACK,
            color2: Color::BLACK,
            semi_transparent: false,
        }
    }

    pub fn new(kind: EffectKind, strength: f32) -> Self {
        Self {
            kind,
            strength: strength.clamp(0.0, 1.0),
            ..Self::none()
        }
    }

    #[must_use]
    pub fn with_colors(mut self, color: Color, color2: Color) -> Self {
        self.color = color;
        self.color2 = color2;
        self
    }

    #[must_use]
    pub fn with_semi_transparent(mut self, semi_transparent: bool) -> Self {
        self.semi_transparent = semi_transparent;
        self
    }

    /// Whether applying this spec leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        self.kind == EffectKind::NoEffect && !self.semi_transparent
    }

    /// A short string that changes whenever any parameter changes.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.kind.index(),
            self.strength,
            if self.semi_transparent { "trans" } else { "notrans" },
            self.color.name(),
            self.color2.name(),
        )
    }

    /// Apply the effect and then the semi-transparency pass, in place.
    pub fn apply(&self, image: &mut RgbaImage) {
        match self.kind {
            EffectKind::NoEffect => {}
            EffectKind::ToGray => to_gray(image, self.strength),
            EffectKind::Colorize => colorize(image, self.color, self.strength),
            EffectKind::ToGamma => to_gamma(image, self.strength),
            EffectKind::DeSaturate => desaturate(image, self.strength),
            EffectKind::ToMonochrome => {
                to_monochrome(image, self.color, self.color2, self.strength)
            }
        }

        if self.semi_transparent {
            semi_transparent(image);
        }
    }
}

impl Default for EffectSpec {
    fn default() -> Self {
        Self::none()
    }
}

// ============================================================================
// EFFECTS
// ============================================================================

/// Blend every pixel toward its gray value.
pub fn to_gray(image: &mut RgbaImage, value: f32) {
    if value <= 0.0 {
        return;
    }

    if value >= 1.0 {
        for pixel in image.pixels_mut() {
            let [r, g, b, a] = pixel.0;
            let gray = gray(r, g, b);
            *pixel = Rgba([gray, gray, gray, a]);
        }
        return;
    }

    let val = (255.0 * value).round() as u32;
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let gray = gray(r, g, b) as u32;
        let mix = |c: u8| ((val * gray + (255 - val) * c as u32) >> 8) as u8;
        *pixel = Rgba([mix(r), mix(g), mix(b), a]);
    }
}

/// Tint every pixel with `color`, blended by `value`.
pub fn colorize(image: &mut RgbaImage, color: Color, value: f32) {
    if value <= 0.0 {
        return;
    }

    let val = (value.min(1.0) * 255.0) as u32;
    let tint = |col: u8, gray: u8| -> u32 {
        let col = col as f32;
        let gray = gray as f32;
        let tinted = if gray < 128.0 {
            col / 128.0 * gray
        } else if gray > 128.0 {
            (gray - 128.0) * (2.0 - col / 128.0) + col - 1.0
        } else {
            col
        };
        tinted.clamp(0.0, 255.0) as u32
    };

    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let gray = gray(r, g, b);
        let mix = |col: u8, c: u8| ((val * tint(col, gray) + (255 - val) * c as u32) >> 8) as u8;
        *pixel = Rgba([mix(color.r, r), mix(color.g, g), mix(color.b, b), a]);
    }
}

/// Apply the gamma curve `c' = 255 * (c / 255) ^ (1 / (2v + 0.5))`.
pub fn to_gamma(image: &mut RgbaImage, value: f32) {
    let gamma = 1.0 / (2.0 * value + 0.5);
    let mut table = [0u8; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = ((i as f32 / 255.0).powf(gamma) * 255.0).clamp(0.0, 255.0) as u8;
    }

    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        *pixel = Rgba([table[r as usize], table[g as usize], table[b as usize], a]);
    }
}

/// Scale the HSV saturation by `1 - value`.
pub fn desaturate(image: &mut RgbaImage, value: f32) {
    if value <= 0.0 {
        return;
    }

    let factor = 1.0 - value.min(1.0);
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let (r, g, b) = hsv_to_rgb(h, s * factor, v);
        *pixel = Rgba([r, g, b, a]);
    }
}

/// Split pixels at the mean brightness into `dark` and `light`.
///
/// Transparent pixels count as white when computing the mean.
pub fn to_monochrome(image: &mut RgbaImage, dark: Color, light: Color, value: f32) {
    let count = image.width() as usize * image.height() as usize;
    if count == 0 {
        return;
    }

    let sum: f64 = image
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            gray(r, g, b) as f64 * a as f64 + 255.0 * (255 - a) as f64
        })
        .sum();
    let medium = sum / (255.0 * count as f64);

    let val = (255.0 * value.clamp(0.0, 1.0)) as u32;
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let target = if gray(r, g, b) as f64 <= medium {
            dark
        } else {
            light
        };
        let mix = |t: u8, c: u8| ((val * t as u32 + (255 - val) * c as u32) >> 8) as u8;
        *pixel = Rgba([mix(target.r, r), mix(target.g, g), mix(target.b, b), a]);
    }
}

/// Halve the alpha channel of every pixel.
pub fn semi_transparent(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel.0[3] >>= 1;
    }
}

/// Composite `overlay` onto `image` pixel by pixel.
///
/// Both images must have the same dimensions; otherwise nothing happens.
/// Alpha becomes the maximum of the two inputs.
pub fn overlay(image: &mut RgbaImage, overlay: &RgbaImage) -> bool {
    if image.dimensions() != overlay.dimensions() {
        return false;
    }

    for (dst, src) in image.pixels_mut().zip(overlay.pixels()) {
        let [r1, g1, b1, a1] = src.0;
        let [r2, g2, b2, a2] = dst.0;
        let a = a1 as u32;
        let mix = |c1: u8, c2: u8| ((a * c1 as u32 + (255 - a) * c2 as u32) >> 8) as u8;
        *dst = Rgba([mix(r1, r2), mix(g1, g2), mix(b1, b2), a1.max(a2)]);
    }
    true
}

/// The standard "active" look.
pub fn to_active(image: &mut RgbaImage) {
    to_gamma(image, 0.7);
}

/// The standard "disabled" look.
pub fn to_disabled(image: &mut RgbaImage) {
    to_gray(image, 1.0);
    semi_transparent(image);
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Convert RGB (0-255) to HSV (h: 0-360, s: 0-1, v: 0-1).
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let rf = r as f32 / 255.0;
    let gf = g as f32 / 255.0;
    let bf = b as f32 / 255.0;

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (((gf - bf) / delta) % 6.0)
    } else if max == gf {
        60.0 * (((bf - rf) / delta) + 2.0)
    } else {
        60.0 * (((rf - gf) / delta) + 4.0)
    };

    (if h < 0.0 { h + 360.0 } else { h }, s, max)
}

/// Convert HSV (h: 0-360, s: 0-1, v: 0-1) to RGB (0-255).
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let h = h.rem_euclid(360.0);

    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba(color))
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(EffectKind::from_config_str("ToGray"), Some(EffectKind::ToGray));
        assert_eq!(EffectKind::from_config_str("none"), Some(EffectKind::NoEffect));
        assert_eq!(EffectKind::from_config_str("sparkle"), None);
        assert_eq!(EffectKind::DeSaturate.as_config_str(), "desaturate");
    }

    #[test]
    fn test_no_effect_is_identity() {
        let original = RgbaImage::from_fn(8, 8, |x, y| Rgba([x as u8 * 30, y as u8 * 30, 77, 200]));
        let mut image = original.clone();
        EffectSpec::none().apply(&mut image);
        assert_eq!(image, original);
    }

    #[test]
    fn test_to_gray_full_strength() {
        let mut image = solid([240, 130, 0, 255]);
        to_gray(&mut image, 1.0);
        assert_eq!(image.get_pixel(0, 0).0, [147, 147, 147, 255]);
    }

    #[test]
    fn test_to_gray_zero_is_identity() {
        let mut image = solid([240, 130, 0, 255]);
        to_gray(&mut image, 0.0);
        assert_eq!(image.get_pixel(0, 0).0, [240, 130, 0, 255]);
    }

    #[test]
    fn test_to_gray_partial_blends() {
        let mut image = solid([255, 0, 0, 255]);
        to_gray(&mut image, 0.5);
        // val = 128, gray = 87
        let expected_r = ((128 * 87 + 127 * 255) >> 8) as u8;
        let expected_g = ((128 * 87) >> 8) as u8;
        assert_eq!(image.get_pixel(1, 1).0, [expected_r, expected_g, expected_g, 255]);
    }

    #[test]
    fn test_semi_transparent_halves_alpha() {
        let mut image = solid([1, 2, 3, 255]);
        semi_transparent(&mut image);
        assert_eq!(image.get_pixel(0, 0).0[3], 127);
        semi_transparent(&mut image);
        assert_eq!(image.get_pixel(0, 0).0[3], 63);
        assert_eq!(&image.get_pixel(0, 0).0[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_gamma_keeps_extremes() {
        let mut image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        to_gamma(&mut image, 0.7);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_active_brightens_midtones() {
        let mut image = solid([100, 100, 100, 255]);
        to_active(&mut image);
        assert!(image.get_pixel(0, 0).0[0] > 100);
    }

    #[test]
    fn test_disabled_is_gray_and_semi_transparent() {
        let mut image = solid([240, 130, 0, 255]);
        to_disabled(&mut image);
        assert_eq!(image.get_pixel(2, 2).0, [147, 147, 147, 127]);
    }

    #[test]
    fn test_colorize_mid_gray_takes_color() {
        // Pure gray 128 maps exactly onto the tint color at full strength.
        let mut image = solid([128, 128, 128, 255]);
        colorize(&mut image, Color::rgb(200, 100, 0), 1.0);
        let [r, g, b, a] = image.get_pixel(0, 0).0;
        assert_eq!(a, 255);
        assert_eq!((r, g, b), (199, 99, 0));
    }

    #[test]
    fn test_desaturate_full_strength_is_gray() {
        let mut image = solid([200, 50, 50, 255]);
        desaturate(&mut image, 1.0);
        let [r, g, b, _] = image.get_pixel(0, 0).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 200);
    }

    #[test]
    fn test_monochrome_splits_at_mean() {
        let mut image = RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgba([20, 20, 20, 255]) } else { Rgba([230, 230, 230, 255]) }
        });
        to_monochrome(&mut image, Color::rgb(0, 0, 255), Color::rgb(255, 255, 0), 1.0);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 254, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [254, 254, 0, 255]);
    }

    #[test]
    fn test_overlay_alpha_is_max() {
        let mut base = solid([0, 0, 0, 100]);
        let top = solid([255, 255, 255, 255]);
        assert!(overlay(&mut base, &top));
        assert_eq!(base.get_pixel(0, 0).0, [254, 254, 254, 255]);

        let small = RgbaImage::new(2, 2);
        assert!(!overlay(&mut base, &small));
    }

    #[test]
    fn test_fingerprint_changes_with_every_field() {
        let base = EffectSpec::new(EffectKind::ToGray, 1.0);
        let variants = [
            EffectSpec::new(EffectKind::Colorize, 1.0),
            EffectSpec::new(EffectKind::ToGray, 0.5),
            base.with_semi_transparent(true),
            base.with_colors(Color::WHITE, Color::BLACK),
            base.with_colors(Color::BLACK, Color::WHITE),
        ];
        for variant in variants {
            assert_ne!(variant.fingerprint(), base.fingerprint());
        }
        assert_eq!(base.fingerprint(), EffectSpec::new(EffectKind::ToGray, 1.0).fingerprint());
    }

    #[test]
    fn test_apply_semi_transparent_after_effect() {
        let mut image = solid([240, 130, 0, 255]);
        EffectSpec::new(EffectKind::ToGray, 1.0)
            .with_semi_transparent(true)
            .apply(&mut image);
        assert_eq!(image.get_pixel(0, 0).0, [147, 147, 147, 127]);
    }
}
