//! Color palettes used to recolor color-scheme aware SVG icons.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use horizon_icons_render::Color;

use crate::config::Settings;
use crate::types::IconState;

/// The semantic colors an icon stylesheet can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorPalette {
    // Foreground / background
    pub text: Color,
    pub background: Color,

    // Selection
    pub highlight: Color,
    pub highlighted_text: Color,
    pub accent: Color,

    // Semantic
    pub positive_text: Color,
    pub neutral_text: Color,
    pub negative_text: Color,
    pub active_text: Color,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::light()
    }
}

impl ColorPalette {
    /// Create the default light palette.
    pub fn light() -> Self {
        Self {
            text: Color::rgb(0x23, 0x26, 0x29),
            background: Color::rgb(0xef, 0xf0, 0xf1),
            highlight: Color::rgb(0x3d, 0xae, 0xe9),
            highlighted_text: Color::WHITE,
            accent: Color::rgb(0x3d, 0xae, 0xe9),
            positive_text: Color::rgb(0x27, 0xae, 0x60),
            neutral_text: Color::rgb(0xf6, 0x74, 0x00),
            negative_text: Color::rgb(0xda, 0x44, 0x53),
            active_text: Color::rgb(0x3d, 0xae, 0xe9),
        }
    }

    /// Create the default dark palette.
    pub fn dark() -> Self {
        Self {
            text: Color::rgb(0xfc, 0xfc, 0xfc),
            background: Color::rgb(0x20, 0x23, 0x26),
            highlight: Color::rgb(0x3d, 0xae, 0xe9),
            highlighted_text: Color::rgb(0xfc, 0xfc, 0xfc),
            accent: Color::rgb(0x3d, 0xae, 0xe9),
            positive_text: Color::rgb(0x27, 0xae, 0x60),
            neutral_text: Color::rgb(0xf6, 0x74, 0x00),
            negative_text: Color::rgb(0xda, 0x44, 0x53),
            active_text: Color::rgb(0x3d, 0xae, 0xe9),
        }
    }

    /// Read a palette from `[Colors:*]` settings groups, falling back to the
    /// light palette for anything missing.
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::light();
        let view = "Colors:View";
        let selection = "Colors:Selection";
        let color = |section: &str, key: &str, fallback: Color| {
            settings.get_color(section, key).unwrap_or(fallback)
        };

        Self {
            text: color(view, "ForegroundNormal", defaults.text),
            background: color(view, "BackgroundNormal", defaults.background),
            highlight: color(selection, "BackgroundNormal", defaults.highlight),
            highlighted_text: color(selection, "ForegroundNormal", defaults.highlighted_text),
            accent: color("General", "AccentColor", defaults.accent),
            positive_text: color(view, "ForegroundPositive", defaults.positive_text),
            neutral_text: color(view, "ForegroundNeutral", defaults.neutral_text),
            negative_text: color(view, "ForegroundNegative", defaults.negative_text),
            active_text: color(view, "ForegroundActive", defaults.active_text),
        }
    }

    /// A short identifier that differs between palettes with different colors.
    pub fn id(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    /// The stylesheet injected into color-scheme aware SVGs.
    ///
    /// In the selected state foreground and background roles swap so icons
    /// stay legible on top of the selection highlight.
    pub fn stylesheet(&self, state: IconState) -> String {
        let selected = state == IconState::Selected;
        let pick = |normal: Color, on_selection: Color| {
            (if selected { on_selection } else { normal }).name()
        };

        let rules = [
            ("Text", pick(self.text, self.highlighted_text)),
            ("Background", pick(self.background, self.highlight)),
            ("Highlight", pick(self.highlight, self.highlighted_text)),
            ("HighlightedText", pick(self.highlighted_text, self.highlight)),
            ("PositiveText", pick(self.positive_text, self.highlighted_text)),
            ("NeutralText", pick(self.neutral_text, self.highlighted_text)),
            ("NegativeText", pick(self.negative_text, self.highlighted_text)),
            ("ActiveText", pick(self.active_text, self.highlighted_text)),
            ("Complement", pick(self.background, self.highlight)),
            ("Contrast", pick(self.text, self.highlighted_text)),
            ("Accent", pick(self.accent, self.highlighted_text)),
        ];

        rules
            .iter()
            .map(|(role, color)| format!(".ColorScheme-{role} {{\ncolor:{color};\n}}\n"))
            .collect()
    }
}
