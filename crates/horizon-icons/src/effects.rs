//! Per group and state effect configuration.

use horizon_icons_render::{Color, EffectKind, EffectSpec, RgbaImage};

use crate::config::Settings;
use crate::types::{IconGroup, IconState};

/// Cache key component used when no effect applies.
pub const NO_EFFECT_FINGERPRINT: &str = "noeffect";

/// The effect applied for every (group, state) pair.
///
/// Groups without an effect profile (`NoGroup`, `User`) never get an effect.
/// Each group's settings live in a `<Group>Icons` section with the keys
/// `<State>Effect`, `<State>Value`, `<State>Color`, `<State>Color2` and
/// `<State>SemiTransparent`.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectTable {
    cells: [[EffectSpec; 4]; 6],
}

impl Default for EffectTable {
    fn default() -> Self {
        Self::defaults()
    }
}

impl EffectTable {
    /// The built-in table used when nothing is configured.
    pub fn defaults() -> Self {
        let mut cells = [[EffectSpec::none(); 4]; 6];
        for group in IconGroup::ALL {
            for state in IconState::ALL {
                if let Some(i) = group.index() {
                    cells[i][state.index()] = default_spec(group, state);
                }
            }
        }
        Self { cells }
    }

    /// Read the table from settings; missing keys keep their defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut table = Self::defaults();
        for group in IconGroup::ALL {
            let Some(i) = group.index() else { continue };
            let section = format!("{}Icons", group.name());
            if !settings.has_section(&section) {
                continue;
            }

            for state in IconState::ALL {
                let cell = &mut table.cells[i][state.index()];
                let prefix = state.name();

                if let Some(value) = settings.get_str(&section, &format!("{prefix}Effect")) {
                    match EffectKind::from_config_str(value) {
                        Some(kind) => cell.kind = kind,
                        None => tracing::warn!(
                            target: "horizon_icons::effects",
                            section = %section,
                            effect = value,
                            "Unknown icon effect"
                        ),
                    }
                }
                if let Some(value) = settings.get::<f32>(&section, &format!("{prefix}Value")) {
                    cell.strength = value.clamp(0.0, 1.0);
                }
                if let Some(color) = settings.get_color(&section, &format!("{prefix}Color")) {
                    cell.color = color;
                }
                if let Some(color) = settings.get_color(&section, &format!("{prefix}Color2")) {
                    cell.color2 = color;
                }
                if let Some(semi) = settings.get_bool(&section, &format!("{prefix}SemiTransparent")) {
                    cell.semi_transparent = semi;
                }
            }
        }
        table
    }

    /// The effect for a pair; the identity for groups without a profile.
    pub fn spec(&self, group: IconGroup, state: IconState) -> EffectSpec {
        group
            .index()
            .map_or(EffectSpec::none(), |i| self.cells[i][state.index()])
    }

    /// Replace the effect for a pair. Ignored for groups without a profile.
    pub fn set_spec(&mut self, group: IconGroup, state: IconState, spec: EffectSpec) {
        if let Some(i) = group.index() {
            self.cells[i][state.index()] = spec;
        }
    }

    /// Whether drawing in this pair changes any pixel.
    pub fn has_effect(&self, group: IconGroup, state: IconState) -> bool {
        !self.spec(group, state).is_identity()
    }

    /// Cache key component for a pair.
    pub fn fingerprint(&self, group: IconGroup, state: IconState) -> String {
        if group.index().is_none() {
            return NO_EFFECT_FINGERPRINT.to_string();
        }
        self.spec(group, state).fingerprint()
    }

    /// Apply the effect for a pair in place.
    pub fn apply(&self, group: IconGroup, state: IconState, image: &mut RgbaImage) {
        let spec = self.spec(group, state);
        if !spec.is_identity() {
            spec.apply(image);
        }
    }
}

fn default_spec(group: IconGroup, state: IconState) -> EffectSpec {
    match state {
        IconState::Default | IconState::Selected => {
            EffectSpec::none().with_colors(Color::rgb(144, 128, 248), Color::BLACK)
        }
        IconState::Active => {
            let kind = if matches!(group, IconGroup::Desktop | IconGroup::Panel) {
                EffectKind::ToGamma
            } else {
                EffectKind::NoEffect
            };
            EffectSpec::new(kind, 0.7).with_colors(Color::rgb(169, 156, 255), Color::BLACK)
        }
        IconState::Disabled => EffectSpec::new(EffectKind::ToGray, 1.0)
            .with_colors(Color::rgb(34, 202, 0), Color::BLACK)
            .with_semi_transparent(true),
    }
}
