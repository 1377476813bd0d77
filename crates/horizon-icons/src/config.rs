//! INI style settings used for theme descriptors and user configuration.
//!
//! Both `index.theme` files and the global/application settings files share
//! the same format: named sections with `key=value` lines. [`Settings`] keeps
//! the parsed content as plain strings and offers typed accessors the way the
//! rest of the subsystem needs them (lists, booleans, colors).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use horizon_icons_render::Color;
use ini::{Ini, ParseOption};

use crate::error::{Error, Result};

/// Parsed INI content organized by section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Settings {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Creates empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings from a string.
    pub fn parse(content: &str) -> Result<Self> {
        Self::parse_named(content, "<memory>")
    }

    /// Reads and parses a settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_named(&content, &path.display().to_string())
    }

    /// Reads a settings file, treating a missing or broken file as empty.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Self::new()
            }
            Err(e) => {
                tracing::warn!(target: "horizon_icons::config", error = %e, "Ignoring unreadable settings");
                Self::new()
            }
        }
    }

    fn parse_named(content: &str, origin: &str) -> Result<Self> {
        let option = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, option)
            .map_err(|e| Error::parse(origin, e.to_string()))?;

        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (section, props) in ini.iter() {
            let entry = sections
                .entry(section.unwrap_or_default().to_string())
                .or_default();
            for (key, value) in props.iter() {
                entry.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Ok(Self { sections })
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Returns true if there are no entries at all.
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(HashMap::is_empty)
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// Raw string value of `key` in `section`.
    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|props| props.get(key))
            .map(String::as_str)
    }

    /// Non-empty string value.
    pub fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.get_str(section, key)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// Parses a value with [`FromStr`], ignoring values that fail to parse.
    pub fn get<T: FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.get_str(section, key).and_then(|s| s.parse().ok())
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get_str(section, key)
            .and_then(|s| match s.to_lowercase().as_str() {
                "true" | "yes" | "1" | "on" => Some(true),
                "false" | "no" | "0" | "off" => Some(false),
                _ => None,
            })
    }

    /// Comma separated list with surrounding whitespace and empty items removed.
    pub fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.get_str(section, key)
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Comma separated list of integers; unparsable items are skipped.
    pub fn get_int_list(&self, section: &str, key: &str) -> Vec<u32> {
        self.get_list(section, key)
            .iter()
            .filter_map(|item| item.parse().ok())
            .collect()
    }

    pub fn get_color(&self, section: &str, key: &str) -> Option<Color> {
        self.get_str(section, key).and_then(Color::parse)
    }

    /// Section names in no particular order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    // ========================================================================
    // Modification
    // ========================================================================

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, section: &str, key: &str) -> Option<String> {
        self.sections.get_mut(section).and_then(|props| props.remove(key))
    }
}

/// Where a [`Settings`] instance comes from.
///
/// Settings are re-read from their source on every reconfiguration so that
/// external edits take effect.
#[derive(Debug, Clone, Default)]
pub enum SettingsSource {
    /// No settings; every lookup falls back to defaults.
    #[default]
    None,
    /// A file on disk. A missing file is treated as empty.
    File(PathBuf),
    /// Fixed in-memory settings.
    Memory(Settings),
}

impl SettingsSource {
    pub fn load(&self) -> Settings {
        match self {
            SettingsSource::None => Settings::new(),
            SettingsSource::File(path) => Settings::load_or_default(path),
            SettingsSource::Memory(settings) => settings.clone(),
        }
    }
}

impl From<Settings> for SettingsSource {
    fn from(settings: Settings) -> Self {
        SettingsSource::Memory(settings)
    }
}
