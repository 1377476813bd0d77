//! A single size/context subdirectory of an icon theme.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::types::IconContext;

/// File extensions recognized as icons inside theme directories.
pub const ICON_EXTENSIONS: [&str; 4] = ["png", "svg", "svgz", "xpm"];

/// The sizes a theme directory accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// Icons of exactly one size.
    Fixed { size: u32 },
    /// Vector icons usable anywhere in `min..=max`.
    Scalable { min: u32, max: u32 },
    /// Icons usable within `threshold` pixels of `size`.
    Threshold { size: u32, threshold: u32 },
}

impl SizeClass {
    /// Signed distance from the accepted range to `size`.
    ///
    /// Zero when `size` is accepted, positive when the directory's icons are
    /// larger than requested and negative when they are smaller.
    pub fn delta(&self, size: u32) -> i64 {
        let s = size as i64;
        match *self {
            SizeClass::Fixed { size } => size as i64 - s,
            SizeClass::Scalable { min, max } => {
                if s < min as i64 {
                    min as i64 - s
                } else if s > max as i64 {
                    max as i64 - s
                } else {
                    0
                }
            }
            SizeClass::Threshold { size, threshold } => {
                let low = size as i64 - threshold as i64;
                let high = size as i64 + threshold as i64;
                if s < low {
                    low - s
                } else if s > high {
                    high - s
                } else {
                    0
                }
            }
        }
    }

    /// Check if this class accepts a target size.
    pub fn matches(&self, size: u32) -> bool {
        self.delta(size) == 0
    }
}

/// One directory of a theme, e.g. `22x22/apps` below a theme root.
#[derive(Debug, Clone)]
pub struct ThemeDir {
    base_dir: PathBuf,
    relative: String,
    context: IconContext,
    size: u32,
    scale: u32,
    class: SizeClass,
}

impl ThemeDir {
    /// Build a directory from its descriptor section.
    ///
    /// Returns `None` when the section has no usable `Size` or an unknown
    /// `Type`. An unknown `Context` is accepted and treated as [`IconContext::Any`].
    pub fn from_section(base_dir: &Path, relative: &str, descriptor: &Settings) -> Option<Self> {
        let size = descriptor.get::<u32>(relative, "Size").unwrap_or(0);
        if size == 0 {
            tracing::debug!(target: "horizon_icons::theme", dir = relative, "Skipping directory without size");
            return None;
        }

        let scale = descriptor.get::<u32>(relative, "Scale").unwrap_or(1).max(1);
        let context = match descriptor.get_str(relative, "Context") {
            Some(value) => IconContext::parse(value).unwrap_or_else(|| {
                tracing::debug!(target: "horizon_icons::theme", dir = relative, context = value, "Unknown context");
                IconContext::Any
            }),
            None => IconContext::Any,
        };

        let class = match descriptor.get_str(relative, "Type").unwrap_or("Threshold") {
            "Fixed" => SizeClass::Fixed { size },
            "Scalable" => SizeClass::Scalable {
                min: descriptor.get(relative, "MinSize").unwrap_or(size),
                max: descriptor.get(relative, "MaxSize").unwrap_or(size),
            },
            "Threshold" => SizeClass::Threshold {
                size,
                threshold: descriptor.get(relative, "Threshold").unwrap_or(2),
            },
            other => {
                tracing::debug!(target: "horizon_icons::theme", dir = relative, kind = other, "Unknown directory type");
                return None;
            }
        };

        Some(Self {
            base_dir: base_dir.to_path_buf(),
            relative: relative.to_string(),
            context,
            size,
            scale,
            class,
        })
    }

    /// Absolute path of the directory.
    pub fn path(&self) -> PathBuf {
        self.base_dir.join(&self.relative)
    }

    /// The path of `file_name` inside this directory, if such a file exists.
    pub fn icon_path(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.path().join(file_name);
        path.is_file().then_some(path)
    }

    /// All icon files in this directory, sorted by path.
    pub fn icon_list(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(self.path()) else {
            return Vec::new();
        };

        let mut icons: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| has_icon_extension(path))
            .collect();
        icons.sort();
        icons
    }

    // ========================================================================
    // Metrics
    // ========================================================================

    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn context(&self) -> IconContext {
        self.context
    }

    pub fn size_class(&self) -> SizeClass {
        self.class
    }

    /// Nominal size.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn min_size(&self) -> u32 {
        match self.class {
            SizeClass::Scalable { min, .. } => min,
            _ => self.size,
        }
    }

    pub fn max_size(&self) -> u32 {
        match self.class {
            SizeClass::Scalable { max, .. } => max,
            _ => self.size,
        }
    }

    pub fn threshold(&self) -> u32 {
        match self.class {
            SizeClass::Threshold { threshold, .. } => threshold,
            _ => 0,
        }
    }
}

/// Whether the path ends in one of [`ICON_EXTENSIONS`].
pub fn has_icon_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ICON_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}

/// Strip a known icon extension from a name, if present.
pub fn strip_icon_extension(name: &str) -> &str {
    for ext in ICON_EXTENSIONS {
        if let Some(stem) = name.strip_suffix(ext).and_then(|s| s.strip_suffix('.')) {
            return stem;
        }
    }
    name
}
