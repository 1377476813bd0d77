//! A single icon theme parsed from its descriptor.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::theme::directory::ThemeDir;
use crate::theme::search::ThemeSearch;
use crate::types::{IconContext, IconGroup, MatchType};

/// Main section of a theme descriptor.
const MAIN_SECTION: &str = "Icon Theme";

/// Extensions tried, in order, when a theme declares none.
pub const DEFAULT_EXTENSIONS: [&str; 4] = [".png", ".svgz", ".svg", ".xpm"];

/// A parsed icon theme with its directories.
///
/// A theme is valid when its descriptor was found and parsed and at least one
/// of its directories exists on disk. Invalid themes are still returned by
/// [`IconTheme::load`] so callers can inspect why loading failed.
#[derive(Debug, Clone)]
pub struct IconTheme {
    internal_name: String,
    name: String,
    description: String,
    example: Option<String>,
    screenshot: Option<String>,
    depth: u32,
    inherits: Vec<String>,
    hidden: bool,
    follows_color_scheme: bool,
    extensions: Vec<String>,
    default_sizes: [u32; 6],
    sizes: [Vec<u32>; 6],
    dirs: Vec<ThemeDir>,
    scaled_dirs: Vec<ThemeDir>,
    descriptor: Option<PathBuf>,
    base_dirs: Vec<PathBuf>,
}

impl IconTheme {
    /// Load the theme called `internal_name`.
    ///
    /// With an `app_name`, directories below the application's own icon roots
    /// (and `base_hint`) are searched before the standard roots. A parent
    /// listed as `default` is replaced with `default_theme`.
    pub fn load(
        internal_name: &str,
        search: &ThemeSearch,
        app_name: Option<&str>,
        base_hint: Option<&Path>,
        default_theme: &str,
    ) -> Self {
        let mut theme = Self::empty(internal_name);

        let Some(descriptor_path) = search.find_descriptor(internal_name) else {
            tracing::debug!(target: "horizon_icons::theme", theme = internal_name, "No theme descriptor found");
            return theme;
        };

        let descriptor = match Settings::load(&descriptor_path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(target: "horizon_icons::theme", theme = internal_name, error = %e, "Failed to parse theme descriptor");
                return theme;
            }
        };

        theme.read_descriptor(&descriptor, default_theme);
        theme.base_dirs = search.theme_base_dirs(internal_name, app_name, base_hint);
        theme.read_directories(&descriptor);
        theme.descriptor = Some(descriptor_path);

        tracing::debug!(
            target: "horizon_icons::theme",
            theme = internal_name,
            dirs = theme.dirs.len(),
            scaled_dirs = theme.scaled_dirs.len(),
            "Loaded icon theme"
        );
        theme
    }

    fn empty(internal_name: &str) -> Self {
        Self {
            internal_name: internal_name.to_string(),
            name: internal_name.to_string(),
            description: String::new(),
            example: None,
            screenshot: None,
            depth: 32,
            inherits: Vec::new(),
            hidden: false,
            follows_color_scheme: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            default_sizes: IconGroup::ALL.map(IconGroup::default_size),
            sizes: Default::default(),
            dirs: Vec::new(),
            scaled_dirs: Vec::new(),
            descriptor: None,
            base_dirs: Vec::new(),
        }
    }

    fn read_descriptor(&mut self, descriptor: &Settings, default_theme: &str) {
        if let Some(name) = descriptor.get_string(MAIN_SECTION, "Name") {
            self.name = name;
        }
        self.description = descriptor
            .get_string(MAIN_SECTION, "Comment")
            .unwrap_or_default();
        self.example = descriptor.get_string(MAIN_SECTION, "Example");
        self.screenshot = descriptor.get_string(MAIN_SECTION, "ScreenShot");
        self.depth = descriptor.get(MAIN_SECTION, "DisplayDepth").unwrap_or(32);
        self.hidden = descriptor.get_bool(MAIN_SECTION, "Hidden").unwrap_or(false);
        self.follows_color_scheme = descriptor
            .get_bool(MAIN_SECTION, "FollowsColorScheme")
            .unwrap_or(false);

        self.inherits = descriptor
            .get_list(MAIN_SECTION, "Inherits")
            .into_iter()
            .map(|parent| {
                if parent == "default" {
                    default_theme.to_string()
                } else {
                    parent
                }
            })
            .collect();

        let extensions = descriptor.get_list(MAIN_SECTION, "KDE-Extensions");
        if !extensions.is_empty() {
            self.extensions = extensions
                .into_iter()
                .map(|ext| if ext.starts_with('.') { ext } else { format!(".{ext}") })
                .collect();
        }

        for (i, group) in IconGroup::ALL.into_iter().enumerate() {
            let prefix = group.name();
            self.default_sizes[i] = descriptor
                .get(MAIN_SECTION, &format!("{prefix}Default"))
                .unwrap_or(group.default_size());
            self.sizes[i] = descriptor.get_int_list(MAIN_SECTION, &format!("{prefix}Sizes"));
        }
    }

    fn read_directories(&mut self, descriptor: &Settings) {
        let mut relatives = descriptor.get_list(MAIN_SECTION, "Directories");
        relatives.extend(descriptor.get_list(MAIN_SECTION, "ScaledDirectories"));

        let mut added = HashSet::new();
        for relative in &relatives {
            for base in &self.base_dirs {
                let full = base.join(relative);
                if !full.is_dir() || !added.insert(full) {
                    continue;
                }
                let Some(dir) = ThemeDir::from_section(base, relative, descriptor) else {
                    continue;
                };
                if dir.scale() > 1 {
                    self.scaled_dirs.push(dir);
                } else {
                    self.dirs.push(dir);
                }
            }
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Path of the file `file_name` (with extension) best matching `size`.
    ///
    /// Directories with a matching integer scale are tried first, requiring an
    /// exact size match. Unscaled directories are then searched at
    /// `size * scale` so the icon is not blurry when drawn.
    pub fn icon_path(
        &self,
        file_name: &str,
        size: u32,
        match_type: MatchType,
        scale: f32,
    ) -> Option<PathBuf> {
        self.icon_path_excluding(file_name, size, match_type, scale, &HashSet::new())
    }

    /// Like [`IconTheme::icon_path`], trying every declared extension in order.
    pub fn icon_path_by_name(
        &self,
        name: &str,
        size: u32,
        match_type: MatchType,
        scale: f32,
    ) -> Option<PathBuf> {
        self.icon_path_by_name_excluding(name, size, match_type, scale, &HashSet::new())
    }

    pub(crate) fn icon_path_by_name_excluding(
        &self,
        name: &str,
        size: u32,
        match_type: MatchType,
        scale: f32,
        rejected: &HashSet<PathBuf>,
    ) -> Option<PathBuf> {
        self.extensions.iter().find_map(|ext| {
            self.icon_path_excluding(&format!("{name}{ext}"), size, match_type, scale, rejected)
        })
    }

    fn icon_path_excluding(
        &self,
        file_name: &str,
        size: u32,
        match_type: MatchType,
        scale: f32,
        rejected: &HashSet<PathBuf>,
    ) -> Option<PathBuf> {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let integer_scale = scale.ceil() as u32;

        best_match(
            &self.scaled_dirs,
            file_name,
            size,
            integer_scale,
            MatchType::Exact,
            rejected,
        )
        .or_else(|| {
            let device_size = (size as f32 * scale).round() as u32;
            best_match(&self.dirs, file_name, device_size, 1, match_type, rejected)
        })
    }

    /// All icons from directories that accept `size` and match `context`.
    pub fn query_icons(&self, size: u32, context: IconContext) -> Vec<PathBuf> {
        self.all_dirs()
            .filter(|dir| dir.context().matches(context) && dir.size_class().matches(size))
            .flat_map(|dir| dir.icon_list())
            .collect()
    }

    /// All icons matching `context`, ordered by how far their directory's
    /// nominal size is from `size`.
    pub fn query_icons_by_context(&self, size: u32, context: IconContext) -> Vec<PathBuf> {
        let mut by_gap: BTreeMap<u32, Vec<PathBuf>> = BTreeMap::new();
        for dir in self.all_dirs().filter(|dir| dir.context().matches(context)) {
            let gap = dir.size().abs_diff(size).min(127);
            by_gap.entry(gap).or_default().extend(dir.icon_list());
        }
        by_gap.into_values().flatten().collect()
    }

    /// Whether any directory carries icons of `context`.
    pub fn has_context(&self, context: IconContext) -> bool {
        self.all_dirs().any(|dir| dir.context().matches(context))
    }

    fn all_dirs(&self) -> impl Iterator<Item = &ThemeDir> {
        self.dirs.iter().chain(self.scaled_dirs.iter())
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn is_valid(&self) -> bool {
        self.descriptor.is_some() && (!self.dirs.is_empty() || !self.scaled_dirs.is_empty())
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Name of an icon that represents the theme.
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref()
    }

    pub fn screenshot(&self) -> Option<&str> {
        self.screenshot.as_deref()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Declared parent themes, in order.
    pub fn inherits(&self) -> &[String] {
        &self.inherits
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn follows_color_scheme(&self) -> bool {
        self.follows_color_scheme
    }

    /// File extensions tried for every icon name, with leading dots.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Default size declared for `group`, zero for the special groups.
    pub fn default_size(&self, group: IconGroup) -> u32 {
        group.index().map_or(0, |i| self.default_sizes[i])
    }

    /// Sizes available for `group`.
    ///
    /// Falls back to the nominal sizes of all directories when the descriptor
    /// declares none.
    pub fn query_sizes(&self, group: IconGroup) -> Vec<u32> {
        if let Some(sizes) = group.index().map(|i| &self.sizes[i]).filter(|s| !s.is_empty()) {
            return sizes.clone();
        }
        let mut sizes: Vec<u32> = self.all_dirs().map(ThemeDir::size).collect();
        sizes.sort_unstable();
        sizes.dedup();
        sizes
    }

    pub fn dirs(&self) -> &[ThemeDir] {
        &self.dirs
    }

    pub fn scaled_dirs(&self) -> &[ThemeDir] {
        &self.scaled_dirs
    }

    pub fn descriptor_path(&self) -> Option<&Path> {
        self.descriptor.as_deref()
    }

    /// Roots of this theme on disk, highest priority first.
    pub fn base_dirs(&self) -> &[PathBuf] {
        &self.base_dirs
    }
}

/// Order in which candidate directories are preferred.
///
/// Smaller ranks win. An exact size match always wins outright.
fn match_rank(delta: i64, match_type: MatchType) -> (u64, u64) {
    let magnitude = delta.unsigned_abs();
    let too_small = u64::from(delta < 0);
    match match_type {
        MatchType::BestOrGreaterSize => (too_small, magnitude),
        MatchType::Exact | MatchType::Best => (magnitude, too_small),
    }
}

fn best_match(
    dirs: &[ThemeDir],
    file_name: &str,
    size: u32,
    scale: u32,
    match_type: MatchType,
    rejected: &HashSet<PathBuf>,
) -> Option<PathBuf> {
    let mut best: Option<((u64, u64), PathBuf)> = None;

    for dir in dirs.iter().filter(|dir| dir.scale() == scale) {
        let delta = dir.size_class().delta(size);
        if match_type == MatchType::Exact && delta != 0 {
            continue;
        }

        let rank = match_rank(delta, match_type);
        if best.as_ref().is_some_and(|(current, _)| rank >= *current) {
            continue;
        }

        let Some(path) = dir.icon_path(file_name).filter(|p| !rejected.contains(p)) else {
            continue;
        };
        if delta == 0 {
            return Some(path);
        }
        best = Some((rank, path));
    }

    best.map(|(_, path)| path)
}
