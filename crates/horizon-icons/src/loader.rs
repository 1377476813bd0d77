//! The icon loader: from an icon name to a ready-to-draw pixmap.
//!
//! [`IconLoader`] resolves names through the theme tree, renders the chosen
//! file at the requested size and device pixel ratio, applies the effect for
//! the group and state, draws emblem overlays and caches the result.
//!
//! Lookup of a themed name proceeds until something is found:
//!
//! 1. every node of the theme tree, trying the name and its fallback names
//!    (`edit-copy-all` → `edit-copy` → `edit`)
//! 2. the generic icon registered for a mimetype name
//! 3. the configured fallback search paths
//! 4. the application's loose icon directories
//! 5. the theme's `unknown` icon, unless the caller accepts nothing
//!
//! Misses are cached too. A cached miss is looked up again once the recheck
//! interval has passed so icons installed at runtime show up.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use horizon_icons_render::{
    IconReader, Pixmap, RenderResult, is_svg_path, recolor_svg_file,
};

use crate::availability::{AgeGovernor, AvailabilityMap};
use crate::bus::ChangeSubscription;
use crate::cache::{CachedPixmap, PixmapCache};
use crate::effects::EffectTable;
use crate::palette::ColorPalette;
use crate::signal::Signal;
use crate::subsystem::{ICONS_SECTION, IconSubsystem};
use crate::theme::{DEFAULT_EXTENSIONS, IconTheme, ThemeTree, strip_icon_extension};
use crate::types::{IconContext, IconGroup, IconRequest, IconState, MatchType};

/// Built-in glyph used when no theme provides an `unknown` icon.
const UNKNOWN_ICON: &[u8] = include_bytes!("../resources/unknown.svg");

const UNKNOWN_ICON_NAME: &str = "unknown";

/// Mimetype icons fall back to this when nothing better matches.
const OCTET_STREAM_ICON: &str = "application-octet-stream";

const FAVICON_PREFIX: &str = "favicons/";

/// Icon used beneath favicons; favicons are drawn in its corner.
const FAVICON_BASE_ICON: &str = "text-html";

/// Extensions probed in the fallback search paths.
const FALLBACK_EXTENSIONS: [&str; 4] = [".png", ".svg", ".svgz", ".xpm"];

/// Media types whose names end in a `<media>-x-generic` icon.
const MEDIA_ROOTS: [&str; 11] = [
    "text",
    "application",
    "image",
    "audio",
    "inode",
    "video",
    "message",
    "model",
    "multipart",
    "x-content",
    "x-epoc",
];

const GENERIC_SUFFIX: &str = "-x-generic";
const SYMBOLIC_SUFFIX: &str = "-symbolic";

/// Corner slots available for overlays.
const MAX_OVERLAYS: usize = 4;

/// Bound on retries after a chosen file failed to decode.
const MAX_DECODE_ATTEMPTS: usize = 8;

/// The result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedIcon {
    pub pixmap: Pixmap,
    /// File the icon was rendered from; `None` for the unknown icon.
    pub path: Option<PathBuf>,
    /// Whether the icon stands in for one that was not found.
    pub was_unknown: bool,
}

/// Where the pixels of a request come from.
enum Source {
    Themed(String),
    File(PathBuf),
}

/// Everything built from the theme tree and settings, dropped on reconfigure.
#[derive(Debug)]
struct LoadedThemes {
    tree: ThemeTree,
    effects: EffectTable,
    sizes: [u32; 6],
    user_dirs: Vec<PathBuf>,
    palette: ColorPalette,
}

impl LoadedThemes {
    fn load(
        subsystem: &IconSubsystem,
        app_name: &str,
        extra_search_paths: &[PathBuf],
        app_dirs: &[(String, Option<PathBuf>)],
    ) -> Self {
        let global = subsystem.global_settings();
        let app_settings = subsystem.app_settings(app_name);
        let current = subsystem.current_theme(&app_settings);
        let ctx = subsystem.tree_context();

        let mut tree = ThemeTree::build(&current, &ctx);
        let mut user_dirs = subsystem.search().user_icon_dirs(app_name, extra_search_paths);
        for (app, base_dir) in app_dirs {
            tree.add_app_themes(app, base_dir.as_deref(), &ctx);
            user_dirs.extend(subsystem.search().app_pics_dirs(app));
        }

        let root = tree.root();
        let sizes = IconGroup::ALL.map(|group| {
            let key = format!("{}Default", group.name());
            app_settings
                .get::<u32>(ICONS_SECTION, &key)
                .or_else(|| global.get::<u32>(ICONS_SECTION, &key))
                .filter(|size| *size > 0)
                .or_else(|| root.map(|theme| theme.default_size(group)))
                .filter(|size| *size > 0)
                .unwrap_or(group.default_size())
        });

        tracing::debug!(
            target: "horizon_icons::loader",
            app = app_name,
            theme = %current,
            themes = ?tree.theme_names(),
            "Loaded theme tree"
        );

        Self {
            tree,
            effects: EffectTable::from_settings(&global),
            sizes,
            user_dirs,
            palette: ColorPalette::from_settings(&global),
        }
    }

    fn size(&self, group: IconGroup) -> u32 {
        group.index().map_or(0, |i| self.sizes[i])
    }

    fn follows_color_scheme(&self) -> bool {
        self.tree.root().is_some_and(IconTheme::follows_color_scheme)
    }

    /// Resolve a themed name through the whole fallback chain.
    fn find_icon(
        &self,
        subsystem: &IconSubsystem,
        name: &str,
        group: IconGroup,
        size: u32,
        scale: f32,
        rejected: &HashSet<PathBuf>,
    ) -> Option<PathBuf> {
        if group == IconGroup::User
            && let Some(path) = self.locate(name, rejected)
        {
            return Some(path);
        }

        find_in_tree(&self.tree, name, size, scale, rejected)
            .or_else(|| {
                let generic = subsystem.generic_icon(name)?;
                tracing::trace!(target: "horizon_icons::loader", name, generic = %generic, "Trying generic icon");
                find_in_tree(&self.tree, &generic, size, scale, rejected)
            })
            .or_else(|| {
                locate_in(
                    &subsystem.config().fallback_search_paths,
                    name,
                    &FALLBACK_EXTENSIONS,
                    rejected,
                )
            })
            .or_else(|| {
                if group == IconGroup::User {
                    None
                } else {
                    self.locate(name, rejected)
                }
            })
    }

    /// Search the loose icon directories.
    fn locate(&self, name: &str, rejected: &HashSet<PathBuf>) -> Option<PathBuf> {
        locate_in(&self.user_dirs, name, &DEFAULT_EXTENSIONS, rejected)
    }

    fn unknown_path(&self, size: u32, scale: f32) -> Option<PathBuf> {
        self.tree.iter().find_map(|node| {
            node.theme
                .icon_path_by_name(UNKNOWN_ICON_NAME, size, MatchType::Best, scale)
        })
    }
}

/// Loads themed icons for one application.
///
/// A loader is meant to be used from one thread. Theme data is loaded on
/// first use and reloaded after [`IconLoader::reconfigure`] or a change
/// announced on the subsystem's change bus.
///
/// # Example
///
/// ```no_run
/// use horizon_icons::{IconGroup, IconLoader, IconRequest, IconState};
///
/// let mut loader = IconLoader::new("myapp", Vec::new());
/// let request = IconRequest::new("document-save")
///     .with_group(IconGroup::Toolbar)
///     .with_scale(2.0)
///     .with_state(IconState::Disabled);
///
/// if let Some(icon) = loader.load_scaled_icon(&request) {
///     println!("{:?} from {:?}", icon.pixmap.dimensions(), icon.path);
/// }
/// ```
#[derive(Debug)]
pub struct IconLoader {
    subsystem: Arc<IconSubsystem>,
    subscription: ChangeSubscription,
    app_name: String,
    extra_search_paths: Vec<PathBuf>,
    app_dirs: Vec<(String, Option<PathBuf>)>,
    themes: Option<LoadedThemes>,
    cache: PixmapCache,
    availability: AvailabilityMap,
    governor: AgeGovernor,
    custom_palette: Option<ColorPalette>,
    icon_changed: Signal<IconGroup>,
}

impl IconLoader {
    /// Create a loader using the process wide subsystem.
    pub fn new(app_name: &str, extra_search_paths: Vec<PathBuf>) -> Self {
        Self::with_subsystem(IconSubsystem::global(), app_name, extra_search_paths)
    }

    pub fn with_subsystem(
        subsystem: Arc<IconSubsystem>,
        app_name: &str,
        extra_search_paths: Vec<PathBuf>,
    ) -> Self {
        let config = subsystem.config();
        let cache = PixmapCache::new(config.cache_max_cost);
        let governor = AgeGovernor::new(config.clock.clone(), config.recheck_interval);

        Self {
            subscription: subsystem.subscribe(),
            subsystem,
            app_name: app_name.to_string(),
            extra_search_paths,
            app_dirs: Vec::new(),
            themes: None,
            cache,
            availability: AvailabilityMap::new(),
            governor,
            custom_palette: None,
            icon_changed: Signal::new(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn subsystem(&self) -> &Arc<IconSubsystem> {
        &self.subsystem
    }

    /// Rendered icons held by this loader.
    pub fn cache(&self) -> &PixmapCache {
        &self.cache
    }

    fn ensure_loaded(&mut self) {
        if self.themes.is_none() {
            self.themes = Some(LoadedThemes::load(
                &self.subsystem,
                &self.app_name,
                &self.extra_search_paths,
                &self.app_dirs,
            ));
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load an icon as described by `request`.
    ///
    /// Returns `None` for an empty name or a negative size, and when nothing
    /// was found and the request allows an empty result. Otherwise a pixmap
    /// of `size * scale` device pixels is returned, possibly the unknown icon.
    pub fn load_scaled_icon(&mut self, request: &IconRequest) -> Option<LoadedIcon> {
        self.process_changes();

        if request.name.is_empty() {
            return None;
        }
        let (width, height) = request.size;
        if width < 0 || height < 0 {
            tracing::warn!(
                target: "horizon_icons::loader",
                name = %request.name,
                width,
                height,
                "Negative icon size"
            );
            return None;
        }

        let group = request.group;
        let state = request.state;
        let scale = if request.scale.is_finite() && request.scale > 0.0 {
            request.scale
        } else {
            1.0
        };

        self.ensure_loaded();
        let themes = self.themes.as_ref()?;

        let logical = match (width, height) {
            (0, 0) => match group {
                IconGroup::User => None,
                IconGroup::NoGroup => {
                    tracing::warn!(
                        target: "horizon_icons::loader",
                        name = %request.name,
                        "Neither size nor group given, using the Desktop size"
                    );
                    let size = themes.size(IconGroup::Desktop);
                    Some((size, size))
                }
                group => {
                    let size = themes.size(group);
                    Some((size, size))
                }
            },
            (0, h) => Some((h as u32, h as u32)),
            (w, 0) => Some((w as u32, w as u32)),
            (w, h) => Some((w as u32, h as u32)),
        };

        let (source, key_name, favicon) = self.classify(&request.name, logical);

        let palette = request
            .colors
            .or(self.custom_palette)
            .unwrap_or(themes.palette);
        let follows = themes.follows_color_scheme();
        let key = cache_key(&CacheKeyParts {
            name: &key_name,
            user: group == IconGroup::User,
            size: logical,
            scale,
            overlays: &request.overlays,
            fingerprint: &themes.effects.fingerprint(group, state),
            palette_id: &palette.id(),
            selected: follows && state == IconState::Selected,
        });

        if let Some(entry) = self.cache.get(&key) {
            match &entry.path {
                Some(path) => {
                    tracing::trace!(target: "horizon_icons::loader", key = %key, "Cache hit");
                    return Some(LoadedIcon {
                        pixmap: entry.pixmap.clone(),
                        path: Some(path.clone()),
                        was_unknown: false,
                    });
                }
                None => {
                    let cached = entry.pixmap.clone();
                    if !self.governor.should_recheck() {
                        tracing::trace!(target: "horizon_icons::loader", key = %key, "Cached miss");
                        if request.can_return_null {
                            return None;
                        }
                        if !cached.is_null() {
                            return Some(LoadedIcon {
                                pixmap: cached,
                                path: None,
                                was_unknown: true,
                            });
                        }
                        let pixmap = self.render_unknown(logical, scale, group, state, &palette);
                        return Some(LoadedIcon {
                            pixmap,
                            path: None,
                            was_unknown: true,
                        });
                    }
                    tracing::trace!(target: "horizon_icons::loader", key = %key, "Rechecking missing icon");
                }
            }
        }

        let lookup_size = logical.map_or(0, |(w, h)| w.max(h));
        let mut rejected = HashSet::new();
        let mut found = None;
        for _ in 0..MAX_DECODE_ATTEMPTS {
            let candidate = match &source {
                Source::File(path) => Some(path.clone()).filter(|path| !rejected.contains(path)),
                Source::Themed(name) => {
                    themes.find_icon(&self.subsystem, name, group, lookup_size, scale, &rejected)
                }
            };
            let Some(path) = candidate else {
                break;
            };

            let stylesheet = follows.then(|| palette.stylesheet(state));
            match render_file(&path, stylesheet.as_deref(), logical, scale) {
                Ok(pixmap) => {
                    found = Some((path, pixmap));
                    break;
                }
                Err(e) => {
                    tracing::debug!(target: "horizon_icons::loader", path = %path.display(), error = %e, "Failed to decode icon");
                    rejected.insert(path);
                }
            }
        }

        let Some((path, mut pixmap)) = found else {
            tracing::debug!(target: "horizon_icons::loader", name = %request.name, "Icon not found");
            self.availability.insert(key_name, None);
            self.governor.record_miss();

            if request.can_return_null {
                self.cache.insert(key, CachedPixmap::new(Pixmap::null(), None));
                return None;
            }
            let pixmap = self.render_unknown(logical, scale, group, state, &palette);
            self.cache.insert(key, CachedPixmap::new(pixmap.clone(), None));
            return Some(LoadedIcon {
                pixmap,
                path: None,
                was_unknown: true,
            });
        };

        themes.effects.apply(group, state, pixmap.image_mut());

        if let Some(favicon) = favicon {
            match Pixmap::from_file(&favicon) {
                Ok(favicon) => {
                    let x = pixmap.width() as i64 - favicon.width() as i64 - 1;
                    let y = pixmap.height() as i64 - favicon.height() as i64 - 1;
                    pixmap.draw(&favicon, x, y);
                }
                Err(e) => {
                    tracing::debug!(target: "horizon_icons::loader", error = %e, "Failed to load favicon");
                }
            }
        }

        pixmap.set_device_pixel_ratio(scale);
        self.draw_overlays(&mut pixmap, &request.overlays, group, state, scale);

        self.availability.insert(key_name, Some(path.clone()));
        self.cache
            .insert(key, CachedPixmap::new(pixmap.clone(), Some(path.clone())));

        Some(LoadedIcon {
            pixmap,
            path: Some(path),
            was_unknown: false,
        })
    }

    /// Load a square icon at scale 1.
    ///
    /// A `size` of zero uses the group's size.
    pub fn load_icon(
        &mut self,
        name: &str,
        group: IconGroup,
        size: i32,
        state: IconState,
        overlays: &[&str],
        can_return_null: bool,
    ) -> Option<LoadedIcon> {
        let mut request = IconRequest::new(name)
            .with_group(group)
            .with_size(size)
            .with_state(state)
            .with_overlays(overlays.iter().copied());
        request.can_return_null = can_return_null;
        self.load_scaled_icon(&request)
    }

    /// Load the icon for a mimetype such as `text/plain`.
    ///
    /// Falls back to `application-octet-stream` when no icon matches.
    pub fn load_mime_type_icon(
        &mut self,
        mime_type: &str,
        group: IconGroup,
        size: i32,
        state: IconState,
    ) -> Option<LoadedIcon> {
        let name = mime_type.replace('/', "-");
        let request = IconRequest::new(name)
            .with_group(group)
            .with_size(size)
            .with_state(state);

        self.load_scaled_icon(&request.clone().allow_null())
            .or_else(|| {
                let mut fallback = request;
                fallback.name = OCTET_STREAM_ICON.to_string();
                self.load_scaled_icon(&fallback)
            })
    }

    /// Where to read `name` from, the name used in cache keys and the
    /// favicon to blend on top, if any.
    fn classify(
        &self,
        name: &str,
        logical: Option<(u32, u32)>,
    ) -> (Source, String, Option<PathBuf>) {
        if name.starts_with(FAVICON_PREFIX)
            && let Some(dir) = &self.subsystem.config().favicon_dir
        {
            let path = dir.join(format!("{name}.png"));
            let large = logical.is_some_and(|(w, h)| w.min(h) > 22);
            if large {
                return (
                    Source::Themed(FAVICON_BASE_ICON.to_string()),
                    name.to_string(),
                    Some(path),
                );
            }
            return (Source::File(path), name.to_string(), None);
        }

        if Path::new(name).is_absolute() {
            return (Source::File(PathBuf::from(name)), name.to_string(), None);
        }

        if let Some(relative) = name.strip_prefix(":/") {
            let roots = self.subsystem.search().resource_roots();
            let path = roots
                .iter()
                .map(|root| root.join(relative))
                .find(|path| path.is_file())
                .unwrap_or_else(|| PathBuf::from(name));
            return (Source::File(path), name.to_string(), None);
        }

        let stripped = strip_icon_extension(name).to_string();
        (Source::Themed(stripped.clone()), stripped, None)
    }

    fn render_unknown(
        &self,
        logical: Option<(u32, u32)>,
        scale: f32,
        group: IconGroup,
        state: IconState,
        palette: &ColorPalette,
    ) -> Pixmap {
        let Some(themes) = self.themes.as_ref() else {
            return Pixmap::null();
        };

        let lookup_size = logical.map_or_else(|| themes.size(IconGroup::Desktop), |(w, h)| w.max(h));
        let stylesheet = themes
            .follows_color_scheme()
            .then(|| palette.stylesheet(state));

        let themed = themes
            .unknown_path(lookup_size, scale)
            .and_then(|path| render_file(&path, stylesheet.as_deref(), logical, scale).ok());

        let mut pixmap = themed
            .or_else(|| {
                IconReader::from_svg_bytes(UNKNOWN_ICON)
                    .and_then(|reader| render_reader(&reader, logical, scale))
                    .ok()
            })
            .unwrap_or_else(|| match logical {
                Some((w, h)) => {
                    let (w, h) = device_size(w, h, scale);
                    Pixmap::new(w, h)
                }
                None => Pixmap::null(),
            });

        themes.effects.apply(group, state, pixmap.image_mut());
        pixmap.set_device_pixel_ratio(scale);
        pixmap
    }

    fn draw_overlays(
        &mut self,
        pixmap: &mut Pixmap,
        overlays: &[String],
        group: IconGroup,
        state: IconState,
        scale: f32,
    ) {
        if overlays.is_empty() || pixmap.is_null() {
            return;
        }

        let (width, height) = (pixmap.width() as i64, pixmap.height() as i64);
        let icon_size = (width.min(height) as f32 / scale).round() as u32;
        let size = overlay_size(icon_size);
        let margin = (scale * 0.05 * icon_size as f32).round() as i64;

        for (slot, name) in overlays.iter().take(MAX_OVERLAYS).enumerate() {
            // Empty names keep their corner free
            if name.is_empty() {
                continue;
            }

            let request = IconRequest::new(name.as_str())
                .with_group(group)
                .with_state(state)
                .with_size(size as i32)
                .with_scale(scale)
                .allow_null();
            let Some(overlay) = self.load_scaled_icon(&request) else {
                continue;
            };

            let (w, h) = (overlay.pixmap.width() as i64, overlay.pixmap.height() as i64);
            let (x, y) = match slot {
                0 => (width - w - margin, height - h - margin),
                1 => (margin, height - h - margin),
                2 => (margin, margin),
                _ => (width - w - margin, margin),
            };
            pixmap.draw(&overlay.pixmap, x, y);
        }
    }

    // ========================================================================
    // Paths and queries
    // ========================================================================

    /// Path of the file that would be used for `name` in `group`.
    ///
    /// Falls back to the theme's unknown icon unless `can_return_null`.
    pub fn icon_path(&mut self, name: &str, group: IconGroup, can_return_null: bool) -> Option<PathBuf> {
        self.process_changes();
        if name.is_empty() {
            return None;
        }
        if Path::new(name).is_absolute() {
            return Some(PathBuf::from(name));
        }

        self.ensure_loaded();
        let themes = self.themes.as_ref()?;
        let size = match group {
            IconGroup::NoGroup | IconGroup::User => themes.size(IconGroup::Desktop),
            group => themes.size(group),
        };
        let icon = strip_icon_extension(name);
        let found = themes.find_icon(&self.subsystem, icon, group, size, 1.0, &HashSet::new());

        match found {
            Some(path) => {
                self.availability.insert(icon, Some(path.clone()));
                Some(path)
            }
            None if can_return_null => None,
            None => themes.unknown_path(size, 1.0),
        }
    }

    /// Whether any source provides `name`.
    ///
    /// Answers come from the availability map; a remembered miss is looked
    /// up again once the recheck interval has passed.
    pub fn has_icon(&mut self, name: &str) -> bool {
        self.process_changes();
        if name.is_empty() {
            return false;
        }
        self.ensure_loaded();

        let icon = strip_icon_extension(name);
        match self.availability.get(icon) {
            Some(Some(_)) => return true,
            Some(None) if !self.governor.should_recheck() => return false,
            _ => {}
        }

        let Some(themes) = self.themes.as_ref() else {
            return false;
        };
        let size = themes.size(IconGroup::Desktop);
        let found = themes.find_icon(
            &self.subsystem,
            icon,
            IconGroup::Desktop,
            size,
            1.0,
            &HashSet::new(),
        );

        let exists = found.is_some();
        if !exists {
            self.governor.record_miss();
        }
        self.availability.insert(icon, found);
        exists
    }

    /// Icons of every theme in the tree accepting `size` and matching
    /// `context`. Each icon name appears once, from the first theme that
    /// has it.
    pub fn query_icons(&mut self, size: u32, context: IconContext) -> Vec<PathBuf> {
        self.collect_icons(|theme| theme.query_icons(size, context))
    }

    /// Like [`IconLoader::query_icons`], ordered by size distance per theme.
    pub fn query_icons_by_context(&mut self, size: u32, context: IconContext) -> Vec<PathBuf> {
        self.collect_icons(|theme| theme.query_icons_by_context(size, context))
    }

    fn collect_icons(&mut self, query: impl Fn(&IconTheme) -> Vec<PathBuf>) -> Vec<PathBuf> {
        self.process_changes();
        self.ensure_loaded();
        let Some(themes) = self.themes.as_ref() else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        themes
            .tree
            .iter()
            .flat_map(|node| query(&node.theme))
            .filter(|path| {
                let stem = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                seen.insert(stem)
            })
            .collect()
    }

    /// Whether any theme in the tree has a directory for `context`.
    pub fn has_context(&mut self, context: IconContext) -> bool {
        self.process_changes();
        self.ensure_loaded();
        self.themes
            .as_ref()
            .is_some_and(|themes| themes.tree.iter().any(|node| node.theme.has_context(context)))
    }

    /// Pixel size used for `group` when a request gives none.
    ///
    /// Zero for `NoGroup` and `User`.
    pub fn current_size(&mut self, group: IconGroup) -> u32 {
        self.process_changes();
        self.ensure_loaded();
        self.themes.as_ref().map_or(0, |themes| themes.size(group))
    }

    /// The root theme of the tree.
    pub fn theme(&mut self) -> Option<&IconTheme> {
        self.process_changes();
        self.ensure_loaded();
        self.themes.as_ref().and_then(|themes| themes.tree.root())
    }

    /// Internal names of the themes in lookup order.
    pub fn theme_names(&mut self) -> Vec<String> {
        self.process_changes();
        self.ensure_loaded();
        self.themes
            .as_ref()
            .map(|themes| themes.tree.theme_names())
            .unwrap_or_default()
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Add the themes and loose icons installed by another application.
    ///
    /// Its copy of the universal fallback theme, searched below
    /// `<data dir>/<app>/icons` and `theme_base_dir`, is appended to the tree
    /// together with its parents. Existing nodes keep their order.
    pub fn add_app_dir(&mut self, app_name: &str, theme_base_dir: Option<&Path>) {
        self.process_changes();
        if app_name.is_empty() || self.app_dirs.iter().any(|(app, _)| app == app_name) {
            return;
        }
        self.app_dirs
            .push((app_name.to_string(), theme_base_dir.map(Path::to_path_buf)));

        if let Some(themes) = self.themes.as_mut() {
            themes
                .tree
                .add_app_themes(app_name, theme_base_dir, &self.subsystem.tree_context());
            themes
                .user_dirs
                .extend(self.subsystem.search().app_pics_dirs(app_name));
        }
    }

    /// Switch to another application name and search paths and reload.
    pub fn reconfigure(&mut self, app_name: &str, extra_search_paths: Vec<PathBuf>) {
        self.app_name = app_name.to_string();
        self.extra_search_paths = extra_search_paths;
        self.subsystem.reconfigure();
        self.reset();
    }

    /// Recolor color-scheme aware icons with `palette` instead of the
    /// configured colors.
    pub fn set_custom_palette(&mut self, palette: ColorPalette) {
        self.custom_palette = Some(palette);
        self.subsystem.reconfigure();
        self.reset();
    }

    pub fn custom_palette(&self) -> Option<ColorPalette> {
        self.custom_palette
    }

    /// Return to the configured colors.
    pub fn reset_palette(&mut self) {
        self.custom_palette = None;
        self.subsystem.reconfigure();
        self.reset();
    }

    fn reset(&mut self) {
        self.themes = None;
        self.cache.clear();
        self.availability.clear();
        self.governor.reset();
    }

    // ========================================================================
    // Change notification
    // ========================================================================

    /// Announce a change to every loader, including this one.
    ///
    /// This loader picks the change up at its next operation.
    pub fn emit_change(&self, group: IconGroup) {
        self.subsystem.emit_change(group);
    }

    /// Handle pending change notifications.
    ///
    /// Runs at the start of every operation. When changes are pending the
    /// loader drops its themes and caches and emits
    /// [`IconLoader::icon_changed`] once per changed group. Returns whether
    /// anything changed.
    pub fn process_changes(&mut self) -> bool {
        let groups = self.subscription.drain();
        if groups.is_empty() {
            return false;
        }

        tracing::debug!(target: "horizon_icons::loader", app = %self.app_name, ?groups, "Reloading after icon change");
        self.subsystem.reconfigure();
        self.reset();
        for group in groups {
            self.icon_changed.emit(group);
        }
        true
    }

    /// Emitted after this loader reloaded because icons of a group changed.
    pub fn icon_changed(&self) -> &Signal<IconGroup> {
        &self.icon_changed
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Names tried, in order, when looking up `name` in one theme.
///
/// The last dash separated part is dropped repeatedly. A `-symbolic` suffix
/// is kept on every shorter name after the plain base name. Mimetype names
/// that shrink to a media type end with `<media>-x-generic`.
pub(crate) fn fallback_names(name: &str) -> Vec<String> {
    let mut names = vec![name.to_string()];
    if name.ends_with(GENERIC_SUFFIX) {
        return names;
    }

    let symbolic = name.ends_with(SYMBOLIC_SUFFIX);
    let mut current = if symbolic {
        let base = &name[..name.len() - SYMBOLIC_SUFFIX.len()];
        names.push(base.to_string());
        base.to_string()
    } else {
        name.to_string()
    };

    loop {
        if !symbolic && MEDIA_ROOTS.contains(&current.as_str()) {
            names.push(format!("{current}{GENERIC_SUFFIX}"));
            break;
        }

        // `x-content` and `x-epoc` are never split
        let Some(index) = current.rfind('-').filter(|index| *index > 1) else {
            break;
        };
        current.truncate(index);
        if let Some(stripped) = current.strip_suffix("-x") {
            current.truncate(stripped.len());
        }
        if current.is_empty() {
            break;
        }

        names.push(if symbolic {
            format!("{current}{SYMBOLIC_SUFFIX}")
        } else {
            current.clone()
        });
    }

    names
}

fn find_in_tree(
    tree: &ThemeTree,
    name: &str,
    size: u32,
    scale: f32,
    rejected: &HashSet<PathBuf>,
) -> Option<PathBuf> {
    let names = fallback_names(name);
    tree.iter().find_map(|node| {
        names.iter().find_map(|candidate| {
            node.theme.icon_path_by_name_excluding(
                candidate,
                size,
                MatchType::Best,
                scale,
                rejected,
            )
        })
    })
}

fn locate_in(
    dirs: &[PathBuf],
    name: &str,
    extensions: &[&str],
    rejected: &HashSet<PathBuf>,
) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        extensions
            .iter()
            .map(|ext| dir.join(format!("{name}{ext}")))
            .find(|path| path.is_file() && !rejected.contains(path))
    })
}

/// Pixel size of overlays drawn on an icon of `icon_size` logical pixels.
fn overlay_size(icon_size: u32) -> u32 {
    match icon_size {
        0..32 => 8,
        32..=48 => 16,
        49..=96 => 22,
        97..256 => 32,
        _ => 64,
    }
}

fn device_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        ((width as f32 * scale).round() as u32).max(1),
        ((height as f32 * scale).round() as u32).max(1),
    )
}

/// Open an icon file, splicing in `stylesheet` for SVGs when given.
fn open_reader(path: &Path, stylesheet: Option<&str>) -> RenderResult<IconReader> {
    if let Some(stylesheet) = stylesheet
        && is_svg_path(path)
    {
        let data = recolor_svg_file(path, stylesheet);
        if !data.is_empty() {
            match IconReader::from_svg_bytes(&data) {
                Ok(reader) => return Ok(reader),
                Err(e) => {
                    tracing::debug!(target: "horizon_icons::loader", path = %path.display(), error = %e, "Recolored SVG did not parse");
                }
            }
        }
    }
    IconReader::open(path)
}

fn render_file(
    path: &Path,
    stylesheet: Option<&str>,
    logical: Option<(u32, u32)>,
    scale: f32,
) -> RenderResult<Pixmap> {
    let reader = open_reader(path, stylesheet)?;
    render_reader(&reader, logical, scale)
}

/// Render at `logical * scale` keeping aspect, centered on a transparent
/// canvas, or at natural size without a logical size.
fn render_reader(reader: &IconReader, logical: Option<(u32, u32)>, scale: f32) -> RenderResult<Pixmap> {
    match logical {
        Some((width, height)) => {
            let (width, height) = device_size(width, height, scale);
            Ok(reader.decode_fitted(width, height)?.centered_in(width, height))
        }
        None => reader.decode(),
    }
}

struct CacheKeyParts<'a> {
    name: &'a str,
    user: bool,
    size: Option<(u32, u32)>,
    scale: f32,
    overlays: &'a [String],
    fingerprint: &'a str,
    palette_id: &'a str,
    selected: bool,
}

/// Compose the cache key covering every input that changes the pixels.
fn cache_key(parts: &CacheKeyParts<'_>) -> String {
    let prefix = if parts.user { "$kicou_" } else { "$kico_" };
    let size = match parts.size {
        Some((w, h)) if w == h => w.to_string(),
        Some((w, h)) => format!("{w}x{h}"),
        None => "0".to_string(),
    };
    format!(
        "{prefix}{}_{size}@{:.1}_{}{}_{}{}",
        parts.name,
        parts.scale,
        parts.overlays.join("_"),
        parts.fingerprint,
        parts.palette_id,
        if parts.selected { "_selected" } else { "" },
    )
}
