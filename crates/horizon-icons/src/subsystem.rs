//! Process wide state shared by all icon loaders.
//!
//! The host application calls [`init_icon_subsystem`] once before creating
//! any [`IconLoader`](crate::IconLoader). The subsystem owns the search
//! roots, the global settings, the generic icon registry and the
//! [`ChangeBus`]. Loaders created without an explicit subsystem use the
//! registered one, or one configured from the environment when none was
//! registered.
//!
//! # Example
//!
//! ```no_run
//! use horizon_icons::{IconLoader, SubsystemConfig, init_icon_subsystem};
//!
//! init_icon_subsystem(
//!     SubsystemConfig::from_environment()
//!         .with_fallback_theme("breeze")
//!         .with_resource_root("/opt/myapp/icons"),
//! )
//! .expect("icon subsystem initialized twice");
//!
//! let mut loader = IconLoader::new("myapp", Vec::new());
//! let icon = loader.load_icon("document-open", Default::default(), 0, Default::default(), &[], false);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::availability::{Clock, DEFAULT_RECHECK_INTERVAL, MonotonicClock};
use crate::bus::{ChangeBus, ChangeSubscription};
use crate::cache::DEFAULT_MAX_COST;
use crate::config::{Settings, SettingsSource};
use crate::error::{Error, Result};
use crate::theme::{
    GenericIconRegistry, IconTheme, ThemeSearch, TreeContext, UNIVERSAL_FALLBACK_THEME,
    default_data_dirs,
};
use crate::types::IconGroup;

/// Theme used when nothing else is configured.
pub const DEFAULT_THEME: &str = "breeze";

/// Settings section holding the theme name and group sizes.
pub const ICONS_SECTION: &str = "Icons";

static SUBSYSTEM: RwLock<Option<Arc<IconSubsystem>>> = parking_lot::const_rwlock(None);

/// Configuration for the icon subsystem.
#[derive(Debug, Clone)]
pub struct SubsystemConfig {
    /// Generic data directories, highest priority first.
    pub data_dirs: Vec<PathBuf>,
    /// Theme roots searched before the data directories.
    pub resource_roots: Vec<PathBuf>,
    /// Theme roots searched after `<data dir>/icons`, such as `~/.icons`.
    pub legacy_dirs: Vec<PathBuf>,
    /// Directories probed for loose `<name>.<ext>` files when no theme has
    /// the icon.
    pub fallback_search_paths: Vec<PathBuf>,
    pub default_theme: String,
    /// Theme inserted before the universal fallback in every tree.
    pub fallback_theme: Option<String>,
    /// Theme reported by the platform integration.
    pub platform_theme: Option<String>,
    pub global_settings: SettingsSource,
    /// Directory holding `<app>rc` application settings files.
    pub app_settings_dir: Option<PathBuf>,
    /// In-memory application settings, taking precedence over files.
    pub app_settings: HashMap<String, Settings>,
    /// Directory holding the `favicons/` subdirectory.
    pub favicon_dir: Option<PathBuf>,
    pub recheck_interval: Duration,
    pub cache_max_cost: usize,
    pub clock: Arc<dyn Clock>,
}

impl Default for SubsystemConfig {
    fn default() -> Self {
        Self {
            data_dirs: Vec::new(),
            resource_roots: Vec::new(),
            legacy_dirs: Vec::new(),
            fallback_search_paths: Vec::new(),
            default_theme: DEFAULT_THEME.to_string(),
            fallback_theme: None,
            platform_theme: None,
            global_settings: SettingsSource::None,
            app_settings_dir: None,
            app_settings: HashMap::new(),
            favicon_dir: None,
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
            cache_max_cost: DEFAULT_MAX_COST,
            clock: Arc::new(MonotonicClock::new()),
        }
    }
}

impl SubsystemConfig {
    /// Configuration for the standard platform locations.
    pub fn from_environment() -> Self {
        let config_dir = dirs::config_dir();
        Self {
            data_dirs: default_data_dirs(),
            legacy_dirs: dirs::home_dir()
                .map(|home| vec![home.join(".icons")])
                .unwrap_or_default(),
            global_settings: config_dir
                .as_ref()
                .map(|dir| SettingsSource::File(dir.join("kdeglobals")))
                .unwrap_or_default(),
            app_settings_dir: config_dir,
            favicon_dir: dirs::cache_dir(),
            ..Self::default()
        }
    }

    /// Configuration that only looks at the given data directories.
    pub fn with_data_dirs(data_dirs: Vec<PathBuf>) -> Self {
        Self {
            data_dirs,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_roots.push(root.into());
        self
    }

    #[must_use]
    pub fn with_legacy_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.legacy_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_fallback_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fallback_search_paths.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_default_theme(mut self, name: impl Into<String>) -> Self {
        self.default_theme = name.into();
        self
    }

    #[must_use]
    pub fn with_fallback_theme(mut self, name: impl Into<String>) -> Self {
        self.fallback_theme = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_platform_theme(mut self, name: impl Into<String>) -> Self {
        self.platform_theme = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_global_settings(mut self, source: impl Into<SettingsSource>) -> Self {
        self.global_settings = source.into();
        self
    }

    #[must_use]
    pub fn with_app_settings(mut self, app_name: impl Into<String>, settings: Settings) -> Self {
        self.app_settings.insert(app_name.into(), settings);
        self
    }

    #[must_use]
    pub fn with_favicon_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.favicon_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_recheck_interval(mut self, interval: Duration) -> Self {
        self.recheck_interval = interval;
        self
    }

    #[must_use]
    pub fn with_cache_max_cost(mut self, max_cost: usize) -> Self {
        self.cache_max_cost = max_cost;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[derive(Debug, Default)]
struct SharedState {
    override_theme: Option<String>,
    /// Current theme ignoring application settings
    current_theme: Option<String>,
    theme_list: Option<Vec<String>>,
    global_settings: Option<Settings>,
}

impl SharedState {
    /// Forget everything read from disk. The test override stays.
    fn clear_caches(&mut self) {
        self.current_theme = None;
        self.theme_list = None;
        self.global_settings = None;
    }
}

/// Shared icon state for one process.
#[derive(Debug)]
pub struct IconSubsystem {
    config: SubsystemConfig,
    search: ThemeSearch,
    bus: ChangeBus,
    generic_icons: OnceLock<GenericIconRegistry>,
    state: Arc<Mutex<SharedState>>,
}

impl IconSubsystem {
    pub fn new(config: SubsystemConfig) -> Self {
        let mut search = ThemeSearch::new(config.resource_roots.clone(), config.data_dirs.clone());
        for dir in &config.legacy_dirs {
            search = search.with_legacy_dir(dir.clone());
        }

        // Changes published straight on the bus invalidate shared state too
        let state = Arc::new(Mutex::new(SharedState::default()));
        let bus = ChangeBus::new();
        let bus_state = Arc::clone(&state);
        bus.changed().connect(move |_| bus_state.lock().clear_caches());

        Self {
            config,
            search,
            bus,
            generic_icons: OnceLock::new(),
            state,
        }
    }

    /// The registered subsystem, registering one configured from the
    /// environment if there is none.
    pub fn global() -> Arc<Self> {
        if let Some(subsystem) = Self::try_global() {
            return subsystem;
        }
        SUBSYSTEM
            .write()
            .get_or_insert_with(|| {
                tracing::debug!(target: "horizon_icons::subsystem", "Creating icon subsystem from environment");
                Arc::new(Self::new(SubsystemConfig::from_environment()))
            })
            .clone()
    }

    /// The registered subsystem, if any.
    pub fn try_global() -> Option<Arc<Self>> {
        SUBSYSTEM.read().clone()
    }

    pub fn config(&self) -> &SubsystemConfig {
        &self.config
    }

    pub fn search(&self) -> &ThemeSearch {
        &self.search
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub(crate) fn subscribe(&self) -> ChangeSubscription {
        self.bus.subscribe()
    }

    pub fn default_theme_name(&self) -> &str {
        &self.config.default_theme
    }

    pub(crate) fn tree_context(&self) -> TreeContext<'_> {
        TreeContext {
            search: &self.search,
            default_theme: &self.config.default_theme,
            fallback_theme: self.config.fallback_theme.as_deref(),
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// The global settings, read on first use after each reconfiguration.
    pub fn global_settings(&self) -> Settings {
        let mut state = self.state.lock();
        state
            .global_settings
            .get_or_insert_with(|| self.config.global_settings.load())
            .clone()
    }

    /// Settings for one application; empty when none exist.
    pub fn app_settings(&self, app_name: &str) -> Settings {
        if app_name.is_empty() {
            return Settings::new();
        }
        if let Some(settings) = self.config.app_settings.get(app_name) {
            return settings.clone();
        }
        match &self.config.app_settings_dir {
            Some(dir) => Settings::load_or_default(dir.join(format!("{app_name}rc"))),
            None => Settings::new(),
        }
    }

    // ========================================================================
    // Themes
    // ========================================================================

    /// Name of the theme to use for an application.
    ///
    /// The first usable name wins: the test override, the application's
    /// `[Icons] Theme`, the platform theme, the global `[Icons] Theme`, and
    /// finally the default theme. Empty names and the universal fallback are
    /// never used.
    pub fn current_theme(&self, app_settings: &Settings) -> String {
        if let Some(name) = self.state.lock().override_theme.clone() {
            return name;
        }
        if let Some(name) = app_settings
            .get_string(ICONS_SECTION, "Theme")
            .filter(|name| is_usable_theme(name))
        {
            return name;
        }

        if let Some(name) = self.state.lock().current_theme.clone() {
            return name;
        }

        let global = self.global_settings();
        let name = self
            .config
            .platform_theme
            .clone()
            .filter(|name| is_usable_theme(name))
            .or_else(|| {
                global
                    .get_string(ICONS_SECTION, "Theme")
                    .filter(|name| is_usable_theme(name))
            })
            .unwrap_or_else(|| self.config.default_theme.clone());

        tracing::debug!(target: "horizon_icons::subsystem", theme = %name, "Resolved current icon theme");
        self.state.lock().current_theme = Some(name.clone());
        name
    }

    /// Force a theme regardless of settings, or clear the override.
    ///
    /// Every loader is notified through the change bus.
    pub fn force_theme_for_tests(&self, theme: Option<&str>) {
        self.state.lock().override_theme = theme.map(str::to_string);
        self.emit_change(IconGroup::Desktop);
    }

    /// Internal names of every installed theme.
    pub fn list_themes(&self) -> Vec<String> {
        if let Some(list) = self.state.lock().theme_list.clone() {
            return list;
        }
        let list = self.search.theme_names();
        self.state.lock().theme_list = Some(list.clone());
        list
    }

    /// Load a theme by name using the subsystem's search roots.
    pub fn load_theme(&self, name: &str) -> IconTheme {
        IconTheme::load(name, &self.search, None, None, &self.config.default_theme)
    }

    /// Generic icon name for a mimetype icon name.
    pub fn generic_icon(&self, icon_name: &str) -> Option<String> {
        self.generic_icons
            .get_or_init(|| GenericIconRegistry::load(&self.search.generic_icon_files()))
            .get(icon_name)
            .map(str::to_string)
    }

    // ========================================================================
    // Changes
    // ========================================================================

    /// Drop the cached theme name, theme list and global settings.
    pub fn reconfigure(&self) {
        self.state.lock().clear_caches();
    }

    /// Announce that icons of `group` changed; every loader reloads.
    ///
    /// The shared caches are dropped by the bus' `changed` connection made
    /// in [`IconSubsystem::new`].
    pub fn emit_change(&self, group: IconGroup) {
        self.bus.emit_change(group);
    }
}

fn is_usable_theme(name: &str) -> bool {
    !name.is_empty() && name != UNIVERSAL_FALLBACK_THEME
}

/// Register the process wide subsystem.
///
/// Fails with [`Error::AlreadyInitialized`] if a subsystem is registered,
/// including one created implicitly by [`IconSubsystem::global`].
pub fn init_icon_subsystem(config: SubsystemConfig) -> Result<()> {
    let mut slot = SUBSYSTEM.write();
    if slot.is_some() {
        return Err(Error::AlreadyInitialized);
    }
    *slot = Some(Arc::new(IconSubsystem::new(config)));
    tracing::info!(target: "horizon_icons::subsystem", "Icon subsystem initialized");
    Ok(())
}

/// Unregister the process wide subsystem.
///
/// Existing loaders keep the subsystem they were created with. Returns
/// `false` if none was registered.
pub fn shutdown_icon_subsystem() -> bool {
    let removed = SUBSYSTEM.write().take().is_some();
    if removed {
        tracing::info!(target: "horizon_icons::subsystem", "Icon subsystem shut down");
    }
    removed
}
