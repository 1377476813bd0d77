//! Locating icon themes and loose icon files on disk.
//!
//! Themes are looked up by internal name below a list of roots, in this
//! order: application resource roots, `<data dir>/icons` for every data
//! directory, legacy `~/.icons`, and finally `<data dir>/pixmaps`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File names that describe a theme inside its root directory.
const DESCRIPTOR_NAMES: [&str; 2] = ["index.theme", "index.desktop"];

/// The set of directories searched for themes and icons.
#[derive(Debug, Clone, Default)]
pub struct ThemeSearch {
    resource_roots: Vec<PathBuf>,
    data_dirs: Vec<PathBuf>,
    legacy_dirs: Vec<PathBuf>,
}

impl ThemeSearch {
    /// Create a search over explicit resource roots and data directories.
    ///
    /// Data directories are ordered from highest to lowest priority.
    pub fn new(resource_roots: Vec<PathBuf>, data_dirs: Vec<PathBuf>) -> Self {
        Self {
            resource_roots,
            data_dirs,
            legacy_dirs: Vec::new(),
        }
    }

    /// Create a search over the platform's standard locations.
    pub fn from_environment() -> Self {
        let mut search = Self::new(Vec::new(), default_data_dirs());
        if let Some(home) = dirs::home_dir() {
            search.legacy_dirs.push(home.join(".icons"));
        }
        search
    }

    /// Add a legacy theme root searched after the standard icon roots.
    pub fn with_legacy_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.legacy_dirs.push(dir.into());
        self
    }

    pub fn data_dirs(&self) -> &[PathBuf] {
        &self.data_dirs
    }

    pub fn resource_roots(&self) -> &[PathBuf] {
        &self.resource_roots
    }

    /// Every root below which themes are looked up by name.
    pub fn theme_roots(&self) -> Vec<PathBuf> {
        let mut roots = self.resource_roots.clone();
        roots.extend(self.data_dirs.iter().map(|dir| dir.join("icons")));
        roots.extend(self.legacy_dirs.iter().cloned());
        roots.extend(self.data_dirs.iter().map(|dir| dir.join("pixmaps")));
        roots
    }

    /// Roots holding themes that belong to one application.
    pub fn app_theme_roots(&self, app_name: &str) -> Vec<PathBuf> {
        self.data_dirs
            .iter()
            .map(|dir| dir.join(app_name).join("icons"))
            .collect()
    }

    /// The first descriptor file found for `theme`.
    pub fn find_descriptor(&self, theme: &str) -> Option<PathBuf> {
        self.theme_roots().into_iter().find_map(|root| {
            DESCRIPTOR_NAMES
                .iter()
                .map(|name| root.join(theme).join(name))
                .find(|path| path.is_file())
        })
    }

    /// Existing directories that contribute icons to `theme`.
    ///
    /// Application roots and the optional base path hint come before the
    /// standard roots.
    pub fn theme_base_dirs(
        &self,
        theme: &str,
        app_name: Option<&str>,
        base_hint: Option<&Path>,
    ) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Some(app) = app_name.filter(|app| !app.is_empty()) {
            roots.extend(self.app_theme_roots(app));
            if let Some(hint) = base_hint {
                roots.push(hint.to_path_buf());
            }
        }
        roots.extend(self.theme_roots());

        let mut seen = HashSet::new();
        roots
            .into_iter()
            .map(|root| root.join(theme))
            .filter(|dir| dir.is_dir() && seen.insert(dir.clone()))
            .collect()
    }

    /// Names of all directories below the theme roots that carry a descriptor.
    ///
    /// The result is deduplicated and keeps the root order.
    pub fn theme_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();

        for root in self.theme_roots() {
            let Ok(entries) = std::fs::read_dir(&root) else {
                continue;
            };

            let mut found: Vec<(String, PathBuf)> = entries
                .flatten()
                .filter_map(|entry| Some((entry.file_name().into_string().ok()?, entry.path())))
                .collect();
            found.sort();

            for (name, path) in found {
                if name.starts_with("default.") {
                    continue;
                }
                let has_descriptor = DESCRIPTOR_NAMES.iter().any(|d| path.join(d).is_file());
                if has_descriptor && seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }

        names
    }

    /// Directories searched for loose, non-themed icons.
    ///
    /// `extra` paths come first, followed by `<data dir>/<app>/pics`,
    /// `<data dir>/icons` and `<data dir>/pixmaps`.
    pub fn user_icon_dirs(&self, app_name: &str, extra: &[PathBuf]) -> Vec<PathBuf> {
        let mut dirs = extra.to_vec();
        if !app_name.is_empty() {
            dirs.extend(self.app_pics_dirs(app_name));
        }
        dirs.extend(self.data_dirs.iter().map(|dir| dir.join("icons")));
        dirs.extend(self.data_dirs.iter().map(|dir| dir.join("pixmaps")));
        dirs
    }

    /// `<data dir>/<app>/pics` for every data directory.
    pub fn app_pics_dirs(&self, app_name: &str) -> Vec<PathBuf> {
        self.data_dirs
            .iter()
            .map(|dir| dir.join(app_name).join("pics"))
            .collect()
    }

    /// Every `mime/generic-icons` file, highest priority first.
    pub fn generic_icon_files(&self) -> Vec<PathBuf> {
        self.data_dirs
            .iter()
            .map(|dir| dir.join("mime").join("generic-icons"))
            .filter(|path| path.is_file())
            .collect()
    }
}

/// The platform's generic data directories, user directory first.
pub fn default_data_dirs() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(data_home) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        paths.push(PathBuf::from(data_home));
    } else if let Some(data) = dirs::data_dir() {
        paths.push(data);
    }

    #[cfg(unix)]
    {
        match std::env::var("XDG_DATA_DIRS") {
            Ok(data_dirs) if !data_dirs.is_empty() => {
                paths.extend(data_dirs.split(':').filter(|d| !d.is_empty()).map(PathBuf::from));
            }
            _ => {
                paths.push(PathBuf::from("/usr/local/share"));
                paths.push(PathBuf::from("/usr/share"));
            }
        }
    }

    #[cfg(windows)]
    {
        if let Ok(program_data) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(program_data));
        }
    }

    let mut seen = HashSet::new();
    paths.retain(|dir| seen.insert(dir.clone()));
    paths
}
