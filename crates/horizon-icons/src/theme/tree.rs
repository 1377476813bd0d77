//! The ordered chain of themes visited for every lookup.

use std::collections::HashSet;
use std::path::Path;

use crate::theme::icon_theme::IconTheme;
use crate::theme::search::ThemeSearch;

/// Theme every other theme ultimately falls back to.
pub const UNIVERSAL_FALLBACK_THEME: &str = "hicolor";

/// Names and search roots needed to build a [`ThemeTree`].
#[derive(Debug, Clone, Copy)]
pub struct TreeContext<'a> {
    pub search: &'a ThemeSearch,
    /// Used when the current theme is invalid, and for `Inherits=default`
    pub default_theme: &'a str,
    /// Curated theme inserted before the universal fallback
    pub fallback_theme: Option<&'a str>,
}

impl TreeContext<'_> {
    fn load(&self, name: &str, app: Option<&str>, base_hint: Option<&Path>) -> IconTheme {
        IconTheme::load(name, self.search, app, base_hint, self.default_theme)
    }
}

/// One theme in the tree, optionally scoped to an application.
#[derive(Debug, Clone)]
pub struct ThemeNode {
    pub theme: IconTheme,
    /// Set for nodes added by [`ThemeTree::add_app_themes`]
    pub app_name: Option<String>,
}

/// Themes in lookup order.
///
/// The order is the current theme, then its parents depth first, then the
/// fallback theme and the universal fallback. Application chains added later
/// are appended without reordering existing nodes. A theme appears at most
/// once per application scope.
#[derive(Debug, Clone, Default)]
pub struct ThemeTree {
    nodes: Vec<ThemeNode>,
    keys: HashSet<(String, String)>,
}

impl ThemeTree {
    /// Build the tree rooted at `current`.
    ///
    /// If `current` is not a valid theme the default theme is used instead.
    pub fn build(current: &str, ctx: &TreeContext<'_>) -> Self {
        let mut tree = Self::default();

        let mut root = ctx.load(current, None, None);
        if !root.is_valid() && current != ctx.default_theme {
            tracing::debug!(target: "horizon_icons::theme", theme = current, fallback = ctx.default_theme, "Current theme is invalid");
            root = ctx.load(ctx.default_theme, None, None);
        }

        if root.is_valid() {
            let parents = root.inherits().to_vec();
            tree.push(root, None);
            tree.add_inherited(&parents, None, None, ctx);
        } else {
            tracing::warn!(target: "horizon_icons::theme", theme = ctx.default_theme, "Default icon theme is not installed");
        }

        tree.add_base_themes(None, None, ctx);
        tree
    }

    /// Append the theme chain of an application.
    ///
    /// The application's copy of the universal fallback (or the default
    /// theme if it has none) comes first, followed by the usual base themes,
    /// all scoped to `app_name`.
    pub fn add_app_themes(&mut self, app_name: &str, base_dir: Option<&Path>, ctx: &TreeContext<'_>) {
        let app = Some(app_name);
        let mut theme = ctx.load(UNIVERSAL_FALLBACK_THEME, app, base_dir);
        if !theme.is_valid() {
            theme = ctx.load(ctx.default_theme, app, base_dir);
        }

        if theme.is_valid() && !self.contains(theme.internal_name(), app) {
            let parents = theme.inherits().to_vec();
            self.push(theme, app);
            self.add_inherited(&parents, app, base_dir, ctx);
        }

        self.add_base_themes(app, base_dir, ctx);
    }

    fn add_base_themes(&mut self, app: Option<&str>, base_dir: Option<&Path>, ctx: &TreeContext<'_>) {
        if let Some(fallback) = ctx.fallback_theme.filter(|name| !name.is_empty()) {
            self.add_by_name(fallback, app, base_dir, ctx);
        }
        self.add_by_name(UNIVERSAL_FALLBACK_THEME, app, base_dir, ctx);
    }

    fn add_inherited(
        &mut self,
        parents: &[String],
        app: Option<&str>,
        base_dir: Option<&Path>,
        ctx: &TreeContext<'_>,
    ) {
        for parent in parents {
            // The universal fallback always goes last
            if parent == UNIVERSAL_FALLBACK_THEME {
                continue;
            }
            self.add_by_name(parent, app, base_dir, ctx);
        }
    }

    fn add_by_name(&mut self, name: &str, app: Option<&str>, base_dir: Option<&Path>, ctx: &TreeContext<'_>) {
        if self.contains(name, app) {
            return;
        }

        let theme = ctx.load(name, app, base_dir);
        if !theme.is_valid() {
            tracing::debug!(target: "horizon_icons::theme", theme = name, "Skipping invalid theme");
            return;
        }

        let parents = theme.inherits().to_vec();
        self.push(theme, app);
        self.add_inherited(&parents, app, base_dir, ctx);
    }

    fn push(&mut self, theme: IconTheme, app: Option<&str>) {
        self.keys.insert(key(theme.internal_name(), app));
        self.nodes.push(ThemeNode {
            theme,
            app_name: app.map(str::to_string),
        });
    }

    /// Whether `name` is already part of the tree for the given scope.
    pub fn contains(&self, name: &str, app: Option<&str>) -> bool {
        self.keys.contains(&key(name, app))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThemeNode> {
        self.nodes.iter()
    }

    /// The theme the tree was built from.
    pub fn root(&self) -> Option<&IconTheme> {
        self.nodes.first().map(|node| &node.theme)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Internal names of all nodes, in lookup order.
    pub fn theme_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|node| node.theme.internal_name().to_string())
            .collect()
    }
}

fn key(name: &str, app: Option<&str>) -> (String, String) {
    (name.to_string(), app.unwrap_or_default().to_string())
}
