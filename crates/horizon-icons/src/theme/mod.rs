//! Icon themes on disk.
//!
//! A theme is a directory holding a descriptor (`index.theme`) and one
//! subdirectory per size/context combination. [`ThemeSearch`] finds themes,
//! [`IconTheme`] parses one and picks the best file for a requested size, and
//! [`ThemeTree`] chains a theme with its parents and the fallbacks.

mod directory;
mod generic;
mod icon_theme;
mod search;
mod tree;

pub use directory::{ICON_EXTENSIONS, SizeClass, ThemeDir, has_icon_extension, strip_icon_extension};
pub use generic::GenericIconRegistry;
pub use icon_theme::{DEFAULT_EXTENSIONS, IconTheme};
pub use search::{ThemeSearch, default_data_dirs};
pub use tree::{ThemeNode, ThemeTree, TreeContext, UNIVERSAL_FALLBACK_THEME};
