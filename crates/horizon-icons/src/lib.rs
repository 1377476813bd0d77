//! Freedesktop icon themes for Horizon Lattice.
//!
//! This crate turns icon names into pixmaps:
//!
//! - **Themes**: `index.theme` parsing, directory matching by size, scale and
//!   context, inheritance trees with `hicolor` as the universal fallback
//! - **Loading**: [`IconLoader`] with name fallbacks, generic mimetype icons,
//!   favicons, emblem overlays and an "unknown" placeholder
//! - **Effects**: per group and state effects configured in `<Group>Icons`
//!   settings sections
//! - **Recoloring**: color-scheme aware SVG icons follow a [`ColorPalette`]
//! - **Caching**: an LRU pixmap cache plus remembered misses that are
//!   rechecked after a while
//! - **Change notification**: a process wide [`ChangeBus`] reloading every
//!   loader when icon settings change
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use horizon_icons::{IconGroup, IconLoader, IconState, IconSubsystem, SubsystemConfig};
//!
//! let subsystem = Arc::new(IconSubsystem::new(
//!     SubsystemConfig::with_data_dirs(vec!["/usr/share".into()]).with_default_theme("breeze"),
//! ));
//! let mut loader = IconLoader::with_subsystem(subsystem, "myapp", Vec::new());
//!
//! let icon = loader
//!     .load_icon("edit-copy", IconGroup::Toolbar, 0, IconState::Active, &["emblem-locked"], false)
//!     .expect("unknown icon is returned when nothing matches");
//! println!("{:?}", icon.path);
//! ```

pub mod availability;
pub mod bus;
pub mod cache;
pub mod config;
pub mod effects;
pub mod loader;
pub mod palette;
pub mod signal;
pub mod subsystem;
pub mod theme;
pub mod types;

mod error;

pub use availability::{
    AgeGovernor, AvailabilityMap, Clock, DEFAULT_RECHECK_INTERVAL, ManualClock, MonotonicClock,
    Stopwatch,
};
pub use bus::{ChangeBus, ChangeSubscription};
pub use cache::{CachedPixmap, DEFAULT_MAX_COST, PixmapCache, PixmapCacheStats};
pub use config::{Settings, SettingsSource};
pub use effects::{EffectTable, NO_EFFECT_FINGERPRINT};
pub use error::{Error, Result};
pub use loader::{IconLoader, LoadedIcon};
pub use palette::ColorPalette;
pub use signal::{ConnectionId, Signal};
pub use subsystem::{
    DEFAULT_THEME, ICONS_SECTION, IconSubsystem, SubsystemConfig, init_icon_subsystem,
    shutdown_icon_subsystem,
};
pub use theme::{IconTheme, ThemeDir, ThemeSearch, ThemeTree, UNIVERSAL_FALLBACK_THEME};
pub use types::{IconContext, IconGroup, IconRequest, IconState, MatchType};

// Pixel level types live in the render crate
pub use horizon_icons_render::{Color, EffectKind, EffectSpec, Pixmap};
