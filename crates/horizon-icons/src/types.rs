//! Core enumerations and the request type shared across the icon subsystem.

use crate::palette::ColorPalette;

/// A UI location with its own default size and effect profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IconGroup {
    /// No group: the size must be given explicitly.
    NoGroup,
    #[default]
    Desktop,
    Toolbar,
    MainToolbar,
    Small,
    Panel,
    Dialog,
    /// Application specific icons found outside of themes.
    User,
}

impl IconGroup {
    /// Groups that carry a default size and an effect profile.
    pub const ALL: [IconGroup; 6] = [
        IconGroup::Desktop,
        IconGroup::Toolbar,
        IconGroup::MainToolbar,
        IconGroup::Small,
        IconGroup::Panel,
        IconGroup::Dialog,
    ];

    /// Position within [`IconGroup::ALL`], `None` for the special groups.
    pub fn index(self) -> Option<usize> {
        match self {
            IconGroup::Desktop => Some(0),
            IconGroup::Toolbar => Some(1),
            IconGroup::MainToolbar => Some(2),
            IconGroup::Small => Some(3),
            IconGroup::Panel => Some(4),
            IconGroup::Dialog => Some(5),
            IconGroup::NoGroup | IconGroup::User => None,
        }
    }

    /// Name used as prefix in settings keys and sections.
    pub fn name(self) -> &'static str {
        match self {
            IconGroup::NoGroup => "NoGroup",
            IconGroup::Desktop => "Desktop",
            IconGroup::Toolbar => "Toolbar",
            IconGroup::MainToolbar => "MainToolbar",
            IconGroup::Small => "Small",
            IconGroup::Panel => "Panel",
            IconGroup::Dialog => "Dialog",
            IconGroup::User => "User",
        }
    }

    /// Built-in default pixel size; zero for the special groups.
    pub fn default_size(self) -> u32 {
        match self {
            IconGroup::Desktop | IconGroup::Dialog => 32,
            IconGroup::Toolbar | IconGroup::MainToolbar => 22,
            IconGroup::Small => 16,
            IconGroup::Panel => 48,
            IconGroup::NoGroup | IconGroup::User => 0,
        }
    }

    /// Integer representation used on the change bus.
    pub fn to_raw(self) -> i32 {
        match self {
            IconGroup::NoGroup => -1,
            IconGroup::User => 7,
            group => group.index().map_or(0, |i| i as i32),
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            -1 => Some(IconGroup::NoGroup),
            0..=5 => Some(IconGroup::ALL[raw as usize]),
            7 => Some(IconGroup::User),
            _ => None,
        }
    }

    /// Like [`IconGroup::from_raw`], but maps unknown values to `Desktop`.
    pub fn from_raw_or_default(raw: i32) -> Self {
        Self::from_raw(raw).unwrap_or_else(|| {
            tracing::warn!(target: "horizon_icons", raw, "Invalid icon group, using Desktop");
            IconGroup::Desktop
        })
    }
}

/// The interaction state an icon is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IconState {
    #[default]
    Default,
    Active,
    Disabled,
    Selected,
}

impl IconState {
    pub const ALL: [IconState; 4] = [
        IconState::Default,
        IconState::Active,
        IconState::Disabled,
        IconState::Selected,
    ];

    pub fn index(self) -> usize {
        match self {
            IconState::Default => 0,
            IconState::Active => 1,
            IconState::Disabled => 2,
            IconState::Selected => 3,
        }
    }

    /// Name used as prefix in effect settings keys.
    pub fn name(self) -> &'static str {
        match self {
            IconState::Default => "Default",
            IconState::Active => "Active",
            IconState::Disabled => "Disabled",
            IconState::Selected => "Selected",
        }
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Like [`IconState::from_raw`], but maps unknown values to `Default`.
    pub fn from_raw_or_default(raw: i32) -> Self {
        Self::from_raw(raw).unwrap_or_else(|| {
            tracing::warn!(target: "horizon_icons", raw, "Invalid icon state, using Default");
            IconState::Default
        })
    }
}

/// The semantic category of an icon directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IconContext {
    /// Matches every context.
    #[default]
    Any,
    Action,
    Application,
    Device,
    MimeType,
    Animation,
    Category,
    Emblem,
    Emote,
    International,
    Place,
    StatusIcon,
}

impl IconContext {
    /// Get the descriptor name of the context.
    pub fn as_str(&self) -> &'static str {
        match self {
            IconContext::Any => "Any",
            IconContext::Action => "Actions",
            IconContext::Application => "Applications",
            IconContext::Device => "Devices",
            IconContext::MimeType => "MimeTypes",
            IconContext::Animation => "Animations",
            IconContext::Category => "Categories",
            IconContext::Emblem => "Emblems",
            IconContext::Emote => "Emotes",
            IconContext::International => "International",
            IconContext::Place => "Places",
            IconContext::StatusIcon => "Status",
        }
    }

    /// Parse a context from a descriptor value or a directory name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "any" => Some(IconContext::Any),
            "actions" => Some(IconContext::Action),
            "applications" | "apps" => Some(IconContext::Application),
            "devices" => Some(IconContext::Device),
            "mimetypes" | "mime-types" => Some(IconContext::MimeType),
            // Legacy name for places
            "filesystems" => Some(IconContext::Place),
            "animations" => Some(IconContext::Animation),
            "categories" => Some(IconContext::Category),
            "emblems" => Some(IconContext::Emblem),
            "emotes" => Some(IconContext::Emote),
            "international" | "intl" => Some(IconContext::International),
            "places" => Some(IconContext::Place),
            "status" => Some(IconContext::StatusIcon),
            _ => None,
        }
    }

    /// Whether a directory of context `self` satisfies a query for `query`.
    pub fn matches(self, query: IconContext) -> bool {
        query == IconContext::Any || self == query
    }
}

/// How strictly directory sizes must match a requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchType {
    /// Only directories that accept the size exactly.
    Exact,
    /// Closest size, preferring larger icons at equal distance.
    #[default]
    Best,
    /// Any larger icon beats any smaller one.
    BestOrGreaterSize,
}

/// Parameters for loading an icon.
#[derive(Debug, Clone)]
pub struct IconRequest {
    /// Icon name, or an absolute path
    pub name: String,
    pub group: IconGroup,
    /// Logical size; `(0, 0)` means the group default
    pub size: (i32, i32),
    /// Device pixel ratio
    pub scale: f32,
    pub state: IconState,
    /// Up to four emblem names drawn in the corners
    pub overlays: Vec<String>,
    /// Palette for recoloring; the loader palette when `None`
    pub colors: Option<ColorPalette>,
    /// Return nothing instead of the "unknown" icon when not found
    pub can_return_null: bool,
}

impl IconRequest {
    /// Create a new request for an icon name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: IconGroup::Desktop,
            size: (0, 0),
            scale: 1.0,
            state: IconState::Default,
            overlays: Vec::new(),
            colors: None,
            can_return_null: false,
        }
    }

    pub fn with_group(mut self, group: IconGroup) -> Self {
        self.group = group;
        self
    }

    /// Set the group from its integer representation.
    pub fn with_raw_group(mut self, raw: i32) -> Self {
        self.group = IconGroup::from_raw_or_default(raw);
        self
    }

    /// Set a square size.
    pub fn with_size(mut self, size: i32) -> Self {
        self.size = (size, size);
        self
    }

    pub fn with_dimensions(mut self, width: i32, height: i32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_state(mut self, state: IconState) -> Self {
        self.state = state;
        self
    }

    /// Set the state from its integer representation.
    pub fn with_raw_state(mut self, raw: i32) -> Self {
        self.state = IconState::from_raw_or_default(raw);
        self
    }

    pub fn with_overlays<I, S>(mut self, overlays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overlays = overlays.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_colors(mut self, colors: ColorPalette) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Allow an empty result instead of the "unknown" icon.
    pub fn allow_null(mut self) -> Self {
        self.can_return_null = true;
        self
    }
}
