//! Error types for the icon subsystem.

use std::path::PathBuf;

/// Result type alias for icon subsystem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the icon subsystem.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error.
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings or theme descriptor parse error.
    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    /// Image decode or render error.
    #[error(transparent)]
    Render(#[from] horizon_icons_render::RenderError),

    /// The process-wide subsystem was initialized twice.
    #[error("icon subsystem is already initialized")]
    AlreadyInitialized,
}

impl Error {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a parse error.
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
