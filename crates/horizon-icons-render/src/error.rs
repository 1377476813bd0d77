//! Error types for the icon render crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while decoding or transforming icon images.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Reading an icon file from disk failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A raster image could not be decoded.
    #[error("failed to decode image: {0}")]
    ImageLoad(String),

    /// An SVG document could not be parsed or rewritten.
    #[error("failed to process SVG: {0}")]
    Svg(String),

    /// Invalid image dimensions (zero width or height).
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

impl RenderError {
    /// Create an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
