//! Mimetype to generic icon mapping from `mime/generic-icons` files.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Maps mimetype icon names (`text-plain`) to generic icon names
/// (`text-x-generic`).
#[derive(Debug, Clone, Default)]
pub struct GenericIconRegistry {
    icons: HashMap<String, String>,
}

impl GenericIconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file, given highest priority first.
    ///
    /// Unreadable files are skipped with a warning.
    pub fn load<P: AsRef<Path>>(files: &[P]) -> Self {
        let mut registry = Self::new();
        // Lower priority files first so later inserts override them
        for file in files.iter().rev() {
            let file = file.as_ref();
            match std::fs::read_to_string(file) {
                Ok(content) => registry.parse_into(&content),
                Err(e) => {
                    let err = Error::io(file, e);
                    tracing::warn!(target: "horizon_icons::theme", error = %err, "Skipping generic icons file");
                }
            }
        }
        tracing::debug!(target: "horizon_icons::theme", entries = registry.len(), "Loaded generic icon mappings");
        registry
    }

    /// Parse a single mapping file.
    pub fn parse(content: &str) -> Self {
        let mut registry = Self::new();
        registry.parse_into(content);
        registry
    }

    /// Read a single mapping file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Self::parse(&content))
    }

    fn parse_into(&mut self, content: &str) {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((mime, icon)) = line.split_once(':') else {
                continue;
            };
            let (mime, icon) = (mime.trim(), icon.trim());
            if mime.is_empty() || icon.is_empty() {
                continue;
            }
            self.icons.insert(mime.replace('/', "-"), icon.to_string());
        }
    }

    /// The generic icon for an icon name such as `text-x-python`.
    pub fn get(&self, icon_name: &str) -> Option<&str> {
        self.icons.get(icon_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let registry = GenericIconRegistry::parse(
            "# comment\n\ntext/x-python:text-x-script\napplication/pdf:x-office-document\nbroken line\n",
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("text-x-python"), Some("text-x-script"));
        assert_eq!(registry.get("application-pdf"), Some("x-office-document"));
        assert_eq!(registry.get("text/x-python"), None);
    }

    #[test]
    fn test_higher_priority_file_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let high = tmp.path().join("high");
        let low = tmp.path().join("low");
        std::fs::write(&high, "text/plain:high-icon\n").unwrap();
        std::fs::write(&low, "text/plain:low-icon\ntext/html:html-icon\n").unwrap();

        let registry = GenericIconRegistry::load(&[&high, &low]);
        assert_eq!(registry.get("text-plain"), Some("high-icon"));
        assert_eq!(registry.get("text-html"), Some("html-icon"));
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let registry = GenericIconRegistry::load(&[tmp.path().join("missing")]);
        assert!(registry.is_empty());
        assert!(GenericIconRegistry::from_file(tmp.path().join("missing")).is_err());
    }
}
