//! Path policy: well-formed identities and folder-derived categories.

use std::path::PathBuf;
use wikigraph_core::{DocumentId, Error, IndexConfig, PathPolicy, PathValidator, Result};

/// Derives a document's category from its top-level folder.
///
/// `projects/web/x.md` is in category `projects`; documents at the root have
/// none.
#[derive(Debug, Clone, Default)]
pub struct TopSegmentPolicy {
    root: Option<PathBuf>,
    /// Allowed document extensions; empty allows any
    extensions: Vec<String>,
}

impl TopSegmentPolicy {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            root: None,
            extensions: config.extensions.clone(),
        }
    }

    /// Also check containment against a concrete root directory
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

impl PathPolicy for TopSegmentPolicy {
    fn validate(&self, id: &DocumentId) -> Result<()> {
        let path = id.as_str();
        if path.is_empty() {
            return Err(Error::invalid_path(path, "empty path"));
        }

        if let Some(ch) = path.chars().find(|c| c.is_control()) {
            return Err(Error::invalid_path(
                path,
                format!("contains control character {:?}", ch),
            ));
        }

        for segment in path.split('/') {
            match segment {
                "" => return Err(Error::invalid_path(path, "empty path segment")),
                "." | ".." => {
                    return Err(Error::invalid_path(path, "relative segments are not allowed"));
                }
                _ => {}
            }
        }

        if !self.extensions.is_empty() {
            let allowed = id
                .extension()
                .is_some_and(|ext| self.extensions.iter().any(|e| e == ext));
            if !allowed {
                return Err(Error::invalid_path(
                    path,
                    format!("extension must be one of: {}", self.extensions.join(", ")),
                ));
            }
        }

        if let Some(root) = &self.root {
            PathValidator::validate_path_in_root(root, path)?;
        }

        Ok(())
    }

    fn category_of(&self, id: &DocumentId) -> Option<String> {
        id.top_segment().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TopSegmentPolicy {
        TopSegmentPolicy::new(&IndexConfig::default())
    }

    #[test]
    fn test_valid_paths() {
        let policy = policy();
        assert!(policy.validate(&DocumentId::new("a.md")).is_ok());
        assert!(policy.validate(&DocumentId::new("projects/web/x.md")).is_ok());
    }

    #[test]
    fn test_rejected_paths() {
        let policy = policy();
        for bad in ["", "../x.md", "a/../../x.md", "a//b.md", "a/./b.md", "notes/x.txt", "notes/x"] {
            let err = policy.validate(&DocumentId::new(bad)).unwrap_err();
            assert!(matches!(err, Error::InvalidPath { .. }), "{}", bad);
        }
        assert!(policy.validate(&DocumentId::new("bad\u{0}.md")).is_err());
    }

    #[test]
    fn test_any_extension_when_unconfigured() {
        let policy = TopSegmentPolicy::default();
        assert!(policy.validate(&DocumentId::new("notes/x")).is_ok());
    }

    #[test]
    fn test_category_of() {
        let policy = policy();
        assert_eq!(
            policy.category_of(&DocumentId::new("projects/web/x.md")).as_deref(),
            Some("projects")
        );
        assert_eq!(policy.category_of(&DocumentId::new("x.md")), None);
    }
}
