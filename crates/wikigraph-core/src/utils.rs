//! Path helpers shared by the index and the storage implementations

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` segments of a `/`-separated relative path.
///
/// Returns `None` when `..` would climb above the root.
pub fn normalize_relative(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Join a link target onto the directory of the linking document.
///
/// Targets starting with `/` are taken relative to the root instead.
pub fn join_relative(base_dir: &str, target: &str) -> Option<String> {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_relative(absolute);
    }
    if base_dir.is_empty() {
        normalize_relative(target)
    } else {
        normalize_relative(&format!("{}/{}", base_dir, target))
    }
}

/// Relative path from one directory to a file, both root-relative
pub fn relative_path(from_dir: &str, to: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to_parts: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = Vec::new();
    for _ in common..from.len() {
        out.push("..");
    }
    out.extend_from_slice(&to_parts[common..]);
    out.join("/")
}

/// Path validation helpers
pub struct PathValidator;

impl PathValidator {
    /// Ensure a root-relative path stays within `root` (prevents directory traversal)
    pub fn validate_path_in_root(root: &Path, path: &str) -> Result<PathBuf> {
        let candidate = Path::new(path);
        let mut normalized = PathBuf::new();

        for component in candidate.components() {
            match component {
                Component::Normal(name) => normalized.push(name),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(Error::invalid_path(path, "escapes the corpus root"));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::invalid_path(path, "must be relative to the corpus root"));
                }
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(Error::invalid_path(path, "empty path"));
        }

        Ok(root.join(normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("a/./b/../c.md").as_deref(), Some("a/c.md"));
        assert_eq!(normalize_relative("a//b").as_deref(), Some("a/b"));
        assert_eq!(normalize_relative("../x"), None);
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(
            join_relative("projects/web", "../archive/old").as_deref(),
            Some("projects/archive/old")
        );
        assert_eq!(join_relative("projects", "/notes/x").as_deref(), Some("notes/x"));
        assert_eq!(join_relative("", "x").as_deref(), Some("x"));
        assert_eq!(join_relative("", "../x"), None);
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path("projects", "archives/x.md"), "../archives/x.md");
        assert_eq!(relative_path("projects", "projects/sub/x.md"), "sub/x.md");
        assert_eq!(relative_path("", "a/b.md"), "a/b.md");
    }

    #[test]
    fn test_path_validator() {
        let root = Path::new("/corpus");
        assert_eq!(
            PathValidator::validate_path_in_root(root, "notes/a.md").unwrap(),
            PathBuf::from("/corpus/notes/a.md")
        );
        assert!(PathValidator::validate_path_in_root(root, "../etc/passwd").is_err());
        assert!(PathValidator::validate_path_in_root(root, "notes/../../x").is_err());
        assert!(PathValidator::validate_path_in_root(root, "").is_err());
    }
}
