//! Core data models shared by every wikigraph crate.
//!
//! These types are designed to be:
//! - **Serializable**: All types derive Serialize/Deserialize
//! - **Debuggable**: Derive Debug for easy inspection
//! - **Type-Safe**: identities are [`DocumentId`], never bare strings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of a document: its root-relative, `/`-separated path.
///
/// Leading `./` and `/` are stripped and backslashes are converted, so
/// `"./projects/x.md"`, `"/projects/x.md"` and `"projects\\x.md"` are the
/// same identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identity from a path-like string
    pub fn new(path: impl Into<String>) -> Self {
        let raw: String = path.into();
        let mut normalized = raw.trim().replace('\\', "/");
        while let Some(rest) = normalized.strip_prefix("./") {
            normalized = rest.to_string();
        }
        let normalized = normalized.trim_start_matches('/').to_string();
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment (`"x.md"` for `"projects/x.md"`)
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    /// Extension without the dot, if any
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[idx + 1..]),
            _ => None,
        }
    }

    /// Containing directory (`""` for documents at the root)
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Path without the extension (`"projects/x"` for `"projects/x.md"`)
    pub fn without_extension(&self) -> &str {
        match self.extension() {
            Some(ext) => &self.0[..self.0.len() - ext.len() - 1],
            None => &self.0,
        }
    }

    /// First path segment when the document lives inside a directory
    pub fn top_segment(&self) -> Option<&str> {
        self.0.split_once('/').map(|(top, _)| top)
    }

    /// Path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&DocumentId> for DocumentId {
    fn from(value: &DocumentId) -> Self {
        value.clone()
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Position in source text (line, column, byte offset, byte length)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub length: usize,
}

impl SourcePosition {
    /// Create a new source position
    pub fn new(line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            line,
            column,
            offset,
            length,
        }
    }

    /// Create position from byte offset using a pre-computed line index.
    ///
    /// This is O(log n) - use for bulk parsing operations.
    pub fn from_offset_indexed(index: &LineIndex, offset: usize, length: usize) -> Self {
        let (line, column) = index.line_col(offset);
        Self {
            line,
            column,
            offset,
            length,
        }
    }

    /// Exclusive end byte offset
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Pre-computed line starts for O(log n) line/column lookup.
///
/// Build once per document, then use for all position lookups.
///
/// # Example
/// ```
/// use wikigraph_core::{LineIndex, SourcePosition};
///
/// let content = "Line 1\nLine 2\nLine 3";
/// let index = LineIndex::new(content);
///
/// let pos = SourcePosition::from_offset_indexed(&index, 7, 6);
/// assert_eq!(pos.line, 2);
/// assert_eq!(pos.column, 1);
/// ```
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets where each line starts (line 1 = index 0)
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Build line index in O(n) - do once per document.
    pub fn new(content: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, ch) in content.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Get (line, column) for a byte offset in O(log n) via binary search.
    ///
    /// Line numbers start at 1, column numbers start at 1.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line_idx = self.line_starts.partition_point(|&start| start <= offset);
        let line = line_idx.max(1);
        let line_start = self
            .line_starts
            .get(line_idx.saturating_sub(1))
            .copied()
            .unwrap_or(0);
        (line, offset - line_start + 1)
    }

    /// Get total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// A wiki-link occurrence extracted from document text.
///
/// `target` is the unresolved reference as written; resolution against known
/// identities happens in the link index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LinkRecord {
    /// Literal link text including delimiters, e.g. `[[Note#Intro|see]]`
    pub raw: String,
    pub target: String,
    pub anchor: Option<String>,
    pub display_text: Option<String>,
    pub position: SourcePosition,
}

impl LinkRecord {
    /// Whether the link points into its own document (`[[#Heading]]`)
    pub fn is_self_anchor(&self) -> bool {
        self.target.is_empty() && self.anchor.is_some()
    }
}

/// Parsed document header, produced by a [`crate::MetadataCodec`].
///
/// Known fields are typed; anything else lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DocumentMetadata {
    /// Title, falling back to the identity's file stem
    pub fn title_or_stem(&self, id: &DocumentId) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| id.stem().to_string())
    }

    /// Tags lowercased and deduplicated, in first-seen order
    pub fn normalized_tags(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for tag in &self.tags {
            let tag = tag.trim().trim_start_matches('#').to_lowercase();
            if !tag.is_empty() && !seen.contains(&tag) {
                seen.push(tag);
            }
        }
        seen
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().trim_start_matches('#').to_lowercase();
        self.normalized_tags().iter().any(|t| *t == wanted)
    }

    /// Extension field lookup
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }
}

/// Offset/limit window for paginated queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// A page covering everything
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }

    /// Slice an already-ordered collection into this page
    pub fn apply<T>(&self, items: Vec<T>) -> Paginated<T> {
        let total = items.len();
        let items: Vec<T> = items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect();
        Paginated {
            items,
            total,
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// One page of a stably ordered result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Size of the full result set
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Paginated<T> {
    pub fn empty(page: Page) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            offset: page.offset,
            limit: page.limit,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len()) < self.total
    }
}
