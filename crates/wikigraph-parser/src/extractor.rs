//! Wiki-link extraction with code-region awareness.
//!
//! Extraction is two-phase:
//! 1. Exclusion pass: fenced regions (```` ``` ```` / `~~~`) by line scan, then
//!    inline back-tick regions over the text with fenced regions masked
//! 2. Regex pass: `[[...]]` occurrences, skipping any that start inside an
//!    excluded range
//!
//! A `LineIndex` is built once per document for position lookups.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use wikigraph_core::{LineIndex, LinkRecord, SourcePosition};

/// Wiki link: `[[inner]]` where inner holds no brackets or line breaks
static WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]\n]+)\]\]").expect("valid wikilink pattern"));

/// Inline code span on a single line
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`\n]+`").expect("valid inline code pattern"));

#[inline]
fn has_wikilink(content: &str) -> bool {
    content.contains("[[")
}

/// Byte ranges where link markup is not interpreted
#[derive(Debug, Default, Clone)]
pub(crate) struct ExcludedRanges {
    ranges: Vec<Range<usize>>,
}

impl ExcludedRanges {
    /// Compute fenced and inline code regions of `content`
    pub(crate) fn compute(content: &str) -> Self {
        let mut excluded = Self::default();
        excluded.add_fenced(content);
        excluded.optimize();

        if content.contains('`') {
            let masked = excluded.mask(content);
            for m in INLINE_CODE.find_iter(&masked) {
                excluded.add(m.range());
            }
            excluded.optimize();
        }

        excluded
    }

    /// Check if a byte offset falls within any excluded range.
    #[inline]
    pub(crate) fn contains(&self, offset: usize) -> bool {
        if self.ranges.is_empty() {
            return false;
        }

        // ranges[idx - 1] is the last range starting at or before offset
        let idx = self.ranges.partition_point(|r| r.start <= offset);
        if idx == 0 {
            return false;
        }
        offset < self.ranges[idx - 1].end
    }

    fn add(&mut self, range: Range<usize>) {
        self.ranges.push(range);
    }

    /// Fenced regions run from an opening marker line to the next line
    /// starting with the same marker, or to the end of the text.
    fn add_fenced(&mut self, content: &str) {
        if !content.contains("```") && !content.contains("~~~") {
            return;
        }

        let mut open: Option<(&str, usize)> = None;
        let mut line_start = 0;

        for line in content.split_inclusive('\n') {
            let line_end = line_start + line.len();
            let trimmed = line.trim_start();

            match open {
                None => {
                    if trimmed.starts_with("```") {
                        open = Some(("```", line_start));
                    } else if trimmed.starts_with("~~~") {
                        open = Some(("~~~", line_start));
                    }
                }
                Some((marker, start)) => {
                    if trimmed.starts_with(marker) {
                        self.add(start..line_end);
                        open = None;
                    }
                }
            }

            line_start = line_end;
        }

        if let Some((_, start)) = open {
            self.add(start..content.len());
        }
    }

    /// Sort and merge overlapping ranges for efficient lookup.
    fn optimize(&mut self) {
        if self.ranges.is_empty() {
            return;
        }
        self.ranges.sort_by_key(|r| r.start);

        let mut merged = Vec::with_capacity(self.ranges.len());
        let mut current = self.ranges[0].clone();

        for range in self.ranges.iter().skip(1) {
            if range.start <= current.end {
                current.end = current.end.max(range.end);
            } else {
                merged.push(current);
                current = range.clone();
            }
        }
        merged.push(current);
        self.ranges = merged;
    }

    /// Copy of `content` with excluded bytes blanked, offsets preserved
    fn mask(&self, content: &str) -> String {
        let mut masked = String::with_capacity(content.len());
        for (offset, ch) in content.char_indices() {
            if self.contains(offset) {
                for _ in 0..ch.len_utf8() {
                    masked.push(' ');
                }
            } else {
                masked.push(ch);
            }
        }
        masked
    }
}

/// Split a link's inner text into (target, anchor, display).
///
/// `|` and `#` bind at their first occurrence. Returns `None` when the inner
/// text carries neither a target nor an anchor.
pub(crate) fn split_inner(inner: &str) -> Option<(String, Option<String>, Option<String>)> {
    let (target_part, display) = match inner.split_once('|') {
        Some((t, d)) => (t, Some(d)),
        None => (inner, None),
    };
    let (target, anchor) = match target_part.split_once('#') {
        Some((t, a)) => (t, Some(a)),
        None => (target_part, None),
    };

    let target = target.trim().to_string();
    let anchor = non_empty(anchor);
    let display = non_empty(display);

    if target.is_empty() && anchor.is_none() {
        return None;
    }
    Some((target, anchor, display))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Link extractor bound to one document's text.
pub struct LinkExtractor<'a> {
    content: &'a str,
    index: LineIndex,
    excluded: ExcludedRanges,
}

impl<'a> LinkExtractor<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            index: LineIndex::new(content),
            excluded: ExcludedRanges::compute(content),
        }
    }

    /// Every recognized link, in document order
    pub fn extract(&self) -> Vec<LinkRecord> {
        if !has_wikilink(self.content) {
            return Vec::new();
        }

        let mut links = Vec::new();
        for caps in WIKILINK.captures_iter(self.content) {
            let (Some(full), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            if self.excluded.contains(full.start()) {
                continue;
            }

            let Some((target, anchor, display_text)) = split_inner(inner.as_str()) else {
                continue;
            };

            links.push(LinkRecord {
                raw: full.as_str().to_string(),
                target,
                anchor,
                display_text,
                position: SourcePosition::from_offset_indexed(
                    &self.index,
                    full.start(),
                    full.len(),
                ),
            });
        }

        log::trace!("extracted {} links", links.len());
        links
    }
}

/// Extract every wiki link from `text`.
///
/// Links inside fenced or inline code are ignored. Malformed markup is
/// never an error, only unrecognized.
///
/// # Example
/// ```
/// use wikigraph_parser::extract_links;
///
/// let links = extract_links("See [[Roadmap#Q3|the plan]] and `[[not a link]]`");
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].target, "Roadmap");
/// assert_eq!(links[0].anchor.as_deref(), Some("Q3"));
/// assert_eq!(links[0].display_text.as_deref(), Some("the plan"));
/// ```
pub fn extract_links(text: &str) -> Vec<LinkRecord> {
    LinkExtractor::new(text).extract()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(text: &str) -> Vec<String> {
        extract_links(text).into_iter().map(|l| l.target).collect()
    }

    #[test]
    fn test_simple_links() {
        let links = extract_links("See [[Note]] and [[Other|display]]");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].target, "Note");
        assert_eq!(links[0].raw, "[[Note]]");
        assert_eq!(links[1].display_text.as_deref(), Some("display"));
    }

    #[test]
    fn test_separators_bind_first_occurrence() {
        let links = extract_links("[[a#b#c|d|e]]");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "a");
        assert_eq!(links[0].anchor.as_deref(), Some("b#c"));
        assert_eq!(links[0].display_text.as_deref(), Some("d|e"));
    }

    #[test]
    fn test_hash_in_display_is_literal() {
        let links = extract_links("[[a|see #3]]");
        assert_eq!(links[0].target, "a");
        assert_eq!(links[0].anchor, None);
        assert_eq!(links[0].display_text.as_deref(), Some("see #3"));
    }

    #[test]
    fn test_fields_trimmed_and_empty_dropped() {
        let links = extract_links("[[ Note # | ]]");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Note");
        assert_eq!(links[0].anchor, None);
        assert_eq!(links[0].display_text, None);
    }

    #[test]
    fn test_self_anchor() {
        let links = extract_links("Jump to [[#Setup]]");
        assert_eq!(links.len(), 1);
        assert!(links[0].is_self_anchor());
    }

    #[test]
    fn test_empty_links_ignored() {
        assert!(extract_links("[[]] [[ ]] [[#]] [[|x]]").is_empty());
    }

    #[test]
    fn test_adjacent_links() {
        assert_eq!(targets("[[a]][[b]][[c]]"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_partial_opening_before_complete_link() {
        assert_eq!(targets("[[broken [[real]]"), vec!["real"]);
        assert_eq!(targets("[[[[real]]"), vec!["real"]);
    }

    #[test]
    fn test_unclosed_is_not_a_link() {
        assert!(extract_links("[[never closed").is_empty());
        assert!(extract_links("[[split\nacross]]").is_empty());
    }

    #[test]
    fn test_embed_prefix_not_in_raw() {
        let links = extract_links("![[diagram]]");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].raw, "[[diagram]]");
        assert_eq!(links[0].position.offset, 1);
    }

    #[test]
    fn test_fenced_code_excluded() {
        let text = "```\n[[CodeLink]]\n```\nOutside [[RealLink]]";
        assert_eq!(targets(text), vec!["RealLink"]);

        let tilde = "~~~rust\n[[x]]\n~~~\n[[y]]";
        assert_eq!(targets(tilde), vec!["y"]);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        assert_eq!(targets("[[before]]\n```\n[[inside]]"), vec!["before"]);
    }

    #[test]
    fn test_inline_code_excluded() {
        assert_eq!(targets("See `[[Fake]]` but [[Real]]"), vec!["Real"]);
        assert_eq!(targets("``[[Fake]]`` [[Real]]"), vec!["Real"]);
    }

    #[test]
    fn test_backticks_inside_fence_do_not_pair_outside() {
        // the lone backtick inside the fence must not open an inline span
        let text = "```\n`\n```\n[[a]] `x` [[b]]";
        assert_eq!(targets(text), vec!["a", "b"]);
    }

    #[test]
    fn test_positions() {
        let links = extract_links("line one\nsee [[Target]]");
        let pos = links[0].position;
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 5);
        assert_eq!(pos.offset, 13);
        assert_eq!(pos.length, "[[Target]]".len());
    }

    #[test]
    fn test_excluded_ranges_merge() {
        let mut ranges = ExcludedRanges::default();
        ranges.add(10..20);
        ranges.add(0..5);
        ranges.add(15..30);
        ranges.optimize();
        assert!(ranges.contains(0));
        assert!(!ranges.contains(5));
        assert!(ranges.contains(25));
        assert!(!ranges.contains(30));
    }
}
