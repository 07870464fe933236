//! Link target utilities: normalization, validation, construction and rewriting.

use crate::extractor::extract_links;
use wikigraph_core::{Error, Result, SourcePosition};

/// Characters a link target may not contain
const FORBIDDEN_TARGET_CHARS: [char; 6] = ['[', ']', '#', '|', '\n', '\r'];

/// Normalize a target for corpus-wide lookup.
///
/// Lowercases, folds whitespace runs into a single hyphen and drops every
/// character that is neither alphanumeric nor a hyphen.
///
/// ```
/// use wikigraph_parser::normalize_target;
///
/// assert_eq!(normalize_target("Project  Plan (v2)"), "project-plan-v2");
/// ```
pub fn normalize_target(target: &str) -> String {
    let mut out = String::with_capacity(target.len());
    let mut pending_space = false;

    for ch in target.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push('-');
            pending_space = false;
        }
        if ch.is_alphanumeric() || ch == '-' {
            out.extend(ch.to_lowercase());
        }
    }

    out
}

/// Reject targets that cannot round-trip through link markup
pub fn validate_target(target: &str) -> Result<()> {
    if target.trim().is_empty() {
        return Err(Error::validation("Link target cannot be empty"));
    }

    if let Some(ch) = target.chars().find(|c| FORBIDDEN_TARGET_CHARS.contains(c)) {
        return Err(Error::validation(format!(
            "Link target '{}' contains forbidden character {:?}",
            target.escape_debug(),
            ch
        )));
    }

    Ok(())
}

/// Build link markup from its parts (inverse of extraction)
///
/// ```
/// use wikigraph_parser::build_link;
///
/// assert_eq!(build_link("Note", Some("Intro"), Some("see")), "[[Note#Intro|see]]");
/// assert_eq!(build_link("Note", None, None), "[[Note]]");
/// ```
pub fn build_link(target: &str, anchor: Option<&str>, display: Option<&str>) -> String {
    let mut link = String::with_capacity(target.len() + 8);
    link.push_str("[[");
    link.push_str(target);
    if let Some(anchor) = anchor {
        link.push('#');
        link.push_str(anchor);
    }
    if let Some(display) = display {
        link.push('|');
        link.push_str(display);
    }
    link.push_str("]]");
    link
}

/// Last path segment of a target, without a file extension
pub fn target_stem(target: &str) -> &str {
    let name = target.trim().rsplit('/').next().unwrap_or_default();
    match name.rfind('.') {
        Some(idx)
            if idx > 0
                && idx + 1 < name.len()
                && name[idx + 1..].chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            &name[..idx]
        }
        _ => name,
    }
}

/// Whether a target names a file extension explicitly
pub fn has_extension(target: &str) -> bool {
    let name = target.trim().rsplit('/').next().unwrap_or_default();
    target_stem(target).len() != name.len()
}

/// Positions of every recognized link whose normalized target equals the
/// normalized `key`
pub fn find_link_spans(text: &str, key: &str) -> Vec<SourcePosition> {
    let wanted = normalize_target(key);
    extract_links(text)
        .into_iter()
        .filter(|link| normalize_target(&link.target) == wanted)
        .map(|link| link.position)
        .collect()
}

/// Replace every literal occurrence of `old` with `new`, returning the new
/// text and the number of replacements.
pub fn replace_link(text: &str, old: &str, new: &str) -> (String, usize) {
    if old.is_empty() {
        return (text.to_string(), 0);
    }
    let count = text.matches(old).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (text.replace(old, new), count)
}

/// Context snippet of up to `radius` bytes on each side of a link.
///
/// Line breaks are folded into spaces and `...` marks truncated sides.
pub fn link_context(text: &str, position: &SourcePosition, radius: usize) -> String {
    let link_start = position.offset.min(text.len());
    let link_end = position.end().min(text.len());

    let mut start = link_start.saturating_sub(radius);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = link_end.saturating_add(radius).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }

    let body = text[start..end]
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut snippet = String::with_capacity(body.len() + 6);
    if start > 0 {
        snippet.push_str("...");
    }
    snippet.push_str(&body);
    if end < text.len() {
        snippet.push_str("...");
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target("My Note"), "my-note");
        assert_eq!(normalize_target("  Tabs\tand\n\nlines "), "tabs-and-lines");
        assert_eq!(normalize_target("C++ & Rust!"), "c--rust");
        assert_eq!(normalize_target("Café"), "café");
        assert_eq!(normalize_target("projects/x"), "projectsx");
    }

    #[test]
    fn test_validate_target() {
        assert!(validate_target("projects/x.md").is_ok());
        assert!(validate_target("").is_err());
        assert!(validate_target("   ").is_err());

        let err = validate_target("a|b").unwrap_err();
        assert!(err.to_string().contains("'|'"));
        assert!(validate_target("a#b").is_err());
        assert!(validate_target("a]]").is_err());
        assert!(validate_target("a\nb").is_err());
    }

    #[test]
    fn test_build_then_extract() {
        let cases = [
            ("Note", None, None),
            ("dir/Note", Some("Heading"), None),
            ("Note", None, Some("Alias text")),
            ("Note", Some("Sec"), Some("Alias")),
        ];
        for (target, anchor, display) in cases {
            let link = build_link(target, anchor, display);
            let parsed = extract_links(&link);
            assert_eq!(parsed.len(), 1, "{}", link);
            assert_eq!(parsed[0].target, target);
            assert_eq!(parsed[0].anchor.as_deref(), anchor);
            assert_eq!(parsed[0].display_text.as_deref(), display);
        }
    }

    #[test]
    fn test_target_stem() {
        assert_eq!(target_stem("projects/x.md"), "x");
        assert_eq!(target_stem("Note"), "Note");
        assert_eq!(target_stem("../up/Note.txt"), "Note");
        assert_eq!(target_stem("v1.2 notes"), "v1.2 notes");
        assert!(has_extension("projects/x.md"));
        assert!(!has_extension("projects/x"));
    }

    #[test]
    fn test_find_link_spans() {
        let text = "[[My Note]] and [[my-note|alias]] but not [[Other]] or `[[My Note]]`";
        let spans = find_link_spans(text, "MY NOTE");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].offset, 0);
        assert_eq!(spans[1].offset, 16);
    }

    #[test]
    fn test_replace_link() {
        let (text, count) = replace_link("[[a]] x [[a]] [[ab]]", "[[a]]", "[[b]]");
        assert_eq!(text, "[[b]] x [[b]] [[ab]]");
        assert_eq!(count, 2);

        let (text, count) = replace_link("nothing", "[[a]]", "[[b]]");
        assert_eq!(text, "nothing");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_link_context_truncation() {
        let text = format!("{}[[target]]{}", "a".repeat(80), "b".repeat(80));
        let pos = SourcePosition::new(1, 81, 80, 10);
        let snippet = link_context(&text, &pos, 10);
        assert_eq!(snippet, format!("...{}[[target]]{}...", "a".repeat(10), "b".repeat(10)));
    }

    #[test]
    fn test_link_context_folds_lines_and_respects_chars() {
        let text = "héllo\nsee [[x]]\nthere";
        let links = extract_links(text);
        let snippet = link_context(text, &links[0].position, 50);
        assert_eq!(snippet, "héllo see [[x]] there");

        // radius landing inside a multi-byte char must not panic
        let snippet = link_context(text, &links[0].position, 9);
        assert!(snippet.contains("[[x]]"));
        assert!(snippet.starts_with("..."));
    }
}
