//! YAML front matter codec.
//!
//! A header is a leading `---` line, YAML, and a closing `---` (or `...`)
//! line. Documents without a closed header have default metadata and their
//! whole text as body.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_yaml::Value;
use wikigraph_core::{DocumentId, DocumentMetadata, Error, MetadataCodec, Result};

const CATEGORY_KEY: &str = "category";

/// Byte layout of a front matter header
#[derive(Debug, Clone, Copy)]
struct Header<'a> {
    yaml: &'a str,
    /// Offset where the YAML starts
    yaml_start: usize,
    /// Offset of the closing delimiter line
    yaml_end: usize,
    /// Offset of the first body byte
    body_start: usize,
}

fn is_delimiter(line: &str, closing: bool) -> bool {
    let line = line.trim_end_matches(['\r', '\n']).trim_end();
    line == "---" || (closing && line == "...")
}

fn split_header(text: &str) -> Option<Header<'_>> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if !is_delimiter(first, false) || !first.ends_with('\n') {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if is_delimiter(line, true) {
            return Some(Header {
                yaml: &text[yaml_start..offset],
                yaml_start,
                yaml_end: offset,
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

/// Scalar rendered as a string; sequences and maps yield `None`
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_tags(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_string).collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or a bare date
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn yaml_scalar(value: &str) -> Result<String> {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .map_err(|e| Error::parse_error(format!("Cannot encode '{}' as YAML: {}", value, e)))
}

/// Front matter codec backed by `serde_yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterCodec;

impl FrontmatterCodec {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataCodec for FrontmatterCodec {
    fn parse(&self, id: &DocumentId, text: &str) -> Result<DocumentMetadata> {
        let mut metadata = DocumentMetadata::default();
        let Some(header) = split_header(text) else {
            return Ok(metadata);
        };

        let value: Value = serde_yaml::from_str(header.yaml)
            .map_err(|e| Error::parse_error(format!("Invalid front matter in {}: {}", id, e)))?;
        let mapping = match value {
            Value::Null => return Ok(metadata),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(Error::parse_error(format!(
                    "Front matter in {} is not a mapping",
                    id
                )));
            }
        };

        for (key, value) in &mapping {
            let Some(key) = scalar_string(key) else {
                log::debug!("Skipping non-scalar front matter key in {}", id);
                continue;
            };

            match key.as_str() {
                "title" => metadata.title = scalar_string(value),
                "tags" => metadata.tags = parse_tags(value),
                CATEGORY_KEY => metadata.category = scalar_string(value),
                "created" | "modified" => {
                    match scalar_string(value).as_deref().and_then(parse_timestamp) {
                        Some(ts) if key == "created" => metadata.created = Some(ts),
                        Some(ts) => metadata.modified = Some(ts),
                        None => {
                            if let Ok(json) = serde_json::to_value(value) {
                                metadata.extra.insert(key.clone(), json);
                            }
                        }
                    }
                }
                _ => match serde_json::to_value(value) {
                    Ok(json) => {
                        metadata.extra.insert(key.clone(), json);
                    }
                    Err(e) => log::debug!("Dropping front matter field '{}' in {}: {}", key, id, e),
                },
            }
        }

        Ok(metadata)
    }

    /// Sets or replaces the top-level `category` line, leaving every other
    /// header byte untouched. Text without a header gets a new one.
    fn with_category(&self, text: &str, category: &str) -> Result<String> {
        let line = format!("{}: {}", CATEGORY_KEY, yaml_scalar(category)?);

        let Some(header) = split_header(text) else {
            return Ok(format!("---\n{}\n---\n{}", line, text));
        };

        let mut yaml = String::with_capacity(header.yaml.len() + line.len() + 1);
        let mut replaced = false;
        let mut skipping_block = false;

        for current in header.yaml.split_inclusive('\n') {
            if skipping_block {
                let continues = current.starts_with([' ', '\t']) || current.starts_with("- ");
                if continues {
                    continue;
                }
                skipping_block = false;
            }

            let key = current.split_once(':').map(|(k, _)| k);
            if !replaced && key == Some(CATEGORY_KEY) {
                yaml.push_str(&line);
                yaml.push('\n');
                replaced = true;
                skipping_block = true;
                continue;
            }
            yaml.push_str(current);
        }

        if !replaced {
            if !yaml.is_empty() && !yaml.ends_with('\n') {
                yaml.push('\n');
            }
            yaml.push_str(&line);
            yaml.push('\n');
        }

        let mut out = String::with_capacity(text.len() + line.len());
        out.push_str(&text[..header.yaml_start]);
        out.push_str(&yaml);
        out.push_str(&text[header.yaml_end..]);
        Ok(out)
    }

    fn body<'a>(&self, text: &'a str) -> &'a str {
        match split_header(text) {
            Some(header) => &text[header.body_start..],
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> DocumentId {
        DocumentId::new("projects/x.md")
    }

    #[test]
    fn test_parse_known_fields() {
        let text = "---\ntitle: Plan\ntags: [Rust, graphs]\ncategory: projects\ncreated: 2024-03-01\nmodified: 2024-03-02T10:00:00Z\nstatus: draft\n---\n# Body";
        let metadata = FrontmatterCodec.parse(&id(), text).unwrap();

        assert_eq!(metadata.title.as_deref(), Some("Plan"));
        assert_eq!(metadata.tags, vec!["Rust", "graphs"]);
        assert_eq!(metadata.category.as_deref(), Some("projects"));
        assert_eq!(
            metadata.created.map(|d| d.to_rfc3339()),
            Some("2024-03-01T00:00:00+00:00".to_string())
        );
        assert!(metadata.modified.is_some());
        assert_eq!(metadata.extra("status"), Some(&serde_json::json!("draft")));
    }

    #[test]
    fn test_tags_as_string() {
        let text = "---\ntags: alpha, beta gamma\n---\n";
        let metadata = FrontmatterCodec.parse(&id(), text).unwrap();
        assert_eq!(metadata.tags, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_no_header_defaults() {
        let metadata = FrontmatterCodec.parse(&id(), "# Just text").unwrap();
        assert_eq!(metadata, DocumentMetadata::default());

        // unclosed header is body text
        let text = "---\ntitle: x\n";
        assert_eq!(FrontmatterCodec.parse(&id(), text).unwrap(), DocumentMetadata::default());
        assert_eq!(FrontmatterCodec.body(text), text);
    }

    #[test]
    fn test_malformed_header_is_parse_error() {
        let err = FrontmatterCodec
            .parse(&id(), "---\ntitle: [unclosed\n---\n")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));

        let err = FrontmatterCodec.parse(&id(), "---\n- a\n- b\n---\n").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_body() {
        let text = "---\ntitle: x\n---\nBody [[link]]\n";
        assert_eq!(FrontmatterCodec.body(text), "Body [[link]]\n");
        assert_eq!(FrontmatterCodec.body("plain"), "plain");
    }

    #[test]
    fn test_with_category_replaces_line() {
        let text = "---\ntitle: Plan\ncategory: projects\ntags: [a]\n---\nBody\n";
        let updated = FrontmatterCodec.with_category(text, "archives").unwrap();
        assert_eq!(updated, "---\ntitle: Plan\ncategory: archives\ntags: [a]\n---\nBody\n");

        let metadata = FrontmatterCodec.parse(&id(), &updated).unwrap();
        assert_eq!(metadata.category.as_deref(), Some("archives"));
    }

    #[test]
    fn test_with_category_replaces_block_value() {
        let text = "---\ncategory:\n  - old\n  - older\ntitle: T\n---\n";
        let updated = FrontmatterCodec.with_category(text, "new").unwrap();
        assert_eq!(updated, "---\ncategory: new\ntitle: T\n---\n");
    }

    #[test]
    fn test_with_category_appends_or_creates_header() {
        let text = "---\ntitle: Plan\n---\nBody";
        assert_eq!(
            FrontmatterCodec.with_category(text, "archives").unwrap(),
            "---\ntitle: Plan\ncategory: archives\n---\nBody"
        );

        assert_eq!(
            FrontmatterCodec.with_category("Body", "archives").unwrap(),
            "---\ncategory: archives\n---\nBody"
        );
    }

    #[test]
    fn test_with_category_quotes_yaml_specials() {
        let updated = FrontmatterCodec.with_category("x", "yes").unwrap();
        let metadata = FrontmatterCodec.parse(&id(), &updated).unwrap();
        assert_eq!(metadata.category.as_deref(), Some("yes"));
    }
}
