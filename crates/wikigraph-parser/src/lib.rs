//! # Wikigraph Parser
//!
//! Wiki-link extraction for plain-text corpora.
//!
//! This crate provides:
//! - Extraction of `[[target#anchor|display]]` links with source positions
//! - **Code awareness**: links inside fenced blocks or inline code are ignored
//! - Target normalization for corpus-wide lookup
//! - Link construction and literal rewriting for document moves
//! - Context snippets for backlink listings
//!
//! ## Quick Start
//!
//! ```
//! use wikigraph_parser::{build_link, extract_links, replace_link};
//!
//! let text = "Plan in [[projects/x.md#Scope|the plan]].";
//! let links = extract_links(text);
//! assert_eq!(links[0].target, "projects/x.md");
//!
//! let moved = build_link("archives/x.md", links[0].anchor.as_deref(), links[0].display_text.as_deref());
//! let (rewritten, count) = replace_link(text, &links[0].raw, &moved);
//! assert_eq!(count, 1);
//! assert_eq!(rewritten, "Plan in [[archives/x.md#Scope|the plan]].");
//! ```

pub mod extractor;
pub mod link_utils;

pub use extractor::{LinkExtractor, extract_links};
pub use link_utils::{
    build_link, find_link_spans, has_extension, link_context, normalize_target, replace_link,
    target_stem, validate_target,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::extractor::{LinkExtractor, extract_links};
    pub use crate::link_utils::{
        build_link, find_link_spans, link_context, normalize_target, replace_link, target_stem,
        validate_target,
    };
    pub use wikigraph_core::prelude::*;
}
