//! # Wikigraph Index
//!
//! Incremental wiki-link index and the thread-safe backlink store built on it.
//!
//! - [`LinkIndex`]: resolved forward links, derived backlinks, orphan and
//!   broken-link queries, incremental insert/remove/rename
//! - [`BacklinkStore`]: explicitly constructed, shareable wrapper with
//!   per-document update serialization
//!
//! ## Resolution
//!
//! A link target is resolved from its source document by trying, in order:
//! 1. The exact relative path (joined to the source's directory, or to the
//!    root when the target starts with `/`), verbatim and with each
//!    configured extension
//! 2. A corpus-wide normalized lookup, ties broken by smallest identity.
//!    Bare names match document stems; targets containing `/` match
//!    extension-less document paths, normalized segment by segment
//!
//! Anything else is a broken link. Broken links are data, not errors.
//!
//! ## Example
//!
//! ```
//! use wikigraph_core::{DocumentId, IndexConfig};
//! use wikigraph_index::BacklinkStore;
//!
//! let store = BacklinkStore::new(&IndexConfig::default());
//! store.register(&DocumentId::new("projects/plan.md"));
//! store.update(&DocumentId::new("daily/today.md"), "Reviewed [[plan#Risks]]");
//!
//! let backlinks = store.get_backlinks(&DocumentId::new("projects/plan.md"));
//! assert_eq!(backlinks.total, 1);
//! assert_eq!(backlinks.entries[0].link_text, "[[plan#Risks]]");
//! ```

pub mod backlinks;
pub mod link_index;

pub use backlinks::{BacklinkList, BacklinkStore, DEFAULT_STATS_TOP_N};
pub use link_index::{
    Backlink, BrokenLinks, IndexedLink, LinkIndex, LinkStats, Resolution, prepare_links,
};
