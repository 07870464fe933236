//! # Wikigraph
//!
//! Wiki-link corpus service: bidirectional link index, graph analytics and
//! transactional document moves over a pluggable storage backend.
//!
//! The [`Corpus`] ties the workspace crates together:
//! - `wikigraph-parser` extracts `[[target#anchor|display]]` links
//! - `wikigraph-index` keeps forward links and backlinks per document
//! - `wikigraph-graph` builds graph snapshots and runs the analytics
//! - `wikigraph-vault` provides storage, path policy, front matter and the
//!   document mover
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use wikigraph::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> wikigraph::Result<()> {
//! let config = WikiGraphConfig::builder("/corpus").random_seed(1).build()?;
//! let storage = Arc::new(MemoryStorage::with_documents([
//!     ("projects/x.md", "# X"),
//!     ("notes/a.md", "See [[x]] and [[x#Status|status]]"),
//! ]));
//! let policy = Arc::new(TopSegmentPolicy::new(&config.index));
//! let corpus = Corpus::new(config, storage, policy, Arc::new(FrontmatterCodec))?;
//! corpus.load().await?;
//!
//! let x = DocumentId::new("projects/x.md");
//! assert_eq!(corpus.backlinks(&x, Page::all()).total, 2);
//!
//! let report = corpus
//!     .move_document(&x, &DocumentId::new("archives/x.md"), MoveOptions::default())
//!     .await?;
//! assert_eq!(report.total_links_updated, 2);
//! assert_eq!(corpus.backlinks(&x, Page::all()).total, 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Library code logs through `log` and opens `tracing` spans on async entry
//! points. [`telemetry::init`] installs a subscriber for both.

pub mod corpus;
pub mod telemetry;

pub use corpus::{Corpus, LoadSummary};
pub use telemetry::LogFormat;

pub use wikigraph_core::{
    AnalysisConfig, ConfigProfile, DocumentId, DocumentMetadata, Error, GraphConfig, IndexConfig,
    LinkRecord, MetadataCodec, MoveStep, Page, Paginated, PathPolicy, Result, SourcePosition,
    Storage, WikiGraphConfig,
};
pub use wikigraph_graph::{
    AlgorithmOptions, ConnectionSuggestion, Graph, GraphAnalyzer, GraphReport, GraphScope,
    RelatedDocument, algorithms,
};
pub use wikigraph_index::{Backlink, BacklinkList, BacklinkStore, BrokenLinks, IndexedLink, LinkStats};
pub use wikigraph_parser::{build_link, extract_links, normalize_target};
pub use wikigraph_vault::{
    FrontmatterCodec, FsStorage, MemoryStorage, MoveOptions, MoveReport, TopSegmentPolicy,
};

pub mod prelude {
    pub use crate::corpus::{Corpus, LoadSummary};
    pub use wikigraph_core::prelude::*;
    pub use wikigraph_graph::{GraphReport, GraphScope};
    pub use wikigraph_vault::{
        FrontmatterCodec, FsStorage, MemoryStorage, MoveOptions, MoveReport, TopSegmentPolicy,
    };
}
