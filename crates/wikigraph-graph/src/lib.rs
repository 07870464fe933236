//! # Wikigraph Graph
//!
//! Document graph snapshots, graph algorithms and link analytics.
//!
//! Provides:
//! - [`Graph`]: identity-keyed node and edge maps with adjacency indices
//! - [`GraphBuilder`]: snapshots from the link index, optionally scoped to a
//!   category or tag set, with derived tag and category relation edges
//! - [`algorithms`]: traversal, shortest and all paths, components, cycles,
//!   topological order, centrality and clustering
//! - [`GraphAnalyzer`]: whole-graph reports, related documents and
//!   connection suggestions
//!
//! ## Quick Start
//!
//! ```
//! use std::collections::HashMap;
//! use wikigraph_core::{AnalysisConfig, DocumentId, IndexConfig};
//! use wikigraph_graph::{GraphAnalyzer, GraphBuilder, GraphScope};
//! use wikigraph_index::LinkIndex;
//!
//! let mut index = LinkIndex::new(&IndexConfig::default());
//! index.index_document(&DocumentId::new("a.md"), "[[b]] and [[c]]");
//! index.index_document(&DocumentId::new("b.md"), "[[c]]");
//! index.index_document(&DocumentId::new("c.md"), "");
//!
//! let metadata = HashMap::new();
//! let graph = GraphBuilder::new(&index, &metadata).build(&GraphScope::All);
//! assert_eq!(graph.node_count(), 3);
//! assert_eq!(graph.edge_count(), 3);
//!
//! let report = GraphAnalyzer::new(&graph, AnalysisConfig::default()).analyze();
//! assert!(!report.summary.has_cycles);
//! assert_eq!(report.summary.component_count, 1);
//! ```
//!
//! ## Snapshots
//!
//! A [`Graph`] is rebuilt from the index on demand and never updated in
//! place by the index. Algorithms are pure functions over `&Graph`, so a
//! snapshot can be shared across threads while the index keeps changing.
//!
//! ## Cancellation
//!
//! Betweenness, PageRank, all-paths enumeration and label propagation take
//! [`AlgorithmOptions`]. Once its cancellation token fires, a run stops at
//! the next checkpoint and returns an [`Outcome`] flagged `cancelled`.

pub mod algorithms;
pub mod analyzer;
pub mod builder;
pub mod graph;

pub use algorithms::{AlgorithmOptions, Clustering, Outcome, VisitControl};
pub use analyzer::{
    ConnectionSuggestion, GraphAnalyzer, GraphReport, GraphSummary, RankedNode, RelatedDocument,
    SuggestionReason,
};
pub use builder::{GraphBuilder, GraphScope};
pub use graph::{Edge, EdgeKind, Graph, Node};

pub mod prelude {
    pub use crate::algorithms::{
        AlgorithmOptions, Outcome, all_paths, betweenness_centrality, breadth_first,
        connected_components, degree_centrality, depth_first, find_cycles, label_propagation,
        pagerank, shortest_path, topological_sort, weakly_connected_components,
    };
    pub use crate::analyzer::{GraphAnalyzer, GraphReport};
    pub use crate::builder::{GraphBuilder, GraphScope};
    pub use crate::graph::{Edge, EdgeKind, Graph, Node};
}
