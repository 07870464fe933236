//! Whole-graph reports, related-document ranking and link suggestions.

use crate::algorithms::{
    AlgorithmOptions, Clustering, average_clustering_coefficient, betweenness_centrality,
    degree_centrality, label_propagation, pagerank, topological_sort, weakly_connected_components,
};
use crate::graph::Graph;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use wikigraph_core::{AnalysisConfig, DocumentId};

/// Score attached to one node in a ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: DocumentId,
    pub score: f64,
}

/// Size and shape of the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub node_count: usize,
    pub edge_count: usize,
    /// `E / (N (N - 1))`, 0 for fewer than two nodes
    pub density: f64,
    /// `2E / N`
    pub average_degree: f64,
    /// Weakly connected components
    pub component_count: usize,
    pub has_cycles: bool,
}

/// Full analytics report for one graph snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphReport {
    pub summary: GraphSummary,
    pub top_degree: Vec<RankedNode>,
    pub top_betweenness: Vec<RankedNode>,
    pub top_pagerank: Vec<RankedNode>,
    pub clusters: Clustering,
    pub average_clustering: f64,
    /// Nodes with no edges at all
    pub orphans: Vec<DocumentId>,
    /// Out-degree at or above the hub threshold, highest first
    pub hubs: Vec<RankedNode>,
    /// Betweenness at or above the bridge threshold, highest first
    pub bridges: Vec<RankedNode>,
    /// Set when a cancellable step stopped early
    pub cancelled: bool,
}

/// A document ranked by proximity to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub id: DocumentId,
    pub score: f64,
}

/// Why a connection was suggested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SuggestionReason {
    CommonNeighbors { count: usize },
    SharedTags { tags: Vec<String> },
}

/// A proposed link between two unlinked documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSuggestion {
    pub source: DocumentId,
    pub target: DocumentId,
    /// In `[0, 1]`
    pub confidence: f64,
    pub reasons: Vec<SuggestionReason>,
}

const DIRECT_OUT_SCORE: f64 = 2.0;
const DIRECT_IN_SCORE: f64 = 1.5;
const TWO_HOP_SCORE: f64 = 0.5;

/// Minimum common neighbors (and shared tags) for a suggestion
const MIN_SUGGESTION_EVIDENCE: usize = 2;
const COMMON_NEIGHBOR_SATURATION: f64 = 5.0;
const SHARED_TAG_SATURATION: f64 = 3.0;

/// Analytics over an immutable graph snapshot
pub struct GraphAnalyzer<'a> {
    graph: &'a Graph,
    config: AnalysisConfig,
    options: AlgorithmOptions,
}

impl<'a> GraphAnalyzer<'a> {
    pub fn new(graph: &'a Graph, config: AnalysisConfig) -> Self {
        Self {
            graph,
            config,
            options: AlgorithmOptions::default(),
        }
    }

    /// Attach cancellation for the long-running steps
    pub fn with_options(mut self, options: AlgorithmOptions) -> Self {
        self.options = options;
        self
    }

    pub fn summary(&self) -> GraphSummary {
        let n = self.graph.node_count();
        let e = self.graph.edge_count();

        GraphSummary {
            node_count: n,
            edge_count: e,
            density: if n > 1 {
                e as f64 / (n * (n - 1)) as f64
            } else {
                0.0
            },
            average_degree: if n > 0 { 2.0 * e as f64 / n as f64 } else { 0.0 },
            component_count: weakly_connected_components(self.graph).len(),
            has_cycles: topological_sort(self.graph).is_none(),
        }
    }

    /// Compute the full report
    pub fn analyze(&self) -> GraphReport {
        let graph = self.graph;
        let top_k = self.config.top_k;

        let degree = degree_centrality(graph);
        let betweenness = betweenness_centrality(graph, &self.options);
        let ranks = pagerank(
            graph,
            self.config.pagerank_damping,
            self.config.pagerank_iterations,
            &self.options,
        );

        let mut rng = match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let clusters = label_propagation(
            graph,
            self.config.label_propagation_iterations,
            &mut rng,
            &self.options,
        );

        let cancelled = betweenness.cancelled || ranks.cancelled || clusters.cancelled;
        if cancelled {
            log::warn!("Graph analysis cancelled; report is partial");
        }

        let orphans = graph
            .node_ids()
            .filter(|id| graph.degree(id) == 0)
            .cloned()
            .collect();

        let hubs = ranked(
            graph
                .node_ids()
                .map(|id| (id, graph.out_degree(id)))
                .filter(|(_, out)| *out >= self.config.hub_threshold)
                .map(|(id, out)| (id, out as f64)),
            usize::MAX,
        );

        let bridges = ranked(
            betweenness
                .value
                .iter()
                .filter(|(_, score)| **score >= self.config.bridge_threshold)
                .map(|(id, score)| (id, *score)),
            usize::MAX,
        );

        let report = GraphReport {
            summary: self.summary(),
            top_degree: ranked(degree.iter().map(|(id, s)| (id, *s)), top_k),
            top_betweenness: ranked(betweenness.value.iter().map(|(id, s)| (id, *s)), top_k),
            top_pagerank: ranked(ranks.value.iter().map(|(id, s)| (id, *s)), top_k),
            clusters: clusters.value,
            average_clustering: average_clustering_coefficient(graph),
            orphans,
            hubs,
            bridges,
            cancelled,
        };

        log::debug!(
            "Analyzed graph: {} nodes, {} edges, {} clusters",
            report.summary.node_count,
            report.summary.edge_count,
            report.clusters.cluster_count()
        );
        report
    }

    /// Documents near `id`, highest score first.
    ///
    /// Direct outgoing neighbors score 2.0, direct incoming 1.5 (both apply
    /// to a mutual link). Each two-hop path to a node that is neither `id`
    /// nor a direct neighbor adds 0.5.
    pub fn find_related(&self, id: &DocumentId, limit: usize) -> Vec<RelatedDocument> {
        let graph = self.graph;
        if !graph.contains_node(id) {
            return Vec::new();
        }

        let mut scores: BTreeMap<&DocumentId, f64> = BTreeMap::new();
        let outgoing = graph.successors(id);
        let incoming = graph.predecessors(id);

        for &n in outgoing.iter().filter(|n| **n != id) {
            *scores.entry(n).or_default() += DIRECT_OUT_SCORE;
        }
        for &n in incoming.iter().filter(|n| **n != id) {
            *scores.entry(n).or_default() += DIRECT_IN_SCORE;
        }

        let direct: BTreeSet<&DocumentId> = scores.keys().copied().collect();
        for n in &direct {
            for m in graph.neighbors(n) {
                if m != id && !direct.contains(m) {
                    *scores.entry(m).or_default() += TWO_HOP_SCORE;
                }
            }
        }

        ranked(scores.into_iter(), limit)
            .into_iter()
            .map(|RankedNode { id, score }| RelatedDocument { id, score })
            .collect()
    }

    /// Candidate links between documents that are not linked either way.
    pub fn suggest_connections(&self, limit: usize) -> Vec<ConnectionSuggestion> {
        let graph = self.graph;
        let ids: Vec<&DocumentId> = graph.node_ids().collect();
        let neighbor_sets: Vec<BTreeSet<&DocumentId>> =
            ids.iter().map(|id| graph.neighbors(id)).collect();

        let mut suggestions = Vec::new();
        for (i, &a) in ids.iter().enumerate() {
            for (j, &b) in ids.iter().enumerate().skip(i + 1) {
                if graph.has_link(a, b) || graph.has_link(b, a) {
                    continue;
                }

                let mut confidence: f64 = 0.0;
                let mut reasons = Vec::new();

                let common = neighbor_sets[i].intersection(&neighbor_sets[j]).count();
                if common >= MIN_SUGGESTION_EVIDENCE {
                    confidence = confidence.max((common as f64 / COMMON_NEIGHBOR_SATURATION).min(1.0));
                    reasons.push(SuggestionReason::CommonNeighbors { count: common });
                }

                let shared = shared_tags(graph, a, b);
                if shared.len() >= MIN_SUGGESTION_EVIDENCE {
                    confidence = confidence.max((shared.len() as f64 / SHARED_TAG_SATURATION).min(1.0));
                    reasons.push(SuggestionReason::SharedTags { tags: shared });
                }

                if !reasons.is_empty() {
                    suggestions.push(ConnectionSuggestion {
                        source: a.clone(),
                        target: b.clone(),
                        confidence,
                        reasons,
                    });
                }
            }
        }

        suggestions.sort_by(|x, y| {
            y.confidence
                .total_cmp(&x.confidence)
                .then_with(|| x.source.cmp(&y.source))
                .then_with(|| x.target.cmp(&y.target))
        });
        suggestions.truncate(limit);
        suggestions
    }
}

fn shared_tags(graph: &Graph, a: &DocumentId, b: &DocumentId) -> Vec<String> {
    match (graph.node(a), graph.node(b)) {
        (Some(x), Some(y)) => {
            let theirs: BTreeSet<&String> = y.tags.iter().collect();
            let ours: BTreeSet<&String> = x.tags.iter().filter(|t| theirs.contains(t)).collect();
            ours.into_iter().cloned().collect()
        }
        _ => Vec::new(),
    }
}

/// Highest score first, ties by identity, truncated to `limit`
fn ranked<'g, I>(scores: I, limit: usize) -> Vec<RankedNode>
where
    I: Iterator<Item = (&'g DocumentId, f64)>,
{
    let mut entries: Vec<(&DocumentId, f64)> = scores.collect();
    entries.sort_by(|(a, x), (b, y)| y.total_cmp(x).then_with(|| a.cmp(b)));
    entries
        .into_iter()
        .take(limit)
        .map(|(id, score)| RankedNode {
            id: id.clone(),
            score,
        })
        .collect()
}
