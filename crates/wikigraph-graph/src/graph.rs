//! Immutable-by-convention document graph snapshot.
//!
//! Nodes and edges live in identity-keyed maps. The adjacency indices are
//! projections of the edge map and are only ever changed together with it.

use chrono::{DateTime, Utc};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use wikigraph_core::{DocumentId, DocumentMetadata, Error, Result};

/// Kind of relationship an edge encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Explicit wiki link from source to target
    Link,
    /// Documents sharing tags
    TagRelation,
    /// Documents in the same category
    CategoryRelation,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::TagRelation => "tag",
            Self::CategoryRelation => "category",
        }
    }
}

/// Graph node: one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: DocumentId,
    pub title: String,
    pub category: Option<String>,
    /// Normalized tags
    pub tags: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Node {
    /// Node with no metadata; the title falls back to the file stem
    pub fn new(id: DocumentId) -> Self {
        Self {
            title: id.stem().to_string(),
            id,
            category: None,
            tags: Vec::new(),
            created: None,
            modified: None,
        }
    }

    pub fn from_metadata(id: DocumentId, metadata: &DocumentMetadata) -> Self {
        Self {
            title: metadata.title_or_stem(&id),
            category: metadata.category.clone(),
            tags: metadata.normalized_tags(),
            created: metadata.created,
            modified: metadata.modified,
            id,
        }
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|wanted| {
            let wanted = wanted.trim().trim_start_matches('#').to_lowercase();
            self.tags.contains(&wanted)
        })
    }
}

/// Graph edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: DocumentId,
    pub target: DocumentId,
    pub kind: EdgeKind,
    pub weight: f64,
    pub anchor: Option<String>,
    pub display_text: Option<String>,
    pub context: Option<String>,
    /// Tags shared by both endpoints (tag relations only)
    pub shared_tags: Vec<String>,
}

impl Edge {
    /// Deterministic edge id for a kind and endpoint pair
    pub fn edge_id(kind: EdgeKind, source: &DocumentId, target: &DocumentId) -> String {
        match kind {
            EdgeKind::Link => format!("link:{}->{}", source, target),
            _ => format!("{}:{}<->{}", kind.as_str(), source, target),
        }
    }

    /// Link edge with weight 1
    pub fn link(source: DocumentId, target: DocumentId) -> Self {
        Self {
            id: Self::edge_id(EdgeKind::Link, &source, &target),
            source,
            target,
            kind: EdgeKind::Link,
            weight: 1.0,
            anchor: None,
            display_text: None,
            context: None,
            shared_tags: Vec::new(),
        }
    }

    /// Tag relation weighted by the number of shared tags. Endpoints are
    /// ordered so that source < target.
    pub fn tag_relation(a: DocumentId, b: DocumentId, shared_tags: Vec<String>) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            id: Self::edge_id(EdgeKind::TagRelation, &source, &target),
            source,
            target,
            kind: EdgeKind::TagRelation,
            weight: shared_tags.len() as f64,
            anchor: None,
            display_text: None,
            context: None,
            shared_tags,
        }
    }

    /// Category relation with weight 1. Endpoints are ordered so that
    /// source < target.
    pub fn category_relation(a: DocumentId, b: DocumentId) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            id: Self::edge_id(EdgeKind::CategoryRelation, &source, &target),
            source,
            target,
            kind: EdgeKind::CategoryRelation,
            weight: 1.0,
            anchor: None,
            display_text: None,
            context: None,
            shared_tags: Vec::new(),
        }
    }

    pub fn with_link_metadata(
        mut self,
        anchor: Option<String>,
        display_text: Option<String>,
        context: Option<String>,
    ) -> Self {
        self.anchor = anchor;
        self.display_text = display_text;
        self.context = context;
        self
    }

    /// The endpoint opposite `id`
    pub fn other(&self, id: &DocumentId) -> &DocumentId {
        if &self.source == id {
            &self.target
        } else {
            &self.source
        }
    }
}

/// Document graph with forward and reverse adjacency over edge ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    nodes: BTreeMap<DocumentId, Node>,
    edges: BTreeMap<String, Edge>,
    outgoing: BTreeMap<DocumentId, BTreeSet<String>>,
    incoming: BTreeMap<DocumentId, BTreeSet<String>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a node, keeping its edges
    pub fn add_node(&mut self, node: Node) {
        let id = node.id.clone();
        self.outgoing.entry(id.clone()).or_default();
        self.incoming.entry(id.clone()).or_default();
        self.nodes.insert(id, node);
    }

    /// Insert or replace an edge. Both endpoints must already be nodes.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(Error::not_found(endpoint.as_str()));
            }
        }

        self.remove_edge(&edge.id);
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.id.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> Option<Edge> {
        let edge = self.edges.remove(edge_id)?;
        if let Some(ids) = self.outgoing.get_mut(&edge.source) {
            ids.remove(edge_id);
        }
        if let Some(ids) = self.incoming.get_mut(&edge.target) {
            ids.remove(edge_id);
        }
        Some(edge)
    }

    /// Remove a node together with every incident edge
    pub fn remove_node(&mut self, id: &DocumentId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        let incident: Vec<String> = self
            .outgoing
            .get(id)
            .into_iter()
            .chain(self.incoming.get(id))
            .flatten()
            .cloned()
            .collect();
        for edge_id in incident {
            self.remove_edge(&edge_id);
        }
        self.outgoing.remove(id);
        self.incoming.remove(id);
        Some(node)
    }

    pub fn node(&self, id: &DocumentId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.get(edge_id)
    }

    pub fn contains_node(&self, id: &DocumentId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in identity order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.nodes.keys()
    }

    /// Edges in edge-id order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn out_edges<'a>(&'a self, id: &DocumentId) -> impl Iterator<Item = &'a Edge> + use<'a> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(move |edge_id| self.edges.get(edge_id))
    }

    pub fn in_edges<'a>(&'a self, id: &DocumentId) -> impl Iterator<Item = &'a Edge> + use<'a> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(move |edge_id| self.edges.get(edge_id))
    }

    pub fn out_degree(&self, id: &DocumentId) -> usize {
        self.outgoing.get(id).map_or(0, BTreeSet::len)
    }

    pub fn in_degree(&self, id: &DocumentId) -> usize {
        self.incoming.get(id).map_or(0, BTreeSet::len)
    }

    /// In-degree plus out-degree
    pub fn degree(&self, id: &DocumentId) -> usize {
        self.in_degree(id) + self.out_degree(id)
    }

    /// Distinct targets of outgoing edges, sorted
    pub fn successors(&self, id: &DocumentId) -> BTreeSet<&DocumentId> {
        self.out_edges(id).map(|e| &e.target).collect()
    }

    /// Distinct sources of incoming edges, sorted
    pub fn predecessors(&self, id: &DocumentId) -> BTreeSet<&DocumentId> {
        self.in_edges(id).map(|e| &e.source).collect()
    }

    /// Distinct neighbors over both directions, excluding `id` itself
    pub fn neighbors(&self, id: &DocumentId) -> BTreeSet<&DocumentId> {
        self.out_edges(id)
            .map(|e| &e.target)
            .chain(self.in_edges(id).map(|e| &e.source))
            .filter(|n| *n != id)
            .collect()
    }

    /// Whether a link edge runs from `source` to `target`
    pub fn has_link(&self, source: &DocumentId, target: &DocumentId) -> bool {
        self.edges
            .contains_key(&Edge::edge_id(EdgeKind::Link, source, target))
    }

    /// Whether any edge joins the two nodes in either direction
    pub fn is_adjacent(&self, a: &DocumentId, b: &DocumentId) -> bool {
        self.out_edges(a).any(|e| &e.target == b) || self.out_edges(b).any(|e| &e.target == a)
    }

    /// Subgraph induced by `ids`: those nodes and every edge between them
    pub fn subgraph(&self, ids: &BTreeSet<DocumentId>) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            if let Some(node) = self.nodes.get(id) {
                graph.add_node(node.clone());
            }
        }
        for edge in self.edges.values() {
            if graph.contains_node(&edge.source) && graph.contains_node(&edge.target) {
                graph.insert_edge_unchecked(edge.clone());
            }
        }
        graph
    }

    /// Bounded-depth neighborhood of `roots` over both edge directions.
    ///
    /// Unknown roots are ignored.
    pub fn neighborhood(&self, roots: &[DocumentId], depth: usize) -> Graph {
        let mut included: BTreeSet<DocumentId> = roots
            .iter()
            .filter(|id| self.contains_node(id))
            .cloned()
            .collect();
        let mut frontier: Vec<DocumentId> = included.iter().cloned().collect();

        for _ in 0..depth {
            let mut next = Vec::new();
            for id in &frontier {
                for neighbor in self.neighbors(id) {
                    if included.insert(neighbor.clone()) {
                        next.push(neighbor.clone());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        self.subgraph(&included)
    }

    /// Convert to a petgraph `DiGraph` weighted by edge weight
    pub fn to_petgraph(&self) -> (DiGraph<DocumentId, f64>, HashMap<DocumentId, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut indices = HashMap::with_capacity(self.nodes.len());

        for id in self.nodes.keys() {
            indices.insert(id.clone(), graph.add_node(id.clone()));
        }
        for edge in self.edges.values() {
            if let (Some(&a), Some(&b)) = (indices.get(&edge.source), indices.get(&edge.target)) {
                graph.add_edge(a, b, edge.weight);
            }
        }

        (graph, indices)
    }

    /// Check that every edge endpoint is a node and that the adjacency
    /// indices exactly mirror the edge map
    pub fn is_consistent(&self) -> bool {
        let endpoints_exist = self
            .edges
            .values()
            .all(|e| self.nodes.contains_key(&e.source) && self.nodes.contains_key(&e.target));

        let mut outgoing: BTreeMap<&DocumentId, BTreeSet<&String>> = BTreeMap::new();
        let mut incoming: BTreeMap<&DocumentId, BTreeSet<&String>> = BTreeMap::new();
        for edge in self.edges.values() {
            outgoing.entry(&edge.source).or_default().insert(&edge.id);
            incoming.entry(&edge.target).or_default().insert(&edge.id);
        }

        let mirrors = |index: &BTreeMap<DocumentId, BTreeSet<String>>,
                       expected: &BTreeMap<&DocumentId, BTreeSet<&String>>| {
            index.iter().all(|(id, ids)| {
                let want = expected.get(id).cloned().unwrap_or_default();
                ids.iter().collect::<BTreeSet<_>>() == want
            }) && expected.keys().all(|id| index.contains_key(*id))
        };

        endpoints_exist && mirrors(&self.outgoing, &outgoing) && mirrors(&self.incoming, &incoming)
    }

    fn insert_edge_unchecked(&mut self, edge: Edge) {
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.id.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.id.clone());
        self.edges.insert(edge.id.clone(), edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> DocumentId {
        DocumentId::new(path)
    }

    fn graph_with(nodes: &[&str], links: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for n in nodes {
            graph.add_node(Node::new(id(n)));
        }
        for (a, b) in links {
            graph.add_edge(Edge::link(id(a), id(b))).unwrap();
        }
        graph
    }

    #[test]
    fn test_add_edge_requires_endpoints() {
        let mut graph = graph_with(&["a.md"], &[]);
        let err = graph.add_edge(Edge::link(id("a.md"), id("b.md"))).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_degrees_and_neighbors() {
        let graph = graph_with(
            &["a.md", "b.md", "c.md"],
            &[("a.md", "b.md"), ("c.md", "a.md"), ("a.md", "c.md")],
        );
        assert_eq!(graph.out_degree(&id("a.md")), 2);
        assert_eq!(graph.in_degree(&id("a.md")), 1);
        assert_eq!(graph.degree(&id("a.md")), 3);
        assert_eq!(graph.neighbors(&id("a.md")).len(), 2);
        assert!(graph.has_link(&id("c.md"), &id("a.md")));
        assert!(!graph.has_link(&id("b.md"), &id("a.md")));
    }

    #[test]
    fn test_replacing_edge_keeps_indices_consistent() {
        let mut graph = graph_with(&["a.md", "b.md"], &[("a.md", "b.md")]);
        let edge = Edge::link(id("a.md"), id("b.md")).with_link_metadata(
            Some("Intro".into()),
            None,
            None,
        );
        graph.add_edge(edge).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.out_degree(&id("a.md")), 1);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_remove_node_drops_incident_edges() {
        let mut graph = graph_with(
            &["a.md", "b.md", "c.md"],
            &[("a.md", "b.md"), ("b.md", "c.md")],
        );
        graph.remove_node(&id("b.md"));
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.out_degree(&id("a.md")), 0);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_relation_edges_are_ordered() {
        let edge = Edge::tag_relation(id("z.md"), id("a.md"), vec!["rust".into(), "graphs".into()]);
        assert_eq!(edge.source, id("a.md"));
        assert_eq!(edge.weight, 2.0);
        assert_eq!(edge.id, "tag:a.md<->z.md");

        let edge = Edge::category_relation(id("b.md"), id("a.md"));
        assert_eq!(edge.id, "category:a.md<->b.md");
    }

    #[test]
    fn test_neighborhood_expands_both_directions() {
        let graph = graph_with(
            &["a.md", "b.md", "c.md", "d.md", "e.md"],
            &[("a.md", "b.md"), ("c.md", "b.md"), ("c.md", "d.md")],
        );

        let one_hop = graph.neighborhood(&[id("b.md")], 1);
        let ids: Vec<&str> = one_hop.node_ids().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["a.md", "b.md", "c.md"]);
        assert_eq!(one_hop.edge_count(), 2);

        let two_hop = graph.neighborhood(&[id("b.md")], 2);
        assert_eq!(two_hop.node_count(), 4);
        assert!(!two_hop.contains_node(&id("e.md")));

        let isolated = graph.neighborhood(&[id("e.md"), id("missing.md")], 3);
        assert_eq!(isolated.node_count(), 1);
        assert!(two_hop.is_consistent());
    }

    #[test]
    fn test_to_petgraph() {
        let graph = graph_with(&["a.md", "b.md"], &[("a.md", "b.md")]);
        let (pg, indices) = graph.to_petgraph();
        assert_eq!(pg.node_count(), 2);
        assert_eq!(pg.edge_count(), 1);
        assert!(pg.contains_edge(indices[&id("a.md")], indices[&id("b.md")]));
    }
}
