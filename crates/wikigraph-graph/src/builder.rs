//! Builds [`Graph`] snapshots from the link index and document metadata.

use crate::graph::{Edge, Graph, Node};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use wikigraph_core::{DocumentId, DocumentMetadata, GraphConfig};
use wikigraph_index::LinkIndex;

/// Which documents a build covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GraphScope {
    /// Every known document
    #[default]
    All,
    /// Documents whose category equals the given one
    Category(String),
    /// Documents carrying any of the given tags
    Tags(Vec<String>),
}

/// Graph snapshot builder
pub struct GraphBuilder<'a> {
    index: &'a LinkIndex,
    metadata: &'a HashMap<DocumentId, DocumentMetadata>,
    config: GraphConfig,
}

impl<'a> GraphBuilder<'a> {
    /// `metadata` supplies titles, tags and categories; documents without an
    /// entry get defaults.
    pub fn new(index: &'a LinkIndex, metadata: &'a HashMap<DocumentId, DocumentMetadata>) -> Self {
        Self {
            index,
            metadata,
            config: GraphConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    fn node_for(&self, id: &DocumentId) -> Node {
        match self.metadata.get(id) {
            Some(metadata) => Node::from_metadata(id.clone(), metadata),
            None => Node::new(id.clone()),
        }
    }

    /// Build a graph over the documents selected by `scope`.
    ///
    /// Every selected document becomes a node, including those without
    /// edges. Link edges are added once per (source, target) pair from the
    /// first occurrence; self-links are not edges.
    pub fn build(&self, scope: &GraphScope) -> Graph {
        let mut graph = Graph::new();

        for id in self.index.documents() {
            let node = self.node_for(id);
            let selected = match scope {
                GraphScope::All => true,
                GraphScope::Category(category) => node.category.as_deref() == Some(category),
                GraphScope::Tags(tags) => node.has_any_tag(tags),
            };
            if selected {
                graph.add_node(node);
            }
        }

        self.add_link_edges(&mut graph);
        if self.config.tag_relations {
            self.add_tag_relations(&mut graph);
        }
        if self.config.category_relations {
            self.add_category_relations(&mut graph);
        }

        log::debug!(
            "Built graph ({:?}): {} nodes, {} edges",
            scope,
            graph.node_count(),
            graph.edge_count()
        );
        graph
    }

    /// Bounded-depth subgraph around `roots` of the whole-corpus graph
    pub fn build_subgraph(&self, roots: &[DocumentId], depth: usize) -> Graph {
        self.build(&GraphScope::All).neighborhood(roots, depth)
    }

    fn add_link_edges(&self, graph: &mut Graph) {
        let sources: Vec<DocumentId> = graph.node_ids().cloned().collect();
        for source in sources {
            for link in self.index.forward_links(&source) {
                let Some(target) = &link.target else {
                    continue;
                };
                if *target == source
                    || !graph.contains_node(target)
                    || graph.has_link(&source, target)
                {
                    continue;
                }

                let edge = Edge::link(source.clone(), target.clone()).with_link_metadata(
                    link.record.anchor.clone(),
                    link.record.display_text.clone(),
                    Some(link.context.clone()),
                );
                if let Err(e) = graph.add_edge(edge) {
                    log::warn!("Skipping link edge {} -> {}: {}", source, target, e);
                }
            }
        }
    }

    fn add_tag_relations(&self, graph: &mut Graph) {
        let mut by_tag: BTreeMap<&str, Vec<&DocumentId>> = BTreeMap::new();
        for node in graph.nodes() {
            for tag in &node.tags {
                by_tag.entry(tag.as_str()).or_default().push(&node.id);
            }
        }

        let mut shared: BTreeMap<(DocumentId, DocumentId), Vec<String>> = BTreeMap::new();
        for (tag, ids) in &by_tag {
            for (i, a) in ids.iter().enumerate() {
                for b in &ids[i + 1..] {
                    shared
                        .entry(((*a).clone(), (*b).clone()))
                        .or_default()
                        .push(tag.to_string());
                }
            }
        }

        let min_shared = self.config.min_shared_tags.max(1);
        for ((a, b), tags) in shared {
            if tags.len() >= min_shared {
                let edge = Edge::tag_relation(a, b, tags);
                if let Err(e) = graph.add_edge(edge) {
                    log::warn!("Skipping tag relation: {}", e);
                }
            }
        }
    }

    fn add_category_relations(&self, graph: &mut Graph) {
        let mut by_category: BTreeMap<String, BTreeSet<DocumentId>> = BTreeMap::new();
        for node in graph.nodes() {
            if let Some(category) = &node.category {
                by_category
                    .entry(category.clone())
                    .or_default()
                    .insert(node.id.clone());
            }
        }

        for members in by_category.values() {
            let members: Vec<&DocumentId> = members.iter().collect();
            for (i, a) in members.iter().enumerate() {
                for b in &members[i + 1..] {
                    let edge = Edge::category_relation((*a).clone(), (*b).clone());
                    if let Err(e) = graph.add_edge(edge) {
                        log::warn!("Skipping category relation: {}", e);
                    }
                }
            }
        }
    }
}
