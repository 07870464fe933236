//! Component partitions.

use crate::graph::Graph;
use petgraph::algo::tarjan_scc;
use std::collections::{BTreeSet, HashSet};
use wikigraph_core::DocumentId;

/// Partition by DFS from every unvisited node in identity order, following
/// outgoing edges only.
///
/// The result depends on the visiting order for directed graphs: a node
/// reached from an earlier root joins that root's component.
pub fn connected_components(graph: &Graph) -> Vec<Vec<DocumentId>> {
    partition(graph, |g, id| g.successors(id))
}

/// Components of the graph with edge direction ignored
pub fn weakly_connected_components(graph: &Graph) -> Vec<Vec<DocumentId>> {
    partition(graph, |g, id| g.neighbors(id))
}

/// Strongly connected components (Tarjan)
pub fn strongly_connected_components(graph: &Graph) -> Vec<Vec<DocumentId>> {
    let (pg, _) = graph.to_petgraph();
    let mut components: Vec<Vec<DocumentId>> = tarjan_scc(&pg)
        .into_iter()
        .map(|members| {
            let mut ids: Vec<DocumentId> = members.into_iter().map(|ix| pg[ix].clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    components.sort_by(|a, b| a.first().cmp(&b.first()));
    components
}

fn partition<'a, F>(graph: &'a Graph, adjacent: F) -> Vec<Vec<DocumentId>>
where
    F: Fn(&'a Graph, &DocumentId) -> BTreeSet<&'a DocumentId>,
{
    let mut visited: HashSet<&DocumentId> = HashSet::new();
    let mut components = Vec::new();

    for root in graph.node_ids() {
        if !visited.insert(root) {
            continue;
        }

        let mut members = vec![root.clone()];
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for next in adjacent(graph, node) {
                if visited.insert(next) {
                    members.push(next.clone());
                    stack.push(next);
                }
            }
        }

        members.sort();
        components.push(members);
    }

    components
}
