//! Shortest paths, simple-path enumeration, cycles and topological order.

use super::{AlgorithmOptions, Outcome};
use crate::graph::Graph;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};
use wikigraph_core::DocumentId;

/// Min-heap entry for Dijkstra; ties broken by identity for determinism
#[derive(Debug, Clone, Copy)]
pub(crate) struct State<'a> {
    pub cost: f64,
    pub node: &'a DocumentId,
}

impl PartialEq for State<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State<'_> {}

impl PartialOrd for State<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(self.node))
    }
}

/// Single-source Dijkstra returning each reachable node's predecessor.
///
/// Edge weights are used as given (default 1). A predecessor is only
/// replaced by a strictly shorter route, so exactly one shortest path per
/// target is recorded.
pub(crate) fn dijkstra_tree<'a>(
    graph: &'a Graph,
    source: &'a DocumentId,
) -> (HashMap<&'a DocumentId, f64>, HashMap<&'a DocumentId, &'a DocumentId>) {
    let mut dist: HashMap<&DocumentId, f64> = HashMap::new();
    let mut prev: HashMap<&DocumentId, &DocumentId> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(source, 0.0);
    heap.push(State {
        cost: 0.0,
        node: source,
    });

    while let Some(State { cost, node }) = heap.pop() {
        if dist.get(node).is_some_and(|&best| cost > best) {
            continue;
        }
        for edge in graph.out_edges(node) {
            let next = &edge.target;
            let candidate = cost + edge.weight;
            let better = dist.get(next).is_none_or(|&current| candidate < current);
            if better {
                dist.insert(next, candidate);
                prev.insert(next, node);
                heap.push(State {
                    cost: candidate,
                    node: next,
                });
            }
        }
    }

    (dist, prev)
}

/// Walk predecessors back from `target`; `None` when unreachable
pub(crate) fn path_from_tree<'a>(
    prev: &HashMap<&'a DocumentId, &'a DocumentId>,
    source: &'a DocumentId,
    target: &'a DocumentId,
) -> Option<Vec<&'a DocumentId>> {
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = prev.get(current)?;
        path.push(current);
    }
    path.reverse();
    Some(path)
}

/// Weighted shortest path from `from` to `to`.
///
/// Returns `None` when either node is absent or `to` is unreachable.
pub fn shortest_path(graph: &Graph, from: &DocumentId, to: &DocumentId) -> Option<Vec<DocumentId>> {
    let from = graph.node(from).map(|n| &n.id)?;
    let to = graph.node(to).map(|n| &n.id)?;

    let (_, prev) = dijkstra_tree(graph, from);
    path_from_tree(&prev, from, to).map(|path| path.into_iter().cloned().collect())
}

/// Every simple path from `from` to `to` with at most `max_hops` edges, in
/// lexicographic successor order.
pub fn all_paths(
    graph: &Graph,
    from: &DocumentId,
    to: &DocumentId,
    max_hops: usize,
    options: &AlgorithmOptions,
) -> Outcome<Vec<Vec<DocumentId>>> {
    let mut found = Vec::new();
    if from == to || !graph.contains_node(from) || !graph.contains_node(to) {
        return Outcome::complete(found);
    }

    // (node, successors still to try)
    let mut stack: Vec<(&DocumentId, Vec<&DocumentId>)> = Vec::new();
    let mut path: Vec<&DocumentId> = Vec::new();
    let mut on_path: HashSet<&DocumentId> = HashSet::new();

    let start = graph.node(from).map(|n| &n.id);
    if let Some(start) = start {
        path.push(start);
        on_path.insert(start);
        stack.push((start, successors_rev(graph, start)));
    }

    while let Some((_, pending)) = stack.last_mut() {
        if options.is_cancelled() {
            return Outcome::partial(found);
        }

        let Some(next) = pending.pop() else {
            // backtrack
            stack.pop();
            if let Some(node) = path.pop() {
                on_path.remove(node);
            }
            continue;
        };

        if on_path.contains(next) {
            continue;
        }
        if next == to {
            // reaching `to` adds the path's `path.len()`-th edge
            if path.len() > max_hops {
                continue;
            }
            let mut complete: Vec<DocumentId> = path.iter().map(|&n| n.clone()).collect();
            complete.push(next.clone());
            found.push(complete);
            continue;
        }
        if path.len() < max_hops {
            path.push(next);
            on_path.insert(next);
            stack.push((next, successors_rev(graph, next)));
        }
    }

    Outcome::complete(found)
}

fn successors_rev<'a>(graph: &'a Graph, node: &DocumentId) -> Vec<&'a DocumentId> {
    graph.successors(node).into_iter().rev().collect()
}

/// Detect cycles with a DFS recursion-stack marker.
///
/// Each back-edge to a node on the current DFS stack yields one cycle: the
/// path slice from that node, closed by repeating it.
pub fn find_cycles(graph: &Graph) -> Vec<Vec<DocumentId>> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<&DocumentId> = HashSet::new();

    for root in graph.node_ids() {
        if visited.contains(root) {
            continue;
        }

        let mut path: Vec<&DocumentId> = vec![root];
        let mut position: HashMap<&DocumentId, usize> = HashMap::from([(root, 0)]);
        let mut stack: Vec<Vec<&DocumentId>> = vec![successors_rev(graph, root)];
        visited.insert(root);

        while let Some(pending) = stack.last_mut() {
            let Some(next) = pending.pop() else {
                stack.pop();
                if let Some(done) = path.pop() {
                    position.remove(done);
                }
                continue;
            };

            if let Some(&start) = position.get(next) {
                let mut cycle: Vec<DocumentId> = path[start..].iter().map(|&n| n.clone()).collect();
                cycle.push(next.clone());
                cycles.push(cycle);
            } else if visited.insert(next) {
                position.insert(next, path.len());
                path.push(next);
                stack.push(successors_rev(graph, next));
            }
        }
    }

    cycles
}

/// Kahn's algorithm; `None` exactly when the graph has a cycle.
///
/// Among ready nodes the smallest identity is emitted first.
pub fn topological_sort(graph: &Graph) -> Option<Vec<DocumentId>> {
    let mut in_degree: BTreeMap<&DocumentId, usize> =
        graph.node_ids().map(|id| (id, graph.in_degree(id))).collect();
    let mut ready: BTreeSet<&DocumentId> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(node) = ready.pop_first() {
        order.push(node.clone());
        for edge in graph.out_edges(node) {
            if let Some(d) = in_degree.get_mut(&edge.target) {
                *d -= 1;
                if *d == 0 {
                    ready.insert(&edge.target);
                }
            }
        }
    }

    (order.len() == graph.node_count()).then_some(order)
}
