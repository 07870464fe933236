//! Degree, betweenness and PageRank centrality.

use super::paths::dijkstra_tree;
use super::{AlgorithmOptions, Outcome};
use crate::graph::Graph;
use std::collections::{BTreeMap, HashMap};
use wikigraph_core::DocumentId;

/// `(in + out) / (2 (N - 1))` per node; every score is 0 when `N <= 1`
pub fn degree_centrality(graph: &Graph) -> BTreeMap<DocumentId, f64> {
    let n = graph.node_count();
    let scale = if n > 1 { 1.0 / (2.0 * (n - 1) as f64) } else { 0.0 };

    graph
        .node_ids()
        .map(|id| (id.clone(), graph.degree(id) as f64 * scale))
        .collect()
}

/// Approximate betweenness centrality.
///
/// For each unordered node pair `{s, t}` with `s < t` one shortest path is
/// taken, from `s` to `t` when it exists and from `t` to `s` otherwise, and
/// its interior nodes are credited once. Scores are normalized by
/// `(N - 1)(N - 2) / 2`. Cancellation is checked once per source; a
/// cancelled run returns normalized partial scores.
pub fn betweenness_centrality(
    graph: &Graph,
    options: &AlgorithmOptions,
) -> Outcome<BTreeMap<DocumentId, f64>> {
    let ids: Vec<&DocumentId> = graph.node_ids().collect();
    let mut counts: HashMap<&DocumentId, f64> = ids.iter().map(|id| (*id, 0.0)).collect();
    let mut cancelled = false;

    let mut trees = Vec::with_capacity(ids.len());
    for &source in &ids {
        if options.is_cancelled() {
            cancelled = true;
            break;
        }
        trees.push(dijkstra_tree(graph, source).1);
    }

    for (i, &s) in ids.iter().enumerate().take(trees.len()) {
        for (j, &t) in ids.iter().enumerate().skip(i + 1) {
            if trees[i].contains_key(t) {
                credit_interior(&trees[i], s, t, &mut counts);
            } else if let Some(reverse) = trees.get(j)
                && reverse.contains_key(s)
            {
                credit_interior(reverse, t, s, &mut counts);
            }
        }
    }

    let n = ids.len();
    let norm = if n > 2 {
        ((n - 1) * (n - 2)) as f64 / 2.0
    } else {
        1.0
    };
    let scores = counts
        .into_iter()
        .map(|(id, count)| (id.clone(), count / norm))
        .collect();

    if cancelled {
        log::debug!("betweenness cancelled");
        Outcome::partial(scores)
    } else {
        Outcome::complete(scores)
    }
}

/// Credit every node strictly between `from` and `to` on the tree path
fn credit_interior<'a>(
    prev: &HashMap<&'a DocumentId, &'a DocumentId>,
    from: &DocumentId,
    to: &'a DocumentId,
    counts: &mut HashMap<&'a DocumentId, f64>,
) {
    let mut current = to;
    while let Some(&before) = prev.get(current) {
        if before == from {
            break;
        }
        if let Some(count) = counts.get_mut(before) {
            *count += 1.0;
        }
        current = before;
    }
}

/// PageRank by power iteration.
///
/// Each node starts at `1/N`; a round sets
/// `rank(v) = (1 - d)/N + d * sum(rank(u) / out(u))` over predecessors `u`.
/// Dangling nodes do not redistribute their rank. Cancellation is checked
/// once per round.
pub fn pagerank(
    graph: &Graph,
    damping: f64,
    iterations: usize,
    options: &AlgorithmOptions,
) -> Outcome<BTreeMap<DocumentId, f64>> {
    let n = graph.node_count();
    if n == 0 {
        return Outcome::complete(BTreeMap::new());
    }

    let ids: Vec<&DocumentId> = graph.node_ids().collect();
    let index: HashMap<&DocumentId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let out_degree: Vec<usize> = ids.iter().map(|id| graph.out_degree(id)).collect();
    let incoming: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            graph
                .in_edges(id)
                .filter_map(|edge| index.get(&edge.source).copied())
                .collect()
        })
        .collect();

    let base = (1.0 - damping) / n as f64;
    let mut rank = vec![1.0 / n as f64; n];
    let mut cancelled = false;

    for _ in 0..iterations {
        if options.is_cancelled() {
            cancelled = true;
            break;
        }

        let next: Vec<f64> = incoming
            .iter()
            .map(|preds| {
                let inflow: f64 = preds.iter().map(|&u| rank[u] / out_degree[u] as f64).sum();
                base + damping * inflow
            })
            .collect();
        rank = next;
    }

    let scores = ids.into_iter().cloned().zip(rank).collect();
    if cancelled {
        Outcome::partial(scores)
    } else {
        Outcome::complete(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::{graph, id};
    use tokio_util::sync::CancellationToken;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_degree_centrality() {
        let g = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("c", "d")],
        );
        let scores = degree_centrality(&g);
        assert!(close(scores[&id("e")], 0.0));
        assert!(close(scores[&id("b")], 2.0 / 8.0));
        assert!(close(scores[&id("a")], 1.0 / 8.0));
    }

    #[test]
    fn test_degree_centrality_single_node() {
        let g = graph(&["a"], &[]);
        assert!(close(degree_centrality(&g)[&id("a")], 0.0));
    }

    #[test]
    fn test_betweenness_chain() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let scores = betweenness_centrality(&g, &AlgorithmOptions::new()).into_value();
        // one pair (a, c) routes through b; norm = 2 * 1 / 2
        assert!(close(scores[&id("b")], 1.0));
        assert!(close(scores[&id("a")], 0.0));
        assert!(close(scores[&id("c")], 0.0));
    }

    #[test]
    fn test_betweenness_uses_reverse_path() {
        // c -> b -> a only: the pair {a, c} is routed c to a
        let g = graph(&["a", "b", "c"], &[("c", "b"), ("b", "a")]);
        let scores = betweenness_centrality(&g, &AlgorithmOptions::new()).into_value();
        assert!(close(scores[&id("b")], 1.0));
        assert!(close(scores[&id("a")], 0.0));
        assert!(close(scores[&id("c")], 0.0));
    }

    #[test]
    fn test_betweenness_counts_each_pair_once() {
        // a <-> b <-> c: both directions exist, only a -> c is counted
        let g = graph(
            &["a", "b", "c"],
            &[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")],
        );
        let scores = betweenness_centrality(&g, &AlgorithmOptions::new()).into_value();
        assert!(close(scores[&id("b")], 1.0));
    }

    #[test]
    fn test_betweenness_cancelled() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let token = CancellationToken::new();
        token.cancel();
        let outcome = betweenness_centrality(&g, &AlgorithmOptions::new().with_cancellation(token));
        assert!(outcome.cancelled);
        assert_eq!(outcome.value.len(), 3);
        assert!(outcome.value.values().all(|v| *v == 0.0));
    }

    #[test]
    fn test_pagerank_cycle_is_uniform() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let ranks = pagerank(&g, 0.85, 50, &AlgorithmOptions::new()).into_value();
        for value in ranks.values() {
            assert!(close(*value, 1.0 / 3.0));
        }
    }

    #[test]
    fn test_pagerank_favors_linked_node() {
        let g = graph(&["a", "b", "hub"], &[("a", "hub"), ("b", "hub")]);
        let ranks = pagerank(&g, 0.85, 50, &AlgorithmOptions::new()).into_value();
        assert!(ranks[&id("hub")] > ranks[&id("a")]);
        assert!(close(ranks[&id("a")], 0.15 / 3.0));
    }

    #[test]
    fn test_pagerank_empty() {
        let outcome = pagerank(&Graph::new(), 0.85, 50, &AlgorithmOptions::new());
        assert!(outcome.value.is_empty());
        assert!(!outcome.cancelled);
    }
}
