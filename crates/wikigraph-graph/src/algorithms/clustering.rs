//! Label propagation communities and clustering coefficients.

use super::{AlgorithmOptions, Outcome};
use crate::graph::Graph;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use wikigraph_core::DocumentId;

/// Community assignment produced by [`label_propagation`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clustering {
    /// Cluster index of every node
    pub labels: BTreeMap<DocumentId, usize>,
    /// Members per cluster, largest first; members sorted
    pub clusters: Vec<Vec<DocumentId>>,
    /// Rounds executed
    pub iterations: usize,
}

impl Clustering {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn cluster_of(&self, id: &DocumentId) -> Option<&[DocumentId]> {
        self.labels
            .get(id)
            .and_then(|&label| self.clusters.get(label))
            .map(Vec::as_slice)
    }
}

/// Community detection by label propagation over undirected adjacency.
///
/// Every node starts with its own label. Each round visits the nodes in an
/// order shuffled by `rng` and moves each one to the label most common
/// among its neighbors, ties going to the smallest label. Isolated nodes
/// keep their label. The run ends when a round changes nothing or after
/// `max_iterations` rounds.
pub fn label_propagation<R>(
    graph: &Graph,
    max_iterations: usize,
    rng: &mut R,
    options: &AlgorithmOptions,
) -> Outcome<Clustering>
where
    R: Rng + ?Sized,
{
    let ids: Vec<&DocumentId> = graph.node_ids().collect();
    let index: HashMap<&DocumentId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let adjacency: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| {
            graph
                .neighbors(id)
                .into_iter()
                .filter_map(|n| index.get(n).copied())
                .collect()
        })
        .collect();

    let mut labels: Vec<usize> = (0..ids.len()).collect();
    let mut order: Vec<usize> = (0..ids.len()).collect();
    let mut iterations = 0;
    let mut cancelled = false;

    while iterations < max_iterations {
        if options.is_cancelled() {
            cancelled = true;
            break;
        }
        iterations += 1;
        order.shuffle(rng);

        let mut changed = false;
        for &node in &order {
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for &neighbor in &adjacency[node] {
                *counts.entry(labels[neighbor]).or_insert(0) += 1;
            }

            // first maximum in ascending label order
            let best = counts
                .iter()
                .fold(None, |best: Option<(usize, usize)>, (&label, &count)| match best {
                    Some((_, top)) if top >= count => best,
                    _ => Some((label, count)),
                });

            if let Some((label, _)) = best
                && labels[node] != label
            {
                labels[node] = label;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    log::debug!(
        "label propagation finished after {} rounds (cancelled: {})",
        iterations,
        cancelled
    );

    let clustering = group(&ids, &labels, iterations);
    if cancelled {
        Outcome::partial(clustering)
    } else {
        Outcome::complete(clustering)
    }
}

fn group(ids: &[&DocumentId], labels: &[usize], iterations: usize) -> Clustering {
    let mut by_label: BTreeMap<usize, Vec<DocumentId>> = BTreeMap::new();
    for (id, &label) in ids.iter().zip(labels) {
        by_label.entry(label).or_default().push((*id).clone());
    }

    let mut clusters: Vec<Vec<DocumentId>> = by_label.into_values().collect();
    for members in &mut clusters {
        members.sort();
    }
    clusters.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.first().cmp(&b.first())));

    let labels = clusters
        .iter()
        .enumerate()
        .flat_map(|(i, members)| members.iter().map(move |id| (id.clone(), i)))
        .collect();

    Clustering {
        labels,
        clusters,
        iterations,
    }
}

/// `2e / (k (k - 1))` where `k` is the undirected neighbor count and `e` the
/// number of adjacent neighbor pairs. `None` when `k < 2` or the node is
/// unknown.
pub fn local_clustering_coefficient(graph: &Graph, id: &DocumentId) -> Option<f64> {
    if !graph.contains_node(id) {
        return None;
    }
    let neighbors: Vec<&DocumentId> = graph.neighbors(id).into_iter().collect();
    let k = neighbors.len();
    if k < 2 {
        return None;
    }

    let mut links = 0usize;
    for (i, a) in neighbors.iter().enumerate() {
        for b in &neighbors[i + 1..] {
            if graph.is_adjacent(a, b) {
                links += 1;
            }
        }
    }

    Some(2.0 * links as f64 / (k * (k - 1)) as f64)
}

/// Mean local coefficient over nodes where it is defined; 0.0 when none is
pub fn average_clustering_coefficient(graph: &Graph) -> f64 {
    let values: Vec<f64> = graph
        .node_ids()
        .filter_map(|id| local_clustering_coefficient(graph, id))
        .collect();

    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::{graph, id, names};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tokio_util::sync::CancellationToken;

    fn two_triangles() -> Graph {
        graph(
            &["a", "b", "c", "x", "y", "z"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("x", "y"),
                ("y", "z"),
                ("z", "x"),
            ],
        )
    }

    #[test]
    fn test_label_propagation_separates_triangles() {
        let g = two_triangles();
        let mut rng = StdRng::seed_from_u64(42);
        let outcome = label_propagation(&g, 100, &mut rng, &AlgorithmOptions::new());
        assert!(!outcome.cancelled);

        let clustering = outcome.value;
        assert_eq!(clustering.cluster_count(), 2);
        assert_eq!(names(&clustering.clusters[0]), vec!["a", "b", "c"]);
        assert_eq!(names(&clustering.clusters[1]), vec!["x", "y", "z"]);
        assert_eq!(clustering.labels[&id("b")], 0);
        assert_eq!(clustering.cluster_of(&id("z")).map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_isolated_nodes_keep_own_cluster() {
        let g = graph(&["a", "b"], &[]);
        let mut rng = StdRng::seed_from_u64(1);
        let clustering = label_propagation(&g, 10, &mut rng, &AlgorithmOptions::new()).into_value();
        assert_eq!(clustering.cluster_count(), 2);
        assert_eq!(clustering.iterations, 1);
    }

    #[test]
    fn test_label_propagation_iteration_cap() {
        let g = two_triangles();
        let mut rng = StdRng::seed_from_u64(7);
        let clustering = label_propagation(&g, 0, &mut rng, &AlgorithmOptions::new()).into_value();
        assert_eq!(clustering.iterations, 0);
        assert_eq!(clustering.cluster_count(), 6);
    }

    #[test]
    fn test_label_propagation_cancelled() {
        let g = two_triangles();
        let token = CancellationToken::new();
        token.cancel();
        let mut rng = StdRng::seed_from_u64(7);
        let outcome = label_propagation(
            &g,
            100,
            &mut rng,
            &AlgorithmOptions::new().with_cancellation(token),
        );
        assert!(outcome.cancelled);
        assert_eq!(outcome.value.labels.len(), 6);
    }

    #[test]
    fn test_local_clustering_coefficient() {
        let g = graph(
            &["hub", "a", "b", "c", "t1", "t2", "t3"],
            &[
                ("hub", "a"),
                ("hub", "b"),
                ("hub", "c"),
                ("t1", "t2"),
                ("t2", "t3"),
                ("t3", "t1"),
            ],
        );
        assert_eq!(local_clustering_coefficient(&g, &id("hub")), Some(0.0));
        assert_eq!(local_clustering_coefficient(&g, &id("a")), None);
        assert_eq!(local_clustering_coefficient(&g, &id("t1")), Some(1.0));
        assert_eq!(local_clustering_coefficient(&g, &id("missing")), None);

        // defined for hub (0.0) and the three triangle nodes (1.0)
        assert!((average_clustering_coefficient(&g) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_average_clustering_undefined_everywhere() {
        let g = graph(&["a", "b"], &[("a", "b")]);
        assert_eq!(average_clustering_coefficient(&g), 0.0);
    }
}
