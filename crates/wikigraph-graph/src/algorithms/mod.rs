//! Pure graph algorithms over an immutable [`Graph`](crate::Graph) snapshot.
//!
//! Long-running algorithms (betweenness, PageRank, all-paths enumeration and
//! label propagation) take [`AlgorithmOptions`] and check for cancellation
//! at each round. A cancelled run returns its partial result in an
//! [`Outcome`] with `cancelled` set.

pub mod centrality;
pub mod clustering;
pub mod components;
pub mod paths;
pub mod traversal;

pub use centrality::{betweenness_centrality, degree_centrality, pagerank};
pub use clustering::{Clustering, average_clustering_coefficient, label_propagation, local_clustering_coefficient};
pub use components::{connected_components, strongly_connected_components, weakly_connected_components};
pub use paths::{all_paths, find_cycles, shortest_path, topological_sort};
pub use traversal::{VisitControl, breadth_first, depth_first};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Execution options shared by the long-running algorithms
#[derive(Debug, Clone, Default)]
pub struct AlgorithmOptions {
    cancel: Option<CancellationToken>,
}

impl AlgorithmOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the next checkpoint once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Result of a cancellable computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub value: T,
    /// Whether the run stopped early; `value` is then partial
    pub cancelled: bool,
}

impl<T> Outcome<T> {
    pub(crate) fn complete(value: T) -> Self {
        Self {
            value,
            cancelled: false,
        }
    }

    pub(crate) fn partial(value: T) -> Self {
        Self {
            value,
            cancelled: true,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
