//! Visitor-style traversals following outgoing edges.

use crate::graph::Graph;
use std::collections::{HashSet, VecDeque};
use wikigraph_core::DocumentId;

/// Whether a traversal continues after visiting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    Continue,
    Stop,
}

/// Depth-first walk from `start`. The visitor receives each reachable node
/// exactly once with its depth in the DFS tree; successors are explored in
/// identity order. Returns the visit order.
pub fn depth_first<F>(graph: &Graph, start: &DocumentId, mut visit: F) -> Vec<DocumentId>
where
    F: FnMut(&DocumentId, usize) -> VisitControl,
{
    let mut order = Vec::new();
    if !graph.contains_node(start) {
        return order;
    }

    let mut seen: HashSet<&DocumentId> = HashSet::new();
    let mut stack: Vec<(&DocumentId, usize)> = vec![(start, 0)];

    while let Some((node, depth)) = stack.pop() {
        if !seen.insert(node) {
            continue;
        }
        order.push(node.clone());
        if visit(node, depth) == VisitControl::Stop {
            break;
        }

        // reversed so the smallest successor is explored first
        for next in graph.successors(node).into_iter().rev() {
            if !seen.contains(next) {
                stack.push((next, depth + 1));
            }
        }
    }

    order
}

/// Breadth-first walk from `start`; the visitor receives each reachable node
/// exactly once with its hop distance. Returns the visit order.
pub fn breadth_first<F>(graph: &Graph, start: &DocumentId, mut visit: F) -> Vec<DocumentId>
where
    F: FnMut(&DocumentId, usize) -> VisitControl,
{
    let mut order = Vec::new();
    if !graph.contains_node(start) {
        return order;
    }

    let mut seen: HashSet<&DocumentId> = HashSet::new();
    let mut queue: VecDeque<(&DocumentId, usize)> = VecDeque::new();
    seen.insert(start);
    queue.push_back((start, 0));

    while let Some((node, depth)) = queue.pop_front() {
        order.push(node.clone());
        if visit(node, depth) == VisitControl::Stop {
            break;
        }

        for next in graph.successors(node) {
            if seen.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::{graph, id, names};

    fn sample() -> Graph {
        graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"), ("d", "a")],
        )
    }

    #[test]
    fn test_depth_first_visits_each_once() {
        let graph = sample();
        let mut depths = Vec::new();
        let order = depth_first(&graph, &id("a"), |_, depth| {
            depths.push(depth);
            VisitControl::Continue
        });
        assert_eq!(names(&order), vec!["a", "b", "d", "c"]);
        assert_eq!(depths, vec![0, 1, 2, 1]);
    }

    #[test]
    fn test_breadth_first_visits_by_distance() {
        let graph = sample();
        let mut depths = Vec::new();
        let order = breadth_first(&graph, &id("a"), |_, depth| {
            depths.push(depth);
            VisitControl::Continue
        });
        assert_eq!(names(&order), vec!["a", "b", "c", "d"]);
        assert_eq!(depths, vec![0, 1, 1, 2]);
    }

    #[test]
    fn test_visitor_can_stop() {
        let graph = sample();
        let order = breadth_first(&graph, &id("a"), |node, _| {
            if node.as_str() == "b" {
                VisitControl::Stop
            } else {
                VisitControl::Continue
            }
        });
        assert_eq!(names(&order), vec!["a", "b"]);
    }

    #[test]
    fn test_unknown_start() {
        let graph = sample();
        assert!(depth_first(&graph, &id("zzz"), |_, _| VisitControl::Continue).is_empty());
    }
}
