//! Reachability and connectivity checks.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::models::{Graph, VertexId};

/// Which way links are followed during a reachability search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Along link direction (undirected links both ways).
    Forward,
    /// Against link direction (undirected links both ways).
    Backward,
    /// Ignoring direction.
    Either,
}

/// Vertices with at least one incident link, plus the depot if set.
pub fn active_vertices(graph: &Graph) -> BTreeSet<VertexId> {
    let mut active: BTreeSet<VertexId> = graph
        .links()
        .flat_map(|l| [l.from(), l.to()])
        .collect();
    if let Some(depot) = graph.depot() {
        active.insert(depot);
    }
    active
}

/// Vertices reachable from `start` following links in `direction`.
///
/// `start` itself is always included.
pub fn reachable(graph: &Graph, start: VertexId, direction: Direction) -> BTreeSet<VertexId> {
    let mut adjacency: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
    for link in graph.links() {
        let (a, b) = link.endpoints();
        let forward = !link.is_directed() || direction != Direction::Backward;
        let backward = !link.is_directed() || direction != Direction::Forward;
        if forward {
            adjacency.entry(a).or_default().push(b);
        }
        if backward {
            adjacency.entry(b).or_default().push(a);
        }
    }

    let mut seen = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(v) = queue.pop_front() {
        for &w in adjacency.get(&v).into_iter().flatten() {
            if seen.insert(w) {
                queue.push_back(w);
            }
        }
    }
    seen
}

/// `true` if all active vertices are connected when direction is ignored.
///
/// Vertices without links (other than the depot) are not considered.
pub fn is_connected(graph: &Graph) -> bool {
    let active = active_vertices(graph);
    let Some(&start) = active.first() else {
        return true;
    };
    let seen = reachable(graph, start, Direction::Either);
    active.iter().all(|v| seen.contains(v))
}

/// `true` if every active vertex can reach every other along link directions.
pub fn is_strongly_connected(graph: &Graph) -> bool {
    let active = active_vertices(graph);
    let Some(&start) = active.first() else {
        return true;
    };
    let forward = reachable(graph, start, Direction::Forward);
    let backward = reachable(graph, start, Direction::Backward);
    active
        .iter()
        .all(|v| forward.contains(v) && backward.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_is_connected() {
        let g = Graph::with_vertices(3);
        assert!(is_connected(&g));
        assert!(is_strongly_connected(&g));
    }

    #[test]
    fn test_isolated_vertices_ignored() {
        let mut g = Graph::with_vertices(5);
        g.add_edge(1, 2, 1).expect("valid");
        assert!(is_connected(&g));
    }

    #[test]
    fn test_isolated_depot_breaks_connectivity() {
        let mut g = Graph::with_vertices(3).with_depot(3);
        g.add_edge(1, 2, 1).expect("valid");
        assert!(!is_connected(&g));
    }

    #[test]
    fn test_two_components() {
        let mut g = Graph::with_vertices(4);
        g.add_edge(1, 2, 1).expect("valid");
        g.add_edge(3, 4, 1).expect("valid");
        assert!(!is_connected(&g));
    }

    #[test]
    fn test_directed_path_not_strong() {
        let mut g = Graph::with_vertices(3);
        g.add_arc(1, 2, 1).expect("valid");
        g.add_arc(2, 3, 1).expect("valid");
        assert!(is_connected(&g));
        assert!(!is_strongly_connected(&g));
        g.add_arc(3, 1, 1).expect("valid");
        assert!(is_strongly_connected(&g));
    }

    #[test]
    fn test_mixed_undirected_counts_both_ways() {
        let mut g = Graph::with_vertices(3);
        g.add_arc(1, 2, 1).expect("valid");
        g.add_arc(2, 3, 1).expect("valid");
        g.add_edge(3, 1, 1).expect("valid");
        assert!(is_strongly_connected(&g));
    }

    #[test]
    fn test_reachable_backward() {
        let mut g = Graph::with_vertices(3);
        g.add_arc(1, 2, 1).expect("valid");
        g.add_arc(2, 3, 1).expect("valid");
        let back = reachable(&g, 3, Direction::Backward);
        assert_eq!(back.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
        let fwd = reachable(&g, 3, Direction::Forward);
        assert_eq!(fwd.len(), 1);
    }
}
