//! Undirected Chinese postman augmentation.
//!
//! # Algorithm
//!
//! The odd-degree vertices of any graph come in an even number. They are
//! paired by an exact minimum-weight perfect matching on shortest-path
//! distance, and the shortest path of every pair is duplicated. Each
//! duplicated path flips the parity of its two ends only, so afterwards
//! every degree is even.
//!
//! # Complexity
//!
//! O(n³) for the distance matrix plus O(k³) for the matching, where k is
//! the number of odd vertices.
//!
//! # Reference
//!
//! Edmonds, J. & Johnson, E.L. (1973). "Matching, Euler tours and the
//! Chinese postman", *Mathematical Programming* 5, 88-124.

use log::debug;

use super::pairing::pair_vertices;
use crate::distance::ShortestPaths;
use crate::error::Result;
use crate::models::{Cost, Graph};

/// Makes every vertex degree even by duplicating shortest paths.
///
/// Returns the added cost, which equals the matching objective.
///
/// # Errors
///
/// Infeasibility if the odd vertices cannot all be paired along existing
/// paths.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::augment::augment_undirected;
///
/// // Path 1-2-3: the ends are odd and get joined by a copy of the path.
/// let mut g = Graph::with_vertices(3);
/// g.add_edge(1, 2, 4).unwrap();
/// g.add_edge(2, 3, 1).unwrap();
///
/// let added = augment_undirected(&mut g).unwrap();
/// assert_eq!(added, 5);
/// assert_eq!(g.num_links(), 4);
/// assert!(g.odd_vertices().is_empty());
/// ```
pub fn augment_undirected(graph: &mut Graph) -> Result<Cost> {
    let odd = graph.odd_vertices();
    debug!("augment.undirected: odd_vertices={}", odd.len());
    if odd.is_empty() {
        return Ok(0);
    }

    let paths = ShortestPaths::compute(graph);
    let (pairs, cost) = pair_vertices(&odd, |u, v| paths.distance(u, v), None)?;
    for (u, v) in pairs {
        paths.augment_with_path(graph, u, v)?;
    }
    debug!("augment.undirected: added_cost={cost}");
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Link;
    use proptest::prelude::*;

    #[test]
    fn test_four_cycle_missing_link() {
        // Cycle 1-2-3-4-1 with (1,2) removed: 1 and 2 become odd and the
        // only path joining them is 1-4-3-2.
        let mut g = Graph::with_vertices(4);
        g.add_edge(2, 3, 1).unwrap();
        g.add_edge(3, 4, 1).unwrap();
        g.add_edge(4, 1, 1).unwrap();

        let added = augment_undirected(&mut g).expect("connected");
        assert_eq!(added, 3);
        assert_eq!(g.num_links(), 6);
        assert_eq!(g.added_links().count(), 3);
        assert_eq!(g.added_cost(), 3);
        assert!(g.odd_vertices().is_empty());
    }

    #[test]
    fn test_even_graph_untouched() {
        let mut g = Graph::with_vertices(3);
        g.add_edge(1, 2, 1).unwrap();
        g.add_edge(2, 3, 1).unwrap();
        g.add_edge(3, 1, 1).unwrap();
        let before = g.clone();
        assert_eq!(augment_undirected(&mut g).expect("even"), 0);
        assert_eq!(g, before);
    }

    #[test]
    fn test_prefers_cheap_pairing() {
        // Star centre 1 with leaves 2, 3, 4 and a cheap extra edge 2-3.
        // Odd: 1 (degree 3), 4; 2 and 3 have degree 2.
        let mut g = Graph::with_vertices(4);
        g.add_edge(1, 2, 5).unwrap();
        g.add_edge(1, 3, 5).unwrap();
        g.add_edge(1, 4, 2).unwrap();
        g.add_edge(2, 3, 1).unwrap();
        let added = augment_undirected(&mut g).expect("connected");
        assert_eq!(added, 2);
        assert_eq!(g.link(5).and_then(|l| l.origin()), Some(3));
    }

    #[test]
    fn test_pairs_stay_in_components() {
        // Two paths: odd vertices 1, 3 and 4, 6.
        let mut g = Graph::with_vertices(6);
        g.add_edge(1, 2, 1).unwrap();
        g.add_edge(2, 3, 1).unwrap();
        g.add_edge(4, 5, 1).unwrap();
        g.add_edge(5, 6, 1).unwrap();
        assert_eq!(augment_undirected(&mut g).expect("paired"), 4);
        assert!(g.odd_vertices().is_empty());
    }

    #[test]
    fn test_isolated_loop_ignored() {
        let mut g = Graph::with_vertices(4);
        g.add_edge(1, 2, 1).unwrap();
        g.add_edge(1, 3, 1).unwrap();
        g.add_link(Link::edge(7, 4, 4, 1)).unwrap();
        assert_eq!(augment_undirected(&mut g).expect("odd pair 2, 3"), 2);
        assert_eq!(g.num_links(), 5);
    }

    fn connected_graph() -> impl Strategy<Value = Graph> {
        (2usize..9)
            .prop_flat_map(|n| {
                (
                    Just(n),
                    proptest::collection::vec((0usize..100, 1i64..20), n - 1),
                    proptest::collection::vec((1usize..=n, 1usize..=n, 0i64..20), 0..12),
                )
            })
            .prop_map(|(n, tree, extra)| {
                let mut g = Graph::with_vertices(n);
                for (k, (parent, cost)) in tree.into_iter().enumerate() {
                    let child = k + 2;
                    let p = parent % (child - 1) + 1;
                    g.add_edge(p, child, cost).expect("vertices exist");
                }
                for (a, b, cost) in extra {
                    g.add_edge(a, b, cost).expect("vertices exist");
                }
                g
            })
    }

    proptest! {
        #[test]
        fn prop_degrees_even_after_augmentation(g in connected_graph()) {
            let mut g = g;
            let before = g.total_cost();
            let added = augment_undirected(&mut g).expect("connected");
            prop_assert!(g.odd_vertices().is_empty());
            prop_assert_eq!(g.added_cost(), added);
            prop_assert_eq!(g.total_cost(), before + added);
        }

        #[test]
        fn prop_deterministic(g in connected_graph()) {
            let mut a = g.clone();
            let mut b = g;
            augment_undirected(&mut a).expect("connected");
            augment_undirected(&mut b).expect("connected");
            prop_assert_eq!(a, b);
        }
    }
}
