//! Directed Chinese postman augmentation.
//!
//! # Algorithm
//!
//! A vertex with more arcs in than out (`delta < 0`) must gain outgoing
//! traversals, one with more out than in must gain incoming ones. A
//! transportation problem ships `-delta` units out of every in-heavy vertex
//! into the out-heavy vertices at shortest-path cost, and each shipped unit
//! becomes one duplicated shortest path.
//!
//! # Complexity
//!
//! O(n³) for the distance matrix plus the flow solve over |D⁻|·|D⁺| arcs.
//!
//! # Reference
//!
//! Edmonds, J. & Johnson, E.L. (1973). "Matching, Euler tours and the
//! Chinese postman", *Mathematical Programming* 5, 88-124.

use log::debug;

use super::correspondence::Correspondence;
use crate::distance::ShortestPaths;
use crate::error::Result;
use crate::flow::FlowNetwork;
use crate::models::{Cost, Graph, VertexId};

/// Balances every vertex of a directed graph by duplicating shortest paths.
///
/// Returns the added cost, which equals the flow objective.
///
/// # Errors
///
/// [`Phase::Flow`](crate::error::Phase::Flow) infeasibility if some
/// in-heavy vertex cannot reach the out-heavy ones.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::augment::augment_directed;
///
/// let mut g = Graph::with_vertices(3);
/// g.add_arc(1, 2, 1).unwrap();
/// g.add_arc(2, 3, 1).unwrap();
/// g.add_arc(3, 1, 4).unwrap();
/// g.add_arc(1, 3, 2).unwrap();
///
/// // Vertex 3 receives two arcs and sends one: one 3 -> 1 copy.
/// assert_eq!(augment_directed(&mut g).unwrap(), 4);
/// assert!(g.is_balanced());
/// ```
pub fn augment_directed(graph: &mut Graph) -> Result<Cost> {
    let table = graph.degree_table();
    let sources: Vec<VertexId> = table
        .iter()
        .filter(|(_, d)| d.delta() < 0)
        .map(|(&v, _)| v)
        .collect();
    let sinks: Vec<VertexId> = table
        .iter()
        .filter(|(_, d)| d.delta() > 0)
        .map(|(&v, _)| v)
        .collect();
    debug!(
        "augment.directed: sources={} sinks={}",
        sources.len(),
        sinks.len()
    );
    if sources.is_empty() && sinks.is_empty() {
        return Ok(0);
    }

    let paths = ShortestPaths::compute(graph);
    let nodes = Correspondence::new(sources.iter().chain(&sinks).copied());
    let mut network = FlowNetwork::new(nodes.len());
    for (i, &v) in nodes.ids().iter().enumerate() {
        network.set_demand(i, table.get(&v).map_or(0, |d| d.delta()));
    }

    let mut routes = Vec::new();
    for &s in &sources {
        for &t in &sinks {
            let (Some(i), Some(j), Some(d)) =
                (nodes.index_of(s), nodes.index_of(t), paths.distance(s, t))
            else {
                continue;
            };
            network.add_arc(i, j, d, None);
            routes.push((s, t));
        }
    }

    let flow = network.solve()?;
    for (arc, &(s, t)) in routes.iter().enumerate() {
        for _ in 0..flow.flow(arc) {
            paths.augment_with_path(graph, s, t)?;
        }
    }
    debug!("augment.directed: added_cost={}", flow.cost());
    Ok(flow.cost())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Phase;
    use proptest::prelude::*;

    #[test]
    fn test_balanced_graph_adds_nothing() {
        let mut g = Graph::with_vertices(3);
        g.add_arc(1, 2, 2).unwrap();
        g.add_arc(2, 3, 2).unwrap();
        g.add_arc(3, 1, 2).unwrap();
        let before = g.clone();
        assert_eq!(augment_directed(&mut g).expect("balanced"), 0);
        assert_eq!(g, before);
        assert_eq!(g.num_links(), 3);
    }

    #[test]
    fn test_single_shortfall() {
        let mut g = Graph::with_vertices(3);
        g.add_arc(1, 2, 1).unwrap();
        g.add_arc(2, 3, 1).unwrap();
        g.add_arc(1, 3, 5).unwrap();
        g.add_arc(3, 1, 1).unwrap();
        assert_eq!(augment_directed(&mut g).expect("strong"), 1);
        let added: Vec<_> = g.added_links().map(|l| l.endpoints()).collect();
        assert_eq!(added, vec![(3, 1)]);
        assert!(g.is_balanced());
    }

    #[test]
    fn test_transport_splits_supply() {
        // 1 is two arcs short on the in side; the copies go via 2 -> 1.
        let mut g = Graph::with_vertices(3);
        g.add_arc(1, 2, 1).unwrap();
        g.add_arc(1, 3, 1).unwrap();
        g.add_arc(2, 1, 3).unwrap();
        g.add_arc(3, 2, 1).unwrap();
        g.add_arc(1, 2, 1).unwrap();
        // delta: 1 = 3 - 1 = 2, 2 = 1 - 3 = -2, 3 = 0
        assert_eq!(augment_directed(&mut g).expect("strong"), 6);
        assert_eq!(g.added_links().count(), 2);
        assert!(g.is_balanced());
    }

    #[test]
    fn test_unreachable_demand_is_infeasible() {
        // 2 cannot reach 1 at all.
        let mut g = Graph::with_vertices(2);
        g.add_arc(1, 2, 1).unwrap();
        let err = augment_directed(&mut g).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Flow));
        assert_eq!(g.num_links(), 1);
    }

    fn strong_digraph() -> impl Strategy<Value = Graph> {
        (2usize..8)
            .prop_flat_map(|n| {
                (
                    Just(n),
                    proptest::collection::vec(1i64..10, n),
                    proptest::collection::vec((1usize..=n, 1usize..=n, 0i64..10), 0..14),
                )
            })
            .prop_map(|(n, ring, extra)| {
                let mut g = Graph::with_vertices(n);
                for (k, cost) in ring.into_iter().enumerate() {
                    g.add_arc(k + 1, (k + 1) % n + 1, cost).expect("vertices exist");
                }
                for (a, b, cost) in extra {
                    g.add_arc(a, b, cost).expect("vertices exist");
                }
                g
            })
    }

    proptest! {
        #[test]
        fn prop_zero_delta_after_augmentation(g in strong_digraph()) {
            let mut g = g;
            let added = augment_directed(&mut g).expect("strongly connected");
            prop_assert!(g.degree_table().values().all(|d| d.delta() == 0));
            prop_assert_eq!(g.added_cost(), added);
        }
    }
}
