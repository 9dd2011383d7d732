//! Windy postman augmentation.
//!
//! # Algorithm
//!
//! 1. **Parity.** Odd vertices are matched on the symmetric weight
//!    `c(a→b) + c(b→a)` and the matched paths duplicated, giving an even
//!    undirected multigraph.
//! 2. **Orientation.** Every link is first pointed in its cheaper direction
//!    a → b. A min-cost flow then repairs the resulting imbalance in units
//!    of two: flipping a link to b → a costs `c(b→a) - c(a→b)` and moves two
//!    units, and two extra traversals a → b (or b → a) cost twice that
//!    direction. Flow demands are `delta / 2`, which is integral because
//!    every degree is even.
//!
//! The result is a fully directed, balanced multigraph.
//!
//! # Reference
//!
//! Win, Z. (1989). "On the windy postman problem on Eulerian graphs",
//! *Mathematical Programming* 44, 97-112.

use std::collections::BTreeMap;

use log::debug;

use super::correspondence::Correspondence;
use super::pairing::pair_vertices;
use crate::distance::ShortestPaths;
use crate::error::{ArcRouteError, Phase, Result};
use crate::flow::FlowNetwork;
use crate::models::{Cost, Graph, Link, LinkId, VertexId};

/// Turns a windy graph into a balanced directed multigraph.
///
/// Returns the cost of the added duplicates. Every original link is kept
/// under its id, oriented in the direction it will be traversed.
///
/// # Errors
///
/// Infeasibility from matching or [`Phase::Orientation`] if the graph is
/// disconnected or contains directed links.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::augment::augment_windy;
///
/// // A single street: cheap one way, expensive back.
/// let mut g = Graph::with_vertices(2);
/// g.add_windy_edge(1, 2, 3, 8).unwrap();
///
/// augment_windy(&mut g).unwrap();
/// assert!(g.is_balanced());
/// assert_eq!(g.total_cost(), 11);
/// ```
pub fn augment_windy(graph: &mut Graph) -> Result<Cost> {
    if graph.has_directed() {
        return Err(ArcRouteError::infeasible(
            Phase::Orientation,
            "windy augmentation expects undirected links only",
        ));
    }

    let odd = graph.odd_vertices();
    debug!("augment.windy: odd_vertices={}", odd.len());
    if !odd.is_empty() {
        let paths = ShortestPaths::compute_with(graph, |link, _| {
            Some(link.cost() + link.reverse_cost())
        });
        let (pairs, _) = pair_vertices(&odd, |u, v| paths.distance(u, v), None)?;
        for (u, v) in pairs {
            paths.augment_with_path(graph, u, v)?;
        }
    }

    orient_windy(graph)?;
    let added = graph.added_cost();
    debug!("augment.windy: added_cost={added}");
    Ok(added)
}

/// Per-link arcs of the orientation network.
struct Choice {
    tail: VertexId,
    head: VertexId,
    forward: usize,
    flip: usize,
    backward: usize,
}

/// Orients an even undirected multigraph into a balanced directed one.
fn orient_windy(graph: &mut Graph) -> Result<()> {
    let mut delta: BTreeMap<VertexId, i64> =
        graph.vertex_ids().into_iter().map(|v| (v, 0)).collect();
    let mut base: BTreeMap<LinkId, (VertexId, VertexId)> = BTreeMap::new();
    for link in graph.links().filter(|l| !l.is_loop()) {
        let (a, b) = if link.reverse_cost() < link.cost() {
            (link.to(), link.from())
        } else {
            (link.from(), link.to())
        };
        *delta.entry(a).or_default() += 1;
        *delta.entry(b).or_default() -= 1;
        base.insert(link.id(), (a, b));
    }

    let nodes = Correspondence::new(delta.keys().copied());
    let mut network = FlowNetwork::new(nodes.len());
    for (&v, &d) in &delta {
        if d % 2 != 0 {
            return Err(ArcRouteError::infeasible(
                Phase::Orientation,
                format!("vertex {v} has odd imbalance {d}"),
            ));
        }
        if let Some(i) = nodes.index_of(v) {
            network.set_demand(i, d / 2);
        }
    }

    let mut choices: BTreeMap<LinkId, Choice> = BTreeMap::new();
    for (&id, &(a, b)) in &base {
        let (Some(link), Some(i), Some(j)) =
            (graph.link(id), nodes.index_of(a), nodes.index_of(b))
        else {
            continue;
        };
        let (Some(ab), Some(ba)) = (link.cost_from(a), link.cost_from(b)) else {
            continue;
        };
        let forward = network.add_arc(i, j, 2 * ab, None);
        let flip = network.add_arc(j, i, ba - ab, Some(1));
        let backward = network.add_arc(j, i, 2 * ba, None);
        choices.insert(
            id,
            Choice {
                tail: a,
                head: b,
                forward,
                flip,
                backward,
            },
        );
    }

    let flow = network.solve().map_err(|err| match err {
        ArcRouteError::Infeasible { reason, .. } => {
            ArcRouteError::infeasible(Phase::Orientation, reason)
        }
        other => other,
    })?;

    let mut next_id = graph.next_link_id();
    let mut oriented: Vec<Link> = Vec::with_capacity(graph.num_links());
    for link in graph.links() {
        let Some(choice) = choices.get(&link.id()) else {
            oriented.push(link.oriented(link.from()));
            continue;
        };
        let tail = if flow.flow(choice.flip) > 0 {
            choice.head
        } else {
            choice.tail
        };
        oriented.push(link.oriented(tail));
        for (arc, tail) in [(choice.forward, choice.tail), (choice.backward, choice.head)] {
            for _ in 0..2 * flow.flow(arc) {
                oriented.push(link.duplicate(next_id).oriented(tail));
                next_id += 1;
            }
        }
    }
    debug!(
        "augment.windy: orientation_cost={} links={}",
        flow.cost(),
        oriented.len()
    );
    graph.replace_links(oriented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_windy_edge() {
        let mut g = Graph::with_vertices(2);
        g.add_windy_edge(1, 2, 3, 8).unwrap();
        let added = augment_windy(&mut g).expect("connected");

        // One traversal each way, whichever copy carries which.
        assert_eq!(g.num_links(), 2);
        assert!(!g.has_undirected());
        assert!(g.is_balanced());
        assert_eq!(g.total_cost(), 11);
        assert_eq!(g.added_cost(), added);
        assert_eq!(g.link(2).and_then(Link::origin), Some(1));
    }

    #[test]
    fn test_cycle_takes_cheap_direction() {
        // Triangle cheap clockwise: no duplicates, no flips.
        let mut g = Graph::with_vertices(3);
        g.add_windy_edge(1, 2, 1, 5).unwrap();
        g.add_windy_edge(2, 3, 1, 5).unwrap();
        g.add_windy_edge(3, 1, 1, 5).unwrap();
        assert_eq!(augment_windy(&mut g).expect("even"), 0);
        assert_eq!(g.total_cost(), 3);
        assert!(g.is_balanced());
    }

    #[test]
    fn test_flip_against_preference() {
        // Both links prefer 1 -> 2; one must be flipped.
        let mut g = Graph::with_vertices(2);
        g.add_windy_edge(1, 2, 1, 4).unwrap();
        g.add_windy_edge(1, 2, 2, 3).unwrap();
        assert_eq!(augment_windy(&mut g).expect("even"), 0);
        // Flipping link 2 costs 1 more, flipping link 1 costs 3 more.
        assert_eq!(g.link(1).map(Link::endpoints), Some((1, 2)));
        assert_eq!(g.link(2).map(Link::endpoints), Some((2, 1)));
        assert_eq!(g.total_cost(), 4);
    }

    #[test]
    fn test_loop_kept() {
        let mut g = Graph::with_vertices(2);
        g.add_windy_edge(1, 2, 1, 1).unwrap();
        g.add_windy_edge(2, 1, 1, 1).unwrap();
        g.add_windy_edge(2, 2, 4, 6).unwrap();
        augment_windy(&mut g).expect("even");
        assert!(g.is_balanced());
        assert_eq!(g.link(3).map(Link::cost), Some(4));
    }

    #[test]
    fn test_rejects_arcs() {
        let mut g = Graph::with_vertices(2);
        g.add_arc(1, 2, 1).unwrap();
        let err = augment_windy(&mut g).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Orientation));
    }

    proptest! {
        #[test]
        fn prop_windy_result_is_balanced(
            n in 2usize..7,
            tree in proptest::collection::vec((0usize..50, 1i64..9, 1i64..9), 6),
            extra in proptest::collection::vec((0usize..50, 0usize..50, 0i64..9, 0i64..9), 0..8),
        ) {
            let mut g = Graph::with_vertices(n);
            for child in 2..=n {
                let (parent, c, r) = tree[child - 2];
                g.add_windy_edge(parent % (child - 1) + 1, child, c, r).expect("vertices exist");
            }
            for (a, b, c, r) in extra {
                g.add_windy_edge(a % n + 1, b % n + 1, c, r).expect("vertices exist");
            }
            let originals = g.num_links();
            let added = augment_windy(&mut g).expect("connected");
            prop_assert!(g.is_balanced());
            prop_assert!(!g.has_undirected());
            prop_assert!(g.is_strongly_connected());
            prop_assert_eq!(g.links().filter(|l| !l.is_added()).count(), originals);
            prop_assert_eq!(g.added_cost(), added);
        }
    }
}
