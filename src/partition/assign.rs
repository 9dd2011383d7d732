//! Link-to-part assignment.

use std::collections::BTreeMap;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{BoundaryPolicy, Partition};
use crate::error::{ArcRouteError, Result};
use crate::models::{Graph, LinkId, VertexId};

/// Resolves `partition` into the part of every required link.
///
/// A [`Partition::ByLink`] is checked and returned as is. For a
/// [`Partition::ByVertex`] each required link is assigned by these rules,
/// in link id order:
///
/// 1. A link touching the depot goes to the part of its other endpoint.
/// 2. A link whose endpoints share a part goes to that part.
/// 3. A link spanning two parts is settled by `policy`.
/// 4. If only one endpoint has a part, the link goes there; a link with
///    no usable endpoint falls back to the depot's part.
///
/// Non-required links are left out; they only enter a part as connectors.
///
/// # Errors
///
/// A precondition error if the graph has no depot, `parts` is zero, a part
/// index is out of range or a required link ends up without a part;
/// [`ArcRouteError::UnknownLink`] if a link partition names a missing link.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use u_arcroute::models::Graph;
/// use u_arcroute::partition::{assign_links, BoundaryPolicy, Partition};
///
/// let mut g = Graph::with_vertices(3).with_depot(1);
/// g.add_edge(1, 2, 1).unwrap();
/// g.add_edge(2, 3, 1).unwrap();
/// g.add_edge(3, 1, 1).unwrap();
///
/// let by_vertex = Partition::ByVertex(BTreeMap::from([(1, 0), (2, 1), (3, 0)]));
/// let parts = assign_links(&g, &by_vertex, 2, BoundaryPolicy::LowerIndex).unwrap();
/// assert_eq!(parts, BTreeMap::from([(1, 1), (2, 0), (3, 0)]));
/// ```
pub fn assign_links(
    graph: &Graph,
    partition: &Partition,
    parts: usize,
    policy: BoundaryPolicy,
) -> Result<BTreeMap<LinkId, usize>> {
    let Some(depot) = graph.depot() else {
        return Err(ArcRouteError::precondition(
            "capacitated routing needs a depot",
        ));
    };
    if parts == 0 {
        return Err(ArcRouteError::precondition("part count must be positive"));
    }

    let assigned = match partition {
        Partition::ByLink(map) => {
            for (&id, &part) in map {
                if !graph.contains_link(id) {
                    return Err(ArcRouteError::UnknownLink(id));
                }
                check_part(part, parts)?;
            }
            map.clone()
        }
        Partition::ByVertex(map) => {
            for &part in map.values() {
                check_part(part, parts)?;
            }
            let mut rng = match policy {
                BoundaryPolicy::LowerIndex => None,
                BoundaryPolicy::Seeded(seed) => Some(StdRng::seed_from_u64(seed)),
            };
            let mut assigned = BTreeMap::new();
            let mut boundary = 0usize;
            for link in graph.links().filter(|l| l.is_required() && !l.is_added()) {
                let side = |v: VertexId| if v == depot { None } else { map.get(&v).copied() };
                let part = match (side(link.from()), side(link.to())) {
                    (Some(x), Some(y)) if x == y => Some(x),
                    (Some(x), Some(y)) => {
                        boundary += 1;
                        let (low, high) = (x.min(y), x.max(y));
                        match rng.as_mut() {
                            Some(rng) => Some(if rng.random_bool(0.5) { high } else { low }),
                            None => Some(low),
                        }
                    }
                    (Some(x), None) | (None, Some(x)) => Some(x),
                    (None, None) => map.get(&depot).copied(),
                };
                if let Some(part) = part {
                    assigned.insert(link.id(), part);
                }
            }
            debug!(
                "partition.assign: links={} boundary={boundary}",
                assigned.len()
            );
            assigned
        }
    };

    if let Some(link) = graph
        .links()
        .find(|l| l.is_required() && !l.is_added() && !assigned.contains_key(&l.id()))
    {
        return Err(ArcRouteError::precondition(format!(
            "required link {} is not assigned to a part",
            link.id()
        )));
    }
    Ok(assigned)
}

fn check_part(part: usize, parts: usize) -> Result<()> {
    if part >= parts {
        return Err(ArcRouteError::precondition(format!(
            "part index {part} out of range for {parts} parts"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Link;

    /// Depot 1; a path 1-2-3-4-5-1 around it.
    fn ring() -> Graph {
        let mut g = Graph::with_vertices(5).with_depot(1);
        for (a, b) in [(1, 2), (2, 3), (3, 4), (4, 5), (5, 1)] {
            g.add_edge(a, b, 1).unwrap();
        }
        g
    }

    fn halves() -> BTreeMap<usize, usize> {
        BTreeMap::from([(1, 1), (2, 0), (3, 0), (4, 1), (5, 1)])
    }

    #[test]
    fn test_by_vertex_lower_index() {
        let g = ring();
        let parts = assign_links(&g, &Partition::ByVertex(halves()), 2, BoundaryPolicy::LowerIndex)
            .expect("valid");
        // Link 1 touches the depot (part 1) but follows vertex 2.
        assert_eq!(
            parts,
            BTreeMap::from([(1, 0), (2, 0), (3, 0), (4, 1), (5, 1)])
        );
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let g = ring();
        let p = Partition::ByVertex(halves());
        let a = assign_links(&g, &p, 2, BoundaryPolicy::Seeded(7)).expect("valid");
        let b = assign_links(&g, &p, 2, BoundaryPolicy::Seeded(7)).expect("valid");
        assert_eq!(a, b);
        assert!(a[&3] <= 1);

        // Only the boundary link can differ between seeds.
        let outcomes: Vec<usize> = (0..32)
            .map(|seed| {
                let m = assign_links(&g, &p, 2, BoundaryPolicy::Seeded(seed)).expect("valid");
                assert_eq!(m[&2], 0);
                assert_eq!(m[&4], 1);
                m[&3]
            })
            .collect();
        assert!(outcomes.contains(&0));
        assert!(outcomes.contains(&1));
    }

    #[test]
    fn test_missing_endpoint_falls_back() {
        let g = ring();
        let map = BTreeMap::from([(2, 0), (3, 0), (5, 1)]);
        let parts = assign_links(&g, &Partition::ByVertex(map), 2, BoundaryPolicy::LowerIndex)
            .expect("valid");
        assert_eq!(parts[&3], 0);
        assert_eq!(parts[&4], 1);
    }

    #[test]
    fn test_depot_loop_uses_depot_part() {
        let mut g = ring();
        g.add_edge(1, 1, 2).unwrap();
        let parts = assign_links(&g, &Partition::ByVertex(halves()), 2, BoundaryPolicy::LowerIndex)
            .expect("valid");
        assert_eq!(parts[&6], 1);
    }

    #[test]
    fn test_non_required_skipped() {
        let mut g = ring();
        g.add_link(Link::edge(10, 2, 4, 1).with_required(false)).unwrap();
        let parts = assign_links(&g, &Partition::ByVertex(halves()), 2, BoundaryPolicy::LowerIndex)
            .expect("valid");
        assert!(!parts.contains_key(&10));
    }

    #[test]
    fn test_by_link_checks() {
        let g = ring();
        let full: BTreeMap<LinkId, usize> = (1..=5).map(|id| (id, id % 2)).collect();
        let ok = assign_links(&g, &Partition::ByLink(full.clone()), 2, BoundaryPolicy::LowerIndex);
        assert_eq!(ok.expect("valid"), full);

        let mut missing = full.clone();
        missing.remove(&3);
        let err = assign_links(&g, &Partition::ByLink(missing), 2, BoundaryPolicy::LowerIndex)
            .unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));

        let mut unknown = full.clone();
        unknown.insert(99, 0);
        let err = assign_links(&g, &Partition::ByLink(unknown), 2, BoundaryPolicy::LowerIndex)
            .unwrap_err();
        assert!(matches!(err, ArcRouteError::UnknownLink(99)));

        let err = assign_links(&g, &Partition::ByLink(full), 1, BoundaryPolicy::LowerIndex)
            .unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
    }

    #[test]
    fn test_needs_depot() {
        let mut g = Graph::with_vertices(2);
        g.add_edge(1, 2, 1).unwrap();
        let p = Partition::ByLink(BTreeMap::from([(1, 0)]));
        let err = assign_links(&g, &p, 1, BoundaryPolicy::LowerIndex).unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
    }
}
