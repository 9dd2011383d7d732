//! Pairing of unbalanced vertices by exact minimum-weight matching.

use log::{debug, warn};

use super::correspondence::Correspondence;
use crate::error::Result;
use crate::matching::min_weight_perfect_matching;
use crate::models::{Cost, VertexId};

/// Pairs `vertices` so the summed `weight` of the pairs is minimal.
///
/// `weight(u, v)` is the cost of joining `u` and `v`, `None` when they
/// cannot be joined. Such pairs get `penalty` if one is given and are left
/// out of the matching graph otherwise. Returns the pairs as vertex ids and
/// the matching objective.
pub(crate) fn pair_vertices<F>(
    vertices: &[VertexId],
    weight: F,
    penalty: Option<Cost>,
) -> Result<(Vec<(VertexId, VertexId)>, Cost)>
where
    F: Fn(VertexId, VertexId) -> Option<Cost>,
{
    let table = Correspondence::new(vertices.iter().copied());
    let n = table.len();
    let mut edges = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    let mut penalized = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let (Some(u), Some(v)) = (table.vertex(i), table.vertex(j)) else {
                continue;
            };
            match (weight(u, v), penalty) {
                (Some(w), _) => edges.push((i, j, w)),
                (None, Some(p)) => {
                    penalized += 1;
                    edges.push((i, j, p));
                }
                (None, None) => {}
            }
        }
    }
    if penalized > 0 {
        warn!("pairing: {penalized} unreachable pairs priced with penalty");
    }

    let matching = min_weight_perfect_matching(n, &edges)?;
    debug!(
        "pairing: vertices={} pairs={} cost={}",
        n,
        matching.pairs().len(),
        matching.cost()
    );
    let pairs = matching
        .pairs()
        .iter()
        .filter_map(|&(i, j)| Some((table.vertex(i)?, table.vertex(j)?)))
        .collect();
    Ok((pairs, matching.cost()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArcRouteError, Phase};

    #[test]
    fn test_pairs_by_vertex_id() {
        // Points on a line: 10, 11, 20, 21
        let pos = |v: VertexId| v as Cost;
        let (pairs, cost) =
            pair_vertices(&[10, 20, 11, 21], |u, v| Some((pos(u) - pos(v)).abs()), None)
                .expect("complete");
        let mut pairs: Vec<_> = pairs
            .into_iter()
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        pairs.sort();
        assert_eq!(pairs, vec![(10, 11), (20, 21)]);
        assert_eq!(cost, 2);
    }

    #[test]
    fn test_empty_set() {
        let (pairs, cost) = pair_vertices(&[], |_, _| Some(1), None).expect("empty");
        assert!(pairs.is_empty());
        assert_eq!(cost, 0);
    }

    #[test]
    fn test_unreachable_without_penalty() {
        let err = pair_vertices(&[1, 2], |_, _| None, None).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Matching));
    }

    #[test]
    fn test_penalty_avoided_when_possible() {
        // 1-2 and 3-4 reachable, cross pairs not
        let w = |u: VertexId, v: VertexId| ((u <= 2) == (v <= 2)).then_some(5);
        let (pairs, cost) = pair_vertices(&[1, 2, 3, 4], w, Some(1_000)).expect("penalized");
        assert_eq!(cost, 10);
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_odd_count_rejected() {
        let err = pair_vertices(&[1, 2, 3], |_, _| Some(1), None).unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
    }
}
