//! Minimum-weight perfect matching.

use super::blossom::{Blossom, NONE};
use crate::error::{ArcRouteError, Phase, Result};
use crate::models::Cost;

/// A perfect matching over vertices `0..n` and its total weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfectMatching {
    pairs: Vec<(usize, usize)>,
    cost: Cost,
}

impl PerfectMatching {
    /// Matched pairs `(i, j)` with `i < j`, sorted by `i`.
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// Sum of the weights of the matched edges.
    pub fn cost(&self) -> Cost {
        self.cost
    }
}

/// Computes an exact minimum-weight perfect matching.
///
/// `edges` lists `(i, j, weight)` over vertices `0..n`; self-loops are
/// ignored and for repeated pairs the lightest edge is kept. The graph need
/// not be complete, but a perfect matching must exist.
///
/// Weights are mapped to `W + 1 - w` (W = heaviest edge) and solved as a
/// maximum-cardinality maximum-weight matching, which is perfect whenever a
/// perfect matching exists and then minimizes the original weight.
///
/// # Errors
///
/// - Precondition failure if `n` is odd.
/// - [`Phase::Matching`] infeasibility if no perfect matching exists.
///
/// # Examples
///
/// ```
/// use u_arcroute::matching::min_weight_perfect_matching;
///
/// // Square 0-1-2-3 with expensive diagonals.
/// let edges = [
///     (0, 1, 1), (1, 2, 5), (2, 3, 1), (3, 0, 5),
///     (0, 2, 9), (1, 3, 9),
/// ];
/// let m = min_weight_perfect_matching(4, &edges).unwrap();
/// assert_eq!(m.pairs(), &[(0, 1), (2, 3)]);
/// assert_eq!(m.cost(), 2);
/// ```
pub fn min_weight_perfect_matching(n: usize, edges: &[(usize, usize, Cost)]) -> Result<PerfectMatching> {
    if n % 2 == 1 {
        return Err(ArcRouteError::precondition(format!(
            "perfect matching needs an even vertex count, got {n}"
        )));
    }
    if n == 0 {
        return Ok(PerfectMatching {
            pairs: Vec::new(),
            cost: 0,
        });
    }
    if let Some(&(i, j, _)) = edges.iter().find(|&&(i, j, _)| i >= n || j >= n) {
        return Err(ArcRouteError::precondition(format!(
            "matching edge ({i}, {j}) is outside 0..{n}"
        )));
    }

    // Keep the lightest edge per unordered pair.
    let mut lightest = std::collections::BTreeMap::new();
    for &(i, j, w) in edges {
        if i == j {
            continue;
        }
        let key = (i.min(j), i.max(j));
        lightest
            .entry(key)
            .and_modify(|cur: &mut Cost| *cur = (*cur).min(w))
            .or_insert(w);
    }
    let heaviest = lightest.values().copied().max().unwrap_or(0);
    let weights: Vec<(usize, usize, i64)> = lightest
        .iter()
        .map(|(&(i, j), &w)| (i, j, heaviest + 1 - w))
        .collect();

    let mate = Blossom::new(n, weights).solve()?;

    let mut pairs = Vec::with_capacity(n / 2);
    let mut cost = 0;
    for (i, &j) in mate.iter().enumerate() {
        if j == NONE {
            return Err(ArcRouteError::infeasible(
                Phase::Matching,
                format!("vertex {i} has no partner"),
            ));
        }
        if i < j {
            pairs.push((i, j));
            cost += lightest.get(&(i, j)).copied().unwrap_or(0);
        }
    }
    Ok(PerfectMatching { pairs, cost })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn complete(n: usize, weight: impl Fn(usize, usize) -> Cost) -> Vec<(usize, usize, Cost)> {
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j, weight(i, j)));
            }
        }
        edges
    }

    /// Exhaustive minimum over all perfect matchings of a complete graph.
    fn brute_force(n: usize, w: &[Vec<Cost>]) -> Cost {
        fn go(free: &mut Vec<usize>, w: &[Vec<Cost>]) -> Cost {
            if free.is_empty() {
                return 0;
            }
            let a = free.remove(0);
            let mut best = Cost::MAX;
            for k in 0..free.len() {
                let b = free.remove(k);
                let c = w[a][b] + go(free, w);
                best = best.min(c);
                free.insert(k, b);
            }
            free.insert(0, a);
            best
        }
        let mut free: Vec<usize> = (0..n).collect();
        go(&mut free, w)
    }

    #[test]
    fn test_empty() {
        let m = min_weight_perfect_matching(0, &[]).expect("trivial");
        assert!(m.pairs().is_empty());
        assert_eq!(m.cost(), 0);
    }

    #[test]
    fn test_odd_count_is_precondition() {
        let err = min_weight_perfect_matching(3, &[(0, 1, 1), (1, 2, 1)]).unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
    }

    #[test]
    fn test_no_perfect_matching_is_infeasible() {
        // Star: center 0 with three leaves cannot be perfectly matched.
        let err = min_weight_perfect_matching(4, &[(0, 1, 1), (0, 2, 1), (0, 3, 1)]).unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Matching));
    }

    #[test]
    fn test_avoids_greedy_choice() {
        // Greedy would take (1,2) at cost 1, forcing (0,3) at cost 100.
        let edges = complete(4, |i, j| match (i, j) {
            (1, 2) => 1,
            (0, 1) | (2, 3) => 2,
            _ => 100,
        });
        let m = min_weight_perfect_matching(4, &edges).expect("complete");
        assert_eq!(m.pairs(), &[(0, 1), (2, 3)]);
        assert_eq!(m.cost(), 4);
    }

    #[test]
    fn test_zero_weights() {
        let edges = complete(4, |_, _| 0);
        let m = min_weight_perfect_matching(4, &edges).expect("complete");
        assert_eq!(m.pairs().len(), 2);
        assert_eq!(m.cost(), 0);
    }

    #[test]
    fn test_duplicate_pairs_keep_lightest() {
        let m = min_weight_perfect_matching(2, &[(0, 1, 7), (1, 0, 3)]).expect("edge");
        assert_eq!(m.cost(), 3);
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force(half in 1usize..=4, seed in proptest::collection::vec(0i64..50, 28)) {
            let n = 2 * half;
            let mut w = vec![vec![0; n]; n];
            let mut idx = 0;
            for i in 0..n {
                for j in (i + 1)..n {
                    w[i][j] = seed[idx];
                    w[j][i] = seed[idx];
                    idx += 1;
                }
            }
            let edges = complete(n, |i, j| w[i][j]);
            let m = min_weight_perfect_matching(n, &edges).expect("complete graph");

            let mut covered = vec![false; n];
            for &(i, j) in m.pairs() {
                prop_assert!(!covered[i] && !covered[j]);
                covered[i] = true;
                covered[j] = true;
            }
            prop_assert!(covered.iter().all(|&c| c));
            prop_assert_eq!(m.cost(), brute_force(n, &w));
        }
    }
}
