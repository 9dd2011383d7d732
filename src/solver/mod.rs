//! End-to-end solves.
//!
//! - [`solve`] — heuristic augmentation, then one Eulerian tour
//! - [`solve_with`] — the same pipeline around any [`Augmenter`]
//! - [`solve_capacitated`] — one tour per part of an external partition
//!
//! Every solve checks connectivity before any matrix is built, never
//! touches the problem's graph, and either returns complete routes or
//! fails; there are no partial tours.

mod config;

pub use config::SolverConfig;

use log::{debug, info};

use crate::augment::Augmenter;
use crate::error::{ArcRouteError, Result};
use crate::evaluation::RouteEvaluator;
use crate::models::{Problem, Route, Solution};
use crate::partition::{assign_links, part_subgraphs, required_subgraph, Partitioner};
use crate::tour::build_tour;

/// Solves `problem` with the heuristic augmenter described by `config`.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::{Graph, Problem, Variant};
/// use u_arcroute::solver::{solve, SolverConfig};
///
/// // Square 1-2-3-4-1 without its 1-2 side.
/// let mut g = Graph::with_vertices(4).with_depot(1);
/// g.add_edge(2, 3, 1).unwrap();
/// g.add_edge(3, 4, 1).unwrap();
/// g.add_edge(4, 1, 1).unwrap();
///
/// let problem = Problem::new(g, Variant::Undirected).unwrap();
/// let route = solve(&problem, &SolverConfig::default()).unwrap();
/// assert_eq!(route.len(), 6);
/// assert_eq!(route.cost(), 6);
/// assert_eq!(route.start(), Some(1));
/// ```
pub fn solve(problem: &Problem, config: &SolverConfig) -> Result<Route> {
    solve_with(problem, &config.augmenter(), config)
}

/// Solves `problem`, delegating augmentation to `augmenter`.
///
/// Non-required links are only walked when they help: the augmenter sees
/// the required links joined by shortest-path connectors (see
/// [`required_subgraph`](crate::partition::required_subgraph)), not the
/// whole graph.
///
/// # Errors
///
/// - [`ArcRouteError::Precondition`] if the graph is not connected (strongly
///   connected for directed and mixed problems).
/// - Any error of the augmenter.
/// - [`ArcRouteError::InvariantViolation`] if the augmented graph is not
///   Eulerian, lost an input link, or (with route verification on) the
///   tour fails its check.
pub fn solve_with<A: Augmenter + ?Sized>(
    problem: &Problem,
    augmenter: &A,
    config: &SolverConfig,
) -> Result<Route> {
    check_connectivity(problem)?;
    let variant = problem.variant();
    let reduced;
    let graph = if problem.graph().links().all(|l| l.is_required()) {
        problem.graph()
    } else {
        reduced = required_subgraph(problem.graph(), variant)?;
        &reduced
    };

    let augmented = augmenter.augment(graph, variant)?;
    if let Some(id) = graph.link_ids().into_iter().find(|&id| !augmented.contains_link(id)) {
        return Err(ArcRouteError::invariant(format!(
            "augmentation dropped link {id}"
        )));
    }
    if !augmented.is_eulerian(variant) {
        return Err(ArcRouteError::invariant(format!(
            "augmented {} graph is not Eulerian",
            variant.name()
        )));
    }

    let route = build_tour(&augmented)?;
    if config.verify_routes() {
        let violations = RouteEvaluator::new(&augmented).check(&route);
        if let Some(v) = violations.first() {
            return Err(ArcRouteError::invariant(format!(
                "tour check failed: {:?}",
                v.kind
            )));
        }
    }

    info!(
        "solve: variant={} links={} added={} cost={} deadhead={}",
        variant.name(),
        graph.num_links(),
        augmented.num_links() - graph.num_links(),
        route.cost(),
        route.deadhead_cost()
    );
    Ok(route)
}

/// Solves a capacitated problem: one route per non-empty part.
///
/// `partitioner` is asked for [`Problem::vehicles`] parts. Its output is
/// turned into link assignments (see
/// [`assign_links`](crate::partition::assign_links)), each part becomes a
/// depot-rooted subgraph, and each subgraph is solved on its own with the
/// heuristic augmenter. Routes come back in part order.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use u_arcroute::error::Result;
/// use u_arcroute::models::{Graph, Problem, Variant};
/// use u_arcroute::partition::Partition;
/// use u_arcroute::solver::{solve_capacitated, SolverConfig};
///
/// // Two triangles sharing the depot.
/// let mut g = Graph::with_vertices(5).with_depot(1);
/// for (a, b) in [(1, 2), (2, 3), (3, 1), (1, 4), (4, 5), (5, 1)] {
///     g.add_edge(a, b, 1).unwrap();
/// }
/// let problem = Problem::new(g, Variant::Undirected).unwrap().with_vehicles(2);
///
/// let by_side = |_: &Graph, _: usize| -> Result<Partition> {
///     Ok(Partition::ByVertex(BTreeMap::from([(2, 0), (3, 0), (4, 1), (5, 1)])))
/// };
/// let solution = solve_capacitated(&problem, &by_side, &SolverConfig::default()).unwrap();
/// assert_eq!(solution.num_routes(), 2);
/// assert_eq!(solution.total_cost(), 6);
/// ```
pub fn solve_capacitated<P: Partitioner + ?Sized>(
    problem: &Problem,
    partitioner: &P,
    config: &SolverConfig,
) -> Result<Solution> {
    check_connectivity(problem)?;
    let graph = problem.graph();
    let parts = problem.vehicles();

    let partition = partitioner.partition(graph, parts)?;
    let assignment = assign_links(graph, &partition, parts, config.boundary_policy())?;
    let subgraphs = part_subgraphs(graph, &assignment, problem.variant())?;

    let augmenter = config.augmenter();
    let mut solution = Solution::new();
    for (part, sub) in subgraphs {
        let sub_problem = Problem::new(sub, problem.variant())?;
        let route = solve_with(&sub_problem, &augmenter, config)?;
        debug!(
            "solve.capacitated: part={part} links={} cost={}",
            route.len(),
            route.cost()
        );
        solution.add_route(route);
    }

    if config.verify_routes() {
        let violations = RouteEvaluator::new(graph).check_coverage(solution.routes());
        if let Some(v) = violations.first() {
            return Err(ArcRouteError::invariant(format!(
                "coverage check failed: {:?}",
                v.kind
            )));
        }
    }

    info!(
        "solve.capacitated: variant={} parts={} routes={} cost={} max_route={}",
        problem.variant().name(),
        parts,
        solution.num_routes(),
        solution.total_cost(),
        solution.max_route_cost()
    );
    Ok(solution)
}

fn check_connectivity(problem: &Problem) -> Result<()> {
    let graph = problem.graph();
    let variant = problem.variant();
    let (connected, kind) = if variant.needs_strong_connectivity() {
        (graph.is_strongly_connected(), "strongly connected")
    } else {
        (graph.is_connected(), "connected")
    };
    if !connected {
        return Err(ArcRouteError::precondition(format!(
            "{} graph is not {kind}",
            variant.name()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::augment::MixedStrategy;
    use crate::models::{Graph, Link, LinkId, Variant};
    use crate::partition::{BoundaryPolicy, Partition};
    use proptest::prelude::*;

    fn serviced(route: &Route) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = route
            .steps()
            .iter()
            .filter(|s| s.service)
            .map(|s| s.origin)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_four_cycle_missing_link() {
        let mut g = Graph::with_vertices(4).with_depot(1);
        g.add_edge(2, 3, 1).unwrap();
        g.add_edge(3, 4, 1).unwrap();
        g.add_edge(4, 1, 1).unwrap();
        let problem = Problem::new(g, Variant::Undirected).unwrap();

        let route = solve(&problem, &SolverConfig::default()).expect("connected");
        assert_eq!(route.len(), 6);
        assert_eq!(route.cost(), 6);
        assert_eq!(route.service_cost(), 3);
        assert_eq!(route.deadhead_cost(), 3);
        assert!(route.is_closed());
        assert_eq!(serviced(&route), vec![1, 2, 3]);
    }

    #[test]
    fn test_balanced_directed_adds_nothing() {
        let mut g = Graph::with_vertices(3);
        g.add_arc(1, 2, 2).unwrap();
        g.add_arc(2, 3, 2).unwrap();
        g.add_arc(3, 1, 2).unwrap();
        let problem = Problem::new(g, Variant::Directed).unwrap();
        let route = solve(&problem, &SolverConfig::default()).expect("balanced");
        assert_eq!(route.len(), 3);
        assert_eq!(route.vertices(), vec![1, 2, 3, 1]);
        assert_eq!(route.deadhead_cost(), 0);
    }

    #[test]
    fn test_disconnected_rejected_before_augmenting() {
        let mut g = Graph::with_vertices(4);
        g.add_edge(1, 2, 1).unwrap();
        g.add_edge(3, 4, 1).unwrap();
        let problem = Problem::new(g, Variant::Undirected).unwrap();

        let calls = Cell::new(0);
        let counting = |g: &Graph, _: Variant| -> Result<Graph> {
            calls.set(calls.get() + 1);
            Ok(g.clone())
        };
        let err = solve_with(&problem, &counting, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_one_way_street_not_strongly_connected() {
        let mut g = Graph::with_vertices(2);
        g.add_arc(1, 2, 1).unwrap();
        let problem = Problem::new(g, Variant::Directed).unwrap();
        let err = solve(&problem, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
    }

    #[test]
    fn test_mixed_and_windy() {
        let mut g = Graph::with_vertices(3).with_depot(3);
        g.add_arc(1, 2, 1).unwrap();
        g.add_edge(2, 3, 2).unwrap();
        g.add_edge(3, 1, 3).unwrap();
        let problem = Problem::new(g, Variant::Mixed).unwrap();
        for strategy in [
            MixedStrategy::Best,
            MixedStrategy::EvenDegreeFirst,
            MixedStrategy::SymmetryFirst,
        ] {
            let config = SolverConfig::default().with_mixed_strategy(strategy);
            let route = solve(&problem, &config).expect("strongly connected");
            assert_eq!(route.start(), Some(3));
            assert_eq!(route.cost(), 6);
            assert_eq!(serviced(&route), vec![1, 2, 3]);
        }

        let mut g = Graph::with_vertices(2);
        g.add_windy_edge(1, 2, 3, 8).unwrap();
        let problem = Problem::new(g, Variant::Windy).unwrap();
        let route = solve(&problem, &SolverConfig::default()).expect("connected");
        assert_eq!(route.cost(), 11);
        assert_eq!(serviced(&route), vec![1]);
    }

    #[test]
    fn test_broken_augmenter_is_caught() {
        let mut g = Graph::with_vertices(2);
        g.add_edge(1, 2, 1).unwrap();
        let problem = Problem::new(g, Variant::Undirected).unwrap();
        let config = SolverConfig::default();

        let identity = |g: &Graph, _: Variant| -> Result<Graph> { Ok(g.clone()) };
        let err = solve_with(&problem, &identity, &config).unwrap_err();
        assert!(matches!(err, ArcRouteError::InvariantViolation { .. }));

        let dropping = |_: &Graph, _: Variant| -> Result<Graph> {
            let mut out = Graph::with_vertices(2);
            out.add_link(Link::edge(5, 1, 2, 1))?;
            out.add_link(Link::edge(6, 1, 2, 1))?;
            Ok(out)
        };
        let err = solve_with(&problem, &dropping, &config).unwrap_err();
        assert!(matches!(err, ArcRouteError::InvariantViolation { .. }));
    }

    #[test]
    fn test_expensive_optional_link_not_walked() {
        // Required 1-2-3; the optional 3-1 shortcut costs 100.
        let mut g = Graph::with_vertices(3).with_depot(1);
        g.add_edge(1, 2, 1).unwrap();
        g.add_edge(2, 3, 1).unwrap();
        g.add_link(Link::edge(3, 3, 1, 100).with_required(false)).unwrap();
        let problem = Problem::new(g, Variant::Undirected).unwrap();

        let route = solve(&problem, &SolverConfig::default()).expect("connected");
        assert_eq!(route.cost(), 4);
        assert_eq!(route.vertices(), vec![1, 2, 3, 2, 1]);
        assert_eq!(serviced(&route), vec![1, 2]);
        assert!(route.steps().iter().all(|s| s.origin != 3));
    }

    #[test]
    fn test_optional_links_connect_required_pieces() {
        // Required 1 -> 2 and 3 -> 4 in a directed square of optional arcs.
        let mut g = Graph::with_vertices(4).with_depot(1);
        g.add_arc(1, 2, 2).unwrap();
        g.add_link(Link::arc(2, 2, 3, 1).with_required(false)).unwrap();
        g.add_arc(3, 4, 2).unwrap();
        g.add_link(Link::arc(4, 4, 1, 1).with_required(false)).unwrap();
        g.add_link(Link::arc(5, 2, 1, 50).with_required(false)).unwrap();
        let problem = Problem::new(g, Variant::Directed).unwrap();

        let route = solve(&problem, &SolverConfig::default()).expect("strong");
        assert_eq!(route.cost(), 6);
        assert_eq!(route.vertices(), vec![1, 2, 3, 4, 1]);
        assert_eq!(serviced(&route), vec![1, 3]);
        assert_eq!(route.deadhead_cost(), 2);
    }

    #[test]
    fn test_mixed_accepts_orientable_unbalanced_graph() {
        let mut g = Graph::with_vertices(2).with_depot(1);
        g.add_arc(1, 2, 1).unwrap();
        g.add_edge(1, 2, 1).unwrap();
        let problem = Problem::new(g, Variant::Mixed).unwrap();

        let identity = |g: &Graph, _: Variant| -> Result<Graph> { Ok(g.clone()) };
        let route = solve_with(&problem, &identity, &SolverConfig::default())
            .expect("already Eulerian");
        assert_eq!(route.cost(), 2);
        assert_eq!(route.vertices(), vec![1, 2, 1]);
        assert_eq!(serviced(&route), vec![1, 2]);
    }

    #[test]
    fn test_problem_graph_untouched() {
        let mut g = Graph::with_vertices(3);
        g.add_edge(1, 2, 1).unwrap();
        g.add_edge(2, 3, 1).unwrap();
        let problem = Problem::new(g.clone(), Variant::Undirected).unwrap();
        solve(&problem, &SolverConfig::default()).expect("connected");
        solve(&problem, &SolverConfig::default()).expect("reusable");
        assert_eq!(problem.graph(), &g);
    }

    fn ring(variant: Variant) -> Problem {
        let mut g = Graph::with_vertices(5).with_depot(1);
        for (a, b) in [(1, 2), (2, 3), (3, 4), (4, 5), (5, 1)] {
            g.add_edge(a, b, 1).unwrap();
        }
        Problem::new(g, variant).unwrap().with_vehicles(2)
    }

    fn halves(_: &Graph, _: usize) -> Result<Partition> {
        Ok(Partition::ByVertex(BTreeMap::from([
            (2, 0),
            (3, 0),
            (4, 1),
            (5, 1),
        ])))
    }

    #[test]
    fn test_capacitated_ring() {
        let problem = ring(Variant::Undirected);
        let solution =
            solve_capacitated(&problem, &halves, &SolverConfig::default()).expect("partitioned");

        // Part 0 = links 1, 2, 3 (path 1-2-3-4), part 1 = links 4, 5 (path 4-5-1).
        assert_eq!(solution.num_routes(), 2);
        assert_eq!(solution.routes()[0].cost(), 6);
        assert_eq!(solution.routes()[1].cost(), 4);
        assert_eq!(solution.total_cost(), 10);
        assert_eq!(solution.max_route_cost(), 6);

        let mut all: Vec<LinkId> = solution.routes().iter().flat_map(serviced).collect();
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4, 5]);
        assert!(solution.routes().iter().all(|r| r.start() == Some(1)));
    }

    #[test]
    fn test_capacitated_boundary_policies_cover_everything() {
        let problem = ring(Variant::Windy);
        for policy in [BoundaryPolicy::LowerIndex, BoundaryPolicy::Seeded(11)] {
            let config = SolverConfig::default().with_boundary_policy(policy);
            let solution = solve_capacitated(&problem, &halves, &config).expect("partitioned");
            let services: BTreeSet<LinkId> =
                solution.routes().iter().flat_map(serviced).collect();
            assert_eq!(services.len(), 5);
        }
    }

    #[test]
    fn test_capacitated_stranded_part() {
        let problem = ring(Variant::Undirected);
        let far = |_: &Graph, _: usize| -> Result<Partition> {
            Ok(Partition::ByLink(BTreeMap::from([
                (1, 1),
                (2, 1),
                (3, 0),
                (4, 1),
                (5, 1),
            ])))
        };
        let solution =
            solve_capacitated(&problem, &far, &SolverConfig::default()).expect("repaired");
        let first = &solution.routes()[0];
        assert_eq!(serviced(first), vec![3]);
        assert!(first.deadhead_cost() > 0);
        assert!(first.is_closed());
    }

    #[test]
    fn test_capacitated_unassigned_link() {
        let problem = ring(Variant::Undirected);
        let partial = |_: &Graph, _: usize| -> Result<Partition> {
            Ok(Partition::ByLink(BTreeMap::from([(1, 0)])))
        };
        let err = solve_capacitated(&problem, &partial, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
    }

    proptest! {
        #[test]
        fn prop_undirected_route_services_every_link(
            n in 2usize..8,
            tree in proptest::collection::vec((0usize..50, 1i64..9), 7),
            extra in proptest::collection::vec((0usize..50, 0usize..50, 0i64..9), 0..8),
        ) {
            let mut g = Graph::with_vertices(n).with_depot(1);
            for child in 2..=n {
                let (parent, c) = tree[child - 2];
                g.add_edge(parent % (child - 1) + 1, child, c).expect("vertices exist");
            }
            for (a, b, c) in extra {
                g.add_edge(a % n + 1, b % n + 1, c).expect("vertices exist");
            }
            let originals: Vec<LinkId> = g.link_ids();
            let total = g.total_cost();
            let problem = Problem::new(g, Variant::Undirected).expect("valid");

            let route = solve(&problem, &SolverConfig::default()).expect("connected");
            prop_assert!(route.is_closed());
            prop_assert_eq!(route.start(), Some(1));
            prop_assert_eq!(serviced(&route), originals);
            prop_assert_eq!(route.service_cost(), total);
        }
    }
}
