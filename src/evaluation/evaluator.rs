//! Route evaluator that checks traversals against their graph.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Graph, LinkId, Route, RouteStep, VertexId, Violation, ViolationType};

/// Checks that routes are closed Eulerian walks of a graph and that the
/// required links are serviced.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::evaluation::RouteEvaluator;
///
/// let mut g = Graph::with_vertices(2);
/// g.add_edge(1, 2, 3).unwrap();
/// g.add_arc(2, 1, 4).unwrap();
///
/// let evaluator = RouteEvaluator::new(&g);
/// let (route, violations) = evaluator.build_route(1, &[1, 2]);
/// assert_eq!(route.len(), 2);
/// assert_eq!(route.cost(), 7);
/// assert!(violations.is_empty());
/// assert!(evaluator.check(&route).is_empty());
/// ```
pub struct RouteEvaluator<'a> {
    graph: &'a Graph,
}

impl<'a> RouteEvaluator<'a> {
    /// Creates a new evaluator for the given graph.
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// Builds a route by traversing `link_ids` in order from `start`.
    ///
    /// Each link is taken in the direction that leaves the current vertex.
    /// Returns the constructed route and any defects met on the way; links
    /// that cannot be traversed from the current vertex are taken in their
    /// stored direction and reported.
    pub fn build_route(&self, start: VertexId, link_ids: &[LinkId]) -> (Route, Vec<Violation>) {
        let mut route = Route::new();
        let mut violations = Vec::new();
        let mut at = start;

        for (position, &id) in link_ids.iter().enumerate() {
            let Some(link) = self.graph.link(id) else {
                violations.push(Violation::new(ViolationType::UnknownLink {
                    position,
                    link: id,
                }));
                continue;
            };

            let (from, to) = match (link.cost_from(at), link.other(at)) {
                (Some(_), Some(other)) => (at, other),
                _ => {
                    violations.push(Violation::new(ViolationType::WrongEndpoints {
                        position,
                        link: id,
                    }));
                    link.endpoints()
                }
            };

            route.push_step(RouteStep {
                link: id,
                origin: link.origin().unwrap_or(id),
                from,
                to,
                cost: link.cost_from(from).unwrap_or_else(|| link.cost()),
                service: link.is_required() && !link.is_added(),
            });
            at = to;
        }

        if at != start && !route.is_empty() {
            violations.push(Violation::new(ViolationType::NotClosed { start, end: at }));
        }
        (route, violations)
    }

    /// Checks that `route` is a closed walk using every link of the graph
    /// exactly once with the costs the graph assigns.
    pub fn check(&self, route: &Route) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut seen: BTreeSet<LinkId> = BTreeSet::new();
        let mut prev: Option<&RouteStep> = None;

        for (position, step) in route.steps().iter().enumerate() {
            if let Some(p) = prev {
                if p.to != step.from {
                    violations.push(Violation::new(ViolationType::Discontinuous { position }));
                }
            }
            prev = Some(step);

            if !seen.insert(step.link) {
                violations.push(Violation::new(ViolationType::RepeatedLink { link: step.link }));
            }

            let Some(link) = self.graph.link(step.link) else {
                violations.push(Violation::new(ViolationType::UnknownLink {
                    position,
                    link: step.link,
                }));
                continue;
            };
            let matches = link.other(step.from) == Some(step.to);
            match (matches, link.cost_from(step.from)) {
                (true, Some(expected)) => {
                    if expected != step.cost {
                        violations.push(Violation::new(ViolationType::CostMismatch {
                            position,
                            expected,
                            actual: step.cost,
                        }));
                    }
                }
                _ => violations.push(Violation::new(ViolationType::WrongEndpoints {
                    position,
                    link: step.link,
                })),
            }
        }

        if let (Some(first), Some(last)) = (route.steps().first(), route.steps().last()) {
            if first.from != last.to {
                violations.push(Violation::new(ViolationType::NotClosed {
                    start: first.from,
                    end: last.to,
                }));
            }
        }

        for id in self.graph.link_ids() {
            if !seen.contains(&id) {
                violations.push(Violation::new(ViolationType::MissingLink { link: id }));
            }
        }
        violations
    }

    /// Checks that every required original link is serviced exactly once
    /// across `routes`.
    ///
    /// Service is attributed through each step's origin, so routes may be
    /// built on subgraphs or augmented copies of this evaluator's graph.
    pub fn check_coverage(&self, routes: &[Route]) -> Vec<Violation> {
        let mut serviced: BTreeMap<LinkId, usize> = BTreeMap::new();
        for step in routes.iter().flat_map(|r| r.steps()).filter(|s| s.service) {
            *serviced.entry(step.origin).or_insert(0) += 1;
        }

        let mut violations = Vec::new();
        for link in self.graph.links() {
            if !link.is_required() || link.is_added() {
                continue;
            }
            match serviced.get(&link.id()).copied().unwrap_or(0) {
                0 => violations.push(Violation::new(ViolationType::Unserviced {
                    link: link.id(),
                })),
                1 => {}
                _ => violations.push(Violation::new(ViolationType::ServicedTwice {
                    link: link.id(),
                })),
            }
        }
        violations
    }
}
