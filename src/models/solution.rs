//! Solution and violation types.

use super::{Cost, LinkId, Route, VertexId};

/// A type of defect found when checking a route against its graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationType {
    /// A step names a link the graph does not contain.
    UnknownLink {
        /// Step index in the route.
        position: usize,
        /// Offending link id.
        link: LinkId,
    },
    /// A step's endpoints do not match its link, or it runs against an arc.
    WrongEndpoints {
        /// Step index in the route.
        position: usize,
        /// Offending link id.
        link: LinkId,
    },
    /// A step does not start where the previous one ended.
    Discontinuous {
        /// Step index in the route.
        position: usize,
    },
    /// The route does not end where it starts.
    NotClosed {
        /// First vertex.
        start: VertexId,
        /// Last vertex.
        end: VertexId,
    },
    /// A link is traversed more than once.
    RepeatedLink {
        /// Offending link id.
        link: LinkId,
    },
    /// A link of the graph is never traversed.
    MissingLink {
        /// Link left out.
        link: LinkId,
    },
    /// A step's recorded cost differs from the link's cost in that direction.
    CostMismatch {
        /// Step index in the route.
        position: usize,
        /// Cost according to the graph.
        expected: Cost,
        /// Cost recorded on the step.
        actual: Cost,
    },
    /// A required link is not serviced by any route.
    Unserviced {
        /// Required link id.
        link: LinkId,
    },
    /// A required link is serviced by more than one traversal.
    ServicedTwice {
        /// Required link id.
        link: LinkId,
    },
}

/// A defect found in a route or solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// A set of routes, one per vehicle.
///
/// Uncapacitated solves produce a single route; capacitated solves produce
/// one route per non-empty partition.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::{Solution, Route};
///
/// let mut sol = Solution::new();
/// sol.add_route(Route::new());
/// assert_eq!(sol.num_routes(), 1);
/// assert_eq!(sol.total_cost(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Solution {
    routes: Vec<Route>,
}

impl Solution {
    /// Creates an empty solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route to this solution.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Returns the routes in this solution.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns the number of routes.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Sum of route costs.
    pub fn total_cost(&self) -> Cost {
        self.routes.iter().map(Route::cost).sum()
    }

    /// Cost of the most expensive route.
    pub fn max_route_cost(&self) -> Cost {
        self.routes.iter().map(Route::cost).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RouteStep;

    fn route_of_cost(cost: Cost) -> Route {
        let mut r = Route::new();
        r.push_step(RouteStep {
            link: 1,
            origin: 1,
            from: 1,
            to: 1,
            cost,
            service: true,
        });
        r
    }

    #[test]
    fn test_solution_empty() {
        let sol = Solution::new();
        assert!(sol.is_empty());
        assert_eq!(sol.total_cost(), 0);
        assert_eq!(sol.max_route_cost(), 0);
    }

    #[test]
    fn test_solution_costs() {
        let mut sol = Solution::new();
        sol.add_route(route_of_cost(4));
        sol.add_route(route_of_cost(9));
        assert_eq!(sol.num_routes(), 2);
        assert_eq!(sol.total_cost(), 13);
        assert_eq!(sol.max_route_cost(), 9);
    }

    #[test]
    fn test_violation_equality() {
        let a = Violation::new(ViolationType::MissingLink { link: 3 });
        let b = a.clone();
        assert_eq!(a, b);
    }
}
