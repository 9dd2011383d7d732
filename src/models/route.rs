//! Route and traversal step types.

use serde::{Deserialize, Serialize};

use super::{Cost, LinkId, VertexId};

/// A single link traversal within a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Link traversed (may be an augmentation copy).
    pub link: LinkId,
    /// The original link this traversal covers.
    pub origin: LinkId,
    /// Vertex the traversal leaves.
    pub from: VertexId,
    /// Vertex the traversal enters.
    pub to: VertexId,
    /// Cost of traversing in this direction.
    pub cost: Cost,
    /// `true` if this traversal services a required link; deadhead otherwise.
    pub service: bool,
}

/// A closed walk as an ordered sequence of link traversals.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::{Route, RouteStep};
///
/// let mut route = Route::new();
/// route.push_step(RouteStep { link: 1, origin: 1, from: 1, to: 2, cost: 3, service: true });
/// route.push_step(RouteStep { link: 5, origin: 1, from: 2, to: 1, cost: 3, service: false });
/// assert_eq!(route.len(), 2);
/// assert_eq!(route.cost(), 6);
/// assert_eq!(route.deadhead_cost(), 3);
/// assert!(route.is_closed());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    steps: Vec<RouteStep>,
    cost: Cost,
}

impl Route {
    /// Creates an empty route.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a traversal to the end of this route.
    pub fn push_step(&mut self, step: RouteStep) {
        self.cost += step.cost;
        self.steps.push(step);
    }

    /// Returns the ordered traversals.
    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    /// Returns the link ids in traversal order.
    pub fn link_ids(&self) -> Vec<LinkId> {
        self.steps.iter().map(|s| s.link).collect()
    }

    /// Returns the visited vertices, starting and ending at the start vertex.
    pub fn vertices(&self) -> Vec<VertexId> {
        let mut out = Vec::with_capacity(self.steps.len() + 1);
        if let Some(first) = self.steps.first() {
            out.push(first.from);
        }
        out.extend(self.steps.iter().map(|s| s.to));
        out
    }

    /// The vertex the route starts (and ends) at.
    pub fn start(&self) -> Option<VertexId> {
        self.steps.first().map(|s| s.from)
    }

    /// Number of traversals.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the route traverses nothing.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Total traversal cost.
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Cost of servicing traversals.
    pub fn service_cost(&self) -> Cost {
        self.steps.iter().filter(|s| s.service).map(|s| s.cost).sum()
    }

    /// Cost of deadhead traversals.
    pub fn deadhead_cost(&self) -> Cost {
        self.cost - self.service_cost()
    }

    /// `true` if the last traversal ends where the first began.
    pub fn is_closed(&self) -> bool {
        match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => first.from == last.to,
            _ => true,
        }
    }
}
