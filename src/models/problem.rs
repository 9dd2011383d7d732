//! Problem instance: a graph plus the variant it is solved as.

use serde::{Deserialize, Serialize};

use super::{Graph, VertexId};
use crate::error::{ArcRouteError, Result};

/// Which postman variant a graph is solved as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Every link undirected with symmetric cost.
    Undirected,
    /// Every link directed.
    Directed,
    /// Directed and undirected links, symmetric costs on undirected ones.
    Mixed,
    /// Every link undirected, cost may differ per direction.
    Windy,
}

impl Variant {
    /// Stable lowercase name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Undirected => "undirected",
            Variant::Directed => "directed",
            Variant::Mixed => "mixed",
            Variant::Windy => "windy",
        }
    }

    /// `true` if connectivity must hold along link directions.
    pub fn needs_strong_connectivity(&self) -> bool {
        matches!(self, Variant::Directed | Variant::Mixed)
    }
}

/// A validated arc-routing instance.
///
/// The graph is immutable for the lifetime of the problem; solvers work on
/// their own clones.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::{Graph, Problem, Variant};
///
/// let mut g = Graph::with_vertices(2).with_depot(1);
/// g.add_arc(1, 2, 3).unwrap();
/// g.add_arc(2, 1, 4).unwrap();
///
/// let problem = Problem::new(g, Variant::Directed).unwrap();
/// assert_eq!(problem.variant(), Variant::Directed);
/// assert_eq!(problem.depot(), Some(1));
///
/// // Directed links are rejected by the undirected variant
/// let mut g = Graph::with_vertices(2);
/// g.add_arc(1, 2, 3).unwrap();
/// assert!(Problem::new(g, Variant::Undirected).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Problem {
    graph: Graph,
    variant: Variant,
    vehicles: usize,
}

impl Problem {
    /// Validates `graph` against `variant`.
    ///
    /// Fails with a precondition error on negative costs, links that do not
    /// fit the variant, or a depot that is not a vertex. Connectivity is
    /// checked later by the solver.
    pub fn new(graph: Graph, variant: Variant) -> Result<Self> {
        if let Some(depot) = graph.depot() {
            if !graph.contains_vertex(depot) {
                return Err(ArcRouteError::UnknownVertex(depot));
            }
        }
        for link in graph.links() {
            if link.cost() < 0 || link.reverse_cost() < 0 {
                return Err(ArcRouteError::precondition(format!(
                    "link {} has a negative cost",
                    link.id()
                )));
            }
            let fits = match variant {
                Variant::Undirected => !link.is_directed() && !link.is_windy(),
                Variant::Directed => link.is_directed(),
                Variant::Mixed => !link.is_windy(),
                Variant::Windy => !link.is_directed(),
            };
            if !fits {
                return Err(ArcRouteError::precondition(format!(
                    "link {} does not fit the {} variant",
                    link.id(),
                    variant.name()
                )));
            }
        }
        Ok(Self {
            graph,
            variant,
            vehicles: 1,
        })
    }

    /// Sets the vehicle (partition) count used by capacitated solves.
    pub fn with_vehicles(mut self, vehicles: usize) -> Self {
        self.vehicles = vehicles.max(1);
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn depot(&self) -> Option<VertexId> {
        self.graph.depot()
    }

    /// Vehicle count, at least 1.
    pub fn vehicles(&self) -> usize {
        self.vehicles
    }
}
