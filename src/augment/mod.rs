//! Eulerian augmentation.
//!
//! - [`augment_undirected`] — odd-vertex matching on shortest paths
//! - [`augment_directed`] — in/out balancing by transportation flow
//! - [`augment_mixed`] — two mixed constructions, cheaper wins
//! - [`augment_windy`] — symmetric matching, then flow-based orientation
//!
//! [`Augmenter`] is the seam between a problem and its tour: anything that
//! turns a graph into an Eulerian supergraph of it, heuristic or exact, can
//! feed the tour builder.

mod correspondence;
mod directed;
mod mixed;
mod pairing;
mod undirected;
mod windy;

pub use directed::augment_directed;
pub use mixed::{
    augment_mixed, cheaper, eliminate_added_cycles, even_degree, even_degree_first,
    even_parity, in_out_degree, large_cycles, symmetry_first, MixedStrategy, Symmetric,
};
pub use undirected::augment_undirected;
pub use windy::augment_windy;

use log::debug;

use crate::error::Result;
use crate::models::{Graph, Variant};

/// Turns a graph into an Eulerian multigraph that contains it.
///
/// Implementations must not change the input. The returned graph keeps
/// every link of the input under its id (possibly oriented) and marks
/// every added link with its origin.
pub trait Augmenter {
    fn augment(&self, graph: &Graph, variant: Variant) -> Result<Graph>;
}

impl<F> Augmenter for F
where
    F: Fn(&Graph, Variant) -> Result<Graph>,
{
    fn augment(&self, graph: &Graph, variant: Variant) -> Result<Graph> {
        self(graph, variant)
    }
}

/// The heuristic augmentation for every variant.
///
/// # Examples
///
/// ```
/// use u_arcroute::augment::{Augmenter, HeuristicAugmenter};
/// use u_arcroute::models::{Graph, Variant};
///
/// let mut g = Graph::with_vertices(3);
/// g.add_edge(1, 2, 1).unwrap();
/// g.add_edge(2, 3, 1).unwrap();
///
/// let out = HeuristicAugmenter::new().augment(&g, Variant::Undirected).unwrap();
/// assert_eq!(out.num_links(), 4);
/// assert_eq!(g.num_links(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicAugmenter {
    mixed_strategy: MixedStrategy,
    eliminate_added_cycles: bool,
}

impl Default for HeuristicAugmenter {
    fn default() -> Self {
        Self {
            mixed_strategy: MixedStrategy::Best,
            eliminate_added_cycles: true,
        }
    }
}

impl HeuristicAugmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets which mixed construction(s) run.
    pub fn with_mixed_strategy(mut self, strategy: MixedStrategy) -> Self {
        self.mixed_strategy = strategy;
        self
    }

    /// Enables removal of directed cycles made only of added arcs.
    pub fn with_eliminate_added_cycles(mut self, enabled: bool) -> Self {
        self.eliminate_added_cycles = enabled;
        self
    }

    pub fn mixed_strategy(&self) -> MixedStrategy {
        self.mixed_strategy
    }

    pub fn eliminate_added_cycles(&self) -> bool {
        self.eliminate_added_cycles
    }
}

impl Augmenter for HeuristicAugmenter {
    fn augment(&self, graph: &Graph, variant: Variant) -> Result<Graph> {
        debug!(
            "augment: variant={} links={}",
            variant.name(),
            graph.num_links()
        );
        match variant {
            Variant::Undirected => {
                let mut g = graph.clone();
                augment_undirected(&mut g)?;
                Ok(g)
            }
            Variant::Directed => {
                let mut g = graph.clone();
                augment_directed(&mut g)?;
                Ok(g)
            }
            Variant::Windy => {
                let mut g = graph.clone();
                augment_windy(&mut g)?;
                Ok(g)
            }
            Variant::Mixed => {
                augment_mixed(graph, self.mixed_strategy, self.eliminate_added_cycles)
            }
        }
    }
}
