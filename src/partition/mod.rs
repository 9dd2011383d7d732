//! Capacitated splitting of a graph into per-vehicle subgraphs.
//!
//! - [`Partitioner`] — external oracle mapping links or vertices to parts
//! - [`assign_links`] — turns a [`Partition`] into one part per required link
//! - [`part_subgraphs`] — induces one connected subgraph per non-empty part
//! - [`required_subgraph`] — the one-part case: required links plus connectors
//!
//! Partitioning itself is delegated: any balanced k-way partitioner, or a
//! closure, can be plugged in. This module only resolves the links a vertex
//! partition leaves ambiguous and makes every part routable from the depot.

mod assign;
mod subgraph;

pub use assign::assign_links;
pub use subgraph::{part_subgraphs, required_subgraph};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Graph, LinkId, VertexId};

/// Output of a [`Partitioner`]: part indices in `0..parts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partition {
    /// Part of every required link.
    ByLink(BTreeMap<LinkId, usize>),
    /// Part of every vertex; links are assigned from their endpoints.
    ByVertex(BTreeMap<VertexId, usize>),
}

/// Splits a graph into `parts` groups.
pub trait Partitioner {
    fn partition(&self, graph: &Graph, parts: usize) -> Result<Partition>;
}

impl<F> Partitioner for F
where
    F: Fn(&Graph, usize) -> Result<Partition>,
{
    fn partition(&self, graph: &Graph, parts: usize) -> Result<Partition> {
        self(graph, parts)
    }
}

/// How a link whose endpoints lie in two different parts is assigned.
///
/// Only used for [`Partition::ByVertex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// The lower part index wins.
    #[default]
    LowerIndex,
    /// A fair coin seeded with the given value, flipped per boundary link
    /// in link id order.
    Seeded(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_partitioner() {
        let all_zero = |g: &Graph, _: usize| -> Result<Partition> {
            Ok(Partition::ByLink(g.link_ids().into_iter().map(|id| (id, 0)).collect()))
        };
        let mut g = Graph::with_vertices(2);
        g.add_edge(1, 2, 1).unwrap();
        let p = all_zero.partition(&g, 3).expect("ok");
        assert_eq!(p, Partition::ByLink(BTreeMap::from([(1, 0)])));
    }

    #[test]
    fn test_boundary_policy_default() {
        assert_eq!(BoundaryPolicy::default(), BoundaryPolicy::LowerIndex);
    }
}
