//! Minimum-cost flow.
//!
//! - [`FlowNetwork`] — supply/demand network solved by successive shortest paths
//!
//! Used to balance in/out degrees of directed and mixed graphs and to
//! orient windy links.

mod network;

pub use network::{FlowArc, FlowNetwork, FlowSolution};
