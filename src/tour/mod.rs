//! Eulerian tour extraction.
//!
//! - [`build_tour`] — Hierholzer circuit over an undirected, directed,
//!   mixed or oriented windy multigraph, rooted at the depot
//! - [`orient_undirected`] — balanced orientation of the undirected links

mod hierholzer;

pub use hierholzer::{build_tour, orient_undirected, tour_start};
