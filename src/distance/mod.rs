//! Shortest paths and connectivity.
//!
//! Provides the all-pairs shortest-path engine used by every augmentation
//! strategy, including the primitive that duplicates a shortest path into
//! a graph, and the reachability checks behind solver preconditions.

mod connectivity;
mod matrix;

pub use connectivity::{active_vertices, is_connected, is_strongly_connected, reachable, Direction};
pub use matrix::{Hop, ShortestPaths};
