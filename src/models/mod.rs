//! Domain model types for arc routing problems.
//!
//! Provides the core abstractions: vertices and cost-bearing links held in
//! an id-keyed multigraph, problem instances tagged with their postman
//! variant, and routes as ordered sequences of link traversals.

mod graph;
mod link;
mod problem;
mod route;
mod solution;
mod vertex;

pub use graph::{Degree, Graph};
pub use link::{Cost, Link, LinkId};
pub use problem::{Problem, Variant};
pub use route::{Route, RouteStep};
pub use solution::{Solution, Violation, ViolationType};
pub use vertex::{Vertex, VertexId};
