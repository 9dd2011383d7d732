//! # u-arcroute
//!
//! Arc routing library for the Chinese and rural postman families:
//! undirected, directed, mixed and windy graphs, plus capacitated
//! multi-vehicle splits. Every solve augments a graph to an Eulerian
//! multigraph and extracts one closed tour from it.
//!
//! ## Modules
//!
//! - [`models`] — Domain model types (Graph, Link, Problem, Route, Solution)
//! - [`distance`] — All-pairs shortest paths and connectivity checks
//! - [`matching`] — Exact minimum-weight perfect matching
//! - [`flow`] — Minimum-cost flow with supplies and demands
//! - [`augment`] — Eulerian augmentation per variant
//! - [`tour`] — Hierholzer tour extraction
//! - [`evaluation`] — Route checking against a graph
//! - [`partition`] — Capacitated link assignment and per-part subgraphs
//! - [`solver`] — End-to-end solves and configuration
//!
//! ## Example
//!
//! ```
//! use u_arcroute::models::{Graph, Problem, Variant};
//! use u_arcroute::solver::{solve, SolverConfig};
//!
//! let mut g = Graph::with_vertices(3).with_depot(1);
//! g.add_arc(1, 2, 4).unwrap();
//! g.add_arc(2, 3, 1).unwrap();
//! g.add_arc(3, 1, 2).unwrap();
//! g.add_arc(1, 3, 5).unwrap();
//!
//! let problem = Problem::new(g, Variant::Directed).unwrap();
//! let route = solve(&problem, &SolverConfig::default()).unwrap();
//! // 3 -> 1 is walked a second time to get back from the extra arc.
//! assert_eq!(route.cost(), 14);
//! assert!(route.is_closed());
//! ```

pub mod augment;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod flow;
pub mod matching;
pub mod models;
pub mod partition;
pub mod solver;
pub mod tour;

pub use error::{ArcRouteError, Phase, Result};
