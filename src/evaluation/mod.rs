//! Route verification.
//!
//! [`RouteEvaluator`] rebuilds routes from link sequences and checks them
//! against their graph: continuity, closure, direction, cost, and that each
//! required link is serviced exactly once.

mod evaluator;

pub use evaluator::RouteEvaluator;
