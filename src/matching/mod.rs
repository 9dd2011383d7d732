//! Exact minimum-weight perfect matching.
//!
//! - [`min_weight_perfect_matching`] — Blossom-based exact solver, O(n³)
//!
//! Pairs unbalanced vertices at minimum total shortest-path cost; the
//! matching cost equals the cost added by augmentation.

mod blossom;
mod perfect;

pub use perfect::{min_weight_perfect_matching, PerfectMatching};
