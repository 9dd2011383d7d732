//! Solver configuration.

use serde::{Deserialize, Serialize};

use crate::augment::{HeuristicAugmenter, MixedStrategy};
use crate::partition::BoundaryPolicy;

/// Knobs shared by every solve.
///
/// Missing fields take their defaults when deserialized.
///
/// # Examples
///
/// ```
/// use u_arcroute::augment::MixedStrategy;
/// use u_arcroute::partition::BoundaryPolicy;
/// use u_arcroute::solver::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_mixed_strategy(MixedStrategy::SymmetryFirst)
///     .with_boundary_policy(BoundaryPolicy::Seeded(42));
/// assert_eq!(config.mixed_strategy(), MixedStrategy::SymmetryFirst);
/// assert!(config.verify_routes());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    boundary_policy: BoundaryPolicy,
    mixed_strategy: MixedStrategy,
    eliminate_added_cycles: bool,
    verify_routes: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            boundary_policy: BoundaryPolicy::LowerIndex,
            mixed_strategy: MixedStrategy::Best,
            eliminate_added_cycles: true,
            verify_routes: true,
        }
    }
}

impl SolverConfig {
    /// Sets how links spanning two vertex parts are assigned.
    pub fn with_boundary_policy(mut self, policy: BoundaryPolicy) -> Self {
        self.boundary_policy = policy;
        self
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

    /// Enables checking every produced route against its graph.
    pub fn with_verify_routes(mut self, enabled: bool) -> Self {
        self.verify_routes = enabled;
        self
    }

    pub fn boundary_policy(&self) -> BoundaryPolicy {
        self.boundary_policy
    }

    pub fn mixed_strategy(&self) -> MixedStrategy {
        self.mixed_strategy
    }

    pub fn eliminate_added_cycles(&self) -> bool {
        self.eliminate_added_cycles
    }

    pub fn verify_routes(&self) -> bool {
        self.verify_routes
    }

    /// The heuristic augmenter these settings describe.
    pub fn augmenter(&self) -> HeuristicAugmenter {
        HeuristicAugmenter::new()
            .with_mixed_strategy(self.mixed_strategy)
            .with_eliminate_added_cycles(self.eliminate_added_cycles)
    }

    /// Parses a configuration from JSON.
    #[cfg(feature = "json")]
    pub fn from_json_str(s: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serializes the configuration to JSON.
    #[cfg(feature = "json")]
    pub fn to_json_string(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
