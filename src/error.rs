//! Error types shared by every solver stage.

use std::fmt;

use crate::models::{LinkId, VertexId};

/// Pipeline stage in which an infeasibility was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Shortest-path reconstruction or path duplication.
    ShortestPath,
    /// Minimum-weight perfect matching.
    Matching,
    /// Minimum-cost flow.
    Flow,
    /// Mixed heuristic: parity repair ignoring direction.
    EvenDegree,
    /// Mixed heuristic: in/out balancing.
    InOutDegree,
    /// Mixed heuristic: parity repair that keeps balance.
    EvenParity,
    /// Mixed heuristic: parity repair over undirected links.
    LargeCycles,
    /// Windy orientation flow.
    Orientation,
    /// Capacitated partition handling.
    Partition,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ShortestPath => "shortest-path",
            Phase::Matching => "matching",
            Phase::Flow => "flow",
            Phase::EvenDegree => "even-degree",
            Phase::InOutDegree => "in-out-degree",
            Phase::EvenParity => "even-parity",
            Phase::LargeCycles => "large-cycles",
            Phase::Orientation => "orientation",
            Phase::Partition => "partition",
        };
        f.write_str(name)
    }
}

/// Errors produced while building an arc-routing tour.
#[derive(Debug, thiserror::Error)]
pub enum ArcRouteError {
    /// The input violates a structural requirement; nothing was computed.
    #[error("precondition failed: {reason}")]
    Precondition { reason: String },

    /// A sub-algorithm could not satisfy its contract on an accepted input.
    #[error("infeasible during {phase}: {reason}")]
    Infeasible { phase: Phase, reason: String },

    /// An internal invariant did not hold (augmentation produced a graph
    /// that is not Eulerian, or a route failed verification).
    #[error("algorithm invariant violated: {reason}")]
    InvariantViolation { reason: String },

    #[error("unknown vertex id {0}")]
    UnknownVertex(VertexId),

    #[error("unknown link id {0}")]
    UnknownLink(LinkId),

    #[cfg(feature = "json")]
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ArcRouteError {
    pub fn precondition(reason: impl Into<String>) -> Self {
        Self::Precondition {
            reason: reason.into(),
        }
    }

    pub fn infeasible(phase: Phase, reason: impl Into<String>) -> Self {
        Self::Infeasible {
            phase,
            reason: reason.into(),
        }
    }

    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }

    /// Returns the phase for [`ArcRouteError::Infeasible`] errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Infeasible { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ArcRouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_phase() {
        let err = ArcRouteError::infeasible(Phase::Flow, "supply left over");
        assert_eq!(
            err.to_string(),
            "infeasible during flow: supply left over"
        );
        assert_eq!(err.phase(), Some(Phase::Flow));
    }

    #[test]
    fn test_precondition_has_no_phase() {
        let err = ArcRouteError::precondition("graph is disconnected");
        assert!(err.phase().is_none());
        assert!(matches!(err, ArcRouteError::Precondition { .. }));
    }
}
