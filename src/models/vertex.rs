//! Vertex type.

use serde::{Deserialize, Serialize};

/// Identifier of a vertex, unique within one [`Graph`](super::Graph).
pub type VertexId = usize;

/// A vertex of a routing graph.
///
/// Degree and imbalance are not stored here; they are derived from the
/// current link set by [`Graph::degree`](super::Graph::degree).
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Vertex;
///
/// let v = Vertex::new(3).with_label("depot");
/// assert_eq!(v.id(), 3);
/// assert_eq!(v.label(), Some("depot"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    id: VertexId,
    label: Option<String>,
}

impl Vertex {
    /// Creates an unlabeled vertex.
    pub fn new(id: VertexId) -> Self {
        Self { id, label: None }
    }

    /// Attaches a human-readable label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_without_label() {
        let v = Vertex::new(7);
        assert_eq!(v.id(), 7);
        assert!(v.label().is_none());
    }
}
