//! Link (edge or arc) type.

use serde::{Deserialize, Serialize};

use super::VertexId;

/// Identifier of a link, unique within one [`Graph`](super::Graph).
pub type LinkId = usize;

/// Traversal cost. Integral so that matching and flow stay exact.
pub type Cost = i64;

/// A cost-bearing connection between two vertices.
///
/// An undirected link may be traversed in either direction; a windy link is
/// an undirected link whose `reverse_cost` (to → from) differs from its
/// `cost` (from → to). A directed link (arc) may only be traversed from
/// `from` to `to`.
///
/// Links created during augmentation record the original link they copy in
/// [`origin`](Link::origin).
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Link;
///
/// let edge = Link::windy(1, 10, 20, 4, 9);
/// assert_eq!(edge.cost_from(10), Some(4));
/// assert_eq!(edge.cost_from(20), Some(9));
///
/// let arc = Link::arc(2, 10, 20, 5);
/// assert_eq!(arc.cost_from(20), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    id: LinkId,
    from: VertexId,
    to: VertexId,
    cost: Cost,
    reverse_cost: Cost,
    required: bool,
    directed: bool,
    origin: Option<LinkId>,
}

impl Link {
    /// Creates a required undirected link with symmetric cost.
    pub fn edge(id: LinkId, from: VertexId, to: VertexId, cost: Cost) -> Self {
        Self::windy(id, from, to, cost, cost)
    }

    /// Creates a required undirected link with distinct costs per direction.
    pub fn windy(id: LinkId, from: VertexId, to: VertexId, cost: Cost, reverse_cost: Cost) -> Self {
        Self {
            id,
            from,
            to,
            cost,
            reverse_cost,
            required: true,
            directed: false,
            origin: None,
        }
    }

    /// Creates a required directed link.
    pub fn arc(id: LinkId, from: VertexId, to: VertexId, cost: Cost) -> Self {
        Self {
            directed: true,
            ..Self::edge(id, from, to, cost)
        }
    }

    /// Sets whether the link must be serviced.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    pub fn from(&self) -> VertexId {
        self.from
    }

    pub fn to(&self) -> VertexId {
        self.to
    }

    pub fn endpoints(&self) -> (VertexId, VertexId) {
        (self.from, self.to)
    }

    /// Cost of traversing from → to.
    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Cost of traversing to → from. Equals `cost` except on windy links.
    pub fn reverse_cost(&self) -> Cost {
        self.reverse_cost
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn is_loop(&self) -> bool {
        self.from == self.to
    }

    /// `true` if `cost` and `reverse_cost` differ on an undirected link.
    pub fn is_windy(&self) -> bool {
        !self.directed && self.cost != self.reverse_cost
    }

    /// The original link this one duplicates, if it was added by augmentation.
    pub fn origin(&self) -> Option<LinkId> {
        self.origin
    }

    /// `true` if this link was added by augmentation.
    pub fn is_added(&self) -> bool {
        self.origin.is_some()
    }

    /// Returns the endpoint opposite to `v`, or `None` if `v` is not an endpoint.
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        if v == self.from {
            Some(self.to)
        } else if v == self.to {
            Some(self.from)
        } else {
            None
        }
    }

    /// Cost of traversing the link starting at `tail`.
    ///
    /// Returns `None` if `tail` is not an endpoint, or if the link is
    /// directed and `tail` is its head.
    pub fn cost_from(&self, tail: VertexId) -> Option<Cost> {
        if tail == self.from {
            Some(self.cost)
        } else if tail == self.to && !self.directed {
            Some(self.reverse_cost)
        } else {
            None
        }
    }

    /// Returns a copy with a fresh id that remembers which original it copies.
    ///
    /// Copies are deadhead traversals and are never required.
    pub fn duplicate(&self, id: LinkId) -> Link {
        Link {
            id,
            origin: Some(self.origin.unwrap_or(self.id)),
            required: false,
            ..self.clone()
        }
    }

    /// Returns a directed version of this link leaving `tail`.
    ///
    /// The id, requirement and origin are kept. The cost becomes the cost of
    /// the chosen direction. If `tail` is not `to`, the link keeps its
    /// from → to direction.
    pub fn oriented(&self, tail: VertexId) -> Link {
        let mut link = self.clone();
        if tail == self.to && tail != self.from && !self.directed {
            link.from = self.to;
            link.to = self.from;
            link.cost = self.reverse_cost;
        }
        link.reverse_cost = link.cost;
        link.directed = true;
        link
    }
}
