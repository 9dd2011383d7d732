//! Owning graph container with degree bookkeeping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Cost, Link, LinkId, Variant, Vertex, VertexId};
use crate::error::{ArcRouteError, Result};

/// Degree counts of one vertex, derived from the current link set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Degree {
    /// Undirected link endpoints at this vertex (a loop counts twice).
    pub undirected: usize,
    /// Directed links entering this vertex.
    pub inward: usize,
    /// Directed links leaving this vertex.
    pub outward: usize,
}

impl Degree {
    /// Total number of link endpoints at the vertex.
    pub fn total(&self) -> usize {
        self.undirected + self.inward + self.outward
    }

    /// Out-degree minus in-degree over directed links.
    pub fn delta(&self) -> i64 {
        self.outward as i64 - self.inward as i64
    }
}

/// A multigraph of vertices and links keyed by stable integer ids.
///
/// Ids never collide within one graph, and a clone keeps every id. Vertex
/// degrees are recomputed from the link set on demand, so no statistic
/// can go stale across mutations.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
///
/// let mut g = Graph::with_vertices(3);
/// g.add_edge(1, 2, 4).unwrap();
/// g.add_edge(2, 3, 1).unwrap();
/// assert_eq!(g.num_links(), 2);
/// assert_eq!(g.odd_vertices(), vec![1, 3]);
/// assert_eq!(g.total_cost(), 5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    vertices: BTreeMap<VertexId, Vertex>,
    links: BTreeMap<LinkId, Link>,
    depot: Option<VertexId>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a graph with vertices `1..=n` and no links.
    pub fn with_vertices(n: usize) -> Self {
        let mut g = Self::new();
        for id in 1..=n {
            g.add_vertex(Vertex::new(id));
        }
        g
    }

    /// Designates the depot vertex.
    pub fn with_depot(mut self, depot: VertexId) -> Self {
        self.depot = Some(depot);
        self
    }

    /// Adds a vertex. Returns `false` if its id is already taken.
    pub fn add_vertex(&mut self, vertex: Vertex) -> bool {
        if self.vertices.contains_key(&vertex.id()) {
            return false;
        }
        self.vertices.insert(vertex.id(), vertex);
        true
    }

    /// Adds a link whose endpoints must already exist.
    pub fn add_link(&mut self, link: Link) -> Result<LinkId> {
        for v in [link.from(), link.to()] {
            if !self.vertices.contains_key(&v) {
                return Err(ArcRouteError::UnknownVertex(v));
            }
        }
        if self.links.contains_key(&link.id()) {
            return Err(ArcRouteError::precondition(format!(
                "link id {} is already in use",
                link.id()
            )));
        }
        let id = link.id();
        self.links.insert(id, link);
        Ok(id)
    }

    /// Adds a required undirected link with a fresh id.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId, cost: Cost) -> Result<LinkId> {
        self.add_link(Link::edge(self.next_link_id(), from, to, cost))
    }

    /// Adds a required directed link with a fresh id.
    pub fn add_arc(&mut self, from: VertexId, to: VertexId, cost: Cost) -> Result<LinkId> {
        self.add_link(Link::arc(self.next_link_id(), from, to, cost))
    }

    /// Adds a required windy link with a fresh id.
    pub fn add_windy_edge(
        &mut self,
        from: VertexId,
        to: VertexId,
        cost: Cost,
        reverse_cost: Cost,
    ) -> Result<LinkId> {
        self.add_link(Link::windy(self.next_link_id(), from, to, cost, reverse_cost))
    }

    /// Appends a copy of link `id` under a fresh id and returns the new id.
    pub fn duplicate_link(&mut self, id: LinkId) -> Result<LinkId> {
        let copy = self
            .links
            .get(&id)
            .ok_or(ArcRouteError::UnknownLink(id))?
            .duplicate(self.next_link_id());
        self.add_link(copy)
    }

    /// Removes a link, returning it if present.
    pub fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        self.links.remove(&id)
    }

    /// Replaces the whole link set.
    ///
    /// On error the graph is left without links.
    pub fn replace_links(&mut self, links: impl IntoIterator<Item = Link>) -> Result<()> {
        self.links.clear();
        for link in links {
            self.add_link(link)?;
        }
        Ok(())
    }

    /// Smallest id greater than every link id in the graph.
    pub fn next_link_id(&self) -> LinkId {
        self.links.keys().next_back().map_or(1, |&id| id + 1)
    }

    pub fn depot(&self) -> Option<VertexId> {
        self.depot
    }

    pub fn set_depot(&mut self, depot: Option<VertexId>) {
        self.depot = depot;
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    pub fn contains_link(&self, id: LinkId) -> bool {
        self.links.contains_key(&id)
    }

    /// Vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Links in ascending id order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.vertices.keys().copied().collect()
    }

    pub fn link_ids(&self) -> Vec<LinkId> {
        self.links.keys().copied().collect()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// `true` if any link is directed.
    pub fn has_directed(&self) -> bool {
        self.links.values().any(Link::is_directed)
    }

    /// `true` if any link is undirected.
    pub fn has_undirected(&self) -> bool {
        self.links.values().any(|l| !l.is_directed())
    }

    /// Degree counts of every vertex (vertices without links included).
    pub fn degree_table(&self) -> BTreeMap<VertexId, Degree> {
        let mut table: BTreeMap<VertexId, Degree> = self
            .vertices
            .keys()
            .map(|&id| (id, Degree::default()))
            .collect();
        for link in self.links.values() {
            let (a, b) = link.endpoints();
            if link.is_directed() {
                table.entry(a).or_default().outward += 1;
                table.entry(b).or_default().inward += 1;
            } else {
                table.entry(a).or_default().undirected += 1;
                table.entry(b).or_default().undirected += 1;
            }
        }
        table
    }

    /// Degree counts of a single vertex.
    pub fn degree(&self, v: VertexId) -> Degree {
        let mut degree = Degree::default();
        for link in self.links.values() {
            let (a, b) = link.endpoints();
            if link.is_directed() {
                if a == v {
                    degree.outward += 1;
                }
                if b == v {
                    degree.inward += 1;
                }
            } else {
                degree.undirected += usize::from(a == v) + usize::from(b == v);
            }
        }
        degree
    }

    pub fn in_degree(&self, v: VertexId) -> usize {
        self.degree(v).inward
    }

    pub fn out_degree(&self, v: VertexId) -> usize {
        self.degree(v).outward
    }

    /// Out-degree minus in-degree of `v` over directed links.
    pub fn delta(&self, v: VertexId) -> i64 {
        self.degree(v).delta()
    }

    /// Vertices whose total degree is odd, ascending.
    pub fn odd_vertices(&self) -> Vec<VertexId> {
        self.degree_table()
            .into_iter()
            .filter(|(_, d)| d.total() % 2 == 1)
            .map(|(id, _)| id)
            .collect()
    }

    /// `true` if every vertex has `delta = 0` and even undirected degree.
    ///
    /// For purely undirected or purely directed graphs this is the degree
    /// half of the Eulerian condition. For mixed graphs it is sufficient
    /// but not necessary; [`Graph::is_eulerian`] has the exact test.
    pub fn is_balanced(&self) -> bool {
        self.degree_table()
            .values()
            .all(|d| d.delta() == 0 && d.undirected % 2 == 0)
    }

    /// `true` if all linked vertices (and the depot) are connected,
    /// ignoring direction.
    pub fn is_connected(&self) -> bool {
        crate::distance::is_connected(self)
    }

    /// `true` if all linked vertices (and the depot) are mutually reachable
    /// along link directions.
    pub fn is_strongly_connected(&self) -> bool {
        crate::distance::is_strongly_connected(self)
    }

    /// `true` if the graph admits a closed walk using every link exactly
    /// once under the degree rules of `variant`.
    ///
    /// Undirected graphs need even degrees, directed graphs zero deltas.
    /// Mixed and windy graphs need an orientation of their undirected links
    /// that zeroes every delta (see
    /// [`orient_undirected`](crate::tour::orient_undirected)). Connectivity
    /// is strong whenever a directed link is present.
    pub fn is_eulerian(&self, variant: Variant) -> bool {
        let degrees_ok = match variant {
            Variant::Undirected => self.odd_vertices().is_empty() && !self.has_directed(),
            Variant::Directed => self.degree_table().values().all(|d| d.delta() == 0) && !self.has_undirected(),
            Variant::Mixed | Variant::Windy => crate::tour::orient_undirected(self).is_ok(),
        };
        if !degrees_ok {
            return false;
        }
        if self.has_directed() {
            self.is_strongly_connected()
        } else {
            self.is_connected()
        }
    }

    /// Sum of link costs in their stored direction.
    ///
    /// A windy link counts its `from -> to` cost whichever way a tour later
    /// walks it, so this is the traversal cost only once every windy link
    /// is oriented (as [`augment_windy`](crate::augment::augment_windy)
    /// leaves them). Use [`Route::cost`](crate::models::Route::cost) for
    /// what a tour actually pays.
    pub fn total_cost(&self) -> Cost {
        self.links.values().map(Link::cost).sum()
    }

    /// Sum of costs of links added by augmentation.
    pub fn added_cost(&self) -> Cost {
        self.links
            .values()
            .filter(|l| l.is_added())
            .map(Link::cost)
            .sum()
    }

    /// Links added by augmentation, ascending id.
    pub fn added_links(&self) -> impl Iterator<Item = &Link> {
        self.links.values().filter(|l| l.is_added())
    }

    /// Ids of links incident to `v`, ascending.
    pub fn incident(&self, v: VertexId) -> Vec<LinkId> {
        self.links
            .values()
            .filter(|l| l.from() == v || l.to() == v)
            .map(Link::id)
            .collect()
    }
}
