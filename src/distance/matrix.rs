//! All-pairs shortest paths with path reconstruction.
//!
//! # Algorithm
//!
//! Floyd–Warshall over a dense row-major matrix. Alongside each distance
//! the matrix keeps the first vertex and the first link of one shortest
//! path, so any path can be rebuilt by repeated next-hop lookup.
//!
//! # Complexity
//!
//! O(n³) time, O(n²) space where n = number of vertices.

use std::collections::BTreeMap;

use crate::error::{ArcRouteError, Phase, Result};
use crate::models::{Cost, Graph, Link, LinkId, VertexId};

const UNREACHABLE: Cost = Cost::MAX / 4;

/// One link traversal on a reconstructed path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub link: LinkId,
    pub from: VertexId,
    pub to: VertexId,
}

/// Shortest distances, next hops and first links between all vertex pairs.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::distance::ShortestPaths;
///
/// let mut g = Graph::with_vertices(3);
/// g.add_edge(1, 2, 4).unwrap();
/// g.add_edge(2, 3, 1).unwrap();
/// g.add_edge(1, 3, 9).unwrap();
///
/// let sp = ShortestPaths::compute(&g);
/// assert_eq!(sp.distance(1, 3), Some(5));
/// let hops: Vec<_> = sp.path(1, 3).unwrap().iter().map(|h| h.link).collect();
/// assert_eq!(hops, vec![1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    ids: Vec<VertexId>,
    index: BTreeMap<VertexId, usize>,
    dist: Vec<Cost>,
    next_vertex: Vec<usize>,
    next_link: Vec<Option<LinkId>>,
    size: usize,
}

impl ShortestPaths {
    /// Computes shortest paths honoring link direction and per-direction cost.
    pub fn compute(graph: &Graph) -> Self {
        Self::compute_with(graph, |link, tail| link.cost_from(tail))
    }

    /// Computes shortest paths with a caller-supplied traversal weight.
    ///
    /// `weight(link, tail)` returns the cost of traversing `link` starting
    /// at `tail`, or `None` if that traversal is not allowed. It is asked for
    /// both endpoints of every link. Loops are ignored. Among parallel links
    /// the cheapest wins, ties going to the lower link id.
    pub fn compute_with<F>(graph: &Graph, weight: F) -> Self
    where
        F: Fn(&Link, VertexId) -> Option<Cost>,
    {
        let ids = graph.vertex_ids();
        let index: BTreeMap<VertexId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let n = ids.len();
        let mut sp = Self {
            ids,
            index,
            dist: vec![UNREACHABLE; n * n],
            next_vertex: vec![usize::MAX; n * n],
            next_link: vec![None; n * n],
            size: n,
        };

        for i in 0..n {
            sp.dist[i * n + i] = 0;
            sp.next_vertex[i * n + i] = i;
        }

        for link in graph.links() {
            if link.is_loop() {
                continue;
            }
            for (tail, head) in [(link.from(), link.to()), (link.to(), link.from())] {
                let Some(w) = weight(link, tail) else {
                    continue;
                };
                let (Some(&i), Some(&j)) = (sp.index.get(&tail), sp.index.get(&head)) else {
                    continue;
                };
                let cell = i * n + j;
                if w < sp.dist[cell] {
                    sp.dist[cell] = w;
                    sp.next_vertex[cell] = j;
                    sp.next_link[cell] = Some(link.id());
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                let ik = sp.dist[i * n + k];
                if ik >= UNREACHABLE {
                    continue;
                }
                for j in 0..n {
                    let kj = sp.dist[k * n + j];
                    if kj >= UNREACHABLE {
                        continue;
                    }
                    let cell = i * n + j;
                    if ik + kj < sp.dist[cell] {
                        sp.dist[cell] = ik + kj;
                        sp.next_vertex[cell] = sp.next_vertex[i * n + k];
                        sp.next_link[cell] = sp.next_link[i * n + k];
                    }
                }
            }
        }

        sp
    }

    /// Number of vertices covered.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Shortest distance from `u` to `v`, or `None` if unreachable or unknown.
    pub fn distance(&self, u: VertexId, v: VertexId) -> Option<Cost> {
        let (i, j) = self.cell(u, v)?;
        let d = self.dist[i * self.size + j];
        (d < UNREACHABLE).then_some(d)
    }

    /// Reconstructs one shortest path from `u` to `v`.
    ///
    /// Returns an empty path when `u == v`, `None` if `v` is unreachable.
    pub fn path(&self, u: VertexId, v: VertexId) -> Option<Vec<Hop>> {
        let (mut i, j) = self.cell(u, v)?;
        if self.dist[i * self.size + j] >= UNREACHABLE {
            return None;
        }
        let mut hops = Vec::new();
        while i != j {
            let cell = i * self.size + j;
            let next = self.next_vertex[cell];
            let link = self.next_link[cell]?;
            hops.push(Hop {
                link,
                from: self.ids[i],
                to: *self.ids.get(next)?,
            });
            i = next;
        }
        Some(hops)
    }

    /// Appends one duplicate of every link on the shortest `u` → `v` path.
    ///
    /// Returns the added cost, which equals `distance(u, v)` under the
    /// weight the paths were computed with. Returns 0 without touching the
    /// graph when `u == v`. Fails with [`Phase::ShortestPath`] infeasibility,
    /// leaving `graph` untouched, when there is no path.
    pub fn augment_with_path(&self, graph: &mut Graph, u: VertexId, v: VertexId) -> Result<Cost> {
        if u == v {
            return Ok(0);
        }
        let (Some(cost), Some(hops)) = (self.distance(u, v), self.path(u, v)) else {
            return Err(ArcRouteError::infeasible(
                Phase::ShortestPath,
                format!("no path from {u} to {v}"),
            ));
        };
        if let Some(hop) = hops.iter().find(|h| !graph.contains_link(h.link)) {
            return Err(ArcRouteError::UnknownLink(hop.link));
        }
        for hop in &hops {
            graph.duplicate_link(hop.link)?;
        }
        Ok(cost)
    }

    fn cell(&self, u: VertexId, v: VertexId) -> Option<(usize, usize)> {
        Some((*self.index.get(&u)?, *self.index.get(&v)?))
    }
}
