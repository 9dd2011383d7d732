//! Minimum-cost flow by successive shortest augmenting paths.
//!
//! # Algorithm
//!
//! Supply nodes hang off a super source and demand nodes off a super sink.
//! Each round finds a cheapest source → sink path in the residual network
//! with a queue-based Bellman-Ford (SPFA), which tolerates the negative
//! costs of residual back edges, and pushes the bottleneck amount along
//! it. Rounds repeat until all supply is shipped.
//!
//! # Complexity
//!
//! O(F · V · E) where F = total supply.

use std::collections::VecDeque;

use crate::error::{ArcRouteError, Phase, Result};
use crate::models::Cost;

/// An arc of a [`FlowNetwork`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowArc {
    pub tail: usize,
    pub head: usize,
    /// Cost per unit of flow. Must be non-negative.
    pub cost: Cost,
    /// Upper bound on flow, `None` for unbounded.
    pub capacity: Option<i64>,
}

/// A supply/demand digraph over nodes `0..n`.
///
/// `demand(v)` is the net inflow node `v` must receive: positive for
/// demand nodes, negative for supply nodes. Demands must sum to zero.
///
/// # Examples
///
/// ```
/// use u_arcroute::flow::FlowNetwork;
///
/// let mut net = FlowNetwork::new(3);
/// net.set_demand(0, -2);
/// net.set_demand(2, 2);
/// let direct = net.add_arc(0, 2, 5, Some(1));
/// let a = net.add_arc(0, 1, 1, None);
/// let b = net.add_arc(1, 2, 1, None);
///
/// let sol = net.solve().unwrap();
/// assert_eq!(sol.flow(a), 2);
/// assert_eq!(sol.flow(b), 2);
/// assert_eq!(sol.flow(direct), 0);
/// assert_eq!(sol.cost(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    demand: Vec<i64>,
    arcs: Vec<FlowArc>,
}

/// Optimal flow per arc, in the order arcs were added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSolution {
    flows: Vec<i64>,
    cost: Cost,
}

impl FlowSolution {
    /// Flow on arc `arc`.
    pub fn flow(&self, arc: usize) -> i64 {
        self.flows.get(arc).copied().unwrap_or(0)
    }

    pub fn flows(&self) -> &[i64] {
        &self.flows
    }

    /// Total cost, Σ flow × cost.
    pub fn cost(&self) -> Cost {
        self.cost
    }
}

struct Residual {
    to: usize,
    cap: i64,
    cost: Cost,
    rev: usize,
}

impl FlowNetwork {
    /// Creates a network with `nodes` nodes, zero demands and no arcs.
    pub fn new(nodes: usize) -> Self {
        Self {
            demand: vec![0; nodes],
            arcs: Vec::new(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.demand.len()
    }

    pub fn arcs(&self) -> &[FlowArc] {
        &self.arcs
    }

    /// Sets the net inflow node `node` must receive.
    pub fn set_demand(&mut self, node: usize, demand: i64) {
        if let Some(d) = self.demand.get_mut(node) {
            *d = demand;
        }
    }

    pub fn demand(&self, node: usize) -> i64 {
        self.demand.get(node).copied().unwrap_or(0)
    }

    /// Adds an arc and returns its index.
    pub fn add_arc(&mut self, tail: usize, head: usize, cost: Cost, capacity: Option<i64>) -> usize {
        self.arcs.push(FlowArc {
            tail,
            head,
            cost,
            capacity,
        });
        self.arcs.len() - 1
    }

    /// Computes a minimum-cost flow meeting every demand.
    ///
    /// # Errors
    ///
    /// - Precondition failure if demands do not sum to zero, an arc names a
    ///   missing node, or an arc has negative cost or capacity.
    /// - [`Phase::Flow`] infeasibility if supply remains but no augmenting
    ///   path exists.
    pub fn solve(&self) -> Result<FlowSolution> {
        self.validate()?;
        let n = self.num_nodes();
        let total: i64 = self.demand.iter().filter(|&&d| d > 0).sum();
        if total == 0 {
            return Ok(FlowSolution {
                flows: vec![0; self.arcs.len()],
                cost: 0,
            });
        }

        let source = n;
        let sink = n + 1;
        let mut graph: Vec<Vec<Residual>> = (0..n + 2).map(|_| Vec::new()).collect();
        let mut arc_edges = Vec::with_capacity(self.arcs.len());
        for arc in &self.arcs {
            let cap = arc.capacity.unwrap_or(total).min(total);
            arc_edges.push(add_residual(&mut graph, arc.tail, arc.head, cap, arc.cost));
        }
        for (v, &d) in self.demand.iter().enumerate() {
            if d < 0 {
                add_residual(&mut graph, source, v, -d, 0);
            } else if d > 0 {
                add_residual(&mut graph, v, sink, d, 0);
            }
        }

        let mut remaining = total;
        while remaining > 0 {
            let (dist, prev) = cheapest_paths(&graph, source);
            if dist[sink].is_none() {
                return Err(ArcRouteError::infeasible(
                    Phase::Flow,
                    format!("{remaining} units of supply cannot reach any demand"),
                ));
            }

            // Bottleneck along the path
            let mut push = remaining;
            let mut v = sink;
            while v != source {
                let (u, e) = prev[v];
                push = push.min(graph[u][e].cap);
                v = u;
            }

            let mut v = sink;
            while v != source {
                let (u, e) = prev[v];
                graph[u][e].cap -= push;
                let (to, rev) = (graph[u][e].to, graph[u][e].rev);
                graph[to][rev].cap += push;
                v = u;
            }
            remaining -= push;
        }

        let flows: Vec<i64> = arc_edges
            .iter()
            .map(|&(u, e)| {
                let edge = &graph[u][e];
                graph[edge.to][edge.rev].cap
            })
            .collect();
        let cost = flows
            .iter()
            .zip(&self.arcs)
            .map(|(&f, arc)| f * arc.cost)
            .sum();
        Ok(FlowSolution { flows, cost })
    }

    fn validate(&self) -> Result<()> {
        let n = self.num_nodes();
        let sum: i64 = self.demand.iter().sum();
        if sum != 0 {
            return Err(ArcRouteError::precondition(format!(
                "demands sum to {sum}, expected 0"
            )));
        }
        for (k, arc) in self.arcs.iter().enumerate() {
            if arc.tail >= n || arc.head >= n {
                return Err(ArcRouteError::precondition(format!(
                    "flow arc {k} joins missing nodes"
                )));
            }
            if arc.cost < 0 || arc.capacity.is_some_and(|c| c < 0) {
                return Err(ArcRouteError::precondition(format!(
                    "flow arc {k} has negative cost or capacity"
                )));
            }
        }
        Ok(())
    }
}

fn add_residual(graph: &mut [Vec<Residual>], from: usize, to: usize, cap: i64, cost: Cost) -> (usize, usize) {
    let forward = graph[from].len();
    let backward = graph[to].len() + usize::from(from == to);
    graph[from].push(Residual {
        to,
        cap,
        cost,
        rev: backward,
    });
    graph[to].push(Residual {
        to: from,
        cap: 0,
        cost: -cost,
        rev: forward,
    });
    (from, forward)
}

/// SPFA from `source`. Returns distances and, per node, the residual edge
/// used to reach it as `(tail node, edge index)`.
fn cheapest_paths(graph: &[Vec<Residual>], source: usize) -> (Vec<Option<Cost>>, Vec<(usize, usize)>) {
    let n = graph.len();
    let mut dist: Vec<Option<Cost>> = vec![None; n];
    let mut prev = vec![(usize::MAX, usize::MAX); n];
    let mut queued = vec![false; n];
    let mut queue = VecDeque::from([source]);
    dist[source] = Some(0);
    queued[source] = true;

    while let Some(u) = queue.pop_front() {
        queued[u] = false;
        let Some(du) = dist[u] else {
            continue;
        };
        for (e, edge) in graph[u].iter().enumerate() {
            if edge.cap <= 0 {
                continue;
            }
            let candidate = du + edge.cost;
            if dist[edge.to].map_or(true, |d| candidate < d) {
                dist[edge.to] = Some(candidate);
                prev[edge.to] = (u, e);
                if !queued[edge.to] {
                    queued[edge.to] = true;
                    queue.push_back(edge.to);
                }
            }
        }
    }
    (dist, prev)
}
