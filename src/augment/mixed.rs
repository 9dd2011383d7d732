//! Mixed Chinese postman heuristics.
//!
//! # Algorithm
//!
//! A mixed multigraph is Eulerian when it is connected, every vertex has
//! zero `delta` over its arcs and every vertex has even undirected degree.
//! Two constructions reach that state:
//!
//! - **Even degree first.** Pair odd-degree vertices ignoring direction
//!   ([`even_degree`]), balance in/out degree by a flow that may orient
//!   undirected links and copy links ([`in_out_degree`]), then repair the
//!   parity the flow broke along alternating walks that keep the balance
//!   ([`even_parity`]).
//! - **Symmetry first.** Balance in/out degree first, then pair the
//!   vertices of odd undirected degree on paths over undirected links and
//!   copy those paths as undirected links ([`large_cycles`]).
//!
//! Both start from their own clone of the input. [`MixedStrategy::Best`]
//! runs both and keeps the cheaper result, ties going to even degree first.
//!
//! # Reference
//!
//! Frederickson, G.N. (1979). "Approximation algorithms for some postman
//! problems", *Journal of the ACM* 26(3), 538-554.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::correspondence::Correspondence;
use super::pairing::pair_vertices;
use crate::distance::ShortestPaths;
use crate::error::{ArcRouteError, Phase, Result};
use crate::flow::FlowNetwork;
use crate::models::{Cost, Graph, Link, LinkId, VertexId};

/// Which mixed construction(s) to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MixedStrategy {
    /// Run both constructions, keep the cheaper.
    #[default]
    Best,
    /// Even degree, in/out degree, even parity.
    EvenDegreeFirst,
    /// In/out degree, large cycles.
    SymmetryFirst,
}

/// Link set split into arcs and undirected links after in/out balancing.
#[derive(Debug, Clone, Default)]
pub struct Symmetric {
    /// Arcs: original arcs, oriented links and balancing copies.
    pub directed: BTreeMap<LinkId, Link>,
    /// Links left undirected.
    pub undirected: BTreeMap<LinkId, Link>,
    /// Ids of the balancing copies within `directed`.
    pub copies: BTreeSet<LinkId>,
    next_id: LinkId,
}

impl Symmetric {
    fn fresh_id(&mut self) -> LinkId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// All links, arcs first.
    pub fn into_links(self) -> impl Iterator<Item = Link> {
        self.directed.into_values().chain(self.undirected.into_values())
    }

    /// Undirected degree of every vertex with at least one undirected link.
    fn undirected_degree(&self) -> BTreeMap<VertexId, usize> {
        let mut degree = BTreeMap::new();
        for link in self.undirected.values() {
            *degree.entry(link.from()).or_insert(0) += 1;
            *degree.entry(link.to()).or_insert(0) += 1;
        }
        degree
    }

    /// Vertices of odd undirected degree, ascending.
    pub fn odd_vertices(&self) -> Vec<VertexId> {
        self.undirected_degree()
            .into_iter()
            .filter(|(_, d)| d % 2 == 1)
            .map(|(v, _)| v)
            .collect()
    }
}

/// Runs the configured mixed construction(s) on a clone of `graph`.
///
/// With `eliminate_cycles`, directed cycles made only of added arcs are
/// removed from each result before the comparison.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::augment::{augment_mixed, MixedStrategy};
///
/// let mut g = Graph::with_vertices(3);
/// g.add_arc(1, 2, 1).unwrap();
/// g.add_arc(2, 3, 1).unwrap();
/// g.add_edge(3, 1, 2).unwrap();
///
/// let out = augment_mixed(&g, MixedStrategy::Best, true).unwrap();
/// assert!(out.is_balanced());
/// assert_eq!(out.total_cost(), 4);
/// ```
pub fn augment_mixed(
    graph: &Graph,
    strategy: MixedStrategy,
    eliminate_cycles: bool,
) -> Result<Graph> {
    let finish = |mut g: Graph| -> Graph {
        if eliminate_cycles {
            eliminate_added_cycles(&mut g);
        }
        g
    };
    match strategy {
        MixedStrategy::EvenDegreeFirst => Ok(finish(even_degree_first(graph)?)),
        MixedStrategy::SymmetryFirst => Ok(finish(symmetry_first(graph)?)),
        MixedStrategy::Best => {
            let first = finish(even_degree_first(graph)?);
            let second = finish(symmetry_first(graph)?);
            info!(
                "augment.mixed: even_degree_first={} symmetry_first={}",
                first.total_cost(),
                second.total_cost()
            );
            Ok(cheaper(first, second))
        }
    }
}

/// Returns `second` only if it is strictly cheaper than `first`.
pub fn cheaper(first: Graph, second: Graph) -> Graph {
    if second.total_cost() < first.total_cost() {
        second
    } else {
        first
    }
}

/// Even degree, in/out degree and even parity on a clone of `graph`.
pub fn even_degree_first(graph: &Graph) -> Result<Graph> {
    let mut g = graph.clone();
    even_degree(&mut g)?;
    let mut sym = in_out_degree(&g)?;
    even_parity(&mut sym)?;
    g.replace_links(sym.into_links())?;
    Ok(g)
}

/// In/out degree and large cycles on a clone of `graph`.
pub fn symmetry_first(graph: &Graph) -> Result<Graph> {
    let mut g = graph.clone();
    let mut sym = in_out_degree(&g)?;
    large_cycles(graph, &mut sym)?;
    g.replace_links(sym.into_links())?;
    Ok(g)
}

/// Makes every total degree even, ignoring link direction.
///
/// Duplicated arcs keep their direction. Returns the added cost.
pub fn even_degree(graph: &mut Graph) -> Result<Cost> {
    let odd = graph.odd_vertices();
    debug!("augment.mixed.even_degree: odd_vertices={}", odd.len());
    if odd.is_empty() {
        return Ok(0);
    }
    let paths = ShortestPaths::compute_with(graph, |link, _| Some(link.cost()));
    let (pairs, cost) = pair_vertices(&odd, |u, v| paths.distance(u, v), None)
        .map_err(|err| rephase(err, Phase::EvenDegree))?;
    for (u, v) in pairs {
        paths
            .augment_with_path(graph, u, v)
            .map_err(|err| rephase(err, Phase::EvenDegree))?;
    }
    Ok(cost)
}

/// What one arc of the balancing network stands for.
enum Move {
    /// Add a copy of the link leaving the arc's tail.
    Copy(LinkId, VertexId),
    /// Orient an undirected link leaving the arc's tail.
    Orient(LinkId, VertexId),
}

/// Balances in/out degree by a min-cost flow.
///
/// Every non-loop link may be copied in any allowed direction at its cost,
/// and every undirected link may be oriented either way for free. Links
/// whose orientation nets to zero stay undirected.
///
/// # Errors
///
/// [`Phase::InOutDegree`] infeasibility if the graph is not strongly
/// connected.
pub fn in_out_degree(graph: &Graph) -> Result<Symmetric> {
    let table = graph.degree_table();
    let nodes = Correspondence::new(table.keys().copied());
    let mut network = FlowNetwork::new(nodes.len());
    for (&v, d) in &table {
        if let Some(i) = nodes.index_of(v) {
            network.set_demand(i, d.delta());
        }
    }

    let mut moves = Vec::new();
    for link in graph.links().filter(|l| !l.is_loop()) {
        let (Some(i), Some(j)) = (nodes.index_of(link.from()), nodes.index_of(link.to())) else {
            continue;
        };
        network.add_arc(i, j, link.cost(), None);
        moves.push(Move::Copy(link.id(), link.from()));
        if !link.is_directed() {
            network.add_arc(j, i, link.cost(), None);
            moves.push(Move::Copy(link.id(), link.to()));
            network.add_arc(i, j, 0, Some(1));
            moves.push(Move::Orient(link.id(), link.from()));
            network.add_arc(j, i, 0, Some(1));
            moves.push(Move::Orient(link.id(), link.to()));
        }
    }

    let flow = network
        .solve()
        .map_err(|err| rephase(err, Phase::InOutDegree))?;
    debug!("augment.mixed.in_out_degree: flow_cost={}", flow.cost());

    let mut sym = Symmetric {
        next_id: graph.next_link_id(),
        ..Symmetric::default()
    };
    let mut net_orientation: BTreeMap<LinkId, i64> = BTreeMap::new();
    for (arc, mv) in moves.iter().enumerate() {
        let units = flow.flow(arc);
        match *mv {
            Move::Copy(id, tail) => {
                let link = graph.link(id).ok_or(ArcRouteError::UnknownLink(id))?;
                for _ in 0..units {
                    let copy = link.duplicate(sym.fresh_id()).oriented(tail);
                    sym.copies.insert(copy.id());
                    sym.directed.insert(copy.id(), copy);
                }
            }
            Move::Orient(id, tail) => {
                let link = graph.link(id).ok_or(ArcRouteError::UnknownLink(id))?;
                let sign = if tail == link.from() { 1 } else { -1 };
                *net_orientation.entry(id).or_insert(0) += sign * units;
            }
        }
    }

    for link in graph.links() {
        if link.is_directed() {
            sym.directed.insert(link.id(), link.clone());
            continue;
        }
        match net_orientation.get(&link.id()).copied().unwrap_or(0) {
            n if n > 0 => {
                sym.directed.insert(link.id(), link.oriented(link.from()));
            }
            n if n < 0 => {
                sym.directed.insert(link.id(), link.oriented(link.to()));
            }
            _ => {
                sym.undirected.insert(link.id(), link.clone());
            }
        }
    }
    debug!(
        "augment.mixed.in_out_degree: copies={} undirected={}",
        sym.copies.len(),
        sym.undirected.len()
    );
    Ok(sym)
}

/// One step of an alternating walk.
struct Step {
    link: LinkId,
    from: VertexId,
    to: VertexId,
}

/// Restores even undirected degree without breaking in/out balance.
///
/// The vertices of odd undirected degree are exactly the vertices touched
/// by an odd number of balancing copies. They are chained into closed
/// alternating walks: a walk over unused copies (direction ignored)
/// followed by a walk over unused undirected links, repeated until the
/// chain returns to its start. A copy traversed along its direction is
/// doubled, one traversed against it is dropped, and every undirected link
/// on the walk is oriented along it. Each walk changes the balance of its
/// two ends by one in opposite directions, so a closed chain leaves all
/// balances at zero while flipping the undirected parity of every odd
/// vertex exactly once.
///
/// # Errors
///
/// [`Phase::EvenParity`] infeasibility if a walk gets stuck, which happens
/// only when total degrees were not even before balancing.
pub fn even_parity(sym: &mut Symmetric) -> Result<()> {
    let odd: BTreeSet<VertexId> = sym.odd_vertices().into_iter().collect();
    debug!("augment.mixed.even_parity: odd_vertices={}", odd.len());
    if odd.is_empty() {
        return Ok(());
    }

    let copy_adjacency = adjacency(sym.copies.iter().filter_map(|id| sym.directed.get(id)));
    let edge_adjacency = adjacency(sym.undirected.values().filter(|l| !l.is_loop()));
    let mut used_copies: BTreeSet<LinkId> = BTreeSet::new();
    let mut used_edges: BTreeSet<LinkId> = BTreeSet::new();
    let mut m_done: BTreeSet<VertexId> = BTreeSet::new();
    let mut u_done: BTreeSet<VertexId> = BTreeSet::new();
    let mut chains = 0usize;

    for &start in &odd {
        if m_done.contains(&start) {
            continue;
        }
        m_done.insert(start);
        chains += 1;
        let mut current = start;
        loop {
            let copy_walk = walk(&copy_adjacency, &mut used_copies, current, |v| {
                odd.contains(&v) && !m_done.contains(&v)
            })
            .ok_or_else(|| stuck(current, "balancing copies"))?;
            let pivot = copy_walk.last().map_or(current, |s| s.to);
            m_done.insert(pivot);
            u_done.insert(pivot);
            apply_copy_walk(sym, &copy_walk)?;

            let edge_walk = walk(&edge_adjacency, &mut used_edges, pivot, |v| {
                odd.contains(&v) && !u_done.contains(&v)
            })
            .ok_or_else(|| stuck(pivot, "undirected links"))?;
            let end = edge_walk.last().map_or(pivot, |s| s.to);
            u_done.insert(end);
            apply_edge_walk(sym, &edge_walk)?;

            if end == start {
                break;
            }
            m_done.insert(end);
            current = end;
        }
    }
    debug!("augment.mixed.even_parity: chains={chains}");
    Ok(())
}

fn stuck(at: VertexId, over: &str) -> ArcRouteError {
    ArcRouteError::infeasible(
        Phase::EvenParity,
        format!("alternating walk from vertex {at} over {over} got stuck"),
    )
}

fn adjacency<'a>(
    links: impl Iterator<Item = &'a Link>,
) -> BTreeMap<VertexId, Vec<(LinkId, VertexId)>> {
    let mut adj: BTreeMap<VertexId, Vec<(LinkId, VertexId)>> = BTreeMap::new();
    for link in links {
        adj.entry(link.from()).or_default().push((link.id(), link.to()));
        adj.entry(link.to()).or_default().push((link.id(), link.from()));
    }
    adj
}

/// Walks unused links from `start` until a vertex accepted by `is_target`
/// other than `start` is reached. Links are marked used as they are taken.
///
/// Returns `None` if no unused link leaves the current vertex first.
fn walk<F>(
    adjacency: &BTreeMap<VertexId, Vec<(LinkId, VertexId)>>,
    used: &mut BTreeSet<LinkId>,
    start: VertexId,
    is_target: F,
) -> Option<Vec<Step>>
where
    F: Fn(VertexId) -> bool,
{
    let mut steps = Vec::new();
    let mut at = start;
    loop {
        let &(link, next) = adjacency
            .get(&at)?
            .iter()
            .find(|(id, _)| !used.contains(id))?;
        used.insert(link);
        steps.push(Step {
            link,
            from: at,
            to: next,
        });
        at = next;
        if at != start && is_target(at) {
            return Some(steps);
        }
    }
}

fn apply_copy_walk(sym: &mut Symmetric, steps: &[Step]) -> Result<()> {
    for step in steps {
        let link = sym
            .directed
            .get(&step.link)
            .ok_or(ArcRouteError::UnknownLink(step.link))?;
        if link.from() == step.from {
            let copy = link.duplicate(sym.next_id);
            sym.next_id += 1;
            sym.directed.insert(copy.id(), copy);
        } else {
            sym.directed.remove(&step.link);
            sym.copies.remove(&step.link);
        }
    }
    Ok(())
}

fn apply_edge_walk(sym: &mut Symmetric, steps: &[Step]) -> Result<()> {
    for step in steps {
        let link = sym
            .undirected
            .remove(&step.link)
            .ok_or(ArcRouteError::UnknownLink(step.link))?;
        sym.directed.insert(link.id(), link.oriented(step.from));
    }
    Ok(())
}

/// Restores even undirected degree by copying undirected paths.
///
/// Vertices of odd undirected degree are matched on shortest paths over the
/// undirected links of `original`; pairs in different undirected
/// components get a penalty larger than any real pairing. Every matched
/// path is copied into the undirected set. Returns the cost of the copies.
///
/// # Errors
///
/// [`Phase::LargeCycles`] infeasibility if a penalized pair is chosen.
pub fn large_cycles(original: &Graph, sym: &mut Symmetric) -> Result<Cost> {
    let odd = sym.odd_vertices();
    debug!("augment.mixed.large_cycles: odd_vertices={}", odd.len());
    if odd.is_empty() {
        return Ok(0);
    }

    let paths = ShortestPaths::compute_with(original, |link, _| {
        (!link.is_directed()).then_some(link.cost())
    });
    let penalty = original
        .links()
        .filter(|l| !l.is_directed())
        .map(Link::cost)
        .sum::<Cost>()
        + 1;
    let (pairs, _) = pair_vertices(&odd, |u, v| paths.distance(u, v), Some(penalty))
        .map_err(|err| rephase(err, Phase::LargeCycles))?;

    let mut added: Cost = 0;
    for (u, v) in pairs {
        let hops = paths.path(u, v).ok_or_else(|| {
            ArcRouteError::infeasible(
                Phase::LargeCycles,
                format!("no undirected path between {u} and {v}"),
            )
        })?;
        for hop in hops {
            let link = original
                .link(hop.link)
                .ok_or(ArcRouteError::UnknownLink(hop.link))?;
            let copy = link.duplicate(sym.fresh_id());
            added += copy.cost();
            sym.undirected.insert(copy.id(), copy);
        }
    }
    debug!("augment.mixed.large_cycles: added_cost={added}");
    Ok(added)
}

/// Removes directed cycles made only of added arcs.
///
/// Each removal lowers every vertex's in- and out-degree on the cycle by
/// one, so balance and parity survive. Returns the number of links removed.
pub fn eliminate_added_cycles(graph: &mut Graph) -> usize {
    let mut removed = 0;
    while let Some(cycle) = find_added_cycle(graph) {
        for id in &cycle {
            graph.remove_link(*id);
        }
        removed += cycle.len();
    }
    if removed > 0 {
        debug!("augment.mixed: removed_added_arcs={removed}");
    }
    removed
}

const ON_STACK: u8 = 1;
const DONE: u8 = 2;

/// Finds a directed cycle using added arcs only, by iterative DFS.
fn find_added_cycle(graph: &Graph) -> Option<Vec<LinkId>> {
    let mut out: BTreeMap<VertexId, Vec<(LinkId, VertexId)>> = BTreeMap::new();
    for link in graph.added_links().filter(|l| l.is_directed()) {
        if link.is_loop() {
            return Some(vec![link.id()]);
        }
        out.entry(link.from()).or_default().push((link.id(), link.to()));
    }

    let mut state: BTreeMap<VertexId, u8> = BTreeMap::new();
    for &root in out.keys() {
        if state.contains_key(&root) {
            continue;
        }
        state.insert(root, ON_STACK);
        let mut stack: Vec<(VertexId, usize)> = vec![(root, 0)];
        // via[i] leads from stack[i] to stack[i + 1]
        let mut via: Vec<LinkId> = Vec::new();

        while let Some(&(v, next)) = stack.last() {
            let edge = out.get(&v).and_then(|edges| edges.get(next)).copied();
            let Some((link, head)) = edge else {
                state.insert(v, DONE);
                stack.pop();
                via.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }
            match state.get(&head) {
                None => {
                    state.insert(head, ON_STACK);
                    via.push(link);
                    stack.push((head, 0));
                }
                Some(&ON_STACK) => {
                    let pos = stack.iter().position(|&(u, _)| u == head)?;
                    let mut cycle = via[pos..].to_vec();
                    cycle.push(link);
                    return Some(cycle);
                }
                Some(_) => {}
            }
        }
    }
    None
}

fn rephase(err: ArcRouteError, phase: Phase) -> ArcRouteError {
    match err {
        ArcRouteError::Infeasible { reason, .. } => ArcRouteError::infeasible(phase, reason),
        other => other,
    }
}
