//! Eulerian circuit extraction.
//!
//! # Algorithm
//!
//! Hierholzer's algorithm with an explicit stack: follow unused links from
//! the start until stuck, then back up, emitting links in reverse as the
//! stack unwinds. Every time the walk backs up to a vertex with unused
//! links, the sub-tour started there is spliced in at that point.
//!
//! Mixed graphs are handled in two passes. First every undirected link
//! gets a direction: each starts the cheaper way round, and a unit-capacity
//! min-cost flow flips just enough of them to give every vertex equal in-
//! and out-degree (Ford & Fulkerson's orientation test). The fully
//! oriented graph then gets a directed circuit.
//!
//! # Complexity
//!
//! O(V + E log E) for the circuit; the orientation flow is O(E · V · E)
//! in the worst case.
//!
//! # Reference
//!
//! Hierholzer, C. & Wiener, C. (1873). "Über die Möglichkeit, einen
//! Linienzug ohne Wiederholung und ohne Unterbrechung zu umfahren",
//! *Mathematische Annalen* 6, 30-32.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::error::{ArcRouteError, Result};
use crate::flow::FlowNetwork;
use crate::models::{Graph, LinkId, Route, RouteStep, VertexId};

type Adjacency = BTreeMap<VertexId, Vec<(LinkId, VertexId)>>;

/// One traversal of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Traversal {
    link: LinkId,
    from: VertexId,
    to: VertexId,
}

/// Vertex a tour on `graph` starts from.
///
/// The depot if it has an incident link, else the smallest vertex id with
/// one, else `None` for a graph without links.
pub fn tour_start(graph: &Graph) -> Option<VertexId> {
    if let Some(depot) = graph.depot() {
        if graph.links().any(|l| l.from() == depot || l.to() == depot) {
            return Some(depot);
        }
    }
    graph.links().map(|l| l.from().min(l.to())).min()
}

/// Extracts an Eulerian circuit of `graph` as a route.
///
/// Every link appears exactly once. Steps record the traversal cost in the
/// direction taken, and whether they service a required original link.
///
/// # Errors
///
/// [`ArcRouteError::InvariantViolation`] if no orientation of the
/// undirected links balances the graph, or its links are not connected.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::tour::build_tour;
///
/// let mut g = Graph::with_vertices(3).with_depot(2);
/// g.add_edge(1, 2, 1).unwrap();
/// g.add_edge(2, 3, 2).unwrap();
/// g.add_edge(3, 1, 3).unwrap();
///
/// let route = build_tour(&g).unwrap();
/// assert_eq!(route.len(), 3);
/// assert_eq!(route.start(), Some(2));
/// assert!(route.is_closed());
/// assert_eq!(route.cost(), 6);
/// ```
pub fn build_tour(graph: &Graph) -> Result<Route> {
    let Some(start) = tour_start(graph) else {
        return Ok(Route::new());
    };

    let tails = orient_undirected(graph)?;
    let mut out: Adjacency = BTreeMap::new();
    for link in graph.links() {
        let (tail, head) = match tails.get(&link.id()) {
            Some(&tail) => (tail, link.other(tail).unwrap_or(tail)),
            None => link.endpoints(),
        };
        out.entry(tail).or_default().push((link.id(), head));
    }

    let circuit = euler_circuit(start, &out);
    if circuit.len() != graph.num_links() {
        return Err(ArcRouteError::invariant(format!(
            "circuit covers {} of {} links; graph is not connected",
            circuit.len(),
            graph.num_links()
        )));
    }

    let mut route = Route::new();
    for t in circuit {
        let link = graph.link(t.link).ok_or(ArcRouteError::UnknownLink(t.link))?;
        let cost = link.cost_from(t.from).ok_or_else(|| {
            ArcRouteError::invariant(format!("link {} traversed against its direction", t.link))
        })?;
        route.push_step(RouteStep {
            link: t.link,
            origin: link.origin().unwrap_or(t.link),
            from: t.from,
            to: t.to,
            cost,
            service: link.is_required() && !link.is_added(),
        });
    }
    debug!(
        "tour: start={} steps={} cost={}",
        start,
        route.len(),
        route.cost()
    );
    Ok(route)
}

/// Chooses a direction for every undirected link so that each vertex has
/// as many links leaving as entering, at the least traversal cost.
///
/// Every undirected link starts in its cheaper direction. A min-cost flow
/// then picks the links to flip, one unit per link, priced at the extra
/// cost of the other direction. Loops keep their stored endpoints.
///
/// Returns the chosen tail per undirected link id.
///
/// # Errors
///
/// [`ArcRouteError::InvariantViolation`] if no orientation balances the
/// graph.
///
/// # Examples
///
/// ```
/// use u_arcroute::models::Graph;
/// use u_arcroute::tour::orient_undirected;
///
/// // The edge has to carry the walk back from 2 to 1.
/// let mut g = Graph::with_vertices(2);
/// g.add_arc(1, 2, 1).unwrap();
/// g.add_edge(1, 2, 1).unwrap();
/// assert_eq!(orient_undirected(&g).unwrap().get(&2), Some(&2));
/// ```
pub fn orient_undirected(graph: &Graph) -> Result<BTreeMap<LinkId, VertexId>> {
    let mut tails: BTreeMap<LinkId, VertexId> = BTreeMap::new();
    let mut excess: BTreeMap<VertexId, i64> = BTreeMap::new();
    for link in graph.links() {
        let (tail, head) = if link.is_directed() {
            link.endpoints()
        } else {
            let (a, b) = link.endpoints();
            let tail = match (link.cost_from(a), link.cost_from(b)) {
                (Some(ab), Some(ba)) if ba < ab => b,
                _ => a,
            };
            tails.insert(link.id(), tail);
            (tail, link.other(tail).unwrap_or(tail))
        };
        *excess.entry(tail).or_default() += 1;
        *excess.entry(head).or_default() -= 1;
    }

    let index: BTreeMap<VertexId, usize> =
        excess.keys().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut network = FlowNetwork::new(index.len());
    for (i, (&v, &x)) in excess.iter().enumerate() {
        if x % 2 != 0 {
            return Err(ArcRouteError::invariant(format!(
                "vertex {v} has odd degree"
            )));
        }
        network.set_demand(i, -x / 2);
    }

    let mut flips = Vec::new();
    for (&id, &tail) in &tails {
        let Some(link) = graph.link(id) else {
            continue;
        };
        let head = link.other(tail).unwrap_or(tail);
        if head == tail {
            continue;
        }
        let (Some(ab), Some(ba), Some(&i), Some(&j)) = (
            link.cost_from(tail),
            link.cost_from(head),
            index.get(&tail),
            index.get(&head),
        ) else {
            continue;
        };
        flips.push((id, head, network.add_arc(i, j, ba - ab, Some(1))));
    }

    let flow = network.solve().map_err(|err| {
        ArcRouteError::invariant(format!("undirected links cannot balance the graph: {err}"))
    })?;
    let mut flipped = 0usize;
    for (id, head, arc) in flips {
        if flow.flow(arc) > 0 {
            tails.insert(id, head);
            flipped += 1;
        }
    }
    debug!(
        "tour.orient: undirected={} flipped={flipped} extra_cost={}",
        tails.len(),
        flow.cost()
    );
    Ok(tails)
}

/// Iterative Hierholzer from `start`. Each link id is used once even when
/// it is listed under both endpoints.
fn euler_circuit(start: VertexId, adj: &Adjacency) -> Vec<Traversal> {
    let mut next: BTreeMap<VertexId, usize> = BTreeMap::new();
    let mut used: BTreeSet<LinkId> = BTreeSet::new();
    let mut stack: Vec<(VertexId, Option<(LinkId, VertexId)>)> = vec![(start, None)];
    let mut circuit = Vec::new();

    while let Some(&(v, _)) = stack.last() {
        let links = adj.get(&v).map(Vec::as_slice).unwrap_or(&[]);
        let cursor = next.entry(v).or_insert(0);
        while *cursor < links.len() && used.contains(&links[*cursor].0) {
            *cursor += 1;
        }
        if let Some(&(link, head)) = links.get(*cursor) {
            *cursor += 1;
            used.insert(link);
            stack.push((head, Some((link, v))));
        } else if let Some((to, Some((link, from)))) = stack.pop() {
            circuit.push(Traversal { link, from, to });
        }
    }
    circuit.reverse();
    circuit
}
