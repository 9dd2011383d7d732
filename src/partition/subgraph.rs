//! Link-induced subgraphs rooted at the depot.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::distance::{active_vertices, reachable, Direction, ShortestPaths};
use crate::error::{ArcRouteError, Phase, Result};
use crate::models::{Cost, Graph, LinkId, Variant, VertexId};

/// Reduces a rural postman instance to the graph a tour has to walk.
///
/// Keeps the required links of `graph` and the depot, then joins the
/// pieces this leaves with shortest paths of the full graph, nearest piece
/// first. Connector links keep their ids and are non-required. A graph
/// whose links are all required comes back with the same links.
///
/// # Errors
///
/// [`Phase::ShortestPath`] infeasibility if two pieces have no path
/// between them (in the direction `variant` needs).
///
/// # Examples
///
/// ```
/// use u_arcroute::models::{Graph, Link, Variant};
/// use u_arcroute::partition::required_subgraph;
///
/// let mut g = Graph::with_vertices(4).with_depot(1);
/// g.add_edge(1, 2, 1).unwrap();
/// g.add_link(Link::edge(2, 2, 3, 4).with_required(false)).unwrap();
/// g.add_link(Link::edge(3, 1, 4, 9).with_required(false)).unwrap();
/// g.add_edge(3, 4, 1).unwrap();
///
/// let working = required_subgraph(&g, Variant::Undirected).unwrap();
/// assert_eq!(working.link_ids(), vec![1, 2, 4]);
/// assert!(!working.link(2).unwrap().is_required());
/// ```
pub fn required_subgraph(graph: &Graph, variant: Variant) -> Result<Graph> {
    let ids: Vec<LinkId> = graph
        .links()
        .filter(|l| l.is_required())
        .map(|l| l.id())
        .collect();
    let paths = ShortestPaths::compute(graph);
    let sub = induce(graph, &ids, &paths, variant, Phase::ShortestPath)?;
    debug!(
        "partition.required: links={} connectors={}",
        ids.len(),
        sub.num_links() - ids.len()
    );
    Ok(sub)
}

/// Builds one routable subgraph per non-empty part, in part order.
///
/// Each subgraph keeps the original link and vertex ids, contains the
/// depot, and holds the links assigned to its part. Parts that are not
/// connected to the depot (strongly, if `variant` needs it) are repaired by
/// adding shortest paths of the full graph between the depot and the
/// stranded vertices; those connector links are non-required copies.
///
/// # Errors
///
/// A precondition error without a depot, [`ArcRouteError::UnknownLink`]
/// for an assignment naming a missing link, and [`Phase::Partition`]
/// infeasibility if the full graph has no connecting path.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use u_arcroute::models::{Graph, Variant};
/// use u_arcroute::partition::part_subgraphs;
///
/// // Depot 1 only touches link 1; link 2 needs it as a connector.
/// let mut g = Graph::with_vertices(3).with_depot(1);
/// g.add_edge(1, 2, 5).unwrap();
/// g.add_edge(2, 3, 1).unwrap();
///
/// let assignment = BTreeMap::from([(1, 0), (2, 1)]);
/// let parts = part_subgraphs(&g, &assignment, Variant::Undirected).unwrap();
/// assert_eq!(parts.len(), 2);
/// let (index, second) = &parts[1];
/// assert_eq!(*index, 1);
/// assert_eq!(second.link_ids(), vec![1, 2]);
/// assert!(!second.link(1).unwrap().is_required());
/// ```
pub fn part_subgraphs(
    graph: &Graph,
    assignment: &BTreeMap<LinkId, usize>,
    variant: Variant,
) -> Result<Vec<(usize, Graph)>> {
    if graph.depot().is_none() {
        return Err(ArcRouteError::precondition(
            "capacitated routing needs a depot",
        ));
    }

    let mut members: BTreeMap<usize, Vec<LinkId>> = BTreeMap::new();
    for (&id, &part) in assignment {
        members.entry(part).or_default().push(id);
    }

    let paths = ShortestPaths::compute(graph);
    let mut subgraphs = Vec::with_capacity(members.len());
    for (part, ids) in members {
        let sub = induce(graph, &ids, &paths, variant, Phase::Partition)?;
        debug!(
            "partition.subgraph: part={part} links={} connectors={}",
            ids.len(),
            sub.num_links() - ids.len()
        );
        subgraphs.push((part, sub));
    }
    Ok(subgraphs)
}

/// Copies `ids` and the depot out of `graph`, then connects the result.
fn induce(
    graph: &Graph,
    ids: &[LinkId],
    paths: &ShortestPaths,
    variant: Variant,
    phase: Phase,
) -> Result<Graph> {
    let mut sub = Graph::new();
    if let Some(depot) = graph.depot() {
        sub = sub.with_depot(depot);
        copy_vertex(&mut sub, graph, depot)?;
    }
    for &id in ids {
        let link = graph.link(id).ok_or(ArcRouteError::UnknownLink(id))?;
        copy_vertex(&mut sub, graph, link.from())?;
        copy_vertex(&mut sub, graph, link.to())?;
        sub.add_link(link.clone())?;
    }
    connect(&mut sub, graph, paths, variant.needs_strong_connectivity(), phase)?;
    Ok(sub)
}

/// Adds full-graph paths until every vertex of `sub` is reachable from the
/// root (the depot, else the smallest linked vertex) and, if `strong`, can
/// reach it back. Each round joins the closest pair across the cut.
fn connect(
    sub: &mut Graph,
    graph: &Graph,
    paths: &ShortestPaths,
    strong: bool,
    phase: Phase,
) -> Result<()> {
    let outward = if strong {
        Direction::Forward
    } else {
        Direction::Either
    };
    loop {
        let active = active_vertices(sub);
        let Some(root) = sub.depot().or_else(|| active.first().copied()) else {
            return Ok(());
        };

        let from_root = reachable(sub, root, outward);
        if let Some((u, v)) = closest(paths, &active, &from_root, false, root, phase)? {
            add_path(sub, graph, paths, u, v, phase)?;
            continue;
        }
        if strong {
            let to_root = reachable(sub, root, Direction::Backward);
            if let Some((v, u)) = closest(paths, &active, &to_root, true, root, phase)? {
                add_path(sub, graph, paths, v, u, phase)?;
                continue;
            }
        }
        return Ok(());
    }
}

/// Cheapest pair between `inside` and the rest of `active`: inside to
/// outside, or outside to inside when `inbound`. Ties keep the pair found
/// first in ascending vertex order. `None` when nothing is outside.
fn closest(
    paths: &ShortestPaths,
    active: &BTreeSet<VertexId>,
    inside: &BTreeSet<VertexId>,
    inbound: bool,
    root: VertexId,
    phase: Phase,
) -> Result<Option<(VertexId, VertexId)>> {
    let Some(&stranded) = active.iter().find(|v| !inside.contains(v)) else {
        return Ok(None);
    };
    let mut best: Option<(Cost, VertexId, VertexId)> = None;
    for &u in inside {
        for &v in active.iter().filter(|v| !inside.contains(v)) {
            let (a, b) = if inbound { (v, u) } else { (u, v) };
            if let Some(d) = paths.distance(a, b) {
                if best.map_or(true, |(cost, _, _)| d < cost) {
                    best = Some((d, a, b));
                }
            }
        }
    }
    match best {
        Some((_, a, b)) => Ok(Some((a, b))),
        None => {
            let (a, b) = if inbound { (stranded, root) } else { (root, stranded) };
            Err(ArcRouteError::infeasible(
                phase,
                format!("no path from {a} to {b}"),
            ))
        }
    }
}

fn add_path(
    sub: &mut Graph,
    graph: &Graph,
    paths: &ShortestPaths,
    u: VertexId,
    v: VertexId,
    phase: Phase,
) -> Result<()> {
    let hops = paths.path(u, v).ok_or_else(|| {
        ArcRouteError::infeasible(phase, format!("no path from {u} to {v}"))
    })?;
    for hop in hops {
        if sub.contains_link(hop.link) {
            continue;
        }
        let link = graph
            .link(hop.link)
            .ok_or(ArcRouteError::UnknownLink(hop.link))?;
        copy_vertex(sub, graph, hop.from)?;
        copy_vertex(sub, graph, hop.to)?;
        sub.add_link(link.clone().with_required(false))?;
    }
    Ok(())
}

fn copy_vertex(sub: &mut Graph, graph: &Graph, id: VertexId) -> Result<()> {
    if !sub.contains_vertex(id) {
        let vertex = graph.vertex(id).ok_or(ArcRouteError::UnknownVertex(id))?;
        sub.add_vertex(vertex.clone());
    }
    Ok(())
}
