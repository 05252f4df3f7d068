//! Shortest path search between two nodes of the road network, weighted by
//! the length of each road segment.

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::common::error::{RoutingError, RoutingResult};
use crate::loading::petgraph::GraphStore;

/// The path found for a single leg of a route
#[derive(Debug, Clone, PartialEq)]
pub struct LegPath {
    pub nodes: Vec<i64>,
    pub length_m: f64,
}

/// Entry in the Dijkstra frontier. The ordering is reversed so that the
/// max-heap pops the cheapest entry first, with ties going to the lowest
/// node id
#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    id: i64,
    inx: NodeIndex,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the shortest path from `from` to `to`. If both are the same node,
/// the path is just that node. Where two paths have the same length, the one
/// whose penultimate nodes have the lowest ids is returned, so repeated calls
/// always agree
pub fn shortest_path(
    store: &GraphStore,
    from: i64,
    to: i64,
) -> RoutingResult<LegPath> {
    let graph = store.graph();
    let src = store.index_of(from)?;
    let dst = store.index_of(to)?;

    if src == dst {
        return Ok(LegPath {
            nodes: vec![from],
            length_m: 0.0,
        });
    }

    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<NodeIndex>> = vec![None; n];
    let mut settled = vec![false; n];

    dist[src.index()] = 0.0;

    let mut heap = BinaryHeap::new();
    heap.push(State {
        cost: 0.0,
        id: from,
        inx: src,
    });

    while let Some(State { cost, inx, .. }) = heap.pop() {
        if inx == dst {
            return Ok(LegPath {
                nodes: reconstruct(store, &prev, dst),
                length_m: cost,
            });
        }

        // Skip stale heap entries
        if settled[inx.index()] || cost > dist[inx.index()] {
            continue;
        }
        settled[inx.index()] = true;

        let cur_id = graph[inx].id;
        for eref in graph.edges(inx) {
            let next = eref.target();
            let new_cost = cost + eref.weight().length_m;
            let next_dist = dist[next.index()];

            let better = new_cost < next_dist;
            // Predecessors only ever point at settled nodes, which keeps
            // the chain acyclic even across zero-length edges
            let tie_with_lower_id = new_cost == next_dist
                && !settled[next.index()]
                && prev[next.index()]
                    .is_some_and(|p| cur_id < graph[p].id);

            if better {
                dist[next.index()] = new_cost;
                prev[next.index()] = Some(inx);
                heap.push(State {
                    cost: new_cost,
                    id: graph[next].id,
                    inx: next,
                });
            } else if tie_with_lower_id {
                prev[next.index()] = Some(inx);
            }
        }
    }

    Err(RoutingError::NoPathExists { from, to })
}

/// Walk the predecessor chain back from the target, returning node ids in
/// travel order
fn reconstruct(
    store: &GraphStore,
    prev: &[Option<NodeIndex>],
    target: NodeIndex,
) -> Vec<i64> {
    let graph = store.graph();
    let mut nodes = vec![graph[target].id];
    let mut cur = target;
    while let Some(p) = prev[cur.index()] {
        nodes.push(graph[p].id);
        cur = p;
    }
    nodes.reverse();
    nodes
}
