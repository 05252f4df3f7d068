//! Composes an ordered list of resolved waypoints into a single continuous
//! route, by finding the shortest path for each leg and joining them end to
//! end.

use rayon::prelude::*;
use tracing::debug;

use crate::common::error::{RoutingError, RoutingResult};
use crate::loading::petgraph::GraphStore;
use crate::routing::Route;
use crate::routing::pathfinder::{LegPath, shortest_path};

/// Convert a pathfinding failure on a single leg into the error reported for
/// the route as a whole
pub fn leg_error(leg: usize, err: RoutingError) -> RoutingError {
    match err {
        RoutingError::NoPathExists { from, to } => {
            RoutingError::UnreachableWaypoint { leg, from, to }
        }
        RoutingError::Infeasible {
            origin,
            destination,
            ..
        } => RoutingError::Infeasible {
            leg,
            origin,
            destination,
        },
        other => other,
    }
}

/// Join leg paths end to end. The last node of every leg but the final one
/// is also the first node of the next leg, so it is dropped to avoid
/// duplicate junction nodes
pub fn concat_legs(legs: &[LegPath]) -> Vec<i64> {
    let mut nodes = Vec::<i64>::new();
    let last = legs.len().saturating_sub(1);
    for (inx, leg) in legs.iter().enumerate() {
        if inx == last {
            nodes.extend(leg.nodes.iter());
        } else {
            let keep = leg.nodes.len().saturating_sub(1);
            nodes.extend(leg.nodes[..keep].iter());
        }
    }
    nodes
}

/// Find the shortest path for every leg. Legs are independent of one
/// another, so they are computed in parallel. If more than one leg fails,
/// the failure with the lowest leg index is reported
pub fn compute_legs(
    store: &GraphStore,
    waypoints: &[i64],
) -> RoutingResult<Vec<LegPath>> {
    if waypoints.len() < 2 {
        return Err(RoutingError::InsufficientWaypoints(waypoints.len()));
    }

    let results: Vec<RoutingResult<LegPath>> = waypoints
        .par_windows(2)
        .enumerate()
        .map(|(leg, pair)| {
            shortest_path(store, pair[0], pair[1])
                .map_err(|err| leg_error(leg, err))
        })
        .collect();

    let legs = results.into_iter().collect::<RoutingResult<Vec<LegPath>>>()?;

    for (leg, path) in legs.iter().enumerate() {
        debug!(
            leg,
            nodes = path.nodes.len(),
            length_m = path.length_m,
            "leg found"
        );
    }

    Ok(legs)
}

/// Stitch together a route which visits every waypoint in the order provided
pub fn stitch(store: &GraphStore, waypoints: &[i64]) -> RoutingResult<Route> {
    let legs = compute_legs(store, waypoints)?;

    Ok(Route {
        nodes: concat_legs(&legs),
        waypoints: waypoints.to_vec(),
    })
}
