//! The two ways of answering the same question: what is the shortest route
//! which visits every waypoint in order.

use rayon::prelude::*;
use std::str::FromStr;

use crate::common::error::{RoutingError, RoutingResult};
use crate::loading::petgraph::GraphStore;
use crate::routing::Route;
use crate::routing::optimal::{
    CandidateScope, SolveBudget, SolverSettings, path_arcs, reachable_arcs,
    solve_optimal,
};
use crate::routing::pathfinder::{LegPath, shortest_path};
use crate::routing::stitcher::{concat_legs, leg_error, stitch};

/// Selects how a route is built from its resolved waypoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStrategy {
    /// Shortest path for each leg, joined end to end
    GreedyStitch,
    /// Each leg solved as a minimum-length arc selection, with a verified
    /// optimality certificate
    ExactFlowOptimization,
}

impl FromStr for RouteStrategy {
    type Err = RoutingError;

    fn from_str(input: &str) -> Result<RouteStrategy, Self::Err> {
        match input {
            "greedy" => Ok(RouteStrategy::GreedyStitch),
            "exact" | "optimal" => Ok(RouteStrategy::ExactFlowOptimization),
            other => Err(RoutingError::MalformedInput(format!(
                "unknown strategy {other:?}, expected 'greedy' or 'exact'"
            ))),
        }
    }
}

impl RouteStrategy {
    /// Short name used in log lines and response messages
    pub fn name(&self) -> &'static str {
        match self {
            RouteStrategy::GreedyStitch => "greedy",
            RouteStrategy::ExactFlowOptimization => "exact",
        }
    }

    /// Build a route which visits every waypoint node in the order provided
    pub fn compute(
        &self,
        store: &GraphStore,
        waypoints: &[i64],
        settings: &SolverSettings,
    ) -> RoutingResult<Route> {
        match self {
            RouteStrategy::GreedyStitch => stitch(store, waypoints),
            RouteStrategy::ExactFlowOptimization => {
                optimise(store, waypoints, settings)
            }
        }
    }
}

/// Solve a single leg as an arc selection problem over the configured
/// candidate arcs
fn optimise_leg(
    store: &GraphStore,
    origin: i64,
    destination: i64,
    settings: &SolverSettings,
    budget: &SolveBudget,
) -> RoutingResult<LegPath> {
    budget.check()?;

    let candidates = match settings.scope {
        CandidateScope::Reachable => {
            reachable_arcs(store, origin, destination)?
        }
        CandidateScope::Stitched => {
            let greedy = shortest_path(store, origin, destination)?;
            path_arcs(store, &greedy.nodes)?
        }
    };

    let selection = solve_optimal(&candidates, origin, destination, budget)?;

    Ok(LegPath {
        nodes: selection.to_path()?,
        length_m: selection.objective_m,
    })
}

/// Solve every leg of the route, sharing a single time budget across all of
/// them. If more than one leg fails, the failure with the lowest leg index
/// is reported
fn optimise(
    store: &GraphStore,
    waypoints: &[i64],
    settings: &SolverSettings,
) -> RoutingResult<Route> {
    if waypoints.len() < 2 {
        return Err(RoutingError::InsufficientWaypoints(waypoints.len()));
    }

    let budget = SolveBudget::start(settings.timeout);

    let results: Vec<RoutingResult<LegPath>> = waypoints
        .par_windows(2)
        .enumerate()
        .map(|(leg, pair)| {
            optimise_leg(store, pair[0], pair[1], settings, &budget)
                .map_err(|err| leg_error(leg, err))
        })
        .collect();

    let legs = results.into_iter().collect::<RoutingResult<Vec<LegPath>>>()?;

    Ok(Route {
        nodes: concat_legs(&legs),
        waypoints: waypoints.to_vec(),
    })
}
