//! Route computation over the road network. Raw coordinates are resolved to
//! nodes, joined leg by leg according to the selected strategy, then
//! summarised for the response.

pub mod optimal;
pub mod pathfinder;
pub mod resolver;
pub mod stitcher;
pub mod strategy;
pub mod summary;

#[cfg(test)]
pub mod test_utils;

use serde::Serialize;

/// A finished route: every node visited in travel order, plus the resolved
/// waypoint nodes it was built from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub nodes: Vec<i64>,
    pub waypoints: Vec<i64>,
}
