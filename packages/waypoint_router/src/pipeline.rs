//! The single request pipeline shared by every route endpoint. Waypoints are
//! parsed, resolved, joined by the requested strategy and summarised, with
//! only the requested outputs included in the response.

use serde::Serialize;
use std::time::Instant;
use tracing::info;

use crate::common::config::{RouteOptions, ServiceConfig};
use crate::common::error::{RoutingError, RoutingResult};
use crate::common::waypoint::parse_waypoints;
use crate::loading::petgraph::GraphStore;
use crate::render::render_base64;
use crate::routing::optimal::SolverSettings;
use crate::routing::resolver::resolve_all;
use crate::routing::summary::summarize;

/// Response body for a successfully computed route. Outputs which were not
/// requested are left out of the JSON entirely
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<(f64, f64)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_distance_km: Option<f64>,
}

/// Convert metres to kilometres, rounded to 2 decimal places
pub fn to_rounded_km(length_m: f64) -> f64 {
    (length_m / 10.0).round() / 100.0
}

/// Run the full pipeline for a single request. Coordinate strings are
/// validated before the graph is touched
pub fn compute_route(
    store: &GraphStore,
    config: &ServiceConfig,
    raw: &[String],
    options: &RouteOptions,
) -> RoutingResult<RouteResponse> {
    let now = Instant::now();

    let waypoints = parse_waypoints(raw)?;
    if waypoints.len() < 2 {
        return Err(RoutingError::InsufficientWaypoints(waypoints.len()));
    }

    let resolved = resolve_all(store, &waypoints)?;
    let nodes: Vec<i64> = resolved.iter().map(|r| r.node_id).collect();

    let settings = SolverSettings {
        timeout: config.solver_timeout,
        scope: config.optimal_scope,
    };
    let route = options.strategy.compute(store, &nodes, &settings)?;
    let summary = summarize(store, &route, &config.link_base)?;

    let outputs = options.outputs;
    let image_base64 = if outputs.image {
        Some(render_base64(
            store,
            &summary.coordinates,
            options.strategy,
            config.image_width,
            config.image_height,
        )?)
    } else {
        None
    };

    info!(
        strategy = options.strategy.name(),
        waypoints = nodes.len(),
        nodes = route.nodes.len(),
        length_m = summary.total_length_m,
        elapsed = ?now.elapsed(),
        "route computed"
    );

    Ok(RouteResponse {
        message: format!(
            "Route computed through {} waypoints",
            waypoints.len()
        ),
        image_base64,
        coordinates: outputs.coordinates.then_some(summary.coordinates),
        link: outputs.link.then_some(summary.link),
        total_distance_km: outputs
            .distance
            .then(|| to_rounded_km(summary.total_length_m)),
    })
}
