//! Error types for each stage of the service. Request-level failures are all
//! represented by RoutingError, which is reported back to the caller as a
//! client error. Failures while loading the road network or reading the
//! process configuration only happen at start-up.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while computing a route for a single request
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("no node found, the road network is empty")]
    NoNodeFound,

    #[error("node {0} is not part of the road network")]
    UnknownNode(i64),

    #[error("no path exists from node {from} to node {to}")]
    NoPathExists { from: i64, to: i64 },

    #[error("waypoint leg {leg} is unreachable (node {from} to node {to})")]
    UnreachableWaypoint { leg: usize, from: i64, to: i64 },

    #[error("at least 2 waypoints are required, received {0}")]
    InsufficientWaypoints(usize),

    #[error(
        "no arc selection connects node {origin} to node {destination} (leg {leg})"
    )]
    Infeasible {
        leg: usize,
        origin: i64,
        destination: i64,
    },

    #[error("optimal route solver did not finish within {0:?}")]
    SolverTimeout(Duration),

    #[error("no edge data between consecutive route nodes {from} and {to}")]
    NoEdgeData { from: i64, to: i64 },

    #[error("unable to render route image: {0}")]
    Render(#[from] RenderError),
}

impl RoutingError {
    /// Internal errors indicate a bug in the service rather than a problem
    /// with the request, and should be surfaced to operators
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            RoutingError::NoEdgeData { .. }
                | RoutingError::UnknownNode(_)
                | RoutingError::Render(_)
        )
    }
}

pub type RoutingResult<T> = Result<T, RoutingError>;

/// Errors produced while loading the road network from the map data provider
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse road network file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("edge {src} -> {dst} has negative length {length}")]
    NegativeLength { src: i64, dst: i64, length: f64 },

    #[error("the map data provider returned an empty road network")]
    EmptyNetwork,
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Errors produced while reading the process configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors produced while drawing a route image
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),

    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
}
