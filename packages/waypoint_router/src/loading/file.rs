//! Reads the road network from a JSON document instead of postgres. This is
//! mostly useful for local development, where a small extract of the road
//! network can be kept alongside the code.
//!
//! ```json
//! {
//!     "nodes": [{"id": 1, "lat": 4.65, "lon": -74.10}],
//!     "edges": [{"src": 1, "dst": 2, "length_m": 500.0}]
//! }
//! ```
//!
//! Where `length_m` is omitted, the great-circle distance between the two
//! nodes is used instead.

use geo::{Distance, Haversine, Point};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::common::error::LoadResult;
use crate::common::graph_data::{EdgeData, NodeData};

#[derive(Deserialize, Debug)]
struct FileEdge {
    src: i64,
    dst: i64,
    length_m: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct FileNetwork {
    nodes: Vec<NodeData>,
    edges: Vec<FileEdge>,
}

/// Fill in the length of any edge which was provided without one. Edges
/// which refer to unknown nodes are left at zero length, they will be
/// dropped when the graph is created
fn resolve_lengths(network: FileNetwork) -> (Vec<NodeData>, Vec<EdgeData>) {
    let positions: FxHashMap<i64, Point> = network
        .nodes
        .iter()
        .map(|node| (node.id, Point::new(node.lon, node.lat)))
        .collect();

    let edges = network
        .edges
        .into_iter()
        .map(|edge| {
            let length_m = match edge.length_m {
                Some(length) => length,
                None => match (positions.get(&edge.src), positions.get(&edge.dst)) {
                    (Some(src), Some(dst)) => Haversine::distance(*src, *dst),
                    _ => 0.0,
                },
            };
            EdgeData {
                src: edge.src,
                dst: edge.dst,
                length_m,
            }
        })
        .collect();

    (network.nodes, edges)
}

/// Parse a road network from a JSON string
pub fn parse_network(raw: &str) -> LoadResult<(Vec<NodeData>, Vec<EdgeData>)> {
    let network: FileNetwork = serde_json::from_str(raw)?;
    Ok(resolve_lengths(network))
}

/// Read the road network from the JSON file at the provided path
pub fn load_network(
    path: &Path,
) -> LoadResult<(Vec<NodeData>, Vec<EdgeData>)> {
    let raw = std::fs::read_to_string(path)?;
    let (nodes, edges) = parse_network(&raw)?;
    info!(
        path = %path.display(),
        nodes = nodes.len(),
        edges = edges.len(),
        "read road network from file"
    );
    Ok((nodes, edges))
}
