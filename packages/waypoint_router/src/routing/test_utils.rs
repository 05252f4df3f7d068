//! Hand-built road networks shared by the routing tests.

use crate::common::graph_data::{EdgeData, NodeData};
use crate::loading::petgraph::GraphStore;

fn node(id: i64, lat: f64, lon: f64) -> NodeData {
    NodeData { id, lat, lon }
}

fn edge(src: i64, dst: i64, length_m: f64) -> EdgeData {
    EdgeData { src, dst, length_m }
}

/// A small network laid out over Bogotá.
///
/// ```text
///  1 ──500── 2 ──700── 3        5 ──50── 6
///  │         │         │
///  └───650── 4 ──700───┘
///            ▲
///            └ 2 -> 4 one-way, 100
/// ```
///
/// All edges are two-way unless noted. The shortest path from 1 to 3 is
/// 1 -> 2 -> 3 (1200m); nodes 5 and 6 are disconnected from the rest.
pub fn bogota_store() -> GraphStore {
    let nodes = vec![
        node(1, 4.65, -74.10),
        node(2, 4.675, -74.075),
        node(3, 4.70, -74.05),
        node(4, 4.66, -74.06),
        node(5, 4.80, -74.20),
        node(6, 4.81, -74.21),
    ];

    let mut edges = Vec::new();
    for (a, b, length) in [
        (1, 2, 500.0),
        (2, 3, 700.0),
        (1, 4, 650.0),
        (4, 3, 700.0),
        (5, 6, 50.0),
    ] {
        edges.push(edge(a, b, length));
        edges.push(edge(b, a, length));
    }
    edges.push(edge(2, 4, 100.0));

    GraphStore::from_parts(nodes, edges).expect("test network is valid")
}

/// Two equal-length routes from 1 to 4: 1 -> 2 -> 4 and 1 -> 3 -> 4, each
/// 20m long. Used to check tie-breaking is deterministic
pub fn diamond_store() -> GraphStore {
    let nodes = vec![
        node(1, 0.0, 0.0),
        node(2, 0.001, 0.001),
        node(3, -0.001, 0.001),
        node(4, 0.0, 0.002),
    ];
    let edges = vec![
        edge(1, 3, 10.0),
        edge(1, 2, 10.0),
        edge(3, 4, 10.0),
        edge(2, 4, 10.0),
    ];

    GraphStore::from_parts(nodes, edges).expect("test network is valid")
}
