use serde::{Deserialize, Serialize};

/// Sets the data which will be stored as node weights in the petgraph graph.
/// The id is the identifier used by the map data provider, and is the id
/// which is exposed in computed routes
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

/// Container for edge metadata which will be stored in the graph. The length
/// of the road segment is used as the routing weight
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub src: i64,
    pub dst: i64,
    pub length_m: f64,
}
