use petgraph::graph::NodeIndex;
use petgraph::{Directed, Graph};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, info};

use crate::common::bbox::BBox;
use crate::common::error::{LoadError, LoadResult, RoutingError, RoutingResult};
use crate::common::graph_data::{EdgeData, NodeData};
use crate::routing::resolver::SpatialIndex;

/// The road network as it is held in memory
pub type RoadGraph = Graph<NodeData, EdgeData, Directed, u32>;

/// Nodes in the graph need to have associated lat/lon data. To achieve this,
/// we create a mapping for source IDs as they appear in the map data to
/// NodeData structs. As edges are added, these can then be retrieved and added
/// to the graph. Edges must also be provided here, as we only want to add the
/// nodes which are used in one of the edges.
pub fn generate_node_map(
    nodes: Vec<NodeData>,
    edges: &[EdgeData],
) -> FxHashMap<i64, NodeData> {
    let mut node_map = FxHashMap::<i64, NodeData>::default();
    let mut used_nodes = FxHashSet::<i64>::default();

    for edge in edges {
        used_nodes.insert(edge.src);
        used_nodes.insert(edge.dst);
    }

    for node in nodes {
        if used_nodes.contains(&node.id) {
            node_map.insert(node.id, node);
        }
    }

    node_map
}

/// Based on the node and edge data which has been provided by the map data
/// provider, generate a petgraph graph which can be used for route plotting.
/// Nodes are inserted in ascending id order so that repeated loads of the
/// same data always produce the same graph. Where more than one edge joins
/// the same pair of nodes, only the shortest is kept
pub fn create_graph(
    nodes: Vec<NodeData>,
    edges: Vec<EdgeData>,
) -> LoadResult<RoadGraph> {
    // Set up empty graph
    let mut graph = RoadGraph::with_capacity(nodes.len(), edges.len());

    // Unpack node data
    let node_weights_by_id = generate_node_map(nodes, &edges);
    let mut node_ids: Vec<i64> = node_weights_by_id.keys().copied().collect();
    node_ids.sort_unstable();

    // Add all nodes to the graph, create mapping from map IDs to node indexes
    let mut node_id_inx_map = FxHashMap::<i64, NodeIndex>::default();
    for id in node_ids {
        let node_inx = graph.add_node(node_weights_by_id[&id]);
        node_id_inx_map.insert(id, node_inx);
    }

    let mut skipped: usize = 0;
    for edge in edges {
        if edge.length_m < 0.0 || edge.length_m.is_nan() {
            return Err(LoadError::NegativeLength {
                src: edge.src,
                dst: edge.dst,
                length: edge.length_m,
            });
        }

        // Fetch indexes for src and dst as they appear in the graph
        let (src_inx, dst_inx) = match (
            node_id_inx_map.get(&edge.src),
            node_id_inx_map.get(&edge.dst),
        ) {
            (Some(src_inx), Some(dst_inx)) => (*src_inx, *dst_inx),
            _ => {
                skipped += 1;
                continue;
            }
        };

        match graph.find_edge(src_inx, dst_inx) {
            Some(existing) => {
                if edge.length_m < graph[existing].length_m {
                    graph[existing] = edge;
                }
            }
            None => {
                graph.add_edge(src_inx, dst_inx, edge);
            }
        }
    }

    if skipped > 0 {
        debug!(skipped, "dropped edges referencing unknown nodes");
    }

    Ok(graph)
}

/// Holds the road network along with the lookups which are built alongside
/// it. A GraphStore is created once when the service starts, and is only
/// ever read from afterwards, so it can be shared across requests without
/// any locking
#[derive(Debug)]
pub struct GraphStore {
    graph: RoadGraph,
    index_by_id: FxHashMap<i64, NodeIndex>,
    spatial_idx: SpatialIndex,
    bbox: Option<BBox>,
}

impl GraphStore {
    /// Wrap a finished graph, building the id lookup and spatial index
    pub fn new(graph: RoadGraph) -> GraphStore {
        let index_by_id: FxHashMap<i64, NodeIndex> = graph
            .node_indices()
            .map(|inx| (graph[inx].id, inx))
            .collect();

        let spatial_idx = SpatialIndex::build(&graph);
        let bbox = BBox::from_nodes(graph.node_weights());

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph store ready"
        );

        GraphStore {
            graph,
            index_by_id,
            spatial_idx,
            bbox,
        }
    }

    /// Build a graph store directly from node and edge data
    pub fn from_parts(
        nodes: Vec<NodeData>,
        edges: Vec<EdgeData>,
    ) -> LoadResult<GraphStore> {
        Ok(GraphStore::new(create_graph(nodes, edges)?))
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial_idx
    }

    /// The smallest bounding box containing every node, None if the graph is
    /// empty
    pub fn bbox(&self) -> Option<BBox> {
        self.bbox
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Retrieve the graph index for a node id
    pub fn index_of(&self, id: i64) -> RoutingResult<NodeIndex> {
        self.index_by_id
            .get(&id)
            .copied()
            .ok_or(RoutingError::UnknownNode(id))
    }

    /// Retrieve the data for a node id
    pub fn node(&self, id: i64) -> RoutingResult<&NodeData> {
        let inx = self.index_of(id)?;
        Ok(&self.graph[inx])
    }

    /// Retrieve the directed edge joining two nodes, if there is one
    pub fn edge_between(&self, from: i64, to: i64) -> Option<&EdgeData> {
        let src = self.index_by_id.get(&from)?;
        let dst = self.index_by_id.get(&to)?;
        self.graph
            .find_edge(*src, *dst)
            .map(|edge_inx| &self.graph[edge_inx])
    }

    /// Every edge in the graph
    pub fn all_arcs(&self) -> impl Iterator<Item = &EdgeData> + '_ {
        self.graph.edge_weights()
    }
}
