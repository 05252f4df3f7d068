//! Snaps raw coordinates onto the road network.
//!
//! Node positions are stored in an R-tree using an equirectangular
//! projection centred on the mean latitude of the network, so that a degree
//! of longitude and a degree of latitude cover roughly the same ground. For
//! a network the size of a city the resulting nearest neighbour is the same
//! node a great-circle search would return.

use geo::{Distance, Haversine};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::Serialize;
use tracing::debug;

use crate::common::error::{RoutingError, RoutingResult};
use crate::common::waypoint::Waypoint;
use crate::loading::petgraph::{GraphStore, RoadGraph};

/// Entry stored in the R-tree: a projected `[x, y]` point with the id of the
/// node it belongs to
#[derive(Debug, Clone)]
struct NodeEntry {
    point: [f64; 2],
    id: i64,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Nearest-node lookup over every node in the road network. Built once when
/// the graph store is created
#[derive(Debug)]
pub struct SpatialIndex {
    tree: RTree<NodeEntry>,
    lon_scale: f64,
}

impl SpatialIndex {
    /// Bulk-load the R-tree for every node in the graph
    pub fn build(graph: &RoadGraph) -> SpatialIndex {
        let count = graph.node_count();
        let lon_scale = if count == 0 {
            1.0
        } else {
            let mean_lat =
                graph.node_weights().map(|n| n.lat).sum::<f64>() / count as f64;
            mean_lat.to_radians().cos()
        };

        let entries: Vec<NodeEntry> = graph
            .node_weights()
            .map(|node| NodeEntry {
                point: [node.lon * lon_scale, node.lat],
                id: node.id,
            })
            .collect();

        SpatialIndex {
            tree: RTree::bulk_load(entries),
            lon_scale,
        }
    }

    fn project(&self, lat: f64, lon: f64) -> [f64; 2] {
        [lon * self.lon_scale, lat]
    }

    /// Return the id of the node closest to the provided position. Where
    /// several nodes are equally close, the lowest id wins. Returns None only
    /// if the index is empty
    pub fn nearest(&self, lat: f64, lon: f64) -> Option<i64> {
        let query = self.project(lat, lon);
        let mut candidates =
            self.tree.nearest_neighbor_iter_with_distance_2(&query);

        let (first, best_dist) = candidates.next()?;
        let mut best_id = first.id;

        for (entry, dist) in candidates {
            if dist > best_dist {
                break;
            }
            best_id = best_id.min(entry.id);
        }

        Some(best_id)
    }
}

/// A waypoint which has been bound to its nearest node in the road network
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedWaypoint {
    pub waypoint: Waypoint,
    pub node_id: i64,
    pub snap_distance_m: f64,
}

/// Map a raw latitude/longitude onto the nearest node in the graph
pub fn resolve(store: &GraphStore, lat: f64, lon: f64) -> RoutingResult<i64> {
    store
        .spatial_index()
        .nearest(lat, lon)
        .ok_or(RoutingError::NoNodeFound)
}

/// Resolve every waypoint in order, recording how far each one had to move to
/// reach the road network
pub fn resolve_all(
    store: &GraphStore,
    waypoints: &[Waypoint],
) -> RoutingResult<Vec<ResolvedWaypoint>> {
    waypoints
        .iter()
        .map(|waypoint| {
            let node_id = resolve(store, waypoint.lat, waypoint.lon)?;
            let node = store.node(node_id)?;
            let snap_distance_m = Haversine::distance(
                waypoint.to_point(),
                geo::Point::new(node.lon, node.lat),
            );
            debug!(node_id, snap_distance_m, "resolved waypoint");
            Ok(ResolvedWaypoint {
                waypoint: *waypoint,
                node_id,
                snap_distance_m,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::graph_data::{EdgeData, NodeData};
    use crate::routing::test_utils::bogota_store;

    /// Points sitting on top of a node resolve to that node
    #[test]
    fn test_resolve_exact() {
        let store = bogota_store();

        let result = resolve(&store, 4.65, -74.10).unwrap();

        assert_eq!(result, 1);
    }

    /// Points near a node resolve to that node
    #[test]
    fn test_resolve_nearby() {
        let store = bogota_store();

        let result = resolve(&store, 4.701, -74.049).unwrap();

        assert_eq!(result, 3);
    }

    /// Equidistant nodes are broken by lowest id
    #[test]
    fn test_resolve_tie_lowest_id() {
        let store = GraphStore::from_parts(
            vec![
                NodeData {
                    id: 9,
                    lat: 0.0,
                    lon: 1.0,
                },
                NodeData {
                    id: 4,
                    lat: 0.0,
                    lon: -1.0,
                },
            ],
            vec![
                EdgeData {
                    src: 9,
                    dst: 4,
                    length_m: 1.0,
                },
                EdgeData {
                    src: 4,
                    dst: 9,
                    length_m: 1.0,
                },
            ],
        )
        .unwrap();

        let result = resolve(&store, 0.0, 0.0).unwrap();

        assert_eq!(result, 4);
    }

    /// An empty graph has no nodes to resolve to
    #[test]
    fn test_resolve_empty() {
        let store = GraphStore::from_parts(vec![], vec![]).unwrap();

        let result = resolve(&store, 4.65, -74.10);

        assert!(matches!(result, Err(RoutingError::NoNodeFound)));
    }

    /// Every waypoint is resolved in the order provided
    #[test]
    fn test_resolve_all_keeps_order() {
        let store = bogota_store();
        let waypoints = vec![
            Waypoint::new(4.70, -74.05).unwrap(),
            Waypoint::new(4.65, -74.10).unwrap(),
        ];

        let result = resolve_all(&store, &waypoints).unwrap();

        let ids: Vec<i64> = result.iter().map(|r| r.node_id).collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(result[1].snap_distance_m < 1.0);
    }
}
