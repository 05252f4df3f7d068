//! Derives the caller-facing description of a finished route.

use serde::Serialize;
use tracing::error;

use crate::common::error::{RoutingError, RoutingResult};
use crate::loading::petgraph::GraphStore;
use crate::routing::Route;

/// Coordinates, length and map link for a finished route
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    /// (lat, lon) for every node in travel order
    pub coordinates: Vec<(f64, f64)>,
    pub total_length_m: f64,
    pub link: String,
}

/// Build a routable link by appending each "lat,lon" pair to the base URL,
/// separated by '/'
pub fn build_link(link_base: &str, coordinates: &[(f64, f64)]) -> String {
    let stops = coordinates
        .iter()
        .map(|(lat, lon)| format!("{lat},{lon}"))
        .collect::<Vec<String>>()
        .join("/");
    format!("{link_base}{stops}")
}

/// Sum the length of every edge travelled along the route. A consecutive
/// pair with no edge between them means the route was stitched incorrectly
pub fn route_length(store: &GraphStore, nodes: &[i64]) -> RoutingResult<f64> {
    nodes.windows(2).try_fold(0.0, |total, pair| {
        match store.edge_between(pair[0], pair[1]) {
            Some(edge) => Ok(total + edge.length_m),
            None => {
                error!(
                    from = pair[0],
                    to = pair[1],
                    "route contains consecutive nodes with no edge"
                );
                Err(RoutingError::NoEdgeData {
                    from: pair[0],
                    to: pair[1],
                })
            }
        }
    })
}

/// Produce the coordinate list, total length and map link for a route
pub fn summarize(
    store: &GraphStore,
    route: &Route,
    link_base: &str,
) -> RoutingResult<RouteSummary> {
    let coordinates = route
        .nodes
        .iter()
        .map(|id| store.node(*id).map(|node| (node.lat, node.lon)))
        .collect::<RoutingResult<Vec<(f64, f64)>>>()?;

    let total_length_m = route_length(store, &route.nodes)?;
    let link = build_link(link_base, &coordinates);

    Ok(RouteSummary {
        coordinates,
        total_length_m,
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_utils::bogota_store;
    use approx::assert_relative_eq;

    const BASE: &str = "https://www.google.com/maps/dir/";

    fn route(nodes: Vec<i64>) -> Route {
        let waypoints = match (nodes.first(), nodes.last()) {
            (Some(first), Some(last)) => vec![*first, *last],
            _ => vec![],
        };
        Route { nodes, waypoints }
    }

    /// Edge lengths are summed along the route
    #[test]
    fn test_summarize() {
        let store = bogota_store();

        let result = summarize(&store, &route(vec![1, 2, 3]), BASE).unwrap();

        assert_relative_eq!(result.total_length_m, 1200.0);
        assert_eq!(
            result.coordinates,
            vec![(4.65, -74.10), (4.675, -74.075), (4.70, -74.05)]
        );
    }

    /// The link lists every stop in travel order
    #[test]
    fn test_build_link() {
        let result = build_link(BASE, &[(4.65, -74.1), (4.7, -74.05)]);

        assert_eq!(
            result,
            "https://www.google.com/maps/dir/4.65,-74.1/4.7,-74.05"
        );
    }

    /// A single node route has no length
    #[test]
    fn test_summarize_single_node() {
        let store = bogota_store();

        let result = summarize(&store, &route(vec![2]), BASE).unwrap();

        assert_eq!(result.total_length_m, 0.0);
        assert_eq!(result.coordinates.len(), 1);
    }

    /// Consecutive nodes with no edge between them are an internal error
    #[test]
    fn test_summarize_missing_edge() {
        let store = bogota_store();

        let result = summarize(&store, &route(vec![1, 3]), BASE);

        match result {
            Err(err @ RoutingError::NoEdgeData { from: 1, to: 3 }) => {
                assert!(err.is_internal());
            }
            other => panic!("Expected NoEdgeData, got {other:?}"),
        }
    }

    /// One-way edges can't be summed in the wrong direction
    #[test]
    fn test_summarize_one_way() {
        let store = bogota_store();

        let result = summarize(&store, &route(vec![4, 2]), BASE);

        assert!(matches!(
            result,
            Err(RoutingError::NoEdgeData { from: 4, to: 2 })
        ));
    }
}
