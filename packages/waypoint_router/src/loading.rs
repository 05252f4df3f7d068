//! This module focuses on retrieving the road network from the map data
//! provider and using it to generate the petgraph graph object which is
//! shared by every request.

pub mod file;
pub mod petgraph;
pub mod postgres;

use crate::common::config::{GraphSource, ServiceConfig};
use crate::common::error::{LoadError, LoadResult};
use crate::loading::petgraph::GraphStore;

/// Read the road network from whichever source has been configured and
/// build the graph store from it. This is expected to be called exactly once
/// per process
pub async fn load_graph_store(config: &ServiceConfig) -> LoadResult<GraphStore> {
    let (nodes, edges) = match &config.graph_source {
        GraphSource::Postgres { url } => {
            postgres::load_network(url, &config.region).await?
        }
        GraphSource::File { path } => file::load_network(path)?,
    };

    let store = GraphStore::from_parts(nodes, edges)?;
    if store.is_empty() {
        return Err(LoadError::EmptyNetwork);
    }

    Ok(store)
}
