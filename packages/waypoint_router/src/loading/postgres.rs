//! The functions defined here can be used to read in details of all of the
//! nodes and edges required to represent the road network of the configured
//! region. This is done once, when the service starts
use aho_corasick::AhoCorasick;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::common::bbox::BBox;
use crate::common::error::LoadResult;
use crate::common::graph_data::{EdgeData, NodeData};

/// Container for the raw output of the nodes SQL query
#[derive(sqlx::FromRow, Debug, Clone, Copy)]
pub struct NodeRow {
    pub id: i64,
    lat: f64,
    lon: f64,
}

impl From<NodeRow> for NodeData {
    fn from(row: NodeRow) -> NodeData {
        NodeData {
            id: row.id,
            lat: row.lat,
            lon: row.lon,
        }
    }
}

/// Container for the raw output of the edges SQL query
#[derive(sqlx::FromRow, Debug, Clone, Copy)]
pub struct EdgeRow {
    pub src: i64,
    pub dst: i64,
    length_m: f64,
}

impl From<EdgeRow> for EdgeData {
    /// Unpack the raw edge data into a format which can be loaded into the
    /// graph
    fn from(row: EdgeRow) -> EdgeData {
        EdgeData {
            src: row.src,
            dst: row.dst,
            length_m: row.length_m,
        }
    }
}

/// Substitute the bounding box of the region into one of the query templates,
/// all placeholders are replaced in a single pass
fn fill_template(template: &str, bbox: &BBox) -> String {
    let ptn_str = bbox.get_partition_list().join(", ");

    let patterns = [
        "< ptn_str >",
        "< min_lat >",
        "< min_lon >",
        "< max_lat >",
        "< max_lon >",
    ];
    let replace_with = [
        ptn_str,
        bbox.min_lat.to_string(),
        bbox.min_lon.to_string(),
        bbox.max_lat.to_string(),
        bbox.max_lon.to_string(),
    ];

    // Patterns are fixed literals, so building the automaton cannot fail
    match AhoCorasick::new(patterns) {
        Ok(ac) => ac.replace_all(template, &replace_with),
        Err(err) => unreachable!("invalid query placeholders: {err}"),
    }
}

/// Generate a SQL query to read in the nodes for the configured region
pub fn generate_nodes_query(bbox: &BBox) -> String {
    // This brings the query into the compiled code
    let nodes_base = include_str!("get_nodes.sql");
    fill_template(nodes_base, bbox)
}

/// Generate a SQL query to read in the drivable edges for the configured
/// region. Only edges with both ends inside the region are returned
pub fn generate_edges_query(bbox: &BBox) -> String {
    let edges_base = include_str!("get_edges.sql");
    fill_template(edges_base, bbox)
}

/// Executes the nodes SQL query and returns a vector of NodeRow
pub async fn load_nodes(pool: &PgPool, bbox: &BBox) -> LoadResult<Vec<NodeRow>> {
    let query = generate_nodes_query(bbox);
    let rows: Vec<NodeRow> = sqlx::query_as(&query).fetch_all(pool).await?;
    Ok(rows)
}

/// Executes the edges SQL query and returns a vector of EdgeRow
pub async fn load_edges(pool: &PgPool, bbox: &BBox) -> LoadResult<Vec<EdgeRow>> {
    let query = generate_edges_query(bbox);
    let rows: Vec<EdgeRow> = sqlx::query_as(&query).fetch_all(pool).await?;
    Ok(rows)
}

/// Connect to the map data provider and read in the full road network for
/// the configured region
pub async fn load_network(
    url: &str,
    bbox: &BBox,
) -> LoadResult<(Vec<NodeData>, Vec<EdgeData>)> {
    let pool = PgPoolOptions::new().max_connections(2).connect(url).await?;

    let nodes = load_nodes(&pool, bbox).await?;
    let edges = load_edges(&pool, bbox).await?;
    info!(
        nodes = nodes.len(),
        edges = edges.len(),
        "read road network from postgres"
    );

    pool.close().await;

    Ok((
        nodes.into_iter().map(NodeData::from).collect(),
        edges.into_iter().map(EdgeData::from).collect(),
    ))
}
