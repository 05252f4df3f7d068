//! Defines a struct to represent a bounding box, which is used to represent
//! a 2d square(ish) on the planet's surface. This is used to set the region
//! which is read in from postgres, and also as the viewport when rendering a
//! completed route

use serde::Serialize;
use std::str::FromStr;

use crate::common::graph_data::NodeData;

/// A bounding box for geographical data. Contains the minimum and maximum
/// latitudes & longitudes, defining a 'rectangle' on the surface of the Earth
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BBox {
    /// Determine the smallest bounding box which contains every node in the
    /// provided iterator. Returns None if there are no nodes
    pub fn from_nodes<'a>(
        nodes: impl IntoIterator<Item = &'a NodeData>,
    ) -> Option<Self> {
        let mut bbox: Option<BBox> = None;
        for node in nodes {
            bbox = Some(match bbox {
                None => BBox {
                    min_lat: node.lat,
                    min_lon: node.lon,
                    max_lat: node.lat,
                    max_lon: node.lon,
                },
                Some(cur) => BBox {
                    min_lat: cur.min_lat.min(node.lat),
                    min_lon: cur.min_lon.min(node.lon),
                    max_lat: cur.max_lat.max(node.lat),
                    max_lon: cur.max_lon.max(node.lon),
                },
            });
        }
        bbox
    }

    /// Convert a latitude & longitude into a partition string, which can be
    /// used when querying data from postgres. This mirrors the logic used
    /// to assign partitions in the ingestion layer
    fn get_ptn_from_coords(lat: &f64, lon: &f64) -> String {
        let lat_i = *lat as i32;
        let lon_i = *lon as i32;
        let ptn = format!("'{:.0}_{:.0}'", lat_i, lon_i);
        ptn.replace("-", "n")
    }

    /// Get a list of all of the partitions which contain data for this
    /// bounding box. One partition covers one degree of latitude and
    /// longitude, so a city-sized region spans at most 4 partitions.
    /// Partitions are returned wrapped in single quotes, as they are used
    /// directly in SQL queries
    pub fn get_partition_list(&self) -> Vec<String> {
        let ne_ptn = BBox::get_ptn_from_coords(&self.max_lat, &self.max_lon);
        let nw_ptn = BBox::get_ptn_from_coords(&self.max_lat, &self.min_lon);
        let se_ptn = BBox::get_ptn_from_coords(&self.min_lat, &self.max_lon);
        let sw_ptn = BBox::get_ptn_from_coords(&self.min_lat, &self.min_lon);

        let mut ptn_list = vec![ne_ptn, nw_ptn, se_ptn, sw_ptn];
        ptn_list.sort();
        ptn_list.dedup();
        ptn_list
    }
}

impl FromStr for BBox {
    type Err = String;

    /// Parse a bounding box from a "min_lon,min_lat,max_lon,max_lat" string,
    /// the same ordering used by most web mapping tools
    fn from_str(input: &str) -> Result<BBox, Self::Err> {
        let vals: Vec<f64> = input
            .split(',')
            .map(|item| item.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|err| err.to_string())?;

        if vals.len() != 4 {
            return Err(format!("expected 4 values, got {}", vals.len()));
        }

        let bbox = BBox {
            min_lon: vals[0],
            min_lat: vals[1],
            max_lon: vals[2],
            max_lat: vals[3],
        };

        if bbox.min_lat > bbox.max_lat || bbox.min_lon > bbox.max_lon {
            return Err("minimum exceeds maximum".to_string());
        }

        Ok(bbox)
    }
}
