//! Types which are shared across every stage of the service.

pub mod bbox;
pub mod config;
pub mod error;
pub mod graph_data;
pub mod waypoint;
