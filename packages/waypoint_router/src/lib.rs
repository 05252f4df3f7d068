//! Multi-waypoint route computation over a city road network, served over
//! HTTP.

pub mod api;
pub mod common;
pub mod loading;
pub mod pipeline;
pub mod render;
pub mod routing;
