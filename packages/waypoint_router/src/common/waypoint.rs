//! Waypoints are the raw coordinates supplied by the caller, before they have
//! been snapped to the road network.

use geo::Point;
use serde::Serialize;
use std::str::FromStr;

use crate::common::error::{RoutingError, RoutingResult};

/// A caller-supplied latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
}

impl Waypoint {
    /// Create a new waypoint, checking that the coordinates are finite and
    /// fall within the valid range for latitudes and longitudes
    pub fn new(lat: f64, lon: f64) -> RoutingResult<Waypoint> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(RoutingError::MalformedInput(format!(
                "latitude {lat} is outside [-90, 90]"
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(RoutingError::MalformedInput(format!(
                "longitude {lon} is outside [-180, 180]"
            )));
        }
        Ok(Waypoint { lat, lon })
    }

    /// Express the waypoint as a geo Point (x = lon, y = lat)
    pub fn to_point(&self) -> Point {
        Point::new(self.lon, self.lat)
    }
}

/// Parse a single numeric component of a coordinate string
fn parse_component(raw: &str, part: &str, input: &str) -> RoutingResult<f64> {
    let trimmed = raw.trim();
    f64::from_str(trimmed).map_err(|_| {
        RoutingError::MalformedInput(format!(
            "{part} {trimmed:?} in {input:?} is not a number"
        ))
    })
}

impl FromStr for Waypoint {
    type Err = RoutingError;

    /// Parse a waypoint from a "lat,lon" string. Exactly two numeric
    /// components are required
    fn from_str(input: &str) -> Result<Waypoint, Self::Err> {
        let parts: Vec<&str> = input.split(',').collect();
        if parts.len() != 2 {
            return Err(RoutingError::MalformedInput(format!(
                "expected \"lat,lon\" but got {input:?}"
            )));
        }

        let lat = parse_component(parts[0], "latitude", input)?;
        let lon = parse_component(parts[1], "longitude", input)?;

        Waypoint::new(lat, lon)
    }
}

/// Parse every coordinate string provided by the caller. The first malformed
/// entry aborts parsing, so no graph query happens on bad input
pub fn parse_waypoints(raw: &[String]) -> RoutingResult<Vec<Waypoint>> {
    raw.iter().map(|item| Waypoint::from_str(item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Whitespace around either component should be tolerated
    #[test]
    fn test_parse_ok() {
        let result = Waypoint::from_str(" 4.65 , -74.10 ").unwrap();

        let target = Waypoint {
            lat: 4.65,
            lon: -74.10,
        };

        assert_eq!(result, target);
    }

    /// A missing longitude is malformed
    #[test]
    fn test_parse_missing_component() {
        let result = Waypoint::from_str("4.65,");

        match result {
            Err(RoutingError::MalformedInput(_)) => (),
            other => panic!("Expected MalformedInput, got {other:?}"),
        }
    }

    /// Non-numeric values are malformed
    #[test]
    fn test_parse_non_numeric() {
        let result = Waypoint::from_str("abc,def");

        match result {
            Err(RoutingError::MalformedInput(msg)) => {
                assert!(msg.contains("abc"))
            }
            other => panic!("Expected MalformedInput, got {other:?}"),
        }
    }

    /// Too many components are malformed
    #[test]
    fn test_parse_three_components() {
        let result = Waypoint::from_str("1.0,2.0,3.0");

        assert!(matches!(result, Err(RoutingError::MalformedInput(_))));
    }

    /// Latitudes beyond the poles are rejected
    #[test]
    fn test_parse_out_of_range() {
        let result = Waypoint::from_str("91.0,0.0");

        assert!(matches!(result, Err(RoutingError::MalformedInput(_))));

        let result = Waypoint::from_str("0.0,-180.5");

        assert!(matches!(result, Err(RoutingError::MalformedInput(_))));
    }

    /// NaN parses as a float but is not a usable coordinate
    #[test]
    fn test_parse_nan() {
        let result = Waypoint::from_str("NaN,1.0");

        assert!(matches!(result, Err(RoutingError::MalformedInput(_))));
    }

    /// The first bad entry is reported when parsing a list
    #[test]
    fn test_parse_waypoints_stops_at_first_error() {
        let raw = vec![
            "4.65,-74.10".to_string(),
            "oops".to_string(),
            "abc,def".to_string(),
        ];

        let result = parse_waypoints(&raw);

        match result {
            Err(RoutingError::MalformedInput(msg)) => {
                assert!(msg.contains("oops"))
            }
            other => panic!("Expected MalformedInput, got {other:?}"),
        }
    }
}
