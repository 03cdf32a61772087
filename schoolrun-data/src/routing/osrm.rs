//! OSRM API response types for the Nearest service.
//!
//! The Nearest service snaps a coordinate to the street network and reports
//! the name of the street it landed on.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#nearest-service>

use geo::Coord;
use serde::Deserialize;

/// OSRM Nearest API response.
#[derive(Debug, Deserialize)]
pub struct NearestResponse {
    /// Status code from OSRM.
    ///
    /// Common values:
    /// - `"Ok"` - Request was successful
    /// - `"InvalidQuery"` - Invalid query parameters
    /// - `"NoSegment"` - No street within reach of the coordinate
    pub code: String,

    /// Optional error message when `code` is not `"Ok"`.
    pub message: Option<String>,

    /// Snapped waypoints, nearest first.
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

impl NearestResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "Ok"
    }

    /// Whether OSRM found nothing to snap to, which is not a service failure.
    #[must_use]
    pub fn is_no_segment(&self) -> bool {
        self.code == "NoSegment"
    }
}

/// A coordinate snapped onto the street network.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Waypoint {
    /// Street name; empty for unnamed ways.
    #[serde(default)]
    pub name: String,
    /// Snapped position as `[lng, lat]`.
    pub location: [f64; 2],
    /// Distance in metres from the input coordinate.
    #[serde(default)]
    pub distance: Option<f64>,
}

impl Waypoint {
    /// Snapped position as a `geo` coordinate.
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        let [x, y] = self.location;
        Coord { x, y }
    }

    /// Street name, if the way has one.
    #[must_use]
    pub fn street_name(&self) -> Option<&str> {
        Some(self.name.trim()).filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_success_response() {
        let json = r#"{
            "code": "Ok",
            "waypoints": [
                {"name": "Vodickova", "location": [14.4231, 50.0812], "distance": 12.4, "hint": "x"}
            ]
        }"#;

        let response: NearestResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(response.is_ok());
        let waypoint = response.waypoints.first().expect("one waypoint");
        assert_eq!(waypoint.coord(), Coord { x: 14.4231, y: 50.0812 });
        assert_eq!(waypoint.street_name(), Some("Vodickova"));
        assert_eq!(waypoint.distance, Some(12.4));
    }

    #[test]
    fn deserialise_error_response() {
        let json = r#"{
            "code": "InvalidQuery",
            "message": "Query string malformed close to position 28"
        }"#;

        let response: NearestResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(!response.is_ok());
        assert!(response.waypoints.is_empty());
        assert_eq!(
            response.message.as_deref(),
            Some("Query string malformed close to position 28")
        );
    }

    #[test]
    fn unnamed_ways_have_no_street_name() {
        let json = r#"{"code": "Ok", "waypoints": [{"name": "  ", "location": [0.0, 0.0]}]}"#;

        let response: NearestResponse = serde_json::from_str(json).expect("should deserialise");

        let waypoint = response.waypoints.first().expect("one waypoint");
        assert_eq!(waypoint.street_name(), None);
    }

    #[test]
    fn no_segment_is_recognised() {
        let json = r#"{"code": "NoSegment", "message": "Could not find a matching segment"}"#;

        let response: NearestResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(response.is_no_segment());
    }
}
