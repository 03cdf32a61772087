//! Boundary coordinate type.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geometry::{CoordinateError, validate_coordinate};

/// Latitude/longitude pair in WGS84 degrees as exchanged with callers.
///
/// Internally the engine works with `geo::Coord<f64>` (`x = lng`, `y = lat`);
/// the conversions below keep the axis order in one place.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::LatLng;
///
/// let school = LatLng::new(50.08, 14.42);
/// assert_eq!(school.to_coord(), Coord { x: 14.42, y: 50.08 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Construct a coordinate pair without validation.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Convert into a `geo` coordinate.
    #[must_use]
    pub const fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }

    /// Validate the pair and return it as a `geo` coordinate.
    pub fn validate(self) -> Result<Coord<f64>, CoordinateError> {
        validate_coordinate(self.to_coord())
    }
}

impl From<Coord<f64>> for LatLng {
    fn from(coord: Coord<f64>) -> Self {
        Self {
            lat: coord.y,
            lng: coord.x,
        }
    }
}

impl From<LatLng> for Coord<f64> {
    fn from(value: LatLng) -> Self {
        value.to_coord()
    }
}
