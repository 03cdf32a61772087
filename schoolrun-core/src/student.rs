//! Students are the immutable input snapshot of every optimisation call.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geometry::{CoordinateError, validate_coordinate};

/// Identifier assigned to a student by the upstream roster.
pub type StudentId = u64;

/// A student and the home coordinate used for stop placement.
///
/// # Examples
/// ```
/// use schoolrun_core::Student;
///
/// let student = Student::new(7, 50.08, 14.42).with_address("Na Prikope 1");
/// assert!(student.validate().is_ok());
/// assert_eq!(student.address.as_deref(), Some("Na Prikope 1"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Roster identifier.
    pub id: StudentId,
    /// Home latitude in degrees.
    pub lat: f64,
    /// Home longitude in degrees.
    pub lng: f64,
    /// Optional free-form home address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Student {
    /// Construct a student without an address.
    #[must_use]
    pub const fn new(id: StudentId, lat: f64, lng: f64) -> Self {
        Self {
            id,
            lat,
            lng,
            address: None,
        }
    }

    /// Attach a home address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Home location as a `geo` coordinate (`x = lng`, `y = lat`).
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }

    /// Check that the home coordinate lies inside the WGS84 ranges.
    pub fn validate(&self) -> Result<Coord<f64>, CoordinateError> {
        validate_coordinate(self.location())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialises_without_address() {
        let student: Student =
            serde_json::from_str(r#"{"id": 3, "lat": 50.1, "lng": 14.4}"#).expect("valid json");
        assert_eq!(student, Student::new(3, 50.1, 14.4));
    }

    #[rstest]
    #[case(91.0, 0.0)]
    #[case(0.0, 181.0)]
    #[case(f64::NAN, 0.0)]
    fn rejects_invalid_home(#[case] lat: f64, #[case] lng: f64) {
        assert!(Student::new(1, lat, lng).validate().is_err());
    }
}
