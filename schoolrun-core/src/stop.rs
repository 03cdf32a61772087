//! Candidate and materialised bus stops.

use std::collections::HashSet;

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::student::StudentId;

/// Identifier assigned to a stop by the stop sequence of a call.
pub type StopId = u64;

/// A potential stop location considered by stop placement.
///
/// Candidates are derived from student home coordinates, optionally snapped
/// to the road network. `key` is the index of the first valid student that
/// produced the coordinate and doubles as the deterministic tie-break.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateStop {
    /// Stable candidate key.
    pub key: usize,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Outcome of road snapping for this candidate.
    pub snap: RefinementStatus,
}

impl CandidateStop {
    /// Candidate at `location` with no refinement applied.
    #[must_use]
    pub const fn new(key: usize, location: Coord<f64>) -> Self {
        Self {
            key,
            lat: location.y,
            lng: location.x,
            snap: RefinementStatus::NotRequested,
        }
    }

    /// Location as a `geo` coordinate.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// Result of an optional refinement step (road snapping or place naming).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RefinementStatus {
    /// Refinement was not requested.
    #[default]
    NotRequested,
    /// Refinement succeeded and its result is in use.
    Applied,
    /// Refinement failed or was rejected; raw data is in use.
    Fallback,
}

impl RefinementStatus {
    /// Whether refinement was requested but could not be applied.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// A placed stop and the students assigned to it.
///
/// Demand is always the number of assigned students; it is derived, never
/// stored, so it cannot drift from the assignment.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::Stop;
///
/// let stop = Stop::new(1, "Stop 1", Coord { x: 14.42, y: 50.08 }, vec![4, 9]);
/// assert_eq!(stop.demand(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StopRecord", try_from = "StopRecord")]
pub struct Stop {
    /// Stop identifier, unique within one result.
    pub id: StopId,
    /// Display name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Students boarding here, nearest first.
    pub assigned_student_ids: Vec<StudentId>,
    /// Road snapping outcome.
    pub snap: RefinementStatus,
    /// Place naming outcome.
    pub naming: RefinementStatus,
}

impl Stop {
    /// Construct an unrefined stop.
    #[must_use]
    pub fn new(
        id: StopId,
        name: impl Into<String>,
        location: Coord<f64>,
        assigned_student_ids: Vec<StudentId>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            lat: location.y,
            lng: location.x,
            assigned_student_ids,
            snap: RefinementStatus::NotRequested,
            naming: RefinementStatus::NotRequested,
        }
    }

    /// Number of students boarding at this stop.
    #[must_use]
    pub const fn demand(&self) -> usize {
        self.assigned_student_ids.len()
    }

    /// Location as a `geo` coordinate.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// Errors raised when a serialised stop is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StopRecordError {
    /// The declared demand disagrees with the assignment list.
    #[error("stop {id} declares demand {declared} but lists {actual} students")]
    DemandMismatch {
        /// Stop identifier.
        id: StopId,
        /// Demand found in the record.
        declared: usize,
        /// Length of `assignedStudentIds`.
        actual: usize,
    },
    /// A student appears twice in one stop.
    #[error("stop {id} lists student {student_id} more than once")]
    DuplicateStudent {
        /// Stop identifier.
        id: StopId,
        /// Repeated student.
        student_id: StudentId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StopRecord {
    id: StopId,
    name: String,
    lat: f64,
    lng: f64,
    assigned_student_ids: Vec<StudentId>,
    #[serde(default)]
    demand: Option<usize>,
    #[serde(default)]
    snap_status: RefinementStatus,
    #[serde(default)]
    name_status: RefinementStatus,
}

impl From<Stop> for StopRecord {
    fn from(stop: Stop) -> Self {
        Self {
            demand: Some(stop.demand()),
            id: stop.id,
            name: stop.name,
            lat: stop.lat,
            lng: stop.lng,
            assigned_student_ids: stop.assigned_student_ids,
            snap_status: stop.snap,
            name_status: stop.naming,
        }
    }
}

impl TryFrom<StopRecord> for Stop {
    type Error = StopRecordError;

    fn try_from(record: StopRecord) -> Result<Self, Self::Error> {
        let actual = record.assigned_student_ids.len();
        if let Some(declared) = record.demand
            && declared != actual
        {
            return Err(StopRecordError::DemandMismatch {
                id: record.id,
                declared,
                actual,
            });
        }
        let mut seen = HashSet::with_capacity(actual);
        if let Some(student_id) = record
            .assigned_student_ids
            .iter()
            .find(|id| !seen.insert(**id))
        {
            return Err(StopRecordError::DuplicateStudent {
                id: record.id,
                student_id: *student_id,
            });
        }
        Ok(Self {
            id: record.id,
            name: record.name,
            lat: record.lat,
            lng: record.lng,
            assigned_student_ids: record.assigned_student_ids,
            snap: record.snap_status,
            naming: record.name_status,
        })
    }
}
