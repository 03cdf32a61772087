//! Errors surfaced by the optimisation operations.

use std::fmt;

use thiserror::Error;

use crate::{
    RouteId, StopId, StudentId, repository::StudentRepositoryError, request::ValidationErrors,
};

/// Phase of an optimisation call, reported on cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Greedy stop placement.
    StopPlacement,
    /// Route construction.
    RouteConstruction,
    /// Per-cluster routing in the clustering pipeline.
    Clustering,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StopPlacement => "stop placement",
            Self::RouteConstruction => "route construction",
            Self::Clustering => "cluster routing",
        })
    }
}

/// Error returned by `optimize_stops`, `optimize_vrp` and `optimize_full`.
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// Parameters were rejected before any computation ran.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    /// The student repository failed.
    #[error("failed to load students: {0}")]
    Repository(#[from] StudentRepositoryError),
    /// The caller interrupted the call.
    #[error("optimisation cancelled during {stage}")]
    Cancelled {
        /// Phase that observed the interrupt.
        stage: Stage,
    },
    /// A result broke a guaranteed property. This is a defect, never a
    /// consequence of caller input.
    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Broken result guarantee detected by the invariant checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    /// A student walks further than the walking radius.
    #[error("student {student_id} is {distance:.1} m from stop {stop_id}, beyond {limit} m")]
    WalkRadiusExceeded {
        /// Stop the student is assigned to.
        stop_id: StopId,
        /// Offending student.
        student_id: StudentId,
        /// Walking distance in metres.
        distance: f64,
        /// Walking radius in metres.
        limit: f64,
    },
    /// A stop serves more students than allowed.
    #[error("stop {stop_id} serves {demand} students, above {limit}")]
    StopOverCapacity {
        /// Offending stop.
        stop_id: StopId,
        /// Students assigned.
        demand: usize,
        /// Per-stop limit.
        limit: usize,
    },
    /// A stop lies too far from the school.
    #[error("stop {stop_id} is {distance:.1} m from the school, beyond {limit} m")]
    StopTooFarFromSchool {
        /// Offending stop.
        stop_id: StopId,
        /// Distance to the school in metres.
        distance: f64,
        /// Allowed distance in metres.
        limit: f64,
    },
    /// A stop lists a student absent from the snapshot.
    #[error("stop {stop_id} lists unknown student {student_id}")]
    UnknownStudent {
        /// Offending stop.
        stop_id: StopId,
        /// Unknown student.
        student_id: StudentId,
    },
    /// A student is counted twice.
    #[error("student {student_id} is assigned more than once")]
    DuplicateStudent {
        /// Repeated student.
        student_id: StudentId,
    },
    /// A route carries more than the bus capacity.
    #[error("route {route_id} carries {demand} students, above capacity {capacity}")]
    RouteOverCapacity {
        /// Offending route.
        route_id: RouteId,
        /// Students carried.
        demand: usize,
        /// Bus capacity.
        capacity: usize,
    },
    /// A route's declared totals disagree with its nodes.
    #[error("route {route_id} declares demand {declared} but its nodes carry {actual}")]
    RouteDemandMismatch {
        /// Offending route.
        route_id: RouteId,
        /// `totalDemand` as declared.
        declared: usize,
        /// Sum over the nodes.
        actual: usize,
    },
    /// A distance was negative or not finite.
    #[error("route {route_id} has invalid distance {distance}")]
    InvalidDistance {
        /// Offending route.
        route_id: RouteId,
        /// Offending value.
        distance: f64,
    },
    /// A stop was routed whole more than once, or both whole and split.
    #[error("stop {stop_id} is routed more than once")]
    StopRoutedTwice {
        /// Offending stop.
        stop_id: StopId,
    },
    /// Two fragments of one stop share a route.
    #[error("route {route_id} holds two fragments of stop {stop_id}")]
    FragmentsShareRoute {
        /// Offending route.
        route_id: RouteId,
        /// Split stop.
        stop_id: StopId,
    },
    /// Fragment demands do not add up to the parent's demand.
    #[error("fragments of stop {stop_id} carry {actual} students, expected {expected}")]
    SplitDemandMismatch {
        /// Split stop.
        stop_id: StopId,
        /// Parent demand.
        expected: usize,
        /// Sum over fragments.
        actual: usize,
    },
    /// A stop is neither routed nor reported unroutable.
    #[error("stop {stop_id} is missing from every route")]
    StopMissing {
        /// Missing stop.
        stop_id: StopId,
    },
    /// A route visits a stop that was never an input.
    #[error("route {route_id} visits unknown stop {stop_id}")]
    UnknownStop {
        /// Offending route.
        route_id: RouteId,
        /// Unknown stop.
        stop_id: StopId,
    },
}
