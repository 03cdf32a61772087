//! Core domain types for the schoolrun engine.
//!
//! The crate holds everything the optimisers share: students, stops, routes
//! and their results, great-circle geometry, parameter validation, the
//! collaborator traits for student loading and coordinate refinement,
//! cooperative cancellation and the post-condition checks run after each
//! tier. It performs no I/O of its own.

pub mod geometry;
pub mod invariants;

mod error;
mod interrupt;
mod location;
mod refine;
mod repository;
mod request;
mod result;
mod route;
mod sequence;
mod spatial_index;
mod stop;
mod student;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{InvariantViolation, OptimizeError, Stage};
pub use interrupt::{CancelFlag, Deadline, Interrupt, NeverInterrupt};
pub use location::LatLng;
pub use refine::{NoRefinement, PlaceNamer, RefineError, RoadSnapper};
pub use repository::{NoStudentSource, StudentRepository, StudentRepositoryError};
pub use request::{
    Corridor, CorridorParams, FieldError, MAX_BUS_CAPACITY, MAX_DISTANCE_FROM_SCHOOL_METERS,
    MAX_STUDENTS_PER_STOP, MAX_WALK_RADIUS_METERS, OptimizeFullParams, OptimizeStopsParams,
    OptimizeVrpParams, RoutePlan, StopPlan, ValidationErrors,
};
pub use result::{
    FullResult, FullSummary, RouteStats, StopStats, Tier1Result, Tier2Result, UnroutedReason,
    UnroutedStop,
};
pub use route::{Route, RouteId, RouteNode, VirtualStopFragment, tour_length};
pub use sequence::Sequence;
pub use spatial_index::{Neighbour, StudentIndex};
pub use stop::{CandidateStop, RefinementStatus, Stop, StopId, StopRecordError};
pub use student::{Student, StudentId};
