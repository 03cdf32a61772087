//! Facade crate for the schoolrun school-bus engine.
//!
//! This crate re-exports the core domain types and the optimisation engine,
//! and exposes the OSRM and JSON roster adapters behind the `osrm` feature.

#![forbid(unsafe_code)]

pub use schoolrun_core::{
    FullResult, FullSummary, LatLng, OptimizeError, OptimizeFullParams, OptimizeStopsParams,
    OptimizeVrpParams, PlaceNamer, RefineError, RoadSnapper, Route, RouteNode, Stop, Student,
    StudentRepository, Tier1Result, Tier2Result, ValidationErrors, VirtualStopFragment,
};
pub use schoolrun_solver::{EngineConfig, OptimizationEngine, VrpStrategy};

#[cfg(feature = "metaheuristic")]
pub use schoolrun_solver::{MetaheuristicConfig, MetaheuristicConstruction};

#[cfg(feature = "osrm")]
pub use schoolrun_data::{
    JsonStudentRepository,
    routing::{OsrmClientConfig, OsrmNearestClient},
};
