//! Adapters connecting the school-bus engine to the outside world.
//!
//! Responsibilities:
//! - Implement the collaborator traits from `schoolrun-core`.
//! - Refine stops through an OSRM routing service ([`routing`]).
//! - Load student rosters from JSON files ([`JsonStudentRepository`]).
//!
//! Boundaries:
//! - Do not encode optimisation rules (live in `schoolrun-solver`).
//! - Expose synchronous traits; keep async HTTP behind the adapter.
//!
//! Invariants:
//! - Adapters are `Send + Sync` and hold no global mutable state.
//! - Failures are returned as typed errors for the engine to degrade on.

pub mod routing;
mod students;

pub use students::JsonStudentRepository;
