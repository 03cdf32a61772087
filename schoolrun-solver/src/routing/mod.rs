//! Tier 2 route construction strategies.
//!
//! Every strategy turns a set of stops into capacity-respecting routes that
//! start and end at the depot. Strategies are interchangeable behind
//! [`RouteConstruction`], so the clustering pipeline composes them instead of
//! extending them.

mod sweep;
mod tour;

use schoolrun_core::{Interrupt, OptimizeError, RoutePlan, Sequence, Stop, Tier2Result};

pub use sweep::{SweepConfig, SweepConstruction};

/// Builds vehicle routes from placed stops.
pub trait RouteConstruction: Send + Sync {
    /// Route `stops` from `plan.depot` with buses of `plan.capacity`.
    ///
    /// Route ids are drawn from `route_ids` so callers merging several runs
    /// keep them sequential.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Cancelled`] when `interrupt` fires.
    fn construct(
        &self,
        stops: &[Stop],
        plan: &RoutePlan,
        route_ids: &mut Sequence,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier2Result, OptimizeError>;
}
