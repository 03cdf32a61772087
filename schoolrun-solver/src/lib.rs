//! Two-tier school bus optimisation.
//!
//! Tier 1 places pickup stops by greedy maximum coverage: every stop lies
//! within walking distance of the students it serves and serves at most the
//! configured number of them. Tier 2 routes those stops from the depot with
//! capacity-constrained buses, splitting stops that overflow a route into
//! virtual fragments. [`OptimizationEngine`] exposes both tiers and the
//! clustering-first combination of them as `optimize_stops`, `optimize_vrp`
//! and `optimize_full`.
//!
//! The routing tier is pluggable through [`RouteConstruction`]. The default
//! polar sweep is deterministic; enabling the `metaheuristic` feature adds a
//! `vrp-core` search that falls back to the sweep when it cannot route every
//! stop.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod clustering;
mod coverage;
mod engine;
mod pipeline;
mod routing;
#[cfg(feature = "metaheuristic")]
mod vrp;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clustering::{Cluster, ClusteringConfig, cluster_count, cluster_stops};
pub use coverage::{CoverageConfig, StopCoverageOptimizer};
pub use engine::{EngineConfig, OptimizationEngine, VrpStrategy};
pub use pipeline::{ClusteredConstruction, ClusteringRoutingPipeline, PipelineOutcome};
pub use routing::{RouteConstruction, SweepConfig, SweepConstruction};
#[cfg(feature = "metaheuristic")]
pub use vrp::{MetaheuristicConfig, MetaheuristicConstruction};
