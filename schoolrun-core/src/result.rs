//! Results and statistics returned by the optimisation operations.

use serde::{Deserialize, Serialize};

use crate::{Route, Stop, StopId, StudentId};

/// Statistics describing a stop placement run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopStats {
    /// Stops placed.
    pub total_stops: usize,
    /// Students with valid coordinates.
    pub total_students: usize,
    /// Students assigned to a stop.
    pub assigned_students: usize,
    /// Mean students per stop, zero without stops.
    pub average_students_per_stop: f64,
    /// Longest student-to-stop walk in metres.
    pub max_walk_distance: f64,
    /// Valid students left without a stop.
    #[serde(default)]
    pub unassigned_student_ids: Vec<StudentId>,
    /// Students rejected for out-of-range coordinates.
    #[serde(default)]
    pub invalid_student_ids: Vec<StudentId>,
    /// Stops whose snapping or naming fell back to raw data.
    #[serde(default)]
    pub refinement_failures: usize,
    /// Why no stops could be placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StopStats {
    /// Derive counts and averages from placed stops.
    ///
    /// Lists of unassigned and invalid students start empty; callers fill
    /// them in.
    #[must_use]
    pub fn from_stops(stops: &[Stop], total_students: usize, max_walk_distance: f64) -> Self {
        let assigned_students = stops.iter().map(Stop::demand).sum();
        let refinement_failures = stops
            .iter()
            .filter(|stop| stop.snap.is_fallback() || stop.naming.is_fallback())
            .count();
        Self {
            total_stops: stops.len(),
            total_students,
            assigned_students,
            average_students_per_stop: ratio(assigned_students, stops.len()),
            max_walk_distance,
            unassigned_student_ids: Vec::new(),
            invalid_student_ids: Vec::new(),
            refinement_failures,
            error: None,
        }
    }
}

/// Output of stop placement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier1Result {
    /// Placed stops in selection order.
    pub stops: Vec<Stop>,
    /// Run statistics.
    pub stats: StopStats,
}

impl Tier1Result {
    /// Zero-stop result explaining why nothing was placed.
    #[must_use]
    pub fn empty(error: impl Into<String>, invalid_student_ids: Vec<StudentId>) -> Self {
        Self {
            stops: Vec::new(),
            stats: StopStats {
                invalid_student_ids,
                error: Some(error.into()),
                ..StopStats::default()
            },
        }
    }
}

/// Why a stop could not be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnroutedReason {
    /// Demand exceeds bus capacity and splitting is disabled.
    DemandExceedsCapacity,
}

/// A stop left out of every route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnroutedStop {
    /// Stop identifier.
    pub stop_id: StopId,
    /// Students at the stop.
    pub demand: usize,
    /// Cause.
    pub reason: UnroutedReason,
}

/// Statistics describing a route construction run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    /// Routes built.
    pub total_routes: usize,
    /// Stop and fragment visits across all routes.
    pub total_stops: usize,
    /// Students carried across all routes.
    pub total_students: usize,
    /// Sum of route distances in metres.
    pub total_distance: f64,
    /// Mean visits per route, zero without routes.
    pub average_stops_per_route: f64,
    /// Mean students per route, zero without routes.
    pub average_students_per_route: f64,
    /// Stops that could not be routed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unrouted: Vec<UnroutedStop>,
}

impl RouteStats {
    /// Derive statistics from finished routes.
    ///
    /// Averages are recomputed from the totals, so concatenating routes from
    /// several clusters and calling this again yields correctly weighted
    /// values.
    #[must_use]
    pub fn from_routes(routes: &[Route], unrouted: Vec<UnroutedStop>) -> Self {
        let total_routes = routes.len();
        let total_stops = routes.iter().map(|route| route.stop_count).sum();
        let total_students = routes.iter().map(|route| route.total_demand).sum();
        let total_distance = routes.iter().map(|route| route.estimated_distance).sum();
        Self {
            total_routes,
            total_stops,
            total_students,
            total_distance,
            average_stops_per_route: ratio(total_stops, total_routes),
            average_students_per_route: ratio(total_students, total_routes),
            unrouted,
        }
    }
}

/// Output of route construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier2Result {
    /// Routes with sequential identifiers.
    pub routes: Vec<Route>,
    /// Run statistics.
    pub stats: RouteStats,
}

impl Tier2Result {
    /// Wrap routes and compute their statistics.
    #[must_use]
    pub fn new(routes: Vec<Route>, unrouted: Vec<UnroutedStop>) -> Self {
        let stats = RouteStats::from_routes(&routes, unrouted);
        Self { routes, stats }
    }
}

/// Headline figures of a full run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullSummary {
    /// Geographic clusters routed independently.
    pub cluster_count: usize,
    /// Students with valid coordinates.
    pub total_students: usize,
    /// Students assigned to a stop.
    pub assigned_students: usize,
    /// Valid students without a stop.
    pub unassigned_students: usize,
    /// Students carried on a route.
    pub routed_students: usize,
    /// Stops placed.
    pub total_stops: usize,
    /// Routes built.
    pub total_routes: usize,
    /// Sum of route distances in metres.
    pub total_distance: f64,
    /// Stops left out of every route.
    pub unrouted_stops: usize,
}

impl FullSummary {
    /// Summarise both tiers.
    #[must_use]
    pub fn new(cluster_count: usize, tier1: &Tier1Result, tier2: &Tier2Result) -> Self {
        Self {
            cluster_count,
            total_students: tier1.stats.total_students,
            assigned_students: tier1.stats.assigned_students,
            unassigned_students: tier1.stats.unassigned_student_ids.len(),
            routed_students: tier2.stats.total_students,
            total_stops: tier1.stats.total_stops,
            total_routes: tier2.stats.total_routes,
            total_distance: tier2.stats.total_distance,
            unrouted_stops: tier2.stats.unrouted.len(),
        }
    }
}

/// Output of `optimize_full`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResult {
    /// Stop placement result.
    pub tier1: Tier1Result,
    /// Routing result.
    pub tier2: Tier2Result,
    /// Combined figures.
    pub summary: FullSummary,
}

#[expect(
    clippy::cast_precision_loss,
    reason = "counts stay far below 2^52"
)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
