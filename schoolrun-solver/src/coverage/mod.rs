//! Tier 1 stop placement by greedy maximum coverage.
//!
//! Candidates are the distinct home coordinates of valid students, optionally
//! snapped to roads, then filtered by school distance and corridor. The lazy
//! greedy selector repeatedly materialises the candidate covering the most
//! uncovered students (capped at the stop size) and assigns the nearest ones.

mod candidates;
mod greedy;

use log::{debug, info, warn};
use schoolrun_core::{
    Interrupt, NoRefinement, OptimizeError, PlaceNamer, RefinementStatus, RoadSnapper, Sequence,
    Stage, Stop, StopPlan, StopStats, Student, StudentIndex, Tier1Result,
};

use self::{
    candidates::{derive_candidates, partition_students, snap_candidates, within_reach},
    greedy::GreedyCover,
};

/// Tuning for [`StopCoverageOptimizer`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageConfig {
    /// Furthest a snapped candidate may move from its source coordinate.
    /// `None` uses the walking radius of the call.
    pub max_snap_shift_meters: Option<f64>,
    /// Prefix of generated stop names, followed by the stop id.
    pub stop_name_prefix: String,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            max_snap_shift_meters: None,
            stop_name_prefix: "Stop".to_owned(),
        }
    }
}

impl CoverageConfig {
    /// Override the snapping guard distance.
    #[must_use]
    pub const fn with_max_snap_shift(mut self, meters: f64) -> Self {
        self.max_snap_shift_meters = Some(meters);
        self
    }

    /// Override the generated stop name prefix.
    #[must_use]
    pub fn with_stop_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stop_name_prefix = prefix.into();
        self
    }
}

/// Greedy maximum-coverage stop placement.
///
/// Refinement collaborators are consulted only when a call asks for them and
/// never abort placement: a failing snapper leaves raw coordinates, a failing
/// namer leaves generated names, and affected stops are flagged.
#[derive(Debug, Clone)]
pub struct StopCoverageOptimizer<S = NoRefinement, P = NoRefinement> {
    snapper: S,
    namer: P,
    config: CoverageConfig,
}

impl StopCoverageOptimizer {
    /// Optimiser without refinement collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::with_refinement(NoRefinement, NoRefinement, CoverageConfig::default())
    }
}

impl Default for StopCoverageOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P> StopCoverageOptimizer<S, P>
where
    S: RoadSnapper,
    P: PlaceNamer,
{
    /// Optimiser with explicit refinement collaborators and configuration.
    #[must_use]
    pub const fn with_refinement(snapper: S, namer: P, config: CoverageConfig) -> Self {
        Self {
            snapper,
            namer,
            config,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &CoverageConfig {
        &self.config
    }

    /// Place stops for `students` under a validated `plan`.
    ///
    /// Stop ids are drawn from `stop_ids`. An input without valid students
    /// yields an empty result with `stats.error` set rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Cancelled`] when `interrupt` fires after
    /// snapping, after the neighbourhoods are built or between greedy
    /// iterations.
    pub fn place_stops(
        &self,
        students: &[Student],
        plan: &StopPlan,
        stop_ids: &mut Sequence,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier1Result, OptimizeError> {
        let roster = partition_students(students);
        if roster.valid.is_empty() {
            info!("stop placement skipped: no students with valid coordinates");
            return Ok(Tier1Result::empty(
                "no students with valid coordinates",
                roster.invalid_ids,
            ));
        }

        let mut candidates = derive_candidates(&roster.valid);
        if plan.snap_to_roads {
            let guard = self
                .config
                .max_snap_shift_meters
                .unwrap_or(plan.walk_radius_meters);
            snap_candidates(&self.snapper, &mut candidates, guard);
            check_interrupt(interrupt)?;
        }
        candidates.retain(|candidate| within_reach(candidate, plan));
        debug!(
            "{} candidate stops for {} students",
            candidates.len(),
            roster.valid.len()
        );

        let homes: Vec<_> = roster.valid.iter().map(Student::location).collect();
        let index = StudentIndex::new(&homes);
        let neighbours: Vec<_> = candidates
            .iter()
            .map(|candidate| index.within_radius(candidate.location(), plan.walk_radius_meters))
            .collect();
        check_interrupt(interrupt)?;
        let mut cover = GreedyCover::new(
            &candidates,
            &neighbours,
            roster.valid.len(),
            plan.max_students_per_stop,
        );

        let mut stops = Vec::new();
        let mut max_walk = 0.0_f64;
        loop {
            if plan.max_stops.is_some_and(|limit| stops.len() >= limit) {
                debug!("stop limit of {} reached", stops.len());
                break;
            }
            check_interrupt(interrupt)?;
            let Some(selection) = cover.next_selection() else {
                break;
            };
            let id = stop_ids.next_id();
            let assigned = selection
                .students
                .iter()
                .filter_map(|n| roster.valid.get(n.slot).map(|student| student.id))
                .collect();
            if let Some(furthest) = selection.students.last() {
                max_walk = max_walk.max(furthest.distance);
            }
            let mut stop = Stop::new(
                id,
                self.generated_name(id),
                selection.candidate.location(),
                assigned,
            );
            stop.snap = selection.candidate.snap;
            stops.push(stop);
        }

        if plan.name_places {
            self.name_stops(&mut stops);
        }

        let mut stats = StopStats::from_stops(&stops, roster.valid.len(), max_walk);
        stats.unassigned_student_ids = cover
            .uncovered_slots()
            .filter_map(|slot| roster.valid.get(slot).map(|student| student.id))
            .collect();
        stats.invalid_student_ids = roster.invalid_ids;
        if stops.is_empty() {
            stats.error = Some(format!(
                "no stop can be placed within {} m of the school",
                plan.max_distance_from_school
            ));
        }
        info!(
            "placed {} stops covering {} of {} students",
            stats.total_stops, stats.assigned_students, stats.total_students
        );
        Ok(Tier1Result { stops, stats })
    }

    fn generated_name(&self, id: u64) -> String {
        format!("{} {id}", self.config.stop_name_prefix)
    }

    fn name_stops(&self, stops: &mut [Stop]) {
        if stops.is_empty() {
            return;
        }
        let points: Vec<_> = stops.iter().map(Stop::location).collect();
        let names = match self.namer.name_places(&points) {
            Ok(names) if names.len() == stops.len() => names,
            Ok(names) => {
                warn!(
                    "place naming returned {} names for {} stops; keeping generated names",
                    names.len(),
                    stops.len()
                );
                mark_naming_failed(stops);
                return;
            }
            Err(err) => {
                warn!("place naming failed; keeping generated names: {err}");
                mark_naming_failed(stops);
                return;
            }
        };
        for (stop, name) in stops.iter_mut().zip(names) {
            let Some(place) = name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()) else {
                stop.naming = RefinementStatus::Fallback;
                continue;
            };
            stop.name = place;
            stop.naming = RefinementStatus::Applied;
        }
    }
}

fn check_interrupt(interrupt: &dyn Interrupt) -> Result<(), OptimizeError> {
    if interrupt.is_interrupted() {
        return Err(OptimizeError::Cancelled {
            stage: Stage::StopPlacement,
        });
    }
    Ok(())
}

fn mark_naming_failed(stops: &mut [Stop]) {
    for stop in stops {
        stop.naming = RefinementStatus::Fallback;
    }
}
