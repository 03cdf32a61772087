//! Boundary operations: `optimize_stops`, `optimize_vrp` and `optimize_full`.
//!
//! Each operation validates its parameters before any computation, runs on a
//! call-local snapshot and re-checks the result guarantees before returning.
//! Nothing is shared between calls, so one engine serves concurrent callers.

use std::borrow::Cow;

use log::{info, warn};
use schoolrun_core::{
    FullResult, FullSummary, Interrupt, InvariantViolation, NeverInterrupt, NoRefinement,
    NoStudentSource, OptimizeError, OptimizeFullParams, OptimizeStopsParams, OptimizeVrpParams,
    PlaceNamer, RoadSnapper, RoutePlan, Sequence, Stop, StopPlan, Student, StudentRepository, Tier1Result,
    Tier2Result,
    invariants::{verify_routes, verify_stops},
};

#[cfg(feature = "metaheuristic")]
use crate::vrp::{MetaheuristicConfig, MetaheuristicConstruction};
use crate::{
    clustering::ClusteringConfig,
    coverage::{CoverageConfig, StopCoverageOptimizer},
    pipeline::{ClusteredConstruction, ClusteringRoutingPipeline, PipelineOutcome},
    routing::{RouteConstruction, SweepConfig, SweepConstruction},
};

/// Route construction used by `optimize_vrp`.
///
/// `optimize_full` always clusters first; the strategy then picks the
/// per-cluster construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VrpStrategy {
    /// Polar sweep over all stops.
    #[default]
    Sweep,
    /// Sweep within geographic clusters.
    Clustered,
    /// `vrp-core` metaheuristic search.
    #[cfg(feature = "metaheuristic")]
    Metaheuristic,
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Stop placement tuning.
    pub coverage: CoverageConfig,
    /// Sweep tuning.
    pub sweep: SweepConfig,
    /// Clustering tuning.
    pub clustering: ClusteringConfig,
    /// Construction used by `optimize_vrp`.
    pub vrp_strategy: VrpStrategy,
    /// Re-check result guarantees before returning.
    pub verify_invariants: bool,
    /// Metaheuristic tuning.
    #[cfg(feature = "metaheuristic")]
    pub metaheuristic: MetaheuristicConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coverage: CoverageConfig::default(),
            sweep: SweepConfig::default(),
            clustering: ClusteringConfig::default(),
            vrp_strategy: VrpStrategy::default(),
            verify_invariants: true,
            #[cfg(feature = "metaheuristic")]
            metaheuristic: MetaheuristicConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Select the `optimize_vrp` strategy.
    #[must_use]
    pub const fn with_vrp_strategy(mut self, strategy: VrpStrategy) -> Self {
        self.vrp_strategy = strategy;
        self
    }

    /// Replace the stop placement tuning.
    #[must_use]
    pub fn with_coverage(mut self, coverage: CoverageConfig) -> Self {
        self.coverage = coverage;
        self
    }

    /// Replace the sweep tuning.
    #[must_use]
    pub const fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    /// Replace the clustering tuning.
    #[must_use]
    pub const fn with_clustering(mut self, clustering: ClusteringConfig) -> Self {
        self.clustering = clustering;
        self
    }

    /// Toggle the post-condition checks.
    #[must_use]
    pub const fn with_invariant_checks(mut self, enabled: bool) -> Self {
        self.verify_invariants = enabled;
        self
    }
}

/// Entry point for the three optimisation operations.
///
/// # Examples
/// ```
/// use schoolrun_core::{LatLng, OptimizeStopsParams, Student};
/// use schoolrun_solver::OptimizationEngine;
///
/// let engine = OptimizationEngine::default();
/// let students = vec![
///     Student::new(1, 50.0800, 14.4200),
///     Student::new(2, 50.0805, 14.4203),
/// ];
/// let params = OptimizeStopsParams::new(500.0, 25, LatLng::new(50.08, 14.42), 10_000.0)
///     .with_students(students);
/// let result = engine.optimize_stops(&params).expect("stops placed");
/// assert_eq!(result.stats.total_stops, 1);
/// ```
#[derive(Debug)]
pub struct OptimizationEngine<R = NoStudentSource, S = NoRefinement, P = NoRefinement> {
    repository: R,
    coverage: StopCoverageOptimizer<S, P>,
    config: EngineConfig,
}

impl Default for OptimizationEngine {
    fn default() -> Self {
        Self::new(NoStudentSource)
    }
}

impl<R: StudentRepository> OptimizationEngine<R> {
    /// Engine loading students from `repository`, without refinement.
    #[must_use]
    pub fn new(repository: R) -> Self {
        Self::with_refinement(repository, NoRefinement, NoRefinement, EngineConfig::default())
    }
}

impl<R, S, P> OptimizationEngine<R, S, P>
where
    R: StudentRepository,
    S: RoadSnapper,
    P: PlaceNamer,
{
    /// Engine with refinement collaborators and explicit configuration.
    #[must_use]
    pub fn with_refinement(repository: R, snapper: S, namer: P, config: EngineConfig) -> Self {
        let coverage =
            StopCoverageOptimizer::with_refinement(snapper, namer, config.coverage.clone());
        Self {
            repository,
            coverage,
            config,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Place stops for the students in `params`, or the repository's.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Validation`] for out-of-range parameters,
    /// [`OptimizeError::Repository`] when students cannot be loaded and
    /// [`OptimizeError::Invariant`] if the result breaks a guarantee.
    pub fn optimize_stops(&self, params: &OptimizeStopsParams) -> Result<Tier1Result, OptimizeError> {
        self.optimize_stops_with(params, &NeverInterrupt)
    }

    /// [`Self::optimize_stops`] with cooperative cancellation.
    ///
    /// # Errors
    ///
    /// As [`Self::optimize_stops`], plus [`OptimizeError::Cancelled`].
    pub fn optimize_stops_with(
        &self,
        params: &OptimizeStopsParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier1Result, OptimizeError> {
        let plan = params.validate()?;
        let students = self.students(params)?;
        let tier1 =
            self.coverage
                .place_stops(&students, &plan, &mut Sequence::default(), interrupt)?;
        self.check(|| verify_stops(&tier1.stops, &students, &plan))?;
        Ok(tier1)
    }

    /// Route the stops in `params`.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Validation`] for out-of-range parameters or
    /// malformed stops and [`OptimizeError::Invariant`] if the result breaks
    /// a guarantee.
    pub fn optimize_vrp(&self, params: &OptimizeVrpParams) -> Result<Tier2Result, OptimizeError> {
        self.optimize_vrp_with(params, &NeverInterrupt)
    }

    /// [`Self::optimize_vrp`] with cooperative cancellation.
    ///
    /// # Errors
    ///
    /// As [`Self::optimize_vrp`], plus [`OptimizeError::Cancelled`].
    pub fn optimize_vrp_with(
        &self,
        params: &OptimizeVrpParams,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier2Result, OptimizeError> {
        let plan = params.validate()?;
        let tier2 = self.route(&params.stops, &plan, interrupt)?;
        self.check(|| verify_routes(&tier2, &params.stops, &plan))?;
        Ok(tier2)
    }

    /// Place stops, cluster them and route each cluster.
    ///
    /// # Errors
    ///
    /// As [`Self::optimize_stops`] and [`Self::optimize_vrp`].
    pub fn optimize_full(&self, params: &OptimizeFullParams) -> Result<FullResult, OptimizeError> {
        self.optimize_full_with(params, &NeverInterrupt)
    }

    /// [`Self::optimize_full`] with cooperative cancellation.
    ///
    /// # Errors
    ///
    /// As [`Self::optimize_full`], plus [`OptimizeError::Cancelled`].
    pub fn optimize_full_with(
        &self,
        params: &OptimizeFullParams,
        interrupt: &dyn Interrupt,
    ) -> Result<FullResult, OptimizeError> {
        let (stop_plan, route_plan) = params.validate()?;
        let students = self.students(&params.stops)?;
        let PipelineOutcome {
            tier1,
            tier2,
            cluster_count,
        } = self.run_pipeline(&students, &stop_plan, &route_plan, interrupt)?;
        self.check(|| verify_stops(&tier1.stops, &students, &stop_plan))?;
        self.check(|| verify_routes(&tier2, &tier1.stops, &route_plan))?;

        let summary = FullSummary::new(cluster_count, &tier1, &tier2);
        info!(
            "full optimisation: {} stops, {} routes, {} of {} students routed",
            summary.total_stops, summary.total_routes, summary.routed_students, summary.total_students
        );
        Ok(FullResult {
            tier1,
            tier2,
            summary,
        })
    }

    fn students<'a>(
        &self,
        params: &'a OptimizeStopsParams,
    ) -> Result<Cow<'a, [Student]>, OptimizeError> {
        if let Some(inline) = &params.students {
            return Ok(Cow::Borrowed(inline.as_slice()));
        }
        Ok(Cow::Owned(self.repository.load_students()?))
    }

    fn check<F>(&self, verify: F) -> Result<(), OptimizeError>
    where
        F: FnOnce() -> Result<(), InvariantViolation>,
    {
        if !self.config.verify_invariants {
            return Ok(());
        }
        verify().map_err(|violation| {
            warn!("result failed its post-condition checks: {violation}");
            OptimizeError::from(violation)
        })
    }

    const fn sweep(&self) -> SweepConstruction {
        SweepConstruction::with_config(self.config.sweep)
    }

    fn route(
        &self,
        stops: &[Stop],
        plan: &RoutePlan,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier2Result, OptimizeError> {
        let mut route_ids = Sequence::default();
        match self.config.vrp_strategy {
            VrpStrategy::Sweep => self.sweep().construct(stops, plan, &mut route_ids, interrupt),
            VrpStrategy::Clustered => ClusteredConstruction::new(self.sweep(), self.config.clustering)
                .construct(stops, plan, &mut route_ids, interrupt),
            #[cfg(feature = "metaheuristic")]
            VrpStrategy::Metaheuristic => {
                MetaheuristicConstruction::with_config(self.config.metaheuristic)
                    .construct(stops, plan, &mut route_ids, interrupt)
            }
        }
    }

    fn run_pipeline(
        &self,
        students: &[Student],
        stop_plan: &StopPlan,
        route_plan: &RoutePlan,
        interrupt: &dyn Interrupt,
    ) -> Result<PipelineOutcome, OptimizeError> {
        match self.config.vrp_strategy {
            VrpStrategy::Sweep | VrpStrategy::Clustered => ClusteringRoutingPipeline::new(
                &self.coverage,
                ClusteredConstruction::new(self.sweep(), self.config.clustering),
            )
            .run(students, stop_plan, route_plan, interrupt),
            #[cfg(feature = "metaheuristic")]
            VrpStrategy::Metaheuristic => ClusteringRoutingPipeline::new(
                &self.coverage,
                ClusteredConstruction::new(
                    MetaheuristicConstruction::with_config(self.config.metaheuristic),
                    self.config.clustering,
                ),
            )
            .run(students, stop_plan, route_plan, interrupt),
        }
    }
}

#[cfg(feature = "metaheuristic")]
impl EngineConfig {
    /// Replace the metaheuristic tuning.
    #[must_use]
    pub const fn with_metaheuristic(mut self, metaheuristic: MetaheuristicConfig) -> Self {
        self.metaheuristic = metaheuristic;
        self
    }
}
