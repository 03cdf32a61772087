//! Clustering-first route construction and the full two-tier pipeline.

use log::{debug, info};
use schoolrun_core::{
    Interrupt, OptimizeError, PlaceNamer, RoadSnapper, RoutePlan, Sequence, Stage, Stop, StopPlan,
    Student, Tier1Result, Tier2Result,
};

use crate::{
    clustering::{ClusteringConfig, cluster_stops},
    coverage::StopCoverageOptimizer,
    routing::{RouteConstruction, SweepConstruction},
};

/// Routes each geographic cluster independently with an inner strategy.
///
/// Route ids run sequentially across clusters because every cluster draws
/// from the same sequence.
#[derive(Debug, Clone)]
pub struct ClusteredConstruction<R = SweepConstruction> {
    inner: R,
    config: ClusteringConfig,
}

impl Default for ClusteredConstruction {
    fn default() -> Self {
        Self::new(SweepConstruction::new(), ClusteringConfig::default())
    }
}

impl<R: RouteConstruction> ClusteredConstruction<R> {
    /// Wrap `inner` with clustering.
    #[must_use]
    pub const fn new(inner: R, config: ClusteringConfig) -> Self {
        Self { inner, config }
    }

    /// Route every cluster and merge the results.
    ///
    /// Returns the merged result and the number of clusters routed.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Cancelled`] when `interrupt` fires between
    /// clusters, or whatever the inner strategy reports.
    pub fn construct_clusters(
        &self,
        stops: &[Stop],
        plan: &RoutePlan,
        route_ids: &mut Sequence,
        interrupt: &dyn Interrupt,
    ) -> Result<(Tier2Result, usize), OptimizeError> {
        let clusters = cluster_stops(stops, plan.depot, plan.capacity, &self.config);
        let mut routes = Vec::new();
        let mut unrouted = Vec::new();
        for cluster in &clusters {
            if interrupt.is_interrupted() {
                return Err(OptimizeError::Cancelled {
                    stage: Stage::Clustering,
                });
            }
            let partial = self
                .inner
                .construct(&cluster.stops, plan, route_ids, interrupt)?;
            debug!(
                "cluster {} with {} stops produced {} routes",
                cluster.id,
                cluster.stops.len(),
                partial.routes.len()
            );
            routes.extend(partial.routes);
            unrouted.extend(partial.stats.unrouted);
        }
        Ok((Tier2Result::new(routes, unrouted), clusters.len()))
    }
}

impl<R: RouteConstruction> RouteConstruction for ClusteredConstruction<R> {
    fn construct(
        &self,
        stops: &[Stop],
        plan: &RoutePlan,
        route_ids: &mut Sequence,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier2Result, OptimizeError> {
        self.construct_clusters(stops, plan, route_ids, interrupt)
            .map(|(result, _)| result)
    }
}

/// Output of [`ClusteringRoutingPipeline::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Stop placement.
    pub tier1: Tier1Result,
    /// Routes over the placed stops.
    pub tier2: Tier2Result,
    /// Clusters routed independently.
    pub cluster_count: usize,
}

/// Stop placement followed by clustering-first routing.
#[derive(Debug)]
pub struct ClusteringRoutingPipeline<'a, S, P, R = SweepConstruction> {
    coverage: &'a StopCoverageOptimizer<S, P>,
    routing: ClusteredConstruction<R>,
}

impl<'a, S, P, R> ClusteringRoutingPipeline<'a, S, P, R>
where
    S: RoadSnapper,
    P: PlaceNamer,
    R: RouteConstruction,
{
    /// Compose the two tiers.
    #[must_use]
    pub const fn new(
        coverage: &'a StopCoverageOptimizer<S, P>,
        routing: ClusteredConstruction<R>,
    ) -> Self {
        Self { coverage, routing }
    }

    /// Place stops for `students`, then route them cluster by cluster.
    ///
    /// Stop and route ids start at one for each run.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::Cancelled`] when `interrupt` fires in either
    /// tier.
    pub fn run(
        &self,
        students: &[Student],
        stop_plan: &StopPlan,
        route_plan: &RoutePlan,
        interrupt: &dyn Interrupt,
    ) -> Result<PipelineOutcome, OptimizeError> {
        let tier1 = self.coverage.place_stops(
            students,
            stop_plan,
            &mut Sequence::default(),
            interrupt,
        )?;
        let (tier2, cluster_count) = self.routing.construct_clusters(
            &tier1.stops,
            route_plan,
            &mut Sequence::default(),
            interrupt,
        )?;
        info!(
            "pipeline placed {} stops and built {} routes across {cluster_count} clusters",
            tier1.stops.len(),
            tier2.routes.len()
        );
        Ok(PipelineOutcome {
            tier1,
            tier2,
            cluster_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::{fixture, rstest};
    use schoolrun_core::{
        CancelFlag, NeverInterrupt,
        invariants::{verify_routes, verify_stops},
        test_support::students_around,
    };

    const SCHOOL: Coord<f64> = Coord { x: 14.42, y: 50.08 };

    #[fixture]
    fn stop_plan() -> StopPlan {
        StopPlan {
            walk_radius_meters: 300.0,
            max_students_per_stop: 15,
            max_stops: None,
            school: SCHOOL,
            max_distance_from_school: 20_000.0,
            snap_to_roads: false,
            name_places: false,
            corridor: None,
        }
    }

    #[fixture]
    fn route_plan() -> RoutePlan {
        RoutePlan {
            depot: SCHOOL,
            capacity: 30,
            split_virtual_nodes: true,
        }
    }

    fn two_neighbourhoods() -> Vec<Student> {
        let north = Coord {
            x: SCHOOL.x,
            y: SCHOOL.y + 0.03,
        };
        let east = Coord {
            x: SCHOOL.x + 0.05,
            y: SCHOOL.y,
        };
        let mut students = students_around(north, 40, 600.0, 1);
        students.extend(students_around(east, 40, 600.0, 1_000));
        students
    }

    fn run(students: &[Student], stop_plan: &StopPlan, route_plan: &RoutePlan) -> PipelineOutcome {
        let coverage = StopCoverageOptimizer::new();
        ClusteringRoutingPipeline::new(&coverage, ClusteredConstruction::default())
            .run(students, stop_plan, route_plan, &NeverInterrupt)
            .expect("pipeline succeeds")
    }

    #[rstest]
    fn full_run_respects_invariants(stop_plan: StopPlan, route_plan: RoutePlan) {
        let students = two_neighbourhoods();
        let outcome = run(&students, &stop_plan, &route_plan);
        verify_stops(&outcome.tier1.stops, &students, &stop_plan).expect("stops hold");
        verify_routes(&outcome.tier2, &outcome.tier1.stops, &route_plan).expect("routes hold");
        assert!(outcome.cluster_count >= 2);
        assert_eq!(outcome.tier2.stats.total_students, outcome.tier1.stats.assigned_students);
    }

    #[rstest]
    fn route_ids_run_across_clusters(stop_plan: StopPlan, route_plan: RoutePlan) {
        let outcome = run(&two_neighbourhoods(), &stop_plan, &route_plan);
        let ids: Vec<u64> = outcome.tier2.routes.iter().map(|r| r.id).collect();
        let expected: Vec<u64> = (1..=ids.len() as u64).collect();
        assert_eq!(ids, expected);
    }

    #[rstest]
    fn cancellation_between_clusters(route_plan: RoutePlan) {
        let stops = vec![Stop::new(
            1,
            "Stop 1",
            Coord {
                x: SCHOOL.x,
                y: SCHOOL.y + 0.01,
            },
            vec![1],
        )];
        let flag = CancelFlag::new();
        flag.cancel();
        let outcome = ClusteredConstruction::default().construct_clusters(
            &stops,
            &route_plan,
            &mut Sequence::default(),
            &flag,
        );
        assert!(matches!(
            outcome,
            Err(OptimizeError::Cancelled {
                stage: Stage::Clustering
            })
        ));
    }

    #[rstest]
    fn clustered_and_flat_carry_the_same_students(route_plan: RoutePlan, stop_plan: StopPlan) {
        let tier1 = StopCoverageOptimizer::new()
            .place_stops(
                &two_neighbourhoods(),
                &stop_plan,
                &mut Sequence::default(),
                &NeverInterrupt,
            )
            .expect("placement succeeds");
        let flat = SweepConstruction::new()
            .construct(&tier1.stops, &route_plan, &mut Sequence::default(), &NeverInterrupt)
            .expect("flat succeeds");
        let clustered = ClusteredConstruction::default()
            .construct(&tier1.stops, &route_plan, &mut Sequence::default(), &NeverInterrupt)
            .expect("clustered succeeds");
        assert_eq!(flat.stats.total_students, clustered.stats.total_students);
    }
}
