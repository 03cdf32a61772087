//! `vrp-core` backed route construction.
//!
//! Stops are pre-split into bus-sized pieces, modelled as delivery jobs on a
//! haversine distance matrix and handed to the `vrp-core` metaheuristic with a
//! capacity feature. Search results depend on the solver's random seed, so
//! unlike the sweep this strategy is not reproducible run to run. Any
//! modelling or solver failure falls back to the sweep.

use std::sync::Arc;

use geo::Coord;
use log::{debug, warn};
use schoolrun_core::{
    Interrupt, OptimizeError, Route, RouteNode, RoutePlan, Sequence, Stage, Stop, Tier2Result,
    UnroutedReason, UnroutedStop, VirtualStopFragment, geometry::distance_meters,
};
use vrp_core::prelude::*;

use crate::routing::{RouteConstruction, SweepConstruction};

/// Tuning for [`MetaheuristicConstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaheuristicConfig {
    /// Upper bound on `vrp-core` generations.
    pub max_generations: usize,
}

impl Default for MetaheuristicConfig {
    fn default() -> Self {
        Self {
            max_generations: 50,
        }
    }
}

/// Capacitated VRP solved by `vrp-core`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaheuristicConstruction {
    config: MetaheuristicConfig,
    fallback: SweepConstruction,
}

impl MetaheuristicConstruction {
    /// Construction with explicit configuration.
    #[must_use]
    pub fn with_config(config: MetaheuristicConfig) -> Self {
        Self {
            config,
            fallback: SweepConstruction::new(),
        }
    }
}

impl RouteConstruction for MetaheuristicConstruction {
    fn construct(
        &self,
        stops: &[Stop],
        plan: &RoutePlan,
        route_ids: &mut Sequence,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier2Result, OptimizeError> {
        if interrupt.is_interrupted() {
            return Err(OptimizeError::Cancelled {
                stage: Stage::RouteConstruction,
            });
        }
        let (pieces, unrouted) = split_into_pieces(stops, plan);
        if pieces.is_empty() {
            return Ok(Tier2Result::new(Vec::new(), unrouted));
        }

        let tours = match solve(&pieces, plan, &self.config) {
            Ok(tours) if covers_every_piece(&tours, pieces.len()) => tours,
            Ok(_) => {
                warn!("vrp-core left pieces unassigned; falling back to sweep");
                return self.fallback.construct(stops, plan, route_ids, interrupt);
            }
            Err(err) => {
                warn!("vrp-core routing failed; falling back to sweep: {err}");
                return self.fallback.construct(stops, plan, route_ids, interrupt);
            }
        };

        let routes = tours
            .into_iter()
            .filter(|tour| !tour.is_empty())
            .map(|tour| {
                let visits = tour
                    .into_iter()
                    .filter_map(|index| pieces.get(index).cloned())
                    .collect();
                Route::new(route_ids.next_id(), plan.depot, visits)
            })
            .collect();
        Ok(Tier2Result::new(routes, unrouted))
    }
}

/// Cut stops into nodes no larger than one bus.
///
/// Oversized stops become fragments of `capacity` students when splitting is
/// enabled and are reported unrouted otherwise.
fn split_into_pieces(stops: &[Stop], plan: &RoutePlan) -> (Vec<RouteNode>, Vec<UnroutedStop>) {
    let mut pieces = Vec::with_capacity(stops.len());
    let mut unrouted = Vec::new();
    for stop in stops {
        let demand = stop.demand();
        if demand <= plan.capacity {
            pieces.push(RouteNode::Stop(stop.clone()));
        } else if plan.split_virtual_nodes {
            pieces.extend(
                stop.assigned_student_ids
                    .chunks(plan.capacity.max(1))
                    .enumerate()
                    .map(|(fragment_index, students)| {
                        RouteNode::Fragment(VirtualStopFragment {
                            parent_stop_id: stop.id,
                            fragment_index,
                            lat: stop.lat,
                            lng: stop.lng,
                            student_ids: students.to_vec(),
                        })
                    }),
            );
        } else {
            warn!(
                "stop {} needs {demand} seats but buses carry {}; leaving it unrouted",
                stop.id, plan.capacity
            );
            unrouted.push(UnroutedStop {
                stop_id: stop.id,
                demand,
                reason: UnroutedReason::DemandExceedsCapacity,
            });
        }
    }
    (pieces, unrouted)
}

fn covers_every_piece(tours: &[Vec<usize>], count: usize) -> bool {
    let mut seen = vec![false; count];
    for index in tours.iter().flatten() {
        match seen.get_mut(*index) {
            Some(flag) if !*flag => *flag = true,
            _ => return false,
        }
    }
    seen.into_iter().all(|flag| flag)
}

/// Square distance matrix over the depot (location 0) and every piece.
fn distance_matrix(depot: Coord<f64>, pieces: &[RouteNode]) -> Vec<f64> {
    let locations: Vec<Coord<f64>> = std::iter::once(depot)
        .chain(pieces.iter().map(RouteNode::location))
        .collect();
    locations
        .iter()
        .flat_map(|from| locations.iter().map(move |to| distance_meters(*from, *to)))
        .collect()
}

fn define_goal(transport: Arc<dyn TransportCost>) -> GenericResult<GoalContext> {
    let minimize_unassigned = MinimizeUnassignedBuilder::new("min-unassigned").build()?;
    let capacity = CapacityFeatureBuilder::<SingleDimLoad>::new("capacity").build()?;
    let transport_feature = TransportFeatureBuilder::new("min-distance")
        .set_transport_cost(transport)
        .set_time_constrained(false)
        .build_minimize_distance()?;
    GoalContextBuilder::with_features(&[minimize_unassigned, transport_feature, capacity])?.build()
}

fn define_problem(
    pieces: &[RouteNode],
    capacity: usize,
    goal: GoalContext,
    transport: Arc<dyn TransportCost>,
) -> GenericResult<Problem> {
    let bus_capacity = i32::try_from(capacity).map_err(|_| "capacity exceeds i32")?;
    let jobs = pieces
        .iter()
        .enumerate()
        .map(|(index, piece)| {
            let demand = i32::try_from(piece.demand()).map_err(|_| "demand exceeds i32")?;
            SingleBuilder::default()
                .id(format!("piece{index}").as_str())
                .demand(Demand::delivery(demand))
                .location(index + 1)?
                .build_as_job()
        })
        .collect::<Result<Vec<_>, _>>()?;

    // One bus per piece is always enough.
    let vehicles = (0..pieces.len())
        .map(|index| {
            VehicleBuilder::default()
                .id(format!("bus{index}").as_str())
                .add_detail(
                    VehicleDetailBuilder::default()
                        .set_start_location(0)
                        .set_end_location(0)
                        .build()?,
                )
                .capacity(SingleDimLoad::new(bus_capacity))
                .build()
        })
        .collect::<Result<Vec<_>, _>>()?;

    ProblemBuilder::default()
        .add_jobs(jobs.into_iter())
        .add_vehicles(vehicles.into_iter())
        .with_goal(goal)
        .with_transport_cost(transport)
        .build()
}

/// Piece indices per tour, in visiting order.
fn solve(
    pieces: &[RouteNode],
    plan: &RoutePlan,
    config: &MetaheuristicConfig,
) -> GenericResult<Vec<Vec<usize>>> {
    let matrix = distance_matrix(plan.depot, pieces);
    let transport: Arc<dyn TransportCost> =
        Arc::new(SimpleTransportCost::new(matrix.clone(), matrix)?);
    let goal = define_goal(transport.clone())?;
    let problem = Arc::new(define_problem(pieces, plan.capacity, goal, transport)?);

    let vrp_config = VrpConfigBuilder::new(problem.clone())
        .prebuild()?
        .with_max_generations(Some(config.max_generations))
        .build()?;
    let solution = vrp_core::solver::Solver::new(problem, vrp_config).solve()?;
    debug!(
        "vrp-core found {} tours with {} unassigned jobs",
        solution.routes.len(),
        solution.unassigned.len()
    );
    if !solution.unassigned.is_empty() {
        return Err("solution left jobs unassigned".into());
    }

    Ok(solution
        .get_locations()
        .map(|tour| {
            tour.filter(|location| *location != 0)
                .map(|location| location - 1)
                .collect()
        })
        .collect())
}
