//! Sweep construction with virtual-node splitting.
//!
//! Stops are scanned by bearing from the depot and packed into routes until
//! the next stop would overflow the bus. An overflowing stop either seeds the
//! next route or, with splitting enabled, fills the remaining seats and
//! carries its remainder forward as further fragments.

use geo::Coord;
use log::{debug, info, warn};
use schoolrun_core::{
    Interrupt, OptimizeError, Route, RouteNode, RoutePlan, Sequence, Stage, Stop, StudentId,
    Tier2Result, UnroutedReason, UnroutedStop, VirtualStopFragment,
    geometry::{bearing_degrees, distance_meters},
};

use super::{RouteConstruction, tour::nearest_neighbour_order};

/// Tuning for [`SweepConstruction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Reorder each route by nearest neighbour from the depot. When off,
    /// visits keep sweep order.
    pub nearest_neighbour_tours: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            nearest_neighbour_tours: true,
        }
    }
}

impl SweepConfig {
    /// Toggle nearest-neighbour tour ordering.
    #[must_use]
    pub const fn with_nearest_neighbour_tours(mut self, enabled: bool) -> Self {
        self.nearest_neighbour_tours = enabled;
        self
    }
}

/// Polar sweep route construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepConstruction {
    config: SweepConfig,
}

impl SweepConstruction {
    /// Construction with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construction with explicit configuration.
    #[must_use]
    pub const fn with_config(config: SweepConfig) -> Self {
        Self { config }
    }
}

impl RouteConstruction for SweepConstruction {
    fn construct(
        &self,
        stops: &[Stop],
        plan: &RoutePlan,
        route_ids: &mut Sequence,
        interrupt: &dyn Interrupt,
    ) -> Result<Tier2Result, OptimizeError> {
        let mut packer = Packer {
            plan,
            config: self.config,
            route_ids,
            interrupt,
            open: Vec::new(),
            load: 0,
            routes: Vec::new(),
        };
        let mut unrouted = Vec::new();

        for stop in sweep_order(stops, plan.depot) {
            let demand = stop.demand();
            if plan.split_virtual_nodes && packer.room() == 0 {
                packer.close()?;
            }
            if demand <= packer.room() {
                packer.push(RouteNode::Stop(stop.clone()), demand);
            } else if !plan.split_virtual_nodes {
                if demand > plan.capacity {
                    warn!(
                        "stop {} needs {demand} seats but buses carry {}; leaving it unrouted",
                        stop.id, plan.capacity
                    );
                    unrouted.push(UnroutedStop {
                        stop_id: stop.id,
                        demand,
                        reason: UnroutedReason::DemandExceedsCapacity,
                    });
                } else {
                    packer.close()?;
                    packer.push(RouteNode::Stop(stop.clone()), demand);
                }
            } else {
                packer.split(stop)?;
            }
        }
        packer.close()?;

        let routes = packer.routes;
        let result = Tier2Result::new(routes, unrouted);
        info!(
            "built {} routes carrying {} students over {:.0} m",
            result.stats.total_routes, result.stats.total_students, result.stats.total_distance
        );
        Ok(result)
    }
}

/// Stops by bearing from the depot, then distance, then id.
fn sweep_order(stops: &[Stop], depot: Coord<f64>) -> Vec<&Stop> {
    let mut keyed: Vec<(f64, f64, &Stop)> = stops
        .iter()
        .map(|stop| {
            let location = stop.location();
            (
                bearing_degrees(depot, location),
                distance_meters(depot, location),
                stop,
            )
        })
        .collect();
    keyed.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then_with(|| a.1.total_cmp(&b.1))
            .then_with(|| a.2.id.cmp(&b.2.id))
    });
    keyed.into_iter().map(|(_, _, stop)| stop).collect()
}

/// Accumulates visits into the open route and closes it on demand.
struct Packer<'a> {
    plan: &'a RoutePlan,
    config: SweepConfig,
    route_ids: &'a mut Sequence,
    interrupt: &'a dyn Interrupt,
    open: Vec<RouteNode>,
    load: usize,
    routes: Vec<Route>,
}

impl Packer<'_> {
    const fn room(&self) -> usize {
        self.plan.capacity.saturating_sub(self.load)
    }

    fn push(&mut self, node: RouteNode, demand: usize) {
        self.open.push(node);
        self.load += demand;
    }

    /// Spread `stop` over the open route and as many fresh routes as needed.
    fn split(&mut self, stop: &Stop) -> Result<(), OptimizeError> {
        let mut remaining: &[StudentId] = &stop.assigned_student_ids;
        let mut fragment_index = 0;
        while !remaining.is_empty() {
            if self.room() == 0 {
                self.close()?;
            }
            let (taken, rest) = remaining.split_at(self.room().min(remaining.len()));
            let fragment = VirtualStopFragment {
                parent_stop_id: stop.id,
                fragment_index,
                lat: stop.lat,
                lng: stop.lng,
                student_ids: taken.to_vec(),
            };
            self.push(RouteNode::Fragment(fragment), taken.len());
            remaining = rest;
            fragment_index += 1;
        }
        debug!("split stop {} into {fragment_index} fragments", stop.id);
        Ok(())
    }

    fn close(&mut self) -> Result<(), OptimizeError> {
        if self.open.is_empty() {
            return Ok(());
        }
        if self.interrupt.is_interrupted() {
            return Err(OptimizeError::Cancelled {
                stage: Stage::RouteConstruction,
            });
        }
        let packed = std::mem::take(&mut self.open);
        let visits = if self.config.nearest_neighbour_tours {
            nearest_neighbour_order(self.plan.depot, packed)
        } else {
            packed
        };
        let route = Route::new(self.route_ids.next_id(), self.plan.depot, visits);
        debug!(
            "closed route {} with {} visits and {} students",
            route.id, route.stop_count, route.total_demand
        );
        self.routes.push(route);
        self.load = 0;
        Ok(())
    }
}
