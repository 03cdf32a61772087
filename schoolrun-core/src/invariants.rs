//! Post-condition checks run after each tier.
//!
//! A failure here is a defect in the optimiser, reported as
//! [`InvariantViolation`] and kept separate from validation errors.

use std::collections::{HashMap, HashSet};

use geo::Coord;

use crate::{
    InvariantViolation, RouteNode, RoutePlan, Stop, StopId, StopPlan, Student, StudentId,
    Tier2Result, geometry::distance_meters,
};

/// Check placed stops against walk radius, stop size, school distance and
/// single assignment.
///
/// `students` is the snapshot the stops were placed for. When an id repeats,
/// the first occurrence is the one that counts, matching stop placement.
pub fn verify_stops(
    stops: &[Stop],
    students: &[Student],
    plan: &StopPlan,
) -> Result<(), InvariantViolation> {
    let mut homes: HashMap<StudentId, Coord<f64>> = HashMap::with_capacity(students.len());
    for student in students {
        homes.entry(student.id).or_insert_with(|| student.location());
    }
    let mut seen = HashSet::with_capacity(students.len());

    for stop in stops {
        if stop.demand() > plan.max_students_per_stop {
            return Err(InvariantViolation::StopOverCapacity {
                stop_id: stop.id,
                demand: stop.demand(),
                limit: plan.max_students_per_stop,
            });
        }
        let to_school = distance_meters(stop.location(), plan.school);
        if to_school > plan.max_distance_from_school {
            return Err(InvariantViolation::StopTooFarFromSchool {
                stop_id: stop.id,
                distance: to_school,
                limit: plan.max_distance_from_school,
            });
        }
        for student_id in &stop.assigned_student_ids {
            let home = homes
                .get(student_id)
                .ok_or(InvariantViolation::UnknownStudent {
                    stop_id: stop.id,
                    student_id: *student_id,
                })?;
            if !seen.insert(*student_id) {
                return Err(InvariantViolation::DuplicateStudent {
                    student_id: *student_id,
                });
            }
            let walk = distance_meters(*home, stop.location());
            if walk > plan.walk_radius_meters {
                return Err(InvariantViolation::WalkRadiusExceeded {
                    stop_id: stop.id,
                    student_id: *student_id,
                    distance: walk,
                    limit: plan.walk_radius_meters,
                });
            }
        }
    }
    Ok(())
}

/// Check routes against capacity, demand bookkeeping and stop coverage.
///
/// Every input stop must appear whole in exactly one route, be split into
/// fragments whose demands sum to its own, or be listed as unrouted.
pub fn verify_routes(
    result: &Tier2Result,
    stops: &[Stop],
    plan: &RoutePlan,
) -> Result<(), InvariantViolation> {
    let by_id: HashMap<StopId, &Stop> = stops.iter().map(|stop| (stop.id, stop)).collect();
    let mut whole: HashSet<StopId> = HashSet::with_capacity(stops.len());
    let mut fragment_demand: HashMap<StopId, usize> = HashMap::new();
    let mut students: HashSet<StudentId> = HashSet::new();

    for route in &result.routes {
        if !route.estimated_distance.is_finite() || route.estimated_distance < 0.0 {
            return Err(InvariantViolation::InvalidDistance {
                route_id: route.id,
                distance: route.estimated_distance,
            });
        }
        let carried: usize = route.visits().map(RouteNode::demand).sum();
        if carried != route.total_demand {
            return Err(InvariantViolation::RouteDemandMismatch {
                route_id: route.id,
                declared: route.total_demand,
                actual: carried,
            });
        }
        if carried > plan.capacity {
            return Err(InvariantViolation::RouteOverCapacity {
                route_id: route.id,
                demand: carried,
                capacity: plan.capacity,
            });
        }

        let mut split_here = HashSet::new();
        for node in route.visits() {
            let Some(stop_id) = node.stop_id() else {
                continue;
            };
            if !by_id.contains_key(&stop_id) {
                return Err(InvariantViolation::UnknownStop {
                    route_id: route.id,
                    stop_id,
                });
            }
            match node {
                RouteNode::Stop(_) => {
                    if !whole.insert(stop_id) || fragment_demand.contains_key(&stop_id) {
                        return Err(InvariantViolation::StopRoutedTwice { stop_id });
                    }
                }
                RouteNode::Fragment(fragment) => {
                    if whole.contains(&stop_id) {
                        return Err(InvariantViolation::StopRoutedTwice { stop_id });
                    }
                    if !split_here.insert(stop_id) {
                        return Err(InvariantViolation::FragmentsShareRoute {
                            route_id: route.id,
                            stop_id,
                        });
                    }
                    *fragment_demand.entry(stop_id).or_default() += fragment.demand();
                }
                RouteNode::Depot(_) => {}
            }
            for student_id in node.student_ids() {
                if !students.insert(*student_id) {
                    return Err(InvariantViolation::DuplicateStudent {
                        student_id: *student_id,
                    });
                }
            }
        }
    }

    let unrouted: HashSet<StopId> = result.stats.unrouted.iter().map(|u| u.stop_id).collect();
    for stop in stops {
        let routed_whole = whole.contains(&stop.id);
        let split = fragment_demand.get(&stop.id).copied();
        if unrouted.contains(&stop.id) {
            if routed_whole || split.is_some() {
                return Err(InvariantViolation::StopRoutedTwice { stop_id: stop.id });
            }
            continue;
        }
        match split {
            Some(actual) if actual != stop.demand() => {
                return Err(InvariantViolation::SplitDemandMismatch {
                    stop_id: stop.id,
                    expected: stop.demand(),
                    actual,
                });
            }
            Some(_) => {}
            None if routed_whole => {}
            None => return Err(InvariantViolation::StopMissing { stop_id: stop.id }),
        }
    }
    Ok(())
}
