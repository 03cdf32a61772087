#![expect(
    clippy::expect_used,
    reason = "property tests use expect for readable failures"
)]

//! Property-based tests for stop placement and routing.
//!
//! # Invariants tested
//!
//! - **Walk radius:** every assigned student lives within the walk radius of
//!   their stop.
//! - **Stop size:** no stop serves more students than allowed.
//! - **No double counting:** each student is assigned at most once.
//! - **Capacity:** no route carries more than the bus capacity.
//! - **Fragment sums:** split stops are carried in full across routes.
//! - **Shared addresses:** students living at one address are all served,
//!   however many exceed the stop size.
//! - **Determinism:** identical inputs give identical outputs.

use std::collections::{HashMap, HashSet};

use geo::Coord;
use proptest::prelude::*;
use schoolrun_core::geometry::distance_meters;
use schoolrun_core::{
    LatLng, OptimizeStopsParams, OptimizeVrpParams, Stop, Student, StudentId, Tier2Result,
};
use schoolrun_solver::OptimizationEngine;
use schoolrun_solver::test_support::stop_with_demand;

const SCHOOL: LatLng = LatLng::new(50.08, 14.42);

fn home_near_school() -> impl Strategy<Value = (f64, f64)> {
    (-0.02_f64..0.02, -0.03_f64..0.03)
}

fn students_strategy(max: usize) -> impl Strategy<Value = Vec<Student>> {
    proptest::collection::vec(home_near_school(), 0..=max).prop_map(|homes| {
        homes
            .into_iter()
            .zip(1_u64..)
            .map(|((dlat, dlng), id)| Student::new(id, SCHOOL.lat + dlat, SCHOOL.lng + dlng))
            .collect()
    })
}

fn stops_strategy(max: usize) -> impl Strategy<Value = Vec<Stop>> {
    proptest::collection::vec((home_near_school(), 1_usize..=70), 0..=max).prop_map(|specs| {
        specs
            .into_iter()
            .zip(1_u64..)
            .map(|(((dlat, dlng), demand), id)| {
                let location = Coord {
                    x: SCHOOL.lng + dlng,
                    y: SCHOOL.lat + dlat,
                };
                stop_with_demand(id, location, demand)
            })
            .collect()
    })
}

/// A few addresses and, per student, the index of the address they live at.
fn shared_addresses_strategy(
    max_addresses: usize,
    max_students: usize,
) -> impl Strategy<Value = (Vec<(f64, f64)>, Vec<usize>)> {
    proptest::collection::vec(home_near_school(), 1..=max_addresses).prop_flat_map(move |addresses| {
        let count = addresses.len();
        (
            Just(addresses),
            proptest::collection::vec(0..count, 1..=max_students),
        )
    })
}

fn carried_per_stop(tier2: &Tier2Result) -> HashMap<u64, usize> {
    let mut carried = HashMap::new();
    for node in tier2.routes.iter().flat_map(|route| route.visits()) {
        if let Some(id) = node.stop_id() {
            *carried.entry(id).or_default() += node.demand();
        }
    }
    carried
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn placed_stops_respect_walk_radius_and_size(
        students in students_strategy(80),
        r_walk in 100.0_f64..800.0,
        s_max in 1_i64..=30,
    ) {
        let params = OptimizeStopsParams::new(r_walk, s_max, SCHOOL, 10_000.0)
            .with_students(students.clone());
        let result = OptimizationEngine::default()
            .optimize_stops(&params)
            .expect("stop placement succeeds");

        let homes: HashMap<StudentId, Coord<f64>> =
            students.iter().map(|s| (s.id, s.location())).collect();
        let mut seen = HashSet::new();
        for stop in &result.stops {
            prop_assert!(stop.demand() <= usize::try_from(s_max).expect("positive"));
            for id in &stop.assigned_student_ids {
                prop_assert!(seen.insert(*id), "student {} assigned twice", id);
                let home = homes.get(id).expect("assigned student exists");
                prop_assert!(distance_meters(*home, stop.location()) <= r_walk + 1e-6);
            }
        }
        prop_assert_eq!(result.stats.assigned_students, seen.len());
        prop_assert!(result.stats.assigned_students <= result.stats.total_students);
    }

    #[test]
    fn every_student_is_covered_without_a_stop_limit(students in students_strategy(60)) {
        let params = OptimizeStopsParams::new(400.0, 15, SCHOOL, 10_000.0)
            .with_students(students.clone());
        let result = OptimizationEngine::default()
            .optimize_stops(&params)
            .expect("stop placement succeeds");
        prop_assert_eq!(result.stats.assigned_students, students.len());
    }

    #[test]
    fn routes_respect_capacity_and_carry_every_student(
        stops in stops_strategy(12),
        capacity in 10_i64..=60,
    ) {
        let params = OptimizeVrpParams::new(SCHOOL, capacity, stops.clone());
        let result = OptimizationEngine::default()
            .optimize_vrp(&params)
            .expect("routing succeeds");
        let limit = usize::try_from(capacity).expect("positive");
        for route in &result.routes {
            prop_assert!(route.total_demand <= limit);
        }
        let carried = carried_per_stop(&result);
        for stop in &stops {
            prop_assert_eq!(carried.get(&stop.id).copied(), Some(stop.demand()));
        }
        prop_assert!(result.stats.unrouted.is_empty());
    }

    #[test]
    fn unsplit_routing_reports_oversized_stops(
        stops in stops_strategy(12),
        capacity in 10_i64..=60,
    ) {
        let params = OptimizeVrpParams::new(SCHOOL, capacity, stops.clone())
            .with_split_virtual_nodes(false);
        let result = OptimizationEngine::default()
            .optimize_vrp(&params)
            .expect("routing succeeds");
        let limit = usize::try_from(capacity).expect("positive");
        let unrouted: HashSet<_> = result.stats.unrouted.iter().map(|u| u.stop_id).collect();
        let carried = carried_per_stop(&result);
        for stop in &stops {
            if stop.demand() > limit {
                prop_assert!(unrouted.contains(&stop.id));
                prop_assert!(!carried.contains_key(&stop.id));
            } else {
                prop_assert_eq!(carried.get(&stop.id).copied(), Some(stop.demand()));
            }
        }
    }

    #[test]
    fn shared_addresses_are_fully_covered(
        (addresses, picks) in shared_addresses_strategy(4, 80),
        s_max in 1_i64..=15,
    ) {
        let students: Vec<Student> = picks
            .iter()
            .zip(1_u64..)
            .filter_map(|(pick, id)| {
                addresses
                    .get(*pick)
                    .map(|(dlat, dlng)| Student::new(id, SCHOOL.lat + dlat, SCHOOL.lng + dlng))
            })
            .collect();
        let params = OptimizeStopsParams::new(300.0, s_max, SCHOOL, 10_000.0)
            .with_students(students.clone());
        let result = OptimizationEngine::default()
            .optimize_stops(&params)
            .expect("stop placement succeeds");
        prop_assert_eq!(result.stats.assigned_students, students.len());
        prop_assert!(result.stats.unassigned_student_ids.is_empty());
    }

    #[test]
    fn optimisation_is_deterministic(students in students_strategy(50)) {
        let params = OptimizeStopsParams::new(300.0, 10, SCHOOL, 10_000.0)
            .with_students(students);
        let engine = OptimizationEngine::default();
        let first = engine.optimize_stops(&params).expect("first run");
        let second = engine.optimize_stops(&params).expect("second run");
        prop_assert_eq!(&first, &second);

        let vrp = OptimizeVrpParams::new(SCHOOL, 30, first.stops);
        let routed_once = engine.optimize_vrp(&vrp).expect("first routing");
        let routed_twice = engine.optimize_vrp(&vrp).expect("second routing");
        prop_assert_eq!(routed_once, routed_twice);
    }
}
