//! Test-only utilities for `schoolrun-solver`.
//!
//! The helpers in this module are available to unit tests and behavioural
//! tests. They are gated behind the `test-support` feature (and `cfg(test)`).

use geo::Coord;
use schoolrun_core::{Stop, StudentId, geometry::offset_to_coord};

/// `count` stops evenly spaced on a ring of `radius_meters` around `depot`,
/// each with `demand` students.
///
/// Stop ids start at one; student ids are unique across the ring.
///
/// # Examples
/// ```rust
/// use geo::Coord;
/// use schoolrun_solver::test_support::stops_around;
///
/// let stops = stops_around(Coord { x: 14.42, y: 50.08 }, 4, 10, 1_500.0);
/// assert_eq!(stops.len(), 4);
/// assert!(stops.iter().all(|stop| stop.demand() == 10));
/// ```
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "fixture sizes are small")]
pub fn stops_around(depot: Coord<f64>, count: usize, demand: usize, radius_meters: f64) -> Vec<Stop> {
    let step = std::f64::consts::TAU / count.max(1) as f64;
    (0..count)
        .map(|index| {
            let angle = index as f64 * step;
            let location = offset_to_coord(
                depot,
                Coord {
                    x: radius_meters * angle.sin(),
                    y: radius_meters * angle.cos(),
                },
            );
            stop_with_demand(index as u64 + 1, location, demand)
        })
        .collect()
}

/// A stop at `location` whose students are numbered `id * 1000 + n`.
#[must_use]
pub fn stop_with_demand(id: u64, location: Coord<f64>, demand: usize) -> Stop {
    let students: Vec<StudentId> = (1..=demand as u64).map(|n| id * 1_000 + n).collect();
    Stop::new(id, format!("Stop {id}"), location, students)
}
