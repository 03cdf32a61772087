//! Candidate stop derivation: roster partitioning, deduplication, optional
//! road snapping and reach filters.

use std::collections::{HashMap, HashSet};

use geo::Coord;
use log::{debug, warn};
use schoolrun_core::{
    CandidateStop, RefinementStatus, RoadSnapper, StopPlan, Student, StudentId,
    geometry::{distance_meters, validate_coordinate, within_corridor},
};

/// Students split into those usable for placement and those rejected.
#[derive(Debug, Default)]
pub(crate) struct Roster {
    pub(crate) valid: Vec<Student>,
    pub(crate) invalid_ids: Vec<StudentId>,
}

/// Separate students with usable coordinates from the rest.
///
/// A student is rejected for an out-of-range coordinate or for repeating an
/// id already seen; the first occurrence of an id always wins.
pub(crate) fn partition_students(students: &[Student]) -> Roster {
    let mut seen = HashSet::with_capacity(students.len());
    let mut roster = Roster::default();
    for student in students {
        let first = seen.insert(student.id);
        if first && student.validate().is_ok() {
            roster.valid.push(student.clone());
        } else {
            roster.invalid_ids.push(student.id);
        }
    }
    if !roster.invalid_ids.is_empty() {
        warn!(
            "{} students rejected for invalid coordinates or repeated ids",
            roster.invalid_ids.len()
        );
    }
    roster
}

/// One candidate per distinct home coordinate, keyed by the first student
/// living there.
pub(crate) fn derive_candidates(valid: &[Student]) -> Vec<CandidateStop> {
    let mut by_location: HashMap<(u64, u64), usize> = HashMap::with_capacity(valid.len());
    let mut candidates = Vec::with_capacity(valid.len());
    for (slot, student) in valid.iter().enumerate() {
        let location = student.location();
        let bits = (location.x.to_bits(), location.y.to_bits());
        if by_location.insert(bits, slot).is_none() {
            candidates.push(CandidateStop::new(slot, location));
        }
    }
    candidates
}

/// Snap candidates in one batch, keeping raw coordinates on failure.
///
/// A snapped point further than `max_shift_meters` from its source is
/// rejected so a stop never drifts away from the students it was derived
/// from.
pub(crate) fn snap_candidates<S>(snapper: &S, candidates: &mut [CandidateStop], max_shift_meters: f64)
where
    S: RoadSnapper + ?Sized,
{
    if candidates.is_empty() {
        return;
    }
    let points: Vec<Coord<f64>> = candidates.iter().map(CandidateStop::location).collect();
    let snapped = match snapper.snap_to_roads(&points) {
        Ok(snapped) if snapped.len() == points.len() => snapped,
        Ok(snapped) => {
            warn!(
                "road snapping returned {} points for {} candidates; keeping raw coordinates",
                snapped.len(),
                points.len()
            );
            mark_all(candidates, RefinementStatus::Fallback);
            return;
        }
        Err(err) => {
            warn!("road snapping failed; keeping raw coordinates: {err}");
            mark_all(candidates, RefinementStatus::Fallback);
            return;
        }
    };

    let mut rejected = 0_usize;
    for (candidate, point) in candidates.iter_mut().zip(snapped) {
        let accepted = point.filter(|p| {
            validate_coordinate(*p).is_ok()
                && distance_meters(candidate.location(), *p) <= max_shift_meters
        });
        if let Some(p) = accepted {
            candidate.lat = p.y;
            candidate.lng = p.x;
            candidate.snap = RefinementStatus::Applied;
        } else {
            candidate.snap = RefinementStatus::Fallback;
            rejected += 1;
        }
    }
    debug!(
        "snapped {} of {} candidates",
        candidates.len() - rejected,
        candidates.len()
    );
}

fn mark_all(candidates: &mut [CandidateStop], status: RefinementStatus) {
    for candidate in candidates {
        candidate.snap = status;
    }
}

/// Whether a candidate respects the school distance and corridor limits.
pub(crate) fn within_reach(candidate: &CandidateStop, plan: &StopPlan) -> bool {
    let location = candidate.location();
    if distance_meters(location, plan.school) > plan.max_distance_from_school {
        return false;
    }
    plan.corridor
        .as_ref()
        .is_none_or(|corridor| within_corridor(location, &corridor.polyline, corridor.width_meters))
}
