//! Lazy greedy maximum coverage.
//!
//! Each candidate's capped coverage count can only fall as students get
//! covered, so a stale heap entry is an upper bound on its fresh value. The
//! selector pops, refreshes and re-queues until the top entry is fresh, then
//! refreshes every entry sharing that count so tie-breaks see current mean
//! distances. The pick is identical to a full rescan.

use std::{cmp::Ordering, collections::BinaryHeap};

use schoolrun_core::{CandidateStop, Neighbour};

/// Heap entry ranking a candidate.
#[derive(Debug, Clone, Copy)]
struct Score {
    count: usize,
    mean_distance: f64,
    key: usize,
    candidate: usize,
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher count wins, then lower mean distance, then lower key.
        self.count
            .cmp(&other.count)
            .then_with(|| other.mean_distance.total_cmp(&self.mean_distance))
            .then_with(|| other.key.cmp(&self.key))
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

/// A chosen candidate and the students it takes, nearest first.
#[derive(Debug, Clone)]
pub(crate) struct Selection {
    pub(crate) candidate: CandidateStop,
    pub(crate) students: Vec<Neighbour>,
}

/// Greedy selector over precomputed candidate neighbourhoods.
pub(crate) struct GreedyCover<'a> {
    candidates: &'a [CandidateStop],
    neighbours: &'a [Vec<Neighbour>],
    covered: Vec<bool>,
    uncovered: usize,
    capacity: usize,
    heap: BinaryHeap<Score>,
}

impl<'a> GreedyCover<'a> {
    /// `neighbours[i]` lists the students within reach of `candidates[i]`,
    /// sorted by distance then slot.
    pub(crate) fn new(
        candidates: &'a [CandidateStop],
        neighbours: &'a [Vec<Neighbour>],
        student_count: usize,
        capacity: usize,
    ) -> Self {
        let mut cover = Self {
            candidates,
            neighbours,
            covered: vec![false; student_count],
            uncovered: student_count,
            capacity,
            heap: BinaryHeap::with_capacity(candidates.len()),
        };
        let initial: Vec<Score> = (0..candidates.len())
            .filter_map(|candidate| cover.score(candidate))
            .collect();
        cover.heap.extend(initial);
        cover
    }

    /// Slots of students no selection has covered yet.
    pub(crate) fn uncovered_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.covered
            .iter()
            .enumerate()
            .filter_map(|(slot, covered)| (!covered).then_some(slot))
    }

    /// Pick the best remaining candidate and cover its students.
    ///
    /// Returns `None` once every student is covered or no candidate reaches
    /// an uncovered student.
    pub(crate) fn next_selection(&mut self) -> Option<Selection> {
        while self.uncovered > 0 {
            let top = self.heap.pop()?;
            let Some(fresh) = self.score(top.candidate) else {
                continue;
            };
            if fresh.count < top.count {
                self.heap.push(fresh);
                continue;
            }

            // `fresh.count` is now the true maximum; settle ties on fresh data.
            let mut best = fresh;
            let mut deferred = Vec::new();
            while self.heap.peek().is_some_and(|next| next.count == best.count) {
                let Some(entry) = self.heap.pop() else {
                    break;
                };
                let Some(refreshed) = self.score(entry.candidate) else {
                    continue;
                };
                if refreshed.count == best.count && refreshed > best {
                    deferred.push(best);
                    best = refreshed;
                } else {
                    deferred.push(refreshed);
                }
            }
            self.heap.extend(deferred);
            let selection = self.take(best.candidate);
            // A full candidate may still reach students beyond its cap.
            if let Some(again) = self.score(best.candidate) {
                self.heap.push(again);
            }
            return selection;
        }
        None
    }

    fn score(&self, candidate: usize) -> Option<Score> {
        let neighbours = self.neighbours.get(candidate)?;
        let key = self.candidates.get(candidate)?.key;
        let (count, total) = neighbours
            .iter()
            .filter(|n| !self.is_covered(n.slot))
            .take(self.capacity)
            .fold((0_usize, 0.0_f64), |(count, total), n| {
                (count + 1, total + n.distance)
            });
        (count > 0).then(|| Score {
            count,
            mean_distance: mean(total, count),
            key,
            candidate,
        })
    }

    fn take(&mut self, candidate: usize) -> Option<Selection> {
        let stop = *self.candidates.get(candidate)?;
        let students: Vec<Neighbour> = self
            .neighbours
            .get(candidate)?
            .iter()
            .filter(|n| !self.is_covered(n.slot))
            .take(self.capacity)
            .copied()
            .collect();
        for neighbour in &students {
            if let Some(flag) = self.covered.get_mut(neighbour.slot) {
                *flag = true;
            }
        }
        self.uncovered = self.uncovered.saturating_sub(students.len());
        Some(Selection {
            candidate: stop,
            students,
        })
    }

    fn is_covered(&self, slot: usize) -> bool {
        self.covered.get(slot).copied().unwrap_or(true)
    }
}

#[expect(clippy::cast_precision_loss, reason = "neighbourhoods are far below 2^52")]
const fn mean(total: f64, count: usize) -> f64 {
    total / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::rstest;
    use schoolrun_core::StudentIndex;

    fn neighbourhoods(
        homes: &[Coord<f64>],
        candidates: &[CandidateStop],
        radius: f64,
    ) -> Vec<Vec<Neighbour>> {
        let index = StudentIndex::new(homes);
        candidates
            .iter()
            .map(|c| index.within_radius(c.location(), radius))
            .collect()
    }

    /// Full rescan reference used to confirm the lazy heap.
    #[expect(clippy::indexing_slicing, reason = "indices come from the same vectors")]
    #[expect(clippy::cast_precision_loss, reason = "fixture sizes are small")]
    fn rescan_order(
        homes: &[Coord<f64>],
        candidates: &[CandidateStop],
        radius: f64,
        capacity: usize,
    ) -> Vec<usize> {
        let lists = neighbourhoods(homes, candidates, radius);
        let mut covered = vec![false; homes.len()];
        let mut order = Vec::new();
        loop {
            let mut best: Option<(usize, f64, usize, usize)> = None;
            for (i, list) in lists.iter().enumerate() {
                let taken: Vec<&Neighbour> = list
                    .iter()
                    .filter(|n| !covered[n.slot])
                    .take(capacity)
                    .collect();
                if taken.is_empty() {
                    continue;
                }
                let mean = taken.iter().map(|n| n.distance).sum::<f64>() / taken.len() as f64;
                let entry = (taken.len(), mean, candidates[i].key, i);
                best = match best {
                    None => Some(entry),
                    Some(b)
                        if entry.0 > b.0
                            || (entry.0 == b.0 && entry.1 < b.1)
                            || (entry.0 == b.0 && entry.1 == b.1 && entry.2 < b.2) =>
                    {
                        Some(entry)
                    }
                    keep => keep,
                };
            }
            let Some((_, _, _, i)) = best else { break };
            let mut marked = 0;
            for n in &lists[i] {
                if marked == capacity {
                    break;
                }
                if !covered[n.slot] {
                    covered[n.slot] = true;
                    marked += 1;
                }
            }
            order.push(candidates[i].key);
        }
        order
    }

    #[expect(clippy::cast_precision_loss, reason = "fixture sizes are small")]
    fn line_of_homes(count: usize, spacing_deg: f64) -> Vec<Coord<f64>> {
        (0..count)
            .map(|i| Coord {
                x: i as f64 * spacing_deg,
                y: 0.0,
            })
            .collect()
    }

    #[rstest]
    #[case(12, 0.001, 250.0, 3)]
    #[case(20, 0.0007, 300.0, 4)]
    #[case(9, 0.002, 150.0, 2)]
    fn lazy_heap_matches_full_rescan(
        #[case] count: usize,
        #[case] spacing: f64,
        #[case] radius: f64,
        #[case] capacity: usize,
    ) {
        let homes = line_of_homes(count, spacing);
        let candidates: Vec<CandidateStop> = homes
            .iter()
            .enumerate()
            .map(|(key, home)| CandidateStop::new(key, *home))
            .collect();
        let lists = neighbourhoods(&homes, &candidates, radius);
        let mut cover = GreedyCover::new(&candidates, &lists, homes.len(), capacity);
        let mut lazy = Vec::new();
        while let Some(selection) = cover.next_selection() {
            lazy.push(selection.candidate.key);
        }
        assert_eq!(lazy, rescan_order(&homes, &candidates, radius, capacity));
    }

    #[rstest]
    fn ties_prefer_lower_mean_then_lower_key() {
        // Two students 100 m apart; both candidates cover both at equal mean.
        let homes = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0009 }];
        let candidates: Vec<CandidateStop> = homes
            .iter()
            .enumerate()
            .map(|(key, home)| CandidateStop::new(key, *home))
            .collect();
        let lists = neighbourhoods(&homes, &candidates, 200.0);
        let mut cover = GreedyCover::new(&candidates, &lists, 2, 5);
        let selection = cover.next_selection().expect("one stop");
        assert_eq!(selection.candidate.key, 0);
        assert_eq!(selection.students.len(), 2);
        assert!(cover.next_selection().is_none());
    }

    #[rstest]
    fn capacity_caps_assignment_nearest_first() {
        let homes = line_of_homes(5, 0.0005);
        let candidates = vec![CandidateStop::new(0, Coord { x: 0.001, y: 0.0 })];
        let lists = neighbourhoods(&homes, &candidates, 1_000.0);
        let mut cover = GreedyCover::new(&candidates, &lists, homes.len(), 3);
        let selection = cover.next_selection().expect("one stop");
        let slots: Vec<usize> = selection.students.iter().map(|n| n.slot).collect();
        assert_eq!(slots, vec![2, 1, 3]);
        assert_eq!(cover.uncovered_slots().collect::<Vec<_>>(), vec![0, 4]);
    }

    #[rstest]
    fn crowded_candidate_is_chosen_again_until_empty() {
        let homes = vec![Coord { x: 0.0, y: 0.0 }; 7];
        let candidates = vec![CandidateStop::new(0, Coord { x: 0.0, y: 0.0 })];
        let lists = neighbourhoods(&homes, &candidates, 100.0);
        let mut cover = GreedyCover::new(&candidates, &lists, homes.len(), 3);
        let sizes: Vec<usize> = std::iter::from_fn(|| cover.next_selection())
            .map(|selection| selection.students.len())
            .collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(cover.uncovered_slots().count(), 0);
    }
}
