//! R\*-tree over student home locations.
//!
//! Radius queries prefilter with a degree-space envelope from
//! [`bounding_box_around`] and confirm with the haversine distance, so stop
//! placement never rescans the whole roster per candidate.

use geo::Coord;
use rstar::{AABB, RTree, RTreeObject};

use crate::geometry::{bounding_box_around, distance_meters};

#[derive(Debug, Clone, Copy)]
struct IndexedStudent {
    slot: usize,
    location: Coord<f64>,
}

impl RTreeObject for IndexedStudent {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}

/// A student found by a radius query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// Position of the student in the slice the index was built from.
    pub slot: usize,
    /// Haversine distance to the query centre in metres.
    pub distance: f64,
}

/// Spatial index answering "which students live within `r` metres".
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::StudentIndex;
///
/// let homes = [Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.001 }, Coord { x: 0.0, y: 0.1 }];
/// let index = StudentIndex::new(&homes);
/// let near: Vec<usize> = index
///     .within_radius(Coord { x: 0.0, y: 0.0 }, 500.0)
///     .iter()
///     .map(|n| n.slot)
///     .collect();
/// assert_eq!(near, vec![0, 1]);
/// ```
#[derive(Debug)]
pub struct StudentIndex {
    tree: RTree<IndexedStudent>,
}

impl StudentIndex {
    /// Bulk-load the index; slots are positions in `locations`.
    #[must_use]
    pub fn new(locations: &[Coord<f64>]) -> Self {
        let entries = locations
            .iter()
            .enumerate()
            .map(|(slot, location)| IndexedStudent {
                slot,
                location: *location,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed students.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Students within `radius_meters` of `center`, boundary inclusive.
    ///
    /// Results are ordered by distance, then by slot, so callers can take a
    /// deterministic nearest-first prefix.
    #[must_use]
    pub fn within_radius(&self, center: Coord<f64>, radius_meters: f64) -> Vec<Neighbour> {
        let bbox = bounding_box_around(center, radius_meters);
        let envelope =
            AABB::from_corners([bbox.min().x, bbox.min().y], [bbox.max().x, bbox.max().y]);
        let mut found: Vec<Neighbour> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| {
                let distance = distance_meters(center, entry.location);
                (distance <= radius_meters).then_some(Neighbour {
                    slot: entry.slot,
                    distance,
                })
            })
            .collect();
        found.sort_unstable_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.slot.cmp(&b.slot))
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn ring() -> Vec<Coord<f64>> {
        // Equal distances north and south, plus one far point.
        vec![
            Coord { x: 0.0, y: 0.002 },
            Coord { x: 0.0, y: -0.002 },
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
        ]
    }

    #[rstest]
    fn ties_are_ordered_by_slot(ring: Vec<Coord<f64>>) {
        let index = StudentIndex::new(&ring);
        let slots: Vec<usize> = index
            .within_radius(Coord { x: 0.0, y: 0.0 }, 300.0)
            .iter()
            .map(|n| n.slot)
            .collect();
        assert_eq!(slots, vec![2, 0, 1]);
    }

    #[rstest]
    fn radius_is_inclusive(ring: Vec<Coord<f64>>) {
        let index = StudentIndex::new(&ring);
        let exact = distance_meters(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.002 });
        assert_eq!(index.within_radius(Coord { x: 0.0, y: 0.0 }, exact).len(), 3);
    }

    #[rstest]
    fn matches_brute_force(ring: Vec<Coord<f64>>) {
        let index = StudentIndex::new(&ring);
        let center = Coord { x: 0.0005, y: 0.001 };
        let expected = ring
            .iter()
            .filter(|p| distance_meters(center, **p) <= 150.0)
            .count();
        assert_eq!(index.within_radius(center, 150.0).len(), expected);
        assert_eq!(index.len(), 4);
    }
}
