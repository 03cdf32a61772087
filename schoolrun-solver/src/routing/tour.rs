//! Nearest-neighbour visit ordering.

use geo::Coord;
use schoolrun_core::{RouteNode, geometry::distance_meters};

/// Order `visits` greedily by proximity, starting from `depot`.
///
/// Equal distances keep the earlier visit first.
pub(crate) fn nearest_neighbour_order(depot: Coord<f64>, visits: Vec<RouteNode>) -> Vec<RouteNode> {
    let mut pending: Vec<Option<RouteNode>> = visits.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(pending.len());
    let mut current = depot;
    loop {
        let mut best: Option<(usize, f64)> = None;
        for (position, slot) in pending.iter().enumerate() {
            let Some(visit) = slot else {
                continue;
            };
            let distance = distance_meters(current, visit.location());
            if best.is_none_or(|(_, closest)| distance < closest) {
                best = Some((position, distance));
            }
        }
        let Some(next) = best.and_then(|(position, _)| pending.get_mut(position)?.take()) else {
            break;
        };
        current = next.location();
        ordered.push(next);
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use schoolrun_core::Stop;

    fn stop_at(id: u64, lat: f64) -> RouteNode {
        RouteNode::Stop(Stop::new(id, format!("Stop {id}"), Coord { x: 0.0, y: lat }, vec![id]))
    }

    #[rstest]
    fn visits_nearest_first() {
        let depot = Coord { x: 0.0, y: 0.0 };
        let visits = vec![stop_at(1, 0.03), stop_at(2, 0.01), stop_at(3, 0.02)];
        let ids: Vec<_> = nearest_neighbour_order(depot, visits)
            .iter()
            .filter_map(RouteNode::stop_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[rstest]
    fn equal_distances_keep_input_order() {
        let depot = Coord { x: 0.0, y: 0.0 };
        let visits = vec![stop_at(7, 0.01), stop_at(4, 0.01)];
        let ids: Vec<_> = nearest_neighbour_order(depot, visits)
            .iter()
            .filter_map(RouteNode::stop_id)
            .collect();
        assert_eq!(ids, vec![7, 4]);
    }
}
