//! Vehicle routes produced by route construction.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::{
    LatLng,
    geometry::distance_meters,
    stop::{Stop, StopId},
    student::StudentId,
};

/// Identifier assigned to a route by the route sequence of a call.
pub type RouteId = u64;

/// Part of a stop whose demand was split across routes.
///
/// Fragments keep the parent's coordinates and carry a disjoint share of its
/// students. Two fragments of one stop never share a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualStopFragment {
    /// Stop this fragment was split from.
    pub parent_stop_id: StopId,
    /// Zero-based position among the parent's fragments.
    pub fragment_index: usize,
    /// Latitude in degrees (the parent's).
    pub lat: f64,
    /// Longitude in degrees (the parent's).
    pub lng: f64,
    /// Students carried by this fragment.
    pub student_ids: Vec<StudentId>,
}

impl VirtualStopFragment {
    /// Students carried by this fragment.
    #[must_use]
    pub const fn demand(&self) -> usize {
        self.student_ids.len()
    }

    /// Location as a `geo` coordinate.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// One visit along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RouteNode {
    /// The depot at either end of the route.
    Depot(LatLng),
    /// A whole stop.
    Stop(Stop),
    /// A share of a split stop.
    Fragment(VirtualStopFragment),
}

impl RouteNode {
    /// Location of the visit.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        match self {
            Self::Depot(depot) => depot.to_coord(),
            Self::Stop(stop) => stop.location(),
            Self::Fragment(fragment) => fragment.location(),
        }
    }

    /// Students picked up at this visit.
    #[must_use]
    pub const fn demand(&self) -> usize {
        match self {
            Self::Depot(_) => 0,
            Self::Stop(stop) => stop.demand(),
            Self::Fragment(fragment) => fragment.demand(),
        }
    }

    /// Students picked up at this visit.
    #[must_use]
    pub fn student_ids(&self) -> &[StudentId] {
        match self {
            Self::Depot(_) => &[],
            Self::Stop(stop) => &stop.assigned_student_ids,
            Self::Fragment(fragment) => &fragment.student_ids,
        }
    }

    /// Identifier of the originating stop, if this is not the depot.
    #[must_use]
    pub const fn stop_id(&self) -> Option<StopId> {
        match self {
            Self::Depot(_) => None,
            Self::Stop(stop) => Some(stop.id),
            Self::Fragment(fragment) => Some(fragment.parent_stop_id),
        }
    }
}

/// A closed tour from the depot through its visits and back.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::{Route, RouteNode, Stop};
///
/// let depot = Coord { x: 0.0, y: 0.0 };
/// let stop = Stop::new(1, "Stop 1", Coord { x: 0.0, y: 0.01 }, vec![1, 2]);
/// let route = Route::new(1, depot, vec![RouteNode::Stop(stop)]);
/// assert_eq!(route.nodes.len(), 3);
/// assert_eq!(route.total_demand, 2);
/// assert!((route.estimated_distance - 2_223.9).abs() < 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Route identifier, sequential within one result.
    pub id: RouteId,
    /// Start and end of the tour.
    pub depot: LatLng,
    /// Visits from depot to depot inclusive.
    pub nodes: Vec<RouteNode>,
    /// Students carried.
    pub total_demand: usize,
    /// Stop and fragment visits, excluding the depot.
    pub stop_count: usize,
    /// Sum of great-circle leg lengths in metres.
    pub estimated_distance: f64,
}

impl Route {
    /// Close `visits` with the depot at both ends and derive the totals.
    #[must_use]
    pub fn new(id: RouteId, depot: Coord<f64>, visits: Vec<RouteNode>) -> Self {
        let depot_node = RouteNode::Depot(LatLng::from(depot));
        let stop_count = visits.len();
        let total_demand = visits.iter().map(RouteNode::demand).sum();

        let mut nodes = Vec::with_capacity(visits.len() + 2);
        nodes.push(depot_node.clone());
        nodes.extend(visits);
        nodes.push(depot_node);

        let estimated_distance = tour_length(nodes.iter().map(RouteNode::location));
        Self {
            id,
            depot: LatLng::from(depot),
            nodes,
            total_demand,
            stop_count,
            estimated_distance,
        }
    }

    /// Visits between the two depot nodes.
    pub fn visits(&self) -> impl Iterator<Item = &RouteNode> {
        self.nodes
            .iter()
            .filter(|node| !matches!(node, RouteNode::Depot(_)))
    }
}

/// Sum of great-circle distances between consecutive points.
#[must_use]
pub fn tour_length<I>(points: I) -> f64
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let mut iter = points.into_iter();
    let Some(mut previous) = iter.next() else {
        return 0.0;
    };
    let mut total = 0.0;
    for point in iter {
        total += distance_meters(previous, point);
        previous = point;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn empty_route_is_depot_round_trip() {
        let route = Route::new(3, Coord { x: 1.0, y: 1.0 }, Vec::new());
        assert_eq!(route.nodes.len(), 2);
        assert_eq!(route.stop_count, 0);
        assert!(route.estimated_distance.abs() < f64::EPSILON);
    }

    #[rstest]
    fn fragments_count_towards_demand() {
        let fragment = VirtualStopFragment {
            parent_stop_id: 9,
            fragment_index: 1,
            lat: 0.01,
            lng: 0.0,
            student_ids: vec![1, 2, 3],
        };
        let route = Route::new(1, Coord { x: 0.0, y: 0.0 }, vec![RouteNode::Fragment(fragment)]);
        assert_eq!(route.total_demand, 3);
        assert_eq!(route.visits().count(), 1);
        assert_eq!(route.nodes.get(1).and_then(RouteNode::stop_id), Some(9));
    }

    #[rstest]
    fn nodes_serialise_with_type_tag() {
        let route = Route::new(1, Coord { x: 2.0, y: 1.0 }, Vec::new());
        let value = serde_json::to_value(&route).expect("serialise route");
        assert_eq!(value["nodes"][0], json!({"type": "depot", "lat": 1.0, "lng": 2.0}));
        assert_eq!(value["totalDemand"], json!(0));
    }
}
