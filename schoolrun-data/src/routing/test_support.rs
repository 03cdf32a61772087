//! Test utilities for refinement services.
//!
//! This module provides [`StubNearestService`], a deterministic test double
//! for [`RoadSnapper`] and [`PlaceNamer`] that returns pre-configured
//! waypoints without making HTTP requests.

use geo::Coord;
use schoolrun_core::{PlaceNamer, RefineError, RoadSnapper};

/// Stub nearest-street service for testing.
///
/// # Example
///
/// ```
/// use geo::Coord;
/// use schoolrun_core::{PlaceNamer, RoadSnapper};
/// use schoolrun_data::routing::test_support::StubNearestService;
///
/// let service = StubNearestService::on_street("Main Street", 0.0005);
/// let points = [Coord { x: 14.42, y: 50.08 }];
///
/// let snapped = service.snap_to_roads(&points).expect("snapped");
/// assert_eq!(snapped, vec![Some(Coord { x: 14.4205, y: 50.08 })]);
/// assert_eq!(service.name_places(&points).expect("named"), vec![Some("Main Street".to_owned())]);
/// ```
#[derive(Debug, Clone)]
pub struct StubNearestService {
    response: StubResponse,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Street { name: String, east_degrees: f64 },
    Unsnappable,
    Error(RefineError),
}

impl StubNearestService {
    /// Snap every point `east_degrees` of longitude east onto `name`.
    #[must_use]
    pub fn on_street(name: impl Into<String>, east_degrees: f64) -> Self {
        Self {
            response: StubResponse::Street {
                name: name.into(),
                east_degrees,
            },
        }
    }

    /// Report every point as having no street nearby.
    #[must_use]
    pub const fn unsnappable() -> Self {
        Self {
            response: StubResponse::Unsnappable,
        }
    }

    /// Fail every non-empty batch with `error`.
    #[must_use]
    pub const fn with_error(error: RefineError) -> Self {
        Self {
            response: StubResponse::Error(error),
        }
    }

    fn answer<T>(
        &self,
        points: &[Coord<f64>],
        on_street: impl Fn(Coord<f64>, &str, f64) -> T,
    ) -> Result<Vec<Option<T>>, RefineError> {
        if points.is_empty() {
            return Err(RefineError::EmptyInput);
        }
        match &self.response {
            StubResponse::Street { name, east_degrees } => Ok(points
                .iter()
                .map(|point| Some(on_street(*point, name, *east_degrees)))
                .collect()),
            StubResponse::Unsnappable => Ok(points.iter().map(|_| None).collect()),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }
}

impl RoadSnapper for StubNearestService {
    fn snap_to_roads(&self, points: &[Coord<f64>]) -> Result<Vec<Option<Coord<f64>>>, RefineError> {
        self.answer(points, |point, _, east| Coord {
            x: point.x + east,
            y: point.y,
        })
    }
}

impl PlaceNamer for StubNearestService {
    fn name_places(&self, points: &[Coord<f64>]) -> Result<Vec<Option<String>>, RefineError> {
        self.answer(points, |_, name, _| name.to_owned())
    }
}
