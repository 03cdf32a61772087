//! Optional coordinate refinement collaborators.
//!
//! Road snapping and place naming are network-bound services. The engine
//! calls them in one batch outside the greedy and sweep loops and treats
//! every failure as recoverable: raw coordinates and generated names stay in
//! use and the affected stops are flagged.

use std::sync::Arc;

use geo::Coord;
use thiserror::Error;

/// Errors from [`RoadSnapper`] and [`PlaceNamer`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefineError {
    /// No coordinates were provided.
    #[error("at least one coordinate is required")]
    EmptyInput,
    /// No refinement service is configured.
    #[error("no refinement service is configured")]
    Unavailable,
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// The timeout duration in seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success HTTP status.
    #[error("request to {url} failed with HTTP {status}: {message}")]
    HttpError {
        /// The URL that failed.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// Connection-level failure.
    #[error("network error for {url}: {message}")]
    NetworkError {
        /// The URL that failed.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The service reported an error code in its response body.
    #[error("routing service error {code}: {message}")]
    ServiceError {
        /// Service error code.
        code: String,
        /// Error detail.
        message: String,
    },
    /// The response could not be decoded.
    #[error("failed to parse refinement response: {message}")]
    ParseError {
        /// Decoder detail.
        message: String,
    },
    /// The service rejected the request as over quota.
    #[error("request to {url} was rate limited")]
    RateLimited {
        /// The URL that was throttled.
        url: String,
    },
}

/// Move coordinates onto the road network.
///
/// Implementations return one entry per input point; `None` marks a point
/// that could not be snapped. A result of the wrong length is treated by
/// the engine as a failure for every point.
pub trait RoadSnapper: Send + Sync {
    /// Snap each point to the nearest road.
    fn snap_to_roads(&self, points: &[Coord<f64>]) -> Result<Vec<Option<Coord<f64>>>, RefineError>;
}

/// Look up a human-readable place name for coordinates.
pub trait PlaceNamer: Send + Sync {
    /// Name each point; `None` marks a point without a usable name.
    fn name_places(&self, points: &[Coord<f64>]) -> Result<Vec<Option<String>>, RefineError>;
}

/// Refinement collaborator used when no service is configured.
///
/// Every call fails with [`RefineError::Unavailable`], so requesting
/// refinement without a service flags the stops rather than silently
/// pretending refinement happened.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRefinement;

impl RoadSnapper for NoRefinement {
    fn snap_to_roads(
        &self,
        _points: &[Coord<f64>],
    ) -> Result<Vec<Option<Coord<f64>>>, RefineError> {
        Err(RefineError::Unavailable)
    }
}

impl PlaceNamer for NoRefinement {
    fn name_places(&self, _points: &[Coord<f64>]) -> Result<Vec<Option<String>>, RefineError> {
        Err(RefineError::Unavailable)
    }
}

impl<T: RoadSnapper + ?Sized> RoadSnapper for Arc<T> {
    fn snap_to_roads(&self, points: &[Coord<f64>]) -> Result<Vec<Option<Coord<f64>>>, RefineError> {
        (**self).snap_to_roads(points)
    }
}

impl<T: PlaceNamer + ?Sized> PlaceNamer for Arc<T> {
    fn name_places(&self, points: &[Coord<f64>]) -> Result<Vec<Option<String>>, RefineError> {
        (**self).name_places(points)
    }
}
