//! Great-circle geometry on WGS84 coordinates.
//!
//! Coordinates follow the `geo` convention used across the engine:
//! `x = longitude` and `y = latitude`, both in degrees. Every distance is in
//! metres on a sphere of radius [`EARTH_RADIUS_METERS`].
//!
//! Callers validate coordinates with [`validate_coordinate`] before handing
//! them to the distance helpers; out-of-range values are rejected, never
//! wrapped or clamped.

use geo::{Coord, Intersects, Rect};
use thiserror::Error;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Smallest cosine of latitude used when scaling longitude offsets.
const MIN_LATITUDE_COSINE: f64 = 1e-9;

/// Errors returned by [`validate_coordinate`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    /// Latitude or longitude was NaN or infinite.
    #[error("coordinate components must be finite numbers")]
    NotFinite,
    /// Latitude fell outside `[-90, 90]`.
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    /// Longitude fell outside `[-180, 180]`.
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Check that a coordinate lies inside the WGS84 ranges.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::geometry::{CoordinateError, validate_coordinate};
///
/// assert!(validate_coordinate(Coord { x: 14.42, y: 50.08 }).is_ok());
/// assert_eq!(
///     validate_coordinate(Coord { x: 0.0, y: 91.0 }),
///     Err(CoordinateError::LatitudeOutOfRange(91.0))
/// );
/// ```
pub fn validate_coordinate(coord: Coord<f64>) -> Result<Coord<f64>, CoordinateError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(CoordinateError::NotFinite);
    }
    if !(-90.0..=90.0).contains(&coord.y) {
        return Err(CoordinateError::LatitudeOutOfRange(coord.y));
    }
    if !(-180.0..=180.0).contains(&coord.x) {
        return Err(CoordinateError::LongitudeOutOfRange(coord.x));
    }
    Ok(coord)
}

/// Haversine distance in metres between two coordinates.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::geometry::distance_meters;
///
/// let prague = Coord { x: 14.4378, y: 50.0755 };
/// let brno = Coord { x: 16.6068, y: 49.1951 };
/// let metres = distance_meters(prague, brno);
/// assert!((metres - 185_000.0).abs() < 5_000.0);
/// ```
#[must_use]
pub fn distance_meters(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let d_lat = (b.y - a.y).to_radians();
    let d_lng = (b.x - a.x).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Minimum distance in metres from `point` to the segment `start`-`end`.
///
/// The point is projected onto the segment in a local tangent plane centred
/// on `point`; the projection is clamped to the segment so the result is the
/// perpendicular distance when the foot lies inside the segment and the
/// endpoint distance otherwise. A degenerate segment (`start == end`) falls
/// back to [`distance_meters`].
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::geometry::distance_point_to_segment;
///
/// let above = Coord { x: 0.0, y: 0.001 };
/// let metres = distance_point_to_segment(
///     above,
///     Coord { x: -0.01, y: 0.0 },
///     Coord { x: 0.01, y: 0.0 },
/// );
/// assert!((metres - 111.19).abs() < 0.5);
/// ```
#[must_use]
pub fn distance_point_to_segment(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    if start == end {
        return distance_meters(point, start);
    }

    let a = local_offset_meters(point, start);
    let b = local_offset_meters(point, end);
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let length_sq = dx * dx + dy * dy;
    if length_sq <= f64::EPSILON {
        return distance_meters(point, start);
    }

    // The origin of the local plane is `point`, so the foot parameter is the
    // projection of `-a` onto the segment direction.
    let t = (-(a.x * dx + a.y * dy) / length_sq).clamp(0.0, 1.0);
    if t <= 0.0 {
        return distance_meters(point, start);
    }
    if t >= 1.0 {
        return distance_meters(point, end);
    }

    let foot = offset_to_coord(
        point,
        Coord {
            x: a.x + t * dx,
            y: a.y + t * dy,
        },
    );
    distance_meters(point, foot)
}

/// Minimum distance in metres from `point` to any segment of `polyline`.
///
/// Returns `None` for an empty polyline. A single-vertex polyline yields the
/// point distance to that vertex.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::geometry::distance_point_to_polyline;
///
/// let line = [
///     Coord { x: 0.0, y: 0.0 },
///     Coord { x: 0.01, y: 0.0 },
///     Coord { x: 0.01, y: 0.01 },
/// ];
/// let metres = distance_point_to_polyline(Coord { x: 0.011, y: 0.005 }, &line);
/// assert!(metres.is_some_and(|d| d < 112.0));
/// assert!(distance_point_to_polyline(Coord { x: 0.0, y: 0.0 }, &[]).is_none());
/// ```
#[must_use]
pub fn distance_point_to_polyline(point: Coord<f64>, polyline: &[Coord<f64>]) -> Option<f64> {
    match polyline {
        [] => None,
        [only] => Some(distance_meters(point, *only)),
        _ => polyline
            .windows(2)
            .filter_map(|pair| match pair {
                [start, end] => Some(distance_point_to_segment(point, *start, *end)),
                _ => None,
            })
            .reduce(f64::min),
    }
}

/// Initial great-circle bearing from `from` to `to` in degrees `[0, 360)`.
///
/// North is `0`, east is `90`. Identical points yield `0`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use schoolrun_core::geometry::bearing_degrees;
///
/// let origin = Coord { x: 0.0, y: 0.0 };
/// let east = bearing_degrees(origin, Coord { x: 0.01, y: 0.0 });
/// assert!((east - 90.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn bearing_degrees(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();
    let d_lng = (to.x - from.x).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    if x == 0.0 && y == 0.0 {
        return 0.0;
    }
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // Tiny negative angles round up to exactly 360.
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Degree-space rectangle guaranteed to contain every point within
/// `radius_meters` of `center`.
///
/// The rectangle is a prefilter: callers confirm membership with
/// [`distance_meters`]. Near the poles or across the antimeridian the
/// rectangle widens to the full longitude range.
#[must_use]
pub fn bounding_box_around(center: Coord<f64>, radius_meters: f64) -> Rect<f64> {
    let per_degree = meters_per_degree();
    let lat_delta = radius_meters / per_degree;
    let min_lat = (center.y - lat_delta).max(-90.0);
    let max_lat = (center.y + lat_delta).min(90.0);

    let widest_cos = min_lat
        .to_radians()
        .cos()
        .min(max_lat.to_radians().cos())
        .max(MIN_LATITUDE_COSINE);
    let lng_delta = radius_meters / (per_degree * widest_cos);

    let (min_lng, max_lng) =
        if lng_delta >= 180.0 || center.x - lng_delta < -180.0 || center.x + lng_delta > 180.0 {
            (-180.0, 180.0)
        } else {
            (center.x - lng_delta, center.x + lng_delta)
        };

    Rect::new(
        Coord {
            x: min_lng,
            y: min_lat,
        },
        Coord {
            x: max_lng,
            y: max_lat,
        },
    )
}

/// Whether `point` lies inside or on the boundary of `rect`.
#[must_use]
pub fn within_bounding_box(rect: &Rect<f64>, point: Coord<f64>) -> bool {
    // `Intersects` treats boundary points as inside the rectangle.
    rect.intersects(&point)
}

/// Whether `point` is at most `radius_meters` from `center`.
#[must_use]
pub fn within_radius(center: Coord<f64>, point: Coord<f64>, radius_meters: f64) -> bool {
    distance_meters(center, point) <= radius_meters
}

/// Whether `point` lies within `width_meters` of `polyline`.
///
/// An empty polyline defines no corridor, so nothing lies within it.
#[must_use]
pub fn within_corridor(point: Coord<f64>, polyline: &[Coord<f64>], width_meters: f64) -> bool {
    distance_point_to_polyline(point, polyline).is_some_and(|distance| distance <= width_meters)
}

/// Offset of `point` from `origin` in metres on a local tangent plane.
///
/// The returned coordinate holds the eastward offset in `x` and the
/// northward offset in `y`. The approximation is accurate for the
/// few-kilometre spans the engine works with.
#[must_use]
pub fn local_offset_meters(origin: Coord<f64>, point: Coord<f64>) -> Coord<f64> {
    let per_degree = meters_per_degree();
    let d_lng = (point.x - origin.x + 180.0).rem_euclid(360.0) - 180.0;
    Coord {
        x: d_lng * per_degree * origin.y.to_radians().cos(),
        y: (point.y - origin.y) * per_degree,
    }
}

/// Inverse of [`local_offset_meters`].
#[must_use]
pub fn offset_to_coord(origin: Coord<f64>, offset: Coord<f64>) -> Coord<f64> {
    let per_degree = meters_per_degree();
    let cos_lat = origin.y.to_radians().cos().max(MIN_LATITUDE_COSINE);
    Coord {
        x: origin.x + offset.x / (per_degree * cos_lat),
        y: origin.y + offset.y / per_degree,
    }
}

fn meters_per_degree() -> f64 {
    EARTH_RADIUS_METERS * 1.0_f64.to_radians()
}
