//! Inbound parameters of the three optimisation operations.
//!
//! Parameter structs mirror the external JSON surface (snake_case field
//! names) and are validated into plans before any computation runs. Every
//! range violation is collected as a [`FieldError`]; nothing is clamped.

use std::{collections::HashSet, fmt};

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{LatLng, Stop, Student};

/// Upper bound for the walking radius in metres.
pub const MAX_WALK_RADIUS_METERS: f64 = 2_000.0;
/// Upper bound for students served by one stop.
pub const MAX_STUDENTS_PER_STOP: i64 = 100;
/// Upper bound for the stop-to-school distance in metres.
pub const MAX_DISTANCE_FROM_SCHOOL_METERS: f64 = 50_000.0;
/// Upper bound for bus capacity.
pub const MAX_BUS_CAPACITY: i64 = 100;

/// A single rejected parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Parameter path, e.g. `school_location.lat`.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field-level problem found in one parameter object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Error, Serialize)]
#[error("invalid parameters: {}", join_fields(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Record a rejected field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Whether no field was rejected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rejected fields in discovery order.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` was rejected.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Optional corridor restricting where stops may be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorParams {
    /// Corridor centre line.
    pub polyline: Vec<LatLng>,
    /// Maximum distance from the centre line in metres.
    #[serde(alias = "widthMeters")]
    pub width_meters: f64,
}

/// Parameters of `optimize_stops`.
///
/// # Examples
/// ```
/// use schoolrun_core::{LatLng, OptimizeStopsParams};
///
/// let params = OptimizeStopsParams::new(500.0, 25, LatLng::new(50.08, 14.42), 10_000.0);
/// let plan = params.validate().expect("valid parameters");
/// assert_eq!(plan.max_students_per_stop, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeStopsParams {
    /// Maximum walking distance in metres, `(0, 2000]`.
    pub r_walk: f64,
    /// Maximum students per stop, `(0, 100]`.
    pub s_max: i64,
    /// Optional cap on the number of stops.
    #[serde(default)]
    pub max_stops: Option<i64>,
    /// Snap candidate stops to the road network.
    #[serde(default)]
    pub use_roads_api: bool,
    /// Name stops after nearby places.
    #[serde(default)]
    pub use_places_api: bool,
    /// Inline students; the student repository is consulted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<Student>>,
    /// School coordinate.
    #[serde(default)]
    pub school_location: Option<LatLng>,
    /// Maximum stop-to-school distance in metres, `(0, 50000]`.
    pub max_distance_from_school: f64,
    /// Optional corridor filter for candidate stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corridor: Option<CorridorParams>,
}

impl OptimizeStopsParams {
    /// Parameters with the required fields set and every option off.
    #[must_use]
    pub const fn new(
        r_walk: f64,
        s_max: i64,
        school_location: LatLng,
        max_distance_from_school: f64,
    ) -> Self {
        Self {
            r_walk,
            s_max,
            max_stops: None,
            use_roads_api: false,
            use_places_api: false,
            students: None,
            school_location: Some(school_location),
            max_distance_from_school,
            corridor: None,
        }
    }

    /// Supply students inline instead of loading them from the repository.
    #[must_use]
    pub fn with_students(mut self, students: Vec<Student>) -> Self {
        self.students = Some(students);
        self
    }

    /// Cap the number of stops.
    #[must_use]
    pub const fn with_max_stops(mut self, max_stops: i64) -> Self {
        self.max_stops = Some(max_stops);
        self
    }

    /// Validate the parameters into a [`StopPlan`].
    pub fn validate(&self) -> Result<StopPlan, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let walk_radius_meters =
            check_distance(&mut errors, "r_walk", self.r_walk, MAX_WALK_RADIUS_METERS);
        let max_students_per_stop =
            check_count(&mut errors, "s_max", self.s_max, MAX_STUDENTS_PER_STOP);
        let max_distance_from_school = check_distance(
            &mut errors,
            "max_distance_from_school",
            self.max_distance_from_school,
            MAX_DISTANCE_FROM_SCHOOL_METERS,
        );
        let school = check_location(&mut errors, "school_location", self.school_location);

        let max_stops = match self.max_stops {
            None => None,
            Some(value) => match usize::try_from(value) {
                Ok(count) if count > 0 => Some(count),
                _ => {
                    errors.push("max_stops", "must be a positive integer");
                    None
                }
            },
        };

        let corridor = self
            .corridor
            .as_ref()
            .and_then(|corridor| check_corridor(&mut errors, corridor));

        errors.into_result(StopPlan {
            walk_radius_meters,
            max_students_per_stop,
            max_stops,
            school,
            max_distance_from_school,
            snap_to_roads: self.use_roads_api,
            name_places: self.use_places_api,
            corridor,
        })
    }
}

/// Parameters of `optimize_vrp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeVrpParams {
    /// Route start and end.
    #[serde(default)]
    pub depot: Option<LatLng>,
    /// Bus capacity, `(0, 100]`.
    pub capacity: i64,
    /// Split stops that overflow a route; defaults to enabled.
    #[serde(default)]
    pub split_virtual_nodes: Option<bool>,
    /// Stops to route, typically the output of stop placement.
    #[serde(default)]
    pub stops: Vec<Stop>,
}

impl OptimizeVrpParams {
    /// Parameters routing `stops` from `depot`.
    #[must_use]
    pub const fn new(depot: LatLng, capacity: i64, stops: Vec<Stop>) -> Self {
        Self {
            depot: Some(depot),
            capacity,
            split_virtual_nodes: None,
            stops,
        }
    }

    /// Enable or disable virtual-node splitting.
    #[must_use]
    pub const fn with_split_virtual_nodes(mut self, split: bool) -> Self {
        self.split_virtual_nodes = Some(split);
        self
    }

    /// Validate the parameters into a [`RoutePlan`].
    ///
    /// Stops are checked for valid coordinates, unique identifiers and
    /// students assigned to more than one stop.
    pub fn validate(&self) -> Result<RoutePlan, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let plan = check_route_plan(
            &mut errors,
            self.depot,
            self.capacity,
            self.split_virtual_nodes,
        );
        check_stops(&mut errors, &self.stops);
        errors.into_result(plan)
    }
}

/// Parameters of `optimize_full`: stop placement plus routing.
///
/// The depot defaults to the school location when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeFullParams {
    /// Stop placement parameters.
    #[serde(flatten)]
    pub stops: OptimizeStopsParams,
    /// Route start and end; the school when absent.
    #[serde(default)]
    pub depot: Option<LatLng>,
    /// Bus capacity, `(0, 100]`.
    pub capacity: i64,
    /// Split stops that overflow a route; defaults to enabled.
    #[serde(default)]
    pub split_virtual_nodes: Option<bool>,
}

impl OptimizeFullParams {
    /// Combine stop placement parameters with a bus capacity.
    #[must_use]
    pub const fn new(stops: OptimizeStopsParams, capacity: i64) -> Self {
        Self {
            stops,
            depot: None,
            capacity,
            split_virtual_nodes: None,
        }
    }

    /// Validate both halves, reporting every rejected field at once.
    pub fn validate(&self) -> Result<(StopPlan, RoutePlan), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let stop_plan = match self.stops.validate() {
            Ok(plan) => Some(plan),
            Err(stop_errors) => {
                errors.merge(stop_errors);
                None
            }
        };
        let depot = self.depot.or(self.stops.school_location);
        let route_plan = check_route_plan(&mut errors, depot, self.capacity, self.split_virtual_nodes);
        match stop_plan {
            Some(stop_plan) if errors.is_empty() => Ok((stop_plan, route_plan)),
            _ => Err(errors),
        }
    }
}

/// Validated stop placement parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StopPlan {
    /// Maximum walking distance in metres.
    pub walk_radius_meters: f64,
    /// Maximum students per stop.
    pub max_students_per_stop: usize,
    /// Optional cap on the number of stops.
    pub max_stops: Option<usize>,
    /// School coordinate.
    pub school: Coord<f64>,
    /// Maximum stop-to-school distance in metres.
    pub max_distance_from_school: f64,
    /// Whether to snap candidates to roads.
    pub snap_to_roads: bool,
    /// Whether to name stops after places.
    pub name_places: bool,
    /// Optional corridor filter.
    pub corridor: Option<Corridor>,
}

/// Validated corridor.
#[derive(Debug, Clone, PartialEq)]
pub struct Corridor {
    /// Centre line.
    pub polyline: Vec<Coord<f64>>,
    /// Half-width in metres.
    pub width_meters: f64,
}

/// Validated routing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePlan {
    /// Route start and end.
    pub depot: Coord<f64>,
    /// Bus capacity.
    pub capacity: usize,
    /// Whether overflowing stops are split.
    pub split_virtual_nodes: bool,
}

fn check_route_plan(
    errors: &mut ValidationErrors,
    depot: Option<LatLng>,
    capacity: i64,
    split: Option<bool>,
) -> RoutePlan {
    RoutePlan {
        depot: check_location(errors, "depot", depot),
        capacity: check_count(errors, "capacity", capacity, MAX_BUS_CAPACITY),
        split_virtual_nodes: split.unwrap_or(true),
    }
}

fn check_distance(errors: &mut ValidationErrors, field: &str, value: f64, max: f64) -> f64 {
    // Written so that NaN fails the check.
    if value > 0.0 && value <= max {
        value
    } else {
        errors.push(field, format!("must be in (0, {max}] metres, got {value}"));
        0.0
    }
}

fn check_count(errors: &mut ValidationErrors, field: &str, value: i64, max: i64) -> usize {
    match usize::try_from(value) {
        Ok(count) if value > 0 && value <= max => count,
        _ => {
            errors.push(field, format!("must be in (0, {max}], got {value}"));
            0
        }
    }
}

fn check_location(errors: &mut ValidationErrors, field: &str, value: Option<LatLng>) -> Coord<f64> {
    let Some(location) = value else {
        errors.push(field, "is required as {lat, lng}");
        return Coord::zero();
    };
    match location.validate() {
        Ok(coord) => coord,
        Err(err) => {
            errors.push(field, err.to_string());
            Coord::zero()
        }
    }
}

fn check_corridor(errors: &mut ValidationErrors, corridor: &CorridorParams) -> Option<Corridor> {
    let before = errors.fields().len();
    if corridor.polyline.is_empty() {
        errors.push("corridor.polyline", "must contain at least one point");
    }
    if !(corridor.width_meters > 0.0 && corridor.width_meters.is_finite()) {
        errors.push(
            "corridor.width_meters",
            format!("must be a positive distance, got {}", corridor.width_meters),
        );
    }
    let mut polyline = Vec::with_capacity(corridor.polyline.len());
    for (index, point) in corridor.polyline.iter().enumerate() {
        match point.validate() {
            Ok(coord) => polyline.push(coord),
            Err(err) => errors.push(format!("corridor.polyline[{index}]"), err.to_string()),
        }
    }
    (errors.fields().len() == before).then_some(Corridor {
        polyline,
        width_meters: corridor.width_meters,
    })
}

fn check_stops(errors: &mut ValidationErrors, stops: &[Stop]) {
    let mut stop_ids = HashSet::with_capacity(stops.len());
    let mut student_ids = HashSet::new();
    for (index, stop) in stops.iter().enumerate() {
        if let Err(err) = crate::geometry::validate_coordinate(stop.location()) {
            errors.push(format!("stops[{index}]"), err.to_string());
        }
        if !stop_ids.insert(stop.id) {
            errors.push(format!("stops[{index}].id"), format!("duplicate stop id {}", stop.id));
        }
        for student_id in &stop.assigned_student_ids {
            if !student_ids.insert(*student_id) {
                errors.push(
                    format!("stops[{index}].assigned_student_ids"),
                    format!("student {student_id} is assigned to more than one stop"),
                );
            }
        }
    }
}
