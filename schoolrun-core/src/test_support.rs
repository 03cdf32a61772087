//! Deterministic fixtures shared by unit, behaviour and property tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use geo::Coord;

use crate::{
    PlaceNamer, RefineError, RoadSnapper, Student, StudentRepository, StudentRepositoryError,
    geometry::offset_to_coord,
};

/// In-memory `StudentRepository` returning a fixed roster.
#[derive(Debug, Default, Clone)]
pub struct MemoryStudentRepository {
    students: Vec<Student>,
}

impl MemoryStudentRepository {
    /// Repository holding `students`.
    #[must_use]
    pub fn with_students<I>(students: I) -> Self
    where
        I: IntoIterator<Item = Student>,
    {
        Self {
            students: students.into_iter().collect(),
        }
    }
}

impl StudentRepository for MemoryStudentRepository {
    fn load_students(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        Ok(self.students.clone())
    }
}

/// Snapper that shifts every point by a fixed offset in metres, or fails.
#[derive(Debug)]
pub struct ScriptedSnapper {
    outcome: Result<Coord<f64>, RefineError>,
    calls: AtomicUsize,
}

impl ScriptedSnapper {
    /// Snap every point `east`/`north` metres away.
    #[must_use]
    pub const fn shifting(east: f64, north: f64) -> Self {
        Self {
            outcome: Ok(Coord { x: east, y: north }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call with `error`.
    #[must_use]
    pub const fn failing(error: RefineError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of batches received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl RoadSnapper for ScriptedSnapper {
    fn snap_to_roads(&self, points: &[Coord<f64>]) -> Result<Vec<Option<Coord<f64>>>, RefineError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let offset = self.outcome.clone()?;
        Ok(points
            .iter()
            .map(|point| Some(offset_to_coord(*point, offset)))
            .collect())
    }
}

/// Namer returning `"{prefix} {n}"` per point, or failing.
#[derive(Debug)]
pub struct ScriptedNamer {
    outcome: Result<String, RefineError>,
}

impl ScriptedNamer {
    /// Name points `"{prefix} 1"`, `"{prefix} 2"` and so on.
    #[must_use]
    pub fn numbered(prefix: impl Into<String>) -> Self {
        Self {
            outcome: Ok(prefix.into()),
        }
    }

    /// Fail every call with `error`.
    #[must_use]
    pub const fn failing(error: RefineError) -> Self {
        Self { outcome: Err(error) }
    }
}

impl PlaceNamer for ScriptedNamer {
    fn name_places(&self, points: &[Coord<f64>]) -> Result<Vec<Option<String>>, RefineError> {
        let prefix = self.outcome.clone()?;
        Ok((1..=points.len())
            .map(|n| Some(format!("{prefix} {n}")))
            .collect())
    }
}

/// `count` students on a sunflower spiral within `radius_meters` of `center`.
///
/// The layout is deterministic and spreads points evenly over the disc.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "fixture sizes are small")]
pub fn students_around(center: Coord<f64>, count: usize, radius_meters: f64, first_id: u64) -> Vec<Student> {
    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..count)
        .map(|i| {
            let r = radius_meters * ((i as f64 + 0.5) / count as f64).sqrt();
            let theta = i as f64 * golden_angle;
            let home = offset_to_coord(
                center,
                Coord {
                    x: r * theta.cos(),
                    y: r * theta.sin(),
                },
            );
            Student::new(first_id + i as u64, home.y, home.x)
        })
        .collect()
}

/// `rows` x `cols` students on a square grid with `spacing_meters` pitch,
/// centred on `center`.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "fixture sizes are small")]
pub fn student_grid(center: Coord<f64>, rows: usize, cols: usize, spacing_meters: f64) -> Vec<Student> {
    let row_offset = (rows as f64 - 1.0) / 2.0;
    let col_offset = (cols as f64 - 1.0) / 2.0;
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .enumerate()
        .map(|(index, (row, col))| {
            let home = offset_to_coord(
                center,
                Coord {
                    x: (col as f64 - col_offset) * spacing_meters,
                    y: (row as f64 - row_offset) * spacing_meters,
                },
            );
            Student::new(index as u64 + 1, home.y, home.x)
        })
        .collect()
}
