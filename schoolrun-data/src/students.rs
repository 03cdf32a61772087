//! JSON file backed student roster.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use schoolrun_core::{Student, StudentRepository, StudentRepositoryError};
use serde::Deserialize;

/// Reads the student snapshot from a JSON file on every call.
///
/// The file holds either a bare array of students or an object with a
/// `students` array:
///
/// ```json
/// {"students": [{"id": 1, "lat": 50.08, "lng": 14.42, "address": "Na Prikope 1"}]}
/// ```
///
/// # Examples
/// ```no_run
/// use schoolrun_core::StudentRepository;
/// use schoolrun_data::JsonStudentRepository;
///
/// let repository = JsonStudentRepository::new("roster.json");
/// let students = repository.load_students()?;
/// # Ok::<(), schoolrun_core::StudentRepositoryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonStudentRepository {
    path: Utf8PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RosterFile {
    Bare(Vec<Student>),
    Wrapped { students: Vec<Student> },
}

impl RosterFile {
    fn into_students(self) -> Vec<Student> {
        match self {
            Self::Bare(students) | Self::Wrapped { students } => students,
        }
    }
}

impl JsonStudentRepository {
    /// Repository reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the roster file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl StudentRepository for JsonStudentRepository {
    fn load_students(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        let text =
            schoolrun_fs::read_to_string(&self.path).map_err(|err| StudentRepositoryError::Read {
                source_name: self.path.to_string(),
                message: err.to_string(),
            })?;
        let roster: RosterFile =
            serde_json::from_str(&text).map_err(|err| StudentRepositoryError::Malformed {
                source_name: self.path.to_string(),
                message: err.to_string(),
            })?;
        let students = roster.into_students();
        debug!("loaded {} students from {}", students.len(), self.path);
        Ok(students)
    }
}
