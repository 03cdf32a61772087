//! Read-only access to the student roster.

use thiserror::Error;

use crate::Student;

/// Errors raised while loading students.
#[derive(Debug, Error)]
pub enum StudentRepositoryError {
    /// No student source is configured.
    #[error("no student source is configured; supply students inline")]
    NotConfigured,
    /// The backing source could not be read.
    #[error("failed to read students from {source_name}: {message}")]
    Read {
        /// Source description, e.g. a file path.
        source_name: String,
        /// Underlying error detail.
        message: String,
    },
    /// The backing source held malformed records.
    #[error("malformed student data in {source_name}: {message}")]
    Malformed {
        /// Source description, e.g. a file path.
        source_name: String,
        /// Decoder detail.
        message: String,
    },
}

/// Supplies the student snapshot for calls that do not pass students inline.
///
/// Implementations return every student, including ones with invalid
/// coordinates; the engine reports those instead of dropping them.
pub trait StudentRepository: Send + Sync {
    /// Load a snapshot of all students.
    fn load_students(&self) -> Result<Vec<Student>, StudentRepositoryError>;
}

/// Repository for engines that only accept inline students.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStudentSource;

impl StudentRepository for NoStudentSource {
    fn load_students(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        Err(StudentRepositoryError::NotConfigured)
    }
}

impl<T: StudentRepository + ?Sized> StudentRepository for Box<T> {
    fn load_students(&self) -> Result<Vec<Student>, StudentRepositoryError> {
        (**self).load_students()
    }
}
