//! Shared error types for the services crate.

use thiserror::Error;

use mindlock_core::model::{
    CourseError, CourseId, ExamRecordError, IdError, ParseDifficultyError, QuestionError,
    QuestionId,
};
use storage::repository::StorageError;

/// Errors raised while turning exam setup input into an `ExamConfig`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("an exam needs a course")]
    MissingCourse,
    #[error("an exam needs a difficulty")]
    MissingDifficulty,
    #[error(transparent)]
    InvalidCourse(#[from] IdError),
    #[error(transparent)]
    InvalidDifficulty(#[from] ParseDifficultyError),
    #[error("exam duration must be between 1 and {max} minutes, got {minutes}")]
    DurationOutOfRange { minutes: u32, max: u32 },
}

/// Errors emitted by `QuestionService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionServiceError {
    #[error("question {0} not found")]
    NotFound(QuestionId),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error("course {0} not found")]
    NotFound(CourseId),
    #[error("course {id} still has {count} questions")]
    HasQuestions { id: CourseId, count: u32 },
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by exam orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Record(#[from] ExamRecordError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by study orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StudyError {
    #[error("question {0} not found")]
    NotFound(QuestionId),
    #[error("study session lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
