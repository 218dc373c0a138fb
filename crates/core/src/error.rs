use thiserror::Error;

use crate::model::{CourseError, ExamRecordError, IdError, QuestionError, TagError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    ExamRecord(#[from] ExamRecordError),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Tag(#[from] TagError),
}
