mod course;
mod difficulty;
mod exam_record;
mod filter;
mod ids;
mod question;
mod tag;

pub use ids::{CourseId, IdError, QuestionId};

pub use course::{Course, CourseDraft, CourseError};
pub use difficulty::{Difficulty, ParseDifficultyError};
pub use exam_record::{ExamRecord, ExamRecordError, SubmitReason};
pub use filter::{QuestionFilter, QuestionSort, SortDirection, SortField};
pub use question::{Question, QuestionDraft, QuestionError, QuestionPatch, ValidatedQuestion};
pub use tag::{TagError, TagName};
