#![forbid(unsafe_code)]

pub mod repository;
pub mod seed;
pub mod sqlite;

pub use repository::{
    CourseRepository, ExamRecordRepository, ExamRecordRow, InMemoryRepository, QuestionRepository,
    Storage, StorageError,
};
pub use seed::{SeedError, SeedReport, seed_sample_data};
