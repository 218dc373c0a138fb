use async_trait::async_trait;
use mindlock_core::model::{
    Course, CourseId, ExamRecord, Question, QuestionFilter, QuestionId, ValidatedQuestion,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted exam record with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamRecordRow {
    pub id: i64,
    pub record: ExamRecord,
}

/// Repository contract for questions.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// List questions matching the filter, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError>;

    /// Fetch a question by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError>;

    /// Insert a validated question and return it with its new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError>;

    /// Store a fully-formed question under its existing id (imports, seeding).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken.
    async fn put_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Replace an existing question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Delete a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError>;

    /// Number of questions that belong to the course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_questions(&self, course_id: &CourseId) -> Result<u32, StorageError>;
}

/// Repository contract for courses.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// List courses ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError>;

    /// Fetch a course by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError>;

    /// Persist or update a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Delete a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the course does not exist.
    async fn delete_course(&self, id: &CourseId) -> Result<(), StorageError>;
}

/// Append-only log of submitted exams.
#[async_trait]
pub trait ExamRecordRepository: Send + Sync {
    /// Store a submitted exam and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_record(&self, record: &ExamRecord) -> Result<i64, StorageError>;

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_record(&self, id: i64) -> Result<ExamRecord, StorageError>;

    /// Most recently submitted records first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_records(&self, limit: u32) -> Result<Vec<ExamRecordRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<HashMap<QuestionId, Question>>>,
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    records: Arc<Mutex<Vec<ExamRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let mut found: Vec<Question> = guard
            .values()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(found)
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let id = QuestionId::generate();
        if guard.contains_key(&id) {
            return Err(StorageError::Conflict);
        }
        let question = question.assign_id(id.clone());
        guard.insert(id, question.clone());
        Ok(question)
    }

    async fn put_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        if guard.contains_key(&question.id) {
            return Err(StorageError::Conflict);
        }
        guard.insert(question.id.clone(), question.clone());
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        match guard.get_mut(&question.id) {
            Some(slot) => {
                *slot = question.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.remove(id).map(|_| ()).ok_or(StorageError::NotFound)
    }

    async fn count_questions(&self, course_id: &CourseId) -> Result<u32, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let count = guard.values().filter(|q| &q.course_id == course_id).count();
        u32::try_from(count).map_err(|_| StorageError::Serialization("question count overflow".into()))
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        let mut courses: Vec<Course> = guard.values().cloned().collect();
        courses.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(courses)
    }

    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>, StorageError> {
        let guard = self.courses.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        guard.insert(course.id().clone(), course.clone());
        Ok(())
    }

    async fn delete_course(&self, id: &CourseId) -> Result<(), StorageError> {
        let mut guard = self.courses.lock().map_err(poisoned)?;
        guard.remove(id).map(|_| ()).ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ExamRecordRepository for InMemoryRepository {
    async fn append_record(&self, record: &ExamRecord) -> Result<i64, StorageError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        guard.push(record.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("record id overflow".into()))
    }

    async fn get_record(&self, id: i64) -> Result<ExamRecord, StorageError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let index = usize::try_from(id - 1).map_err(|_| StorageError::NotFound)?;
        guard.get(index).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_records(&self, limit: u32) -> Result<Vec<ExamRecordRow>, StorageError> {
        let guard = self.records.lock().map_err(poisoned)?;
        let mut rows = guard
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let id = i64::try_from(index + 1)
                    .map_err(|_| StorageError::Serialization("record id overflow".into()))?;
                Ok(ExamRecordRow {
                    id,
                    record: record.clone(),
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        drop(guard);

        // Same order as the SQLite listing.
        rows.sort_by(|a, b| {
            b.record
                .submitted_at()
                .cmp(&a.record.submitted_at())
                .then_with(|| b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub exam_records: Arc<dyn ExamRecordRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    /// Wrap an existing in-memory repository (e.g. one pre-filled by a test).
    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let exam_records: Arc<dyn ExamRecordRepository> = Arc::new(repo);
        Self {
            questions,
            courses,
            exam_records,
        }
    }
}
