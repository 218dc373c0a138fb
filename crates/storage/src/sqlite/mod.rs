//! `SQLite` backend for the question bank, courses and exam history.
//!
//! One `SqliteRepository` implements all three repository traits over a
//! shared pool. The schema lives in [`migrate`] and is applied by
//! [`SqliteRepository::migrate`] or [`Storage::sqlite`].
//!
//! In-memory URLs get special pool handling: a private `sqlite::memory:`
//! database exists only inside the connection that created it, so the pool is
//! pinned to a single connection that never expires. Shared-cache memory
//! databases (`file:name?mode=memory&cache=shared`) keep one connection open
//! for the pool's lifetime.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{CourseRepository, ExamRecordRepository, QuestionRepository, Storage};

mod course_repo;
mod exam_record_repo;
mod mapping;
mod migrate;
mod question_repo;

/// Pool sizing and lock waiting for a MindLock database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 4,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Where the database lives, as far as pooling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Residence {
    File,
    SharedMemory,
    PrivateMemory,
}

impl Residence {
    fn of(database_url: &str) -> Self {
        let url = database_url.trim();
        let in_memory = url == "sqlite::memory:"
            || url.ends_with(":memory:")
            || url.contains("mode=memory");
        if !in_memory {
            Self::File
        } else if url.contains("cache=shared") {
            Self::SharedMemory
        } else {
            Self::PrivateMemory
        }
    }
}

impl SqliteRepository {
    /// Connect with [`PoolSettings::default`].
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is malformed or the database
    /// cannot be opened.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        Self::connect_with(database_url, PoolSettings::default()).await
    }

    /// Connect to the database at `database_url`, creating the file if needed.
    ///
    /// Every connection enforces foreign keys and waits `busy_timeout` on
    /// locks. File databases use WAL journaling.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is malformed or the database
    /// cannot be opened.
    pub async fn connect_with(
        database_url: &str,
        settings: PoolSettings,
    ) -> Result<Self, SqliteInitError> {
        let residence = Residence::of(database_url);
        let mut options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(settings.busy_timeout);
        if residence == Residence::File {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .acquire_timeout(settings.acquire_timeout);
        match residence {
            Residence::File => {}
            Residence::SharedMemory => {
                pool = pool
                    .min_connections(1)
                    .idle_timeout(None::<Duration>)
                    .max_lifetime(None::<Duration>);
            }
            Residence::PrivateMemory => {
                pool = pool
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None::<Duration>)
                    .max_lifetime(None::<Duration>);
            }
        }

        let pool = pool.connect_with(options).await?;
        tracing::debug!(database_url, ?residence, "mindlock database opened");
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bring the schema up to date. Safe to call on every start.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration query fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Open and migrate a MindLock database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the database cannot be opened or migrated.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self::from_sqlite(repo))
    }

    /// Wrap a connected repository. The caller is responsible for migrating.
    #[must_use]
    pub fn from_sqlite(repo: SqliteRepository) -> Self {
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
