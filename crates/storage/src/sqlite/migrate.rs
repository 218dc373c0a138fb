use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the full schema (courses, questions, exam records, and indexes).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS courses (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT,
                    question_count INTEGER NOT NULL CHECK (question_count >= 0),
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // Questions may point at a course that was never created; the list
        // views show those as "Unknown Course", so there is no foreign key.
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS questions (
                    id TEXT PRIMARY KEY,
                    course_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    difficulty TEXT NOT NULL
                        CHECK (difficulty IN ('easy', 'medium', 'hard', 'expert')),
                    tags TEXT NOT NULL,
                    question_types TEXT NOT NULL,
                    solution TEXT,
                    hints TEXT NOT NULL,
                    time_estimate_minutes INTEGER CHECK (time_estimate_minutes > 0),
                    image_url TEXT,
                    user_answer TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS exam_records (
                    id INTEGER PRIMARY KEY,
                    course_id TEXT NOT NULL,
                    difficulty TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    submitted_at TEXT NOT NULL,
                    budget_secs INTEGER NOT NULL CHECK (budget_secs >= 0),
                    elapsed_secs INTEGER NOT NULL CHECK (elapsed_secs >= 0),
                    reason TEXT NOT NULL,
                    question_ids TEXT NOT NULL,
                    answers TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_questions_course_difficulty
                    ON questions (course_id, difficulty);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_exam_records_submitted
                    ON exam_records (submitted_at);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied sqlite schema migration");
    }

    Ok(())
}
