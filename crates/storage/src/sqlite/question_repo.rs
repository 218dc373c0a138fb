use mindlock_core::model::{CourseId, Question, QuestionFilter, QuestionId, ValidatedQuestion};

use super::SqliteRepository;
use super::mapping::{conn, map_question_row, to_json};
use crate::repository::{QuestionRepository, StorageError};

const QUESTION_COLUMNS: &str = r"
    id, course_id, title, content, difficulty, tags, question_types, solution,
    hints, time_estimate_minutes, image_url, user_answer, created_at, updated_at
";

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        // Course and difficulty narrow in SQL; tags and free-text search are
        // matched on the decoded rows.
        let sql = format!(
            r"
            SELECT {QUESTION_COLUMNS}
            FROM questions
            WHERE (?1 IS NULL OR course_id = ?1)
              AND (?2 IS NULL OR difficulty = ?2)
            ORDER BY created_at ASC, id ASC
            "
        );
        let rows = sqlx::query(&sql)
            .bind(filter.course.as_ref().map(|c| c.as_str().to_owned()))
            .bind(filter.difficulty.map(|d| d.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            let question = map_question_row(&row)?;
            if filter.matches(&question) {
                questions.push(question);
            }
        }
        Ok(questions)
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let question = question.assign_id(QuestionId::generate());
        self.put_question(&question).await?;
        Ok(question)
    }

    async fn put_question(&self, question: &Question) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO questions (
                id, course_id, title, content, difficulty, tags, question_types, solution,
                hints, time_estimate_minutes, image_url, user_answer, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(question.id.as_str())
        .bind(question.course_id.as_str())
        .bind(&question.title)
        .bind(&question.content)
        .bind(question.difficulty.as_str())
        .bind(to_json(&question.tags)?)
        .bind(to_json(&question.question_types)?)
        .bind(question.solution.as_deref())
        .bind(to_json(&question.hints)?)
        .bind(question.time_estimate_minutes.map(i64::from))
        .bind(question.image_url.as_ref().map(|u| u.as_str().to_owned()))
        .bind(question.user_answer.as_deref())
        .bind(question.created_at)
        .bind(question.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE questions SET
                course_id = ?2,
                title = ?3,
                content = ?4,
                difficulty = ?5,
                tags = ?6,
                question_types = ?7,
                solution = ?8,
                hints = ?9,
                time_estimate_minutes = ?10,
                image_url = ?11,
                user_answer = ?12,
                updated_at = ?13
            WHERE id = ?1
            ",
        )
        .bind(question.id.as_str())
        .bind(question.course_id.as_str())
        .bind(&question.title)
        .bind(&question.content)
        .bind(question.difficulty.as_str())
        .bind(to_json(&question.tags)?)
        .bind(to_json(&question.question_types)?)
        .bind(question.solution.as_deref())
        .bind(to_json(&question.hints)?)
        .bind(question.time_estimate_minutes.map(i64::from))
        .bind(question.image_url.as_ref().map(|u| u.as_str().to_owned()))
        .bind(question.user_answer.as_deref())
        .bind(question.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn count_questions(&self, course_id: &CourseId) -> Result<u32, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE course_id = ?1")
            .bind(course_id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization(format!("invalid question count: {count}")))
    }
}
