use mindlock_core::model::ExamRecord;

use super::SqliteRepository;
use super::mapping::{conn, map_exam_record_row, ser, to_json, u64_to_i64};
use crate::repository::{ExamRecordRepository, ExamRecordRow, StorageError};

#[async_trait::async_trait]
impl ExamRecordRepository for SqliteRepository {
    async fn append_record(&self, record: &ExamRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO exam_records (
                    course_id, difficulty, started_at, submitted_at, budget_secs,
                    elapsed_secs, reason, question_ids, answers
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(record.course_id().as_str())
        .bind(record.difficulty().as_str())
        .bind(record.started_at())
        .bind(record.submitted_at())
        .bind(u64_to_i64("budget_secs", record.budget_secs())?)
        .bind(u64_to_i64("elapsed_secs", record.elapsed_secs())?)
        .bind(record.reason().as_str())
        .bind(to_json(record.question_ids())?)
        .bind(to_json(record.answers())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn get_record(&self, id: i64) -> Result<ExamRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, course_id, difficulty, started_at, submitted_at, budget_secs,
                       elapsed_secs, reason, question_ids, answers
                FROM exam_records
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_exam_record_row(&row)
    }

    async fn list_records(&self, limit: u32) -> Result<Vec<ExamRecordRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, course_id, difficulty, started_at, submitted_at, budget_secs,
                       elapsed_secs, reason, question_ids, answers
                FROM exam_records
                ORDER BY submitted_at DESC, id DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = sqlx::Row::try_get(&row, "id").map_err(ser)?;
            out.push(ExamRecordRow {
                id,
                record: map_exam_record_row(&row)?,
            });
        }
        Ok(out)
    }
}
