use std::collections::BTreeMap;

use mindlock_core::model::{
    Course, CourseId, Difficulty, ExamRecord, Question, QuestionId, SubmitReason, TagName,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use url::Url;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

fn from_json<T: DeserializeOwned>(field: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::Serialization(format!("invalid {field} json: {e}")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn parse_difficulty(s: &str) -> Result<Difficulty, StorageError> {
    s.parse::<Difficulty>().map_err(ser)
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = QuestionId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?;
    let course_id =
        CourseId::new(row.try_get::<String, _>("course_id").map_err(ser)?).map_err(ser)?;
    let difficulty = parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?;

    let tags: Vec<TagName> = from_json("tags", &row.try_get::<String, _>("tags").map_err(ser)?)?;
    let question_types: Vec<String> = from_json(
        "question_types",
        &row.try_get::<String, _>("question_types").map_err(ser)?,
    )?;
    let hints: Vec<String> = from_json("hints", &row.try_get::<String, _>("hints").map_err(ser)?)?;

    let time_estimate_minutes = row
        .try_get::<Option<i64>, _>("time_estimate_minutes")
        .map_err(ser)?
        .map(|v| u32_from_i64("time_estimate_minutes", v))
        .transpose()?;

    let image_url = row
        .try_get::<Option<String>, _>("image_url")
        .map_err(ser)?
        .map(|raw| Url::parse(&raw).map_err(ser))
        .transpose()?;

    Ok(Question {
        id,
        course_id,
        title: row.try_get("title").map_err(ser)?,
        content: row.try_get("content").map_err(ser)?,
        difficulty,
        tags,
        question_types,
        solution: row.try_get("solution").map_err(ser)?,
        hints,
        time_estimate_minutes,
        image_url,
        user_answer: row.try_get("user_answer").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_course_row(row: &SqliteRow) -> Result<Course, StorageError> {
    Course::from_persisted(
        CourseId::new(row.try_get::<String, _>("id").map_err(ser)?).map_err(ser)?,
        row.try_get("name").map_err(ser)?,
        row.try_get("description").map_err(ser)?,
        u32_from_i64(
            "question_count",
            row.try_get::<i64, _>("question_count").map_err(ser)?,
        )?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_exam_record_row(row: &SqliteRow) -> Result<ExamRecord, StorageError> {
    let reason_raw: String = row.try_get("reason").map_err(ser)?;
    let reason = SubmitReason::parse(&reason_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid reason: {reason_raw}")))?;
    let question_ids: Vec<QuestionId> = from_json(
        "question_ids",
        &row.try_get::<String, _>("question_ids").map_err(ser)?,
    )?;
    let answers: BTreeMap<QuestionId, String> =
        from_json("answers", &row.try_get::<String, _>("answers").map_err(ser)?)?;

    ExamRecord::new(
        CourseId::new(row.try_get::<String, _>("course_id").map_err(ser)?).map_err(ser)?,
        parse_difficulty(&row.try_get::<String, _>("difficulty").map_err(ser)?)?,
        row.try_get("started_at").map_err(ser)?,
        row.try_get("submitted_at").map_err(ser)?,
        u64_from_i64("budget_secs", row.try_get::<i64, _>("budget_secs").map_err(ser)?)?,
        u64_from_i64("elapsed_secs", row.try_get::<i64, _>("elapsed_secs").map_err(ser)?)?,
        reason,
        question_ids,
        answers,
    )
    .map_err(ser)
}
