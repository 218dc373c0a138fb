use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CourseId, Difficulty, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamRecordError {
    #[error("submitted_at is before started_at")]
    InvalidTimeRange,

    #[error("elapsed time ({elapsed}s) exceeds the exam budget ({budget}s)")]
    ElapsedOverBudget { elapsed: u64, budget: u64 },

    #[error("answer recorded for question {0} which is not part of the exam")]
    UnknownQuestion(QuestionId),
}

/// Why an exam ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    Manual,
    TimeExpired,
}

impl SubmitReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SubmitReason::Manual => "manual",
            SubmitReason::TimeExpired => "time_expired",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "manual" => Some(SubmitReason::Manual),
            "time_expired" => Some(SubmitReason::TimeExpired),
            _ => None,
        }
    }
}

/// Outcome of a submitted exam, handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamRecord {
    course_id: CourseId,
    difficulty: Difficulty,
    started_at: DateTime<Utc>,
    submitted_at: DateTime<Utc>,
    budget_secs: u64,
    elapsed_secs: u64,
    reason: SubmitReason,
    question_ids: Vec<QuestionId>,
    answers: BTreeMap<QuestionId, String>,
}

impl ExamRecord {
    /// Build a record, checking that timestamps, elapsed time and answers line up.
    ///
    /// # Errors
    ///
    /// Returns `ExamRecordError` when the parts are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        course_id: CourseId,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
        budget_secs: u64,
        elapsed_secs: u64,
        reason: SubmitReason,
        question_ids: Vec<QuestionId>,
        answers: BTreeMap<QuestionId, String>,
    ) -> Result<Self, ExamRecordError> {
        if submitted_at < started_at {
            return Err(ExamRecordError::InvalidTimeRange);
        }
        if budget_secs > 0 && elapsed_secs > budget_secs {
            return Err(ExamRecordError::ElapsedOverBudget {
                elapsed: elapsed_secs,
                budget: budget_secs,
            });
        }
        if let Some(stray) = answers.keys().find(|id| !question_ids.contains(id)) {
            return Err(ExamRecordError::UnknownQuestion(stray.clone()));
        }

        Ok(Self {
            course_id,
            difficulty,
            started_at,
            submitted_at,
            budget_secs,
            elapsed_secs,
            reason,
            question_ids,
            answers,
        })
    }

    #[must_use]
    pub fn course_id(&self) -> &CourseId {
        &self.course_id
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    #[must_use]
    pub fn budget_secs(&self) -> u64 {
        self.budget_secs
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn reason(&self) -> SubmitReason {
        self.reason
    }

    #[must_use]
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.question_ids
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, String> {
        &self.answers
    }

    /// Questions with a non-blank answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| !a.trim().is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn qid(raw: &str) -> QuestionId {
        QuestionId::new(raw).unwrap()
    }

    #[test]
    fn record_rejects_answers_for_foreign_questions() {
        let mut answers = BTreeMap::new();
        answers.insert(qid("9"), "stray".to_string());
        let err = ExamRecord::new(
            CourseId::new("algo").unwrap(),
            Difficulty::Hard,
            fixed_now(),
            fixed_now(),
            60,
            10,
            SubmitReason::Manual,
            vec![qid("1")],
            answers,
        )
        .unwrap_err();
        assert_eq!(err, ExamRecordError::UnknownQuestion(qid("9")));
    }

    #[test]
    fn record_counts_non_blank_answers() {
        let mut answers = BTreeMap::new();
        answers.insert(qid("1"), "O(log n)".to_string());
        answers.insert(qid("2"), "   ".to_string());
        let record = ExamRecord::new(
            CourseId::new("algo").unwrap(),
            Difficulty::Hard,
            fixed_now(),
            fixed_now() + chrono::Duration::seconds(60),
            60,
            60,
            SubmitReason::TimeExpired,
            vec![qid("1"), qid("2")],
            answers,
        )
        .unwrap();
        assert_eq!(record.answered_count(), 1);
        assert_eq!(SubmitReason::parse(record.reason().as_str()), Some(SubmitReason::TimeExpired));
    }

    #[test]
    fn record_rejects_inverted_time_range() {
        let err = ExamRecord::new(
            CourseId::new("algo").unwrap(),
            Difficulty::Easy,
            fixed_now(),
            fixed_now() - chrono::Duration::seconds(1),
            60,
            0,
            SubmitReason::Manual,
            Vec::new(),
            BTreeMap::new(),
        )
        .unwrap_err();
        assert_eq!(err, ExamRecordError::InvalidTimeRange);
    }
}
