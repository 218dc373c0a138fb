use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

use crate::model::{CourseId, Difficulty, QuestionId, TagName};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question title cannot be empty")]
    EmptyTitle,

    #[error("question content cannot be empty")]
    EmptyContent,

    #[error("time estimate must be > 0 minutes")]
    InvalidTimeEstimate,

    #[error("invalid image url `{raw}`: {reason}")]
    InvalidImageUrl { raw: String, reason: String },
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// User-entered question fields before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tags: Vec<TagName>,
    pub question_types: Vec<String>,
    pub solution: Option<String>,
    pub hints: Vec<String>,
    pub time_estimate_minutes: Option<u32>,
    pub image_url: Option<String>,
}

impl QuestionDraft {
    /// Draft with only the required fields set.
    #[must_use]
    pub fn new(
        course_id: CourseId,
        title: impl Into<String>,
        content: impl Into<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            course_id,
            title: title.into(),
            content: content.into(),
            difficulty,
            tags: Vec::new(),
            question_types: Vec::new(),
            solution: None,
            hints: Vec::new(),
            time_estimate_minutes: None,
            image_url: None,
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<TagName>) -> Self {
        self.tags = tags;
        self
    }

    #[must_use]
    pub fn with_time_estimate(mut self, minutes: u32) -> Self {
        self.time_estimate_minutes = Some(minutes);
        self
    }

    /// Validate the draft, stamping both timestamps with `now`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when a field fails validation.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedQuestion, QuestionError> {
        let title = required_text(self.title, QuestionError::EmptyTitle)?;
        let content = required_text(self.content, QuestionError::EmptyContent)?;
        validate_time_estimate(self.time_estimate_minutes)?;
        let image_url = self.image_url.as_deref().map(parse_image_url).transpose()?;

        Ok(ValidatedQuestion {
            course_id: self.course_id,
            title,
            content,
            difficulty: self.difficulty,
            tags: dedup_tags(self.tags),
            question_types: self.question_types,
            solution: normalize_optional(self.solution),
            hints: clean_hints(self.hints),
            time_estimate_minutes: self.time_estimate_minutes,
            image_url,
            created_at: now,
        })
    }
}

/// A draft that passed validation but has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tags: Vec<TagName>,
    pub question_types: Vec<String>,
    pub solution: Option<String>,
    pub hints: Vec<String>,
    pub time_estimate_minutes: Option<u32>,
    pub image_url: Option<Url>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            course_id: self.course_id,
            title: self.title,
            content: self.content,
            difficulty: self.difficulty,
            tags: self.tags,
            question_types: self.question_types,
            solution: self.solution,
            hints: self.hints,
            time_estimate_minutes: self.time_estimate_minutes,
            image_url: self.image_url,
            user_answer: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub course_id: CourseId,
    pub title: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tags: Vec<TagName>,
    pub question_types: Vec<String>,
    pub solution: Option<String>,
    pub hints: Vec<String>,
    pub time_estimate_minutes: Option<u32>,
    pub image_url: Option<Url>,
    pub user_answer: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    #[must_use]
    pub fn has_tag(&self, tag: &TagName) -> bool {
        self.tags.contains(tag)
    }

    /// Apply a partial update. Either every field in the patch is applied or none is.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if a patched field fails validation.
    pub fn apply_patch(&mut self, patch: QuestionPatch, now: DateTime<Utc>) -> Result<(), QuestionError> {
        let title = patch
            .title
            .map(|t| required_text(t, QuestionError::EmptyTitle))
            .transpose()?;
        let content = patch
            .content
            .map(|c| required_text(c, QuestionError::EmptyContent))
            .transpose()?;
        if let Some(estimate) = patch.time_estimate_minutes {
            validate_time_estimate(estimate)?;
        }
        let image_url = match patch.image_url {
            Some(Some(raw)) => Some(Some(parse_image_url(&raw)?)),
            Some(None) => Some(None),
            None => None,
        };

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(content) = content {
            self.content = content;
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(course_id) = patch.course_id {
            self.course_id = course_id;
        }
        if let Some(tags) = patch.tags {
            self.tags = dedup_tags(tags);
        }
        if let Some(types) = patch.question_types {
            self.question_types = types;
        }
        if let Some(solution) = patch.solution {
            self.solution = normalize_optional(solution);
        }
        if let Some(hints) = patch.hints {
            self.hints = clean_hints(hints);
        }
        if let Some(estimate) = patch.time_estimate_minutes {
            self.time_estimate_minutes = estimate;
        }
        if let Some(image_url) = image_url {
            self.image_url = image_url;
        }
        if let Some(answer) = patch.user_answer {
            self.user_answer = Some(answer);
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Partial update for a question. `None` leaves a field untouched; for optional
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub course_id: Option<CourseId>,
    pub tags: Option<Vec<TagName>>,
    pub question_types: Option<Vec<String>>,
    pub solution: Option<Option<String>>,
    pub hints: Option<Vec<String>>,
    pub time_estimate_minutes: Option<Option<u32>>,
    pub image_url: Option<Option<String>>,
    pub user_answer: Option<String>,
}

impl QuestionPatch {
    /// Patch that only stores the user's answer.
    #[must_use]
    pub fn user_answer(answer: impl Into<String>) -> Self {
        Self {
            user_answer: Some(answer.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

//
// ─── FIELD HELPERS ─────────────────────────────────────────────────────────────
//

fn required_text(raw: String, err: QuestionError) -> Result<String, QuestionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_string())
}

fn validate_time_estimate(minutes: Option<u32>) -> Result<(), QuestionError> {
    match minutes {
        Some(0) => Err(QuestionError::InvalidTimeEstimate),
        _ => Ok(()),
    }
}

fn parse_image_url(raw: &str) -> Result<Url, QuestionError> {
    Url::parse(raw.trim()).map_err(|e| QuestionError::InvalidImageUrl {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn clean_hints(hints: Vec<String>) -> Vec<String> {
    hints
        .into_iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

fn dedup_tags(tags: Vec<TagName>) -> Vec<TagName> {
    let mut out: Vec<TagName> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
