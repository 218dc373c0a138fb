use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::CourseId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course name cannot be empty")]
    EmptyName,
}

/// User-entered course fields before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDraft {
    pub name: String,
    pub description: Option<String>,
}

impl CourseDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}

/// A course groups questions. `question_count` is maintained by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    name: String,
    description: Option<String>,
    question_count: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Course {
    /// Build a new, empty course from a draft.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyName` if the name is blank.
    pub fn new(id: CourseId, draft: CourseDraft, now: DateTime<Utc>) -> Result<Self, CourseError> {
        Ok(Self {
            id,
            name: normalize_name(draft.name)?,
            description: normalize_description(draft.description),
            question_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrate a course from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyName` if the stored name is blank.
    pub fn from_persisted(
        id: CourseId,
        name: String,
        description: Option<String>,
        question_count: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        Ok(Self {
            id,
            name: normalize_name(name)?,
            description: normalize_description(description),
            question_count,
            created_at,
            updated_at,
        })
    }

    /// Replace name and description.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyName` if the new name is blank; the course is unchanged.
    pub fn rename(&mut self, draft: CourseDraft, now: DateTime<Utc>) -> Result<(), CourseError> {
        let name = normalize_name(draft.name)?;
        self.name = name;
        self.description = normalize_description(draft.description);
        self.updated_at = now;
        Ok(())
    }

    pub fn set_question_count(&mut self, count: u32, now: DateTime<Utc>) {
        self.question_count = count;
        self.updated_at = now;
    }

    #[must_use]
    pub fn id(&self) -> &CourseId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

fn normalize_name(raw: String) -> Result<String, CourseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CourseError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn normalize_description(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn course_requires_name() {
        let err = Course::new(
            CourseId::new("c1").unwrap(),
            CourseDraft::new("  ", None),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, CourseError::EmptyName);
    }

    #[test]
    fn blank_description_is_dropped() {
        let course = Course::new(
            CourseId::new("c1").unwrap(),
            CourseDraft::new("Operating Systems", Some("   ".into())),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(course.description(), None);
        assert_eq!(course.question_count(), 0);
    }

    #[test]
    fn rename_rejects_blank_and_keeps_state() {
        let mut course = Course::new(
            CourseId::new("c1").unwrap(),
            CourseDraft::new("Web", None),
            fixed_now(),
        )
        .unwrap();
        assert!(course.rename(CourseDraft::new("", None), fixed_now()).is_err());
        assert_eq!(course.name(), "Web");
    }
}
