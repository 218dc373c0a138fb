use std::sync::Arc;

use mindlock_core::model::{Course, CourseDraft, CourseId, QuestionFilter};
use storage::repository::{CourseRepository, QuestionRepository};

use crate::Clock;
use crate::error::CourseServiceError;

/// Dashboard figures for one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseStats {
    pub course: Course,
    pub question_count: u32,
    /// Sum of the time estimates of the course's questions.
    pub estimated_minutes: u32,
}

/// Orchestrates course creation and persistence.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            questions,
        }
    }

    /// List courses ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn list(&self) -> Result<Vec<Course>, CourseServiceError> {
        Ok(self.courses.list_courses().await?)
    }

    /// Fetch a course by ID. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn get(&self, id: &CourseId) -> Result<Option<Course>, CourseServiceError> {
        Ok(self.courses.get_course(id).await?)
    }

    /// Create a course under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn create(&self, draft: CourseDraft) -> Result<Course, CourseServiceError> {
        let course = Course::new(CourseId::generate(), draft, self.clock.now())?;
        self.courses.upsert_course(&course).await?;
        tracing::info!(id = %course.id(), name = course.name(), "course created");
        Ok(course)
    }

    /// Replace a course's name and description.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::NotFound` if the course does not exist.
    /// Returns `CourseServiceError::Course` if the new name is blank.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn update(
        &self,
        id: &CourseId,
        draft: CourseDraft,
    ) -> Result<Course, CourseServiceError> {
        let mut course = self
            .courses
            .get_course(id)
            .await?
            .ok_or_else(|| CourseServiceError::NotFound(id.clone()))?;
        course.rename(draft, self.clock.now())?;
        self.courses.upsert_course(&course).await?;
        Ok(course)
    }

    /// Delete an empty course.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::HasQuestions` while questions still belong to it.
    /// Returns `CourseServiceError::NotFound` if the course does not exist.
    /// Returns `CourseServiceError::Storage` if persistence fails.
    pub async fn delete(&self, id: &CourseId) -> Result<(), CourseServiceError> {
        let count = self.questions.count_questions(id).await?;
        if count > 0 {
            return Err(CourseServiceError::HasQuestions {
                id: id.clone(),
                count,
            });
        }
        match self.courses.delete_course(id).await {
            Ok(()) => {
                tracing::info!(%id, "course deleted");
                Ok(())
            }
            Err(storage::repository::StorageError::NotFound) => {
                Err(CourseServiceError::NotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Per-course question counts and time estimates, in course-name order.
    ///
    /// Counts come from the stored questions rather than the cached field.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn stats(&self) -> Result<Vec<CourseStats>, CourseServiceError> {
        let courses = self.courses.list_courses().await?;
        let mut stats = Vec::with_capacity(courses.len());
        for course in courses {
            let questions = self
                .questions
                .list_questions(&QuestionFilter::all().course(course.id().clone()))
                .await?;
            let question_count = u32::try_from(questions.len()).unwrap_or(u32::MAX);
            let estimated_minutes = questions
                .iter()
                .filter_map(|q| q.time_estimate_minutes)
                .fold(0_u32, u32::saturating_add);
            stats.push(CourseStats {
                course,
                question_count,
                estimated_minutes,
            });
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mindlock_core::model::{Difficulty, QuestionDraft};
    use mindlock_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> CourseService {
        CourseService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn create_update_and_delete_empty_course() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);

        let course = service
            .create(CourseDraft::new("Operating Systems", None))
            .await
            .unwrap();
        let renamed = service
            .update(
                course.id(),
                CourseDraft::new("Operating Systems II", Some("Schedulers".into())),
            )
            .await
            .unwrap();
        assert_eq!(renamed.name(), "Operating Systems II");
        assert_eq!(renamed.created_at(), course.created_at());

        service.delete(course.id()).await.unwrap();
        assert!(service.get(course.id()).await.unwrap().is_none());
        assert!(matches!(
            service.delete(course.id()).await,
            Err(CourseServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn course_with_questions_cannot_be_deleted() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let course = service
            .create(CourseDraft::new("Algorithms", None))
            .await
            .unwrap();
        let draft = QuestionDraft::new(course.id().clone(), "Q", "Body", Difficulty::Easy)
            .with_time_estimate(15);
        repo.insert_question(draft.validate(fixed_now()).unwrap())
            .await
            .unwrap();

        let err = service.delete(course.id()).await.unwrap_err();
        assert!(matches!(err, CourseServiceError::HasQuestions { count: 1, .. }));

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].question_count, 1);
        assert_eq!(stats[0].estimated_minutes, 15);
    }

    #[tokio::test]
    async fn blank_course_name_is_rejected() {
        let repo = InMemoryRepository::new();
        let err = service(&repo)
            .create(CourseDraft::new("  ", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CourseServiceError::Course(_)));
    }
}
