use std::collections::BTreeSet;
use std::sync::Arc;

use mindlock_core::model::{
    CourseId, Question, QuestionDraft, QuestionFilter, QuestionId, QuestionPatch, QuestionSort,
    TagName,
};
use storage::repository::{CourseRepository, QuestionRepository};

use crate::Clock;
use crate::error::QuestionServiceError;

/// Question listing and editing. Keeps each course's question count in step
/// with the questions stored for it.
#[derive(Clone)]
pub struct QuestionService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    courses: Arc<dyn CourseRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        courses: Arc<dyn CourseRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            courses,
        }
    }

    /// Questions matching `filter`, ordered by `sort`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn list(
        &self,
        filter: &QuestionFilter,
        sort: QuestionSort,
    ) -> Result<Vec<Question>, QuestionServiceError> {
        let mut questions = self.questions.list_questions(filter).await?;
        sort.apply(&mut questions);
        Ok(questions)
    }

    /// Fetch a question by ID. Returns `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn get(&self, id: &QuestionId) -> Result<Option<Question>, QuestionServiceError> {
        Ok(self.questions.get_question(id).await?)
    }

    /// Validate and store a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Question` for validation failures.
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn create(&self, draft: QuestionDraft) -> Result<Question, QuestionServiceError> {
        let validated = draft.validate(self.clock.now())?;
        let question = self.questions.insert_question(validated).await?;
        tracing::info!(id = %question.id, course = %question.course_id, "question created");
        self.sync_course_count(&question.course_id).await?;
        Ok(question)
    }

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::NotFound` if the question does not exist.
    /// Returns `QuestionServiceError::Question` if a patched field is invalid.
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn update(
        &self,
        id: &QuestionId,
        patch: QuestionPatch,
    ) -> Result<Question, QuestionServiceError> {
        let mut question = self
            .questions
            .get_question(id)
            .await?
            .ok_or_else(|| QuestionServiceError::NotFound(id.clone()))?;
        if patch.is_empty() {
            return Ok(question);
        }

        let previous_course = question.course_id.clone();
        question.apply_patch(patch, self.clock.now())?;
        self.questions.update_question(&question).await?;
        tracing::info!(id = %question.id, "question updated");

        if previous_course != question.course_id {
            self.sync_course_count(&previous_course).await?;
            self.sync_course_count(&question.course_id).await?;
        }
        Ok(question)
    }

    /// Delete a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::NotFound` if the question does not exist.
    /// Returns `QuestionServiceError::Storage` if persistence fails.
    pub async fn delete(&self, id: &QuestionId) -> Result<(), QuestionServiceError> {
        let question = self
            .questions
            .get_question(id)
            .await?
            .ok_or_else(|| QuestionServiceError::NotFound(id.clone()))?;
        self.questions.delete_question(id).await?;
        tracing::info!(%id, "question deleted");
        self.sync_course_count(&question.course_id).await?;
        Ok(())
    }

    /// Every tag in use, sorted and without duplicates.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if repository access fails.
    pub async fn tags(&self) -> Result<Vec<TagName>, QuestionServiceError> {
        let questions = self.questions.list_questions(&QuestionFilter::all()).await?;
        let tags: BTreeSet<TagName> = questions.into_iter().flat_map(|q| q.tags).collect();
        Ok(tags.into_iter().collect())
    }

    /// Questions may reference a course that does not exist; those are skipped.
    async fn sync_course_count(&self, course_id: &CourseId) -> Result<(), QuestionServiceError> {
        let Some(mut course) = self.courses.get_course(course_id).await? else {
            tracing::debug!(course = %course_id, "question references unknown course");
            return Ok(());
        };
        let count = self.questions.count_questions(course_id).await?;
        if count != course.question_count() {
            course.set_question_count(count, self.clock.now());
            self.courses.upsert_course(&course).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mindlock_core::model::{Course, CourseDraft, Difficulty, SortField};
    use mindlock_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn cid(raw: &str) -> CourseId {
        CourseId::new(raw).unwrap()
    }

    async fn service_with_courses(ids: &[&str]) -> (QuestionService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        for id in ids {
            let course =
                Course::new(cid(id), CourseDraft::new(format!("Course {id}"), None), fixed_now())
                    .unwrap();
            repo.upsert_course(&course).await.unwrap();
        }
        let service = QuestionService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (service, repo)
    }

    #[tokio::test]
    async fn create_and_delete_keep_course_count_in_step() {
        let (service, repo) = service_with_courses(&["algo"]).await;

        let q = service
            .create(QuestionDraft::new(cid("algo"), "BFS", "Traverse a graph.", Difficulty::Hard))
            .await
            .unwrap();
        let course = repo.get_course(&cid("algo")).await.unwrap().unwrap();
        assert_eq!(course.question_count(), 1);

        service.delete(&q.id).await.unwrap();
        let course = repo.get_course(&cid("algo")).await.unwrap().unwrap();
        assert_eq!(course.question_count(), 0);
    }

    #[tokio::test]
    async fn moving_a_question_recounts_both_courses() {
        let (service, repo) = service_with_courses(&["algo", "web"]).await;
        let q = service
            .create(QuestionDraft::new(cid("algo"), "Q", "Body", Difficulty::Easy))
            .await
            .unwrap();

        let patch = QuestionPatch {
            course_id: Some(cid("web")),
            ..QuestionPatch::default()
        };
        let moved = service.update(&q.id, patch).await.unwrap();
        assert_eq!(moved.course_id, cid("web"));

        let algo = repo.get_course(&cid("algo")).await.unwrap().unwrap();
        let web = repo.get_course(&cid("web")).await.unwrap().unwrap();
        assert_eq!(algo.question_count(), 0);
        assert_eq!(web.question_count(), 1);
    }

    #[tokio::test]
    async fn update_missing_question_is_not_found() {
        let (service, _repo) = service_with_courses(&[]).await;
        let err = service
            .update(&QuestionId::new("ghost").unwrap(), QuestionPatch::user_answer("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, QuestionServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_sorts_and_tags_are_distinct() {
        let (service, _repo) = service_with_courses(&["algo"]).await;
        for (title, difficulty, tag) in [
            ("Heaps", Difficulty::Expert, "trees"),
            ("Arrays", Difficulty::Easy, "arrays"),
            ("Tries", Difficulty::Medium, "trees"),
        ] {
            service
                .create(
                    QuestionDraft::new(cid("algo"), title, "Body", difficulty)
                        .with_tags(vec![TagName::new(tag).unwrap()]),
                )
                .await
                .unwrap();
        }

        let sort = QuestionSort::default().select(SortField::Difficulty);
        let titles: Vec<String> = service
            .list(&QuestionFilter::all(), sort)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.title)
            .collect();
        assert_eq!(titles, vec!["Arrays", "Tries", "Heaps"]);

        let tags: Vec<String> = service
            .tags()
            .await
            .unwrap()
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();
        assert_eq!(tags, vec!["arrays", "trees"]);
    }
}
