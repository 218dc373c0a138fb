use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mindlock_core::model::{
    CourseId, Difficulty, Question, QuestionDraft, QuestionFilter, QuestionId, ValidatedQuestion,
};
use mindlock_core::time::fixed_now;
use services::notify::{Navigator, Notifier, QUESTIONS_ROUTE};
use services::{Clock, SaveOutcome, SaveState, StudyError, StudyService};
use storage::repository::{InMemoryRepository, QuestionRepository, StorageError};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Notifier for Recorder {
    fn notify_success(&self, message: &str) {
        self.events.lock().unwrap().push(format!("ok: {message}"));
    }

    fn notify_error(&self, message: &str) {
        self.events.lock().unwrap().push(format!("error: {message}"));
    }
}

impl Navigator for Recorder {
    fn go_to(&self, path: &str) {
        self.events.lock().unwrap().push(format!("go: {path}"));
    }
}

/// Counts writes and can be told to reject them.
#[derive(Clone)]
struct CountingRepo {
    inner: InMemoryRepository,
    updates: Arc<AtomicUsize>,
    fail_updates: bool,
}

#[async_trait]
impl QuestionRepository for CountingRepo {
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        self.inner.list_questions(filter).await
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError> {
        self.inner.get_question(id).await
    }

    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        self.inner.insert_question(question).await
    }

    async fn put_question(&self, question: &Question) -> Result<(), StorageError> {
        self.inner.put_question(question).await
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        if self.fail_updates {
            return Err(StorageError::Connection("disk full".into()));
        }
        self.inner.update_question(question).await
    }

    async fn delete_question(&self, id: &QuestionId) -> Result<(), StorageError> {
        self.inner.delete_question(id).await
    }

    async fn count_questions(&self, course_id: &CourseId) -> Result<u32, StorageError> {
        self.inner.count_questions(course_id).await
    }
}

async fn fixture(fail_updates: bool) -> (CountingRepo, Arc<Recorder>, StudyService, QuestionId) {
    let repo = CountingRepo {
        inner: InMemoryRepository::new(),
        updates: Arc::new(AtomicUsize::new(0)),
        fail_updates,
    };
    let draft = QuestionDraft::new(
        CourseId::new("algo").unwrap(),
        "Binary Search",
        "Find the target in a sorted array.",
        Difficulty::Medium,
    );
    let question = repo
        .insert_question(draft.validate(fixed_now()).unwrap())
        .await
        .unwrap();
    let recorder = Arc::new(Recorder::default());
    let service = StudyService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        recorder.clone(),
        recorder.clone(),
    );
    (repo, recorder, service, question.id)
}

#[tokio::test(start_paused = true)]
async fn concurrent_saves_write_once() {
    let (repo, recorder, service, id) = fixture(false).await;
    let session = Mutex::new(service.open(&id).await.unwrap());
    session.lock().unwrap().set_answer("lo + (hi - lo) / 2");

    let (first, second) = tokio::join!(service.save(&session), service.save(&session));
    assert_eq!(first.unwrap(), SaveOutcome::Saved);
    assert_eq!(second.unwrap(), SaveOutcome::Skipped);
    assert_eq!(repo.updates.load(Ordering::SeqCst), 1);
    assert_eq!(session.lock().unwrap().save_state(), SaveState::Saved);

    // Nothing changed, so nothing is written.
    assert_eq!(service.save(&session).await.unwrap(), SaveOutcome::Skipped);
    assert_eq!(repo.updates.load(Ordering::SeqCst), 1);

    let stored = repo.get_question(&id).await.unwrap().unwrap();
    assert_eq!(stored.user_answer.as_deref(), Some("lo + (hi - lo) / 2"));
    assert_eq!(
        recorder.events.lock().unwrap().as_slice(),
        ["ok: Answer saved successfully".to_string()]
    );

    let reopened = service.open(&id).await.unwrap();
    assert_eq!(reopened.user_answer(), "lo + (hi - lo) / 2");
}

#[tokio::test(start_paused = true)]
async fn failed_save_keeps_the_draft_dirty() {
    let (repo, recorder, service, id) = fixture(true).await;
    let session = Mutex::new(service.open(&id).await.unwrap());
    session.lock().unwrap().set_answer("draft");

    assert_eq!(service.save(&session).await.unwrap(), SaveOutcome::Failed);
    let guard = session.lock().unwrap();
    assert_eq!(guard.save_state(), SaveState::Idle);
    assert!(guard.can_save());
    drop(guard);

    let stored = repo.get_question(&id).await.unwrap().unwrap();
    assert_eq!(stored.user_answer, None);
    assert_eq!(
        recorder.events.lock().unwrap().as_slice(),
        ["error: Failed to save answer".to_string()]
    );
}

#[tokio::test]
async fn unknown_question_returns_to_the_list() {
    let (_repo, recorder, service, _id) = fixture(false).await;
    let err = service
        .open(&QuestionId::new("missing").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, StudyError::NotFound(_)));
    assert_eq!(
        recorder.events.lock().unwrap().as_slice(),
        [
            "error: Question not found".to_string(),
            format!("go: {QUESTIONS_ROUTE}")
        ]
    );
}
