use std::sync::{Arc, Mutex};

use chrono::Duration;
use mindlock_core::model::{CourseId, Difficulty, QuestionDraft, QuestionId, SubmitReason};
use mindlock_core::time::fixed_now;
use services::notify::{DASHBOARD_ROUTE, Navigator, Notifier};
use services::sessions::DEFAULT_TICK_PERIOD;
use services::{Clock, ExamConfig, ExamQuery, ExamService, ExamSession, ExamStatus, Ticker};
use storage::repository::{InMemoryRepository, QuestionRepository};

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
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

fn algo() -> CourseId {
    CourseId::new("algo").unwrap()
}

async fn seeded_repo() -> (InMemoryRepository, Vec<QuestionId>) {
    let repo = InMemoryRepository::new();
    let mut ids = Vec::new();
    for title in ["Two Sum", "Merge Intervals", "LRU Cache"] {
        let draft = QuestionDraft::new(algo(), title, "Solve it.", Difficulty::Hard);
        let question = repo
            .insert_question(draft.validate(fixed_now()).unwrap())
            .await
            .unwrap();
        ids.push(question.id);
    }
    (repo, ids)
}

fn service(repo: &InMemoryRepository, recorder: &Arc<Recorder>) -> ExamService {
    ExamService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        recorder.clone(),
        recorder.clone(),
    )
}

#[tokio::test(start_paused = true)]
async fn countdown_expiry_submits_exactly_once() {
    let (repo, ids) = seeded_repo().await;
    let config = ExamConfig::new(algo(), Difficulty::Hard);
    let questions = repo
        .list_questions(&mindlock_core::model::QuestionFilter::all())
        .await
        .unwrap();

    let mut session = ExamSession::new(&config, questions).with_budget_secs(2);
    assert!(session.start(fixed_now()));
    assert!(session.set_answer(&ids[0], "hash map"));
    let session = Arc::new(Mutex::new(session));

    let ticker = Ticker::spawn(
        Clock::fixed(fixed_now()),
        DEFAULT_TICK_PERIOD,
        Arc::downgrade(&session),
    );
    let submission = ticker.join().await.expect("countdown submits");

    assert_eq!(submission.reason, SubmitReason::TimeExpired);
    assert_eq!(submission.elapsed_secs, 2);
    assert_eq!(submission.submitted_at - submission.started_at, Duration::seconds(2));
    assert_eq!(submission.answers.get(&ids[0]).map(String::as_str), Some("hash map"));
    assert_eq!(submission.question_ids.len(), 3);

    let mut guard = session.lock().unwrap();
    assert_eq!(guard.status(), ExamStatus::Submitted);
    assert!(guard.submit(fixed_now() + Duration::seconds(3)).is_none());
    assert!(!guard.set_answer(&ids[1], "too late"));
}

#[tokio::test]
async fn manual_submission_is_recorded_and_returns_to_dashboard() {
    let (repo, ids) = seeded_repo().await;
    let recorder = Arc::new(Recorder::default());
    let service = service(&repo, &recorder);

    let config = ExamQuery::parse("course=algo&difficulty=hard&duration=45")
        .into_config()
        .unwrap();
    let mut session = service.start_exam(&config).await.unwrap();
    assert_eq!(session.status(), ExamStatus::Running);
    assert_eq!(session.timer().budget_secs(), 2700);

    session.answer_current("first");
    session.next();
    session.answer_current("second");
    let submission = session
        .submit(fixed_now() + Duration::seconds(90))
        .unwrap();
    assert_eq!(submission.reason, SubmitReason::Manual);

    let record_id = service.finish(submission).await.unwrap();
    assert_eq!(
        recorder.events(),
        vec!["ok: Exam submitted!".to_string(), format!("go: {DASHBOARD_ROUTE}")]
    );

    let rows = service.recent_records(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, record_id);
    assert_eq!(rows[0].record.elapsed_secs(), 90);
    assert_eq!(rows[0].record.answered_count(), 2);
    assert_eq!(rows[0].record.question_ids().len(), ids.len());
}

#[tokio::test]
async fn empty_criteria_report_no_questions() {
    let (repo, _) = seeded_repo().await;
    let recorder = Arc::new(Recorder::default());
    let service = service(&repo, &recorder);

    let config = ExamConfig::new(algo(), Difficulty::Easy);
    let session = service.start_exam(&config).await.unwrap();

    assert_eq!(session.status(), ExamStatus::NoQuestions);
    assert!(!session.timer().is_running());
    assert_eq!(
        recorder.events(),
        vec!["error: No questions found for the selected criteria.".to_string()]
    );
}
