use std::collections::BTreeMap;

use chrono::Duration;
use mindlock_core::model::{
    Course, CourseDraft, CourseId, Difficulty, ExamRecord, QuestionDraft, QuestionFilter,
    QuestionId, QuestionPatch, SubmitReason, TagName,
};
use mindlock_core::time::fixed_now;
use storage::repository::{
    CourseRepository, ExamRecordRepository, InMemoryRepository, QuestionRepository, StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn course_id(raw: &str) -> CourseId {
    CourseId::new(raw).unwrap()
}

#[tokio::test]
async fn sqlite_question_roundtrip_keeps_optional_fields() {
    let repo = connect("memdb_question_roundtrip").await;

    let mut draft = QuestionDraft::new(
        course_id("1"),
        "Binary Search",
        "Find the target in a sorted array.",
        Difficulty::Medium,
    )
    .with_tags(vec![
        TagName::new("algorithms").unwrap(),
        TagName::new("arrays").unwrap(),
    ])
    .with_time_estimate(15);
    draft.hints = vec!["Halve the range".into()];
    draft.image_url = Some("https://example.com/bs.png".into());

    let stored = repo
        .insert_question(draft.validate(fixed_now()).unwrap())
        .await
        .expect("insert");

    let fetched = repo
        .get_question(&stored.id)
        .await
        .expect("fetch")
        .expect("present");
    assert_eq!(fetched, stored);
    assert_eq!(fetched.time_estimate_minutes, Some(15));
    assert_eq!(
        fetched.image_url.as_ref().map(url::Url::as_str),
        Some("https://example.com/bs.png")
    );
}

#[tokio::test]
async fn sqlite_filters_and_updates_questions() {
    let repo = connect("memdb_question_filters").await;

    let easy = QuestionDraft::new(course_id("1"), "Arrays", "Reverse an array.", Difficulty::Easy)
        .with_tags(vec![TagName::new("arrays").unwrap()])
        .validate(fixed_now())
        .unwrap();
    let hard = QuestionDraft::new(course_id("1"), "Graphs", "Run BFS.", Difficulty::Hard)
        .with_tags(vec![TagName::new("graphs").unwrap()])
        .validate(fixed_now() + Duration::minutes(1))
        .unwrap();
    let other = QuestionDraft::new(course_id("2"), "Regression", "Fit a line.", Difficulty::Hard)
        .validate(fixed_now())
        .unwrap();

    let easy = repo.insert_question(easy).await.unwrap();
    let hard = repo.insert_question(hard).await.unwrap();
    repo.insert_question(other).await.unwrap();

    let filter = QuestionFilter::all()
        .course(course_id("1"))
        .difficulty(Difficulty::Hard);
    let found = repo.list_questions(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, hard.id);

    let searched = repo
        .list_questions(&QuestionFilter::all().search("ARRAY"))
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, easy.id);

    let mut answered = easy.clone();
    answered
        .apply_patch(QuestionPatch::user_answer("reverse in place"), fixed_now() + Duration::minutes(2))
        .unwrap();
    repo.update_question(&answered).await.unwrap();
    let fetched = repo.get_question(&easy.id).await.unwrap().unwrap();
    assert_eq!(fetched.user_answer.as_deref(), Some("reverse in place"));

    assert_eq!(repo.count_questions(&course_id("1")).await.unwrap(), 2);
    repo.delete_question(&easy.id).await.unwrap();
    assert_eq!(repo.count_questions(&course_id("1")).await.unwrap(), 1);
    assert!(matches!(
        repo.delete_question(&easy.id).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_put_question_rejects_taken_id() {
    let repo = connect("memdb_put_conflict").await;

    let question = QuestionDraft::new(course_id("1"), "Q", "Body", Difficulty::Easy)
        .validate(fixed_now())
        .unwrap()
        .assign_id(QuestionId::new("1").unwrap());
    repo.put_question(&question).await.unwrap();
    assert!(matches!(
        repo.put_question(&question).await,
        Err(StorageError::Conflict)
    ));
}

#[tokio::test]
async fn sqlite_course_upsert_keeps_created_at() {
    let repo = connect("memdb_course_upsert").await;

    let mut course = Course::new(
        course_id("algo"),
        CourseDraft::new("Algorithms", None),
        fixed_now(),
    )
    .unwrap();
    repo.upsert_course(&course).await.unwrap();

    course
        .rename(
            CourseDraft::new("Algorithms II", Some("Graphs and trees".into())),
            fixed_now() + Duration::days(1),
        )
        .unwrap();
    course.set_question_count(3, fixed_now() + Duration::days(1));
    repo.upsert_course(&course).await.unwrap();

    let fetched = repo.get_course(course.id()).await.unwrap().unwrap();
    assert_eq!(fetched.name(), "Algorithms II");
    assert_eq!(fetched.description(), Some("Graphs and trees"));
    assert_eq!(fetched.question_count(), 3);
    assert_eq!(fetched.created_at(), fixed_now());

    assert_eq!(repo.list_courses().await.unwrap().len(), 1);
    repo.delete_course(course.id()).await.unwrap();
    assert!(repo.get_course(course.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn sqlite_exam_records_list_newest_first() {
    let repo = connect("memdb_exam_records").await;

    let q1 = QuestionId::new("1").unwrap();
    let q2 = QuestionId::new("2").unwrap();
    let mut answers = BTreeMap::new();
    answers.insert(q1.clone(), "O(log n)".to_string());

    let first = ExamRecord::new(
        course_id("1"),
        Difficulty::Hard,
        fixed_now(),
        fixed_now() + Duration::minutes(20),
        1200,
        1200,
        SubmitReason::TimeExpired,
        vec![q1.clone(), q2.clone()],
        answers,
    )
    .unwrap();
    let second = ExamRecord::new(
        course_id("1"),
        Difficulty::Hard,
        fixed_now() + Duration::hours(1),
        fixed_now() + Duration::hours(1) + Duration::minutes(5),
        1200,
        300,
        SubmitReason::Manual,
        vec![q2],
        BTreeMap::new(),
    )
    .unwrap();

    let first_id = repo.append_record(&first).await.unwrap();
    let second_id = repo.append_record(&second).await.unwrap();
    assert_ne!(first_id, second_id);

    assert_eq!(repo.get_record(first_id).await.unwrap(), first);

    let rows = repo.list_records(10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, second_id);
    assert_eq!(rows[1].record.answered_count(), 1);

    assert!(matches!(
        repo.get_record(9_999).await,
        Err(StorageError::NotFound)
    ));
}

fn record_submitted_after(secs: i64) -> ExamRecord {
    ExamRecord::new(
        course_id("1"),
        Difficulty::Easy,
        fixed_now(),
        fixed_now() + Duration::seconds(secs),
        1200,
        u64::try_from(secs).unwrap(),
        SubmitReason::Manual,
        vec![QuestionId::new("1").unwrap()],
        BTreeMap::new(),
    )
    .unwrap()
}

async fn assert_listed_by_submission_time(repo: &dyn ExamRecordRepository) {
    // Appended out of submission order.
    repo.append_record(&record_submitted_after(50)).await.unwrap();
    repo.append_record(&record_submitted_after(10)).await.unwrap();

    let elapsed: Vec<u64> = repo
        .list_records(10)
        .await
        .unwrap()
        .iter()
        .map(|row| row.record.elapsed_secs())
        .collect();
    assert_eq!(elapsed, vec![50, 10]);

    let newest = repo.list_records(1).await.unwrap();
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].record.elapsed_secs(), 50);
}

#[tokio::test]
async fn exam_records_list_by_submission_time_in_every_backend() {
    assert_listed_by_submission_time(&InMemoryRepository::new()).await;
    assert_listed_by_submission_time(&connect("memdb_record_order").await).await;
}
