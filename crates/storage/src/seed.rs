//! Sample courses and questions for a fresh store.

use chrono::{DateTime, Utc};
use mindlock_core::model::{
    Course, CourseDraft, CourseId, Difficulty, QuestionDraft, QuestionId, TagName,
};
use thiserror::Error;

use crate::repository::{Storage, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Model(#[from] mindlock_core::Error),

    #[error("invalid sample timestamp `{raw}`")]
    Timestamp { raw: &'static str },
}

/// What a seeding run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub courses: usize,
    pub questions_inserted: usize,
    pub questions_skipped: usize,
}

struct SampleCourse {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    created_at: &'static str,
}

struct SampleQuestion {
    id: &'static str,
    course: &'static str,
    title: &'static str,
    content: &'static str,
    difficulty: Difficulty,
    tags: &'static [&'static str],
    hints: &'static [&'static str],
    solution: Option<&'static str>,
    minutes: u32,
    created_at: &'static str,
    updated_at: &'static str,
}

const COURSES: &[SampleCourse] = &[
    SampleCourse {
        id: "1",
        name: "Data Structures & Algorithms",
        description: "Fundamental algorithms and data structures for computer science",
        created_at: "2023-10-15T00:00:00Z",
    },
    SampleCourse {
        id: "2",
        name: "Machine Learning",
        description: "Introduction to machine learning concepts and applications",
        created_at: "2023-11-02T00:00:00Z",
    },
    SampleCourse {
        id: "3",
        name: "Web Development",
        description: "Modern web development techniques and frameworks",
        created_at: "2023-09-20T00:00:00Z",
    },
    SampleCourse {
        id: "4",
        name: "Operating Systems",
        description: "Core concepts of operating systems and system programming",
        created_at: "2023-08-12T00:00:00Z",
    },
];

const QUESTIONS: &[SampleQuestion] = &[
    SampleQuestion {
        id: "1",
        course: "1",
        title: "Binary Search Implementation",
        content: "Implement a binary search algorithm that finds the position of a target value within a sorted array.",
        difficulty: Difficulty::Medium,
        tags: &["algorithms", "searching", "arrays"],
        hints: &[
            "Think about dividing the array in half at each step",
            "Consider what happens when the target is less than or greater than the middle element",
            "Remember to handle the case when the target is not found",
        ],
        solution: Some(
            "fn binary_search(items: &[i32], target: i32) -> Option<usize> {\n    let (mut lo, mut hi) = (0, items.len());\n    while lo < hi {\n        let mid = lo + (hi - lo) / 2;\n        match items[mid].cmp(&target) {\n            std::cmp::Ordering::Equal => return Some(mid),\n            std::cmp::Ordering::Less => lo = mid + 1,\n            std::cmp::Ordering::Greater => hi = mid,\n        }\n    }\n    None\n}",
        ),
        minutes: 15,
        created_at: "2023-10-16T00:00:00Z",
        updated_at: "2023-10-16T00:00:00Z",
    },
    SampleQuestion {
        id: "2",
        course: "1",
        title: "Graph Traversal: BFS",
        content: "Implement a Breadth-First Search algorithm to traverse a graph represented as an adjacency list.",
        difficulty: Difficulty::Hard,
        tags: &["algorithms", "graphs", "traversal"],
        hints: &[
            "Use a queue data structure to keep track of nodes to visit",
            "Mark nodes as visited to avoid cycles",
            "Process all neighbors of a node before moving to the next level",
        ],
        solution: None,
        minutes: 25,
        created_at: "2023-10-18T00:00:00Z",
        updated_at: "2023-10-20T00:00:00Z",
    },
    SampleQuestion {
        id: "3",
        course: "2",
        title: "Linear Regression Implementation",
        content: "Implement a simple linear regression model from scratch using gradient descent.",
        difficulty: Difficulty::Hard,
        tags: &["machine learning", "regression", "optimization"],
        hints: &[
            "Start by defining the linear model equation: y = wx + b",
            "Compute the gradients of the loss function with respect to w and b",
            "Update the parameters using the learning rate and gradients",
        ],
        solution: None,
        minutes: 30,
        created_at: "2023-11-05T00:00:00Z",
        updated_at: "2023-11-05T00:00:00Z",
    },
    SampleQuestion {
        id: "4",
        course: "3",
        title: "React Component Lifecycle",
        content: "Explain the lifecycle methods of a React component and provide examples of when each should be used.",
        difficulty: Difficulty::Medium,
        tags: &["react", "frontend", "components"],
        hints: &[],
        solution: None,
        minutes: 20,
        created_at: "2023-09-22T00:00:00Z",
        updated_at: "2023-09-22T00:00:00Z",
    },
    SampleQuestion {
        id: "5",
        course: "4",
        title: "Process Scheduling Algorithms",
        content: "Implement and compare First-Come-First-Served (FCFS) and Shortest Job First (SJF) scheduling algorithms.",
        difficulty: Difficulty::Expert,
        tags: &["operating systems", "scheduling", "algorithms"],
        hints: &[],
        solution: None,
        minutes: 45,
        created_at: "2023-08-14T00:00:00Z",
        updated_at: "2023-08-16T00:00:00Z",
    },
];

fn model<E: Into<mindlock_core::Error>>(e: E) -> SeedError {
    SeedError::Model(e.into())
}

fn timestamp(raw: &'static str) -> Result<DateTime<Utc>, SeedError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| SeedError::Timestamp { raw })
}

/// Upsert the sample courses and insert the sample questions that are not
/// already stored, then recount questions per course.
///
/// Safe to run repeatedly: existing questions are left untouched.
///
/// # Errors
///
/// Returns `SeedError` if the store rejects a write.
pub async fn seed_sample_data(storage: &Storage, now: DateTime<Utc>) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for sample in QUESTIONS {
        let mut draft = QuestionDraft::new(
            CourseId::new(sample.course).map_err(model)?,
            sample.title,
            sample.content,
            sample.difficulty,
        )
        .with_tags(
            sample
                .tags
                .iter()
                .map(|t| TagName::new(*t))
                .collect::<Result<Vec<_>, _>>()
                .map_err(model)?,
        )
        .with_time_estimate(sample.minutes);
        draft.hints = sample.hints.iter().map(|h| (*h).to_string()).collect();
        draft.solution = sample.solution.map(str::to_string);

        let mut question = draft
            .validate(timestamp(sample.created_at)?)
            .map_err(model)?
            .assign_id(QuestionId::new(sample.id).map_err(model)?);
        question.updated_at = timestamp(sample.updated_at)?;

        match storage.questions.put_question(&question).await {
            Ok(()) => report.questions_inserted += 1,
            Err(StorageError::Conflict) => report.questions_skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    for sample in COURSES {
        let id = CourseId::new(sample.id).map_err(model)?;
        let draft = CourseDraft::new(sample.name, Some(sample.description.to_string()));
        let mut course = match storage.courses.get_course(&id).await? {
            Some(mut existing) => {
                existing.rename(draft, now).map_err(model)?;
                existing
            }
            None => Course::new(id.clone(), draft, timestamp(sample.created_at)?)
                .map_err(model)?,
        };
        let count = storage.questions.count_questions(&id).await?;
        course.set_question_count(count, course.updated_at());
        storage.courses.upsert_course(&course).await?;
        report.courses += 1;
    }

    tracing::info!(
        courses = report.courses,
        inserted = report.questions_inserted,
        skipped = report.questions_skipped,
        "seeded sample data"
    );
    Ok(report)
}
