use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mindlock_core::model::{
    Course, CourseDraft, CourseId, Difficulty, QuestionDraft, QuestionFilter, QuestionId,
    QuestionPatch, QuestionSort, SortDirection, SortField, TagName,
};
use services::config::{DEFAULT_DURATION_MINUTES, normalize_duration};
use services::{Clock, ExamQuery};
use storage::repository::Storage;
use storage::seed_sample_data;

mod catalog;
mod console;
mod context;
mod db;
mod exam;
mod study;
mod telemetry;

use crate::console::{ConsoleNavigator, ConsoleNotifier};
use crate::context::AppContext;

#[derive(Debug, Parser)]
#[command(name = "mindlock", version, about = "Practice questions, timed exams and study sessions")]
struct Cli {
    /// SQLite database URL or path.
    #[arg(
        long,
        env = "MINDLOCK_DB_URL",
        default_value = "sqlite://mindlock.sqlite3",
        global = true
    )]
    db: String,

    /// Session timer refresh period in milliseconds.
    #[arg(
        long,
        env = "MINDLOCK_TICK_MS",
        default_value_t = 200,
        value_parser = clap::value_parser!(u64).range(10..=5_000),
        global = true
    )]
    tick_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the sample courses and questions. Safe to run repeatedly.
    Seed {
        /// Fixed current time (RFC3339) for reproducible timestamps.
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// List questions.
    Questions(QuestionsArgs),
    /// Create a question.
    AddQuestion(AddQuestionArgs),
    /// Change fields of a question. Omitted flags leave the field as is.
    EditQuestion(EditQuestionArgs),
    /// Delete a question.
    DeleteQuestion { id: QuestionId },
    /// Show courses with question counts and estimated workload.
    Courses,
    /// Create a course.
    AddCourse {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Rename a course or change its description.
    EditCourse(EditCourseArgs),
    /// Delete a course that has no questions.
    DeleteCourse { id: CourseId },
    /// List every tag in use.
    Tags,
    /// Take a timed exam.
    Exam(ExamArgs),
    /// Study a single question with a stopwatch.
    Study { id: QuestionId },
    /// Show recent exam results.
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    Difficulty,
    Created,
}

#[derive(Debug, Args)]
struct QuestionsArgs {
    #[arg(long)]
    course: Option<CourseId>,
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Match questions carrying any of these tags (repeatable).
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Case-insensitive text search over title, content and tags.
    #[arg(long)]
    search: Option<String>,
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
}

impl QuestionsArgs {
    fn filter(&self) -> anyhow::Result<QuestionFilter> {
        let mut filter = QuestionFilter::all();
        if let Some(course) = &self.course {
            filter = filter.course(course.clone());
        }
        if let Some(difficulty) = self.difficulty {
            filter = filter.difficulty(difficulty);
        }
        if !self.tags.is_empty() {
            let tags = self
                .tags
                .iter()
                .map(TagName::new)
                .collect::<Result<Vec<_>, _>>()?;
            filter = filter.tags(tags);
        }
        if let Some(search) = &self.search {
            filter = filter.search(search.clone());
        }
        Ok(filter)
    }

    fn sort(&self) -> QuestionSort {
        let Some(sort) = self.sort else {
            return QuestionSort::default();
        };
        let field = match sort {
            SortArg::Title => SortField::Title,
            SortArg::Difficulty => SortField::Difficulty,
            SortArg::Created => SortField::CreatedAt,
        };
        QuestionSort {
            field,
            direction: if self.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        }
    }
}

#[derive(Debug, Args)]
struct AddQuestionArgs {
    #[arg(long)]
    course: CourseId,
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    #[arg(long)]
    difficulty: Difficulty,
    /// Comma-separated tags.
    #[arg(long, default_value = "")]
    tags: String,
    /// Estimated minutes to solve.
    #[arg(long)]
    minutes: Option<u32>,
    #[arg(long)]
    solution: Option<String>,
    #[arg(long = "hint")]
    hints: Vec<String>,
    #[arg(long)]
    image_url: Option<String>,
}

impl AddQuestionArgs {
    fn into_draft(self) -> QuestionDraft {
        let mut draft = QuestionDraft::new(self.course, self.title, self.content, self.difficulty)
            .with_tags(TagName::parse_list(&self.tags));
        if let Some(minutes) = self.minutes {
            draft = draft.with_time_estimate(minutes);
        }
        draft.solution = self.solution;
        draft.hints = self.hints;
        draft.image_url = self.image_url;
        draft
    }
}

#[derive(Debug, Args)]
struct EditQuestionArgs {
    id: QuestionId,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Move the question to another course.
    #[arg(long)]
    course: Option<CourseId>,
    /// Comma-separated tags; replaces the current set.
    #[arg(long)]
    tags: Option<String>,
    #[arg(long, conflicts_with = "clear_minutes")]
    minutes: Option<u32>,
    #[arg(long)]
    clear_minutes: bool,
    #[arg(long, conflicts_with = "clear_solution")]
    solution: Option<String>,
    #[arg(long)]
    clear_solution: bool,
    /// Replaces every hint (repeatable).
    #[arg(long = "hint", conflicts_with = "clear_hints")]
    hints: Vec<String>,
    #[arg(long)]
    clear_hints: bool,
    #[arg(long, conflicts_with = "clear_image_url")]
    image_url: Option<String>,
    #[arg(long)]
    clear_image_url: bool,
}

impl EditQuestionArgs {
    fn patch(&self) -> QuestionPatch {
        QuestionPatch {
            title: self.title.clone(),
            content: self.content.clone(),
            difficulty: self.difficulty,
            course_id: self.course.clone(),
            tags: self.tags.as_deref().map(TagName::parse_list),
            solution: clearable(self.solution.clone(), self.clear_solution),
            hints: if self.clear_hints {
                Some(Vec::new())
            } else if self.hints.is_empty() {
                None
            } else {
                Some(self.hints.clone())
            },
            time_estimate_minutes: clearable(self.minutes, self.clear_minutes),
            image_url: clearable(self.image_url.clone(), self.clear_image_url),
            ..QuestionPatch::default()
        }
    }
}

/// `Some(None)` clears the field, `None` leaves it alone.
fn clearable<T>(value: Option<T>, clear: bool) -> Option<Option<T>> {
    if clear { Some(None) } else { value.map(Some) }
}

#[derive(Debug, Args)]
struct EditCourseArgs {
    id: CourseId,
    #[arg(long)]
    name: Option<String>,
    /// New description; an empty string removes it.
    #[arg(long)]
    description: Option<String>,
}

impl EditCourseArgs {
    /// Draft carrying the requested changes over the course's current values.
    fn draft_over(&self, current: &Course) -> CourseDraft {
        CourseDraft::new(
            self.name.clone().unwrap_or_else(|| current.name().to_string()),
            self.description
                .clone()
                .or_else(|| current.description().map(str::to_string)),
        )
    }
}

#[derive(Debug, Args)]
struct ExamArgs {
    /// Setup as a query string, e.g. `course=1&difficulty=hard&duration=45`.
    /// Overrides the individual flags.
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    course: Option<String>,
    #[arg(long)]
    difficulty: Option<String>,
    /// Minutes; the setup screen offers 20, 45 and 90.
    #[arg(long, default_value_t = DEFAULT_DURATION_MINUTES)]
    duration: u32,
    /// Comma-separated topics; ignored with --random.
    #[arg(long, default_value = "")]
    topics: String,
    /// Shuffle questions and ignore topics.
    #[arg(long)]
    random: bool,
}

impl ExamArgs {
    fn into_query(self) -> ExamQuery {
        if let Some(raw) = self.query {
            return ExamQuery::parse(&raw);
        }
        ExamQuery {
            course: self.course,
            difficulty: self.difficulty,
            duration_minutes: normalize_duration(self.duration),
            topics: self
                .topics
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            random: self.random,
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    let storage = Storage::sqlite(&db_url)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    tracing::debug!(%db_url, "storage ready");

    let ctx = AppContext {
        clock: Clock::default_clock(),
        storage,
        notifier: Arc::new(ConsoleNotifier),
        navigator: Arc::new(ConsoleNavigator),
        tick_period: Duration::from_millis(cli.tick_ms),
    };

    match cli.command {
        Command::Seed { now } => {
            let now = now.unwrap_or_else(|| ctx.clock.now());
            let report = seed_sample_data(&ctx.storage, now).await?;
            println!(
                "Seeded {} courses ({} new questions, {} already present)",
                report.courses, report.questions_inserted, report.questions_skipped
            );
            Ok(())
        }
        Command::Questions(args) => {
            let filter = args.filter()?;
            catalog::list_questions(&ctx, &filter, args.sort()).await
        }
        Command::AddQuestion(args) => catalog::add_question(&ctx, args.into_draft()).await,
        Command::EditQuestion(args) => catalog::edit_question(&ctx, &args.id, args.patch()).await,
        Command::DeleteQuestion { id } => catalog::delete_question(&ctx, &id).await,
        Command::Courses => catalog::list_courses(&ctx).await,
        Command::AddCourse { name, description } => {
            catalog::add_course(&ctx, CourseDraft::new(name, description)).await
        }
        Command::EditCourse(args) => {
            catalog::edit_course(&ctx, &args.id, |current| args.draft_over(current)).await
        }
        Command::DeleteCourse { id } => catalog::delete_course(&ctx, &id).await,
        Command::Tags => catalog::list_tags(&ctx).await,
        Command::Exam(args) => exam::run(&ctx, args.into_query()).await,
        Command::Study { id } => study::run(&ctx, id).await,
        Command::History { limit } => catalog::history(&ctx, limit).await,
    }
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn exam_flags_build_the_same_query_as_a_query_string() {
        let cli = Cli::try_parse_from([
            "mindlock",
            "exam",
            "--course",
            "algo",
            "--difficulty",
            "hard",
            "--duration",
            "45",
            "--topics",
            "graphs, bfs",
        ])
        .unwrap();
        let Command::Exam(args) = cli.command else {
            panic!("expected exam command");
        };
        let from_flags = args.into_query();
        let parsed = ExamQuery::parse("course=algo&difficulty=hard&duration=45&topics=graphs,bfs");
        assert_eq!(from_flags, parsed);
        assert_eq!(from_flags.duration_secs(), 2700);
    }

    #[test]
    fn zero_duration_flag_falls_back_like_the_query_string() {
        let cli = Cli::try_parse_from(["mindlock", "exam", "--course", "algo", "--duration", "0"])
            .unwrap();
        let Command::Exam(args) = cli.command else {
            panic!("expected exam command");
        };
        let from_flags = args.into_query();
        assert_eq!(from_flags, ExamQuery::parse("course=algo&duration=0"));
        assert_eq!(from_flags.duration_secs(), 1200);
    }

    #[test]
    fn questions_sort_defaults_to_newest_first() {
        let cli = Cli::try_parse_from(["mindlock", "questions", "--tag", "graphs"]).unwrap();
        let Command::Questions(args) = cli.command else {
            panic!("expected questions command");
        };
        assert_eq!(args.sort(), QuestionSort::default());
        assert!(args.filter().is_ok());

        let cli = Cli::try_parse_from(["mindlock", "questions", "--sort", "title", "--desc"])
            .unwrap();
        let Command::Questions(args) = cli.command else {
            panic!("expected questions command");
        };
        assert_eq!(args.sort().field, SortField::Title);
        assert_eq!(args.sort().direction, SortDirection::Desc);
    }

    #[test]
    fn edit_question_flags_touch_only_named_fields() {
        let cli = Cli::try_parse_from([
            "mindlock",
            "edit-question",
            "q1",
            "--title",
            "Binary Search II",
            "--difficulty",
            "hard",
            "--tags",
            "search, arrays",
            "--clear-solution",
        ])
        .unwrap();
        let Command::EditQuestion(args) = cli.command else {
            panic!("expected edit-question command");
        };
        assert_eq!(args.id.as_str(), "q1");

        let patch = args.patch();
        assert_eq!(patch.title.as_deref(), Some("Binary Search II"));
        assert_eq!(patch.difficulty, Some(Difficulty::Hard));
        assert_eq!(
            patch.tags,
            Some(vec![TagName::new("search").unwrap(), TagName::new("arrays").unwrap()])
        );
        assert_eq!(patch.solution, Some(None));
        assert_eq!(patch.content, None);
        assert_eq!(patch.hints, None);
        assert_eq!(patch.time_estimate_minutes, None);
        assert_eq!(patch.user_answer, None);
    }

    #[test]
    fn edit_question_without_flags_is_an_empty_patch() {
        let cli = Cli::try_parse_from(["mindlock", "edit-question", "q1"]).unwrap();
        let Command::EditQuestion(args) = cli.command else {
            panic!("expected edit-question command");
        };
        assert!(args.patch().is_empty());

        let conflicting = Cli::try_parse_from([
            "mindlock",
            "edit-question",
            "q1",
            "--minutes",
            "5",
            "--clear-minutes",
        ]);
        assert!(conflicting.is_err());
    }

    #[test]
    fn edit_course_keeps_unnamed_fields() {
        let current = Course::new(
            CourseId::new("1").unwrap(),
            CourseDraft::new("Algorithms", Some("Sorting and searching".into())),
            mindlock_core::time::fixed_now(),
        )
        .unwrap();

        let cli = Cli::try_parse_from(["mindlock", "edit-course", "1", "--name", "Algorithms II"])
            .unwrap();
        let Command::EditCourse(args) = cli.command else {
            panic!("expected edit-course command");
        };
        let draft = args.draft_over(&current);
        assert_eq!(draft.name, "Algorithms II");
        assert_eq!(draft.description.as_deref(), Some("Sorting and searching"));

        let cli = Cli::try_parse_from(["mindlock", "edit-course", "1", "--description", ""])
            .unwrap();
        let Command::EditCourse(args) = cli.command else {
            panic!("expected edit-course command");
        };
        let draft = args.draft_over(&current);
        assert_eq!(draft.name, "Algorithms");
        assert_eq!(draft.description.as_deref(), Some(""));
    }
}
