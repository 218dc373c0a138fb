use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mindlock_core::model::{
    CourseId, Difficulty, ExamRecord, Question, QuestionFilter, QuestionId, SubmitReason,
};
use mindlock_core::{SessionTimer, TimeDisplay, TimerEvent};
use rand::rng;
use rand::seq::SliceRandom;
use storage::repository::{ExamRecordRepository, ExamRecordRow, QuestionRepository};

use crate::Clock;
use crate::config::ExamConfig;
use crate::error::ExamError;
use crate::notify::{DASHBOARD_ROUTE, Navigator, Notifier};
use super::ticker::{TickFlow, Tickable};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamStatus {
    /// Built but the countdown has not started.
    Ready,
    Running,
    /// Terminal: answers were handed off.
    Submitted,
    /// Terminal: nothing matched the configuration, so no timer runs.
    NoQuestions,
}

impl ExamStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ExamStatus::Submitted | ExamStatus::NoQuestions)
    }
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// Everything an exam produced, captured at the moment it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSubmission {
    pub course: CourseId,
    pub difficulty: Difficulty,
    pub started_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub budget_secs: u64,
    pub elapsed_secs: u64,
    pub reason: SubmitReason,
    pub question_ids: Vec<QuestionId>,
    pub answers: BTreeMap<QuestionId, String>,
}

impl ExamSubmission {
    /// Convert into the persisted record.
    ///
    /// # Errors
    ///
    /// Returns `ExamRecordError` if the captured values are inconsistent.
    pub fn into_record(self) -> Result<ExamRecord, mindlock_core::model::ExamRecordError> {
        ExamRecord::new(
            self.course,
            self.difficulty,
            self.started_at,
            self.submitted_at,
            self.budget_secs,
            self.elapsed_secs,
            self.reason,
            self.question_ids,
            self.answers,
        )
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Fixed-duration, multi-question exam.
///
/// The question order is settled at construction and never changes. Moving
/// between questions does not touch the countdown.
#[derive(Debug)]
pub struct ExamSession {
    course: CourseId,
    difficulty: Difficulty,
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<QuestionId, String>,
    timer: SessionTimer,
    status: ExamStatus,
    started_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Build a session over already-resolved questions, shuffling them once
    /// when the configuration asks for a random order.
    #[must_use]
    pub fn new(config: &ExamConfig, mut questions: Vec<Question>) -> Self {
        if config.randomize {
            let mut rng = rng();
            questions.as_mut_slice().shuffle(&mut rng);
        }
        let status = if questions.is_empty() {
            ExamStatus::NoQuestions
        } else {
            ExamStatus::Ready
        };

        Self {
            course: config.course.clone(),
            difficulty: config.difficulty,
            questions,
            current: 0,
            answers: HashMap::new(),
            timer: SessionTimer::countdown_minutes(config.duration_minutes),
            status,
            started_at: None,
        }
    }

    /// Replace the countdown budget of a session that has not started.
    #[must_use]
    pub fn with_budget_secs(mut self, budget_secs: u64) -> Self {
        if self.status == ExamStatus::Ready {
            self.timer = SessionTimer::new(budget_secs);
        }
        self
    }

    /// Start the countdown. Only a `Ready` session starts.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != ExamStatus::Ready {
            return false;
        }
        self.timer.start(now);
        self.started_at = Some(now);
        self.status = ExamStatus::Running;
        tracing::debug!(
            course = %self.course,
            questions = self.questions.len(),
            budget_secs = self.timer.budget_secs(),
            "exam started"
        );
        true
    }

    /// Refresh the countdown. Returns the submission when this tick exhausted it.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<ExamSubmission> {
        if self.status != ExamStatus::Running {
            return None;
        }
        match self.timer.tick(now) {
            TimerEvent::Completed => Some(self.finish(now, SubmitReason::TimeExpired)),
            _ => None,
        }
    }

    /// Submit on the user's request. Returns `None` once the session is terminal.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Option<ExamSubmission> {
        match self.status {
            ExamStatus::Ready | ExamStatus::Running => {
                if let TimerEvent::Completed = self.timer.pause(now) {
                    return Some(self.finish(now, SubmitReason::TimeExpired));
                }
                Some(self.finish(now, SubmitReason::Manual))
            }
            ExamStatus::Submitted | ExamStatus::NoQuestions => None,
        }
    }

    fn finish(&mut self, now: DateTime<Utc>, reason: SubmitReason) -> ExamSubmission {
        self.status = ExamStatus::Submitted;
        let started_at = self.started_at.unwrap_or(now);
        let submission = ExamSubmission {
            course: self.course.clone(),
            difficulty: self.difficulty,
            started_at,
            submitted_at: now.max(started_at),
            budget_secs: self.timer.budget_secs(),
            elapsed_secs: self.timer.elapsed_secs(),
            reason,
            question_ids: self.questions.iter().map(|q| q.id.clone()).collect(),
            answers: self
                .answers
                .iter()
                .map(|(id, text)| (id.clone(), text.clone()))
                .collect(),
        };
        tracing::info!(
            course = %submission.course,
            reason = reason.as_str(),
            elapsed_secs = submission.elapsed_secs,
            answered = submission.answers.len(),
            "exam submitted"
        );
        submission
    }

    /// Move to the next question. No wraparound.
    pub fn next(&mut self) -> bool {
        self.go_to(self.current + 1)
    }

    /// Move to the previous question. No wraparound.
    pub fn previous(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Jump to a question by position; out-of-range positions are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.questions.len() || index == self.current {
            return false;
        }
        self.current = index;
        true
    }

    /// Record the answer for a question of this exam.
    ///
    /// Ignored after the session ends and for questions that are not part of it.
    pub fn set_answer(&mut self, id: &QuestionId, text: impl Into<String>) -> bool {
        if self.status.is_terminal() || !self.questions.iter().any(|q| &q.id == id) {
            return false;
        }
        self.answers.insert(id.clone(), text.into());
        true
    }

    /// Record the answer for the question on screen.
    pub fn answer_current(&mut self, text: impl Into<String>) -> bool {
        let Some(id) = self.current_question().map(|q| q.id.clone()) else {
            return false;
        };
        self.set_answer(&id, text)
    }

    #[must_use]
    pub fn answer(&self, id: &QuestionId) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, String> {
        &self.answers
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn status(&self) -> ExamStatus {
        self.status
    }

    #[must_use]
    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    /// Countdown shown while the exam runs.
    #[must_use]
    pub fn remaining_display(&self) -> TimeDisplay {
        self.timer.remaining_display()
    }
}

impl Tickable for ExamSession {
    type Outcome = ExamSubmission;

    fn on_tick(&mut self, now: DateTime<Utc>) -> TickFlow<ExamSubmission> {
        match self.tick(now) {
            Some(submission) => TickFlow::Finished(submission),
            None if self.status.is_terminal() => TickFlow::Stop,
            None => TickFlow::Continue,
        }
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Resolves exam questions from the store and hands finished exams back to it.
#[derive(Clone)]
pub struct ExamService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    records: Arc<dyn ExamRecordRepository>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl ExamService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        records: Arc<dyn ExamRecordRepository>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            clock,
            questions,
            records,
            notifier,
            navigator,
        }
    }

    /// Resolve the questions for `config` and start the countdown.
    ///
    /// An empty question set yields a session in `ExamStatus::NoQuestions`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Storage` if the questions cannot be loaded; the
    /// failure is also reported through the notifier.
    pub async fn start_exam(&self, config: &ExamConfig) -> Result<ExamSession, ExamError> {
        let mut filter = QuestionFilter::all()
            .course(config.course.clone())
            .difficulty(config.difficulty);
        if !config.randomize {
            filter = filter.tags(config.topics.clone());
        }

        let questions = match self.questions.list_questions(&filter).await {
            Ok(questions) => questions,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load exam questions");
                self.notifier.notify_error("Failed to load exam questions");
                return Err(err.into());
            }
        };

        let mut session = ExamSession::new(config, questions);
        if session.status() == ExamStatus::NoQuestions {
            self.notifier
                .notify_error("No questions found for the selected criteria.");
        } else {
            session.start(self.clock.now());
        }
        Ok(session)
    }

    /// Persist a finished exam, report the outcome and leave for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `ExamError` if the record is inconsistent or cannot be stored;
    /// the failure is also reported through the notifier.
    pub async fn finish(&self, submission: ExamSubmission) -> Result<i64, ExamError> {
        let result = match submission.into_record() {
            Ok(record) => self
                .records
                .append_record(&record)
                .await
                .map_err(ExamError::from),
            Err(err) => Err(err.into()),
        };

        match &result {
            Ok(id) => {
                tracing::info!(record_id = *id, "exam record stored");
                self.notifier.notify_success("Exam submitted!");
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to store exam record");
                self.notifier.notify_error("Failed to save exam results");
            }
        }
        self.navigator.go_to(DASHBOARD_ROUTE);
        result
    }

    /// Leave a session without submitting it. Nothing is stored.
    pub fn abandon(&self, session: &ExamSession) {
        tracing::info!(
            status = ?session.status(),
            answered = session.answers().len(),
            "exam abandoned"
        );
        self.navigator.go_to(DASHBOARD_ROUTE);
    }

    /// Most recent exam results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Storage` if repository access fails.
    pub async fn recent_records(&self, limit: u32) -> Result<Vec<ExamRecordRow>, ExamError> {
        Ok(self.records.list_records(limit).await?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
