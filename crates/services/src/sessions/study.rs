use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use mindlock_core::model::{Question, QuestionId, QuestionPatch};
use mindlock_core::{SessionTimer, TimeDisplay, TimerEvent};
use storage::repository::QuestionRepository;

use crate::Clock;
use crate::error::StudyError;
use crate::notify::{Navigator, Notifier, QUESTIONS_ROUTE};
use super::ticker::{TickFlow, Tickable};

/// Where the draft answer stands relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    /// A save is in flight; further saves are ignored until it settles.
    Saving,
    /// The draft matches what was last stored.
    Saved,
}

/// Result of a `StudyService::save` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to store, or another save is in flight.
    Skipped,
    Saved,
    /// The store rejected the write; the draft stays unsynchronized.
    Failed,
}

/// Open-ended practice on a single question with a stopwatch.
#[derive(Debug)]
pub struct StudySession {
    question: Question,
    user_answer: String,
    persisted_answer: String,
    save_state: SaveState,
    timer: SessionTimer,
}

impl StudySession {
    /// Open a session and start its stopwatch.
    #[must_use]
    pub fn new(question: Question, now: DateTime<Utc>) -> Self {
        let saved = question.user_answer.clone().unwrap_or_default();
        let mut timer = SessionTimer::unbounded();
        timer.start(now);
        Self {
            question,
            user_answer: saved.clone(),
            persisted_answer: saved,
            save_state: SaveState::Idle,
            timer,
        }
    }

    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn user_answer(&self) -> &str {
        &self.user_answer
    }

    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.save_state
    }

    /// Replace the draft answer. Any edit clears the "Saved" indicator.
    pub fn set_answer(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.user_answer {
            return;
        }
        self.user_answer = text;
        if self.save_state == SaveState::Saved {
            self.save_state = SaveState::Idle;
        }
    }

    /// The draft differs from what the store holds.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.user_answer != self.persisted_answer
    }

    #[must_use]
    pub fn can_save(&self) -> bool {
        self.is_dirty() && self.save_state != SaveState::Saving
    }

    /// Claim the save slot. Returns the text to store, or `None` when there is
    /// nothing to save or a save is already in flight.
    pub fn begin_save(&mut self) -> Option<String> {
        if !self.can_save() {
            return None;
        }
        self.save_state = SaveState::Saving;
        Some(self.user_answer.clone())
    }

    /// Settle the in-flight save of `stored`.
    pub fn finish_save(&mut self, stored: &str, succeeded: bool) {
        if succeeded {
            self.persisted_answer = stored.to_string();
            self.question.user_answer = Some(stored.to_string());
            self.save_state = if self.is_dirty() {
                SaveState::Idle
            } else {
                SaveState::Saved
            };
        } else {
            self.save_state = SaveState::Idle;
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> TimerEvent {
        self.timer.pause(now)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        self.timer.start(now)
    }

    pub fn reset(&mut self) {
        self.timer.reset();
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerEvent {
        self.timer.tick(now)
    }

    #[must_use]
    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    /// Stopwatch shown while studying.
    #[must_use]
    pub fn elapsed_display(&self) -> TimeDisplay {
        self.timer.elapsed_display()
    }
}

impl Tickable for StudySession {
    type Outcome = ();

    fn on_tick(&mut self, now: DateTime<Utc>) -> TickFlow<()> {
        match self.tick(now) {
            TimerEvent::Running { .. } => TickFlow::Continue,
            _ => TickFlow::Stop,
        }
    }
}

/// Loads study sessions and stores their answers.
#[derive(Clone)]
pub struct StudyService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl StudyService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            clock,
            questions,
            notifier,
            navigator,
        }
    }

    /// Open a study session on the question with the given id.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::NotFound` when the id does not resolve; the user is
    /// told and sent back to the question list.
    /// Returns `StudyError::Storage` if the question cannot be loaded.
    pub async fn open(&self, id: &QuestionId) -> Result<StudySession, StudyError> {
        match self.questions.get_question(id).await {
            Ok(Some(question)) => {
                tracing::debug!(%id, "study session opened");
                Ok(StudySession::new(question, self.clock.now()))
            }
            Ok(None) => {
                self.notifier.notify_error("Question not found");
                self.navigator.go_to(QUESTIONS_ROUTE);
                Err(StudyError::NotFound(id.clone()))
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "failed to load question");
                self.notifier.notify_error("Failed to load question");
                Err(err.into())
            }
        }
    }

    /// Store the session's draft answer if it changed.
    ///
    /// A second call while a save is in flight returns `SaveOutcome::Skipped`
    /// without touching the store. Store failures are reported through the
    /// notifier and leave the draft unsynchronized.
    ///
    /// # Errors
    ///
    /// Returns `StudyError::Poisoned` if the session lock is poisoned.
    pub async fn save(&self, session: &Mutex<StudySession>) -> Result<SaveOutcome, StudyError> {
        let (id, answer) = {
            let mut guard = session.lock().map_err(|_| StudyError::Poisoned)?;
            let Some(answer) = guard.begin_save() else {
                return Ok(SaveOutcome::Skipped);
            };
            (guard.question().id.clone(), answer)
        };

        let result = self.store_answer(&id, &answer).await;

        let mut guard = session.lock().map_err(|_| StudyError::Poisoned)?;
        match result {
            Ok(()) => {
                guard.finish_save(&answer, true);
                drop(guard);
                self.notifier.notify_success("Answer saved successfully");
                Ok(SaveOutcome::Saved)
            }
            Err(err) => {
                guard.finish_save(&answer, false);
                drop(guard);
                tracing::warn!(%id, error = %err, "failed to save answer");
                self.notifier.notify_error("Failed to save answer");
                Ok(SaveOutcome::Failed)
            }
        }
    }

    async fn store_answer(&self, id: &QuestionId, answer: &str) -> Result<(), StudyError> {
        let mut question = self
            .questions
            .get_question(id)
            .await?
            .ok_or_else(|| StudyError::NotFound(id.clone()))?;
        question.apply_patch(QuestionPatch::user_answer(answer), self.clock.now())?;
        self.questions.update_question(&question).await?;
        Ok(())
    }
}
