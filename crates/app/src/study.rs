use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use mindlock_core::model::QuestionId;
use services::{SaveOutcome, SaveState, StudyError, StudySession, Ticker};

use crate::console::{split_command, stdin_lines};
use crate::context::AppContext;

/// One line of input while studying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyInput {
    /// Free text replaces the draft answer.
    Answer(String),
    Save,
    Pause,
    Resume,
    Reset,
    Time,
    Hint,
    Solution,
    Show,
    Quit,
    Help,
    Invalid(String),
}

impl StudyInput {
    pub fn parse(line: &str) -> Self {
        match split_command(line) {
            Err(text) => Self::Answer(text.to_string()),
            Ok(("save" | "w", _)) => Self::Save,
            Ok(("pause", _)) => Self::Pause,
            Ok(("resume", _)) => Self::Resume,
            Ok(("reset", _)) => Self::Reset,
            Ok(("time" | "t", _)) => Self::Time,
            Ok(("hint", _)) => Self::Hint,
            Ok(("solution", _)) => Self::Solution,
            Ok(("show", _)) => Self::Show,
            Ok(("quit" | "q", _)) => Self::Quit,
            Ok(("help" | "h", _)) => Self::Help,
            Ok((other, _)) => Self::Invalid(format!("unknown command :{other}")),
        }
    }
}

const HELP: &str = "\
Type an answer and press enter to replace your draft.
  :save             store the draft
  :pause / :resume  stop and restart the stopwatch
  :reset            stopwatch back to zero
  :time             show the stopwatch
  :hint             reveal the next hint
  :solution         show the reference solution
  :show             reprint the question
  :quit             leave";

fn lock(session: &Mutex<StudySession>) -> anyhow::Result<MutexGuard<'_, StudySession>> {
    session
        .lock()
        .map_err(|_| anyhow!("study session lock poisoned"))
}

fn render(session: &StudySession) {
    println!();
    println!("{}", describe(session));
}

fn describe(session: &StudySession) -> String {
    let question = session.question();
    let mut lines = vec![format!("{}  [{}]", question.title, question.difficulty.label())];
    if !question.tags.is_empty() {
        let tags: Vec<&str> = question.tags.iter().map(|t| t.as_str()).collect();
        lines.push(format!("Tags: {}", tags.join(", ")));
    }
    if let Some(minutes) = question.time_estimate_minutes {
        lines.push(format!("Estimated time: {minutes} min"));
    }
    lines.push(question.content.clone());
    if !session.user_answer().is_empty() {
        lines.push(format!("Your answer: {}", session.user_answer()));
    }
    lines.join("\n")
}

/// Open a question for self-paced study on the terminal.
pub async fn run(ctx: &AppContext, id: QuestionId) -> anyhow::Result<()> {
    let service = ctx.study();
    let session = match service.open(&id).await {
        Ok(session) => session,
        // Already reported to the user.
        Err(StudyError::NotFound(_)) => return Ok(()),
        Err(err) => return Err(err.into()),
    };
    render(&session);
    println!("Type :help for commands.");

    let session = Arc::new(Mutex::new(session));
    let spawn_ticker = || Ticker::spawn(ctx.clock, ctx.tick_period, Arc::downgrade(&session));
    let mut ticker = spawn_ticker();
    let mut hints_shown = 0_usize;
    let mut input = stdin_lines();

    while let Some(line) = input.recv().await {
        match StudyInput::parse(&line) {
            StudyInput::Answer(text) if text.is_empty() => {}
            StudyInput::Answer(text) => lock(&session)?.set_answer(text),
            StudyInput::Save => {
                // The outcome is reported through the notifier.
                if service.save(&session).await? == SaveOutcome::Skipped {
                    println!("Nothing new to save.");
                }
            }
            StudyInput::Pause => {
                let mut guard = lock(&session)?;
                guard.pause(ctx.clock.now());
                println!("Paused at {}.", guard.elapsed_display().formatted());
            }
            StudyInput::Resume => {
                if lock(&session)?.resume(ctx.clock.now()) {
                    ticker = spawn_ticker();
                    println!("Stopwatch running.");
                }
            }
            StudyInput::Reset => {
                ticker.cancel();
                lock(&session)?.reset();
                println!("Stopwatch reset. Type :resume to start it again.");
            }
            StudyInput::Time => {
                let guard = lock(&session)?;
                let state = if guard.timer().is_running() { "running" } else { "paused" };
                println!("{} ({state})", guard.elapsed_display().formatted());
            }
            StudyInput::Hint => {
                let guard = lock(&session)?;
                match guard.question().hints.get(hints_shown) {
                    Some(hint) => {
                        hints_shown += 1;
                        println!("Hint {hints_shown}: {hint}");
                    }
                    None => println!("No more hints."),
                }
            }
            StudyInput::Solution => match &lock(&session)?.question().solution {
                Some(solution) => println!("{solution}"),
                None => println!("No solution recorded for this question."),
            },
            StudyInput::Show => render(&*lock(&session)?),
            StudyInput::Quit => break,
            StudyInput::Help => println!("{HELP}"),
            StudyInput::Invalid(message) => println!("{message}"),
        }
    }
    ticker.cancel();

    let guard = lock(&session)?;
    if guard.is_dirty() && guard.save_state() != SaveState::Saving {
        println!("Unsaved answer discarded.");
    }
    tracing::debug!(
        %id,
        elapsed_secs = guard.timer().elapsed_secs(),
        "study session closed"
    );
    Ok(())
}
