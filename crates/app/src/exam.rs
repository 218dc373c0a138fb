use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use services::{ExamQuery, ExamSession, ExamStatus, ExamSubmission, Ticker};

use crate::console::{split_command, stdin_lines};
use crate::context::AppContext;

/// One line of input during an exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamInput {
    /// Free text becomes the answer to the current question.
    Answer(String),
    Next,
    Previous,
    /// Zero-based position.
    GoTo(usize),
    Show,
    Submit,
    Quit,
    Help,
    Invalid(String),
}

impl ExamInput {
    pub fn parse(line: &str) -> Self {
        match split_command(line) {
            Err(text) => Self::Answer(text.to_string()),
            Ok(("next" | "n", _)) => Self::Next,
            Ok(("prev" | "p", _)) => Self::Previous,
            Ok(("go", arg)) => match arg.parse::<usize>() {
                Ok(number) if number >= 1 => Self::GoTo(number - 1),
                _ => Self::Invalid(format!("expected a question number, got {arg:?}")),
            },
            Ok(("show" | "time", _)) => Self::Show,
            Ok(("submit", _)) => Self::Submit,
            Ok(("quit" | "q", _)) => Self::Quit,
            Ok(("help" | "h", _)) => Self::Help,
            Ok((other, _)) => Self::Invalid(format!("unknown command :{other}")),
        }
    }
}

enum Ending {
    Submitted(ExamSubmission),
    Abandoned,
}

const HELP: &str = "\
Type an answer and press enter to store it for the current question.
  :next / :prev     move between questions
  :go <n>           jump to question n
  :show             reprint the question and remaining time
  :submit           hand in your answers
  :quit             leave without submitting";

fn lock(session: &Mutex<ExamSession>) -> anyhow::Result<MutexGuard<'_, ExamSession>> {
    session
        .lock()
        .map_err(|_| anyhow!("exam session lock poisoned"))
}

fn render(session: &ExamSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let answer = session.answer(&question.id).unwrap_or("");
    println!();
    println!(
        "Question {}/{}  [{}]  remaining {}",
        session.current_index() + 1,
        session.len(),
        question.difficulty.label(),
        session.remaining_display().short()
    );
    println!("{}", question.title);
    println!("{}", question.content);
    if !answer.is_empty() {
        println!("Your answer: {answer}");
    }
}

/// Run a timed exam on the terminal until it is submitted, expires or is left.
pub async fn run(ctx: &AppContext, query: ExamQuery) -> anyhow::Result<()> {
    let config = query.into_config()?;
    let service = ctx.exams();
    let session = service.start_exam(&config).await?;
    if session.status() == ExamStatus::NoQuestions {
        return Ok(());
    }

    println!(
        "Exam: {} questions, {} minutes. Type :help for commands.",
        session.len(),
        config.duration_minutes
    );
    render(&session);

    let session = Arc::new(Mutex::new(session));
    let mut ticker = Ticker::spawn(ctx.clock, ctx.tick_period, Arc::downgrade(&session));
    let mut input = stdin_lines();

    let ending = loop {
        tokio::select! {
            outcome = ticker.wait() => {
                let Some(submission) = outcome else {
                    return Err(anyhow!("exam timer stopped without submitting"));
                };
                println!();
                println!("Time is up. Submitting your answers.");
                break Ending::Submitted(submission);
            }
            line = input.recv() => {
                let mut guard = lock(&session)?;
                let Some(line) = line else {
                    // End of input hands the exam in.
                    match guard.submit(ctx.clock.now()) {
                        Some(submission) => break Ending::Submitted(submission),
                        None => break Ending::Abandoned,
                    }
                };
                match ExamInput::parse(&line) {
                    ExamInput::Answer(text) if text.is_empty() => {}
                    ExamInput::Answer(text) => {
                        if guard.answer_current(text) {
                            println!("Answer stored for question {}.", guard.current_index() + 1);
                        }
                    }
                    ExamInput::Next => {
                        if guard.next() {
                            render(&guard);
                        } else {
                            println!("Already at the last question.");
                        }
                    }
                    ExamInput::Previous => {
                        if guard.previous() {
                            render(&guard);
                        } else {
                            println!("Already at the first question.");
                        }
                    }
                    ExamInput::GoTo(index) => {
                        if guard.go_to(index) || guard.current_index() == index {
                            render(&guard);
                        } else {
                            println!("There are only {} questions.", guard.len());
                        }
                    }
                    ExamInput::Show => render(&guard),
                    ExamInput::Submit => {
                        if let Some(submission) = guard.submit(ctx.clock.now()) {
                            break Ending::Submitted(submission);
                        }
                    }
                    ExamInput::Quit => break Ending::Abandoned,
                    ExamInput::Help => println!("{HELP}"),
                    ExamInput::Invalid(message) => println!("{message}"),
                }
            }
        }
    };
    ticker.cancel();

    match ending {
        Ending::Submitted(submission) => {
            let answered = submission.answers.len();
            let total = submission.question_ids.len();
            // Failures were already reported through the notifier.
            if let Ok(id) = service.finish(submission).await {
                println!("Exam #{id} stored: {answered}/{total} answered.");
            }
        }
        Ending::Abandoned => service.abandon(&*lock(&session)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_input_parses_commands_and_answers() {
        assert_eq!(ExamInput::parse(":next"), ExamInput::Next);
        assert_eq!(ExamInput::parse(":p"), ExamInput::Previous);
        assert_eq!(ExamInput::parse(":go 2"), ExamInput::GoTo(1));
        assert!(matches!(ExamInput::parse(":go 0"), ExamInput::Invalid(_)));
        assert!(matches!(ExamInput::parse(":explode"), ExamInput::Invalid(_)));
        assert_eq!(
            ExamInput::parse("  two pointers "),
            ExamInput::Answer("two pointers".into())
        );
    }
}
