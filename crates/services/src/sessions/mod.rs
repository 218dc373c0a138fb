mod exam;
mod study;
mod ticker;

// Public API of the session subsystem.
pub use exam::{ExamService, ExamSession, ExamStatus, ExamSubmission};
pub use study::{SaveOutcome, SaveState, StudyService, StudySession};
pub use ticker::{DEFAULT_TICK_PERIOD, TickFlow, Tickable, Ticker};
