#![forbid(unsafe_code)]

pub mod config;
pub mod course_service;
pub mod error;
pub mod notify;
pub mod question_service;
pub mod sessions;

pub use mindlock_core::Clock;

pub use config::{ExamConfig, ExamQuery};
pub use course_service::{CourseService, CourseStats};
pub use error::{ConfigError, CourseServiceError, ExamError, QuestionServiceError, StudyError};
pub use notify::{LoggingNavigator, Navigator, Notifier, TracingNotifier};
pub use question_service::QuestionService;

pub use sessions::{
    ExamService, ExamSession, ExamStatus, ExamSubmission, SaveOutcome, SaveState, StudyService,
    StudySession, TickFlow, Tickable, Ticker,
};
