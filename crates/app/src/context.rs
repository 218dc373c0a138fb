use std::sync::Arc;
use std::time::Duration;

use services::{
    Clock, CourseService, ExamService, Navigator, Notifier, QuestionService, StudyService,
};
use storage::repository::Storage;

/// Everything a command needs: the store, the clock and the user-facing seams.
#[derive(Clone)]
pub struct AppContext {
    pub clock: Clock,
    pub storage: Storage,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
    pub tick_period: Duration,
}

impl AppContext {
    pub fn questions(&self) -> QuestionService {
        QuestionService::new(
            self.clock,
            Arc::clone(&self.storage.questions),
            Arc::clone(&self.storage.courses),
        )
    }

    pub fn courses(&self) -> CourseService {
        CourseService::new(
            self.clock,
            Arc::clone(&self.storage.courses),
            Arc::clone(&self.storage.questions),
        )
    }

    pub fn exams(&self) -> ExamService {
        ExamService::new(
            self.clock,
            Arc::clone(&self.storage.questions),
            Arc::clone(&self.storage.exam_records),
            Arc::clone(&self.notifier),
            Arc::clone(&self.navigator),
        )
    }

    pub fn study(&self) -> StudyService {
        StudyService::new(
            self.clock,
            Arc::clone(&self.storage.questions),
            Arc::clone(&self.notifier),
            Arc::clone(&self.navigator),
        )
    }
}
