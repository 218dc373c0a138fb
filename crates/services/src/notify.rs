//! User-feedback and navigation seams.
//!
//! Sessions report outcomes through `Notifier` (toast-style messages) and
//! leave their view through `Navigator`. Both are fire-and-forget.

/// Route of the dashboard, shown after an exam ends.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Route of the question list, shown when a study target is missing.
pub const QUESTIONS_ROUTE: &str = "/questions";

pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        tracing::info!(target: "mindlock::notify", message, "success");
    }

    fn notify_error(&self, message: &str) {
        tracing::warn!(target: "mindlock::notify", message, "error");
    }
}

/// Navigator for headless runs: records the route in the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn go_to(&self, path: &str) {
        tracing::debug!(target: "mindlock::navigate", path, "navigate");
    }
}
