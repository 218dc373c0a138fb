//! Wall-clock anchored session timer.
//!
//! The timer never schedules anything itself. Callers feed it the current time
//! (`start`, `tick`, `pause`) from their `Clock`, and elapsed time is always
//! recomputed from the anchor instead of being incremented per tick, so uneven
//! tick intervals cannot accumulate drift.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

type CompletionCallback = Box<dyn FnMut() + Send + 'static>;

/// What a timer operation observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The timer was not running; nothing changed.
    Idle,
    /// Still running with the given elapsed seconds.
    Running { elapsed_secs: u64 },
    /// Stopped by `pause`, keeping the given elapsed seconds.
    Paused { elapsed_secs: u64 },
    /// The budget was exhausted by this call. Reported once per start/reset cycle.
    Completed,
}

/// Countdown (bounded) or stopwatch (unbounded) timer.
///
/// A budget of `0` means unbounded: the timer counts up forever and never completes.
pub struct SessionTimer {
    budget_secs: u64,
    elapsed_secs: u64,
    anchor: Option<DateTime<Utc>>,
    running: bool,
    complete: bool,
    completion_fired: bool,
    on_complete: Option<CompletionCallback>,
}

impl SessionTimer {
    #[must_use]
    pub fn new(budget_secs: u64) -> Self {
        Self {
            budget_secs,
            elapsed_secs: 0,
            anchor: None,
            running: false,
            complete: false,
            completion_fired: false,
            on_complete: None,
        }
    }

    /// Stopwatch with no budget.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Countdown over `minutes` whole minutes.
    #[must_use]
    pub fn countdown_minutes(minutes: u32) -> Self {
        Self::new(u64::from(minutes) * 60)
    }

    /// Register a callback invoked exactly once when a bounded timer completes.
    #[must_use]
    pub fn with_on_complete(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Start or resume the timer.
    ///
    /// Returns `false` when already running, or when a completed timer has not
    /// been reset yet. Resuming keeps previously accumulated time.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.running || self.complete {
            return false;
        }
        let elapsed = i64::try_from(self.elapsed_secs).unwrap_or(i64::MAX);
        self.anchor = Some(now - Duration::seconds(elapsed));
        self.running = true;
        true
    }

    /// Recompute elapsed time from the wall clock and check for completion.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerEvent {
        if !self.running {
            return TimerEvent::Idle;
        }
        let Some(anchor) = self.anchor else {
            self.running = false;
            return TimerEvent::Idle;
        };

        // Never move backwards, even if the wall clock does.
        let measured = whole_secs_between(anchor, now);
        self.elapsed_secs = self.elapsed_secs.max(measured);

        if self.is_bounded() && self.elapsed_secs >= self.budget_secs {
            self.elapsed_secs = self.budget_secs;
            self.running = false;
            self.complete = true;
            self.anchor = None;
            if !self.completion_fired {
                self.completion_fired = true;
                if let Some(callback) = self.on_complete.as_mut() {
                    callback();
                }
                return TimerEvent::Completed;
            }
            return TimerEvent::Idle;
        }

        TimerEvent::Running {
            elapsed_secs: self.elapsed_secs,
        }
    }

    /// Stop accumulating time, folding in the time elapsed since the last tick.
    ///
    /// If that final fold exhausts the budget the timer completes instead.
    pub fn pause(&mut self, now: DateTime<Utc>) -> TimerEvent {
        match self.tick(now) {
            TimerEvent::Running { elapsed_secs } => {
                self.running = false;
                self.anchor = None;
                TimerEvent::Paused { elapsed_secs }
            }
            other => other,
        }
    }

    /// Back to zero, stopped, and re-armed for a fresh completion.
    pub fn reset(&mut self) {
        self.elapsed_secs = 0;
        self.anchor = None;
        self.running = false;
        self.complete = false;
        self.completion_fired = false;
    }

    /// Elapsed seconds as of `now` without mutating the timer.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> u64 {
        let live = match (self.running, self.anchor) {
            (true, Some(anchor)) => self.elapsed_secs.max(whole_secs_between(anchor, now)),
            _ => self.elapsed_secs,
        };
        if self.is_bounded() {
            live.min(self.budget_secs)
        } else {
            live
        }
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn budget_secs(&self) -> u64 {
        self.budget_secs
    }

    /// Seconds left in the budget; `None` for unbounded timers.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u64> {
        self.is_bounded()
            .then(|| self.budget_secs.saturating_sub(self.elapsed_secs))
    }

    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.budget_secs > 0
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Stopwatch view used by study sessions.
    #[must_use]
    pub fn elapsed_display(&self) -> TimeDisplay {
        TimeDisplay::from_secs(self.elapsed_secs)
    }

    /// Countdown view used by exam sessions. Unbounded timers show zero.
    #[must_use]
    pub fn remaining_display(&self) -> TimeDisplay {
        TimeDisplay::from_secs(self.remaining_secs().unwrap_or(0))
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl fmt::Debug for SessionTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTimer")
            .field("budget_secs", &self.budget_secs)
            .field("elapsed_secs", &self.elapsed_secs)
            .field("anchor", &self.anchor)
            .field("running", &self.running)
            .field("complete", &self.complete)
            .field("has_on_complete", &self.on_complete.is_some())
            .finish()
    }
}

fn whole_secs_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}

/// Hours/minutes/seconds split of a number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeDisplay {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeDisplay {
    #[must_use]
    pub fn from_secs(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    /// Always `HH:MM:SS`.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }

    /// `MM:SS` when under an hour, `HH:MM:SS` otherwise.
    #[must_use]
    pub fn short(&self) -> String {
        if self.hours == 0 {
            format!("{:02}:{:02}", self.minutes, self.seconds)
        } else {
            self.formatted()
        }
    }

    #[must_use]
    pub fn total_secs(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for TimeDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}
