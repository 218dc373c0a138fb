//! Recurring tick driver for sessions.
//!
//! A `Ticker` owns a tokio task that wakes every `period` and feeds the current
//! time to a session behind `Weak<Mutex<_>>`. The task holds no strong
//! reference, so dropping the session stops the driver at its next wake-up.
//! Cancelling or dropping the `Ticker` aborts the task immediately.

use std::sync::{Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::Clock;

/// Tick period used by interactive sessions.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(200);

/// What the driver should do after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickFlow<T> {
    Continue,
    /// Stop without producing anything.
    Stop,
    /// Stop and hand `T` to whoever joins the ticker.
    Finished(T),
}

/// Something that advances with time.
pub trait Tickable: Send + 'static {
    type Outcome: Send + 'static;

    fn on_tick(&mut self, now: DateTime<Utc>) -> TickFlow<Self::Outcome>;
}

/// Handle to a running tick loop.
#[derive(Debug)]
pub struct Ticker<T> {
    handle: Option<JoinHandle<Option<T>>>,
}

impl<T: Send + 'static> Ticker<T> {
    /// Start ticking `target` every `period` on the current tokio runtime.
    ///
    /// The first tick fires immediately. Each tick reads `clock` once at spawn
    /// and adds tokio's monotonic elapsed time, so wall-clock jumps never reach
    /// the session.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, or if `period` is zero.
    #[must_use]
    pub fn spawn<S>(clock: Clock, period: Duration, target: Weak<Mutex<S>>) -> Self
    where
        S: Tickable<Outcome = T>,
    {
        let handle = tokio::spawn(async move {
            let base = clock.pinned();
            let origin = Instant::now();
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let Some(session) = target.upgrade() else {
                    tracing::debug!("tick target dropped; stopping");
                    return None;
                };
                let mut at = base;
                at.advance_std(origin.elapsed());
                let now = at.now();
                let flow = match session.lock() {
                    Ok(mut guard) => guard.on_tick(now),
                    Err(_) => {
                        tracing::warn!("tick target lock poisoned; stopping");
                        return None;
                    }
                };
                match flow {
                    TickFlow::Continue => {}
                    TickFlow::Stop => return None,
                    TickFlow::Finished(outcome) => return Some(outcome),
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Abort the loop. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// `true` once the loop has ended for any reason.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the loop to end and take what it produced.
    ///
    /// Cancel-safe: dropping the future leaves the loop running, so this can
    /// sit in a `tokio::select!`. Returns `None` immediately once the outcome
    /// was taken, and when the loop stopped without one or was cancelled.
    pub async fn wait(&mut self) -> Option<T> {
        let handle = self.handle.as_mut()?;
        let outcome = handle.await.ok().flatten();
        self.handle = None;
        outcome
    }

    /// Consuming form of [`Ticker::wait`].
    pub async fn join(mut self) -> Option<T> {
        self.wait().await
    }
}

impl<T> Drop for Ticker<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
