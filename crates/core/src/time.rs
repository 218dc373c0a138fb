//! Injected time.
//!
//! Nothing in the domain reads the system clock directly; callers pass a
//! `DateTime<Utc>` obtained from a `Clock`. Session drivers take one reading
//! with [`Clock::pinned`] and move it forward by monotonic elapsed time, so a
//! wall-clock jump never reaches a running timer.

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for sessions, services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    /// System time.
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// A fixed clock holding this clock's current reading.
    #[must_use]
    pub fn pinned(&self) -> Self {
        Self::Fixed(self.now())
    }

    /// Move a fixed clock forward (or back, for negative deltas). No effect on
    /// `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    pub fn advance_secs(&mut self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    /// Advance by a monotonic `std` duration, as measured by an `Instant`.
    /// Durations beyond chrono's range are ignored.
    pub fn advance_std(&mut self, delta: std::time::Duration) {
        if let Ok(delta) = Duration::from_std(delta) {
            self.advance(delta);
        }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        matches!(self, Clock::Default)
    }
}

/// 2023-11-14T22:13:20Z, the reference instant of every fixed-clock test.
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// `FIXED_TEST_TIMESTAMP` as a `DateTime<Utc>`.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_and_default_ignores_it() {
        let mut clock = fixed_clock();
        clock.advance_secs(90);
        assert_eq!(clock.now(), fixed_now() + Duration::seconds(90));

        let mut real = Clock::default_clock();
        real.advance_secs(90);
        assert!(real.is_default());
    }

    #[test]
    fn pinned_clock_moves_only_by_monotonic_offsets() {
        let mut pinned = fixed_clock().pinned();
        pinned.advance_std(std::time::Duration::from_millis(2_500));
        assert_eq!(pinned.now(), fixed_now() + Duration::milliseconds(2_500));

        let mut from_system = Clock::default_clock().pinned();
        let first = from_system.now();
        assert_eq!(from_system.now(), first);
        from_system.advance_std(std::time::Duration::from_secs(1));
        assert_eq!(from_system.now(), first + Duration::seconds(1));
    }
}
