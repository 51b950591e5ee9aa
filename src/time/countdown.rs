use std::sync::Arc;
use std::time::Duration;

use crate::core::{Error, Result};
use crate::util::duration_to_millis;
use super::clock::{MonotonicClock, SharedClock};

/// Single-shot countdown that reports its expiry exactly once per arming.
///
/// ```
/// use cricket_link::time::{CountdownTimer, ManualClock};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let mut timer = CountdownTimer::with_clock(Duration::from_secs(5), true, Arc::new(clock.clone())).unwrap();
/// assert!(!timer.just_expired());
/// clock.advance(Duration::from_secs(5));
/// assert!(timer.just_expired());
/// assert!(!timer.just_expired());
/// timer.reset();
/// assert!(!timer.just_expired());
/// ```
///
/// Once `just_expired` has fired the timer reads as quiet until `reset`.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    clock: SharedClock,
    duration_ms: u64,
    /// Clock reading at the last `reset`; `None` if never armed
    armed_at: Option<u64>,
    /// Set once expiry has been reported, or the timer was stopped
    expired: bool,
}

impl CountdownTimer {
    /// Creates a timer on the monotonic system clock.
    ///
    /// With `started` false the timer is born expired and stays quiet until
    /// the first `reset`.
    pub fn new(duration: Duration, started: bool) -> Result<Self> {
        Self::with_clock(duration, started, MonotonicClock::shared())
    }

    /// Creates a timer reading the given clock
    pub fn with_clock(duration: Duration, started: bool, clock: SharedClock) -> Result<Self> {
        let duration_ms = duration_to_millis(duration);
        if duration_ms == 0 {
            return Err(Error::config(format!(
                "Countdown of {:?} is shorter than one millisecond",
                duration
            )));
        }

        let mut timer = CountdownTimer {
            clock,
            duration_ms,
            armed_at: None,
            expired: true,
        };
        if started {
            timer.reset();
        }
        Ok(timer)
    }

    /// Re-arms the timer to expire one full duration from now
    pub fn reset(&mut self) -> &mut Self {
        self.armed_at = Some(self.clock.now_millis());
        self.expired = false;
        self
    }

    /// Silences the timer until the next `reset`
    pub fn stop(&mut self) {
        self.expired = true;
    }

    /// True on the first call at or after the deadline, false on every other call
    pub fn just_expired(&mut self) -> bool {
        if self.expired {
            return false;
        }
        let Some(deadline) = self.deadline() else {
            return false;
        };
        self.expired = self.clock.now_millis() >= deadline;
        self.expired
    }

    /// Blocks until the deadline. Returns at once if the timer is not running.
    pub fn sleep_until_expired(&self) {
        if self.expired {
            return;
        }
        let remaining = self.remaining();
        if !remaining.is_zero() {
            self.clock.sleep(remaining);
        }
    }

    /// Time left before the deadline; zero once past it or when not running
    pub fn remaining(&self) -> Duration {
        if self.expired {
            return Duration::ZERO;
        }
        match self.deadline() {
            Some(deadline) => Duration::from_millis(deadline.saturating_sub(self.clock.now_millis())),
            None => Duration::ZERO,
        }
    }

    /// The countdown length this timer was built with
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    fn deadline(&self) -> Option<u64> {
        self.armed_at.map(|t| t.saturating_add(self.duration_ms))
    }
}

/// Builds the timers of one session against a single clock
#[derive(Debug, Clone)]
pub struct TimerFactory {
    clock: SharedClock,
}

impl TimerFactory {
    pub fn new(clock: SharedClock) -> Self {
        TimerFactory { clock }
    }

    /// A timer running from now
    pub fn started(&self, duration: Duration) -> Result<CountdownTimer> {
        CountdownTimer::with_clock(duration, true, Arc::clone(&self.clock))
    }

    /// A timer that stays quiet until its first `reset`
    pub fn idle(&self, duration: Duration) -> Result<CountdownTimer> {
        CountdownTimer::with_clock(duration, false, Arc::clone(&self.clock))
    }
}

impl Default for TimerFactory {
    fn default() -> Self {
        TimerFactory::new(MonotonicClock::shared())
    }
}
