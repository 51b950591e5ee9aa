use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::util::duration_to_millis;

/// Millisecond time source the countdown timers read from
pub trait Clock: Send + Sync + fmt::Debug {
    /// Milliseconds since an arbitrary, fixed origin. Never goes backwards.
    fn now_millis(&self) -> u64;

    /// Blocks the calling thread for `duration`
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock handle shared between the timers of one session
pub type SharedClock = Arc<dyn Clock>;

/// Monotonic system clock, immune to wall-clock adjustments
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock { origin: Instant::now() }
    }

    /// Returns a shareable handle to a fresh monotonic clock
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        duration_to_millis(self.origin.elapsed())
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Clones share the same time, so a test keeps one handle and gives another
/// to the session under test. `sleep` moves time forward instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward
    pub fn advance(&self, duration: Duration) {
        self.now.fetch_add(duration_to_millis(duration), Ordering::SeqCst);
    }

    /// Moves time forward by whole milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
