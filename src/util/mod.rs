//! Utility module
//!
//! Conversions between the whole-second values used at the configuration
//! boundary and the millisecond counts the countdown timers run on.

use std::time::Duration;

/// Converts whole seconds to a duration
pub fn secs_to_duration(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
