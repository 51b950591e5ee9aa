//! Timing primitives
//!
//! Every timeout in the link protocol is a [`CountdownTimer`]: lookout
//! announcements, unconfirmed connection ids, peer silence and resend
//! suppression. Timers read a [`Clock`], normally the monotonic system clock:
//!
//! - [`MonotonicClock`] for real deployments, unaffected by wall-clock changes
//! - [`ManualClock`] for tests and simulations that step time by hand
//!
//! # Examples
//!
//! ```no_run
//! use cricket_link::time::CountdownTimer;
//! use std::time::Duration;
//!
//! let mut lookout = CountdownTimer::new(Duration::from_secs(2), true).unwrap();
//! loop {
//!     if lookout.just_expired() {
//!         println!("announce");
//!         lookout.reset();
//!     }
//!     std::thread::sleep(Duration::from_millis(50));
//! }
//! ```

mod clock;
mod countdown;

pub use self::clock::{Clock, ManualClock, MonotonicClock, SharedClock};
pub use self::countdown::{CountdownTimer, TimerFactory};
