//! Cricket link: live cricket scores from a scoring workstation to a remote
//! scoreboard over UDP.
//!
//! The transport promises nothing about delivery or ordering, so the link
//! keeps its own notion of "connected" out of countdown timers and the
//! datagrams it sees: a two-step handshake on a connection id chosen by the
//! scoreboard, watchdogs on peer silence, and periodic resends of unchanged
//! scores in place of acknowledgements.
pub mod core;

pub mod endpoint;
pub mod network;
pub mod protocol;
pub mod score;
pub mod time;
mod util;

// Re-export commonly used items
pub use crate::core::{Error, Result};
pub use crate::endpoint::{Endpoint, ScoreReceiver, ScoreSender};
pub use crate::protocol::{ConnectionState, SessionEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
