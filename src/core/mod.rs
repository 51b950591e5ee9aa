//! Core types for the score link
//!
//! This module contains the value types, configuration and errors shared by
//! the protocol, the transports and the endpoints.

pub mod config;
pub mod error;
pub mod serde;
pub mod types;

pub use self::config::{
    ReceiverConfig,
    ReceiverTimingConfig,
    SenderConfig,
    SocketConfig,
    TimingConfig,
};
pub use self::error::{Error, Result};
pub use self::types::{ConnectionId, Innings, Overs, ScoreData};

/// Wire protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// Default scoreboard port
pub const DEFAULT_PORT: u16 = 2520;

/// Largest datagram either side will read
pub const MAX_DATAGRAM_SIZE: usize = 512;
