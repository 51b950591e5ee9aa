//! Link protocol module
//!
//! This module defines the datagrams exchanged between the scoring
//! workstation and the scoreboard, their wire encoding, and the sender and
//! receiver session state machines.
//!
//! The sessions never touch a socket. They consume decoded datagrams and
//! timer expiries and say what to send, which keeps them deterministic under
//! a [`ManualClock`](crate::time::ManualClock).

pub mod codec;
pub mod message;
pub mod receiver;
pub mod sender;
pub mod state;

pub use self::codec::{decode, encode, DatagramCodec};
pub use self::message::{Message, MessageTag};
pub use self::receiver::ReceiverSession;
pub use self::sender::SenderSession;
pub use self::state::{ConnectionState, SessionEvent, Step};
