use std::fmt;

use crate::core::{ConnectionId, Error, ScoreData};

/// Datagrams exchanged between the scoring workstation and the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// A disconnected sender announcing it is switched on
    Lookout,

    /// Receiver offering (and later confirming, and keeping alive) a connection id
    Hello {
        /// Offered connection id
        id: ConnectionId,
    },

    /// Sender acknowledging a hello for the given id
    Ack {
        /// Acknowledged connection id
        id: ConnectionId,
    },

    /// Current score for the live connection
    ScoreUpdate {
        /// Connection the score belongs to
        id: ConnectionId,
        /// Score to display
        score: ScoreData,
    },
}

impl Message {
    /// The connection id carried by the message, if any
    pub fn connection_id(&self) -> Option<ConnectionId> {
        match self {
            Message::Lookout => None,
            Message::Hello { id } | Message::Ack { id } | Message::ScoreUpdate { id, .. } => Some(*id),
        }
    }

    /// Wire tag for this message
    pub fn tag(&self) -> MessageTag {
        match self {
            Message::Lookout => MessageTag::Lookout,
            Message::Hello { .. } => MessageTag::Hello,
            Message::Ack { .. } => MessageTag::Ack,
            Message::ScoreUpdate { .. } => MessageTag::ScoreUpdate,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Lookout => write!(f, "Lookout"),
            Message::Hello { id } => write!(f, "Hello{{{}}}", id),
            Message::Ack { id } => write!(f, "Ack{{{}}}", id),
            Message::ScoreUpdate { id, score } => write!(f, "ScoreUpdate{{{}, {}}}", id, score),
        }
    }
}

/// Type byte at offset 3 of every datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageTag {
    Lookout = 1,
    Hello = 2,
    Ack = 3,
    ScoreUpdate = 4,
}

impl TryFrom<u8> for MessageTag {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageTag::Lookout),
            2 => Ok(MessageTag::Hello),
            3 => Ok(MessageTag::Ack),
            4 => Ok(MessageTag::ScoreUpdate),
            other => Err(Error::malformed(format!("unknown message tag {}", other))),
        }
    }
}
