use std::fmt;

use crate::core::{ConnectionId, ScoreData};
use super::message::Message;

/// Connection state of one side of the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No peer; the sender is announcing itself, the receiver is listening
    Disconnected,

    /// A connection id has been offered but not yet confirmed
    PendingConfirmation {
        /// Id waiting for its second, consistent signal
        candidate: ConnectionId,
    },

    /// Both sides agree on a connection id
    Connected {
        /// Live connection id
        id: ConnectionId,
    },
}

impl ConnectionState {
    /// True iff the state is `Connected`
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    /// The live connection id, if connected
    pub fn connection_id(&self) -> Option<ConnectionId> {
        match self {
            ConnectionState::Connected { id } => Some(*id),
            _ => None,
        }
    }

    /// Short state name for logs
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::PendingConfirmation { .. } => "PendingConfirmation",
            ConnectionState::Connected { .. } => "Connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::PendingConfirmation { candidate } => write!(f, "PendingConfirmation{{{}}}", candidate),
            ConnectionState::Connected { id } => write!(f, "Connected{{{}}}", id),
        }
    }
}

/// Edge notifications for the host application. Each fires once per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The handshake completed
    Connected(ConnectionId),
    /// The live connection ended; a fresh handshake is needed
    ConnectionLost(ConnectionId),
    /// An offered id was never confirmed and has been dropped
    CandidateExpired(ConnectionId),
    /// The receiver took a new score for display
    ScoreApplied(ScoreData),
}

/// What one session call wants done
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    /// Datagram to send to the peer
    pub outbound: Option<Message>,
    /// Edges crossed during the call
    pub events: Vec<SessionEvent>,
    /// The inbound message came from the current or prospective peer
    pub accepted: bool,
}

impl Step {
    /// Nothing to do
    pub fn idle() -> Self {
        Step::default()
    }

    /// Send one message
    pub fn send(message: Message) -> Self {
        Step {
            outbound: Some(message),
            ..Step::default()
        }
    }

    /// Raise one event
    pub fn event(event: SessionEvent) -> Self {
        Step {
            events: vec![event],
            ..Step::default()
        }
    }

    /// Adds an event to this step
    pub fn with_event(mut self, event: SessionEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Marks the inbound message as coming from the peer
    pub fn accept(mut self) -> Self {
        self.accepted = true;
        self
    }

    /// True when there is nothing to send and nothing to report
    pub fn is_idle(&self) -> bool {
        self.outbound.is_none() && self.events.is_empty()
    }
}
