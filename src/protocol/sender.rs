use tracing::{debug, info, warn};

use crate::core::{ConnectionId, Result, ScoreData, TimingConfig};
use crate::time::{CountdownTimer, MonotonicClock, SharedClock, TimerFactory};
use super::codec;
use super::message::Message;
use super::state::{ConnectionState, SessionEvent, Step};

/// Last score put on the wire and the timer holding back identical resends
#[derive(Debug)]
struct LastSent {
    score: Option<ScoreData>,
    resend: CountdownTimer,
}

impl LastSent {
    fn clear(&mut self) {
        self.score = None;
        self.resend.stop();
    }
}

/// Scoring-workstation side of the link.
///
/// Drive it from one polling loop: feed every inbound datagram to
/// [`handle_datagram`](Self::handle_datagram) first, then call
/// [`poll`](Self::poll) once with the freshly read score. Each call returns a
/// [`Step`] naming at most one datagram to send and any edges crossed.
#[derive(Debug)]
pub struct SenderSession {
    state: ConnectionState,
    /// Paces lookout announcements while disconnected
    lookout: CountdownTimer,
    /// Bounds how long an offered id may stay unconfirmed
    new_connection: CountdownTimer,
    /// Liveness watchdog on the receiver while connected
    last_received: CountdownTimer,
    last_sent: LastSent,
}

impl SenderSession {
    /// Creates a disconnected session on the monotonic clock
    pub fn new(config: &TimingConfig) -> Result<Self> {
        Self::with_clock(config, MonotonicClock::shared())
    }

    /// Creates a disconnected session whose timers read `clock`
    pub fn with_clock(config: &TimingConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;
        let timers = TimerFactory::new(clock);

        Ok(SenderSession {
            state: ConnectionState::Disconnected,
            lookout: timers.started(config.lookout_interval)?,
            new_connection: timers.idle(config.new_connection_id_countdown)?,
            last_received: timers.idle(config.last_received_timeout)?,
            last_sent: LastSent {
                score: None,
                resend: timers.idle(config.resend_same_countdown)?,
            },
        })
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True iff connected
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// The score most recently sent on the live connection
    pub fn last_sent(&self) -> Option<ScoreData> {
        self.last_sent.score
    }

    /// Decodes and handles one inbound datagram.
    ///
    /// A malformed datagram is returned as an error and leaves the session untouched.
    pub fn handle_datagram(&mut self, datagram: &[u8]) -> Result<Step> {
        let message = codec::decode(datagram)?;
        Ok(self.handle_message(message))
    }

    /// Handles one inbound message.
    ///
    /// Deadlines that have already passed are applied first, so a late
    /// confirmation or late traffic cannot revive what has expired.
    pub fn handle_message(&mut self, message: Message) -> Step {
        let expired = self.expire();
        let mut step = self.dispatch(message);
        if let Some(event) = expired {
            step.events.insert(0, event);
        }
        step
    }

    /// Outbound decision for one loop tick.
    ///
    /// `score` is the value just read from the score source, or `None` if the
    /// read failed, which counts as "unchanged".
    pub fn poll(&mut self, score: Option<&ScoreData>) -> Step {
        if let Some(event) = self.expire() {
            return Step::event(event);
        }

        match self.state {
            ConnectionState::Disconnected => {
                if self.lookout.just_expired() {
                    self.lookout.reset();
                    debug!("Sending lookout");
                    Step::send(Message::Lookout)
                } else {
                    Step::idle()
                }
            }

            ConnectionState::PendingConfirmation { .. } => Step::idle(),

            ConnectionState::Connected { id } => match self.next_score(score) {
                Some(score) => Step::send(Message::ScoreUpdate { id, score }),
                None => Step::idle(),
            },
        }
    }

    fn dispatch(&mut self, message: Message) -> Step {
        match (self.state, message) {
            (ConnectionState::Connected { id: live }, message) if message.connection_id() == Some(live) => {
                self.last_received.reset();
                match message {
                    Message::Hello { id } => Step::send(Message::Ack { id }).accept(),
                    _ => Step::idle().accept(),
                }
            }

            (ConnectionState::PendingConfirmation { candidate }, Message::Hello { id }) if id == candidate => {
                self.connect(id);
                Step::send(Message::Ack { id })
                    .with_event(SessionEvent::Connected(id))
                    .accept()
            }

            (ConnectionState::Disconnected, Message::Hello { id })
            | (ConnectionState::PendingConfirmation { .. }, Message::Hello { id }) => {
                if let ConnectionState::PendingConfirmation { candidate } = self.state {
                    debug!("Replacing candidate {} with {}", candidate, id);
                }
                self.state = ConnectionState::PendingConfirmation { candidate: id };
                self.new_connection.reset();
                debug!("Receiver offered connection {}", id);
                Step::send(Message::Ack { id }).accept()
            }

            (state, message) => {
                debug!("Ignoring {} while {}", message, state);
                Step::idle()
            }
        }
    }

    /// Applies whichever deadline has passed in the current state
    fn expire(&mut self) -> Option<SessionEvent> {
        match self.state {
            ConnectionState::Disconnected => None,

            ConnectionState::PendingConfirmation { candidate } => {
                if !self.new_connection.just_expired() {
                    return None;
                }
                info!("Connection {} was never confirmed, dropping it", candidate);
                self.disconnect();
                Some(SessionEvent::CandidateExpired(candidate))
            }

            ConnectionState::Connected { id } => {
                if !self.last_received.just_expired() {
                    return None;
                }
                warn!("Nothing heard from receiver on {}, disconnecting", id);
                self.disconnect();
                Some(SessionEvent::ConnectionLost(id))
            }
        }
    }

    /// Silences every timer and forgets the connection. The session stays
    /// quiet until it is rebuilt.
    pub fn stop(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.lookout.stop();
        self.new_connection.stop();
        self.last_received.stop();
        self.last_sent.clear();
    }

    /// Picks the score to send this tick, if any, and records it as sent
    fn next_score(&mut self, score: Option<&ScoreData>) -> Option<ScoreData> {
        let current = score.copied().or(self.last_sent.score)?;
        let changed = self.last_sent.score != Some(current);

        if changed || self.last_sent.resend.just_expired() {
            if !changed {
                debug!("Resending unchanged score {}", current);
            }
            self.last_sent.score = Some(current);
            self.last_sent.resend.reset();
            Some(current)
        } else {
            None
        }
    }

    fn connect(&mut self, id: ConnectionId) {
        info!("Connected to receiver on {}", id);
        self.state = ConnectionState::Connected { id };
        self.lookout.stop();
        self.new_connection.stop();
        self.last_received.reset();
        self.last_sent.clear();
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.new_connection.stop();
        self.last_received.stop();
        self.last_sent.clear();
        self.lookout.reset();
    }
}
