use std::fmt;

use tracing::{debug, info, warn};

use crate::core::{ConnectionId, ReceiverTimingConfig, Result, ScoreData};
use crate::time::{CountdownTimer, MonotonicClock, SharedClock, TimerFactory};
use super::codec;
use super::message::Message;
use super::state::{ConnectionState, SessionEvent, Step};

type IdSource = Box<dyn FnMut() -> ConnectionId + Send>;

/// Scoreboard side of the link.
///
/// Answers a sender's lookout with a fresh connection id, commits once the
/// sender acknowledges it, then applies score updates for that id and pings
/// the sender so both ends can detect silence.
pub struct ReceiverSession {
    state: ConnectionState,
    /// Paces hello pings while connected
    keepalive: CountdownTimer,
    new_connection: CountdownTimer,
    last_received: CountdownTimer,
    score: Option<ScoreData>,
    next_id: IdSource,
}

impl fmt::Debug for ReceiverSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceiverSession")
            .field("state", &self.state)
            .field("score", &self.score)
            .finish_non_exhaustive()
    }
}

impl ReceiverSession {
    /// Creates a listening session on the monotonic clock
    pub fn new(config: &ReceiverTimingConfig) -> Result<Self> {
        Self::with_clock(config, MonotonicClock::shared())
    }

    /// Creates a listening session whose timers read `clock`
    pub fn with_clock(config: &ReceiverTimingConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;
        let timers = TimerFactory::new(clock);

        Ok(ReceiverSession {
            state: ConnectionState::Disconnected,
            keepalive: timers.idle(config.keepalive_interval)?,
            new_connection: timers.idle(config.new_connection_id_countdown)?,
            last_received: timers.idle(config.last_received_timeout)?,
            score: None,
            next_id: Box::new(ConnectionId::random),
        })
    }

    /// Replaces the random connection id generator
    pub fn with_id_source(mut self, source: impl FnMut() -> ConnectionId + Send + 'static) -> Self {
        self.next_id = Box::new(source);
        self
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True iff connected
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// The score on display, cleared when the connection is lost
    pub fn score(&self) -> Option<ScoreData> {
        self.score
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
    /// Deadlines that have already passed are applied first, so a message
    /// arriving after its countdown cannot revive an expired candidate or a
    /// silent connection.
    pub fn handle_message(&mut self, message: Message) -> Step {
        let expired = self.expire();
        let mut step = self.dispatch(message);
        if let Some(event) = expired {
            step.events.insert(0, event);
        }
        step
    }

    /// Timer checks for one loop tick
    pub fn poll(&mut self) -> Step {
        if let Some(event) = self.expire() {
            return Step::event(event);
        }

        match self.state {
            ConnectionState::Connected { id } if self.keepalive.just_expired() => {
                self.keepalive.reset();
                Step::send(Message::Hello { id })
            }
            _ => Step::idle(),
        }
    }

    fn dispatch(&mut self, message: Message) -> Step {
        match (self.state, message) {
            // Only silence ends a live connection; a late or duplicated
            // lookout must not
            (ConnectionState::Connected { id }, Message::Lookout) => {
                debug!("Ignoring lookout while connected on {}", id);
                Step::idle()
            }

            (_, Message::Lookout) => self.offer().accept(),

            (ConnectionState::PendingConfirmation { candidate }, Message::Ack { id })
                if id == candidate =>
            {
                self.connect(id).accept()
            }

            (ConnectionState::PendingConfirmation { candidate }, Message::ScoreUpdate { id, score })
                if id == candidate =>
            {
                // Our ack was lost but the sender already committed
                let mut step = self.connect(id).accept();
                if let Some(applied) = self.apply(score) {
                    step.events.push(applied);
                }
                step
            }

            (ConnectionState::Connected { id: live }, Message::Ack { id }) if id == live => {
                self.last_received.reset();
                Step::idle().accept()
            }

            (ConnectionState::Connected { id: live }, Message::ScoreUpdate { id, score }) if id == live => {
                self.last_received.reset();
                let step = Step::idle().accept();
                match self.apply(score) {
                    Some(event) => step.with_event(event),
                    None => step,
                }
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
                info!("Sender never acknowledged {}, dropping it", candidate);
                self.state = ConnectionState::Disconnected;
                Some(SessionEvent::CandidateExpired(candidate))
            }

            ConnectionState::Connected { id } => {
                if !self.last_received.just_expired() {
                    return None;
                }
                warn!("Nothing heard from sender on {}, disconnecting", id);
                self.drop_connection();
                Some(SessionEvent::ConnectionLost(id))
            }
        }
    }

    /// Silences every timer and forgets the connection
    pub fn stop(&mut self) {
        self.drop_connection();
        self.new_connection.stop();
    }

    /// Offers a fresh connection id to whoever sent the lookout
    fn offer(&mut self) -> Step {
        let id = (self.next_id)();
        debug!("Offering connection {}", id);
        self.state = ConnectionState::PendingConfirmation { candidate: id };
        self.new_connection.reset();
        Step::send(Message::Hello { id })
    }

    /// Commits to `id` and repeats the hello as the sender's confirmation
    fn connect(&mut self, id: ConnectionId) -> Step {
        info!("Connected to sender on {}", id);
        self.state = ConnectionState::Connected { id };
        self.new_connection.stop();
        self.last_received.reset();
        self.keepalive.reset();
        Step::send(Message::Hello { id }).with_event(SessionEvent::Connected(id))
    }

    fn apply(&mut self, score: ScoreData) -> Option<SessionEvent> {
        if self.score == Some(score) {
            return None;
        }
        debug!("Applying score {}", score);
        self.score = Some(score);
        Some(SessionEvent::ScoreApplied(score))
    }

    fn drop_connection(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.last_received.stop();
        self.keepalive.stop();
        self.score = None;
    }
}
