use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::{Result, SenderConfig};
use crate::network::{Transport, UdpTransport};
use crate::protocol::{ConnectionState, SenderSession, SessionEvent};
use crate::score::ScoreSource;
use crate::time::SharedClock;
use super::{dispatch, run_until, Endpoint, MAX_DATAGRAMS_PER_TICK};

/// Scoring-workstation endpoint
#[derive(Debug)]
pub struct ScoreSender<T, S> {
    session: SenderSession,
    transport: T,
    source: S,
    poll_interval: Duration,
}

impl<S: ScoreSource> ScoreSender<UdpTransport, S> {
    /// Validates `config` and opens its UDP socket
    pub fn open(config: &SenderConfig, source: S) -> Result<Self> {
        config.validate()?;
        let session = SenderSession::new(&config.timing)?;
        let transport = UdpTransport::open(&config.socket)?;
        Ok(ScoreSender::new(session, transport, source, config.poll_interval))
    }
}

impl<T: Transport, S: ScoreSource> ScoreSender<T, S> {
    /// Assembles an endpoint from its parts
    pub fn new(session: SenderSession, transport: T, source: S, poll_interval: Duration) -> Self {
        ScoreSender {
            session,
            transport,
            source,
            poll_interval,
        }
    }

    /// Builds the session from `config` on the given clock, over any transport
    pub fn with_clock(config: &SenderConfig, transport: T, source: S, clock: SharedClock) -> Result<Self> {
        let session = SenderSession::with_clock(&config.timing, clock)?;
        Ok(ScoreSender::new(session, transport, source, config.poll_interval))
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// True iff connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// The underlying session
    pub fn session(&self) -> &SenderSession {
        &self.session
    }

    /// The transport datagrams travel over
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Polls until `shutdown` resolves, reporting events to `on_event`
    pub async fn run_until<F, H>(&mut self, shutdown: F, on_event: H) -> Result<()>
    where
        F: Future<Output = ()>,
        H: FnMut(SessionEvent),
    {
        run_until(self, shutdown, on_event).await
    }
}

impl<T: Transport, S: ScoreSource> Endpoint for ScoreSender<T, S> {
    fn poll(&mut self) -> Result<Vec<SessionEvent>> {
        let mut events = Vec::new();

        for _ in 0..MAX_DATAGRAMS_PER_TICK {
            let Some(datagram) = self.transport.try_receive()? else {
                break;
            };
            match self.session.handle_datagram(&datagram) {
                Ok(step) => dispatch(&mut self.transport, step, &mut events)?,
                Err(e) => debug!("Dropping datagram: {}", e),
            }
        }

        let score = match self.source.read_score() {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("Failed to read score, treating as unchanged: {}", e);
                None
            }
        };

        let step = self.session.poll(score.as_ref());
        dispatch(&mut self.transport, step, &mut events)?;
        Ok(events)
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn close(&mut self) {
        self.session.stop();
        self.transport.close();
    }
}
