use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::core::{ReceiverConfig, Result, ScoreData};
use crate::network::{Transport, UdpTransport};
use crate::protocol::{ConnectionState, ReceiverSession, SessionEvent};
use crate::score::ScoreDisplay;
use crate::time::SharedClock;
use super::{dispatch, run_until, Endpoint, MAX_DATAGRAMS_PER_TICK};

/// Scoreboard endpoint
#[derive(Debug)]
pub struct ScoreReceiver<T, D> {
    session: ReceiverSession,
    transport: T,
    display: D,
    poll_interval: Duration,
}

impl<D: ScoreDisplay> ScoreReceiver<UdpTransport, D> {
    /// Validates `config` and opens its UDP socket
    pub fn open(config: &ReceiverConfig, display: D) -> Result<Self> {
        config.validate()?;
        let session = ReceiverSession::new(&config.timing)?;
        let transport = UdpTransport::open(&config.socket)?;
        Ok(ScoreReceiver::new(session, transport, display, config.poll_interval))
    }
}

impl<T: Transport, D: ScoreDisplay> ScoreReceiver<T, D> {
    /// Assembles an endpoint from its parts
    pub fn new(session: ReceiverSession, transport: T, display: D, poll_interval: Duration) -> Self {
        ScoreReceiver {
            session,
            transport,
            display,
            poll_interval,
        }
    }

    /// Builds the session from `config` on the given clock, over any transport
    pub fn with_clock(config: &ReceiverConfig, transport: T, display: D, clock: SharedClock) -> Result<Self> {
        let session = ReceiverSession::with_clock(&config.timing, clock)?;
        Ok(ScoreReceiver::new(session, transport, display, config.poll_interval))
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    /// True iff connected
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// The score on display
    pub fn score(&self) -> Option<ScoreData> {
        self.session.score()
    }

    /// The display scores are applied to
    pub fn display(&self) -> &D {
        &self.display
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

    fn show(&mut self, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::ScoreApplied(score) => self.display.apply(score),
                SessionEvent::ConnectionLost(_) => self.display.clear(),
                _ => {}
            }
        }
    }
}

impl<T: Transport, D: ScoreDisplay> Endpoint for ScoreReceiver<T, D> {
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

        let step = self.session.poll();
        dispatch(&mut self.transport, step, &mut events)?;

        self.show(&events);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::{ConnectionId, Innings, Overs};
    use crate::network::MemoryTransport;
    use crate::protocol::{codec, Message};
    use crate::score::LatestScore;
    use crate::time::ManualClock;
    use bytes::Bytes;
    use std::collections::VecDeque;

    /// Scripted inbound datagrams; counts peer confirmations
    #[derive(Debug, Default)]
    struct ScriptedTransport {
        inbound: VecDeque<Bytes>,
        sent: Vec<Message>,
        confirmed: usize,
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, datagram: &[u8]) -> Result<bool> {
            self.sent.push(codec::decode(datagram)?);
            Ok(true)
        }

        fn try_receive(&mut self) -> Result<Option<Bytes>> {
            Ok(self.inbound.pop_front())
        }

        fn confirm_peer(&mut self) {
            self.confirmed += 1;
        }

        fn close(&mut self) {}
    }

    fn config() -> ReceiverConfig {
        let mut config = ReceiverConfig::default();
        config.timing.keepalive_interval = Duration::from_secs(2);
        config.timing.new_connection_id_countdown = Duration::from_secs(1);
        config.timing.last_received_timeout = Duration::from_secs(5);
        config
    }

    fn reply(transport: &mut MemoryTransport) -> Option<Message> {
        transport
            .try_receive()
            .unwrap()
            .map(|datagram| codec::decode(&datagram).unwrap())
    }

    #[test]
    fn test_display_follows_connection() {
        let clock = ManualClock::new();
        let (local, mut workstation, _link) = MemoryTransport::pair();
        let display = LatestScore::new();
        let mut receiver =
            ScoreReceiver::with_clock(&config(), local, display.clone(), Arc::new(clock.clone())).unwrap();

        workstation.send(&codec::encode(&Message::Lookout)).unwrap();
        receiver.poll().unwrap();
        let Some(Message::Hello { id }) = reply(&mut workstation) else {
            panic!("expected a hello");
        };

        workstation.send(&codec::encode(&Message::Ack { id })).unwrap();
        assert_eq!(receiver.poll().unwrap(), vec![SessionEvent::Connected(id)]);
        assert_eq!(reply(&mut workstation), Some(Message::Hello { id }));

        let score = ScoreData::new(57, 3, Overs::new(9, 2).unwrap(), Innings::new(2).unwrap()).unwrap();
        workstation.send(&codec::encode(&Message::ScoreUpdate { id, score })).unwrap();
        let stray = Message::ScoreUpdate {
            id: ConnectionId(id.0.wrapping_add(1)),
            score: ScoreData::new(1, 0, Overs::new(0, 1).unwrap(), Innings::first()).unwrap(),
        };
        workstation.send(&codec::encode(&stray)).unwrap();
        assert_eq!(receiver.poll().unwrap(), vec![SessionEvent::ScoreApplied(score)]);
        assert_eq!(display.get(), Some(score));
        assert_eq!(receiver.score(), Some(score));

        clock.advance(Duration::from_secs(5));
        assert_eq!(receiver.poll().unwrap(), vec![SessionEvent::ConnectionLost(id)]);
        assert_eq!(display.get(), None);
        assert!(!receiver.is_connected());
    }

    #[test]
    fn test_peer_followed_only_on_accepted_datagrams() {
        let clock = ManualClock::new();
        let mut receiver =
            ScoreReceiver::with_clock(&config(), ScriptedTransport::default(), LatestScore::new(), Arc::new(clock))
                .unwrap();

        receiver.transport.inbound.push_back(Bytes::from_static(b"junk"));
        receiver
            .transport
            .inbound
            .push_back(codec::encode(&Message::Ack { id: ConnectionId(5) }));
        assert!(receiver.poll().unwrap().is_empty());
        assert_eq!(receiver.transport().confirmed, 0);
        assert!(receiver.transport().sent.is_empty());

        receiver.transport.inbound.push_back(codec::encode(&Message::Lookout));
        receiver.poll().unwrap();
        assert_eq!(receiver.transport().confirmed, 1);
        assert!(matches!(receiver.transport().sent.as_slice(), [Message::Hello { .. }]));
    }
}
