use std::sync::Arc;
use std::time::Duration;

use cricket_link::core::{ConnectionId, Innings, Overs, ReceiverConfig, ScoreData, SenderConfig, TimingConfig};
use cricket_link::network::MemoryTransport;
use cricket_link::protocol::{ConnectionState, Message, SenderSession, SessionEvent};
use cricket_link::score::{LatestScore, ManualScoreSource};
use cricket_link::time::ManualClock;
use cricket_link::{Endpoint, ScoreReceiver, ScoreSender};

fn timing() -> TimingConfig {
    TimingConfig {
        lookout_interval: Duration::from_secs(2),
        new_connection_id_countdown: Duration::from_secs(1),
        last_received_timeout: Duration::from_secs(5),
        resend_same_countdown: Duration::from_secs(3),
    }
}

fn opening_score() -> ScoreData {
    ScoreData::new(10, 1, Overs::new(2, 0).unwrap(), Innings::first()).unwrap()
}

#[test]
fn sender_timeline() {
    let clock = ManualClock::new();
    let mut sender = SenderSession::with_clock(&timing(), Arc::new(clock.clone())).unwrap();
    let score = opening_score();
    let a = ConnectionId(u32::from(b'A'));

    // Silent until the lookout interval has passed, then exactly one lookout
    assert!(sender.poll(None).is_idle());
    clock.advance_millis(2000);
    assert_eq!(sender.poll(None).outbound, Some(Message::Lookout));
    assert!(sender.poll(None).is_idle());

    let step = sender.handle_message(Message::Hello { id: a });
    assert_eq!(step.outbound, Some(Message::Ack { id: a }));
    assert_eq!(sender.state(), ConnectionState::PendingConfirmation { candidate: a });

    clock.advance_millis(500);
    let step = sender.handle_message(Message::Hello { id: a });
    assert_eq!(step.events, vec![SessionEvent::Connected(a)]);
    assert_eq!(sender.state(), ConnectionState::Connected { id: a });

    assert_eq!(sender.poll(Some(&score)).outbound, Some(Message::ScoreUpdate { id: a, score }));

    clock.advance_millis(1000);
    assert!(sender.poll(Some(&score)).is_idle());

    clock.advance_millis(2100);
    assert_eq!(sender.poll(Some(&score)).outbound, Some(Message::ScoreUpdate { id: a, score }));

    // 5.1 s after the last hello
    clock.advance_millis(2000);
    let step = sender.poll(Some(&score));
    assert_eq!(step.events, vec![SessionEvent::ConnectionLost(a)]);
    assert_eq!(sender.state(), ConnectionState::Disconnected);

    let mut later_losses = 0;
    for _ in 0..200 {
        clock.advance_millis(50);
        later_losses += sender
            .poll(Some(&score))
            .events
            .iter()
            .filter(|e| matches!(e, SessionEvent::ConnectionLost(_)))
            .count();
    }
    assert_eq!(later_losses, 0);
}

#[test]
fn handshake_not_reconfirmed_reverts() {
    let clock = ManualClock::new();
    let mut sender = SenderSession::with_clock(&timing(), Arc::new(clock.clone())).unwrap();
    let a = ConnectionId(u32::from(b'A'));

    sender.handle_message(Message::Hello { id: a });
    clock.advance_millis(1000);
    assert_eq!(sender.poll(None).events, vec![SessionEvent::CandidateExpired(a)]);
    assert_eq!(sender.state(), ConnectionState::Disconnected);
}

struct Link {
    clock: ManualClock,
    sender: ScoreSender<MemoryTransport, ManualScoreSource>,
    receiver: ScoreReceiver<MemoryTransport, LatestScore>,
    source: ManualScoreSource,
    display: LatestScore,
    link: cricket_link::network::LinkControl,
    sender_events: Vec<SessionEvent>,
    receiver_events: Vec<SessionEvent>,
}

impl Link {
    fn new() -> Self {
        let clock = ManualClock::new();
        let (workstation, board, link) = MemoryTransport::pair();

        let mut sender_config = SenderConfig::default();
        sender_config.timing = timing();
        let mut receiver_config = ReceiverConfig::default();
        receiver_config.timing.keepalive_interval = Duration::from_secs(2);
        receiver_config.timing.new_connection_id_countdown = Duration::from_secs(1);
        receiver_config.timing.last_received_timeout = Duration::from_secs(5);

        let source = ManualScoreSource::new();
        let display = LatestScore::new();
        let sender =
            ScoreSender::with_clock(&sender_config, workstation, source.clone(), Arc::new(clock.clone())).unwrap();
        let receiver =
            ScoreReceiver::with_clock(&receiver_config, board, display.clone(), Arc::new(clock.clone())).unwrap();

        Link {
            clock,
            sender,
            receiver,
            source,
            display,
            link,
            sender_events: Vec::new(),
            receiver_events: Vec::new(),
        }
    }

    /// Runs both loops in 50 ms ticks
    fn run_for(&mut self, duration: Duration) {
        let ticks = duration.as_millis() / 50;
        for _ in 0..ticks {
            self.clock.advance_millis(50);
            self.sender_events.extend(self.sender.poll().unwrap());
            self.receiver_events.extend(self.receiver.poll().unwrap());
        }
    }
}

fn count(events: &[SessionEvent], wanted: fn(&SessionEvent) -> bool) -> usize {
    events.iter().filter(|e| wanted(e)).count()
}

#[test]
fn endpoints_connect_and_deliver() {
    let mut link = Link::new();
    link.source.set(opening_score());

    link.run_for(Duration::from_secs(3));
    assert!(link.sender.is_connected());
    assert!(link.receiver.is_connected());
    assert_eq!(link.sender.state().connection_id(), link.receiver.state().connection_id());
    assert_eq!(link.display.get(), Some(opening_score()));

    let later = ScoreData::new(14, 1, Overs::new(2, 1).unwrap(), Innings::first()).unwrap();
    link.source.set(later);
    link.run_for(Duration::from_millis(200));
    assert_eq!(link.display.get(), Some(later));
}

#[test]
fn unchanged_score_keeps_link_alive() {
    let mut link = Link::new();
    link.source.set(opening_score());

    link.run_for(Duration::from_secs(60));
    assert!(link.sender.is_connected());
    assert!(link.receiver.is_connected());
    assert_eq!(count(&link.sender_events, |e| matches!(e, SessionEvent::Connected(_))), 1);
    assert_eq!(count(&link.receiver_events, |e| matches!(e, SessionEvent::ConnectionLost(_))), 0);
}

#[test]
fn outage_is_detected_once_and_recovered() {
    let mut link = Link::new();
    link.source.set(opening_score());
    link.run_for(Duration::from_secs(3));
    assert!(link.sender.is_connected());

    link.link.set_up(false);
    link.run_for(Duration::from_secs(20));
    assert!(!link.sender.is_connected());
    assert!(!link.receiver.is_connected());
    assert_eq!(count(&link.sender_events, |e| matches!(e, SessionEvent::ConnectionLost(_))), 1);
    assert_eq!(count(&link.receiver_events, |e| matches!(e, SessionEvent::ConnectionLost(_))), 1);
    assert_eq!(link.display.get(), None);

    link.link.set_up(true);
    link.run_for(Duration::from_secs(5));
    assert!(link.sender.is_connected());
    assert!(link.receiver.is_connected());
    assert_eq!(link.display.get(), Some(opening_score()));
}

#[test]
fn failed_reads_do_not_break_the_link() {
    let mut link = Link::new();
    link.source.set(opening_score());
    link.run_for(Duration::from_secs(3));

    link.source.fail();
    link.run_for(Duration::from_secs(30));
    assert!(link.sender.is_connected());
    assert_eq!(link.display.get(), Some(opening_score()));
}
