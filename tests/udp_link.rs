use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use cricket_link::core::{Innings, Overs, ReceiverConfig, ScoreData, SenderConfig, SocketConfig};
use cricket_link::protocol::{codec, Message};
use cricket_link::score::{LatestScore, ManualScoreSource};
use cricket_link::{ScoreReceiver, ScoreSender, SessionEvent};
use tokio::time::sleep;

fn loopback(remote: Option<SocketAddr>) -> SocketConfig {
    SocketConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        remote_addr: remote,
    }
}

fn receiver_config() -> ReceiverConfig {
    let mut config = ReceiverConfig::default();
    config.socket = loopback(None);
    config.timing.keepalive_interval = Duration::from_millis(100);
    config.timing.new_connection_id_countdown = Duration::from_millis(500);
    config.timing.last_received_timeout = Duration::from_millis(800);
    config.poll_interval = Duration::from_millis(10);
    config
}

fn sender_config(board: SocketAddr) -> SenderConfig {
    let mut config = SenderConfig::default();
    config.socket = loopback(Some(board));
    config.timing.lookout_interval = Duration::from_millis(100);
    config.timing.new_connection_id_countdown = Duration::from_millis(500);
    config.timing.last_received_timeout = Duration::from_millis(800);
    config.timing.resend_same_countdown = Duration::from_millis(200);
    config.poll_interval = Duration::from_millis(10);
    config
}

fn score() -> ScoreData {
    ScoreData::new(123, 4, Overs::new(12, 3).unwrap(), Innings::first()).unwrap()
}

fn lost(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::ConnectionLost(_)))
        .count()
}

#[tokio::test]
async fn score_crosses_loopback() {
    let display = LatestScore::new();
    let mut receiver = ScoreReceiver::open(&receiver_config(), display.clone()).unwrap();
    let board = receiver.transport().local_addr().unwrap();

    let source = ManualScoreSource::new();
    source.set(score());
    let mut sender = ScoreSender::open(&sender_config(board), source).unwrap();

    let mut sender_events = Vec::new();
    let mut receiver_events = Vec::new();
    let (sent, received) = tokio::join!(
        sender.run_until(sleep(Duration::from_millis(1500)), |e| sender_events.push(e)),
        receiver.run_until(sleep(Duration::from_millis(1500)), |e| receiver_events.push(e)),
    );
    sent.unwrap();
    received.unwrap();

    assert_eq!(display.get(), Some(score()));
    assert!(matches!(sender_events.first(), Some(SessionEvent::Connected(_))));
    assert!(receiver_events.contains(&SessionEvent::ScoreApplied(score())));
    // Keepalives and resends hold the link for longer than the silence window
    assert_eq!(lost(&sender_events), 0);
    assert_eq!(lost(&receiver_events), 0);
}

#[tokio::test]
async fn stranger_cannot_redirect_scoreboard() {
    let display = LatestScore::new();
    let mut receiver = ScoreReceiver::open(&receiver_config(), display.clone()).unwrap();
    let board = receiver.transport().local_addr().unwrap();

    let source = ManualScoreSource::new();
    source.set(score());
    let mut sender = ScoreSender::open(&sender_config(board), source).unwrap();
    let workstation = sender.transport().local_addr().unwrap();

    let stranger = UdpSocket::bind("127.0.0.1:0").unwrap();
    stranger.set_nonblocking(true).unwrap();

    let intrude = async {
        sleep(Duration::from_millis(500)).await;
        stranger.send_to(b"junk", board).unwrap();
        stranger
            .send_to(&codec::encode(&Message::Ack { id: cricket_link::core::ConnectionId(7) }), board)
            .unwrap();
    };

    let mut sender_events = Vec::new();
    let mut receiver_events = Vec::new();
    let (sent, received, ()) = tokio::join!(
        sender.run_until(sleep(Duration::from_millis(2000)), |e| sender_events.push(e)),
        receiver.run_until(sleep(Duration::from_millis(2000)), |e| receiver_events.push(e)),
        intrude,
    );
    sent.unwrap();
    received.unwrap();

    assert_eq!(receiver.transport().remote_addr(), Some(workstation));
    assert_eq!(lost(&sender_events), 0);
    assert_eq!(lost(&receiver_events), 0);
    assert_eq!(display.get(), Some(score()));

    // Nothing was ever sent back to the stranger
    let mut buf = [0u8; 64];
    assert!(stranger.recv_from(&mut buf).is_err());
}
