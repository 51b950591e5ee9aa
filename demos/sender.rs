//! Scoring workstation demo: streams a simulated match to a scoreboard.
//!
//! Usage: `cargo run --example sender [config.json]`

use std::time::Duration;

use cricket_link::core::SenderConfig;
use cricket_link::score::DummyScoreSource;
use cricket_link::time::MonotonicClock;
use cricket_link::{ScoreSender, SessionEvent};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> cricket_link::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SenderConfig::load(path)?,
        None => SenderConfig::default(),
    };

    let source = DummyScoreSource::new(Duration::from_secs(3), MonotonicClock::shared(), rand::random())?;
    let mut sender = ScoreSender::open(&config, source)?;
    info!("Sending scores to {:?}", config.socket.remote_addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    sender
        .run_until(shutdown, |event| match event {
            SessionEvent::ConnectionLost(id) => warn!("Lost scoreboard on {}", id),
            SessionEvent::CandidateExpired(id) => warn!("Scoreboard never confirmed {}", id),
            event => info!("{:?}", event),
        })
        .await
}
