//! Scoreboard demo: logs every score it is sent.
//!
//! Usage: `cargo run --example receiver [config.json]`

use cricket_link::core::ReceiverConfig;
use cricket_link::score::LogDisplay;
use cricket_link::{ScoreReceiver, SessionEvent};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> cricket_link::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ReceiverConfig::load(path)?,
        None => ReceiverConfig::default(),
    };

    let mut receiver = ScoreReceiver::open(&config, LogDisplay)?;
    info!("Scoreboard listening on {}", config.socket.bind_addr);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    receiver
        .run_until(shutdown, |event| match event {
            SessionEvent::ConnectionLost(id) => warn!("Lost scoring workstation on {}", id),
            SessionEvent::ScoreApplied(_) => {}
            event => info!("{:?}", event),
        })
        .await
}
