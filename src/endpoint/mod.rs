//! Endpoints
//!
//! An endpoint owns one session, its transport, and the score collaborator
//! on its side of the link, and runs the polling loop: drain inbound
//! datagrams into the session, then let the session decide what to send.
//! Inbound always goes first, so a confirmation that has just arrived can
//! unlock a score send in the same tick.

mod receiver;
mod sender;

pub use self::receiver::ScoreReceiver;
pub use self::sender::ScoreSender;

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error};

use crate::core::Result;
use crate::network::Transport;
use crate::protocol::{codec, SessionEvent, Step};

/// Upper bound on datagrams handled per tick, so a flood cannot starve the loop
pub const MAX_DATAGRAMS_PER_TICK: usize = 64;

/// One side of the link, driven a tick at a time
pub trait Endpoint {
    /// Runs one tick and returns the edges it crossed
    fn poll(&mut self) -> Result<Vec<SessionEvent>>;

    /// Interval between ticks
    fn poll_interval(&self) -> Duration;

    /// Stops the session and releases the transport
    fn close(&mut self);
}

/// Polls `endpoint` every `poll_interval` until `shutdown` resolves or a
/// fatal error occurs. The endpoint is closed on every exit path.
pub async fn run_until<E, F, H>(endpoint: &mut E, shutdown: F, mut on_event: H) -> Result<()>
where
    E: Endpoint,
    F: Future<Output = ()>,
    H: FnMut(SessionEvent),
{
    let mut ticker = interval(endpoint.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("Shutdown requested");
                break Ok(());
            }
            _ = ticker.tick() => {
                match endpoint.poll() {
                    Ok(events) => events.into_iter().for_each(&mut on_event),
                    Err(e) => {
                        error!("Endpoint failed: {}", e);
                        break Err(e);
                    }
                }
            }
        }
    };

    endpoint.close();
    result
}

/// Sends the step's datagram, if any, and collects its events.
///
/// A step answering an accepted datagram first points the transport at that
/// datagram's source, so replies and keepalives follow the real peer only.
fn dispatch<T: Transport>(transport: &mut T, step: Step, events: &mut Vec<SessionEvent>) -> Result<()> {
    if step.accepted {
        transport.confirm_peer();
    }
    if let Some(message) = step.outbound {
        debug!("Sending {}", message);
        if !transport.send(&codec::encode(&message))? {
            debug!("{} was dropped before reaching the network", message);
        }
    }
    events.extend(step.events);
    Ok(())
}
