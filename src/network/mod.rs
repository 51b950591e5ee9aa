//! Datagram transports
//!
//! Sessions are driven from a polling loop, so transports are non-blocking:
//! `try_receive` hands back whatever datagram is waiting, or nothing.

mod memory;
mod udp;

pub use self::memory::{LinkControl, MemoryTransport};
pub use self::udp::UdpTransport;

use bytes::Bytes;

use crate::core::Result;

/// Minimal datagram interface the endpoints drive
pub trait Transport {
    /// Sends one datagram to the peer. Delivery is never guaranteed.
    ///
    /// Returns `false` if the datagram was dropped before it reached the
    /// network, e.g. with no peer known yet or a full socket buffer.
    fn send(&mut self, datagram: &[u8]) -> Result<bool>;

    /// Returns the next waiting datagram without blocking
    fn try_receive(&mut self) -> Result<Option<Bytes>>;

    /// Adopts the source of the last received datagram as the peer. Called
    /// once the session has accepted that datagram. Transports with a fixed
    /// peer ignore it.
    fn confirm_peer(&mut self) {}

    /// Releases the underlying resource. Later calls fail with a socket error.
    fn close(&mut self);
}
