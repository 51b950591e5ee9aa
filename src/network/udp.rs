use std::io;
use std::net::{SocketAddr, UdpSocket};

use bytes::Bytes;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, warn};

use crate::core::{Error, Result, SocketConfig, MAX_DATAGRAM_SIZE};
use super::Transport;

/// Non-blocking UDP transport.
///
/// The socket is polled directly, so it works the same inside or outside a
/// Tokio runtime and never waits on a reactor for readiness.
#[derive(Debug)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    /// Where datagrams go
    remote: Option<SocketAddr>,
    /// Without a configured peer, reply to whoever the session last accepted
    follow_peer: bool,
    /// Source of the most recent datagram, adopted by `confirm_peer`
    last_source: Option<SocketAddr>,
    recv_buffer: Box<[u8; MAX_DATAGRAM_SIZE]>,
}

impl UdpTransport {
    /// Binds the configured socket
    pub fn open(config: &SocketConfig) -> Result<Self> {
        let socket = Socket::new(Domain::for_address(config.bind_addr), Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| Error::socket(format!("Failed to create socket: {}", e)))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| Error::socket(format!("Failed to set SO_REUSEADDR: {}", e)))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| Error::socket(format!("Failed to make socket non-blocking: {}", e)))?;
        socket
            .bind(&config.bind_addr.into())
            .map_err(|e| Error::socket(format!("Failed to bind {}: {}", config.bind_addr, e)))?;

        let socket: UdpSocket = socket.into();
        debug!("Bound UDP socket on {:?}", socket.local_addr().ok());

        Ok(UdpTransport {
            socket: Some(socket),
            remote: config.remote_addr,
            follow_peer: config.remote_addr.is_none(),
            last_source: None,
            recv_buffer: Box::new([0u8; MAX_DATAGRAM_SIZE]),
        })
    }

    /// Returns the local socket address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket()?
            .local_addr()
            .map_err(|e| Error::socket(format!("Failed to get local address: {}", e)))
    }

    /// Current peer address, if known
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }

    fn socket(&self) -> Result<&UdpSocket> {
        self.socket.as_ref().ok_or_else(|| Error::socket("Socket is closed"))
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, datagram: &[u8]) -> Result<bool> {
        let socket = self.socket()?;
        let Some(remote) = self.remote else {
            debug!("No peer yet, dropping {} byte datagram", datagram.len());
            return Ok(false);
        };

        match socket.send_to(datagram, remote) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                warn!("Socket buffer full, dropping datagram to {}", remote);
                Ok(false)
            }
            Err(e) => Err(Error::socket(format!("Failed to send to {}: {}", remote, e))),
        }
    }

    fn try_receive(&mut self) -> Result<Option<Bytes>> {
        let socket = self.socket.as_ref().ok_or_else(|| Error::socket("Socket is closed"))?;

        match socket.recv_from(&mut self.recv_buffer[..]) {
            Ok((size, addr)) => {
                self.last_source = Some(addr);
                Ok(Some(Bytes::copy_from_slice(&self.recv_buffer[..size])))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            // ICMP port unreachable surfaces here on some platforms
            Err(e) if matches!(e.kind(), io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused) => {
                debug!("Peer unreachable: {}", e);
                Ok(None)
            }
            Err(e) => Err(Error::socket(format!("Failed to receive: {}", e))),
        }
    }

    fn confirm_peer(&mut self) {
        if !self.follow_peer {
            return;
        }
        if let Some(source) = self.last_source {
            if self.remote != Some(source) {
                info!("Replying to peer at {}", source);
                self.remote = Some(source);
            }
        }
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("Closed UDP socket");
        }
    }
}
