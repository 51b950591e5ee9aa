use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::core::{Error, Result};
use super::Transport;

/// Switch for the in-memory link shared by both ends of a pair
#[derive(Debug, Clone)]
pub struct LinkControl {
    up: Arc<AtomicBool>,
}

impl LinkControl {
    /// Cuts or restores the link. Datagrams sent while down are lost.
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn is_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

/// In-process datagram link, for tests and simulations
#[derive(Debug)]
pub struct MemoryTransport {
    tx: Option<mpsc::UnboundedSender<Bytes>>,
    rx: mpsc::UnboundedReceiver<Bytes>,
    link: LinkControl,
}

impl MemoryTransport {
    /// Creates two connected ends and the switch controlling them
    pub fn pair() -> (MemoryTransport, MemoryTransport, LinkControl) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        let link = LinkControl {
            up: Arc::new(AtomicBool::new(true)),
        };

        let a = MemoryTransport {
            tx: Some(a_tx),
            rx: a_rx,
            link: link.clone(),
        };
        let b = MemoryTransport {
            tx: Some(b_tx),
            rx: b_rx,
            link: link.clone(),
        };
        (a, b, link)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, datagram: &[u8]) -> Result<bool> {
        let tx = self.tx.as_ref().ok_or_else(|| Error::socket("Transport is closed"))?;
        // A cut link or a vanished peer loses the datagram in the network
        if self.link.is_up() {
            let _ = tx.send(Bytes::copy_from_slice(datagram));
        }
        Ok(true)
    }

    fn try_receive(&mut self) -> Result<Option<Bytes>> {
        if self.tx.is_none() {
            return Err(Error::socket("Transport is closed"));
        }
        match self.rx.try_recv() {
            Ok(datagram) => Ok(Some(datagram)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }

    fn close(&mut self) {
        self.tx = None;
        self.rx.close();
    }
}
