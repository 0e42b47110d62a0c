use futures::channel::mpsc;
use zeroize::Zeroize;

/// Sending half of a one-way byte channel between two execution contexts.
///
/// Ports only carry owned `Vec<u8>` frames, so nothing is shared between the
/// two sides: whatever one side writes is moved to the other and never seen
/// again by the sender.
#[derive(Clone, Debug)]
pub struct Port {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("port closed: receiving side dropped")]
    Closed,
}

impl Port {
    /// Create a connected port and the receiver that yields every frame
    /// written to it, in write order.
    pub fn channel() -> (Port, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded::<Vec<u8>>();
        (Port { tx }, rx)
    }

    /// Send a frame to the other end, handing it back if it could not be
    /// delivered.
    pub fn try_send(&self, bytes: Vec<u8>) -> Result<(), Vec<u8>> {
        self.tx.unbounded_send(bytes).map_err(|e| e.into_inner())
    }

    /// Send a frame to the other end. Frames may carry a password, so an
    /// undelivered one is wiped before it is dropped.
    pub fn send(&self, bytes: Vec<u8>) -> Result<(), PortError> {
        self.try_send(bytes).map_err(|mut unsent| {
            unsent.zeroize();
            PortError::Closed
        })
    }

    /// True once the receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Close this port for every clone. The receiver drains what was already
    /// written and then ends.
    pub fn close(&self) {
        self.tx.close_channel();
    }
}
