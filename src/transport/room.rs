use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::warn;

use crate::core::Envelope;
use crate::transport::{Transport, TransportResult};

/// Default capacity of the room's broadcast ring
const ROOM_CAPACITY: usize = 256;

/// In-memory room connecting participants in one process
///
/// Every send fans out to all joined transports, the sender included,
/// which matches the loopback behavior of the real room server. Payloads
/// take a full JSON round trip so the wire shape is exercised end to end.
pub struct RoomHub {
    tx: broadcast::Sender<String>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::with_capacity(ROOM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Join the room, producing a connected transport
    pub fn join(&self) -> RoomTransport {
        RoomTransport {
            tx: self.tx.clone(),
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for RoomHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One participant's connection to a `RoomHub`
pub struct RoomTransport {
    tx: broadcast::Sender<String>,
    rx: broadcast::Receiver<String>,
}

#[async_trait]
impl Transport for RoomTransport {
    async fn send(&mut self, envelope: &Envelope) -> TransportResult<()> {
        let payload = envelope.to_json()?;
        self.tx.send(payload).map_err(|e| -> crate::error::BoxedError {
            format!("room has no listeners: {}", e).into()
        })?;
        Ok(())
    }

    async fn recv(&mut self) -> TransportResult<Option<Envelope>> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Ok(Some(Envelope::from_json(&payload)?)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Superseded announcements will be corrected by the
                    // next one; skipping is the documented recovery.
                    warn!("room receiver lagged, skipped {} messages", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }

    fn try_recv(&mut self) -> TransportResult<Option<Envelope>> {
        loop {
            match self.rx.try_recv() {
                Ok(payload) => return Ok(Some(Envelope::from_json(&payload)?)),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!("room receiver lagged, skipped {} messages", skipped);
                    continue;
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return Ok(None),
            }
        }
    }
}
