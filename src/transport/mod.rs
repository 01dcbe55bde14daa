pub mod room;

pub use room::{RoomHub, RoomTransport};

use async_trait::async_trait;

use crate::core::Envelope;
use crate::error::BoxedError;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, BoxedError>;

/// Trait for the bidirectional channel connecting room participants
///
/// The channel is assumed reliable and ordered per sender; delivery
/// latency is unbounded. The engine's per-sender sequence check makes the
/// protocol safe even when a transport cannot keep that ordering promise.
#[async_trait]
pub trait Transport: Send {
    /// Broadcast an envelope to every participant in the room
    async fn send(&mut self, envelope: &Envelope) -> TransportResult<()>;

    /// Wait for the next inbound envelope, `None` when the room is gone
    async fn recv(&mut self) -> TransportResult<Option<Envelope>>;

    /// Non-blocking poll used to drain bursts, `None` when nothing is pending
    fn try_recv(&mut self) -> TransportResult<Option<Envelope>>;
}
