use thiserror::Error;

/// Boxed error type carried across the widget and transport trait seams
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the synchronization core
///
/// Only `WidgetInit` is fatal to a session. Everything else is contained:
/// the offending message is dropped and playback re-converges on the next
/// state announcement.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The embedding environment could not construct the playback widget
    #[error("widget initialization failed: {0}")]
    WidgetInit(String),

    /// A single inbound announcement could not be applied to the widget
    #[error("failed to apply remote state: {0}")]
    ApplyRemote(#[source] BoxedError),

    /// Inbound payload was missing required fields or used an unknown state
    #[error("malformed sync message: {0}")]
    MalformedMessage(String),

    /// The transport failed to carry a message
    #[error("transport error: {0}")]
    Transport(#[source] BoxedError),

    /// The session task is no longer running
    #[error("session closed")]
    SessionClosed,
}
