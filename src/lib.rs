//! Playback synchronization for shared watch-together video sessions.
//!
//! Every participant runs the same pair of components: a [`PlayerAdapter`]
//! wrapping the embedding environment's video widget, and a [`SyncEngine`]
//! that reconciles local user actions with remote state announcements.
//! [`SyncSession`] wires both to a room [`Transport`] behind one
//! event-processing task, so playback converges within a small bounded
//! skew even though every client keeps its own clock.

pub mod config;
pub mod core;
pub mod error;
pub mod player;
pub mod sync;
pub mod transport;

pub use crate::config::SyncSettings;
pub use crate::core::{parse_video_id, Envelope, SyncMessage, SyncState, ViewOrientation};
pub use crate::error::SyncError;
pub use crate::player::{
    LocalEvent, MockWidget, PlayerAdapter, PlayerCommand, PlayerWidget, WidgetOptions,
};
pub use crate::sync::{PlaybackState, SessionHandle, SyncEngine, SyncSession};
pub use crate::transport::{RoomHub, RoomTransport, Transport};
