use serde::{Deserialize, Serialize};

use crate::core::message::SyncMessage;
use crate::core::view::ViewOrientation;
use crate::error::SyncError;

/// The unit exchanged over the room transport
///
/// Serialized as a tagged JSON mapping so payloads from other client
/// implementations of the room protocol decode unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Envelope {
    /// Switch every participant's widget to a new video
    #[serde(rename = "yt-load")]
    Load {
        #[serde(rename = "videoId")]
        video_id: String,
    },

    /// Playback state announcement
    #[serde(rename = "yt-state-change")]
    StateChange(SyncMessage),

    /// 360° view orientation update
    #[serde(rename = "yt-sphere-update")]
    SphereUpdate { properties: ViewOrientation },
}

impl Envelope {
    /// Serialize for the wire
    pub fn to_json(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(|e| SyncError::Transport(Box::new(e)))
    }

    /// Parse an inbound payload
    ///
    /// Anything that does not decode into a known message type is
    /// `MalformedMessage`; the caller drops it without a state change.
    pub fn from_json(payload: &str) -> Result<Self, SyncError> {
        serde_json::from_str(payload).map_err(|e| SyncError::MalformedMessage(e.to_string()))
    }
}
