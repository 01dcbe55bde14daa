use crate::core::ViewOrientation;
use crate::error::BoxedError;

/// Result type for widget operations
pub type WidgetResult<T> = Result<T, BoxedError>;

/// Construction options for the embedded player
#[derive(Debug, Clone)]
pub struct WidgetOptions {
    /// Initial video to cue
    pub video_id: String,
    /// Start with audio muted
    pub muted: bool,
}

/// Status of the wrapped widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetStatus {
    /// Widget exists but has not signalled ready yet
    Detached,
    /// Widget signalled ready and accepts commands
    Ready,
}

/// Native lifecycle states fired by the embedded player
///
/// Numeric codes follow the embedded player's convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl NativeState {
    /// Map a native state-change code, `None` for codes we do not know
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(NativeState::Unstarted),
            0 => Some(NativeState::Ended),
            1 => Some(NativeState::Playing),
            2 => Some(NativeState::Paused),
            3 => Some(NativeState::Buffering),
            5 => Some(NativeState::Cued),
            _ => None,
        }
    }
}

/// Trait for embedded video player implementations
///
/// The adapter is the only caller; the engine never reaches the widget
/// directly. Implementations are expected to fire exactly one native
/// state or rate callback for every transition issued through this trait,
/// which is what makes the adapter's echo suppression sound.
pub trait PlayerWidget: Send {
    /// Seek to `offset` seconds and start playback
    fn play(&mut self, offset: f64) -> WidgetResult<()>;

    /// Seek to `offset` seconds and freeze playback
    fn pause(&mut self, offset: f64) -> WidgetResult<()>;

    /// Seek to `offset` seconds and change the playback speed
    fn set_playback_rate(&mut self, offset: f64, rate: f64) -> WidgetResult<()>;

    /// Seek without changing the play/pause state
    fn seek(&mut self, offset: f64) -> WidgetResult<()>;

    /// Switch to different source material
    fn load_video(&mut self, video_id: &str) -> WidgetResult<()>;

    /// Current playback position in seconds
    fn current_offset(&self) -> f64;

    /// Current playback speed multiplier
    fn playback_rate(&self) -> f64;

    /// Apply a spherical view orientation
    ///
    /// Widgets without a 360° surface ignore this.
    fn set_view(&mut self, _view: &ViewOrientation) -> WidgetResult<()> {
        Ok(())
    }
}
