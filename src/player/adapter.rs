use tracing::{debug, info, warn};

use crate::core::{SyncState, ViewOrientation};
use crate::error::SyncError;
use crate::player::widget::{NativeState, PlayerWidget, WidgetOptions, WidgetResult, WidgetStatus};

/// A normalized lifecycle event observed from the local widget
///
/// `offset` and `rate` are read back to back from the widget, so the
/// engine can stamp the pair with a single wall-clock reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalEvent {
    pub state: SyncState,
    pub offset: f64,
    pub rate: f64,
}

/// A reconciled state change the engine wants applied to the widget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Seek to the offset and run
    Play(f64),
    /// Seek to the offset and freeze
    Pause(f64),
    /// Seek to the offset and switch speed
    SetRate(f64, f64),
}

/// Bridge between the widget's native callback surface and the engine
///
/// Exclusively owns the widget for the lifetime of one player instance.
/// The engine issues commands and reads positions only through this
/// adapter, which keeps a single writer on the widget.
pub struct PlayerAdapter {
    widget: Box<dyn PlayerWidget>,
    status: WidgetStatus,
    // Set right before a remote command reaches the widget, consumed by the
    // resulting native callback. Sound because the session processes every
    // event to completion before the next one.
    suppress_echo: bool,
}

impl std::fmt::Debug for PlayerAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerAdapter")
            .field("status", &self.status)
            .field("suppress_echo", &self.suppress_echo)
            .finish_non_exhaustive()
    }
}

impl PlayerAdapter {
    /// Construct the widget through `factory` and wrap it
    ///
    /// The factory receives the options (initial video, mute preference)
    /// and returns the embedded player, created paused. A factory failure
    /// means the embedding environment cannot host a player at all and is
    /// fatal to the session.
    pub fn initialize<F>(options: &WidgetOptions, factory: F) -> Result<Self, SyncError>
    where
        F: FnOnce(&WidgetOptions) -> WidgetResult<Box<dyn PlayerWidget>>,
    {
        let widget = factory(options).map_err(|e| SyncError::WidgetInit(e.to_string()))?;
        info!("player widget initialized for video {}", options.video_id);
        Ok(Self {
            widget,
            status: WidgetStatus::Detached,
            suppress_echo: false,
        })
    }

    /// Wrap an already constructed widget
    pub fn new(widget: Box<dyn PlayerWidget>) -> Self {
        Self {
            widget,
            status: WidgetStatus::Detached,
            suppress_echo: false,
        }
    }

    pub fn status(&self) -> WidgetStatus {
        self.status
    }

    /// Current position and rate, read together
    pub fn snapshot(&self) -> (f64, f64) {
        (self.widget.current_offset(), self.widget.playback_rate())
    }

    /// Apply a reconciled remote state change to the widget
    ///
    /// The echo marker is set before the widget call so the native
    /// callback it triggers is not mistaken for a local user action.
    pub fn apply_remote(&mut self, command: &PlayerCommand) -> Result<(), SyncError> {
        if self.status != WidgetStatus::Ready {
            return Err(SyncError::ApplyRemote("widget not ready".into()));
        }

        self.suppress_echo = true;
        let result = match command {
            PlayerCommand::Play(offset) => self.widget.play(*offset),
            PlayerCommand::Pause(offset) => self.widget.pause(*offset),
            PlayerCommand::SetRate(offset, rate) => self.widget.set_playback_rate(*offset, *rate),
        };

        result.map_err(|e| {
            // No native callback will arrive for a failed call; the marker
            // must not swallow the next genuine action.
            self.suppress_echo = false;
            SyncError::ApplyRemote(e)
        })
    }

    /// Switch the widget to new source material, frozen at offset 0
    ///
    /// The session stays paused until a fresh ready/announcement cycle
    /// delivers authoritative state for the new video.
    pub fn load_video(&mut self, video_id: &str) -> Result<(), SyncError> {
        if self.status != WidgetStatus::Ready {
            return Err(SyncError::ApplyRemote("widget not ready".into()));
        }

        info!("loading video {}", video_id);
        self.widget
            .load_video(video_id)
            .map_err(SyncError::ApplyRemote)?;

        self.suppress_echo = true;
        if let Err(e) = self.widget.pause(0.0) {
            self.suppress_echo = false;
            return Err(SyncError::ApplyRemote(e));
        }
        Ok(())
    }

    /// Forward a clamped view orientation to the widget
    pub fn apply_view(&mut self, view: &ViewOrientation) -> Result<(), SyncError> {
        self.widget
            .set_view(&view.clamped())
            .map_err(SyncError::ApplyRemote)
    }

    /// Handle the widget's native ready callback
    ///
    /// Forces the widget into paused at offset 0 so a late joiner never
    /// auto-plays ahead of authoritative state, then reports readiness
    /// upward for the join announcement.
    pub fn on_native_ready(&mut self) -> LocalEvent {
        self.status = WidgetStatus::Ready;

        self.suppress_echo = true;
        if let Err(e) = self.widget.pause(0.0) {
            self.suppress_echo = false;
            warn!("could not park widget at offset 0: {}", e);
        }

        LocalEvent {
            state: SyncState::Ready,
            offset: 0.0,
            rate: 1.0,
        }
    }

    /// Handle a native state-change callback
    ///
    /// Returns the normalized local event, or `None` when the change was
    /// the echo of a command we just applied or a state the protocol does
    /// not announce.
    pub fn on_native_state_change(&mut self, code: i32) -> Option<LocalEvent> {
        let native = match NativeState::from_code(code) {
            Some(native) => native,
            None => {
                debug!("ignoring unknown native state code {}", code);
                return None;
            }
        };

        let state = match native {
            NativeState::Playing => SyncState::Play,
            NativeState::Paused => SyncState::Pause,
            other => {
                debug!("native state {:?} produces no announcement", other);
                return None;
            }
        };

        if self.suppress_echo {
            self.suppress_echo = false;
            debug!("suppressed echo of applied remote state {:?}", state);
            return None;
        }

        let (offset, rate) = self.snapshot();
        Some(LocalEvent { state, offset, rate })
    }

    /// Handle a native playback-rate callback
    pub fn on_native_rate_change(&mut self, rate: f64) -> Option<LocalEvent> {
        if self.suppress_echo {
            self.suppress_echo = false;
            debug!("suppressed echo of applied remote rate {}", rate);
            return None;
        }

        let offset = self.widget.current_offset();
        Some(LocalEvent {
            state: SyncState::Playback,
            offset,
            rate,
        })
    }
}
