use std::sync::{Arc, Mutex};

use crate::core::ViewOrientation;
use crate::player::widget::{PlayerWidget, WidgetResult};

/// Calls recorded by the mock widget, in issue order
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCall {
    Play(f64),
    Pause(f64),
    SetRate(f64, f64),
    Seek(f64),
    Load(String),
    SetView(ViewOrientation),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<WidgetCall>,
    offset: f64,
    rate: f64,
    playing: bool,
    fail_next: bool,
}

/// Mock player widget for testing without an embedding environment
///
/// Records every call for verification and simulates position and rate
/// bookkeeping. Clones share state, so a test can keep one clone for
/// inspection while the adapter owns another.
#[derive(Clone)]
pub struct MockWidget {
    state: Arc<Mutex<MockState>>,
}

impl MockWidget {
    /// Create a new mock widget, paused at offset 0 with rate 1
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                rate: 1.0,
                ..MockState::default()
            })),
        }
    }

    /// Script the position the widget reports next
    pub fn set_position(&self, offset: f64, rate: f64) {
        let mut state = self.state.lock().unwrap();
        state.offset = offset;
        state.rate = rate;
    }

    /// Make the next widget call fail (for error-path testing)
    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    /// Drain and return all recorded calls
    pub fn take_calls(&self) -> Vec<WidgetCall> {
        std::mem::take(&mut self.state.lock().unwrap().calls)
    }

    /// Whether the simulated player is currently running
    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    fn record(&self, call: WidgetCall) -> WidgetResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            return Err(format!("injected failure for {:?}", call).into());
        }

        match &call {
            WidgetCall::Play(offset) => {
                state.offset = *offset;
                state.playing = true;
            }
            WidgetCall::Pause(offset) => {
                state.offset = *offset;
                state.playing = false;
            }
            WidgetCall::SetRate(offset, rate) => {
                state.offset = *offset;
                state.rate = *rate;
            }
            WidgetCall::Seek(offset) => {
                state.offset = *offset;
            }
            WidgetCall::Load(_) => {
                state.offset = 0.0;
                state.playing = false;
            }
            WidgetCall::SetView(_) => {}
        }

        state.calls.push(call);
        Ok(())
    }
}

impl Default for MockWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerWidget for MockWidget {
    fn play(&mut self, offset: f64) -> WidgetResult<()> {
        self.record(WidgetCall::Play(offset))
    }

    fn pause(&mut self, offset: f64) -> WidgetResult<()> {
        self.record(WidgetCall::Pause(offset))
    }

    fn set_playback_rate(&mut self, offset: f64, rate: f64) -> WidgetResult<()> {
        self.record(WidgetCall::SetRate(offset, rate))
    }

    fn seek(&mut self, offset: f64) -> WidgetResult<()> {
        self.record(WidgetCall::Seek(offset))
    }

    fn load_video(&mut self, video_id: &str) -> WidgetResult<()> {
        self.record(WidgetCall::Load(video_id.to_string()))
    }

    fn current_offset(&self) -> f64 {
        self.state.lock().unwrap().offset
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().unwrap().rate
    }

    fn set_view(&mut self, view: &ViewOrientation) -> WidgetResult<()> {
        self.record(WidgetCall::SetView(*view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let mock = MockWidget::new();
        let mut widget: Box<dyn PlayerWidget> = Box::new(mock.clone());

        widget.play(10.0).unwrap();
        widget.pause(12.5).unwrap();

        assert_eq!(
            mock.take_calls(),
            vec![WidgetCall::Play(10.0), WidgetCall::Pause(12.5)]
        );
        assert!(mock.take_calls().is_empty());
    }

    #[test]
    fn test_tracks_position_and_rate() {
        let mock = MockWidget::new();
        let mut widget: Box<dyn PlayerWidget> = Box::new(mock.clone());

        widget.play(30.0).unwrap();
        widget.set_playback_rate(31.0, 2.0).unwrap();

        assert!(mock.is_playing());
        assert_eq!(widget.current_offset(), 31.0);
        assert_eq!(widget.playback_rate(), 2.0);
    }

    #[test]
    fn test_seek_moves_position_without_starting() {
        let mock = MockWidget::new();
        let mut widget: Box<dyn PlayerWidget> = Box::new(mock.clone());

        widget.seek(90.0).unwrap();
        assert_eq!(widget.current_offset(), 90.0);
        assert!(!mock.is_playing());
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let mock = MockWidget::new();
        let mut widget: Box<dyn PlayerWidget> = Box::new(mock.clone());

        mock.fail_next();
        assert!(widget.play(1.0).is_err());
        assert!(widget.play(1.0).is_ok());
    }
}
