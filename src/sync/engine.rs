use std::collections::HashMap;

use tracing::debug;

use crate::core::{SyncMessage, SyncState};
use crate::player::{LocalEvent, PlayerCommand};

/// Engine lifecycle state
///
/// Playback rate is deliberately not a state here; it is an attribute of
/// whichever play/pause state is active and lives in its own field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No widget has signalled ready yet
    Unstarted,
    /// Widget ready, presence announced, awaiting first state
    Ready,
    Playing,
    Paused,
}

/// Reaction produced by the engine for one inbound announcement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reaction {
    /// Apply a reconciled state change to the local widget
    Apply(PlayerCommand),
    /// Re-announce our current state, a newcomer just signalled ready
    AnnounceCurrent,
}

/// Single authority for reconciling local actions with remote announcements
///
/// Pure and deterministic: callers pass the wall clock in milliseconds, so
/// every decision is reproducible in tests. The engine owns no I/O; it
/// returns messages to broadcast and commands for the adapter.
pub struct SyncEngine {
    participant: String,
    state: PlaybackState,
    rate: f64,
    outbound_seq: u64,
    applied_seq: HashMap<String, u64>,
    push_state_on_join: bool,
}

impl SyncEngine {
    pub fn new(participant: &str, push_state_on_join: bool) -> Self {
        Self {
            participant: participant.to_string(),
            state: PlaybackState::Unstarted,
            rate: 1.0,
            outbound_seq: 0,
            applied_seq: HashMap::new(),
            push_state_on_join,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    /// Process a genuine local lifecycle event
    ///
    /// Returns the announcement to broadcast, exactly one per event. Echo
    /// filtering happened earlier in the adapter, so everything arriving
    /// here is a real user action (or the one-time ready signal).
    pub fn local_event(&mut self, event: &LocalEvent, now_ms: i64) -> Option<SyncMessage> {
        match event.state {
            SyncState::Ready => {
                if self.state != PlaybackState::Unstarted {
                    debug!("ignoring repeated ready signal");
                    return None;
                }
                self.state = PlaybackState::Ready;
                Some(self.announce(SyncState::Ready, 0.0, 1.0, now_ms))
            }
            SyncState::Play => {
                self.state = PlaybackState::Playing;
                self.rate = event.rate;
                Some(self.announce(SyncState::Play, event.offset, event.rate, now_ms))
            }
            SyncState::Pause => {
                self.state = PlaybackState::Paused;
                self.rate = event.rate;
                Some(self.announce(SyncState::Pause, event.offset, event.rate, now_ms))
            }
            SyncState::Playback => {
                self.rate = event.rate;
                Some(self.announce(SyncState::Playback, event.offset, event.rate, now_ms))
            }
        }
    }

    /// Reconcile an inbound announcement
    ///
    /// Returns `None` when the message is a no-op for this participant:
    /// our own loopback, a stale sequence number, or a peer's ready signal
    /// when there is nothing to push. Otherwise the caller applies the
    /// command (or broadcasts the re-announcement) and the engine state is
    /// already updated.
    pub fn apply_remote(&mut self, msg: &SyncMessage, now_ms: i64) -> Option<Reaction> {
        if msg.sender == self.participant {
            debug!("skipping loopback of own announcement seq {}", msg.seq);
            return None;
        }

        let last = self.applied_seq.get(&msg.sender).copied().unwrap_or(0);
        if msg.seq <= last {
            debug!(
                "dropping stale announcement from {} (seq {} <= {})",
                msg.sender, msg.seq, last
            );
            return None;
        }
        self.applied_seq.insert(msg.sender.clone(), msg.seq);

        match msg.state {
            SyncState::Ready => {
                if self.push_state_on_join && self.has_authoritative_state() {
                    Some(Reaction::AnnounceCurrent)
                } else {
                    None
                }
            }
            SyncState::Play => {
                self.state = PlaybackState::Playing;
                self.rate = msg.rate;
                Some(Reaction::Apply(PlayerCommand::Play(msg.advanced_offset(now_ms))))
            }
            SyncState::Pause => {
                // A paused announcement describes a frozen position; time
                // since emission must not advance it.
                self.state = PlaybackState::Paused;
                self.rate = msg.rate;
                Some(Reaction::Apply(PlayerCommand::Pause(msg.offset)))
            }
            SyncState::Playback => {
                let offset = if self.state == PlaybackState::Playing {
                    msg.advanced_offset(now_ms)
                } else {
                    msg.offset
                };
                self.rate = msg.rate;
                Some(Reaction::Apply(PlayerCommand::SetRate(offset, msg.rate)))
            }
        }
    }

    /// Build the re-announcement for a newcomer from the current widget
    /// position, answering a `Reaction::AnnounceCurrent`
    pub fn announce_current(&mut self, offset: f64, rate: f64, now_ms: i64) -> SyncMessage {
        let state = match self.state {
            PlaybackState::Playing => SyncState::Play,
            _ => SyncState::Pause,
        };
        self.announce(state, offset, rate, now_ms)
    }

    fn has_authoritative_state(&self) -> bool {
        matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
    }

    fn announce(&mut self, state: SyncState, offset: f64, rate: f64, now_ms: i64) -> SyncMessage {
        self.outbound_seq += 1;
        SyncMessage::new(state, &self.participant, self.outbound_seq, offset, rate, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(state: SyncState, seq: u64, offset: f64, rate: f64, timestamp: i64) -> SyncMessage {
        SyncMessage::new(state, "remote", seq, offset, rate, timestamp)
    }

    fn ready_engine() -> SyncEngine {
        let mut engine = SyncEngine::new("local", false);
        let ready = LocalEvent {
            state: SyncState::Ready,
            offset: 0.0,
            rate: 1.0,
        };
        engine.local_event(&ready, 0).unwrap();
        engine
    }

    #[test]
    fn test_ready_announced_exactly_once() {
        let mut engine = SyncEngine::new("local", false);
        assert_eq!(engine.state(), PlaybackState::Unstarted);

        let ready = LocalEvent {
            state: SyncState::Ready,
            offset: 0.0,
            rate: 1.0,
        };
        let msg = engine.local_event(&ready, 1_000).unwrap();
        assert_eq!(engine.state(), PlaybackState::Ready);
        assert_eq!(msg.state, SyncState::Ready);
        assert_eq!(msg.offset, 0.0);
        assert_eq!(msg.rate, 1.0);

        assert!(engine.local_event(&ready, 2_000).is_none());
    }

    #[test]
    fn test_playing_announcement_advances_with_elapsed_time() {
        let mut engine = ready_engine();

        // Sender announced play at offset 10.0; we process it 2500ms later.
        let msg = remote(SyncState::Play, 1, 10.0, 1.0, 100_000);
        let reaction = engine.apply_remote(&msg, 102_500).unwrap();

        assert_eq!(reaction, Reaction::Apply(PlayerCommand::Play(12.5)));
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_playing_adjustment_scales_with_rate() {
        let mut engine = ready_engine();

        let msg = remote(SyncState::Play, 1, 10.0, 2.0, 100_000);
        let reaction = engine.apply_remote(&msg, 103_000).unwrap();

        assert_eq!(reaction, Reaction::Apply(PlayerCommand::Play(16.0)));
    }

    #[test]
    fn test_zero_elapsed_applies_offset_exactly() {
        let mut engine = ready_engine();

        let msg = remote(SyncState::Play, 1, 10.0, 1.0, 100_000);
        let reaction = engine.apply_remote(&msg, 100_000).unwrap();

        assert_eq!(reaction, Reaction::Apply(PlayerCommand::Play(10.0)));
    }

    #[test]
    fn test_paused_offset_is_never_advanced() {
        let mut engine = ready_engine();

        let msg = remote(SyncState::Pause, 1, 45.2, 1.0, 100_000);
        let reaction = engine.apply_remote(&msg, 109_000).unwrap();

        assert_eq!(reaction, Reaction::Apply(PlayerCommand::Pause(45.2)));
        assert_eq!(engine.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_receiver_clock_behind_sender_clamps_to_zero() {
        let mut engine = ready_engine();

        // Receiver's clock reads earlier than the sender's timestamp.
        let msg = remote(SyncState::Play, 1, 10.0, 1.0, 100_000);
        let reaction = engine.apply_remote(&msg, 95_000).unwrap();

        assert_eq!(reaction, Reaction::Apply(PlayerCommand::Play(10.0)));
    }

    #[test]
    fn test_repeated_application_is_idempotent_on_target() {
        let mut engine = ready_engine();

        let msg = remote(SyncState::Play, 1, 10.0, 1.0, 100_000);
        let first = engine.apply_remote(&msg, 100_000).unwrap();

        // The same message again is dropped by the sequence check, so the
        // widget is left exactly where the first application put it.
        assert!(engine.apply_remote(&msg, 100_000).is_none());
        assert_eq!(first, Reaction::Apply(PlayerCommand::Play(10.0)));
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_stale_sequence_is_dropped() {
        let mut engine = ready_engine();

        engine
            .apply_remote(&remote(SyncState::Play, 5, 10.0, 1.0, 100_000), 100_000)
            .unwrap();

        // An older pause that arrives late must not rewind the session.
        assert!(engine
            .apply_remote(&remote(SyncState::Pause, 4, 2.0, 1.0, 99_000), 100_100)
            .is_none());
        assert_eq!(engine.state(), PlaybackState::Playing);

        // The next fresh sequence applies.
        assert!(engine
            .apply_remote(&remote(SyncState::Pause, 6, 12.0, 1.0, 100_200), 100_200)
            .is_some());
        assert_eq!(engine.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_own_loopback_is_skipped() {
        let mut engine = ready_engine();

        let play = LocalEvent {
            state: SyncState::Play,
            offset: 10.0,
            rate: 1.0,
        };
        let broadcast = engine.local_event(&play, 100_000).unwrap();

        // The room echoes our own announcement back to us.
        assert!(engine.apply_remote(&broadcast, 100_050).is_none());
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_sequence_tracking_is_per_sender() {
        let mut engine = ready_engine();

        let a = SyncMessage::new(SyncState::Play, "a", 2, 10.0, 1.0, 100_000);
        let b = SyncMessage::new(SyncState::Pause, "b", 1, 20.0, 1.0, 100_100);

        assert!(engine.apply_remote(&a, 100_000).is_some());
        // Sender b's seq 1 is fresh even though a is already at 2.
        assert!(engine.apply_remote(&b, 100_100).is_some());
    }

    #[test]
    fn test_rate_change_keeps_play_pause_state() {
        let mut engine = ready_engine();

        engine
            .apply_remote(&remote(SyncState::Pause, 1, 30.0, 1.0, 100_000), 100_000)
            .unwrap();

        let reaction = engine
            .apply_remote(&remote(SyncState::Playback, 2, 30.0, 2.0, 101_000), 105_000)
            .unwrap();

        // Paused, so the announced offset is applied frozen.
        assert_eq!(reaction, Reaction::Apply(PlayerCommand::SetRate(30.0, 2.0)));
        assert_eq!(engine.state(), PlaybackState::Paused);
        assert_eq!(engine.rate(), 2.0);
    }

    #[test]
    fn test_rate_change_while_playing_advances_offset() {
        let mut engine = ready_engine();

        engine
            .apply_remote(&remote(SyncState::Play, 1, 10.0, 1.0, 100_000), 100_000)
            .unwrap();

        let reaction = engine
            .apply_remote(&remote(SyncState::Playback, 2, 20.0, 2.0, 101_000), 102_000)
            .unwrap();

        assert_eq!(reaction, Reaction::Apply(PlayerCommand::SetRate(22.0, 2.0)));
        assert_eq!(engine.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_push_on_join_announces_to_newcomer() {
        let mut engine = SyncEngine::new("local", true);
        let ready = LocalEvent {
            state: SyncState::Ready,
            offset: 0.0,
            rate: 1.0,
        };
        engine.local_event(&ready, 0).unwrap();
        engine
            .apply_remote(&remote(SyncState::Play, 1, 10.0, 1.0, 100_000), 100_000)
            .unwrap();

        let newcomer = SyncMessage::new(SyncState::Ready, "newcomer", 1, 0.0, 1.0, 101_000);
        let reaction = engine.apply_remote(&newcomer, 101_000).unwrap();
        assert_eq!(reaction, Reaction::AnnounceCurrent);

        let announce = engine.announce_current(11.0, 1.0, 101_000);
        assert_eq!(announce.state, SyncState::Play);
        assert_eq!(announce.offset, 11.0);
    }

    #[test]
    fn test_peer_ready_without_state_is_quiet() {
        let mut engine = SyncEngine::new("local", true);
        let ready = LocalEvent {
            state: SyncState::Ready,
            offset: 0.0,
            rate: 1.0,
        };
        engine.local_event(&ready, 0).unwrap();

        // Both of us just joined; there is nothing authoritative to push.
        let newcomer = SyncMessage::new(SyncState::Ready, "newcomer", 1, 0.0, 1.0, 1_000);
        assert!(engine.apply_remote(&newcomer, 1_000).is_none());
    }

    #[test]
    fn test_local_actions_get_increasing_sequence_numbers() {
        let mut engine = ready_engine();

        let play = LocalEvent {
            state: SyncState::Play,
            offset: 1.0,
            rate: 1.0,
        };
        let pause = LocalEvent {
            state: SyncState::Pause,
            offset: 2.0,
            rate: 1.0,
        };

        let first = engine.local_event(&play, 1_000).unwrap();
        let second = engine.local_event(&pause, 2_000).unwrap();
        assert!(second.seq > first.seq);
    }
}
