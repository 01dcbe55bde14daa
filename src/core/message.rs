use serde::{Deserialize, Serialize};

/// Playback states announced between participants
///
/// Serialized with the wire literals used by the room protocol. `Playback`
/// announces a rate-only change; it modifies whichever play/pause state is
/// active and never starts or stops playback by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// Participant's widget finished initializing
    #[serde(rename = "ready")]
    Ready,
    /// Playback is running from the announced offset
    #[serde(rename = "play")]
    Play,
    /// Playback is frozen at the announced offset
    #[serde(rename = "pause")]
    Pause,
    /// Playback speed changed without starting or stopping
    #[serde(rename = "playback")]
    Playback,
}

/// A playback state announcement
///
/// `offset` and `timestamp` are captured together at emission time; the
/// receiver-side adjustment assumes `offset` was true exactly at `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// The state being announced
    pub state: SyncState,

    /// Participant that produced the announcement
    pub sender: String,

    /// Per-sender monotonically increasing sequence number
    pub seq: u64,

    /// Playback position in seconds at the moment of emission
    pub offset: f64,

    /// Playback speed multiplier at emission time
    pub rate: f64,

    /// Sender's wall clock in milliseconds since the Unix epoch
    pub timestamp: i64,

    /// Scheduled-application hint in epoch milliseconds, 0 = apply immediately
    #[serde(default, rename = "runAt")]
    pub run_at: i64,
}

impl SyncMessage {
    /// Create a new announcement stamped with the given wall clock
    pub fn new(state: SyncState, sender: &str, seq: u64, offset: f64, rate: f64, now_ms: i64) -> Self {
        Self {
            state,
            sender: sender.to_string(),
            seq,
            offset,
            rate,
            timestamp: now_ms,
            run_at: 0,
        }
    }

    /// Milliseconds elapsed since this message was produced, clamped to zero
    ///
    /// The receiver's clock may run behind the sender's; a negative elapsed
    /// time is never applied.
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.timestamp).max(0)
    }

    /// The position the sender has advanced to by `now_ms`
    ///
    /// Only meaningful for announcements describing running playback. A
    /// paused announcement describes a frozen position and must use
    /// `offset` unchanged instead.
    pub fn advanced_offset(&self, now_ms: i64) -> f64 {
        self.offset + (self.elapsed_ms(now_ms) as f64 / 1000.0) * self.rate
    }

    /// Coerce out-of-range field values in place
    ///
    /// Mirrors the room server's ingest rules: values with a safe fix are
    /// repaired rather than rejected. Offsets become non-negative, a
    /// missing or zero rate falls back to 1.0, `run_at` is clamped to zero
    /// and a missing timestamp is replaced with the receiver's clock.
    pub fn sanitize(&mut self, now_ms: i64) {
        self.offset = if self.offset.is_finite() { self.offset.abs() } else { 0.0 };
        self.rate = if self.rate.is_finite() && self.rate != 0.0 {
            self.rate.abs()
        } else {
            1.0
        };
        self.run_at = self.run_at.max(0);
        if self.timestamp <= 0 {
            self.timestamp = now_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_never_negative() {
        let msg = SyncMessage::new(SyncState::Play, "a", 1, 10.0, 1.0, 5_000);
        assert_eq!(msg.elapsed_ms(3_000), 0);
        assert_eq!(msg.elapsed_ms(5_000), 0);
        assert_eq!(msg.elapsed_ms(7_500), 2_500);
    }

    #[test]
    fn test_advanced_offset_scales_with_rate() {
        let msg = SyncMessage::new(SyncState::Play, "a", 1, 10.0, 2.0, 1_000);
        assert_eq!(msg.advanced_offset(1_000), 10.0);
        assert_eq!(msg.advanced_offset(3_500), 15.0);
    }

    #[test]
    fn test_sanitize_repairs_values() {
        let mut msg = SyncMessage::new(SyncState::Play, "a", 1, -3.5, 0.0, 0);
        msg.run_at = -20;
        msg.sanitize(9_000);
        assert_eq!(msg.offset, 3.5);
        assert_eq!(msg.rate, 1.0);
        assert_eq!(msg.run_at, 0);
        assert_eq!(msg.timestamp, 9_000);
    }

    #[test]
    fn test_state_wire_literals() {
        assert_eq!(serde_json::to_string(&SyncState::Play).unwrap(), "\"play\"");
        assert_eq!(serde_json::to_string(&SyncState::Pause).unwrap(), "\"pause\"");
        assert_eq!(serde_json::to_string(&SyncState::Playback).unwrap(), "\"playback\"");
        assert_eq!(serde_json::to_string(&SyncState::Ready).unwrap(), "\"ready\"");
    }
}
