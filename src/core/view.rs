use serde::{Deserialize, Serialize};

/// Camera orientation for 360° video, shared across participants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewOrientation {
    /// Horizontal angle in degrees, 0 to 360
    pub yaw: f64,
    /// Vertical angle in degrees, -90 to 90
    pub pitch: f64,
    /// Rotation in degrees, -180 to 180
    pub roll: f64,
    /// Field of view in degrees, 30 to 120
    pub fov: f64,
}

impl Default for ViewOrientation {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            fov: 100.0,
        }
    }
}

impl ViewOrientation {
    /// Return a copy with every angle forced into its legal range
    ///
    /// Non-finite values fall back to the defaults.
    pub fn clamped(self) -> Self {
        Self {
            yaw: clamp_or(self.yaw, 0.0, 360.0, 0.0),
            pitch: clamp_or(self.pitch, -90.0, 90.0, 0.0),
            roll: clamp_or(self.roll, -180.0, 180.0, 0.0),
            fov: clamp_or(self.fov, 30.0, 120.0, 100.0),
        }
    }
}

fn clamp_or(value: f64, min: f64, max: f64, default: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}
