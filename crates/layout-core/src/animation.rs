//! Image animation curves.

use serde::{Deserialize, Serialize};

/// Linear zoom from `start_scale` to `end_scale` over `duration_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomCurve {
    pub start_scale: f64,
    pub end_scale: f64,
    pub duration_secs: f64,
}

impl ZoomCurve {
    /// Scale at the end of a `zoom_in` scene.
    pub const ZOOM_IN_END_SCALE: f64 = 1.1;

    /// The `zoom_in` animation: 1.0 rising to 1.1 over the scene.
    pub fn zoom_in(duration_secs: f64) -> Self {
        Self {
            start_scale: 1.0,
            end_scale: Self::ZOOM_IN_END_SCALE,
            duration_secs,
        }
    }

    /// Scale factor at `t` seconds into the scene. Times outside the scene
    /// are clamped to its ends.
    pub fn scale_at(&self, t: f64) -> f64 {
        if self.duration_secs <= 0.0 {
            return self.end_scale;
        }
        let progress = (t / self.duration_secs).clamp(0.0, 1.0);
        self.start_scale + (self.end_scale - self.start_scale) * progress
    }

    /// Change in scale per second.
    pub fn rate_per_sec(&self) -> f64 {
        if self.duration_secs <= 0.0 {
            0.0
        } else {
            (self.end_scale - self.start_scale) / self.duration_secs
        }
    }
}
