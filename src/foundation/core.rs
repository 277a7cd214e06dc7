use crate::foundation::error::{GazeloopError, GazeloopResult};

pub use kurbo::{Point, Rect};

/// Frame index relative to the start of a segment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Frame `n` frames later, saturating.
    pub fn forward(self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }

    /// Frame `n` frames earlier, saturating at zero.
    pub fn back(self, n: u64) -> Self {
        Self(self.0.saturating_sub(n))
    }
}

/// Half-open frame range `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// First frame in the range.
    pub start: FrameIndex,
    /// One past the last frame.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> GazeloopResult<Self> {
        if start.0 > end.0 {
            return Err(GazeloopError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// One-frame range starting at `f`.
    pub fn single(f: FrameIndex) -> Self {
        Self {
            start: f,
            end: f.forward(1),
        }
    }

    /// Number of frames covered.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// True when the range covers no frame.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// True when `f` lies inside the range.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

const FRAME_SNAP_EPSILON: f64 = 1e-6;

/// Rational frame rate of the source media.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl Fps {
    /// Build a frame rate, rejecting zero parts.
    pub fn new(num: u32, den: u32) -> GazeloopResult<Self> {
        if den == 0 {
            return Err(GazeloopError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(GazeloopError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frame rate reported by a decoder as a float; non-integer rates keep millihertz
    /// precision.
    pub fn from_rate(rate: f64) -> GazeloopResult<Self> {
        if !rate.is_finite() || rate <= 0.0 || rate > f64::from(u32::MAX / 1000) {
            return Err(GazeloopError::validation(format!(
                "frame rate {rate} must be finite and > 0"
            )));
        }
        if (rate - rate.round()).abs() < 1e-9 {
            return Self::new(rate.round() as u32, 1);
        }
        Self::new((rate * 1000.0).round() as u32, 1000)
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of a single frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Seconds at which frame `frame` starts.
    pub fn frame_to_secs(self, frame: FrameIndex) -> f64 {
        (frame.0 as f64) * self.frame_duration_secs()
    }

    /// Frame displayed at `secs` (truncating, negative times map to frame 0).
    ///
    /// Times within a microframe below a frame boundary snap to that boundary so accumulated
    /// float steps do not land one frame short.
    pub fn secs_to_frame(self, secs: f64) -> FrameIndex {
        FrameIndex((secs * self.as_f64() + FRAME_SNAP_EPSILON).floor().max(0.0) as u64)
    }

    /// Frame count nearest to a duration in seconds.
    pub fn secs_to_frames_round(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

/// Pixel dimensions of the equirectangular source video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoDims {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl VideoDims {
    /// Build dimensions, rejecting zero extents.
    pub fn new(width: u32, height: u32) -> GazeloopResult<Self> {
        if width == 0 || height == 0 {
            return Err(GazeloopError::validation("video width/height must be > 0"));
        }
        Ok(Self { width, height })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
