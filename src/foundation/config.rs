use std::path::Path;

use crate::foundation::error::{GazeloopError, GazeloopResult};

/// How an eager forward skip treats audio on segments that do not crossfade audio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EagerSkipAudioPolicy {
    /// Eager skips always crossfade audio, whatever the segment flag says.
    #[default]
    Crossfade,
    /// Audio follows the segment flag and switches backends at blend 0.5.
    HardSwitch,
    /// Eager skips are not issued on segments that do not crossfade audio.
    Suppress,
}

/// Immutable engine configuration, loaded once and injected into components.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of azimuthal view sectors.
    pub num_views: usize,
    /// Horizontal field of view of a sector, in degrees.
    pub view_hfov_deg: f64,
    /// Vertical field of view of a sector, in degrees.
    pub view_vfov_deg: f64,
    /// Length of a loop/skip crossfade, in seconds.
    pub transition_duration_sec: f64,
    /// Samples taken along the viewport border (four edges plus closing point).
    pub boundary_samples: usize,
    /// Perceptual threshold used when a segment does not author one.
    pub default_perceptual_threshold: f64,
    /// Minimum loop length used when a segment does not author one, in seconds.
    pub default_min_loop_length_sec: f64,
    /// Gap between consecutive segments above which the sequencer seeks explicitly.
    pub segment_reseek_gap_sec: f64,
    /// Distance before the active segment start at which playback is considered stale.
    pub stale_position_guard_sec: f64,
    /// Audio policy for eager forward skips.
    pub eager_skip_audio: EagerSkipAudioPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_views: 40,
            view_hfov_deg: 80.65347,
            view_vfov_deg: 180.0,
            transition_duration_sec: 0.5,
            boundary_samples: 41,
            default_perceptual_threshold: 2000.0,
            default_min_loop_length_sec: 1.0,
            segment_reseek_gap_sec: 0.5,
            stale_position_guard_sec: 5.0,
            eager_skip_audio: EagerSkipAudioPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Validate ranges of every field.
    pub fn validate(&self) -> GazeloopResult<()> {
        if self.num_views == 0 {
            return Err(GazeloopError::validation("num_views must be > 0"));
        }
        for (name, v) in [
            ("view_hfov_deg", self.view_hfov_deg),
            ("view_vfov_deg", self.view_vfov_deg),
        ] {
            if !v.is_finite() || v <= 0.0 || v > 360.0 {
                return Err(GazeloopError::validation(format!(
                    "{name} must be finite and in (0, 360]"
                )));
            }
        }
        if !self.transition_duration_sec.is_finite() || self.transition_duration_sec <= 0.0 {
            return Err(GazeloopError::validation(
                "transition_duration_sec must be finite and > 0",
            ));
        }
        // Four edges of at least one sample each, plus the closing sample.
        if self.boundary_samples < 5 {
            return Err(GazeloopError::validation("boundary_samples must be >= 5"));
        }
        for (name, v) in [
            (
                "default_perceptual_threshold",
                self.default_perceptual_threshold,
            ),
            (
                "default_min_loop_length_sec",
                self.default_min_loop_length_sec,
            ),
            ("segment_reseek_gap_sec", self.segment_reseek_gap_sec),
            ("stale_position_guard_sec", self.stale_position_guard_sec),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(GazeloopError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> GazeloopResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| GazeloopError::serde(format!("engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> GazeloopResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            GazeloopError::Other(
                anyhow::Error::new(e).context(format!("read engine config '{}'", path.display())),
            )
        })?;
        Self::from_json_str(&s)
    }

    /// Half of the sector horizontal FOV, in radians.
    pub fn view_half_hfov_rad(&self) -> f64 {
        self.view_hfov_deg.to_radians() / 2.0
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
