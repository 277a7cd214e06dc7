use std::collections::BTreeSet;

use crate::{
    foundation::{
        config::EngineConfig,
        core::Fps,
        error::{GazeloopError, GazeloopResult},
    },
    jump::graph::JumpGraph,
    view::region::TargetRegion,
};

/// Arena index of a segment inside the sequencer.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct SegmentId(pub usize);

/// Whether the viewer must look at or away from the target sectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePolarity {
    /// Satisfied while the active sector is a target.
    #[default]
    LookAt,
    /// Satisfied while the active sector is not a target.
    LookAway,
}

/// Gaze condition that releases a gate.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GateCondition {
    /// Target view sectors.
    pub views: BTreeSet<usize>,
    /// Look-at or look-away.
    #[serde(default)]
    pub polarity: GatePolarity,
}

impl GateCondition {
    /// Condition over `views`.
    pub fn new(views: impl IntoIterator<Item = usize>, polarity: GatePolarity) -> Self {
        Self {
            views: views.into_iter().collect(),
            polarity,
        }
    }

    /// True when looking at sector `view` satisfies the condition.
    pub fn is_satisfied_by(&self, view: usize) -> bool {
        let hit = self.views.contains(&view);
        match self.polarity {
            GatePolarity::LookAt => hit,
            GatePolarity::LookAway => !hit,
        }
    }
}

/// Authored jump tuning of a gated segment.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Maximum cost of an eager forward skip.
    pub jump_threshold: f64,
    /// Maximum cost of a backward jump counted as valid in the overlay.
    pub perceptual_threshold: f64,
    /// Shortest backward loop counted as valid, in seconds.
    pub min_loop_length_sec: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Thresholds {
    /// Thresholds with the config defaults.
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            jump_threshold: 1.0,
            perceptual_threshold: cfg.default_perceptual_threshold,
            min_loop_length_sec: cfg.default_min_loop_length_sec,
        }
    }

    /// Minimum loop length rounded to whole frames.
    pub fn min_loop_frames(&self, fps: Fps) -> u64 {
        fps.secs_to_frames_round(self.min_loop_length_sec)
    }

    fn validate(&self) -> GazeloopResult<()> {
        for (name, v) in [
            ("jump_threshold", self.jump_threshold),
            ("perceptual_threshold", self.perceptual_threshold),
            ("min_loop_length_sec", self.min_loop_length_sec),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(GazeloopError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }
}

/// Per-segment playback flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SegmentFlags {
    /// Split audio volume with the picture during transitions.
    pub cross_fade_audio: bool,
    /// Silence both backends.
    pub mute_audio: bool,
    /// Skip ahead to just before the gate once the condition holds.
    pub eager_skip: bool,
}

impl Default for SegmentFlags {
    fn default() -> Self {
        Self {
            cross_fade_audio: true,
            mute_audio: false,
            eager_skip: false,
        }
    }
}

/// Gate data of a gated segment.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct GatedSegment {
    /// Gate time relative to segment start; `None` means no gate.
    pub gate_time_sec: Option<f64>,
    /// Condition that releases the gate.
    #[serde(default)]
    pub condition: GateCondition,
    /// Jump tuning.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// Authored region the condition was derived from, if any.
    #[serde(default)]
    pub region: Option<TargetRegion>,
    /// Per-view jump data, supplied by the asset provider after loading.
    #[serde(skip)]
    pub graph: JumpGraph,
}

impl GatedSegment {
    /// Gated segment with a gate at `gate_time_sec` and no jump data yet.
    pub fn new(gate_time_sec: Option<f64>, condition: GateCondition) -> Self {
        Self {
            gate_time_sec,
            condition,
            ..Self::default()
        }
    }

    /// Attach per-view jump data.
    pub fn with_graph(mut self, graph: JumpGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Override the jump tuning.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Plain segments play straight through; gated segments hold at their gate.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKind {
    /// No gate.
    #[default]
    Plain,
    /// Gate with gaze condition and jump graph.
    Gated(Box<GatedSegment>),
}

fn enabled_default() -> bool {
    true
}

/// A span of source media placed on the timeline.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    /// Arena index, assigned by the sequencer.
    #[serde(default)]
    pub id: SegmentId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Media start time.
    pub start_sec: f64,
    /// Media end time.
    pub end_sec: f64,
    /// Position on the timeline.
    pub timeline_pos: f64,
    /// Authored clip index.
    #[serde(default)]
    pub ordinal: usize,
    /// Disabled segments are skipped by the sequencer.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
    /// Audio and skip flags.
    #[serde(default)]
    pub flags: SegmentFlags,
    /// Plain or gated.
    #[serde(default)]
    pub kind: SegmentKind,
}

impl Segment {
    /// Plain segment covering media `[start_sec, end_sec]` at `timeline_pos`.
    pub fn new_plain(
        name: impl Into<String>,
        start_sec: f64,
        end_sec: f64,
        timeline_pos: f64,
    ) -> Self {
        Self {
            id: SegmentId(0),
            name: name.into(),
            start_sec,
            end_sec,
            timeline_pos,
            ordinal: 0,
            enabled: true,
            flags: SegmentFlags::default(),
            kind: SegmentKind::Plain,
        }
    }

    /// Gated segment covering media `[start_sec, end_sec]` at `timeline_pos`.
    pub fn new_gated(
        name: impl Into<String>,
        start_sec: f64,
        end_sec: f64,
        timeline_pos: f64,
        gate: GatedSegment,
    ) -> Self {
        Self {
            kind: SegmentKind::Gated(Box::new(gate)),
            ..Self::new_plain(name, start_sec, end_sec, timeline_pos)
        }
    }

    /// Check times, gate placement and thresholds.
    pub fn validate(&self) -> GazeloopResult<()> {
        for (name, v) in [
            ("start_sec", self.start_sec),
            ("end_sec", self.end_sec),
            ("timeline_pos", self.timeline_pos),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(GazeloopError::validation(format!(
                    "segment '{}': {name} must be finite and >= 0",
                    self.name
                )));
            }
        }
        if self.end_sec <= self.start_sec {
            return Err(GazeloopError::validation(format!(
                "segment '{}': end_sec must be > start_sec",
                self.name
            )));
        }
        if let SegmentKind::Gated(g) = &self.kind {
            if let Some(gate) = g.gate_time_sec
                && (!gate.is_finite() || gate < 0.0 || gate > self.duration())
            {
                return Err(GazeloopError::validation(format!(
                    "segment '{}': gate time {gate} outside [0, {}]",
                    self.name,
                    self.duration()
                )));
            }
            g.thresholds.validate()?;
        }
        Ok(())
    }

    /// Media length.
    pub fn duration(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Timeline time at which the segment ends.
    pub fn timeline_end(&self) -> f64 {
        self.timeline_pos + self.duration()
    }

    /// Media time for a timeline time inside this segment.
    pub fn media_time_at(&self, timeline_t: f64) -> f64 {
        timeline_t - self.timeline_pos + self.start_sec
    }

    /// Timeline time for a media time inside this segment.
    pub fn timeline_time_at(&self, media_t: f64) -> f64 {
        media_t - self.start_sec + self.timeline_pos
    }

    /// Gate data when the segment is gated.
    pub fn gated(&self) -> Option<&GatedSegment> {
        match &self.kind {
            SegmentKind::Gated(g) => Some(g),
            SegmentKind::Plain => None,
        }
    }

    /// Mutable gate data when the segment is gated.
    pub fn gated_mut(&mut self) -> Option<&mut GatedSegment> {
        match &mut self.kind {
            SegmentKind::Gated(g) => Some(g),
            SegmentKind::Plain => None,
        }
    }

    /// Gate time on the timeline, when the segment has a gate.
    pub fn gate_time_on_timeline(&self) -> Option<f64> {
        self.gated()
            .and_then(|g| g.gate_time_sec)
            .map(|g| self.timeline_pos + g)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gate/segment.rs"]
mod tests;
