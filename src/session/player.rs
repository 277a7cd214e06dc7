use kurbo::Point;

use crate::{
    foundation::{
        config::EngineConfig,
        core::{FrameIndex, FrameRange, Fps, VideoDims},
        error::{GazeloopError, GazeloopResult},
    },
    gate::{
        gate::GateState,
        segment::{GateCondition, GatePolarity, Segment, SegmentId, Thresholds},
    },
    jump::{arc::LoopArc, cut::CutBlock},
    playback::{
        backend::{BackendKind, BackendSettings, PlaybackBackend, create_backend},
        sync::{AudioMix, DualPlayerSync},
    },
    sequence::sequencer::{SegmentSequencer, TickReport},
    view::{
        region::TargetRegion,
        resolver::{Camera, ViewResolver},
    },
};

/// Read-only snapshot of a [`Player`] for the presentation layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PlayerStatus {
    /// Active segment, `None` at end of sequence.
    pub segment: Option<SegmentId>,
    /// Name of the active segment.
    pub segment_name: Option<String>,
    /// Media time of the authoritative backend.
    pub media_time: f64,
    /// Timeline time of the playhead.
    pub timeline_time: Option<f64>,
    /// Sector latched on the last tick.
    pub view: Option<usize>,
    /// Gate state of the active segment.
    pub gate_state: GateState,
    /// Gate latch of the active segment.
    pub gate_satisfied: bool,
    /// True when playback was requested.
    pub playing: bool,
    /// True while a crossfade is running.
    pub transitioning: bool,
    /// Render weight of the main backend.
    pub blend: f64,
    /// Per-backend audio levels.
    pub audio: AudioMix,
    /// Desyncs recovered by the watchdog.
    pub desync_recoveries: u64,
    /// Skipped gate frames.
    pub dropped_frames: u64,
    /// Gaze rays that missed the projection sphere.
    pub geometry_faults: u64,
    /// No segment remains.
    pub end_of_sequence: bool,
}

/// Playback session: owns the resolver, both backends and the segment sequencer.
///
/// Drive it with [`Player::tick`] once per rendered frame; everything else is a command or a
/// query issued between ticks.
#[derive(Debug)]
pub struct Player {
    cfg: EngineConfig,
    resolver: ViewResolver,
    sync: DualPlayerSync,
    sequencer: SegmentSequencer,
    arcs_populated: bool,
}

impl Player {
    /// Build a session over two caller-provided backends and park them at the first segment.
    pub fn new(
        cfg: EngineConfig,
        segments: Vec<Segment>,
        main: Box<dyn PlaybackBackend>,
        side: Box<dyn PlaybackBackend>,
    ) -> GazeloopResult<Self> {
        cfg.validate()?;
        let resolver = ViewResolver::new(&cfg)?;
        let sync = DualPlayerSync::new(main, side, cfg.transition_duration_sec)?;
        let sequencer = SegmentSequencer::new(segments, &cfg)?;
        let mut player = Self {
            cfg,
            resolver,
            sync,
            sequencer,
            arcs_populated: false,
        };
        player.sequencer.start(&mut player.sync);
        player.populate_arcs();
        Ok(player)
    }

    /// Build a session over two backends of `kind`.
    pub fn with_backends(
        cfg: EngineConfig,
        segments: Vec<Segment>,
        kind: BackendKind,
        settings: &BackendSettings,
    ) -> GazeloopResult<Self> {
        let main = create_backend(kind, settings)?;
        let side = create_backend(kind, settings)?;
        Self::new(cfg, segments, main, side)
    }

    fn fps(&self) -> Option<Fps> {
        self.sync.frame_rate().and_then(|r| Fps::from_rate(r).ok())
    }

    fn populate_arcs(&mut self) {
        if self.arcs_populated {
            return;
        }
        if let Some(fps) = self.fps() {
            self.sequencer.populate_backward_arcs(fps);
            self.arcs_populated = true;
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// The view resolver.
    pub fn resolver(&self) -> &ViewResolver {
        &self.resolver
    }

    /// The backend pair.
    pub fn sync(&self) -> &DualPlayerSync {
        &self.sync
    }

    /// The segment sequencer.
    pub fn sequencer(&self) -> &SegmentSequencer {
        &self.sequencer
    }

    /// Advance backends by `dt`, latch the gaze sector and run the sequencer.
    #[tracing::instrument(skip(self, camera))]
    pub fn tick(&mut self, dt: f64, camera: &dyn Camera) -> TickReport {
        self.sync.update_backends(dt);
        self.populate_arcs();
        let view = self.resolver.latch(camera);
        self.sequencer.tick(&mut self.sync, view)
    }

    /// Request playback.
    pub fn play(&mut self) {
        self.sync.play();
    }

    /// Pause playback.
    pub fn pause(&mut self) {
        self.sync.pause();
    }

    /// Pause and rewind to the start of the timeline.
    pub fn stop(&mut self) -> GazeloopResult<()> {
        self.sync.pause();
        let Some(first) = self.sequencer.segments().first() else {
            return Ok(());
        };
        let pos = first.timeline_pos;
        self.sequencer.seek(&mut self.sync, pos)?;
        Ok(())
    }

    /// Seek to a timeline time.
    pub fn seek(&mut self, timeline_t: f64) -> GazeloopResult<SegmentId> {
        self.sequencer.seek(&mut self.sync, timeline_t)
    }

    /// Set a gated segment's target sectors.
    pub fn set_gate_condition(
        &mut self,
        segment: SegmentId,
        views: impl IntoIterator<Item = usize>,
        polarity: GatePolarity,
    ) -> GazeloopResult<()> {
        let condition = GateCondition::new(views, polarity);
        if let Some(bad) = condition.views.iter().find(|&&v| v >= self.cfg.num_views) {
            return Err(GazeloopError::validation(format!(
                "view {bad} out of range (num_views = {})",
                self.cfg.num_views
            )));
        }
        self.sequencer.set_gate_condition(segment, condition)
    }

    /// Target every sector overlapping an equirectangular region; returns those sectors.
    pub fn set_gate_region(
        &mut self,
        segment: SegmentId,
        region: TargetRegion,
        dims: VideoDims,
        polarity: GatePolarity,
    ) -> GazeloopResult<Vec<usize>> {
        self.sequencer
            .set_gate_region(segment, region, dims, polarity, &self.resolver)
    }

    /// Replace a gated segment's jump tuning.
    pub fn set_thresholds(&mut self, segment: SegmentId, thresholds: Thresholds) -> GazeloopResult<()> {
        self.sequencer.set_thresholds(segment, thresholds)
    }

    /// Snapshot for the presentation layer.
    pub fn status(&self) -> PlayerStatus {
        let seg = self.sequencer.active_segment();
        let gate = self.sequencer.gate();
        PlayerStatus {
            segment: seg.map(|s| s.id),
            segment_name: seg.map(|s| s.name.clone()),
            media_time: self.sync.current_time(),
            timeline_time: self.sequencer.timeline_time(&self.sync),
            view: self.resolver.latched_view(),
            gate_state: gate.state(),
            gate_satisfied: gate.gate_satisfied(),
            playing: self.sync.play_requested(),
            transitioning: self.sync.is_transitioning(),
            blend: self.sync.state().blend,
            audio: self.sync.audio_mix(),
            desync_recoveries: self.sync.desync_recoveries(),
            dropped_frames: gate.dropped_frames(),
            geometry_faults: self.resolver.geometry_faults(),
            end_of_sequence: seg.is_none(),
        }
    }

    /// Sector latched on the last tick.
    pub fn current_view(&self) -> Option<usize> {
        self.resolver.latched_view()
    }

    /// Latched sector while playing, the live sector under `camera` otherwise.
    pub fn live_view(&mut self, camera: &dyn Camera) -> usize {
        let playing = self.sync.is_playing();
        self.resolver.visible_view_status(camera, playing)
    }

    /// Active segment.
    pub fn active_segment(&self) -> Option<SegmentId> {
        self.sequencer.active()
    }

    /// Valid-frame blocks of `view`; `None` before frame-rate metadata or without cost data.
    pub fn valid_frame_blocks(&mut self, segment: SegmentId, view: usize) -> Option<Vec<FrameRange>> {
        let fps = self.fps()?;
        self.sequencer.valid_frame_blocks(segment, view, fps)
    }

    /// Best backward jump source of one frame.
    pub fn best_backward_jump(
        &mut self,
        segment: SegmentId,
        view: usize,
        frame: FrameIndex,
    ) -> Option<FrameIndex> {
        let fps = self.fps()?;
        self.sequencer.best_backward_jump(segment, view, frame, fps)
    }

    /// Cut-frame blocks of `view`.
    pub fn cut_blocks(&self, segment: SegmentId, view: usize) -> Vec<CutBlock> {
        self.sequencer.cut_blocks(segment, view)
    }

    /// Loop-arc history of `view`.
    pub fn loop_arcs(&self, segment: SegmentId, view: usize) -> Vec<LoopArc> {
        self.sequencer.loop_arcs(segment, view)
    }

    /// Gate time of a segment on the timeline.
    pub fn gate_time_on_timeline(&self, segment: SegmentId) -> Option<f64> {
        self.sequencer
            .segment(segment)
            .and_then(Segment::gate_time_on_timeline)
    }

    /// Viewport border in equirectangular pixels.
    pub fn viewport_boundary(&mut self, camera: &dyn Camera, dims: VideoDims) -> Vec<Point> {
        self.resolver.viewport_boundary(camera, dims)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/player.rs"]
mod tests;
