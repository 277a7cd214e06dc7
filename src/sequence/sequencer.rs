use crate::{
    foundation::{
        config::EngineConfig,
        core::{FrameIndex, FrameRange, Fps, VideoDims},
        error::{GazeloopError, GazeloopResult},
    },
    gate::{
        gate::{GateDecision, PlaybackGate},
        segment::{GateCondition, GatePolarity, Segment, SegmentId, Thresholds},
    },
    jump::{arc::LoopArc, cut::CutBlock},
    playback::sync::DualPlayerSync,
    view::{region::TargetRegion, resolver::ViewResolver},
};

/// What happened during one sequencer tick.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct TickReport {
    /// Segment active when the tick started.
    pub segment: Option<SegmentId>,
    /// Gate outcome for that segment.
    pub decision: Option<GateDecision>,
    /// Watchdog verdict; false when a desync was recovered this tick.
    pub in_sync: bool,
    /// Segment that completed this tick.
    pub completed: Option<SegmentId>,
    /// Segment that became active this tick.
    pub activated: Option<SegmentId>,
    /// Playback was found far before the active segment and re-seeked.
    pub stale_reseek: bool,
    /// No segment remains.
    pub end_of_sequence: bool,
}

/// Ordered segment arena plus the active segment's gate.
#[derive(Clone, Debug)]
pub struct SegmentSequencer {
    cfg: EngineConfig,
    segments: Vec<Segment>,
    active: Option<SegmentId>,
    gate: PlaybackGate,
}

impl SegmentSequencer {
    /// Validate `segments`, order them by timeline position and activate the first enabled one.
    pub fn new(mut segments: Vec<Segment>, cfg: &EngineConfig) -> GazeloopResult<Self> {
        for s in &segments {
            s.validate()?;
            if let Some(g) = s.gated() {
                let views = g.graph.num_views();
                if views != 0 && views != cfg.num_views {
                    return Err(GazeloopError::validation(format!(
                        "segment '{}': jump graph has {views} views, expected {}",
                        s.name, cfg.num_views
                    )));
                }
            }
        }
        segments.sort_by(|a, b| a.timeline_pos.total_cmp(&b.timeline_pos));
        for (i, s) in segments.iter_mut().enumerate() {
            s.id = SegmentId(i);
        }
        let active = segments.iter().find(|s| s.enabled).map(|s| s.id);
        Ok(Self {
            cfg: cfg.clone(),
            segments,
            active,
            gate: PlaybackGate::default(),
        })
    }

    /// Segments in timeline order; `SegmentId(i)` is at index `i`.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// One segment.
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    fn segment_mut(&mut self, id: SegmentId) -> GazeloopResult<&mut Segment> {
        self.segments
            .get_mut(id.0)
            .ok_or_else(|| GazeloopError::validation(format!("unknown segment {}", id.0)))
    }

    /// Active segment id, `None` at end of sequence.
    pub fn active(&self) -> Option<SegmentId> {
        self.active
    }

    /// Active segment.
    pub fn active_segment(&self) -> Option<&Segment> {
        self.active.and_then(|id| self.segment(id))
    }

    /// Gate of the active segment.
    pub fn gate(&self) -> &PlaybackGate {
        &self.gate
    }

    /// Park both backends at the start of the active segment and apply its audio flags.
    pub fn start(&mut self, sync: &mut DualPlayerSync) {
        let Some(seg) = self.active_segment() else {
            return;
        };
        let start = seg.start_sec;
        self.gate.reset();
        self.configure_audio(sync);
        sync.seek(start);
    }

    fn configure_audio(&self, sync: &mut DualPlayerSync) {
        if let Some(seg) = self.active_segment() {
            sync.configure_audio(seg.flags.cross_fade_audio, seg.flags.mute_audio);
        }
    }

    /// Run one tick: stale guard, gate decision, sync watchdog, then completion.
    #[tracing::instrument(skip(self, sync))]
    pub fn tick(&mut self, sync: &mut DualPlayerSync, view: usize) -> TickReport {
        let mut report = TickReport {
            segment: self.active,
            in_sync: true,
            ..TickReport::default()
        };
        let Some(id) = self.active else {
            report.end_of_sequence = true;
            return report;
        };

        let seg_start = self.segments[id.0].start_sec;
        let t = sync.current_time();
        if t < seg_start - self.cfg.stale_position_guard_sec {
            tracing::info!(
                time = t,
                segment_start = seg_start,
                "playhead far before active segment, re-seeking"
            );
            self.gate.reset();
            sync.seek(seg_start);
            report.stale_reseek = true;
            return report;
        }

        let seg = &mut self.segments[id.0];
        report.decision = Some(self.gate.tick(seg, sync, view, &self.cfg));
        report.in_sync = sync.watchdog();

        let end = seg.end_sec;
        let t = sync.current_time();
        let half_frame = sync.frame_duration().map_or(0.0, |f| f / 2.0);
        if t + half_frame >= end {
            report.completed = Some(id);
            report.activated = self.advance(sync, id);
            report.end_of_sequence = self.active.is_none();
        }
        report
    }

    fn advance(&mut self, sync: &mut DualPlayerSync, finished: SegmentId) -> Option<SegmentId> {
        if sync.is_transitioning() {
            sync.finish_transition();
        }
        self.gate.reset();
        let prev_end = self.segments[finished.0].end_sec;
        let next = self.segments[finished.0 + 1..]
            .iter()
            .find(|s| s.enabled)
            .map(|s| s.id);
        self.active = next;

        let Some(next) = next else {
            tracing::info!(segment = finished.0, "end of sequence");
            sync.pause();
            return None;
        };
        let next_start = self.segments[next.0].start_sec;
        tracing::info!(from = finished.0, to = next.0, "segment completed");
        self.configure_audio(sync);
        if (next_start - prev_end).abs() > self.cfg.segment_reseek_gap_sec {
            tracing::info!(media_time = next_start, "seeking to non-contiguous segment");
            sync.seek(next_start);
        }
        Some(next)
    }

    /// Segment whose timeline span contains `timeline_t`.
    ///
    /// Every segment but the last owns `[pos, next pos)`; the last owns `[pos, pos + duration)`.
    pub fn segment_at_timeline(&self, timeline_t: f64) -> Option<SegmentId> {
        let n = self.segments.len();
        for (i, pair) in self.segments.windows(2).enumerate() {
            if timeline_t >= pair[0].timeline_pos && timeline_t < pair[1].timeline_pos {
                return Some(SegmentId(i));
            }
        }
        let last = self.segments.last()?;
        (timeline_t >= last.timeline_pos && timeline_t < last.timeline_end())
            .then_some(SegmentId(n - 1))
    }

    /// Seek to a timeline time, activating the containing segment.
    #[tracing::instrument(skip(self, sync))]
    pub fn seek(&mut self, sync: &mut DualPlayerSync, timeline_t: f64) -> GazeloopResult<SegmentId> {
        let id = self.segment_at_timeline(timeline_t).ok_or_else(|| {
            GazeloopError::playback(format!("seek time {timeline_t} is outside the timeline"))
        })?;
        let media_t = self.segments[id.0].media_time_at(timeline_t);
        self.active = Some(id);
        self.gate.reset();
        self.configure_audio(sync);
        tracing::info!(segment = id.0, media_time = media_t, "seek");
        sync.seek(media_t);
        Ok(id)
    }

    /// Timeline time of the playhead.
    pub fn timeline_time(&self, sync: &DualPlayerSync) -> Option<f64> {
        self.active_segment()
            .map(|s| s.timeline_time_at(sync.current_time()))
    }

    /// Replace the gate condition of a gated segment.
    pub fn set_gate_condition(&mut self, id: SegmentId, condition: GateCondition) -> GazeloopResult<()> {
        let seg = self.segment_mut(id)?;
        let name = seg.name.clone();
        let gated = seg.gated_mut().ok_or_else(|| {
            GazeloopError::validation(format!("segment '{name}' has no gate"))
        })?;
        gated.condition = condition;
        if self.active == Some(id) {
            self.gate.reset();
        }
        Ok(())
    }

    /// Derive the gate condition of a gated segment from an equirectangular region.
    ///
    /// The unset placeholder region is ignored: the current condition stays and no views are
    /// returned.
    pub fn set_gate_region(
        &mut self,
        id: SegmentId,
        region: TargetRegion,
        dims: VideoDims,
        polarity: GatePolarity,
        resolver: &ViewResolver,
    ) -> GazeloopResult<Vec<usize>> {
        if region.is_placeholder() {
            tracing::debug!(segment = id.0, "ignoring placeholder gate region");
            return Ok(Vec::new());
        }
        let views = resolver.views_containing_region(&region, dims)?;
        self.set_gate_condition(id, GateCondition::new(views.iter().copied(), polarity))?;
        if let Some(g) = self.segment_mut(id)?.gated_mut() {
            g.region = Some(region);
        }
        Ok(views)
    }

    /// Replace the jump tuning of a gated segment.
    pub fn set_thresholds(&mut self, id: SegmentId, thresholds: Thresholds) -> GazeloopResult<()> {
        let seg = self.segment_mut(id)?;
        let name = seg.name.clone();
        let gated = seg.gated_mut().ok_or_else(|| {
            GazeloopError::validation(format!("segment '{name}' has no gate"))
        })?;
        let previous = std::mem::replace(&mut gated.thresholds, thresholds);
        if let Err(e) = seg.validate() {
            if let Some(g) = seg.gated_mut() {
                g.thresholds = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Valid-frame blocks of `view` under the segment's thresholds; `None` without cost data.
    pub fn valid_frame_blocks(
        &mut self,
        id: SegmentId,
        view: usize,
        fps: Fps,
    ) -> Option<Vec<FrameRange>> {
        let g = self.segments.get_mut(id.0)?.gated_mut()?;
        let t = g.thresholds;
        g.graph
            .valid_frame_blocks(view, t.perceptual_threshold, t.min_loop_frames(fps))
    }

    /// Best backward jump source for one frame, `None` without data or qualifying source.
    pub fn best_backward_jump(
        &mut self,
        id: SegmentId,
        view: usize,
        frame: FrameIndex,
        fps: Fps,
    ) -> Option<FrameIndex> {
        let g = self.segments.get_mut(id.0)?.gated_mut()?;
        let t = g.thresholds;
        let table = g
            .graph
            .view_mut(view)?
            .best_backward_jump(t.perceptual_threshold, t.min_loop_frames(fps))?;
        table.get(usize::try_from(frame.0).ok()?).copied().flatten()
    }

    /// Cut-frame blocks of `view`.
    pub fn cut_blocks(&self, id: SegmentId, view: usize) -> Vec<CutBlock> {
        self.segment(id)
            .and_then(Segment::gated)
            .map(|g| g.graph.cut_blocks(view))
            .unwrap_or_default()
    }

    /// Loop-arc history of `view`, ordered by source time.
    pub fn loop_arcs(&self, id: SegmentId, view: usize) -> Vec<LoopArc> {
        self.segment(id)
            .and_then(Segment::gated)
            .map(|g| g.graph.loop_arcs(view))
            .unwrap_or_default()
    }

    /// Seed every gated segment's arc history with its authored cut edges.
    pub fn populate_backward_arcs(&mut self, fps: Fps) {
        for seg in &mut self.segments {
            let (start, end) = (seg.start_sec, seg.end_sec);
            if let Some(g) = seg.gated_mut() {
                g.graph.populate_backward_arcs(start, end, fps);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/sequencer.rs"]
mod tests;
