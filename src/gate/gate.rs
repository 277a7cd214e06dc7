use crate::{
    foundation::{
        config::{EagerSkipAudioPolicy, EngineConfig},
        core::{FrameIndex, Fps},
    },
    gate::segment::{GatedSegment, Segment, SegmentFlags, SegmentKind},
    jump::arc::LoopArc,
    playback::sync::DualPlayerSync,
};

/// Playback state of the active segment as seen by its gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Playing forward with no gate in the way.
    #[default]
    Playing,
    /// Gate condition unmet; looping on cut edges while waiting for gaze.
    HoldingAtGate,
    /// A seamless jump is being crossfaded.
    TransitioningJump,
    /// Paused on a cut edge that targets its own frame.
    Paused,
}

/// Why a jump was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpKind {
    /// Reached a cut frame while the gate is unmet.
    HoldLoop,
    /// Overshot the last cut frame; jumped as if positioned on it.
    Recovery,
    /// Condition already met; skipped ahead to just before the gate.
    EagerSkip,
}

/// Outcome of one gate tick.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Keep playing forward.
    Advance,
    /// A seamless jump was requested.
    Jump {
        /// Segment-relative source frame.
        from: FrameIndex,
        /// Segment-relative target frame.
        to: FrameIndex,
        /// Reason for the jump.
        kind: JumpKind,
    },
    /// A transition was in flight and its crossfade advanced.
    Blend {
        /// Main backend weight after this tick.
        blend: f64,
        /// True when the transition finalized this tick.
        finished: bool,
    },
    /// Playback paused on a self-targeting cut edge.
    Pause,
    /// The gate frame was skipped; logged, not corrected.
    DroppedFrame,
    /// Nothing to decide until the backend reports its frame rate.
    AwaitingMetadata,
}

/// Per-tick inputs shared by the gate's decision helpers.
#[derive(Clone, Copy, Debug)]
struct TickCtx {
    start: f64,
    end: f64,
    flags: SegmentFlags,
    fps: Fps,
    frame: FrameIndex,
    view: usize,
    target: bool,
}

impl TickCtx {
    fn arc_to(&self, to: FrameIndex) -> LoopArc {
        LoopArc::new(
            self.start + self.fps.frame_to_secs(self.frame),
            self.start + self.fps.frame_to_secs(to),
            self.start,
            self.end,
        )
    }
}

/// Per-segment gate state machine, driven once per tick by the sequencer.
#[derive(Clone, Debug)]
pub struct PlaybackGate {
    state: GateState,
    gate_satisfied: bool,
    last_view: Option<usize>,
    expected_current: FrameIndex,
    expected_next: FrameIndex,
    dropped_frames: u64,
}

impl Default for PlaybackGate {
    fn default() -> Self {
        Self {
            state: GateState::Playing,
            gate_satisfied: false,
            last_view: None,
            expected_current: FrameIndex(0),
            expected_next: FrameIndex(1),
            dropped_frames: 0,
        }
    }
}

impl PlaybackGate {
    /// Current state.
    pub fn state(&self) -> GateState {
        self.state
    }

    /// True once the condition held during this segment activation.
    pub fn gate_satisfied(&self) -> bool {
        self.gate_satisfied
    }

    /// Skipped gate frames observed so far.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    /// Predicted `(current, next)` frame.
    pub fn prediction(&self) -> (FrameIndex, FrameIndex) {
        (self.expected_current, self.expected_next)
    }

    /// Forget the latch, the last view and frame predictions (segment activation or seek).
    pub fn reset(&mut self) {
        let dropped = self.dropped_frames;
        *self = Self {
            dropped_frames: dropped,
            ..Self::default()
        };
    }

    fn predict(&mut self, current: FrameIndex, next: FrameIndex) {
        self.expected_current = current;
        self.expected_next = next;
    }

    /// Run one tick for `segment` with `view` as the tick-stable active sector.
    #[tracing::instrument(skip(self, segment, sync, cfg), fields(segment = %segment.name))]
    pub fn tick(
        &mut self,
        segment: &mut Segment,
        sync: &mut DualPlayerSync,
        view: usize,
        cfg: &EngineConfig,
    ) -> GateDecision {
        let Some(fps) = sync.frame_rate().and_then(|r| Fps::from_rate(r).ok()) else {
            return GateDecision::AwaitingMetadata;
        };
        let start = segment.start_sec;
        let end = segment.end_sec;
        let flags = segment.flags;
        let frame = fps.secs_to_frame(sync.current_time() - start);

        let gated = match &mut segment.kind {
            SegmentKind::Plain => return self.tick_plain(sync, frame),
            SegmentKind::Gated(g) => g.as_mut(),
        };
        let target = gated.condition.is_satisfied_by(view);

        if self.last_view != Some(view) {
            if sync.is_transitioning()
                && sync.state().current_arc.is_some_and(|a| a.is_forward())
            {
                tracing::debug!(
                    previous = ?self.last_view,
                    view,
                    "view changed during forward jump"
                );
                sync.finish_transition();
            }
            if self.state == GateState::Paused && sync.play_requested() {
                tracing::debug!(view, "view changed while paused on a self jump, resuming");
                sync.resume();
                self.state = GateState::Playing;
            }
            self.last_view = Some(view);
        }

        if !self.gate_satisfied && target {
            self.gate_satisfied = true;
            tracing::info!(view, frame = frame.0, "gate condition satisfied");
            if sync.is_transitioning() {
                sync.finish_transition();
            }
            if self.state == GateState::Paused {
                sync.resume();
                self.state = GateState::Playing;
            }
        }

        if sync.is_transitioning() && !target && gated.graph.is_cut_frame(view, frame) {
            tracing::debug!(view, frame = frame.0, "entered another cut frame mid-transition");
            sync.finish_transition();
        }

        // A finalized transition may have handed the playhead to the other backend.
        let frame = fps.secs_to_frame(sync.current_time() - start);

        if sync.is_transitioning() {
            let finished = sync.tick_blend();
            self.predict(frame, frame.forward(1));
            self.state = if finished {
                self.resting_state(gated)
            } else {
                GateState::TransitioningJump
            };
            return GateDecision::Blend {
                blend: sync.state().blend,
                finished,
            };
        }

        let ctx = TickCtx {
            start,
            end,
            flags,
            fps,
            frame,
            view,
            target,
        };
        self.transition(gated, ctx, sync, cfg)
    }

    fn tick_plain(&mut self, sync: &mut DualPlayerSync, frame: FrameIndex) -> GateDecision {
        self.predict(frame, frame.forward(1));
        if sync.is_transitioning() {
            let finished = sync.tick_blend();
            return GateDecision::Blend {
                blend: sync.state().blend,
                finished,
            };
        }
        self.state = GateState::Playing;
        GateDecision::Advance
    }

    fn resting_state(&self, gated: &GatedSegment) -> GateState {
        if self.gate_satisfied || gated.gate_time_sec.is_none() {
            GateState::Playing
        } else {
            GateState::HoldingAtGate
        }
    }

    fn transition(
        &mut self,
        gated: &mut GatedSegment,
        ctx: TickCtx,
        sync: &mut DualPlayerSync,
        cfg: &EngineConfig,
    ) -> GateDecision {
        let frame = ctx.frame;
        let view = ctx.view;
        let Some(gate_time) = gated.gate_time_sec else {
            self.predict(frame, frame.forward(1));
            self.state = GateState::Playing;
            return GateDecision::Advance;
        };
        let gate_frame = ctx.fps.secs_to_frame(gate_time);

        let at_gate = self.expected_current == gate_frame || self.expected_next == gate_frame;
        let at_cut = !self.gate_satisfied && gated.graph.is_cut_frame(view, self.expected_next);
        if !ctx.target
            && (at_gate || at_cut)
            && frame != self.expected_current
            && frame != self.expected_next
        {
            self.dropped_frames += 1;
            tracing::error!(
                frame = frame.0,
                gate_frame = gate_frame.0,
                expected_current = self.expected_current.0,
                expected_next = self.expected_next.0,
                cut = at_cut,
                "skipped a gate or cut frame"
            );
            // Resynchronize the prediction only; playback itself is left alone.
            self.predict(frame, frame.forward(1));
            return GateDecision::DroppedFrame;
        }

        if frame > gate_frame || ctx.target || self.gate_satisfied {
            self.predict(frame, frame.forward(1));
            self.state = GateState::Playing;
            if ctx.target
                && let Some(decision) = self.eager_skip(gated, ctx, gate_frame, sync, cfg)
            {
                return decision;
            }
            return GateDecision::Advance;
        }

        self.state = GateState::HoldingAtGate;
        let graph = &gated.graph;
        let (jump_to, kind) = if graph.reached_cut_frame(view, frame) {
            (graph.find_jump_to(view, frame), JumpKind::HoldLoop)
        } else if graph.past_last_cut_frame(view, frame) {
            let last = graph.last_cut_frame(view);
            tracing::warn!(
                view,
                frame = frame.0,
                last_cut = last.map(|f| f.0),
                "past the last cut frame, recovering"
            );
            (
                last.and_then(|l| graph.find_jump_to(view, l)),
                JumpKind::Recovery,
            )
        } else {
            (None, JumpKind::HoldLoop)
        };
        let Some(to) = jump_to else {
            self.predict(frame, frame.forward(1));
            return GateDecision::Advance;
        };
        self.predict(frame, to);

        if to == frame {
            tracing::info!(frame = frame.0, "cut edge targets its own frame, pausing");
            sync.hold();
            self.state = GateState::Paused;
            return GateDecision::Pause;
        }
        if to == frame.forward(1) {
            return GateDecision::Advance;
        }

        let arc = ctx.arc_to(to);
        let arc = gated.graph.record_jump(view, arc).unwrap_or(arc);
        tracing::debug!(view, from = frame.0, to = to.0, ?kind, "jump");
        sync.request_jump(arc, false);
        self.predict(to, to.forward(1));
        self.state = GateState::TransitioningJump;
        GateDecision::Jump {
            from: frame,
            to,
            kind,
        }
    }

    fn eager_skip(
        &mut self,
        gated: &mut GatedSegment,
        ctx: TickCtx,
        gate_frame: FrameIndex,
        sync: &mut DualPlayerSync,
        cfg: &EngineConfig,
    ) -> Option<GateDecision> {
        if !ctx.flags.eager_skip {
            return None;
        }
        let force_crossfade = match cfg.eager_skip_audio {
            EagerSkipAudioPolicy::Crossfade => true,
            EagerSkipAudioPolicy::HardSwitch => false,
            EagerSkipAudioPolicy::Suppress if !ctx.flags.cross_fade_audio => return None,
            EagerSkipAudioPolicy::Suppress => false,
        };
        let trans_frames = ctx.fps.secs_to_frames_round(cfg.transition_duration_sec);
        let jump_to = FrameIndex(gate_frame.0.checked_sub(trans_frames)?);
        if ctx.frame >= jump_to
            || !gated.graph.can_jump_to(
                ctx.view,
                ctx.frame,
                jump_to,
                gated.thresholds.jump_threshold,
            )
        {
            return None;
        }
        let arc = ctx.arc_to(jump_to);
        let arc = gated.graph.record_jump(ctx.view, arc).unwrap_or(arc);
        tracing::info!(
            view = ctx.view,
            from = ctx.frame.0,
            to = jump_to.0,
            "eager skip toward gate"
        );
        sync.request_jump(arc, force_crossfade);
        self.predict(jump_to, jump_to.forward(1));
        self.state = GateState::TransitioningJump;
        Some(GateDecision::Jump {
            from: ctx.frame,
            to: jump_to,
            kind: JumpKind::EagerSkip,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gate/gate.rs"]
mod tests;
