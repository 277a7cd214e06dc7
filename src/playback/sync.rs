use crate::{
    foundation::{
        error::{GazeloopError, GazeloopResult},
        math::approx_eq,
    },
    jump::arc::LoopArc,
    playback::backend::PlaybackBackend,
};

const MAIN: usize = 0;
const SIDE: usize = 1;

/// Crossfade bookkeeping shared by the two backends.
///
/// `blend` is the weight of the main backend: 1 shows main only, 0 shows side only.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TransitionState {
    /// Index of the main backend.
    pub main_index: usize,
    /// Index of the side backend.
    pub side_index: usize,
    /// Index of the authoritative backend, always main or side.
    pub return_index: usize,
    /// Render mix weight of the main backend, in `[0, 1]`.
    pub blend: f64,
    /// Required `return time - other time` while a jump is in flight.
    pub media_offset: f64,
    /// True while two backends are being crossfaded.
    pub is_transitioning: bool,
    /// The jump being crossfaded.
    pub current_arc: Option<LoopArc>,
    /// Blend endpoint the in-flight transition started from.
    pub start_blend: f64,
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            main_index: MAIN,
            side_index: SIDE,
            return_index: MAIN,
            blend: 1.0,
            media_offset: 0.0,
            is_transitioning: false,
            current_arc: None,
            start_blend: 1.0,
        }
    }
}

impl TransitionState {
    fn endpoint_of(&self, index: usize) -> f64 {
        if index == self.main_index { 1.0 } else { 0.0 }
    }
}

/// Per-backend audio levels derived from the blend and segment audio flags.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct AudioMix {
    /// Main backend volume.
    pub main_volume: f64,
    /// Side backend volume.
    pub side_volume: f64,
    /// Main backend mute flag.
    pub main_muted: bool,
    /// Side backend mute flag.
    pub side_muted: bool,
}

impl AudioMix {
    /// Levels for `blend`.
    ///
    /// Crossfading splits the volume like the picture; otherwise only the backend with the
    /// larger weight (main at exactly 0.5) is audible. `mute` silences both.
    pub fn resolve(blend: f64, crossfade: bool, mute: bool) -> Self {
        if mute {
            return Self {
                main_volume: 0.0,
                side_volume: 0.0,
                main_muted: true,
                side_muted: true,
            };
        }
        if crossfade {
            return Self {
                main_volume: blend,
                side_volume: 1.0 - blend,
                main_muted: false,
                side_muted: false,
            };
        }
        let main_audible = blend >= 0.5;
        Self {
            main_volume: if main_audible { 1.0 } else { 0.0 },
            side_volume: if main_audible { 0.0 } else { 1.0 },
            main_muted: !main_audible,
            side_muted: main_audible,
        }
    }
}

/// Owns both backends and keeps them in lockstep: jumps, crossfades and desync recovery.
pub struct DualPlayerSync {
    backends: [Box<dyn PlaybackBackend>; 2],
    state: TransitionState,
    transition_duration: f64,
    play_requested: bool,
    audio_crossfade: bool,
    audio_muted: bool,
    force_audio_crossfade: bool,
    desync_recoveries: u64,
}

impl std::fmt::Debug for DualPlayerSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DualPlayerSync")
            .field("state", &self.state)
            .field("play_requested", &self.play_requested)
            .field("desync_recoveries", &self.desync_recoveries)
            .finish_non_exhaustive()
    }
}

impl DualPlayerSync {
    /// Pair two backends; `main` starts authoritative.
    pub fn new(
        main: Box<dyn PlaybackBackend>,
        side: Box<dyn PlaybackBackend>,
        transition_duration: f64,
    ) -> GazeloopResult<Self> {
        if !transition_duration.is_finite() || transition_duration <= 0.0 {
            return Err(GazeloopError::playback(
                "transition duration must be finite and > 0",
            ));
        }
        Ok(Self {
            backends: [main, side],
            state: TransitionState::default(),
            transition_duration,
            play_requested: false,
            audio_crossfade: true,
            audio_muted: false,
            force_audio_crossfade: false,
            desync_recoveries: 0,
        })
    }

    /// Crossfade bookkeeping.
    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    /// Read access to a backend (0 = main, 1 = side).
    pub fn backend(&self, index: usize) -> Option<&dyn PlaybackBackend> {
        self.backends.get(index).map(|b| b.as_ref())
    }

    /// True while a jump is being crossfaded.
    pub fn is_transitioning(&self) -> bool {
        self.state.is_transitioning
    }

    /// True when the user asked for playback.
    pub fn play_requested(&self) -> bool {
        self.play_requested
    }

    /// Desync recoveries performed by the watchdog so far.
    pub fn desync_recoveries(&self) -> u64 {
        self.desync_recoveries
    }

    fn other_index(&self) -> usize {
        if self.state.return_index == MAIN { SIDE } else { MAIN }
    }

    fn authority(&self) -> &dyn PlaybackBackend {
        self.backends[self.state.return_index].as_ref()
    }

    /// Time of the authoritative backend.
    pub fn return_time(&self) -> f64 {
        self.authority().current_time()
    }

    /// Reported playhead: the landing backend while a jump is in flight, the authoritative
    /// backend otherwise.
    pub fn current_time(&self) -> f64 {
        if self.state.is_transitioning {
            self.backends[self.other_index()].current_time()
        } else {
            self.return_time()
        }
    }

    /// Media frame rate reported by the authoritative backend.
    pub fn frame_rate(&self) -> Option<f64> {
        self.authority().frame_rate().filter(|r| *r > 0.0)
    }

    /// Seconds per frame, once the frame rate is known.
    pub fn frame_duration(&self) -> Option<f64> {
        self.frame_rate().map(|r| 1.0 / r)
    }

    /// Media duration reported by the authoritative backend.
    pub fn media_duration(&self) -> Option<f64> {
        self.authority().duration()
    }

    /// True when either backend is paused.
    pub fn is_paused(&self) -> bool {
        self.backends.iter().any(|b| b.is_paused())
    }

    /// True when either backend is playing.
    pub fn is_playing(&self) -> bool {
        self.backends.iter().any(|b| b.is_playing())
    }

    /// Advance backend clocks.
    pub fn update_backends(&mut self, dt: f64) {
        for b in &mut self.backends {
            b.update(dt);
        }
    }

    /// Request playback and start both backends.
    pub fn play(&mut self) {
        self.play_requested = true;
        self.resume();
    }

    /// Withdraw the play request and pause both backends.
    pub fn pause(&mut self) {
        self.play_requested = false;
        self.hold();
    }

    /// Pause both backends but keep the play request, so [`DualPlayerSync::resume`] can
    /// continue later.
    pub fn hold(&mut self) {
        for b in &mut self.backends {
            b.pause();
        }
        self.apply_audio();
    }

    /// Restart both backends when playback is requested.
    pub fn resume(&mut self) {
        if self.play_requested {
            for b in &mut self.backends {
                b.play();
            }
        }
        self.apply_audio();
    }

    /// Segment audio flags: crossfade audio with the picture, and mute everything.
    pub fn configure_audio(&mut self, crossfade: bool, mute: bool) {
        self.audio_crossfade = crossfade;
        self.audio_muted = mute;
        self.apply_audio();
    }

    /// Levels currently applied to the backends.
    pub fn audio_mix(&self) -> AudioMix {
        AudioMix::resolve(
            self.state.blend,
            self.audio_crossfade || self.force_audio_crossfade,
            self.audio_muted,
        )
    }

    fn apply_audio(&mut self) {
        let mix = self.audio_mix();
        let (main, side) = (self.state.main_index, self.state.side_index);
        self.backends[main].set_volume(mix.main_volume);
        self.backends[main].set_muted(mix.main_muted);
        self.backends[side].set_volume(mix.side_volume);
        self.backends[side].set_muted(mix.side_muted);
    }

    /// Seek both backends, finalizing any in-flight transition first.
    ///
    /// Negative targets clamp to 0.
    #[tracing::instrument(skip(self))]
    pub fn seek(&mut self, time_sec: f64) {
        if self.state.is_transitioning {
            self.finish_transition();
        }
        let t = time_sec.max(0.0);
        for b in &mut self.backends {
            b.pause();
        }
        let other = self.other_index();
        self.backends[self.state.return_index].seek(t);
        self.backends[other].seek((t - self.state.media_offset).max(0.0));
        self.state.blend = self.state.endpoint_of(self.state.return_index);
        self.resume();
    }

    /// Start a seamless jump along `arc`: the non-authoritative backend is parked at the jump
    /// target and the crossfade begins.
    ///
    /// `force_audio_crossfade` crossfades audio for this transition whatever the segment
    /// audio flags say.
    pub fn request_jump(&mut self, arc: LoopArc, force_audio_crossfade: bool) {
        if self.state.is_transitioning {
            self.finish_transition();
        }
        for b in &mut self.backends {
            b.pause();
        }
        self.state.media_offset = arc.media_offset();
        let other = self.other_index();
        let landing = (self.return_time() - self.state.media_offset).max(0.0);
        self.backends[other].seek(landing);
        self.state.start_blend = self.state.endpoint_of(self.state.return_index);
        self.state.blend = self.state.start_blend;
        self.state.current_arc = Some(arc);
        self.state.is_transitioning = true;
        self.force_audio_crossfade = force_audio_crossfade;
        tracing::debug!(
            from = arc.from_time,
            to = arc.to_time,
            landing,
            offset = self.state.media_offset,
            "jump requested"
        );
        self.resume();
    }

    /// Advance the crossfade for this tick; returns true once the transition is finalized.
    ///
    /// The window is `[to, to + duration)` in landing-backend time, shortened when the media
    /// after the jump source is shorter than the transition.
    pub fn tick_blend(&mut self) -> bool {
        if !self.state.is_transitioning {
            return true;
        }
        let Some(arc) = self.state.current_arc else {
            let landing = self.other_index();
            self.settle(landing);
            return true;
        };
        let window_start = arc.to_time;
        let mut window_end = window_start + self.transition_duration;
        if let Some(media) = self.media_duration()
            && media - arc.from_time < self.transition_duration
        {
            window_end = arc.to_time + (media - arc.from_time).max(0.0);
        }
        if !approx_eq(self.state.media_offset, arc.media_offset()) {
            self.state.media_offset = arc.media_offset();
        }

        let t = self.current_time();
        let frame = self.frame_duration().unwrap_or(0.0);
        if !(t > window_start - frame && t < window_end) {
            let landing = self.other_index();
            self.settle(landing);
            return true;
        }

        let fraction = if window_end > window_start {
            ((t - window_start) / (window_end - window_start)).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.state.blend = if self.state.start_blend == 0.0 {
            fraction
        } else {
            1.0 - fraction
        };
        self.apply_audio();
        false
    }

    /// Force-finalize the in-flight transition: snap the blend to the nearer endpoint, make
    /// the matching backend authoritative and park the other one on it.
    ///
    /// A crossfade that runs out its window on its own always lands on the jump target instead.
    pub fn finish_transition(&mut self) {
        if !self.state.is_transitioning {
            return;
        }
        let nearest = if self.state.blend >= 0.5 {
            self.state.main_index
        } else {
            self.state.side_index
        };
        self.settle(nearest);
    }

    fn settle(&mut self, return_index: usize) {
        if !self.state.is_transitioning {
            return;
        }
        self.state.return_index = return_index;
        self.state.blend = self.state.endpoint_of(return_index);
        self.state.is_transitioning = false;
        self.state.media_offset = 0.0;
        self.state.current_arc = None;
        self.force_audio_crossfade = false;

        let t = self.return_time();
        let other = self.other_index();
        self.backends[other].seek(t);
        if self.play_requested && self.backends[self.state.return_index].is_playing() {
            self.backends[other].play();
        }
        self.apply_audio();
        tracing::debug!(
            return_index = self.state.return_index,
            time = t,
            "transition finished"
        );
    }

    /// Verify the two backends keep the required offset; re-seek the non-authoritative one
    /// when they drift by a frame or more. Returns true when they were in sync.
    ///
    /// Vacuously true until the frame rate is known.
    pub fn watchdog(&mut self) -> bool {
        let Some(frame) = self.frame_duration() else {
            return true;
        };
        let return_time = self.return_time();
        let offset = self.state.media_offset;
        if return_time - offset < 0.0 {
            return true;
        }
        if self.state.is_transitioning
            && self
                .media_duration()
                .is_some_and(|d| approx_eq(return_time, d))
        {
            return true;
        }
        let other = self.other_index();
        let diff = return_time - self.backends[other].current_time();
        let drift = (diff - offset).abs();
        if diff * offset >= 0.0 && drift < frame {
            return true;
        }

        for b in &mut self.backends {
            b.pause();
        }
        self.backends[other].seek(return_time - offset);
        self.desync_recoveries += 1;
        tracing::warn!(
            return_time,
            offset,
            drift,
            recoveries = self.desync_recoveries,
            "backend desync, re-seeking"
        );
        self.resume();
        false
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/sync.rs"]
mod tests;
