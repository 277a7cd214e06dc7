use crate::foundation::error::{GazeloopError, GazeloopResult};

/// A video decoder/player driven as a synchronous command/query object.
///
/// Commands take effect immediately or over later ticks; the engine never blocks on a
/// backend and re-checks its state on the next tick. Times are media seconds.
pub trait PlaybackBackend {
    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback, keeping the position.
    fn pause(&mut self);

    /// Move the playhead.
    fn seek(&mut self, time_sec: f64);

    /// Current playhead position.
    fn current_time(&self) -> f64;

    /// True while the playhead advances.
    fn is_playing(&self) -> bool;

    /// True while paused.
    fn is_paused(&self) -> bool {
        !self.is_playing()
    }

    /// True while a seek is still in flight.
    fn is_seeking(&self) -> bool {
        false
    }

    /// Media frame rate, once metadata is available.
    fn frame_rate(&self) -> Option<f64>;

    /// Media duration, once metadata is available.
    fn duration(&self) -> Option<f64>;

    /// Audio volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f64);

    /// Current audio volume.
    fn volume(&self) -> f64;

    /// Mute or unmute audio.
    fn set_muted(&mut self, muted: bool);

    /// True while audio is muted.
    fn is_muted(&self) -> bool;

    /// Advance internal clocks by `dt` seconds. Externally clocked backends ignore this.
    fn update(&mut self, _dt: f64) {}
}

/// Available backend kinds.
///
/// - `Simulated` is an in-memory clock used by tests and the CLI harness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// [`SimulatedBackend`].
    Simulated,
}

/// Media metadata a backend reports.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BackendSettings {
    /// Frames per second; `None` until metadata loads.
    pub frame_rate: Option<f64>,
    /// Media length in seconds; `None` when unknown.
    pub duration: Option<f64>,
}

impl BackendSettings {
    /// Settings with known metadata.
    pub fn new(frame_rate: f64, duration: f64) -> Self {
        Self {
            frame_rate: Some(frame_rate),
            duration: Some(duration),
        }
    }

    fn validate(&self) -> GazeloopResult<()> {
        if self.frame_rate.is_some_and(|r| !r.is_finite() || r <= 0.0) {
            return Err(GazeloopError::playback("frame rate must be finite and > 0"));
        }
        if self.duration.is_some_and(|d| !d.is_finite() || d < 0.0) {
            return Err(GazeloopError::playback("duration must be finite and >= 0"));
        }
        Ok(())
    }
}

/// Create a playback backend implementation.
pub fn create_backend(
    kind: BackendKind,
    settings: &BackendSettings,
) -> GazeloopResult<Box<dyn PlaybackBackend>> {
    settings.validate()?;
    match kind {
        BackendKind::Simulated => Ok(Box::new(SimulatedBackend::new(*settings))),
    }
}

/// Backend whose playhead advances by exactly `dt` per [`PlaybackBackend::update`] while
/// playing, clamped to `[0, duration]`. Seeks land instantly.
#[derive(Clone, Debug)]
pub struct SimulatedBackend {
    settings: BackendSettings,
    time: f64,
    playing: bool,
    volume: f64,
    muted: bool,
    seeks: u64,
}

impl SimulatedBackend {
    /// Paused backend at time 0.
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            settings,
            time: 0.0,
            playing: false,
            volume: 1.0,
            muted: false,
            seeks: 0,
        }
    }

    /// Number of seeks issued so far.
    pub fn seek_count(&self) -> u64 {
        self.seeks
    }

    fn clamp(&self, t: f64) -> f64 {
        let t = t.max(0.0);
        match self.settings.duration {
            Some(d) => t.min(d),
            None => t,
        }
    }
}

impl PlaybackBackend for SimulatedBackend {
    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, time_sec: f64) {
        self.seeks += 1;
        self.time = self.clamp(time_sec);
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn frame_rate(&self) -> Option<f64> {
        self.settings.frame_rate
    }

    fn duration(&self) -> Option<f64> {
        self.settings.duration
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn update(&mut self, dt: f64) {
        if self.playing && dt > 0.0 {
            self.time = self.clamp(self.time + dt);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/backend.rs"]
mod tests;
