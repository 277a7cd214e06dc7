//! gazeloop is a gaze-dependent playback engine for branching 360° video.
//!
//! A timeline is a list of segments. Plain segments play straight through; gated segments hold
//! playback before a gate time by looping over pre-authored seamless jump points until the
//! viewer looks at (or away from) a set of view sectors, then release.
//!
//! # Tick pipeline
//!
//! [`Player::tick`] runs once per rendered frame:
//!
//! 1. **Resolve**: the camera's viewport center is cast onto the projection sphere and latched
//!    to one of [`EngineConfig::num_views`] azimuthal sectors ([`ViewResolver`]).
//! 2. **Decide**: the active segment's [`PlaybackGate`] consults its [`JumpGraph`] and decides
//!    to advance, loop back, skip forward, pause or blend.
//! 3. **Sync**: [`DualPlayerSync`] executes jumps by parking the idle backend at the landing
//!    time and crossfading, and repairs drift between the two backends.
//! 4. **Sequence**: [`SegmentSequencer`] moves to the next enabled segment once the active one
//!    completes.
//!
//! The crate owns no decoder and reads no content files: backends implement
//! [`PlaybackBackend`] and jump data is handed over as [`CostMatrix`] / [`CutTable`] values.
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded**: one cooperative update pass per tick; the library installs no
//!   `tracing` subscriber.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation {
    pub mod config;
    pub mod core;
    pub mod error;
    pub mod math;
}
mod view {
    pub mod region;
    pub mod resolver;
    pub mod sector;
}
mod jump {
    pub mod arc;
    pub mod cost;
    pub mod cut;
    pub mod graph;
}
mod playback {
    pub mod backend;
    pub mod sync;
}
mod gate {
    pub mod gate;
    pub mod segment;
}
mod sequence {
    pub mod sequencer;
}
mod session {
    pub mod player;
}

pub use foundation::config::{EagerSkipAudioPolicy, EngineConfig};
pub use foundation::core::{FrameIndex, FrameRange, Fps, Point, Rect, VideoDims};
pub use foundation::error::{GazeloopError, GazeloopResult};
pub use foundation::math::{
    LonLat, Vec3, angular_distance, direction_to_lonlat, lonlat_to_pixel, pixel_to_lonlat,
};
pub use gate::gate::{GateDecision, GateState, JumpKind, PlaybackGate};
pub use gate::segment::{
    GateCondition, GatePolarity, GatedSegment, Segment, SegmentFlags, SegmentId, SegmentKind,
    Thresholds,
};
pub use jump::arc::{LoopArc, LoopArcHistory};
pub use jump::cost::CostMatrix;
pub use jump::cut::{CutBlock, CutEdge, CutTable};
pub use jump::graph::{
    BestJumpKey, JumpGraph, ViewGraph, build_best_backward_jump, derive_valid_frame_blocks,
};
pub use playback::backend::{
    BackendKind, BackendSettings, PlaybackBackend, SimulatedBackend, create_backend,
};
pub use playback::sync::{AudioMix, DualPlayerSync, TransitionState};
pub use sequence::sequencer::{SegmentSequencer, TickReport};
pub use session::player::{Player, PlayerStatus};
pub use view::region::TargetRegion;
pub use view::resolver::{
    Camera, PinholeCamera, Ray, Sphere, ViewResolver, boundary_viewport_points,
};
pub use view::sector::{ViewSector, ViewSectors};
