use super::*;
use crate::{
    gate::segment::{GateCondition, GatePolarity},
    jump::{
        cost::CostMatrix,
        cut::{CutEdge, CutTable},
        graph::JumpGraph,
    },
    playback::backend::{BackendSettings, SimulatedBackend},
};

const FPS: f64 = 30.0;
const DT: f64 = 1.0 / FPS;

fn at(frame: u64) -> f64 {
    frame as f64 / FPS
}

fn sync_with(settings: BackendSettings) -> DualPlayerSync {
    DualPlayerSync::new(
        Box::new(SimulatedBackend::new(settings)),
        Box::new(SimulatedBackend::new(settings)),
        0.5,
    )
    .unwrap()
}

fn playing_sync(frame: u64) -> DualPlayerSync {
    let mut sync = sync_with(BackendSettings::new(FPS, 10.0));
    sync.seek(at(frame));
    sync.play();
    sync
}

/// Every view but 3 loops 170 -> 110; `extra` overrides individual views.
fn hold_graph(extra: &[(usize, Vec<CutEdge>)]) -> JumpGraph {
    let tables = (0..40)
        .map(|v| {
            if let Some((_, edges)) = extra.iter().find(|(view, _)| *view == v) {
                CutTable::new(edges.clone()).unwrap()
            } else if v == 3 {
                CutTable::default()
            } else {
                CutTable::new(vec![CutEdge::new(170, 110)]).unwrap()
            }
        })
        .collect();
    JumpGraph::from_cut_tables(tables)
}

fn gated_segment(graph: JumpGraph) -> Segment {
    let gate = GatedSegment::new(Some(6.0), GateCondition::new([3], GatePolarity::LookAt))
        .with_graph(graph);
    Segment::new_gated("hold", 0.0, 10.0, 0.0, gate)
}

#[test]
fn waits_for_frame_rate_metadata() {
    let mut sync = sync_with(BackendSettings::default());
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    let d = gate.tick(&mut seg, &mut sync, 0, &EngineConfig::default());
    assert_eq!(d, GateDecision::AwaitingMetadata);
}

#[test]
fn plain_segments_always_advance() {
    let mut sync = playing_sync(10);
    let mut seg = Segment::new_plain("p", 0.0, 10.0, 0.0);
    let mut gate = PlaybackGate::default();
    let d = gate.tick(&mut seg, &mut sync, 0, &EngineConfig::default());
    assert_eq!(d, GateDecision::Advance);
    assert_eq!(gate.state(), GateState::Playing);
}

#[test]
fn advances_toward_the_cut_while_holding() {
    let mut sync = playing_sync(100);
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    let d = gate.tick(&mut seg, &mut sync, 0, &EngineConfig::default());
    assert_eq!(d, GateDecision::Advance);
    assert_eq!(gate.state(), GateState::HoldingAtGate);
    assert_eq!(gate.prediction(), (FrameIndex(100), FrameIndex(101)));
}

#[test]
fn cut_frame_triggers_hold_loop() {
    let mut sync = playing_sync(170);
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    let d = gate.tick(&mut seg, &mut sync, 0, &EngineConfig::default());
    assert_eq!(
        d,
        GateDecision::Jump {
            from: FrameIndex(170),
            to: FrameIndex(110),
            kind: JumpKind::HoldLoop,
        }
    );
    assert_eq!(gate.state(), GateState::TransitioningJump);
    assert!(sync.is_transitioning());
    assert!((sync.current_time() - at(110)).abs() < 1e-9);
    let arcs = seg.gated().unwrap().graph.loop_arcs(0);
    assert_eq!(arcs.len(), 1);
    assert!((arcs[0].to_time - at(110)).abs() < 1e-9);
}

#[test]
fn overshooting_last_cut_recovers_from_it() {
    let mut sync = playing_sync(175);
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    let d = gate.tick(&mut seg, &mut sync, 0, &EngineConfig::default());
    assert_eq!(
        d,
        GateDecision::Jump {
            from: FrameIndex(175),
            to: FrameIndex(110),
            kind: JumpKind::Recovery,
        }
    );
    assert!((sync.current_time() - at(110)).abs() < 1e-9);
}

#[test]
fn satisfied_gate_latches_for_the_activation() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(100);
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    assert_eq!(gate.tick(&mut seg, &mut sync, 3, &cfg), GateDecision::Advance);
    assert!(gate.gate_satisfied());
    assert_eq!(gate.state(), GateState::Playing);

    sync.seek(at(170));
    assert_eq!(gate.tick(&mut seg, &mut sync, 0, &cfg), GateDecision::Advance);

    gate.reset();
    assert!(!gate.gate_satisfied());
    assert!(matches!(
        gate.tick(&mut seg, &mut sync, 0, &cfg),
        GateDecision::Jump { .. }
    ));
}

#[test]
fn target_coming_into_view_finalizes_hold_loop() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(170);
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    gate.tick(&mut seg, &mut sync, 0, &cfg);
    assert!(sync.is_transitioning());

    sync.update_backends(DT);
    let d = gate.tick(&mut seg, &mut sync, 3, &cfg);
    assert!(!sync.is_transitioning());
    assert_eq!(d, GateDecision::Advance);
    assert_eq!(gate.state(), GateState::Playing);
}

#[test]
fn past_gate_frame_plays_through() {
    let mut sync = playing_sync(185);
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    let d = gate.tick(&mut seg, &mut sync, 0, &EngineConfig::default());
    assert_eq!(d, GateDecision::Advance);
}

#[test]
fn blend_ticks_until_transition_finishes() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(170);
    let mut seg = gated_segment(hold_graph(&[]));
    let mut gate = PlaybackGate::default();
    gate.tick(&mut seg, &mut sync, 0, &cfg);

    let mut finished = false;
    for _ in 0..30 {
        sync.update_backends(DT);
        match gate.tick(&mut seg, &mut sync, 0, &cfg) {
            GateDecision::Blend { finished: true, .. } => {
                finished = true;
                break;
            }
            GateDecision::Blend { .. } => {}
            other => panic!("unexpected decision {other:?}"),
        }
    }
    assert!(finished);
    assert_eq!(gate.state(), GateState::HoldingAtGate);
    assert!(sync.current_time() < at(130));
}

#[test]
fn self_targeting_cut_pauses_until_view_changes() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(150);
    let mut seg = gated_segment(hold_graph(&[(5, vec![CutEdge::new(150, 150)])]));
    let mut gate = PlaybackGate::default();
    assert_eq!(gate.tick(&mut seg, &mut sync, 5, &cfg), GateDecision::Pause);
    assert_eq!(gate.state(), GateState::Paused);
    assert!(!sync.is_playing());
    assert!(sync.play_requested());

    assert_eq!(gate.tick(&mut seg, &mut sync, 6, &cfg), GateDecision::Advance);
    assert!(sync.is_playing());
}

#[test]
fn skipped_gate_frame_is_reported_not_corrected() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(179);
    let mut seg = gated_segment(hold_graph(&[(1, vec![CutEdge::new(185, 100)])]));
    let mut gate = PlaybackGate::default();
    assert_eq!(gate.tick(&mut seg, &mut sync, 1, &cfg), GateDecision::Advance);
    assert_eq!(gate.prediction(), (FrameIndex(179), FrameIndex(180)));

    sync.seek(at(182));
    assert_eq!(gate.tick(&mut seg, &mut sync, 1, &cfg), GateDecision::DroppedFrame);
    assert_eq!(gate.dropped_frames(), 1);
    assert!((sync.current_time() - at(182)).abs() < 1e-9);
}

#[test]
fn skipped_cut_frame_is_reported_not_corrected() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(99);
    let edges = vec![CutEdge::new(100, 40), CutEdge::new(170, 110)];
    let mut seg = gated_segment(hold_graph(&[(0, edges)]));
    let mut gate = PlaybackGate::default();
    assert_eq!(gate.tick(&mut seg, &mut sync, 0, &cfg), GateDecision::Advance);
    assert_eq!(gate.prediction(), (FrameIndex(99), FrameIndex(100)));

    sync.seek(at(102));
    assert_eq!(gate.tick(&mut seg, &mut sync, 0, &cfg), GateDecision::DroppedFrame);
    assert_eq!(gate.dropped_frames(), 1);
    assert!((sync.current_time() - at(102)).abs() < 1e-9);
    assert!(!sync.is_transitioning());

    // Detection happens once; the next frame is handled normally.
    assert_eq!(gate.tick(&mut seg, &mut sync, 0, &cfg), GateDecision::Advance);
    assert_eq!(gate.dropped_frames(), 1);
    assert_eq!(gate.state(), GateState::HoldingAtGate);
}

#[test]
fn satisfied_gate_ignores_skipped_cut_frames() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(99);
    let edges = vec![CutEdge::new(100, 40), CutEdge::new(170, 110)];
    let mut seg = gated_segment(hold_graph(&[(0, edges)]));
    let mut gate = PlaybackGate::default();
    gate.tick(&mut seg, &mut sync, 3, &cfg);
    assert!(gate.gate_satisfied());

    sync.seek(at(102));
    assert_eq!(gate.tick(&mut seg, &mut sync, 0, &cfg), GateDecision::Advance);
    assert_eq!(gate.dropped_frames(), 0);
}

#[test]
fn entering_another_cut_mid_transition_exits_it() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(170);
    let mut seg = gated_segment(hold_graph(&[(2, vec![CutEdge::new(121, 50)])]));
    let mut gate = PlaybackGate::default();
    gate.tick(&mut seg, &mut sync, 0, &cfg);
    for _ in 0..10 {
        sync.update_backends(DT);
        assert!(matches!(
            gate.tick(&mut seg, &mut sync, 0, &cfg),
            GateDecision::Blend { finished: false, .. }
        ));
    }
    sync.update_backends(DT);
    let d = gate.tick(&mut seg, &mut sync, 2, &cfg);
    assert_eq!(
        d,
        GateDecision::Jump {
            from: FrameIndex(121),
            to: FrameIndex(50),
            kind: JumpKind::HoldLoop,
        }
    );
}

fn eager_segment(cross_fade_audio: bool) -> Segment {
    let mut graph = hold_graph(&[]);
    graph
        .set_cost(3, CostMatrix::from_fn(300, |_, _| 0.5).unwrap())
        .unwrap();
    let mut seg = gated_segment(graph);
    seg.flags.eager_skip = true;
    seg.flags.cross_fade_audio = cross_fade_audio;
    seg
}

#[test]
fn eager_skip_jumps_to_just_before_gate() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(30);
    sync.configure_audio(false, false);
    let mut seg = eager_segment(false);
    let mut gate = PlaybackGate::default();
    let d = gate.tick(&mut seg, &mut sync, 3, &cfg);
    assert_eq!(
        d,
        GateDecision::Jump {
            from: FrameIndex(30),
            to: FrameIndex(165),
            kind: JumpKind::EagerSkip,
        }
    );
    assert!((sync.current_time() - at(165)).abs() < 1e-9);
    // Default policy crossfades audio for eager skips.
    let mix = sync.audio_mix();
    assert!(!mix.main_muted && !mix.side_muted);
}

#[test]
fn suppress_policy_blocks_eager_skip_without_audio_crossfade() {
    let cfg = EngineConfig {
        eager_skip_audio: EagerSkipAudioPolicy::Suppress,
        ..EngineConfig::default()
    };
    let mut sync = playing_sync(30);
    let mut seg = eager_segment(false);
    let mut gate = PlaybackGate::default();
    assert_eq!(gate.tick(&mut seg, &mut sync, 3, &cfg), GateDecision::Advance);

    let mut seg = eager_segment(true);
    let mut gate = PlaybackGate::default();
    assert!(matches!(
        gate.tick(&mut seg, &mut sync, 3, &cfg),
        GateDecision::Jump {
            kind: JumpKind::EagerSkip,
            ..
        }
    ));
}

#[test]
fn eager_skip_needs_cheap_jump_and_room_before_gate() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(170);
    let mut seg = eager_segment(true);
    let mut gate = PlaybackGate::default();
    assert_eq!(gate.tick(&mut seg, &mut sync, 3, &cfg), GateDecision::Advance);

    let mut seg = eager_segment(true);
    if let Some(g) = seg.gated_mut() {
        g.thresholds.jump_threshold = 0.1;
    }
    let mut sync = playing_sync(30);
    let mut gate = PlaybackGate::default();
    assert_eq!(gate.tick(&mut seg, &mut sync, 3, &cfg), GateDecision::Advance);
}

#[test]
fn view_change_cancels_forward_skip() {
    let cfg = EngineConfig::default();
    let mut sync = playing_sync(30);
    let mut seg = eager_segment(true);
    let mut gate = PlaybackGate::default();
    gate.tick(&mut seg, &mut sync, 3, &cfg);
    assert!(sync.is_transitioning());

    sync.update_backends(DT);
    let d = gate.tick(&mut seg, &mut sync, 4, &cfg);
    assert!(!sync.is_transitioning());
    assert_eq!(d, GateDecision::Advance);
    assert!(sync.current_time() < at(40));
}
