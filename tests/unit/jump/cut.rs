use super::*;

fn table() -> CutTable {
    CutTable::new(vec![
        CutEdge::new(40, 10),
        CutEdge::new(90, 60),
        CutEdge::new(170, 110),
    ])
    .unwrap()
}

#[test]
fn lookups_are_exact_matches() {
    let t = table();
    assert!(t.reached_cut_frame(FrameIndex(90)));
    assert!(!t.reached_cut_frame(FrameIndex(91)));
    assert_eq!(t.find_jump_to(FrameIndex(170)), Some(FrameIndex(110)));
    assert_eq!(t.find_jump_to(FrameIndex(169)), None);
}

#[test]
fn last_cut_frame_guards_desync() {
    let t = table();
    assert_eq!(t.last_cut_frame(), Some(FrameIndex(170)));
    assert!(!t.past_last_cut_frame(FrameIndex(170)));
    assert!(t.past_last_cut_frame(FrameIndex(171)));

    let empty = CutTable::default();
    assert!(!empty.has_cut_data());
    assert!(!empty.past_last_cut_frame(FrameIndex(1_000)));
    assert_eq!(empty.last_cut_frame(), None);
}

#[test]
fn rejects_unordered_or_duplicate_cut_frames() {
    assert!(CutTable::new(vec![CutEdge::new(5, 1), CutEdge::new(5, 2)]).is_err());
    assert!(CutTable::new(vec![CutEdge::new(9, 1), CutEdge::new(5, 2)]).is_err());
}

#[test]
fn authored_flags_follow_raw_arcs_and_extra_costs() {
    let mut all_arcs = vec![0; 50];
    all_arcs[20] = 3;
    all_arcs[30] = 12;
    let t = CutTable::from_authored(&[20, 30], &[3, 10], &all_arcs, &[0.0, 4.5]).unwrap();
    let e = t.edges();
    assert!(!e[0].post_process_warning && !e[0].penalized);
    assert!(e[1].post_process_warning && e[1].penalized);

    let blocks = t.cut_blocks();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].range, FrameRange::single(FrameIndex(30)));
    assert!(blocks[1].penalized);
}

#[test]
fn authored_lengths_must_agree() {
    assert!(CutTable::from_authored(&[1, 2], &[0], &[], &[]).is_err());
    assert!(CutTable::from_authored(&[1, 2], &[0, 0], &[], &[1.0]).is_err());
}
