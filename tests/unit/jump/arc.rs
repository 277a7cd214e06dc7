use super::*;

#[test]
fn equality_is_approximate_on_endpoints_only() {
    let a = LoopArc::new(5.666_666_6, 3.666_666_6, 0.0, 10.0);
    let b = LoopArc::new(5.666_666_600_1, 3.666_666_600_1, 1.0, 9.0);
    assert_eq!(a, b);
    assert_ne!(a, LoopArc::new(5.7, 3.666_666_6, 0.0, 10.0));
}

#[test]
fn history_deduplicates_and_tracks_current() {
    let mut h = LoopArcHistory::default();
    assert!(h.current().is_none());
    h.add(LoopArc::new(5.0, 3.0, 0.0, 10.0));
    h.add(LoopArc::new(2.0, 1.0, 0.0, 10.0));
    assert_eq!(h.current().unwrap().from_time, 2.0);
    h.add(LoopArc::new(5.0, 3.0, 0.0, 10.0));
    assert_eq!(h.len(), 2);
    assert_eq!(h.current().unwrap().from_time, 5.0);
}

#[test]
fn sorted_orders_by_from_time() {
    let mut h = LoopArcHistory::default();
    for from in [7.0, 1.0, 4.0] {
        h.add(LoopArc::new(from, 0.5, 0.0, 10.0));
    }
    let froms: Vec<f64> = h.sorted().iter().map(|a| a.from_time).collect();
    assert_eq!(froms, vec![1.0, 4.0, 7.0]);
}

#[test]
fn direction_and_offset() {
    let back = LoopArc::new(5.0, 3.0, 0.0, 10.0);
    assert!(!back.is_forward());
    assert!((back.media_offset() - 2.0).abs() < 1e-12);
    assert!(LoopArc::new(1.0, 5.5, 0.0, 10.0).is_forward());
}
