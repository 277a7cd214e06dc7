use super::*;

#[test]
fn simulated_clock_advances_only_while_playing() {
    let mut b = SimulatedBackend::new(BackendSettings::new(30.0, 10.0));
    b.update(1.0);
    assert_eq!(b.current_time(), 0.0);
    b.play();
    b.update(0.25);
    b.update(0.25);
    assert!((b.current_time() - 0.5).abs() < 1e-12);
    b.pause();
    assert!(b.is_paused());
    b.update(1.0);
    assert!((b.current_time() - 0.5).abs() < 1e-12);
}

#[test]
fn simulated_seek_and_clock_clamp_to_media() {
    let mut b = SimulatedBackend::new(BackendSettings::new(30.0, 2.0));
    b.seek(-1.0);
    assert_eq!(b.current_time(), 0.0);
    b.seek(5.0);
    assert_eq!(b.current_time(), 2.0);
    b.seek(1.9);
    b.play();
    b.update(1.0);
    assert_eq!(b.current_time(), 2.0);
    assert_eq!(b.seek_count(), 3);
}

#[test]
fn volume_is_clamped() {
    let mut b = SimulatedBackend::new(BackendSettings::default());
    b.set_volume(1.5);
    assert_eq!(b.volume(), 1.0);
    b.set_muted(true);
    assert!(b.is_muted());
}

#[test]
fn create_backend_validates_metadata() {
    assert!(create_backend(BackendKind::Simulated, &BackendSettings::new(30.0, 10.0)).is_ok());
    let bad = BackendSettings {
        frame_rate: Some(0.0),
        duration: None,
    };
    let err = create_backend(BackendKind::Simulated, &bad).err().unwrap();
    assert!(err.to_string().starts_with("playback error:"));
}
