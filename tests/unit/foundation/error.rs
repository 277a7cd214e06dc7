use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        GazeloopError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        GazeloopError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        GazeloopError::playback("x")
            .to_string()
            .contains("playback error:")
    );
    assert!(
        GazeloopError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("decoder went away");
    let err = GazeloopError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("decoder went away"));
}
