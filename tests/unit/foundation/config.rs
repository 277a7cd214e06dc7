use super::*;

#[test]
fn defaults_validate() {
    let cfg = EngineConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.num_views, 40);
    assert_eq!(cfg.eager_skip_audio, EagerSkipAudioPolicy::Crossfade);
}

#[test]
fn partial_json_fills_defaults() {
    let cfg = EngineConfig::from_json_str(
        r#"{ "num_views": 8, "transition_duration_sec": 0.25, "eager_skip_audio": "suppress" }"#,
    )
    .unwrap();
    assert_eq!(cfg.num_views, 8);
    assert_eq!(cfg.transition_duration_sec, 0.25);
    assert_eq!(cfg.eager_skip_audio, EagerSkipAudioPolicy::Suppress);
    assert_eq!(cfg.boundary_samples, 41);
}

#[test]
fn invalid_values_are_rejected() {
    let err = EngineConfig::from_json_str(r#"{ "num_views": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("num_views"));

    let err = EngineConfig::from_json_str(r#"{ "transition_duration_sec": -1.0 }"#).unwrap_err();
    assert!(err.to_string().contains("transition_duration_sec"));

    let err = EngineConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.to_string().contains("serialization error:"));
}

#[test]
fn missing_file_reports_path() {
    let err = EngineConfig::from_path("definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("definitely/not/here.json"));
}
