use super::*;

#[test]
fn defaults_validate() {
    let cfg = WorkbenchConfig::default();
    cfg.validate().unwrap();
    assert_eq!(cfg.default_position, Point::new(400.0, 300.0));
    assert_eq!(cfg.history_limit, 11);
    assert_eq!(cfg.palette.len(), DEFAULT_PALETTE.len());
}

#[test]
fn partial_json_overrides_only_named_fields() {
    let json = r#"{ "default_frame_duration": 0.25, "history_limit": 3 }"#;
    let cfg = WorkbenchConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.default_frame_duration, 0.25);
    assert_eq!(cfg.history_limit, 3);
    assert_eq!(cfg.min_frame_duration, 0.1);
    assert_eq!(cfg.thumbnail_max_px, 128);
}

#[test]
fn unknown_fields_are_rejected() {
    let json = r#"{ "history_lmit": 3 }"#;
    let err = WorkbenchConfig::from_reader(json.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("parse workbench config JSON"));
}

#[test]
fn validation_rejects_bad_values() {
    let cfg = WorkbenchConfig {
        palette: vec![],
        ..WorkbenchConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = WorkbenchConfig {
        default_frame_duration: 0.05,
        ..WorkbenchConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = WorkbenchConfig {
        history_limit: 0,
        ..WorkbenchConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn missing_file_reports_path() {
    let err = WorkbenchConfig::from_path("does/not/exist.json").unwrap_err();
    assert!(err.to_string().contains("does/not/exist.json"));
}
