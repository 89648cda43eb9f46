use panorama_capture::config::Configuration;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
panorama-save-path: "/games/panoramas"
use-custom-panorama: false
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.panorama_save_path, PathBuf::from("/games/panoramas"));
    assert!(!cfg.use_custom_panorama);
    assert_eq!(cfg.writer_max_concurrent_writes, 4);
}

#[test]
fn empty_document_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    assert_eq!(cfg.panorama_save_path, PathBuf::from("panoramas"));
    assert!(cfg.use_custom_panorama);
    assert_eq!(cfg.writer_drain_timeout, Duration::from_secs(10));
    cfg.validated().unwrap();
}

#[test]
fn parse_humantime_drain_timeout() {
    let yaml = r#"
writer-drain-timeout: 1m 30s
writer-max-concurrent-writes: 2
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.writer_drain_timeout, Duration::from_secs(90));
    assert_eq!(cfg.writer_max_concurrent_writes, 2);
}

#[test]
fn validated_rejects_zero_writers() {
    let yaml = r#"
writer-max-concurrent-writes: 0
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(err.to_string().contains("writer-max-concurrent-writes"));
}

#[test]
fn validated_rejects_empty_save_path() {
    let yaml = r#"
panorama-save-path: ""
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn unknown_duration_is_a_parse_error() {
    let yaml = r#"
writer-drain-timeout: soon
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn loads_from_yaml_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, "panorama-save-path: shots\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap().validated().unwrap();
    assert_eq!(cfg.panorama_save_path, PathBuf::from("shots"));
}
