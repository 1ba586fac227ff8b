//! Integration tests for fuente-config.

use fuente_config::{ConfigError, EngineConfig, Interpolation};
use tempfile::TempDir;

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");

    let config = EngineConfig::default()
        .with_sample_rate(44100)
        .with_voice_count(12)
        .with_interpolation(Interpolation::Cubic)
        .with_declick_ms(1.5);
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("engine.toml");

    EngineConfig::default().save(&path).unwrap();
    assert!(path.is_file());
}

#[test]
fn test_load_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn test_load_rejects_invalid_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "voice_count = 32\ndeclick_ms = 12.0\n").unwrap();

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "declick_ms", .. }));
}

#[test]
fn test_load_rejects_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "voice_count = [").unwrap();

    assert!(matches!(
        EngineConfig::load(&path).unwrap_err(),
        ConfigError::TomlParse(_)
    ));
}
