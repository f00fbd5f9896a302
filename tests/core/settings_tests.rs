//! Tests for engine settings persistence
//!
//! Tests cover:
//! - Default values
//! - Save/load round trips through a temporary directory
//! - Missing files, malformed JSON and invalid values

use ultramap::settings::{BridgeSettings, CalculationSettings, EngineSettings};
use ultramap::{ErrorKind, MapError};

// ============================================
// Default Tests
// ============================================

#[test]
fn test_default_sections() {
    let settings = EngineSettings::default();
    assert_eq!(settings.version, 1);
    assert_eq!(settings.calculation, CalculationSettings::default());
    assert_eq!(settings.bridge, BridgeSettings::default());
    assert_eq!(settings.snapshot.compression_level, 6);
    assert!(settings.snapshot.storage_dir.is_none());
}

#[test]
fn test_config_dir_name() {
    if let Some(dir) = EngineSettings::get_config_dir() {
        let name = dir.file_name().unwrap().to_string_lossy().to_lowercase();
        assert_eq!(name, "ultramap");
    }
}

// ============================================
// Persistence Tests
// ============================================

#[test]
fn test_save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let mut settings = EngineSettings::default();
    settings.calculation.baro_kpa = 95.0;
    settings.bridge.min_confidence = 0.7;
    settings.snapshot.storage_dir = Some(dir.path().join("snapshots"));
    settings.save_to(&path).unwrap();

    let loaded = EngineSettings::load_from(&path).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.snapshot_dir(), Some(dir.path().join("snapshots")));
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = EngineSettings::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(loaded, EngineSettings::default());
}

#[test]
fn test_malformed_json_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = EngineSettings::load_from(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialization);
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"snapshot": {"compression_level": 12}}"#).unwrap();
    assert!(matches!(
        EngineSettings::load_from(&path),
        Err(MapError::Validation(_))
    ));
}

#[test]
fn test_unknown_fields_are_ignored() -> anyhow::Result<()> {
    let settings: EngineSettings =
        serde_json::from_str(r#"{"version": 1, "ui": {"theme": "dark"}}"#)?;
    assert_eq!(settings.calculation.safety_envelope, 0.15);
    Ok(())
}
