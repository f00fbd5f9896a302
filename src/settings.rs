//! Engine settings persistence.
//!
//! This module handles loading and saving the tunables that shape calculation,
//! format detection and snapshot storage.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MapError, Result};

/// Calculation tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationSettings {
    /// Maximum relative deviation the safety factor may introduce (0.15 = ±15%)
    pub safety_envelope: f64,
    /// Barometric reference pressure in kPa
    pub baro_kpa: f64,
    /// Ambient intake air temperature in °C
    pub ambient_temp_c: f64,
    /// Pressure at which injector flow is rated, in kPa
    pub rated_fuel_pressure_kpa: f64,
    /// Grids with at least this many cells are evaluated in parallel
    pub parallel_threshold: usize,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            safety_envelope: 0.15,
            baro_kpa: 101.325,
            ambient_temp_c: 25.0,
            rated_fuel_pressure_kpa: 300.0,
            parallel_threshold: 256,
        }
    }
}

/// Format bridge tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Detection confidence below this fails instead of guessing
    pub min_confidence: f64,
    /// Largest accepted text input in bytes
    pub max_input_bytes: usize,
    /// Largest accepted number of lines
    pub max_lines: usize,
    /// Decimal places assumed for scaled hex/binary cells
    pub default_decimal_places: u8,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            max_input_bytes: 256 * 1024,
            max_lines: 512,
            default_decimal_places: 3,
        }
    }
}

/// Snapshot store tunables
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotSettings {
    /// Gzip level for payload blobs (0-9)
    pub compression_level: u32,
    /// Root directory for the file backend; `None` uses the platform data dir
    pub storage_dir: Option<PathBuf>,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            compression_level: 6,
            storage_dir: None,
        }
    }
}

/// Settings that persist across sessions
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Settings file version for migration support
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub calculation: CalculationSettings,
    #[serde(default)]
    pub bridge: BridgeSettings,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
}

fn default_version() -> u32 {
    1
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: 1,
            calculation: CalculationSettings::default(),
            bridge: BridgeSettings::default(),
            snapshot: SnapshotSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Get the config directory path for UltraMap
    pub fn get_config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::data_dir().map(|p| p.join("UltraMap"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|p| p.join("UltraMap"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs::config_dir().map(|p| p.join("ultramap"))
        }
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Directory used by the file snapshot backend
    pub fn snapshot_dir(&self) -> Option<PathBuf> {
        self.snapshot
            .storage_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("ultramap").join("snapshots")))
    }

    /// Load settings from the platform config dir, falling back to defaults
    pub fn load() -> Self {
        match Self::get_settings_path() {
            Some(path) => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Using default settings: {}", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load settings from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to the platform config dir
    pub fn save(&self) -> Result<()> {
        let path = Self::get_settings_path()
            .ok_or_else(|| MapError::Storage("Could not determine config directory".into()))?;
        self.save_to(&path)
    }

    /// Save settings to an explicit path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let calc = &self.calculation;
        if !(0.0..=1.0).contains(&calc.safety_envelope) {
            return Err(MapError::Validation(format!(
                "safety_envelope must be within [0, 1], got {}",
                calc.safety_envelope
            )));
        }
        if !(calc.baro_kpa.is_finite() && calc.baro_kpa > 0.0) {
            return Err(MapError::Validation("baro_kpa must be positive".into()));
        }
        if !(calc.rated_fuel_pressure_kpa.is_finite() && calc.rated_fuel_pressure_kpa > 0.0) {
            return Err(MapError::Validation(
                "rated_fuel_pressure_kpa must be positive".into(),
            ));
        }
        if !calc.ambient_temp_c.is_finite() || calc.ambient_temp_c <= -273.15 {
            return Err(MapError::Validation(
                "ambient_temp_c must be above absolute zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.bridge.min_confidence) {
            return Err(MapError::Validation(
                "min_confidence must be within [0, 1]".into(),
            ));
        }
        if self.bridge.default_decimal_places > 9 {
            return Err(MapError::Validation(
                "default_decimal_places must be at most 9".into(),
            ));
        }
        if self.snapshot.compression_level > 9 {
            return Err(MapError::Validation(
                "compression_level must be within 0-9".into(),
            ));
        }
        Ok(())
    }
}
