//! Breakpoint templates for each axis type.
//!
//! A template fixes the slot-to-position mapping of an axis, so enabling or
//! disabling slots can never reorder them.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{MapError, Result};

/// Capacities an axis may have
pub const SUPPORTED_CAPACITIES: [usize; 5] = [8, 9, 16, 20, 32];

/// Physical quantity an axis is indexed by
#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AxisType {
    Rpm,
    Map,
    EngineTemp,
    AirTemp,
    Tps,
    Voltage,
}

impl AxisType {
    /// Fixed slot count for this axis type
    pub fn capacity(&self) -> usize {
        match self {
            AxisType::Rpm => 32,
            AxisType::Map => 20,
            AxisType::EngineTemp => 16,
            AxisType::Tps => 16,
            AxisType::AirTemp => 9,
            AxisType::Voltage => 8,
        }
    }

    /// Unit of the axis breakpoints
    pub fn unit(&self) -> &'static str {
        match self {
            AxisType::Rpm => "rpm",
            AxisType::Map => "kPa",
            AxisType::EngineTemp | AxisType::AirTemp => "°C",
            AxisType::Tps => "%",
            AxisType::Voltage => "V",
        }
    }

    /// Whether the axis measures engine load
    pub fn is_load(&self) -> bool {
        matches!(self, AxisType::Map | AxisType::Tps)
    }

    /// Standard template for this axis type
    pub fn template(&self) -> AxisTemplate {
        AxisTemplate::standard(*self)
    }
}

/// Fixed slot positions plus the slots enabled on a freshly configured axis
#[derive(Clone, Debug, PartialEq)]
pub struct AxisTemplate {
    pub axis_type: AxisType,
    pub positions: Vec<f64>,
    pub default_enabled: Vec<bool>,
}

impl AxisTemplate {
    /// Built-in template for an axis type
    pub fn standard(axis_type: AxisType) -> Self {
        let positions: Vec<f64> = match axis_type {
            // 250..=8000 in 250 rpm steps
            AxisType::Rpm => (1..=32).map(|i| i as f64 * 250.0).collect(),
            // 10..=100 kPa in 10 kPa steps, then boost up to 300 kPa in 20 kPa steps
            AxisType::Map => (1..=10)
                .map(|i| i as f64 * 10.0)
                .chain((1..=10).map(|i| 100.0 + i as f64 * 20.0))
                .collect(),
            AxisType::EngineTemp => (0..16).map(|i| -40.0 + i as f64 * 10.0).collect(),
            AxisType::AirTemp => vec![-20.0, -10.0, 0.0, 10.0, 20.0, 30.0, 40.0, 60.0, 80.0],
            AxisType::Tps => vec![
                0.0, 2.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0,
                95.0, 100.0,
            ],
            AxisType::Voltage => (0..8).map(|i| 8.0 + i as f64).collect(),
        };

        let default_enabled = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| match axis_type {
                // Every other bin up to 7000 rpm
                AxisType::Rpm => i % 2 == 1 && p <= 7000.0,
                // Vacuum region only; boost bins are enabled on demand
                AxisType::Map => p <= 100.0,
                AxisType::EngineTemp => i % 2 == 0 || p >= 70.0,
                AxisType::AirTemp | AxisType::Tps | AxisType::Voltage => true,
            })
            .collect();

        Self {
            axis_type,
            positions,
            default_enabled,
        }
    }

    /// Template with caller-supplied positions, all slots disabled.
    ///
    /// The position count must equal the fixed capacity of `axis_type`.
    pub fn custom(axis_type: AxisType, positions: Vec<f64>) -> Result<Self> {
        if positions.len() != axis_type.capacity() {
            return Err(MapError::Validation(format!(
                "{} axis needs {} positions, got {}",
                axis_type,
                axis_type.capacity(),
                positions.len()
            )));
        }
        if positions.iter().any(|p| !p.is_finite()) {
            return Err(MapError::Range("axis positions must be finite".to_string()));
        }
        if positions.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MapError::Validation(
                "axis positions must be strictly increasing".to_string(),
            ));
        }
        let default_enabled = vec![false; positions.len()];
        Ok(Self {
            axis_type,
            positions,
            default_enabled,
        })
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }
}
