//! Map type dispatch table.
//!
//! Each [`MapType`] resolves to a [`MapTypeSpec`] carrying its unit, value domain,
//! formula and default axes. Adding a map type without a spec entry is a
//! compile error.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::axis::AxisType;

/// Kind of table
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
pub enum MapType {
    MainFuel,
    Ignition,
    LambdaTarget,
    TpsCorrection,
    EngineTempCorrection,
    AirTempCorrection,
    VoltageCorrection,
    RpmCorrection,
}

/// Injector bank a map drives
#[derive(
    AsRefStr, Clone, Copy, Debug, Default, Display, EnumString, PartialEq, Eq, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    A,
    B,
    #[default]
    None,
}

/// Number of axes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimensionality {
    #[serde(rename = "1d")]
    OneD,
    #[serde(rename = "2d")]
    TwoD,
}

/// How a correction combines with the base value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionMode {
    /// Percentage applied as `base × (1 + value / 100)`
    Multiplicative,
    /// Value added in the map's unit
    Additive,
}

/// 1-D correction curves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionCurve {
    Throttle,
    Warmup,
    AirDensity,
    DeadTime,
    EngineSpeed,
}

impl CorrectionCurve {
    pub fn mode(&self) -> CorrectionMode {
        match self {
            CorrectionCurve::DeadTime => CorrectionMode::Additive,
            _ => CorrectionMode::Multiplicative,
        }
    }
}

/// Formula family used to fill the cells of a map
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Formula {
    /// Injector open time from first principles
    InjectorTime,
    /// Spark advance
    SparkAdvance,
    /// Target lambda from strategy zones
    TargetLambda,
    /// Zone-shaped 1-D correction
    Correction(CorrectionCurve),
}

/// Static description of a map type
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapTypeSpec {
    pub unit: &'static str,
    pub min_value: f64,
    pub max_value: f64,
    pub formula: Formula,
    pub default_x: AxisType,
    pub default_y: Option<AxisType>,
    /// Axis types accepted on the x axis
    pub x_axes: &'static [AxisType],
    /// Axis types accepted on the y axis; empty for 1-D-only maps
    pub y_axes: &'static [AxisType],
}

const LOAD_AXES: &[AxisType] = &[AxisType::Map, AxisType::Tps];

impl MapType {
    /// Dispatch table entry
    pub const fn spec(&self) -> MapTypeSpec {
        match self {
            MapType::MainFuel => MapTypeSpec {
                unit: "ms",
                min_value: 0.0,
                max_value: 30.0,
                formula: Formula::InjectorTime,
                default_x: AxisType::Rpm,
                default_y: Some(AxisType::Map),
                x_axes: &[AxisType::Rpm, AxisType::Map, AxisType::Tps],
                y_axes: LOAD_AXES,
            },
            MapType::Ignition => MapTypeSpec {
                unit: "°BTDC",
                min_value: -10.0,
                max_value: 50.0,
                formula: Formula::SparkAdvance,
                default_x: AxisType::Rpm,
                default_y: Some(AxisType::Map),
                x_axes: &[AxisType::Rpm],
                y_axes: LOAD_AXES,
            },
            MapType::LambdaTarget => MapTypeSpec {
                unit: "λ",
                min_value: 0.65,
                max_value: 1.2,
                formula: Formula::TargetLambda,
                default_x: AxisType::Rpm,
                default_y: Some(AxisType::Map),
                x_axes: &[AxisType::Rpm],
                y_axes: LOAD_AXES,
            },
            MapType::TpsCorrection => MapTypeSpec {
                unit: "%",
                min_value: -30.0,
                max_value: 100.0,
                formula: Formula::Correction(CorrectionCurve::Throttle),
                default_x: AxisType::Tps,
                default_y: None,
                x_axes: &[AxisType::Tps],
                y_axes: &[],
            },
            MapType::EngineTempCorrection => MapTypeSpec {
                unit: "%",
                min_value: -20.0,
                max_value: 150.0,
                formula: Formula::Correction(CorrectionCurve::Warmup),
                default_x: AxisType::EngineTemp,
                default_y: None,
                x_axes: &[AxisType::EngineTemp],
                y_axes: &[],
            },
            MapType::AirTempCorrection => MapTypeSpec {
                unit: "%",
                min_value: -30.0,
                max_value: 30.0,
                formula: Formula::Correction(CorrectionCurve::AirDensity),
                default_x: AxisType::AirTemp,
                default_y: None,
                x_axes: &[AxisType::AirTemp],
                y_axes: &[],
            },
            MapType::VoltageCorrection => MapTypeSpec {
                unit: "ms",
                min_value: 0.0,
                max_value: 5.0,
                formula: Formula::Correction(CorrectionCurve::DeadTime),
                default_x: AxisType::Voltage,
                default_y: None,
                x_axes: &[AxisType::Voltage],
                y_axes: &[],
            },
            MapType::RpmCorrection => MapTypeSpec {
                unit: "%",
                min_value: -25.0,
                max_value: 25.0,
                formula: Formula::Correction(CorrectionCurve::EngineSpeed),
                default_x: AxisType::Rpm,
                default_y: None,
                x_axes: &[AxisType::Rpm],
                y_axes: &[],
            },
        }
    }

    pub fn is_correction(&self) -> bool {
        matches!(self.spec().formula, Formula::Correction(_))
    }
}
