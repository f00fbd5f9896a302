//! Unit conventions and conversion utilities.
//!
//! The calculator works in one canonical unit per quantity: temperature in °C
//! (Kelvin internally for gas laws), pressure in kPa, displacement in cubic
//! centimetres for the whole engine, and injector flow in cc/min per injector.
//! The enums here convert values quoted on spec sheets into those units; see
//! [`VehicleParams::from_units`](crate::calculator::VehicleParams::from_units).

use serde::{Deserialize, Serialize};

/// Offset between Celsius and Kelvin
pub const KELVIN_OFFSET: f64 = 273.15;

/// Convert °C to K
#[inline]
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + KELVIN_OFFSET
}

/// Pressure unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureUnit {
    #[default]
    KPa,
    PSI,
    Bar,
}

impl PressureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            PressureUnit::KPa => "kPa",
            PressureUnit::PSI => "PSI",
            PressureUnit::Bar => "bar",
        }
    }

    /// Convert a value in this unit to kPa
    pub fn to_kpa(&self, value: f64) -> f64 {
        match self {
            PressureUnit::KPa => value,
            PressureUnit::PSI => value / 0.145038,
            PressureUnit::Bar => value * 100.0,
        }
    }
}

/// Engine displacement unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplacementUnit {
    #[default]
    CubicCentimeters,
    Liters,
    CubicInches,
}

impl DisplacementUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            DisplacementUnit::CubicCentimeters => "cc",
            DisplacementUnit::Liters => "L",
            DisplacementUnit::CubicInches => "ci",
        }
    }

    /// Convert a total engine displacement in this unit to cc
    pub fn to_cc(&self, value: f64) -> f64 {
        match self {
            DisplacementUnit::CubicCentimeters => value,
            DisplacementUnit::Liters => value * 1000.0,
            DisplacementUnit::CubicInches => value * 16.387064,
        }
    }
}

/// Injector flow rate unit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowUnit {
    #[default]
    CcPerMin,
    LbPerHr,
}

impl FlowUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            FlowUnit::CcPerMin => "cc/min",
            FlowUnit::LbPerHr => "lb/hr",
        }
    }

    /// Convert a per-injector flow in this unit to cc/min.
    ///
    /// lb/hr ratings are mass flow, so the fuel density (g/cc) is needed.
    pub fn to_cc_per_min(&self, value: f64, density_g_per_cc: f64) -> f64 {
        match self {
            FlowUnit::CcPerMin => value,
            // lb/hr * 453.592 g/lb / 60 min/hr / density g/cc = cc/min
            FlowUnit::LbPerHr => value * 453.592 / 60.0 / density_g_per_cc,
        }
    }
}
