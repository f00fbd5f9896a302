//! Vehicle parameters consumed by the calculator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{MapError, Result};
use crate::maps::Bank;
use crate::units::{DisplacementUnit, FlowUnit, PressureUnit};

/// Fuel the engine runs on
#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    #[default]
    Gasoline,
    E10,
    E85,
    Ethanol,
    Methanol,
    Lpg,
}

impl FuelType {
    /// Stoichiometric air-fuel ratio by mass
    pub fn stoich_afr(&self) -> f64 {
        match self {
            FuelType::Gasoline => 14.7,
            FuelType::E10 => 14.1,
            FuelType::E85 => 9.8,
            FuelType::Ethanol => 9.0,
            FuelType::Methanol => 6.4,
            FuelType::Lpg => 15.5,
        }
    }

    /// Liquid density in g/cc
    pub fn density_g_per_cc(&self) -> f64 {
        match self {
            FuelType::Gasoline => 0.745,
            FuelType::E10 => 0.75,
            FuelType::E85 => 0.785,
            FuelType::Ethanol => 0.789,
            FuelType::Methanol => 0.792,
            FuelType::Lpg => 0.54,
        }
    }

    /// Extra spark advance the fuel's knock resistance allows, in degrees
    pub fn knock_margin_deg(&self) -> f64 {
        match self {
            FuelType::Gasoline => 0.0,
            FuelType::E10 => 1.0,
            FuelType::Lpg => 3.0,
            FuelType::E85 => 4.0,
            FuelType::Ethanol | FuelType::Methanol => 5.0,
        }
    }
}

/// Induction type
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Aspiration {
    #[default]
    NaturallyAspirated,
    /// Maximum boost above barometric pressure in kPa
    Turbocharged { max_boost_kpa: f64 },
    Supercharged { max_boost_kpa: f64 },
}

impl Aspiration {
    /// Turbocharged with `max_boost` above barometric pressure
    pub fn turbocharged(max_boost: f64, unit: PressureUnit) -> Self {
        Aspiration::Turbocharged {
            max_boost_kpa: unit.to_kpa(max_boost),
        }
    }

    /// Supercharged with `max_boost` above barometric pressure
    pub fn supercharged(max_boost: f64, unit: PressureUnit) -> Self {
        Aspiration::Supercharged {
            max_boost_kpa: unit.to_kpa(max_boost),
        }
    }

    pub fn max_boost_kpa(&self) -> f64 {
        match self {
            Aspiration::NaturallyAspirated => 0.0,
            Aspiration::Turbocharged { max_boost_kpa }
            | Aspiration::Supercharged { max_boost_kpa } => *max_boost_kpa,
        }
    }
}

/// How the fuel pressure regulator is referenced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelPressureRegulation {
    /// Rail pressure tracks manifold pressure 1:1
    #[default]
    ManifoldReferenced,
    /// Rail pressure fixed relative to atmosphere
    Fixed,
}

/// Physical description of the engine and fuel system.
///
/// Displacement is the whole engine in cc. Injector flow is per injector in
/// cc/min at the rated fuel pressure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    pub displacement_cc: f64,
    pub cylinders: u32,
    pub injector_flow_cc_min: f64,
    /// Flow of the secondary (bank B) injectors, when staged
    #[serde(default)]
    pub secondary_injector_flow_cc_min: Option<f64>,
    #[serde(default)]
    pub fuel_type: FuelType,
    #[serde(default)]
    pub aspiration: Aspiration,
    #[serde(default)]
    pub fuel_regulation: FuelPressureRegulation,
    /// Injector dead time at 13.5 V in ms
    #[serde(default = "default_dead_time")]
    pub injector_dead_time_ms: f64,
}

fn default_dead_time() -> f64 {
    0.9
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            displacement_cc: 2000.0,
            cylinders: 4,
            injector_flow_cc_min: 440.0,
            secondary_injector_flow_cc_min: None,
            fuel_type: FuelType::Gasoline,
            aspiration: Aspiration::NaturallyAspirated,
            fuel_regulation: FuelPressureRegulation::ManifoldReferenced,
            injector_dead_time_ms: default_dead_time(),
        }
    }
}

fn positive(value: f64, what: &str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MapError::Validation(format!(
            "{} must be positive, got {}",
            what, value
        )))
    }
}

impl VehicleParams {
    /// Parameters from spec-sheet figures in arbitrary units.
    ///
    /// A lb/hr rating is converted with the density of `fuel_type`. Other fields
    /// take their defaults.
    pub fn from_units(
        displacement: f64,
        displacement_unit: DisplacementUnit,
        cylinders: u32,
        injector_flow: f64,
        flow_unit: FlowUnit,
        fuel_type: FuelType,
    ) -> Result<Self> {
        let flow = flow_unit.to_cc_per_min(injector_flow, fuel_type.density_g_per_cc());
        let params = Self {
            displacement_cc: displacement_unit.to_cc(displacement),
            cylinders,
            injector_flow_cc_min: flow,
            fuel_type,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject physically impossible parameters
    pub fn validate(&self) -> Result<()> {
        positive(self.displacement_cc, "displacement")?;
        positive(self.injector_flow_cc_min, "injector flow")?;
        if let Some(flow) = self.secondary_injector_flow_cc_min {
            positive(flow, "secondary injector flow")?;
        }
        if self.cylinders == 0 || self.cylinders > 16 {
            return Err(MapError::Validation(format!(
                "cylinder count must be within 1-16, got {}",
                self.cylinders
            )));
        }
        if !(self.injector_dead_time_ms.is_finite() && self.injector_dead_time_ms >= 0.0) {
            return Err(MapError::Validation(
                "injector dead time must be non-negative".to_string(),
            ));
        }
        let boost = self.aspiration.max_boost_kpa();
        if !(boost.is_finite() && boost >= 0.0) {
            return Err(MapError::Validation(format!(
                "max boost must be non-negative, got {}",
                boost
            )));
        }
        Ok(())
    }

    pub fn has_boost(&self) -> bool {
        self.aspiration.max_boost_kpa() > 0.0
    }

    /// Per-injector flow for a bank; bank B uses the secondary injectors when present
    pub fn injector_flow_for(&self, bank: Bank) -> f64 {
        match bank {
            Bank::B => self
                .secondary_injector_flow_cc_min
                .unwrap_or(self.injector_flow_cc_min),
            Bank::A | Bank::None => self.injector_flow_cc_min,
        }
    }

    /// Swept volume of one cylinder in cc
    pub fn cylinder_volume_cc(&self) -> f64 {
        self.displacement_cc / self.cylinders as f64
    }
}

/// Read-only source of vehicle parameters
pub trait VehicleProvider {
    fn vehicle_params(&self, vehicle_id: &str) -> Result<VehicleParams>;
}

impl VehicleProvider for HashMap<String, VehicleParams> {
    fn vehicle_params(&self, vehicle_id: &str) -> Result<VehicleParams> {
        self.get(vehicle_id)
            .cloned()
            .ok_or_else(|| MapError::Validation(format!("unknown vehicle {}", vehicle_id)))
    }
}
