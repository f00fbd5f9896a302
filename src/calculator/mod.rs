//! Universal map calculation engine.
//!
//! [`MapCalculator`] fills every active cell of a [`Map`] from vehicle parameters,
//! a strategy preset, compensation curves and a safety factor. It is a pure
//! function of its inputs: no clock, no randomness, no I/O. Identical inputs give
//! bit-identical matrices.
//!
//! Each cell goes through three stages:
//! 1. the map type's formula (dispatched via [`MapType::spec`]) yields the unscaled value,
//! 2. the safety factor scales it, bounded to the configured envelope around the unscaled value,
//! 3. the result is clamped to the map's own domain, which may be narrower than the type's.

pub mod curves;
pub mod physics;
pub mod strategy;
pub mod vehicle;

use rayon::prelude::*;

use crate::axis::{Axis, AxisType};
use crate::error::{ensure_finite, MapError, Result};
use crate::maps::{AxisRole, Bank, Formula, Map, MapType};
use crate::settings::CalculationSettings;
use crate::units::celsius_to_kelvin;

use curves::CorrectionInput;
pub use strategy::{Strategy, StrategyPreset};
pub use vehicle::{Aspiration, FuelPressureRegulation, FuelType, VehicleParams, VehicleProvider};

/// Engine speed used when a map has no rpm axis
pub const REFERENCE_RPM: f64 = 3000.0;

/// Curves the calculator reads through interpolation
#[derive(Clone, Debug, PartialEq)]
pub struct CompensationCurves {
    /// VE in percent by engine speed
    pub ve_by_rpm: Axis,
    /// Measured injector dead time in ms by supply voltage
    pub dead_time_by_voltage: Option<Axis>,
}

impl CompensationCurves {
    pub fn new(ve_by_rpm: Axis, dead_time_by_voltage: Option<Axis>) -> Result<Self> {
        if ve_by_rpm.axis_type() != AxisType::Rpm {
            return Err(MapError::Validation(
                "VE curve must be indexed by rpm".to_string(),
            ));
        }
        ve_by_rpm.require_active(2)?;
        if let Some(curve) = &dead_time_by_voltage {
            if curve.axis_type() != AxisType::Voltage {
                return Err(MapError::Validation(
                    "dead time curve must be indexed by voltage".to_string(),
                ));
            }
            curve.require_active(2)?;
        }
        Ok(Self {
            ve_by_rpm,
            dead_time_by_voltage,
        })
    }

    /// Built-in VE model and modelled dead time
    pub fn standard() -> Result<Self> {
        Self::new(curves::default_ve_curve()?, None)
    }
}

/// Explicit context passed into the calculator
#[derive(Clone, Debug, PartialEq)]
pub struct CalcContext {
    pub settings: CalculationSettings,
    pub curves: CompensationCurves,
}

impl CalcContext {
    pub fn new(settings: CalculationSettings, curves: CompensationCurves) -> Self {
        Self { settings, curves }
    }

    pub fn standard() -> Result<Self> {
        Ok(Self::new(
            CalculationSettings::default(),
            CompensationCurves::standard()?,
        ))
    }
}

/// Axis edit that triggers recomputation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AxisEdit {
    SetEnabled {
        axis: AxisRole,
        slot: usize,
        enabled: bool,
    },
    SetValue {
        axis: AxisRole,
        slot: usize,
        value: f64,
    },
}

/// Where a cell sits in engine terms
#[derive(Clone, Copy, Debug, PartialEq)]
struct OperatingPoint {
    rpm: f64,
    load_kpa: f64,
}

/// Deterministic map value calculator
#[derive(Clone, Debug)]
pub struct MapCalculator {
    vehicle: VehicleParams,
    strategy: Strategy,
    preset: StrategyPreset,
    safety_factor: f64,
    context: CalcContext,
}

impl MapCalculator {
    pub fn new(
        vehicle: VehicleParams,
        strategy: Strategy,
        safety_factor: f64,
        context: CalcContext,
    ) -> Result<Self> {
        vehicle.validate()?;
        if !(safety_factor.is_finite() && safety_factor > 0.0) {
            return Err(MapError::Validation(format!(
                "safety factor must be positive, got {}",
                safety_factor
            )));
        }
        let envelope = context.settings.safety_envelope;
        if !(0.0..=1.0).contains(&envelope) {
            return Err(MapError::Validation(format!(
                "safety envelope must be within [0, 1], got {}",
                envelope
            )));
        }
        Ok(Self {
            vehicle,
            strategy,
            preset: strategy.preset(),
            safety_factor,
            context,
        })
    }

    /// Build a calculator for a vehicle known to `provider`
    pub fn from_provider(
        provider: &dyn VehicleProvider,
        vehicle_id: &str,
        strategy: Strategy,
        safety_factor: f64,
        context: CalcContext,
    ) -> Result<Self> {
        let vehicle = provider.vehicle_params(vehicle_id)?;
        Self::new(vehicle, strategy, safety_factor, context)
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn vehicle(&self) -> &VehicleParams {
        &self.vehicle
    }

    fn baro(&self) -> f64 {
        self.context.settings.baro_kpa
    }

    /// Compute the full value matrix for `map`.
    ///
    /// Inactive cells are `None`. The map itself is not modified.
    pub fn compute(&self, map: &Map) -> Result<Vec<Option<f64>>> {
        let x_axis = map.x_axis();
        x_axis.require_active(2)?;
        if let Some(y_axis) = map.y_axis() {
            y_axis.require_active(2)?;
        }

        let x_cap = x_axis.capacity();
        let y_cap = map.y_axis().map_or(1, Axis::capacity);
        let row = |y: usize| -> Result<Vec<Option<f64>>> {
            (0..x_cap)
                .map(|x| {
                    if map.is_cell_active(x, y) {
                        self.cell(map, x, y).map(Some)
                    } else {
                        Ok(None)
                    }
                })
                .collect()
        };

        let rows: Vec<Vec<Option<f64>>> = if x_cap * y_cap >= self.context.settings.parallel_threshold
        {
            (0..y_cap).into_par_iter().map(row).collect::<Result<_>>()?
        } else {
            (0..y_cap).map(row).collect::<Result<_>>()?
        };

        tracing::debug!(
            map_type = %map.map_type(),
            strategy = %self.strategy,
            cells = x_cap * y_cap,
            "computed map values"
        );
        Ok(rows.into_iter().flatten().collect())
    }

    /// Recompute `map` in place and record the calculator's strategy on it
    pub fn recompute(&self, map: &mut Map) -> Result<()> {
        let values = self.compute(map)?;
        map.replace_values(values)?;
        map.set_strategy(self.strategy);
        Ok(())
    }

    /// Apply an axis edit and recompute; `map` is left unchanged on failure
    pub fn apply_edit(&self, map: &mut Map, edit: AxisEdit) -> Result<()> {
        let mut edited = map.clone();
        match edit {
            AxisEdit::SetEnabled {
                axis,
                slot,
                enabled,
            } => edited.axis_mut(axis)?.set_enabled(slot, enabled)?,
            AxisEdit::SetValue { axis, slot, value } => {
                edited.axis_mut(axis)?.set_value(slot, value)?
            }
        }
        self.recompute(&mut edited)?;
        *map = edited;
        Ok(())
    }

    fn cell(&self, map: &Map, x: usize, y: usize) -> Result<f64> {
        let spec = map.map_type().spec();
        let x_axis = map.x_axis();
        let x_value = x_axis.values()[x];
        let y_value = map.y_axis().map(|axis| (axis.axis_type(), axis.values()[y]));

        let unscaled = match spec.formula {
            Formula::Correction(curve) => {
                let input = CorrectionInput {
                    preset: &self.preset,
                    dead_time_ms: self.vehicle.injector_dead_time_ms,
                    dead_time_curve: self.context.curves.dead_time_by_voltage.as_ref(),
                };
                curves::correction(curve, x_value, &input)?
            }
            Formula::InjectorTime => {
                let point = self.operating_point(x_axis.axis_type(), x_value, y_value);
                if y_value.is_some() && !self.vehicle.has_boost() {
                    self.scaled_injector_time(point, map.bank())?
                } else {
                    self.injector_time(point, map.bank())?
                }
            }
            Formula::SparkAdvance => {
                let point = self.operating_point(x_axis.axis_type(), x_value, y_value);
                curves::spark_advance(
                    &self.preset,
                    self.vehicle.fuel_type,
                    point.rpm,
                    point.load_kpa,
                    self.baro(),
                )?
            }
            Formula::TargetLambda => {
                let point = self.operating_point(x_axis.axis_type(), x_value, y_value);
                self.target_lambda(point)?
            }
        };

        let unscaled = ensure_finite(unscaled, map.map_type().as_ref())?;
        let bounded = self.apply_safety(unscaled)?;
        let (min, max) = map.domain();
        Ok(bounded.clamp(min, max))
    }

    /// Scale by the safety factor, keeping within the envelope of the unscaled value
    fn apply_safety(&self, unscaled: f64) -> Result<f64> {
        let envelope = self.context.settings.safety_envelope * unscaled.abs();
        let scaled = ensure_finite(unscaled * self.safety_factor, "scaled value")?;
        Ok(scaled.clamp(unscaled - envelope, unscaled + envelope))
    }

    fn operating_point(
        &self,
        x_type: AxisType,
        x_value: f64,
        y: Option<(AxisType, f64)>,
    ) -> OperatingPoint {
        let mut point = OperatingPoint {
            rpm: REFERENCE_RPM,
            load_kpa: self.baro(),
        };
        for (axis_type, value) in std::iter::once((x_type, x_value)).chain(y) {
            match axis_type {
                AxisType::Rpm => point.rpm = value,
                AxisType::Map => point.load_kpa = value,
                AxisType::Tps => point.load_kpa = physics::tps_to_kpa(value, self.baro()),
                AxisType::EngineTemp | AxisType::AirTemp | AxisType::Voltage => {}
            }
        }
        point
    }

    fn target_lambda(&self, point: OperatingPoint) -> Result<f64> {
        self.preset
            .target_lambda(point.rpm, point.load_kpa, self.baro())
    }

    /// VE as a fraction at an operating point
    fn volumetric_efficiency(&self, point: OperatingPoint) -> Result<f64> {
        let by_rpm = self.context.curves.ve_by_rpm.interpolate(point.rpm)?;
        let by_load = curves::ve_load_factor(point.load_kpa)?;
        ensure_finite(by_rpm / 100.0 * by_load, "volumetric efficiency")
    }

    /// Injector open time from first principles
    fn injector_time(&self, point: OperatingPoint, bank: Bank) -> Result<f64> {
        let settings = &self.context.settings;
        let fuel = self.vehicle.fuel_type;
        if point.load_kpa <= 0.0 {
            return Err(MapError::Range(format!(
                "load {} kPa is not an absolute pressure",
                point.load_kpa
            )));
        }

        let ambient_k = celsius_to_kelvin(settings.ambient_temp_c);
        let charge_k = physics::charge_temperature_k(ambient_k, point.load_kpa, settings.baro_kpa)?;
        let density = physics::air_density(point.load_kpa, charge_k)?;
        let ve = self.volumetric_efficiency(point)?;
        let air_g =
            physics::air_mass_per_event_g(density, self.vehicle.cylinder_volume_cc(), ve)?;

        let afr = self.target_lambda(point)? * fuel.stoich_afr();
        let fuel_g = physics::fuel_mass_g(air_g, afr)?;
        let flow = physics::effective_flow_cc_per_ms(
            self.vehicle.injector_flow_for(bank),
            settings.rated_fuel_pressure_kpa,
            self.vehicle.fuel_regulation,
            point.load_kpa,
            settings.baro_kpa,
        )?;
        physics::injector_time_ms(fuel_g, fuel.density_g_per_cc(), flow)
    }

    /// Reference curve at barometric load, scaled by the cell's load factor.
    ///
    /// Only used without boost, where charge temperature equals ambient.
    fn scaled_injector_time(&self, point: OperatingPoint, bank: Bank) -> Result<f64> {
        let baro = self.baro();
        let reference_point = OperatingPoint {
            rpm: point.rpm,
            load_kpa: baro,
        };
        let reference = self.injector_time(reference_point, bank)?;

        let pressure = point.load_kpa / baro;
        let ve = curves::ve_load_factor(point.load_kpa)? / curves::ve_load_factor(baro)?;
        let lambda = self.target_lambda(reference_point)? / self.target_lambda(point)?;
        let flow = physics::effective_flow_cc_per_ms(
            1.0,
            self.context.settings.rated_fuel_pressure_kpa,
            self.vehicle.fuel_regulation,
            baro,
            baro,
        )? / physics::effective_flow_cc_per_ms(
            1.0,
            self.context.settings.rated_fuel_pressure_kpa,
            self.vehicle.fuel_regulation,
            point.load_kpa,
            baro,
        )?;
        ensure_finite(reference * pressure * ve * lambda * flow, "injector time")
    }
}

/// New map with default axes and values computed by `calculator`
pub fn initial_map(
    calculator: &MapCalculator,
    vehicle_id: &str,
    map_type: MapType,
    bank: Bank,
) -> Result<Map> {
    let mut map = Map::new(vehicle_id, map_type, bank, calculator.strategy());
    calculator.recompute(&mut map)?;
    tracing::info!(%vehicle_id, %map_type, %bank, "configured new map");
    Ok(map)
}
