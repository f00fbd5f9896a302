//! Zone-shaped curves: 1-D corrections, spark advance and the default VE model.

use crate::axis::interpolate::piecewise;
use crate::axis::{Axis, AxisType};
use crate::error::{MapError, Result};
use crate::maps::CorrectionCurve;
use crate::units::celsius_to_kelvin;

use super::strategy::StrategyPreset;
use super::vehicle::FuelType;

/// Nominal system voltage injector dead time is rated at
pub const NOMINAL_VOLTAGE: f64 = 13.5;

/// Air temperature the base map is calibrated at, °C
pub const REFERENCE_AIR_TEMP_C: f64 = 20.0;

/// Volumetric efficiency by engine speed, in percent
const DEFAULT_VE_BY_RPM: [(f64, f64); 6] = [
    (250.0, 55.0),
    (1000.0, 68.0),
    (2500.0, 85.0),
    (4500.0, 95.0),
    (6000.0, 92.0),
    (8000.0, 80.0),
];

/// Relative VE change with manifold pressure
const VE_LOAD_FACTOR: [(f64, f64); 4] = [(20.0, 0.80), (60.0, 0.92), (100.0, 1.0), (300.0, 1.02)];

/// Default VE-by-rpm compensation curve on a fully enabled rpm axis
pub fn default_ve_curve() -> Result<Axis> {
    let mut axis = Axis::standard(AxisType::Rpm);
    for slot in 0..axis.capacity() {
        let rpm = axis.position(slot).unwrap_or_default();
        axis.set_value(slot, piecewise(&DEFAULT_VE_BY_RPM, rpm)?)?;
        axis.set_enabled(slot, true)?;
    }
    Ok(axis)
}

/// VE multiplier for manifold pressure
pub fn ve_load_factor(load_kpa: f64) -> Result<f64> {
    piecewise(&VE_LOAD_FACTOR, load_kpa)
}

/// Evaluation input for a 1-D correction
#[derive(Clone, Copy, Debug)]
pub struct CorrectionInput<'a> {
    pub preset: &'a StrategyPreset,
    pub dead_time_ms: f64,
    pub dead_time_curve: Option<&'a Axis>,
}

/// Correction value at breakpoint `x` (percent, or ms for dead time)
pub fn correction(curve: CorrectionCurve, x: f64, input: &CorrectionInput<'_>) -> Result<f64> {
    let p = input.preset;
    match curve {
        // idle 0-2%, cruise to 30%, power to 75%, WOT beyond
        CorrectionCurve::Throttle => piecewise(
            &[
                (0.0, 0.0),
                (2.0, 0.0),
                (30.0, 0.0),
                (75.0, p.wot_enrichment_pct * 0.5),
                (100.0, p.wot_enrichment_pct),
            ],
            x,
        ),
        CorrectionCurve::Warmup => piecewise(
            &[
                (-40.0, p.cold_enrichment_pct),
                (0.0, p.cold_enrichment_pct * 0.55),
                (40.0, p.cold_enrichment_pct * 0.2),
                (70.0, 0.0),
                (100.0, 0.0),
                (110.0, p.hot_enrichment_pct),
            ],
            x,
        ),
        CorrectionCurve::AirDensity => {
            let temp_k = celsius_to_kelvin(x);
            if temp_k <= 0.0 {
                return Err(MapError::Range(format!("air temperature {} °C", x)));
            }
            let density = (celsius_to_kelvin(REFERENCE_AIR_TEMP_C) / temp_k - 1.0) * 100.0;
            let bias = piecewise(&[(40.0, 0.0), (80.0, p.hot_air_bias_pct)], x)?;
            Ok(density + bias)
        }
        CorrectionCurve::DeadTime => {
            if let Some(curve) = input.dead_time_curve {
                return curve.interpolate(x);
            }
            if x <= 0.0 {
                return Err(MapError::Range(format!("supply voltage {} V", x)));
            }
            Ok(input.dead_time_ms * (NOMINAL_VOLTAGE / x).powf(1.5))
        }
        CorrectionCurve::EngineSpeed => piecewise(
            &[
                (500.0, p.idle_rpm_trim_pct),
                (1200.0, 0.0),
                (5000.0, 0.0),
                (8000.0, p.high_rpm_trim_pct),
            ],
            x,
        ),
    }
}

/// Spark advance in degrees BTDC
pub fn spark_advance(
    preset: &StrategyPreset,
    fuel: FuelType,
    rpm: f64,
    load_kpa: f64,
    baro_kpa: f64,
) -> Result<f64> {
    let by_rpm = piecewise(
        &[
            (500.0, 10.0),
            (1000.0, 12.0),
            (2000.0, 24.0),
            (3000.0, 30.0),
            (4000.0, 34.0),
            (6000.0, 36.0),
        ],
        rpm,
    )?;
    let ratio = load_kpa / baro_kpa;
    let by_load = piecewise(&[(0.2, 8.0), (0.5, 4.0), (0.8, 0.0), (1.0, -2.0)], ratio)?;
    let boost_kpa = (load_kpa - baro_kpa).max(0.0);
    let retard = boost_kpa / 10.0 * preset.boost_retard_deg;
    Ok(by_rpm + by_load - retard + fuel.knock_margin_deg() + preset.ignition_offset_deg)
}
