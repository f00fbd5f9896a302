//! Speed-density fuelling physics.
//!
//! Air mass per intake event is derived from the ideal gas law:
//!
//! m_air = ρ × V_cyl × VE, with ρ = P / (R × T)
//!
//! Required fuel follows from the target AFR, and injector open time from the
//! effective injector flow at the current rail-to-manifold pressure difference.

use crate::error::{ensure_finite, MapError, Result};

use super::vehicle::FuelPressureRegulation;

/// Specific gas constant of dry air, J/(kg·K)
pub const R_AIR: f64 = 287.05;

/// Compressor adiabatic efficiency assumed for boosted charge temperature
const COMPRESSOR_EFFICIENCY: f64 = 0.70;

/// Fraction of compressor heat removed by the intercooler
const INTERCOOLER_EFFECTIVENESS: f64 = 0.70;

/// Air density in kg/m³ at `pressure_kpa` absolute and `temp_k`
pub fn air_density(pressure_kpa: f64, temp_k: f64) -> Result<f64> {
    if temp_k <= 0.0 {
        return Err(MapError::Range(format!(
            "charge temperature {} K is not physical",
            temp_k
        )));
    }
    ensure_finite(pressure_kpa * 1000.0 / (R_AIR * temp_k), "air density")
}

/// Intake charge temperature after compression and intercooling.
///
/// At or below barometric pressure the charge is at ambient temperature.
pub fn charge_temperature_k(ambient_k: f64, manifold_kpa: f64, baro_kpa: f64) -> Result<f64> {
    if manifold_kpa <= baro_kpa {
        return Ok(ambient_k);
    }
    let pressure_ratio = manifold_kpa / baro_kpa;
    let rise = ambient_k * (pressure_ratio.powf(0.2857) - 1.0) / COMPRESSOR_EFFICIENCY;
    ensure_finite(
        ambient_k + rise * (1.0 - INTERCOOLER_EFFECTIVENESS),
        "charge temperature",
    )
}

/// Air mass per intake event in grams
pub fn air_mass_per_event_g(density_kg_m3: f64, cylinder_cc: f64, ve_fraction: f64) -> Result<f64> {
    // cc → m³ is 1e-6, kg → g is 1e3
    ensure_finite(
        density_kg_m3 * cylinder_cc * 1e-6 * ve_fraction * 1000.0,
        "air mass",
    )
}

/// Fuel mass in grams for a given air mass and air-fuel ratio
pub fn fuel_mass_g(air_mass_g: f64, afr: f64) -> Result<f64> {
    ensure_finite(air_mass_g / afr, "fuel mass")
}

/// Effective injector flow in cc/ms.
///
/// Flow scales with the square root of the pressure difference across the
/// injector relative to the rated pressure.
pub fn effective_flow_cc_per_ms(
    rated_cc_per_min: f64,
    rated_pressure_kpa: f64,
    regulation: FuelPressureRegulation,
    manifold_kpa: f64,
    baro_kpa: f64,
) -> Result<f64> {
    let differential = match regulation {
        FuelPressureRegulation::ManifoldReferenced => rated_pressure_kpa,
        FuelPressureRegulation::Fixed => rated_pressure_kpa - (manifold_kpa - baro_kpa),
    };
    if differential <= 0.0 {
        return Err(MapError::Range(format!(
            "manifold pressure {} kPa exceeds fuel rail pressure",
            manifold_kpa
        )));
    }
    let ratio = differential / rated_pressure_kpa;
    ensure_finite(rated_cc_per_min / 60_000.0 * ratio.sqrt(), "injector flow")
}

/// Injector open time in ms to deliver `fuel_mass_g`
pub fn injector_time_ms(fuel_mass_g: f64, density_g_per_cc: f64, flow_cc_per_ms: f64) -> Result<f64> {
    let volume_cc = fuel_mass_g / density_g_per_cc;
    ensure_finite(volume_cc / flow_cc_per_ms, "injector time")
}

/// Estimated manifold pressure for an alpha-N (throttle) load axis
pub fn tps_to_kpa(tps_pct: f64, baro_kpa: f64) -> f64 {
    const CLOSED_THROTTLE_KPA: f64 = 30.0;
    let t = (tps_pct / 100.0).clamp(0.0, 1.0);
    CLOSED_THROTTLE_KPA + (baro_kpa - CLOSED_THROTTLE_KPA) * (1.0 - (1.0 - t).powi(2))
}
