//! Common test utilities shared across all test modules
//!
//! This module provides tracing setup, reference vehicles and helpers for
//! building computed maps.

#![allow(dead_code)]

use std::sync::Once;

use ultramap::calculator::vehicle::{Aspiration, FuelPressureRegulation, FuelType};
use ultramap::units::PressureUnit;
use ultramap::{Bank, CalcContext, Map, MapCalculator, MapType, Strategy, VehicleParams};

static TRACING: Once = Once::new();

/// Install a test subscriber once; respects `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// 2.0 L naturally aspirated four cylinder with 440 cc/min injectors
pub fn na_vehicle() -> VehicleParams {
    VehicleParams::default()
}

/// 1.3 L turbo four with a fixed-pressure regulator
pub fn turbo_vehicle() -> VehicleParams {
    VehicleParams {
        displacement_cc: 1275.0,
        cylinders: 4,
        injector_flow_cc_min: 550.0,
        secondary_injector_flow_cc_min: Some(1000.0),
        fuel_type: FuelType::Gasoline,
        aspiration: Aspiration::turbocharged(1.0, PressureUnit::Bar),
        fuel_regulation: FuelPressureRegulation::Fixed,
        injector_dead_time_ms: 1.0,
    }
}

pub fn calculator(vehicle: VehicleParams, strategy: Strategy, safety_factor: f64) -> MapCalculator {
    MapCalculator::new(
        vehicle,
        strategy,
        safety_factor,
        CalcContext::standard().expect("standard context"),
    )
    .expect("valid calculator")
}

/// Fresh map of `map_type` with computed values
pub fn computed_map(calc: &MapCalculator, map_type: MapType) -> Map {
    let mut map = Map::new("test-vehicle", map_type, Bank::A, calc.strategy());
    calc.recompute(&mut map).expect("recompute");
    map
}

/// Absolute difference within tolerance
pub fn approx(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
