//! Tuning strategy presets and zone targets.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::axis::interpolate::piecewise;
use crate::error::Result;

/// Named tuning strategy
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
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

/// Target lambda per load zone
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoneTargets {
    pub idle: f64,
    pub cruise: f64,
    pub power: f64,
    pub wot: f64,
    pub boost: f64,
}

/// Numeric content of a strategy
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrategyPreset {
    pub lambda: ZoneTargets,
    /// Throttle enrichment at full throttle, %
    pub wot_enrichment_pct: f64,
    /// Warm-up enrichment at -40 °C, %
    pub cold_enrichment_pct: f64,
    /// Heat-protection enrichment at 110 °C coolant, %
    pub hot_enrichment_pct: f64,
    /// Extra enrichment at 80 °C intake air, %
    pub hot_air_bias_pct: f64,
    /// Fuel trim at idle speed, %
    pub idle_rpm_trim_pct: f64,
    /// Fuel trim at 8000 rpm, %
    pub high_rpm_trim_pct: f64,
    /// Spark advance offset, degrees
    pub ignition_offset_deg: f64,
    /// Spark retard per 10 kPa of boost, degrees
    pub boost_retard_deg: f64,
}

impl Strategy {
    pub fn preset(&self) -> StrategyPreset {
        match self {
            Strategy::Conservative => StrategyPreset {
                lambda: ZoneTargets {
                    idle: 0.95,
                    cruise: 0.98,
                    power: 0.88,
                    wot: 0.82,
                    boost: 0.76,
                },
                wot_enrichment_pct: 10.0,
                cold_enrichment_pct: 60.0,
                hot_enrichment_pct: 6.0,
                hot_air_bias_pct: 4.0,
                idle_rpm_trim_pct: 4.0,
                high_rpm_trim_pct: 6.0,
                ignition_offset_deg: -2.0,
                boost_retard_deg: 2.0,
            },
            Strategy::Balanced => StrategyPreset {
                lambda: ZoneTargets {
                    idle: 0.98,
                    cruise: 1.0,
                    power: 0.9,
                    wot: 0.85,
                    boost: 0.79,
                },
                wot_enrichment_pct: 7.0,
                cold_enrichment_pct: 45.0,
                hot_enrichment_pct: 4.0,
                hot_air_bias_pct: 2.5,
                idle_rpm_trim_pct: 2.0,
                high_rpm_trim_pct: 4.0,
                ignition_offset_deg: 0.0,
                boost_retard_deg: 1.5,
            },
            Strategy::Aggressive => StrategyPreset {
                lambda: ZoneTargets {
                    idle: 1.0,
                    cruise: 1.03,
                    power: 0.92,
                    wot: 0.87,
                    boost: 0.82,
                },
                wot_enrichment_pct: 4.0,
                cold_enrichment_pct: 35.0,
                hot_enrichment_pct: 2.0,
                hot_air_bias_pct: 1.0,
                idle_rpm_trim_pct: 1.0,
                high_rpm_trim_pct: 2.0,
                ignition_offset_deg: 2.0,
                boost_retard_deg: 1.0,
            },
        }
    }
}

impl StrategyPreset {
    /// Target lambda with linear transitions between zones.
    ///
    /// The load curve runs cruise → power → WOT → boost over the manifold
    /// pressure ratio; below 1500 rpm at light load it blends toward the idle target.
    pub fn target_lambda(&self, rpm: f64, load_kpa: f64, baro_kpa: f64) -> Result<f64> {
        let z = &self.lambda;
        let ratio = load_kpa / baro_kpa;
        let load_curve = [
            (0.55, z.cruise),
            (0.75, z.power),
            (0.95, z.wot),
            (1.05, z.wot),
            (2.0, z.boost),
        ];
        let base = piecewise(&load_curve, ratio)?;

        let idle_by_rpm = piecewise(&[(1000.0, 1.0), (1500.0, 0.0)], rpm)?;
        let idle_by_load = piecewise(&[(0.4, 1.0), (0.5, 0.0)], ratio)?;
        let w = idle_by_rpm * idle_by_load;
        Ok(base * (1.0 - w) + z.idle * w)
    }
}
