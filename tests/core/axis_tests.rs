//! Tests for the fixed-capacity axis store
//!
//! Tests cover:
//! - Sparse interpolation and flat extrapolation
//! - Enable/disable without reordering
//! - Standard template capacities and default masks
//! - Randomized interpolation properties

use proptest::prelude::*;
use strum::IntoEnumIterator;
use ultramap::axis::interpolate::lerp;
use ultramap::axis::{Axis, AxisTemplate, AxisType};
use ultramap::{ErrorKind, MapError};

fn example_axis() -> Axis {
    let template = AxisTemplate::custom(
        AxisType::Voltage,
        vec![0.0, 10.0, 20.0, 60.0, 70.0, 80.0, 90.0, 100.0],
    )
    .unwrap();
    let mut axis = Axis::new(template);
    for (slot, value) in [(1, 10.0), (2, 20.0), (3, 50.0), (4, 60.0)] {
        axis.set_value(slot, value).unwrap();
        axis.set_enabled(slot, true).unwrap();
    }
    axis
}

// ============================================
// Interpolation Tests
// ============================================

#[test]
fn test_example_axis_interpolation() {
    let axis = example_axis();
    assert_eq!(
        axis.active_points(),
        vec![(10.0, 10.0), (20.0, 20.0), (60.0, 50.0), (70.0, 60.0)]
    );
    assert!((axis.interpolate(15.0).unwrap() - 15.0).abs() < 1e-12);
    assert_eq!(axis.interpolate(5.0).unwrap(), 10.0);
    assert!((axis.interpolate(65.0).unwrap() - 55.0).abs() < 1e-12);
}

#[test]
fn test_exact_breakpoint_returns_value() {
    let axis = example_axis();
    assert_eq!(axis.interpolate(60.0).unwrap(), 50.0);
    assert_eq!(axis.interpolate(70.0).unwrap(), 60.0);
}

#[test]
fn test_nan_query_is_range_error() {
    let err = example_axis().interpolate(f64::NAN).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn test_disable_all_is_configuration_error() {
    let mut axis = example_axis();
    for slot in 0..axis.capacity() {
        axis.set_enabled(slot, false).unwrap();
    }
    assert!(matches!(
        axis.interpolate(10.0),
        Err(MapError::Configuration(_))
    ));
    assert_eq!(axis.capacity(), 8);
}

// ============================================
// Template Tests
// ============================================

#[test]
fn test_standard_capacities() {
    for axis_type in AxisType::iter() {
        let axis = Axis::standard(axis_type);
        assert_eq!(axis.capacity(), axis_type.capacity(), "{}", axis_type);
        assert!(axis.active_count() >= 2, "{}", axis_type);
    }
    assert_eq!(AxisType::Rpm.capacity(), 32);
    assert_eq!(AxisType::Map.capacity(), 20);
    assert_eq!(AxisType::EngineTemp.capacity(), 16);
    assert_eq!(AxisType::Tps.capacity(), 16);
    assert_eq!(AxisType::AirTemp.capacity(), 9);
    assert_eq!(AxisType::Voltage.capacity(), 8);
}

#[test]
fn test_custom_template_validation() {
    assert!(AxisTemplate::custom(AxisType::Tps, vec![1.0, 2.0, 3.0]).is_err());
    let not_increasing = vec![0.0, 1.0, 2.0, 2.0, 4.0, 5.0, 6.0, 7.0];
    assert!(AxisTemplate::custom(AxisType::Voltage, not_increasing).is_err());
    // Eight positions fit a voltage axis but not a throttle axis
    let eight: Vec<f64> = (0..8).map(f64::from).collect();
    assert!(AxisTemplate::custom(AxisType::Voltage, eight.clone()).is_ok());
    assert_eq!(
        AxisTemplate::custom(AxisType::Tps, eight).unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[test]
fn test_axis_json_roundtrip() {
    let axis = example_axis();
    let json = serde_json::to_string(&axis).unwrap();
    let back: Axis = serde_json::from_str(&json).unwrap();
    assert_eq!(back.active_points(), axis.active_points());
    assert_eq!(back.enabled_mask(), axis.enabled_mask());
}

// ============================================
// Property Tests
// ============================================

fn random_axis(steps: &[f64], values: &[f64], mask: &[bool]) -> Axis {
    let mut position = 0.0;
    let positions: Vec<f64> = steps
        .iter()
        .map(|s| {
            position += s;
            position
        })
        .collect();
    let mut axis = Axis::new(AxisTemplate::custom(AxisType::Voltage, positions).unwrap());
    for slot in 0..axis.capacity() {
        axis.set_value(slot, values[slot]).unwrap();
        axis.set_enabled(slot, mask[slot]).unwrap();
    }
    axis
}

proptest! {
    #[test]
    fn prop_interpolation_is_linear_blend_inside(
        steps in prop::collection::vec(0.5f64..50.0, 8),
        values in prop::collection::vec(-100.0f64..100.0, 8),
        mask in prop::collection::vec(any::<bool>(), 8),
        t in 0.0f64..1.0,
    ) {
        prop_assume!(mask.iter().filter(|&&m| m).count() >= 2);
        let axis = random_axis(&steps, &values, &mask);
        let points = axis.active_points();
        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let x = x0 + t * (x1 - x0);
            let expected = lerp(x0, y0, x1, y1, x);
            let actual = axis.interpolate(x).unwrap();
            prop_assert!((actual - expected).abs() < 1e-9, "{} vs {}", actual, expected);
        }
    }

    #[test]
    fn prop_interpolation_is_flat_outside(
        steps in prop::collection::vec(0.5f64..50.0, 8),
        values in prop::collection::vec(-100.0f64..100.0, 8),
        mask in prop::collection::vec(any::<bool>(), 8),
        beyond in 0.0f64..1000.0,
    ) {
        prop_assume!(mask.iter().any(|&m| m));
        let axis = random_axis(&steps, &values, &mask);
        let points = axis.active_points();
        let first = points[0];
        let last = points[points.len() - 1];
        prop_assert_eq!(axis.interpolate(first.0 - beyond).unwrap(), first.1);
        prop_assert_eq!(axis.interpolate(last.0 + beyond).unwrap(), last.1);
    }

    #[test]
    fn prop_toggling_never_reorders(
        mask in prop::collection::vec(any::<bool>(), 16),
    ) {
        let mut axis = Axis::standard(AxisType::Tps);
        for (slot, &enabled) in mask.iter().enumerate() {
            axis.set_enabled(slot, enabled).unwrap();
        }
        let positions: Vec<f64> = axis.active_points().iter().map(|p| p.0).collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(axis.capacity(), 16);
    }
}
