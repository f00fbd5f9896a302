//! Tests for serialization round trips through the format bridge
//!
//! Tests cover:
//! - parse(serialize(map)) for every format kind and several map types
//! - Header labels
//! - Importing edited text back into a map
//! - Randomized grids for the scaled-integer encodings

use proptest::prelude::*;
use strum::IntoEnumIterator;
use ultramap::bridge::{FormatBridge, FormatSpec};
use ultramap::{FormatKind, Grid, MapError, MapType, Strategy};

use crate::common::{calculator, computed_map, na_vehicle};

const TOLERANCE: f64 = 1e-3;

// ============================================
// Map Round Trip Tests
// ============================================

#[test]
fn test_roundtrip_every_kind() {
    let bridge = FormatBridge::default();
    let calc = calculator(na_vehicle(), Strategy::Balanced, 1.0);
    for map_type in [
        MapType::MainFuel,
        MapType::Ignition,
        MapType::LambdaTarget,
        MapType::AirTempCorrection,
    ] {
        let map = computed_map(&calc, map_type);
        let expected = map.active_grid().unwrap();
        for kind in FormatKind::iter() {
            for headers in [false, true] {
                let spec = bridge.spec_for(&map, kind).with_headers(headers);
                let text = bridge.serialize(&map, &spec).unwrap();
                let parsed = bridge.parse(&text, &spec).unwrap();
                assert!(
                    parsed.approx_eq(&expected, TOLERANCE),
                    "{} {} headers={}",
                    map_type,
                    kind,
                    headers
                );
            }
        }
    }
}

#[test]
fn test_detection_recovers_serialized_layout() {
    let bridge = FormatBridge::default();
    let calc = calculator(na_vehicle(), Strategy::Conservative, 1.0);
    let map = computed_map(&calc, MapType::MainFuel);
    for kind in FormatKind::iter() {
        let spec = bridge.spec_for(&map, kind).with_headers(true);
        let text = bridge.serialize(&map, &spec).unwrap();
        let detected = bridge.detect_format(&text).unwrap().best.spec;
        assert_eq!(detected, spec, "{}", kind);
    }
}

#[test]
fn test_header_labels() {
    let bridge = FormatBridge::default();
    let calc = calculator(na_vehicle(), Strategy::Balanced, 1.0);
    let map = computed_map(&calc, MapType::MainFuel);
    let spec = bridge
        .spec_for(&map, FormatKind::CommaSeparated)
        .with_headers(true);
    let text = bridge.serialize(&map, &spec).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("500rpm,1000rpm,1500rpm"));
    assert_eq!(header.split(',').count(), 14);
    assert_eq!(text.lines().count(), 11);
}

#[test]
fn test_serialize_checks_shape() {
    let bridge = FormatBridge::default();
    let calc = calculator(na_vehicle(), Strategy::Balanced, 1.0);
    let map = computed_map(&calc, MapType::Ignition);
    let mut spec = bridge.spec_for(&map, FormatKind::TabSeparated);
    spec.dimensions = (3, 3);
    assert!(matches!(
        bridge.serialize(&map, &spec),
        Err(MapError::ShapeMismatch { .. })
    ));
}

// ============================================
// Import Tests
// ============================================

#[test]
fn test_import_edited_text() {
    let bridge = FormatBridge::default();
    let calc = calculator(na_vehicle(), Strategy::Balanced, 1.0);
    let mut map = computed_map(&calc, MapType::TpsCorrection);
    let spec = bridge.spec_for(&map, FormatKind::TabSeparated);
    let text = bridge.serialize(&map, &spec).unwrap();

    let edited = text.replacen("0.000", "5.000", 1);
    let detected = bridge.import(&mut map, &edited).unwrap();
    assert_eq!(detected.kind, FormatKind::TabSeparated);
    assert_eq!(map.get(0, 0), Some(5.0));
}

#[test]
fn test_import_rejects_wrong_shape() {
    let bridge = FormatBridge::default();
    let calc = calculator(na_vehicle(), Strategy::Balanced, 1.0);
    let mut map = computed_map(&calc, MapType::LambdaTarget);
    let before = map.clone();
    let err = bridge.import(&mut map, "0.85\t0.86\t0.87\n0.84\t0.85\t0.86").unwrap_err();
    assert!(matches!(err, MapError::ShapeMismatch { .. }));
    assert_eq!(map, before);
}

#[test]
fn test_import_rejects_out_of_domain() {
    let bridge = FormatBridge::default();
    let calc = calculator(na_vehicle(), Strategy::Balanced, 1.0);
    let mut map = computed_map(&calc, MapType::VoltageCorrection);
    let text = "9.0\t9.0\t9.0\t9.0\t9.0\t9.0\t9.0\t9.0\n";
    assert!(matches!(
        bridge.import(&mut map, text),
        Err(MapError::Range(_))
    ));
}

// ============================================
// Property Tests
// ============================================

proptest! {
    #[test]
    fn prop_scaled_integer_roundtrip(
        cells in prop::collection::vec(-500.0f64..500.0, 12),
        hex in any::<bool>(),
    ) {
        let bridge = FormatBridge::default();
        let grid = Grid::new(3, 4, cells).unwrap();
        let kind = if hex { FormatKind::Hexadecimal } else { FormatKind::BinaryText };
        let spec = FormatSpec {
            kind,
            dimensions: (3, 4),
            separator: kind.default_separator(),
            has_headers: false,
            decimal_places: 3,
        };
        let text = bridge.serialize_grid(&grid, &spec, None).unwrap();
        let parsed = bridge.parse(&text, &spec).unwrap();
        prop_assert!(parsed.approx_eq(&grid, TOLERANCE));
    }
}
