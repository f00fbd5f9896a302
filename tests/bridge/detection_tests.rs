//! Tests for exchange format detection
//!
//! Tests cover:
//! - Tab, comma, hexadecimal and binary-text layouts
//! - Header rows
//! - Confidence ranking and ambiguity
//! - Input size guard

use ultramap::bridge::FormatBridge;
use ultramap::settings::BridgeSettings;
use ultramap::{ErrorKind, FormatKind, MapError};

// ============================================
// Layout Detection Tests
// ============================================

#[test]
fn test_tab_separated_example() {
    let bridge = FormatBridge::default();
    let detection = bridge
        .detect_format("0.85\t0.86\t0.87\n0.84\t0.85\t0.86")
        .unwrap();
    assert_eq!(detection.best.spec.kind, FormatKind::TabSeparated);
    assert_eq!(detection.best.spec.dimensions, (2, 3));
    assert_eq!(detection.best.spec.separator, '\t');
    assert!(detection.best.confidence > 0.9);
}

#[test]
fn test_comma_separated_with_windows_newlines() {
    let bridge = FormatBridge::default();
    let text = "1.10,1.20,1.30,1.40\r\n2.10,2.20,2.30,2.40\r\n";
    let spec = bridge.detect_format(text).unwrap().best.spec;
    assert_eq!(spec.kind, FormatKind::CommaSeparated);
    assert_eq!(spec.dimensions, (2, 4));
    assert_eq!(spec.decimal_places, 2);
}

#[test]
fn test_hexadecimal_cells() {
    let bridge = FormatBridge::default();
    let text = "0x352\t0x35C\n0x348\t0x352\n";
    let spec = bridge.detect_format(text).unwrap().best.spec;
    assert_eq!(spec.kind, FormatKind::Hexadecimal);
    assert_eq!(spec.decimal_places, 3);
}

#[test]
fn test_binary_text_cells() {
    let bridge = FormatBridge::default();
    let text = "0b101,0b110\n0b111,-0b1\n";
    let spec = bridge.detect_format(text).unwrap().best.spec;
    assert_eq!(spec.kind, FormatKind::BinaryText);
    assert_eq!(spec.separator, ',');
}

#[test]
fn test_header_row_detected() {
    let bridge = FormatBridge::default();
    let text = "500rpm\t1000rpm\t1500rpm\n2.1\t2.4\t2.9\n";
    let spec = bridge.detect_format(text).unwrap().best.spec;
    assert!(spec.has_headers);
    assert_eq!(spec.dimensions, (1, 3));
}

#[test]
fn test_single_column() {
    let bridge = FormatBridge::default();
    let detection = bridge.detect_format("1.0\n1.5\n2.0\n").unwrap();
    assert_eq!(detection.best.spec.dimensions, (3, 1));
    assert!(detection.best.confidence >= 0.5);
}

// ============================================
// Ranking and Ambiguity Tests
// ============================================

#[test]
fn test_alternates_ranked() {
    let bridge = FormatBridge::default();
    let detection = bridge.detect_format("1,2,3\n4,5,6\n").unwrap();
    assert_eq!(detection.best.spec.kind, FormatKind::CommaSeparated);
    assert!(detection
        .alternates
        .windows(2)
        .all(|w| w[0].confidence >= w[1].confidence));
    assert!(detection
        .alternates
        .iter()
        .all(|c| c.confidence <= detection.best.confidence));
}

#[test]
fn test_mostly_text_is_ambiguous() {
    let bridge = FormatBridge::default();
    let err = bridge
        .detect_format("fuel table\nsee attached\nthanks")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousFormat);
}

#[test]
fn test_empty_input_is_ambiguous() {
    let bridge = FormatBridge::default();
    assert!(matches!(
        bridge.detect_format("\n\n"),
        Err(MapError::AmbiguousFormat { .. })
    ));
}

#[test]
fn test_threshold_is_configurable() {
    let strict = FormatBridge::new(BridgeSettings {
        min_confidence: 0.95,
        ..BridgeSettings::default()
    });
    // Ragged rows lower column consistency
    let text = "1,2,3\n4,5\n6,7,8\n9,10\n";
    assert!(strict.detect_format(text).is_err());
    assert!(FormatBridge::default().detect_format(text).is_ok());
}

// ============================================
// Guard Tests
// ============================================

#[test]
fn test_oversized_input_rejected() {
    let bridge = FormatBridge::new(BridgeSettings {
        max_input_bytes: 16,
        ..BridgeSettings::default()
    });
    let err = bridge
        .detect_format("1.0,2.0,3.0,4.0,5.0,6.0\n")
        .unwrap_err();
    assert!(matches!(
        err,
        MapError::InputTooLarge {
            what: "input bytes",
            limit: 16,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_too_many_lines_rejected() {
    let bridge = FormatBridge::default();
    let text = "1\n".repeat(600);
    assert!(matches!(
        bridge.detect_format(&text),
        Err(MapError::InputTooLarge { what: "line count", .. })
    ));
}
