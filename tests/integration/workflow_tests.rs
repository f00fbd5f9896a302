//! End-to-end tuning workflow tests
//!
//! Tests cover:
//! - Configure, compute, save, export, edit, import and roll back
//! - Strategy changes recorded in history
//! - Persistence document round trips

use ultramap::bridge::{MemoryClipboard, TextFile, TextIo};
use ultramap::calculator::initial_map;
use ultramap::snapshot::SnapshotStore;
use ultramap::{Bank, FormatBridge, FormatKind, Map, MapType, Strategy};

use crate::common::{self, calculator, turbo_vehicle};

#[test]
fn test_full_tuning_cycle() -> anyhow::Result<()> {
    common::init_tracing();
    let calc = calculator(turbo_vehicle(), Strategy::Balanced, 1.0);
    let store = SnapshotStore::in_memory();
    let bridge = FormatBridge::default();

    let mut map = initial_map(&calc, "mini-1275", MapType::Ignition, Bank::None)?;
    store.commit(&mut map, "initial")?;

    // Export to the clipboard, nudge every cell up by one degree, paste back
    let spec = bridge
        .spec_for(&map, FormatKind::TabSeparated)
        .with_headers(true);
    let mut clipboard = MemoryClipboard::new();
    clipboard.write_text(&bridge.serialize(&map, &spec)?)?;

    let pasted = clipboard.read_text()?;
    let mut grid_text = Vec::new();
    for (i, line) in pasted.lines().enumerate() {
        if i == 0 {
            grid_text.push(line.to_string());
            continue;
        }
        let bumped: Vec<String> = line
            .split('\t')
            .map(|t| format!("{:.3}", t.parse::<f64>().unwrap() + 1.0))
            .collect();
        grid_text.push(bumped.join("\t"));
    }
    let before = map.active_grid()?;
    bridge.import(&mut map, &grid_text.join("\n"))?;
    store.commit(&mut map, "advance +1")?;

    let diff = store.diff(map.id(), 1, 2)?;
    assert_eq!(diff.cells.len(), before.rows() * before.cols());
    assert!((diff.max_abs_change() - 1.0).abs() < 1e-3);

    let rolled = store.rollback(map.id(), 1)?;
    assert_eq!(rolled.version, 3);
    assert!(rolled.active_grid()?.approx_eq(&before, 1e-12));
    Ok(())
}

#[test]
fn test_strategy_change_is_versioned() -> anyhow::Result<()> {
    let store = SnapshotStore::in_memory();
    let balanced = calculator(turbo_vehicle(), Strategy::Balanced, 1.0);
    let aggressive = calculator(turbo_vehicle(), Strategy::Aggressive, 1.0);

    let mut map = initial_map(&balanced, "veh", MapType::LambdaTarget, Bank::None)?;
    store.commit(&mut map, "balanced")?;
    aggressive.recompute(&mut map)?;
    assert_eq!(map.strategy(), Strategy::Aggressive);
    store.commit(&mut map, "aggressive")?;

    let diff = store.diff(map.id(), 1, 2)?;
    assert_eq!(diff.strategy, Some((Strategy::Balanced, Strategy::Aggressive)));
    // Aggressive targets are leaner everywhere
    assert!(diff
        .cells
        .iter()
        .all(|c| c.change().is_some_and(|d| d > 0.0)));
    Ok(())
}

#[test]
fn test_map_document_roundtrip() -> anyhow::Result<()> {
    let calc = calculator(turbo_vehicle(), Strategy::Conservative, 1.0);
    let map = initial_map(&calc, "veh", MapType::MainFuel, Bank::B)?;
    let json = map.to_json()?;

    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["map_type"], "main-fuel");
    assert_eq!(value["bank"], "b");
    assert_eq!(value["dimensions"], "2d");
    assert_eq!(value["axes"][0]["type"], "rpm");
    assert_eq!(value["axes"][0]["capacity"], 32);
    assert_eq!(value["values"].as_array().map(Vec::len), Some(640));

    let back = Map::from_json(&json)?;
    assert_eq!(back, map);
    Ok(())
}

#[test]
fn test_text_file_exchange() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let calc = calculator(turbo_vehicle(), Strategy::Balanced, 1.0);
    let bridge = FormatBridge::default();
    let mut map = initial_map(&calc, "veh", MapType::EngineTempCorrection, Bank::None)?;

    let mut file = TextFile::new(dir.path().join("warmup.csv"));
    let spec = bridge.spec_for(&map, FormatKind::CommaSeparated);
    file.write_text(&bridge.serialize(&map, &spec)?)?;

    let expected = map.active_grid()?;
    let detected = bridge.import(&mut map, &file.read_text()?)?;
    assert_eq!(detected.kind, FormatKind::CommaSeparated);
    assert!(map.active_grid()?.approx_eq(&expected, 1e-3));
    Ok(())
}
