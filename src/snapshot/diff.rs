//! Differences between two map states.

use crate::axis::{Axis, Slot};
use crate::calculator::strategy::Strategy;
use crate::maps::{AxisRole, MapState};

/// One changed cell; `None` means the cell is inactive on that side
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellDelta {
    pub x: usize,
    pub y: usize,
    pub before: Option<f64>,
    pub after: Option<f64>,
}

impl CellDelta {
    /// `after - before` when both sides hold a value
    pub fn change(&self) -> Option<f64> {
        Some(self.after? - self.before?)
    }
}

/// One changed axis slot
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisDelta {
    pub role: AxisRole,
    pub slot: usize,
    pub before: Option<Slot>,
    pub after: Option<Slot>,
}

/// Changes from snapshot `from_version` to `to_version`
#[derive(Clone, Debug, PartialEq)]
pub struct MapDiff {
    pub from_version: u64,
    pub to_version: u64,
    pub cells: Vec<CellDelta>,
    pub axes: Vec<AxisDelta>,
    pub strategy: Option<(Strategy, Strategy)>,
}

impl MapDiff {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.axes.is_empty() && self.strategy.is_none()
    }

    /// Largest absolute change over cells populated on both sides
    pub fn max_abs_change(&self) -> f64 {
        self.cells
            .iter()
            .filter_map(CellDelta::change)
            .fold(0.0, |acc, d| acc.max(d.abs()))
    }
}

fn axis_deltas(role: AxisRole, before: Option<&Axis>, after: Option<&Axis>) -> Vec<AxisDelta> {
    let cap = before
        .map_or(0, Axis::capacity)
        .max(after.map_or(0, Axis::capacity));
    (0..cap)
        .filter_map(|slot| {
            let b = before.and_then(|a| a.slot(slot));
            let a = after.and_then(|a| a.slot(slot));
            (b != a).then_some(AxisDelta {
                role,
                slot,
                before: b,
                after: a,
            })
        })
        .collect()
}

fn dims(state: &MapState) -> (usize, usize) {
    let x = state.axes.first().map_or(0, Axis::capacity);
    let y = state.axes.get(1).map_or(1, Axis::capacity);
    (x, y)
}

fn cell(state: &MapState, x: usize, y: usize) -> Option<f64> {
    let (x_cap, y_cap) = dims(state);
    if x < x_cap && y < y_cap {
        state.values.get(y * x_cap + x).copied().flatten()
    } else {
        None
    }
}

/// Cell-level and axis-level comparison of two states
pub fn diff_states(from_version: u64, before: &MapState, to_version: u64, after: &MapState) -> MapDiff {
    let (bx, by) = dims(before);
    let (ax, ay) = dims(after);
    let mut cells = Vec::new();
    for y in 0..by.max(ay) {
        for x in 0..bx.max(ax) {
            let b = cell(before, x, y);
            let a = cell(after, x, y);
            if b != a {
                cells.push(CellDelta {
                    x,
                    y,
                    before: b,
                    after: a,
                });
            }
        }
    }

    let mut axes = axis_deltas(AxisRole::X, before.axes.first(), after.axes.first());
    axes.extend(axis_deltas(AxisRole::Y, before.axes.get(1), after.axes.get(1)));

    MapDiff {
        from_version,
        to_version,
        cells,
        axes,
        strategy: (before.strategy != after.strategy).then_some((before.strategy, after.strategy)),
    }
}
