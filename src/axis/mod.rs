//! Fixed-capacity axis store.
//!
//! An [`Axis`] is a constant-size slot array with an enabled mask. Slot positions
//! come from an [`AxisTemplate`] and never move; only the mask and the slot values
//! change. Active slots therefore always appear in increasing position order.
//!
//! Map axes use the active slot values as calculation breakpoints. Compensation
//! curves use them as ordinates and are evaluated with [`Axis::interpolate`].

pub mod interpolate;
pub mod template;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, MapError, Result};

pub use template::{AxisTemplate, AxisType, SUPPORTED_CAPACITIES};

/// A single axis slot as seen by callers
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Slot {
    Inactive,
    Active { position: f64, value: f64 },
}

/// Sparse, fixed-capacity axis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AxisDocument", into = "AxisDocument")]
pub struct Axis {
    axis_type: AxisType,
    positions: Vec<f64>,
    enabled: Vec<bool>,
    values: Vec<f64>,
}

impl Axis {
    /// Create an axis from a template; slot values start at their positions
    pub fn new(template: AxisTemplate) -> Self {
        Self {
            axis_type: template.axis_type,
            values: template.positions.clone(),
            positions: template.positions,
            enabled: template.default_enabled,
        }
    }

    /// Axis with the standard template and default active points
    pub fn standard(axis_type: AxisType) -> Self {
        Self::new(axis_type.template())
    }

    pub fn axis_type(&self) -> AxisType {
        self.axis_type
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    fn check_slot(&self, slot: usize) -> Result<()> {
        if slot < self.capacity() {
            Ok(())
        } else {
            Err(MapError::Validation(format!(
                "slot {} out of range for {} axis with capacity {}",
                slot,
                self.axis_type,
                self.capacity()
            )))
        }
    }

    /// Enable or disable a slot. Slot order is unaffected.
    pub fn set_enabled(&mut self, slot: usize, enabled: bool) -> Result<()> {
        self.check_slot(slot)?;
        self.enabled[slot] = enabled;
        Ok(())
    }

    /// Set the stored value of a slot, active or not
    pub fn set_value(&mut self, slot: usize, value: f64) -> Result<()> {
        self.check_slot(slot)?;
        self.values[slot] = ensure_finite(value, "axis slot value")?;
        Ok(())
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.enabled.get(slot).copied().unwrap_or(false)
    }

    /// Template position of a slot
    pub fn position(&self, slot: usize) -> Option<f64> {
        self.positions.get(slot).copied()
    }

    /// Slot view; `None` when the index is out of range
    pub fn slot(&self, slot: usize) -> Option<Slot> {
        let position = self.position(slot)?;
        Some(if self.enabled[slot] {
            Slot::Active {
                position,
                value: self.values[slot],
            }
        } else {
            Slot::Inactive
        })
    }

    pub fn active_count(&self) -> usize {
        self.enabled.iter().filter(|&&e| e).count()
    }

    /// Indices of active slots in position order
    pub fn active_slots(&self) -> Vec<usize> {
        (0..self.capacity()).filter(|&i| self.enabled[i]).collect()
    }

    /// Active `(position, value)` pairs, sorted by position
    pub fn active_points(&self) -> Vec<(f64, f64)> {
        self.active_slots()
            .into_iter()
            .map(|i| (self.positions[i], self.values[i]))
            .collect()
    }

    /// Active `(slot, value)` pairs used as calculation breakpoints
    pub fn breakpoints(&self) -> Vec<(usize, f64)> {
        self.active_slots()
            .into_iter()
            .map(|i| (i, self.values[i]))
            .collect()
    }

    /// Evaluate the axis curve at `query`.
    ///
    /// Blends linearly between the bracketing active points and holds the
    /// boundary value outside the active range.
    pub fn interpolate(&self, query: f64) -> Result<f64> {
        let points = self.active_points();
        if points.is_empty() {
            return Err(MapError::Configuration(format!(
                "{} axis has no active points",
                self.axis_type
            )));
        }
        interpolate::piecewise(&points, query)
    }

    /// Fail unless the axis has at least `min` active slots
    pub fn require_active(&self, min: usize) -> Result<()> {
        let count = self.active_count();
        if count < min {
            Err(MapError::Configuration(format!(
                "{} axis needs at least {} active points, has {}",
                self.axis_type, min, count
            )))
        } else {
            Ok(())
        }
    }

    /// Raw enabled mask
    pub fn enabled_mask(&self) -> &[bool] {
        &self.enabled
    }

    /// Raw stored slot values, including inactive slots
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }
}

/// Persisted form of an axis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AxisDocument {
    #[serde(rename = "type")]
    pub axis_type: AxisType,
    pub capacity: usize,
    pub positions: Vec<f64>,
    pub enabled: Vec<bool>,
    pub values: Vec<f64>,
}

impl From<Axis> for AxisDocument {
    fn from(axis: Axis) -> Self {
        Self {
            axis_type: axis.axis_type,
            capacity: axis.positions.len(),
            positions: axis.positions,
            enabled: axis.enabled,
            values: axis.values,
        }
    }
}

impl TryFrom<AxisDocument> for Axis {
    type Error = MapError;

    fn try_from(doc: AxisDocument) -> Result<Self> {
        let template = AxisTemplate::custom(doc.axis_type, doc.positions)?;
        if template.capacity() != doc.capacity
            || doc.enabled.len() != doc.capacity
            || doc.values.len() != doc.capacity
        {
            return Err(MapError::Validation(format!(
                "axis document lengths disagree with capacity {}",
                doc.capacity
            )));
        }
        let mut axis = Axis::new(template);
        for (slot, (&enabled, &value)) in doc.enabled.iter().zip(&doc.values).enumerate() {
            axis.set_value(slot, value)?;
            axis.set_enabled(slot, enabled)?;
        }
        Ok(axis)
    }
}
