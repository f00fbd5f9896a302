//! Map model and persistence document.
//!
//! A [`Map`] owns one or two axes and a value matrix sized to the product of
//! their capacities. Cell `(x, y)` lives at `y * x_capacity + x`; a cell holds a
//! value only when every axis slot it sits on is active.

pub mod grid;
pub mod types;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::axis::{Axis, AxisType};
use crate::calculator::strategy::Strategy;
use crate::error::{ensure_finite, MapError, Result};

pub use grid::Grid;
pub use types::{Bank, CorrectionCurve, CorrectionMode, Dimensionality, Formula, MapType, MapTypeSpec};

/// Which axis of a map an edit targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisRole {
    X,
    Y,
}

/// Content of a map: everything that is hashed and versioned
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapState {
    pub map_type: MapType,
    pub bank: Bank,
    pub dimensions: Dimensionality,
    pub axes: Vec<Axis>,
    pub values: Vec<Option<f64>>,
    pub strategy: Strategy,
    pub unit: String,
    pub min_value: f64,
    pub max_value: f64,
}

/// Full persistence document of a map
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapDocument {
    pub id: Uuid,
    pub vehicle_id: String,
    #[serde(flatten)]
    pub state: MapState,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A fuel, ignition, lambda or correction table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MapDocument", into = "MapDocument")]
pub struct Map {
    id: Uuid,
    vehicle_id: String,
    map_type: MapType,
    bank: Bank,
    x_axis: Axis,
    y_axis: Option<Axis>,
    values: Vec<Option<f64>>,
    strategy: Strategy,
    unit: String,
    min_value: f64,
    max_value: f64,
    /// Snapshot version this state was last saved or restored as; 0 when unsaved
    pub version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Map {
    /// New map with the map type's default axes and no computed values
    pub fn new(
        vehicle_id: impl Into<String>,
        map_type: MapType,
        bank: Bank,
        strategy: Strategy,
    ) -> Self {
        let spec = map_type.spec();
        let x_axis = Axis::standard(spec.default_x);
        let y_axis = spec.default_y.map(Axis::standard);
        Self::assemble(vehicle_id.into(), map_type, bank, strategy, x_axis, y_axis)
    }

    /// New map with caller-supplied axes
    pub fn with_axes(
        vehicle_id: impl Into<String>,
        map_type: MapType,
        bank: Bank,
        strategy: Strategy,
        x_axis: Axis,
        y_axis: Option<Axis>,
    ) -> Result<Self> {
        check_axes(map_type, &x_axis, y_axis.as_ref())?;
        Ok(Self::assemble(
            vehicle_id.into(),
            map_type,
            bank,
            strategy,
            x_axis,
            y_axis,
        ))
    }

    fn assemble(
        vehicle_id: String,
        map_type: MapType,
        bank: Bank,
        strategy: Strategy,
        x_axis: Axis,
        y_axis: Option<Axis>,
    ) -> Self {
        let spec = map_type.spec();
        let len = x_axis.capacity() * y_axis.as_ref().map_or(1, Axis::capacity);
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            map_type,
            bank,
            x_axis,
            y_axis,
            values: vec![None; len],
            strategy,
            unit: spec.unit.to_string(),
            min_value: spec.min_value,
            max_value: spec.max_value,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// `(min_value, max_value)`
    pub fn domain(&self) -> (f64, f64) {
        (self.min_value, self.max_value)
    }

    pub fn dimensionality(&self) -> Dimensionality {
        if self.y_axis.is_some() {
            Dimensionality::TwoD
        } else {
            Dimensionality::OneD
        }
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x_axis
    }

    pub fn y_axis(&self) -> Option<&Axis> {
        self.y_axis.as_ref()
    }

    pub fn axis(&self, role: AxisRole) -> Option<&Axis> {
        match role {
            AxisRole::X => Some(&self.x_axis),
            AxisRole::Y => self.y_axis.as_ref(),
        }
    }

    pub(crate) fn axis_mut(&mut self, role: AxisRole) -> Result<&mut Axis> {
        match role {
            AxisRole::X => Ok(&mut self.x_axis),
            AxisRole::Y => self
                .y_axis
                .as_mut()
                .ok_or_else(|| MapError::Validation("1-D map has no y axis".to_string())),
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Change the strategy recorded on the map; values need recomputing
    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    // ------------------------------------------------------------------
    // Cells
    // ------------------------------------------------------------------

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        let y_cap = self.y_axis.as_ref().map_or(1, Axis::capacity);
        if x >= self.x_axis.capacity() || y >= y_cap {
            return Err(MapError::Validation(format!(
                "cell ({}, {}) outside {}x{} map",
                x,
                y,
                self.x_axis.capacity(),
                y_cap
            )));
        }
        Ok(y * self.x_axis.capacity() + x)
    }

    /// Whether every axis slot under cell `(x, y)` is active
    pub fn is_cell_active(&self, x: usize, y: usize) -> bool {
        self.x_axis.is_active(x)
            && match &self.y_axis {
                Some(axis) => axis.is_active(y),
                None => y == 0,
            }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.index(x, y).ok().and_then(|i| self.values[i])
    }

    /// Overwrite one active cell with a raw value
    pub fn set_cell(&mut self, x: usize, y: usize, value: f64) -> Result<()> {
        let idx = self.index(x, y)?;
        if !self.is_cell_active(x, y) {
            return Err(MapError::Validation(format!(
                "cell ({}, {}) is not active",
                x, y
            )));
        }
        let value = self.check_domain(value)?;
        self.values[idx] = Some(value);
        self.touch();
        Ok(())
    }

    fn check_domain(&self, value: f64) -> Result<f64> {
        let value = ensure_finite(value, "cell value")?;
        if value < self.min_value || value > self.max_value {
            return Err(MapError::Range(format!(
                "{} is outside [{}, {}] {}",
                value, self.min_value, self.max_value, self.unit
            )));
        }
        Ok(value)
    }

    /// Active y slots; a 1-D map has a single implicit row 0
    pub(crate) fn active_rows(&self) -> Vec<usize> {
        match &self.y_axis {
            Some(axis) => axis.active_slots(),
            None => vec![0],
        }
    }

    /// `(rows, cols)` of the active grid
    pub fn active_shape(&self) -> (usize, usize) {
        (self.active_rows().len(), self.x_axis.active_count())
    }

    /// Values of all active cells as a dense grid
    pub fn active_grid(&self) -> Result<Grid> {
        let cols = self.x_axis.active_slots();
        let rows = self.active_rows();
        let mut cells = Vec::with_capacity(rows.len() * cols.len());
        for &y in &rows {
            for &x in &cols {
                let value = self.get(x, y).ok_or_else(|| {
                    MapError::Validation(format!("active cell ({}, {}) has no value", x, y))
                })?;
                cells.push(value);
            }
        }
        Grid::new(rows.len(), cols.len(), cells)
    }

    /// Write an imported grid into the active cells
    pub fn apply_grid(&mut self, grid: &Grid) -> Result<()> {
        let (rows, cols) = self.active_shape();
        if grid.shape() != (rows, cols) {
            return Err(MapError::ShapeMismatch {
                expected_rows: rows,
                expected_cols: cols,
                actual_rows: grid.rows(),
                actual_cols: grid.cols(),
            });
        }
        let x_slots = self.x_axis.active_slots();
        let y_slots = self.active_rows();
        let mut updated = self.values.clone();
        for (r, &y) in y_slots.iter().enumerate() {
            for (c, &x) in x_slots.iter().enumerate() {
                let value = grid.get(r, c).unwrap_or(f64::NAN);
                updated[self.index(x, y)?] = Some(self.check_domain(value)?);
            }
        }
        self.values = updated;
        self.touch();
        tracing::debug!(map = %self.id, rows, cols, "applied imported grid");
        Ok(())
    }

    /// Replace the full value matrix; inactive cells must be `None`
    pub(crate) fn replace_values(&mut self, values: Vec<Option<f64>>) -> Result<()> {
        self.check_values(&values)?;
        self.values = values;
        self.touch();
        Ok(())
    }

    /// Every value sits on an active cell and inside the domain
    fn check_values(&self, values: &[Option<f64>]) -> Result<()> {
        let x_cap = self.x_axis.capacity();
        let expected = x_cap * self.y_axis.as_ref().map_or(1, Axis::capacity);
        if values.len() != expected {
            return Err(MapError::Validation(format!(
                "map has {} values, axes need {}",
                values.len(),
                expected
            )));
        }
        for (i, value) in values.iter().enumerate() {
            let Some(value) = value else { continue };
            let (x, y) = (i % x_cap, i / x_cap);
            if !self.is_cell_active(x, y) {
                return Err(MapError::Validation(format!(
                    "inactive cell ({}, {}) holds a value",
                    x, y
                )));
            }
            self.check_domain(*value)?;
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ------------------------------------------------------------------
    // State and documents
    // ------------------------------------------------------------------

    /// Versioned content of the map
    pub fn state(&self) -> MapState {
        let mut axes = vec![self.x_axis.clone()];
        axes.extend(self.y_axis.clone());
        MapState {
            map_type: self.map_type,
            bank: self.bank,
            dimensions: self.dimensionality(),
            axes,
            values: self.values.clone(),
            strategy: self.strategy,
            unit: self.unit.clone(),
            min_value: self.min_value,
            max_value: self.max_value,
        }
    }

    /// Rebuild a map from versioned content, keeping identity fields
    pub fn from_state(
        id: Uuid,
        vehicle_id: impl Into<String>,
        state: MapState,
        version: u64,
    ) -> Result<Self> {
        let now = Utc::now();
        Self::try_from(MapDocument {
            id,
            vehicle_id: vehicle_id.into(),
            state,
            version,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn to_document(&self) -> MapDocument {
        MapDocument::from(self.clone())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn check_axes(map_type: MapType, x_axis: &Axis, y_axis: Option<&Axis>) -> Result<()> {
    let spec = map_type.spec();
    let allowed = |axes: &[AxisType], axis: &Axis| axes.contains(&axis.axis_type());
    if !allowed(spec.x_axes, x_axis) {
        return Err(MapError::Validation(format!(
            "{} axis is not valid as x axis of {}",
            x_axis.axis_type(),
            map_type
        )));
    }
    match y_axis {
        Some(y) if !allowed(spec.y_axes, y) => Err(MapError::Validation(format!(
            "{} axis is not valid as y axis of {}",
            y.axis_type(),
            map_type
        ))),
        Some(_) if x_axis.axis_type() != AxisType::Rpm => Err(MapError::Validation(format!(
            "2-D {} map needs an rpm x axis",
            map_type
        ))),
        None if spec.default_y.is_some() && map_type != MapType::MainFuel => {
            Err(MapError::Validation(format!("{} requires two axes", map_type)))
        }
        _ => Ok(()),
    }
}

impl From<Map> for MapDocument {
    fn from(map: Map) -> Self {
        let state = map.state();
        Self {
            id: map.id,
            vehicle_id: map.vehicle_id,
            state,
            version: map.version,
            created_at: map.created_at,
            updated_at: map.updated_at,
        }
    }
}

impl TryFrom<MapDocument> for Map {
    type Error = MapError;

    fn try_from(doc: MapDocument) -> Result<Self> {
        let MapState {
            map_type,
            bank,
            dimensions,
            axes,
            values,
            strategy,
            unit,
            min_value,
            max_value,
        } = doc.state;

        let mut axes = axes.into_iter();
        let x_axis = axes
            .next()
            .ok_or_else(|| MapError::Validation("map document has no axes".to_string()))?;
        let y_axis = axes.next();
        if axes.next().is_some() {
            return Err(MapError::Validation(
                "map document has more than two axes".to_string(),
            ));
        }
        check_axes(map_type, &x_axis, y_axis.as_ref())?;

        let expected_dims = if y_axis.is_some() {
            Dimensionality::TwoD
        } else {
            Dimensionality::OneD
        };
        if dimensions != expected_dims {
            return Err(MapError::Validation(format!(
                "dimensions {:?} disagree with {} axes",
                dimensions,
                if y_axis.is_some() { 2 } else { 1 }
            )));
        }
        let spec = map_type.spec();
        if unit != spec.unit {
            return Err(MapError::Validation(format!(
                "{} map is in {}, document says {}",
                map_type, spec.unit, unit
            )));
        }
        // A document may narrow the type's domain but never widen it
        if !(min_value.is_finite() && max_value.is_finite() && min_value < max_value)
            || min_value < spec.min_value
            || max_value > spec.max_value
        {
            return Err(MapError::Validation(format!(
                "domain [{}, {}] is not within [{}, {}] for {}",
                min_value, max_value, spec.min_value, spec.max_value, map_type
            )));
        }

        let map = Self {
            id: doc.id,
            vehicle_id: doc.vehicle_id,
            map_type,
            bank,
            values: Vec::new(),
            x_axis,
            y_axis,
            strategy,
            unit,
            min_value,
            max_value,
            version: doc.version,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        };

        map.check_values(&values)?;
        Ok(Self { values, ..map })
    }
}
