//! Dense value grid exchanged between maps and the format bridge.

use crate::error::{MapError, Result};

/// Row-major grid of cell values
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl Grid {
    /// Build a grid from row-major cells
    pub fn new(rows: usize, cols: usize, cells: Vec<f64>) -> Result<Self> {
        if cells.len() != rows * cols {
            return Err(MapError::Validation(format!(
                "grid {}x{} needs {} cells, got {}",
                rows,
                cols,
                rows * cols,
                cells.len()
            )));
        }
        Ok(Self { rows, cols, cells })
    }

    /// Build a grid from rows; every row must have the first row's length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|r| r.len() != cols) {
            return Err(MapError::ShapeMismatch {
                expected_rows: rows.len(),
                expected_cols: cols,
                actual_rows: rows.len(),
                actual_cols: bad.len(),
            });
        }
        let n_rows = rows.len();
        Ok(Self {
            rows: n_rows,
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Iterate rows as slices
    pub fn row_slices(&self) -> impl Iterator<Item = &[f64]> {
        // chunks(0) panics, so an empty grid yields no rows
        self.cells.chunks(self.cols.max(1)).take(self.rows)
    }

    /// Same shape and every cell within `tolerance`
    pub fn approx_eq(&self, other: &Grid, tolerance: f64) -> bool {
        self.shape() == other.shape()
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}
