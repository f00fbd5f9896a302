//! Format bridge for delimited-text table exchange.
//!
//! Tuning tools exchange tables as newline-separated rows of tab or comma
//! separated cells, optionally preceded by a header row of axis labels. The
//! bridge detects the layout of pasted text, parses it into a [`Grid`] and
//! serializes the active cells of a [`Map`] back out.

pub mod codec;
pub mod detect;
pub mod io;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{MapError, Result};
use crate::maps::{Grid, Map};
use crate::settings::BridgeSettings;

use codec::TokenClass;
pub use io::{MemoryClipboard, TextFile, TextIo};

/// Cell encoding of exchanged text
#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Display,
    EnumIter,
    EnumString,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FormatKind {
    TabSeparated,
    CommaSeparated,
    Hexadecimal,
    BinaryText,
}

impl FormatKind {
    /// Separator written when serializing this kind
    pub fn default_separator(&self) -> char {
        match self {
            FormatKind::CommaSeparated => ',',
            FormatKind::TabSeparated | FormatKind::Hexadecimal | FormatKind::BinaryText => '\t',
        }
    }

    fn token_class(&self) -> TokenClass {
        match self {
            FormatKind::TabSeparated | FormatKind::CommaSeparated => TokenClass::Decimal,
            FormatKind::Hexadecimal => TokenClass::Hexadecimal,
            FormatKind::BinaryText => TokenClass::Binary,
        }
    }
}

/// Layout of a block of exchange text
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormatSpec {
    pub kind: FormatKind,
    /// `(rows, cols)` of data, header excluded
    pub dimensions: (usize, usize),
    pub separator: char,
    pub has_headers: bool,
    pub decimal_places: u8,
}

impl FormatSpec {
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_decimal_places(mut self, decimal_places: u8) -> Self {
        self.decimal_places = decimal_places;
        self
    }
}

/// A scored layout hypothesis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub spec: FormatSpec,
    /// In `[0, 1]`
    pub confidence: f64,
}

/// Detection outcome: the winning layout and the runners-up, best first
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub best: Candidate,
    pub alternates: Vec<Candidate>,
}

/// Detects, parses and serializes exchange text
#[derive(Clone, Debug, Default)]
pub struct FormatBridge {
    settings: BridgeSettings,
}

impl FormatBridge {
    pub fn new(settings: BridgeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Guess the layout of `text`
    pub fn detect_format(&self, text: &str) -> Result<Detection> {
        detect::detect(text, &self.settings)
    }

    /// Layout matching the active grid of `map`
    pub fn spec_for(&self, map: &Map, kind: FormatKind) -> FormatSpec {
        FormatSpec {
            kind,
            dimensions: map.active_shape(),
            separator: kind.default_separator(),
            has_headers: false,
            decimal_places: self.settings.default_decimal_places,
        }
    }

    /// Parse `text` laid out as `spec` into a grid
    pub fn parse(&self, text: &str, spec: &FormatSpec) -> Result<Grid> {
        detect::guard(text, &self.settings)?;
        let class = spec.kind.token_class();
        let lines = detect::content_lines(text);
        let data = if spec.has_headers {
            lines.get(1..).unwrap_or_default()
        } else {
            &lines[..]
        };

        let (rows, cols) = spec.dimensions;
        let mismatch = |actual_rows: usize, actual_cols: usize| MapError::ShapeMismatch {
            expected_rows: rows,
            expected_cols: cols,
            actual_rows,
            actual_cols,
        };
        if data.len() != rows {
            let width = data.first().map_or(0, |l| detect::split_row(l, spec.separator).len());
            return Err(mismatch(data.len(), width));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for line in data {
            let tokens = detect::split_row(line, spec.separator);
            if tokens.len() != cols {
                return Err(mismatch(rows, tokens.len()));
            }
            for token in tokens {
                cells.push(codec::decode(token, class, spec.decimal_places)?);
            }
        }
        Grid::new(rows, cols, cells)
    }

    /// Serialize a grid, with optional header labels
    pub fn serialize_grid(
        &self,
        grid: &Grid,
        spec: &FormatSpec,
        header: Option<&[String]>,
    ) -> Result<String> {
        if grid.shape() != spec.dimensions {
            return Err(MapError::ShapeMismatch {
                expected_rows: spec.dimensions.0,
                expected_cols: spec.dimensions.1,
                actual_rows: grid.rows(),
                actual_cols: grid.cols(),
            });
        }
        let class = spec.kind.token_class();
        let sep = spec.separator.to_string();
        let mut lines = Vec::with_capacity(grid.rows() + 1);
        if let Some(labels) = header {
            lines.push(labels.join(&sep));
        }
        for row in grid.row_slices() {
            let tokens = row
                .iter()
                .map(|&v| codec::encode(v, class, spec.decimal_places))
                .collect::<Result<Vec<_>>>()?;
            lines.push(tokens.join(&sep));
        }
        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }

    /// Serialize the active cells of `map`
    pub fn serialize(&self, map: &Map, spec: &FormatSpec) -> Result<String> {
        let grid = map.active_grid()?;
        let header = spec.has_headers.then(|| header_labels(map));
        let text = self.serialize_grid(&grid, spec, header.as_deref())?;
        tracing::debug!(map = %map.id(), kind = %spec.kind, bytes = text.len(), "serialized map");
        Ok(text)
    }

    /// Detect, parse and write `text` into the active cells of `map`
    pub fn import(&self, map: &mut Map, text: &str) -> Result<FormatSpec> {
        let detection = self.detect_format(text)?;
        let spec = detection.best.spec;
        let grid = self.parse(text, &spec)?;
        map.apply_grid(&grid)?;
        Ok(spec)
    }
}

/// `<breakpoint><unit>` label per active x slot
pub fn header_labels(map: &Map) -> Vec<String> {
    let axis = map.x_axis();
    let unit = axis.axis_type().unit();
    axis.breakpoints()
        .into_iter()
        .map(|(_, value)| format!("{}{}", value, unit))
        .collect()
}
