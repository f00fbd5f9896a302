//! Error taxonomy shared by every engine component.
//!
//! All fallible operations return [`Result`]. Callers that only need the broad
//! category (for example to decide whether a retry makes sense) can match on
//! [`MapError::kind`].

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, MapError>;

/// Broad error categories
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Range,
    AmbiguousFormat,
    Conflict,
    Corruption,
    Storage,
    Serialization,
}

/// Errors raised by the axis store, calculator, snapshot store and format bridge
#[derive(Debug, Error)]
pub enum MapError {
    /// An axis or curve does not have enough active points
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input parameters or malformed data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Parsed or serialized grid does not have the expected shape
    #[error("Shape mismatch: expected {expected_rows}x{expected_cols}, got {actual_rows}x{actual_cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    /// Text input exceeds the configured scan ceiling
    #[error("Input too large: {what} is {actual}, limit is {limit}")]
    InputTooLarge {
        what: &'static str,
        actual: usize,
        limit: usize,
    },

    /// A computed or supplied value is non-finite or outside its domain
    #[error("Range error: {0}")]
    Range(String),

    /// Format detection could not settle on a candidate
    #[error("Ambiguous format: best confidence {confidence:.2} is below {threshold:.2}")]
    AmbiguousFormat { confidence: f64, threshold: f64 },

    /// The snapshot head moved since the writer last read it
    #[error("Conflict on map {map_id}: expected head v{expected}, found v{actual}")]
    Conflict {
        map_id: String,
        expected: u64,
        actual: u64,
    },

    /// A stored snapshot failed its checksum
    #[error("Corrupted snapshot {map_id} v{version}: {reason}")]
    Corruption {
        map_id: String,
        version: u64,
        reason: String,
    },

    /// Persistence backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MapError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            MapError::Configuration(_) => ErrorKind::Configuration,
            MapError::Validation(_)
            | MapError::ShapeMismatch { .. }
            | MapError::InputTooLarge { .. } => ErrorKind::Validation,
            MapError::Range(_) => ErrorKind::Range,
            MapError::AmbiguousFormat { .. } => ErrorKind::AmbiguousFormat,
            MapError::Conflict { .. } => ErrorKind::Conflict,
            MapError::Corruption { .. } => ErrorKind::Corruption,
            MapError::Storage(_) => ErrorKind::Storage,
            MapError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether re-reading and retrying the operation can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, MapError::Conflict { .. })
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Storage(err.to_string())
    }
}

/// Fail with [`MapError::Range`] when `value` is NaN or infinite
pub(crate) fn ensure_finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MapError::Range(format!("{} is not finite ({})", what, value)))
    }
}
