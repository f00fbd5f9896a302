//! UltraMap - fuel map calculation and versioning engine written in Rust
//!
//! This library configures electronic fuel injection lookup tables, derives their
//! values from engine parameters, exchanges them with tuning tools as delimited
//! text and keeps a verifiable history of every saved version.
//!
//! ## Module Structure
//!
//! - [`axis`] - Fixed-capacity sparse axes, templates and interpolation
//! - [`calculator`] - Deterministic map value derivation
//!   - `vehicle` - Engine and fuel system parameters
//!   - `strategy` - Conservative, balanced and aggressive presets
//!   - `physics` - Speed-density fuelling math
//!   - `curves` - Zone-shaped corrections, spark advance and VE model
//! - [`maps`] - Map model, map-type dispatch table and persistence document
//! - [`snapshot`] - Content-addressed, append-only version history
//! - [`bridge`] - Delimited-text format detection, parsing and serialization
//! - [`settings`] - Engine settings persistence
//! - [`units`] - Unit conventions and conversion utilities
//! - [`error`] - Error taxonomy

pub mod axis;
pub mod bridge;
pub mod calculator;
pub mod error;
pub mod maps;
pub mod settings;
pub mod snapshot;
pub mod units;

pub use axis::{Axis, AxisTemplate, AxisType};
pub use bridge::{FormatBridge, FormatKind, FormatSpec};
pub use calculator::{AxisEdit, CalcContext, MapCalculator, Strategy, VehicleParams};
pub use error::{ErrorKind, MapError, Result};
pub use maps::{AxisRole, Bank, Grid, Map, MapType};
pub use settings::EngineSettings;
pub use snapshot::{MapDiff, SnapshotStore};
