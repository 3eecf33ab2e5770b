//! Join an attribute table to GeoJSON features and chart one numeric field.
//!
//! ```text
//!  table ──► data::loader ──► data::extract ──► Sample ──► chart ──► PNG
//!    │                                                      ▲
//!    └──► join (GeoJSON) ──► <workspace>/<layer>_joined.geojson
//!                               color (StyleMode) ──────────┘
//! ```
//!
//! Progress, skipped rows and failures are reported through
//! [`diagnostics::Diagnostics`].

pub mod chart;
pub mod color;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod join;
pub mod pipeline;

pub use chart::{BarPlan, ChartSpec};
pub use color::StyleMode;
pub use diagnostics::{Diagnostic, Diagnostics, MessageLog, Severity};
pub use error::{Error, RenderError, Result, SourceError};
pub use pipeline::{plot_rows, run, JobConfig, RunOutcome};
