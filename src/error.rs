//! Error types for joinplot.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the attribute-table row source. Any of these aborts a run.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The table file could not be opened or read from disk.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported table format: .{0}")]
    UnsupportedFormat(String),

    /// A requested field is not a column of the table.
    #[error("field '{0}' does not exist in the table")]
    MissingField(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Structurally valid file with an unexpected layout.
    #[error("malformed table: {0}")]
    Malformed(String),

    #[error("row scan did not finish within {0:?}")]
    Timeout(Duration),
}

/// Failures while drawing or writing the chart image.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("nothing to render: the sample is empty")]
    EmptySample,

    #[error("drawing failed: {0}")]
    Draw(String),

    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not move chart into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Top-level error for a pipeline run.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// GeoJSON input could not be parsed or written.
    #[error("GeoJSON error: {0}")]
    Geometry(#[from] geojson::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output already present and overwriting is disabled.
    #[error("output {0} already exists and overwrite is disabled")]
    OutputExists(PathBuf),
}
