//! Error types for DecayStat

use thiserror::Error;

/// DecayStat error type.
///
/// The first four variants form the closed kind set used by the analysis
/// layers; the remainder carry collaborator-data failures (report files,
/// efficiency JSON, literature CSVs).
#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument is malformed (empty input, bad range, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A keyed lookup did not find the requested entry
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// An operation that requires a stored fit result was called before any fit
    #[error("Not yet fit: {0}")]
    NotYetFit(String),

    /// A numeric domain guard rejected the computation
    #[error("Numeric guard: {0}")]
    NumericGuard(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
