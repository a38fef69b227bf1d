//! Error types for summary reading.

use std::path::PathBuf;

use ecl_format::EclFormatError;
use thiserror::Error;

/// Result type for summary operations.
pub type SummaryResult<T> = Result<T, SummaryError>;

/// Error types for catalog construction, vector loading and cache export.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// Container could not be read
    #[error(transparent)]
    Format(#[from] EclFormatError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Specification file name without a summary extension
    #[error("Invalid extension for summary specification file: {}", .0.display())]
    InvalidExtension(PathBuf),

    /// Restart reference that resolves to no specification file
    #[error("Restart root '{0}' not found")]
    RestartNotFound(String),

    /// Restart references that lead back to an earlier link
    #[error("Invalid restart chain: {0}")]
    InvalidRestartChain(String),

    /// Neither a unified nor a numbered set of result files
    #[error("No result files found for {}", .0.display())]
    NoResultFiles(PathBuf),

    /// Result file arrays out of MINISTEP/PARAMS order
    #[error("Unexpected array '{found}' in {}, expected {expected}", .file.display())]
    UnexpectedMarker {
        file: PathBuf,
        expected: &'static str,
        found: String,
    },

    /// Value that cannot be read at a recorded position
    #[error("Corrupted data in {}: {reason}", .file.display())]
    CorruptedData { file: PathBuf, reason: String },

    /// Key not present in the catalog
    #[error("Key '{0}' not found")]
    KeyNotFound(String),

    /// One-based report step outside the run
    #[error("Report step {step} outside valid range 1..={count}")]
    ReportStepOutOfRange { step: usize, count: usize },

    /// Invalid wildcard pattern
    #[error("Invalid key pattern '{0}'")]
    InvalidPattern(String),

    /// Operation not supported for this summary
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}
