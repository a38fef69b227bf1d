//! Error types for grid decoding.

use ecl_format::EclFormatError;
use thiserror::Error;

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Error types for grid decoding and geometry queries.
#[derive(Error, Debug)]
pub enum GridError {
    /// Container could not be read
    #[error(transparent)]
    Format(#[from] EclFormatError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested grid has no GRIDHEAD in the file
    #[error("Grid '{0}' not found")]
    GridNotFound(String),

    /// Cell coordinate, index, layer or box outside the grid
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Operation not supported for this file
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Grid and initialization file disagree
    #[error("Inconsistent data: {0}")]
    InconsistentData(String),

    /// Array value that cannot be valid, e.g. a cell number below 1
    #[error("Corrupted data: {0}")]
    CorruptedData(String),

    /// MAPUNITS value other than METRES, FEET or CM
    #[error("Unit system '{0}' not supported for MAPUNITS")]
    UnsupportedUnit(String),
}
