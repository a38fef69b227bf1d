//! Error types for container read/write operations.

use thiserror::Error;

/// Result type for container operations.
pub type EclResult<T> = Result<T, EclFormatError>;

/// Error types for the named-array container.
#[derive(Error, Debug)]
pub enum EclFormatError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Element type tag not recognised
    #[error("Unknown array type tag '{0}'")]
    UnknownArrayType(String),

    /// Array header could not be decoded
    #[error("Invalid array header: {0}")]
    InvalidHeader(String),

    /// Payload markers or tokens are inconsistent
    #[error("Corrupted data in array '{array}': {reason}")]
    CorruptedData { array: String, reason: String },

    /// Array exists but holds a different element type
    #[error("Array '{name}' holds {actual} data, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// No array with the requested name
    #[error("Array not found: {0}")]
    MissingArray(String),

    /// Array index beyond the file's array list
    #[error("Array index {index} out of range ({len} arrays in file)")]
    IndexOutOfRange { index: usize, len: usize },
}

impl EclFormatError {
    pub(crate) fn corrupted(array: &str, reason: impl Into<String>) -> Self {
        EclFormatError::CorruptedData {
            array: array.trim_end().to_string(),
            reason: reason.into(),
        }
    }
}
