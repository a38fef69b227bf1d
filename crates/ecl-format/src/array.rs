//! Decoded array payloads.

use crate::error::{EclFormatError, EclResult};
use crate::types::ArrayType;

/// Payload of one array record, tagged by element type.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Inte(Vec<i32>),
    Real(Vec<f32>),
    Doub(Vec<f64>),
    Logi(Vec<bool>),
    /// `CHAR` and `C0nn` strings, trailing blanks removed
    Char(Vec<String>),
    Mess,
}

impl ArrayData {
    /// Short name of the element kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ArrayData::Inte(_) => "integer",
            ArrayData::Real(_) => "real",
            ArrayData::Doub(_) => "double",
            ArrayData::Logi(_) => "logical",
            ArrayData::Char(_) => "string",
            ArrayData::Mess => "message",
        }
    }

    /// Default array type used when writing this payload.
    pub fn array_type(&self) -> ArrayType {
        match self {
            ArrayData::Inte(_) => ArrayType::Inte,
            ArrayData::Real(_) => ArrayType::Real,
            ArrayData::Doub(_) => ArrayType::Doub,
            ArrayData::Logi(_) => ArrayType::Logi,
            ArrayData::Char(_) => ArrayType::Char,
            ArrayData::Mess => ArrayType::Mess,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayData::Inte(v) => v.len(),
            ArrayData::Real(v) => v.len(),
            ArrayData::Doub(v) => v.len(),
            ArrayData::Logi(v) => v.len(),
            ArrayData::Char(v) => v.len(),
            ArrayData::Mess => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_int(self, name: &str) -> EclResult<Vec<i32>> {
        match self {
            ArrayData::Inte(v) => Ok(v),
            other => Err(other.mismatch(name, "integer")),
        }
    }

    pub fn into_real(self, name: &str) -> EclResult<Vec<f32>> {
        match self {
            ArrayData::Real(v) => Ok(v),
            other => Err(other.mismatch(name, "real")),
        }
    }

    pub fn into_double(self, name: &str) -> EclResult<Vec<f64>> {
        match self {
            ArrayData::Doub(v) => Ok(v),
            other => Err(other.mismatch(name, "double")),
        }
    }

    pub fn into_logical(self, name: &str) -> EclResult<Vec<bool>> {
        match self {
            ArrayData::Logi(v) => Ok(v),
            other => Err(other.mismatch(name, "logical")),
        }
    }

    pub fn into_string(self, name: &str) -> EclResult<Vec<String>> {
        match self {
            ArrayData::Char(v) => Ok(v),
            other => Err(other.mismatch(name, "string")),
        }
    }

    fn mismatch(&self, name: &str, expected: &'static str) -> EclFormatError {
        EclFormatError::TypeMismatch {
            name: name.to_string(),
            expected,
            actual: self.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_extraction() {
        let data = ArrayData::Inte(vec![1, 2, 3]);
        assert_eq!(data.len(), 3);
        assert_eq!(data.clone().into_int("DIMENS").unwrap(), vec![1, 2, 3]);

        let err = data.into_real("DIMENS").unwrap_err();
        assert!(matches!(
            err,
            EclFormatError::TypeMismatch { expected: "real", actual: "integer", .. }
        ));
    }
}
