//! Typed array writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::array::ArrayData;
use crate::error::{EclFormatError, EclResult};
use crate::types::{is_formatted_path, ArrayType};
use crate::{binary, formatted};

/// Writes arrays one after the other in binary or formatted layout.
pub struct EclOutput<W: Write> {
    writer: W,
    formatted: bool,
}

impl EclOutput<BufWriter<File>> {
    /// Create (or truncate) a file, choosing the layout from its extension.
    pub fn create(path: impl AsRef<Path>) -> EclResult<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), is_formatted_path(path)))
    }
}

impl<W: Write> EclOutput<W> {
    pub fn new(writer: W, formatted: bool) -> Self {
        Self { writer, formatted }
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    /// Write one array with an explicit element type.
    pub fn write(&mut self, name: &str, array_type: ArrayType, data: &ArrayData) -> EclResult<()> {
        if data.array_type() != array_type && !(array_type.is_string() && data.array_type().is_string()) {
            return Err(EclFormatError::TypeMismatch {
                name: name.to_string(),
                expected: array_type.kind(),
                actual: data.kind(),
            });
        }

        if self.formatted {
            formatted::write_header(&mut self.writer, name, array_type, data.len())?;
            formatted::write_payload(&mut self.writer, array_type, data)
        } else {
            binary::write_header(&mut self.writer, name, array_type, data.len())?;
            binary::write_payload(&mut self.writer, array_type, data)
        }
    }

    pub fn write_int(&mut self, name: &str, values: &[i32]) -> EclResult<()> {
        self.write(name, ArrayType::Inte, &ArrayData::Inte(values.to_vec()))
    }

    pub fn write_real(&mut self, name: &str, values: &[f32]) -> EclResult<()> {
        self.write(name, ArrayType::Real, &ArrayData::Real(values.to_vec()))
    }

    pub fn write_double(&mut self, name: &str, values: &[f64]) -> EclResult<()> {
        self.write(name, ArrayType::Doub, &ArrayData::Doub(values.to_vec()))
    }

    pub fn write_logical(&mut self, name: &str, values: &[bool]) -> EclResult<()> {
        self.write(name, ArrayType::Logi, &ArrayData::Logi(values.to_vec()))
    }

    /// Write 8-character strings (`CHAR`). Longer values are truncated.
    pub fn write_string(&mut self, name: &str, values: &[String]) -> EclResult<()> {
        self.write(name, ArrayType::Char, &ArrayData::Char(values.to_vec()))
    }

    /// Write strings of a fixed width (`C0nn`).
    pub fn write_c0nn(&mut self, name: &str, width: usize, values: &[String]) -> EclResult<()> {
        self.write(name, ArrayType::C0nn(width), &ArrayData::Char(values.to_vec()))
    }

    /// Write a payload-less marker record.
    pub fn write_message(&mut self, name: &str) -> EclResult<()> {
        self.write(name, ArrayType::Mess, &ArrayData::Mess)
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> EclResult<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
