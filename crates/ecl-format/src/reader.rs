//! Sequential array scan and on-demand typed reads.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::array::ArrayData;
use crate::error::{EclFormatError, EclResult};
use crate::types::{is_formatted_path, ArrayType};
use crate::{binary, formatted};

/// One named array found by the header scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayEntry {
    pub name: String,
    pub array_type: ArrayType,
    pub count: usize,
    /// Absolute position of the first payload byte (first head marker for
    /// binary files, first character after the header line for formatted)
    pub offset: u64,
}

/// A container file whose array headers have been scanned.
///
/// Opening reads only the headers; payloads are decoded by [`EclFile::read`]
/// and the typed getters, each of which opens its own short-lived handle.
#[derive(Debug, Clone)]
pub struct EclFile {
    path: PathBuf,
    formatted: bool,
    entries: Vec<ArrayEntry>,
}

impl EclFile {
    /// Open a file, choosing the layout from its extension.
    pub fn open(path: impl AsRef<Path>) -> EclResult<Self> {
        let path = path.as_ref();
        Self::open_with_format(path, is_formatted_path(path))
    }

    /// Open a file with an explicit layout.
    pub fn open_with_format(path: impl AsRef<Path>, formatted: bool) -> EclResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();

        loop {
            let header = if formatted {
                formatted::read_header(&mut reader)?
            } else {
                binary::read_header(&mut reader)?
            };
            let Some(header) = header else {
                break;
            };

            let offset = reader.stream_position()?;
            let size = header.array_type.size_on_disk(header.count, formatted);

            // formatted files may lack the final line break
            let slack = u64::from(formatted);
            if offset + size > file_len + slack {
                return Err(EclFormatError::corrupted(
                    &header.name,
                    format!(
                        "payload of {} bytes at offset {} runs past end of file ({} bytes)",
                        size, offset, file_len
                    ),
                ));
            }

            reader.seek_relative(size as i64)?;

            entries.push(ArrayEntry {
                name: header.name,
                array_type: header.array_type,
                count: header.count,
                offset,
            });
        }

        debug!(
            file = %path.display(),
            formatted,
            arrays = entries.len(),
            "Scanned array headers"
        );

        Ok(Self {
            path,
            formatted,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_formatted(&self) -> bool {
        self.formatted
    }

    /// All arrays in file order.
    pub fn entries(&self) -> &[ArrayEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> EclResult<&ArrayEntry> {
        self.entries.get(index).ok_or(EclFormatError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    /// Index of the first array with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn has_array(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn require(&self, name: &str) -> EclResult<usize> {
        self.index_of(name)
            .ok_or_else(|| EclFormatError::MissingArray(name.to_string()))
    }

    /// Decode the array at `index`.
    pub fn read(&self, index: usize) -> EclResult<ArrayData> {
        let entry = self.entry(index)?;
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(entry.offset))?;
        let mut reader = BufReader::new(file);

        if self.formatted {
            formatted::read_payload(&mut reader, &entry.name, entry.array_type, entry.count)
        } else {
            binary::read_payload(&mut reader, &entry.name, entry.array_type, entry.count)
        }
    }

    pub fn get_int(&self, index: usize) -> EclResult<Vec<i32>> {
        let name = &self.entry(index)?.name;
        self.read(index)?.into_int(name)
    }

    pub fn get_real(&self, index: usize) -> EclResult<Vec<f32>> {
        let name = &self.entry(index)?.name;
        self.read(index)?.into_real(name)
    }

    pub fn get_double(&self, index: usize) -> EclResult<Vec<f64>> {
        let name = &self.entry(index)?.name;
        self.read(index)?.into_double(name)
    }

    pub fn get_logical(&self, index: usize) -> EclResult<Vec<bool>> {
        let name = &self.entry(index)?.name;
        self.read(index)?.into_logical(name)
    }

    pub fn get_string(&self, index: usize) -> EclResult<Vec<String>> {
        let name = &self.entry(index)?.name;
        self.read(index)?.into_string(name)
    }

    pub fn get_int_named(&self, name: &str) -> EclResult<Vec<i32>> {
        self.get_int(self.require(name)?)
    }

    pub fn get_real_named(&self, name: &str) -> EclResult<Vec<f32>> {
        self.get_real(self.require(name)?)
    }

    pub fn get_double_named(&self, name: &str) -> EclResult<Vec<f64>> {
        self.get_double(self.require(name)?)
    }

    pub fn get_logical_named(&self, name: &str) -> EclResult<Vec<bool>> {
        self.get_logical(self.require(name)?)
    }

    pub fn get_string_named(&self, name: &str) -> EclResult<Vec<String>> {
        self.get_string(self.require(name)?)
    }

    /// Read `count` consecutive `REAL` elements starting at logical element
    /// `start`, touching only the blocks that hold them.
    pub fn read_real_range(&self, index: usize, start: usize, count: usize) -> EclResult<Vec<f32>> {
        let entry = self.entry(index)?;
        if entry.array_type != ArrayType::Real {
            return Err(EclFormatError::TypeMismatch {
                name: entry.name.clone(),
                expected: "real",
                actual: entry.array_type.kind(),
            });
        }
        if start + count > entry.count {
            return Err(EclFormatError::corrupted(
                &entry.name,
                format!(
                    "range {}..{} exceeds array length {}",
                    start,
                    start + count,
                    entry.count
                ),
            ));
        }

        let mut file = File::open(&self.path)?;

        if self.formatted {
            let layout = entry.array_type.formatted_layout();
            let begin = layout.char_offset(start as u64);
            let end = layout.char_offset((start + count) as u64);
            file.seek(SeekFrom::Start(entry.offset + begin))?;

            let mut raw = vec![0u8; (end - begin) as usize];
            file.read_exact(&mut raw)?;
            let text = String::from_utf8_lossy(&raw);
            return formatted::decode(&text, &entry.name, entry.array_type, count)?
                .into_real(&entry.name);
        }

        let layout = entry.array_type.block_layout();
        let mut values = Vec::with_capacity(count);
        let mut raw = Vec::new();

        for run in layout.runs(start as u64, count as u64) {
            file.seek(SeekFrom::Start(entry.offset + run.byte_offset))?;
            raw.resize(run.len as usize * layout.element_size, 0);
            file.read_exact(&mut raw)?;

            let chunk = binary::decode(
                entry.array_type,
                bytes::Bytes::copy_from_slice(&raw),
                run.len as usize,
            );
            values.extend(chunk.into_real(&entry.name)?);
        }

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::EclOutput;
    use tempfile::TempDir;

    fn sample_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut out = EclOutput::create(&path).unwrap();
        out.write_int("DIMENS", &[3, 2, 1]).unwrap();
        out.write_real("ZCORN", &(0..2600).map(|v| v as f32).collect::<Vec<_>>())
            .unwrap();
        out.write_string("NAMES", &["OP_1".to_string(), "INJ".to_string()])
            .unwrap();
        out.write_message("ENDLGR").unwrap();
        out.write_int("DIMENS", &[9]).unwrap();
        out.finish().unwrap();
        path
    }

    #[test]
    fn test_scan_entries() {
        let dir = TempDir::new().unwrap();
        let file = EclFile::open(sample_file(&dir, "CASE.EGRID")).unwrap();

        let names: Vec<_> = file.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["DIMENS", "ZCORN", "NAMES", "ENDLGR", "DIMENS"]);
        assert_eq!(file.entries()[0].offset, 24);
        assert_eq!(file.index_of("DIMENS"), Some(0));
        assert_eq!(file.get_int_named("DIMENS").unwrap(), vec![3, 2, 1]);
        assert_eq!(file.get_int(4).unwrap(), vec![9]);
    }

    #[test]
    fn test_typed_getter_mismatch() {
        let dir = TempDir::new().unwrap();
        let file = EclFile::open(sample_file(&dir, "CASE.EGRID")).unwrap();
        assert!(matches!(
            file.get_real_named("DIMENS"),
            Err(EclFormatError::TypeMismatch { .. })
        ));
        assert!(matches!(
            file.get_int_named("ACTNUM"),
            Err(EclFormatError::MissingArray(_))
        ));
    }

    #[test]
    fn test_range_read_crosses_blocks() {
        let dir = TempDir::new().unwrap();
        for name in ["CASE.EGRID", "CASE.FEGRID"] {
            let file = EclFile::open(sample_file(&dir, name)).unwrap();
            let values = file.read_real_range(1, 995, 1010).unwrap();
            assert_eq!(values.len(), 1010);
            assert_eq!(values[0], 995.0);
            assert_eq!(values[1009], 2004.0);
        }
    }

    #[test]
    fn test_truncated_payload() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, "CASE.EGRID");
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..100]).unwrap();

        assert!(matches!(
            EclFile::open(&path),
            Err(EclFormatError::CorruptedData { .. })
        ));
    }
}
