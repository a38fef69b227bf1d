//! Vector loading from result files.
//!
//! Two strategies read the same data:
//!
//! - **Targeted**: seek to each timestep's `PARAMS` array and read only the
//!   requested values. Suited to a handful of keys.
//! - **Bulk**: read every `PARAMS` array whole in one sequential pass.
//!
//! Timesteps are visited in runs that share a result file; each run holds a
//! single handle, released before the next file is opened.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt};
use ecl_format::{binary, formatted, ArrayType};
use tracing::{debug, warn};

use crate::catalog::SummaryCatalog;
use crate::error::{SummaryError, SummaryResult};
use crate::results::TimeStep;

/// Value substituted for unreadable formatted tokens during bulk reads.
pub const INVALID_VALUE: f32 = -1.0e20;

/// Lazily filled sample vectors, keyed by slot.
///
/// Filled through `&self`; the owning summary is `Send` but not `Sync`.
#[derive(Debug, Default)]
pub struct VectorCache {
    vectors: RefCell<HashMap<usize, Arc<[f32]>>>,
}

impl VectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> Option<Arc<[f32]>> {
        self.vectors.borrow().get(&slot).cloned()
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.vectors.borrow().contains_key(&slot)
    }

    pub fn insert(&self, slot: usize, values: Vec<f32>) -> Arc<[f32]> {
        let values: Arc<[f32]> = values.into();
        self.vectors.borrow_mut().insert(slot, values.clone());
        values
    }

    pub fn len(&self) -> usize {
        self.vectors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.borrow().is_empty()
    }
}

/// How `PARAMS` arrays are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    Targeted,
    Bulk,
}

/// Consecutive timesteps stored in the same result file.
fn file_runs(steps: &[TimeStep]) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for (n, step) in steps.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if steps[run.start].link == step.link && steps[run.start].file == step.file => {
                run.end = n + 1;
            }
            _ => runs.push(n..n + 1),
        }
    }
    runs
}

/// Open the result file of a run's first timestep.
fn open_run<'a>(
    catalog: &'a SummaryCatalog,
    step: &TimeStep,
) -> SummaryResult<(BufReader<File>, &'a Path, bool)> {
    let link = catalog.chain().link(step.link).ok_or_else(|| {
        SummaryError::InvalidOperation(format!("timestep refers to unknown link {}", step.link))
    })?;
    let path = link.result_files.get(step.file).ok_or_else(|| {
        SummaryError::InvalidOperation(format!("timestep refers to unknown file {}", step.file))
    })?;
    debug!(file = %path.display(), "Opening summary result file");
    Ok((BufReader::new(File::open(path)?), path.as_path(), link.formatted))
}

fn corrupted(path: &Path, reason: String) -> SummaryError {
    SummaryError::CorruptedData {
        file: path.to_path_buf(),
        reason,
    }
}

/// Read the samples of `slots`, one vector per slot in the given order.
///
/// Slots absent from a chain link yield NaN for that link's timesteps.
pub(crate) fn read_vectors(
    catalog: &SummaryCatalog,
    slots: &[usize],
    strategy: LoadStrategy,
) -> SummaryResult<Vec<Vec<f32>>> {
    let steps = catalog.timesteps();
    let mut vectors: Vec<Vec<f32>> = slots.iter().map(|_| Vec::with_capacity(steps.len())).collect();

    for run in file_runs(steps) {
        let (mut reader, path, is_formatted) = open_run(catalog, &steps[run.start])?;

        for step in &steps[run] {
            let positions: Vec<Option<usize>> = slots
                .iter()
                .map(|slot| catalog.position(step.link, *slot))
                .collect();

            match strategy {
                LoadStrategy::Targeted => {
                    for (vector, position) in vectors.iter_mut().zip(&positions) {
                        let value = match position {
                            Some(raw) => read_value(&mut reader, path, is_formatted, step, *raw)?,
                            None => f32::NAN,
                        };
                        vector.push(value);
                    }
                }
                LoadStrategy::Bulk => {
                    let params = read_params(&mut reader, path, is_formatted, step)?;
                    for (vector, position) in vectors.iter_mut().zip(&positions) {
                        let value = match position {
                            Some(raw) => *params.get(*raw).ok_or_else(|| {
                                corrupted(
                                    path,
                                    format!("PARAMS has {} values, position {} requested", params.len(), raw),
                                )
                            })?,
                            None => f32::NAN,
                        };
                        vector.push(value);
                    }
                }
            }
        }
    }

    Ok(vectors)
}

/// One `PARAMS` value at raw position `raw`.
fn read_value<R: Read + Seek>(
    reader: &mut R,
    path: &Path,
    is_formatted: bool,
    step: &TimeStep,
    raw: usize,
) -> SummaryResult<f32> {
    if raw >= step.params_count {
        return Err(corrupted(
            path,
            format!("PARAMS has {} values, position {} requested", step.params_count, raw),
        ));
    }

    if is_formatted {
        let layout = ArrayType::Real.formatted_layout();
        reader.seek(SeekFrom::Start(step.params_offset + layout.char_offset(raw as u64)))?;

        let mut token = vec![0u8; layout.width];
        reader
            .read_exact(&mut token)
            .map_err(|e| corrupted(path, format!("PARAMS value {} unreadable: {}", raw, e)))?;
        let token = String::from_utf8_lossy(&token);

        formatted::parse_real(&token).ok_or_else(|| {
            corrupted(path, format!("invalid PARAMS value '{}' at position {}", token.trim(), raw))
        })
    } else {
        let layout = ArrayType::Real.block_layout();
        reader.seek(SeekFrom::Start(step.params_offset + layout.physical_offset(raw as u64)))?;
        Ok(reader.read_f32::<BigEndian>()?)
    }
}

/// A whole `PARAMS` array.
///
/// Binary block markers are validated. Formatted tokens that are missing or
/// malformed become [`INVALID_VALUE`].
fn read_params<R: Read + Seek>(
    reader: &mut R,
    path: &Path,
    is_formatted: bool,
    step: &TimeStep,
) -> SummaryResult<Vec<f32>> {
    reader.seek(SeekFrom::Start(step.params_offset))?;

    if is_formatted {
        let size = ArrayType::Real.size_on_disk(step.params_count, true);
        let mut raw = Vec::with_capacity(size as usize);
        reader.by_ref().take(size).read_to_end(&mut raw)?;

        let text = String::from_utf8_lossy(&raw);
        let (values, replaced) = formatted::parse_reals_lenient(&text, step.params_count, INVALID_VALUE);
        if replaced > 0 {
            warn!(
                file = %path.display(),
                offset = step.params_offset,
                replaced,
                "Replaced unreadable PARAMS values"
            );
        }
        Ok(values)
    } else {
        Ok(binary::read_payload(reader, "PARAMS", ArrayType::Real, step.params_count)?
            .into_real("PARAMS")?)
    }
}

/// `MINISTEP` number of every timestep.
pub(crate) fn read_ministeps(catalog: &SummaryCatalog) -> SummaryResult<Vec<i32>> {
    let steps = catalog.timesteps();
    let mut ministeps = Vec::with_capacity(steps.len());

    for run in file_runs(steps) {
        let (mut reader, path, is_formatted) = open_run(catalog, &steps[run.start])?;

        for step in &steps[run] {
            let value = if is_formatted {
                let layout = ArrayType::Inte.formatted_layout();
                reader.seek(SeekFrom::Start(step.ministep_offset))?;
                let mut token = vec![0u8; layout.width];
                reader.read_exact(&mut token)?;
                let token = String::from_utf8_lossy(&token);
                token.trim().parse::<i32>().map_err(|_| {
                    corrupted(path, format!("invalid MINISTEP value '{}'", token.trim()))
                })?
            } else {
                let layout = ArrayType::Inte.block_layout();
                reader.seek(SeekFrom::Start(step.ministep_offset + layout.physical_offset(0)))?;
                reader.read_i32::<BigEndian>()?
            };
            ministeps.push(value);
        }
    }

    Ok(ministeps)
}
