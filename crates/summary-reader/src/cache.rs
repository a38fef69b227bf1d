//! Derived single-file summary cache (`.ESMRY`).
//!
//! | Array | Content |
//! |-------|---------|
//! | `START` | day, month, year, hour, minute, second, millisecond |
//! | `RESTART`, `RSTNUM` | base run root and report step, restarted runs only |
//! | `KEYCHECK` | canonical keys in slot order |
//! | `UNITS` | unit per key |
//! | `RSTEP` | 1 for the last timestep of a report step, 0 otherwise |
//! | `TSTEP` | `MINISTEP` number per timestep |
//! | `V0`, `V1`, ... | samples per key, in slot order |

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use ecl_format::{EclFile, EclOutput, EclResult};
use tracing::{debug, info};

use crate::catalog::SummaryCatalog;
use crate::error::{SummaryError, SummaryResult};
use crate::loader::VectorCache;
use crate::smspec::{RestartInfo, StartDate};
use crate::source::SummarySource;

const CACHE_EXTENSION: &str = "ESMRY";
const FORMATTED_CACHE_EXTENSION: &str = "FESMRY";

/// Strings longer than this are written as `C0nn`.
const CHAR_WIDTH: usize = 8;

/// `<dir>/<stem>.ESMRY` next to a specification file.
pub fn cache_path(spec_path: &Path) -> PathBuf {
    spec_path.with_extension(CACHE_EXTENSION)
}

fn vector_name(slot: usize) -> String {
    format!("V{}", slot)
}

fn write_strings<W: std::io::Write>(
    out: &mut EclOutput<W>,
    name: &str,
    values: &[String],
) -> EclResult<()> {
    let width = values.iter().map(|v| v.len()).max().unwrap_or(0);
    if width <= CHAR_WIDTH {
        out.write_string(name, values)
    } else {
        out.write_c0nn(name, width, values)
    }
}

/// Write a cache file. Removes the partial file when writing fails.
pub(crate) fn write_cache(
    path: &Path,
    catalog: &SummaryCatalog,
    vectors: &[Arc<[f32]>],
    ministeps: &[i32],
) -> SummaryResult<()> {
    let result = write_arrays(path, catalog, vectors, ministeps);
    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result?;

    info!(
        file = %path.display(),
        keys = vectors.len(),
        timesteps = ministeps.len(),
        "Wrote summary cache"
    );
    Ok(())
}

fn write_arrays(
    path: &Path,
    catalog: &SummaryCatalog,
    vectors: &[Arc<[f32]>],
    ministeps: &[i32],
) -> EclResult<()> {
    let mut out = EclOutput::create(path)?;

    out.write_int("START", &catalog.start().to_cache_fields())?;

    if let Some(restart) = catalog.restart_info() {
        write_strings(&mut out, "RESTART", &[restart.root.clone()])?;
        out.write_int("RSTNUM", &[restart.report_step])?;
    }

    write_strings(&mut out, "KEYCHECK", catalog.keys())?;
    write_strings(&mut out, "UNITS", catalog.units())?;

    let mut rstep = vec![0; ministeps.len()];
    for step in catalog.report_index() {
        if let Some(flag) = rstep.get_mut(*step) {
            *flag = 1;
        }
    }
    out.write_int("RSTEP", &rstep)?;
    out.write_int("TSTEP", ministeps)?;

    for (slot, values) in vectors.iter().enumerate() {
        out.write_real(&vector_name(slot), values)?;
    }

    out.finish()?;
    Ok(())
}

/// Summary served from a `.ESMRY` cache file.
///
/// Key list, units and step tables are read on open; sample arrays are read
/// on first request.
#[derive(Debug)]
pub struct CachedSummary {
    file: EclFile,
    keys: Vec<String>,
    slots: HashMap<String, usize>,
    units: Vec<String>,
    report_index: Vec<usize>,
    ministeps: Vec<i32>,
    start: StartDate,
    start_date: NaiveDateTime,
    restart: Option<RestartInfo>,
    vectors: VectorCache,
}

impl CachedSummary {
    pub fn open(path: impl AsRef<Path>) -> SummaryResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(CACHE_EXTENSION) | Some(FORMATTED_CACHE_EXTENSION) => {}
            _ => return Err(SummaryError::InvalidExtension(path.to_path_buf())),
        }

        let file = EclFile::open(path)?;
        let corrupted = |reason: String| SummaryError::CorruptedData {
            file: path.to_path_buf(),
            reason,
        };

        let start = StartDate::from_cache_fields(&file.get_int_named("START")?)
            .ok_or_else(|| corrupted("START has fewer than 6 elements".to_string()))?;
        let start_date = start
            .to_datetime()
            .ok_or_else(|| corrupted(format!("invalid START {:?}", start)))?;

        let restart = if file.has_array("RESTART") {
            let root = file.get_string_named("RESTART")?.concat().trim().to_string();
            let report_step = file
                .get_int_named("RSTNUM")?
                .first()
                .copied()
                .unwrap_or(0);
            (!root.is_empty()).then_some(RestartInfo { root, report_step })
        } else {
            None
        };

        let keys = file.get_string_named("KEYCHECK")?;
        let units = file.get_string_named("UNITS")?;
        let rstep = file.get_int_named("RSTEP")?;
        let ministeps = file.get_int_named("TSTEP")?;

        if units.len() != keys.len() {
            return Err(corrupted(format!(
                "UNITS has {} elements, KEYCHECK {}",
                units.len(),
                keys.len()
            )));
        }
        if rstep.len() != ministeps.len() {
            return Err(corrupted(format!(
                "RSTEP has {} elements, TSTEP {}",
                rstep.len(),
                ministeps.len()
            )));
        }

        let report_index = rstep
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag == 1)
            .map(|(step, _)| step)
            .collect();
        let slots = keys
            .iter()
            .enumerate()
            .map(|(slot, key)| (key.clone(), slot))
            .collect();

        debug!(
            file = %path.display(),
            keys = keys.len(),
            timesteps = ministeps.len(),
            "Opened summary cache"
        );

        Ok(Self {
            file,
            keys,
            slots,
            units,
            report_index,
            ministeps,
            start,
            start_date,
            restart,
            vectors: VectorCache::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn start(&self) -> StartDate {
        self.start
    }

    pub fn ministeps(&self) -> &[i32] {
        &self.ministeps
    }

    pub fn all_steps_available(&self) -> bool {
        self.ministeps.windows(2).all(|w| w[1] == w[0] + 1)
    }

    pub fn is_loaded(&self, key: &str) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| self.vectors.contains(*slot))
    }

    fn slot(&self, key: &str) -> SummaryResult<usize> {
        self.slots
            .get(key)
            .copied()
            .ok_or_else(|| SummaryError::KeyNotFound(key.to_string()))
    }
}

impl SummarySource for CachedSummary {
    fn keys(&self) -> &[String] {
        &self.keys
    }

    fn has_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    fn unit(&self, key: &str) -> SummaryResult<&str> {
        Ok(self.units[self.slot(key)?].as_str())
    }

    fn get(&self, key: &str) -> SummaryResult<Arc<[f32]>> {
        let slot = self.slot(key)?;
        if let Some(values) = self.vectors.get(slot) {
            return Ok(values);
        }

        let values = self.file.get_real_named(&vector_name(slot))?;
        if values.len() != self.ministeps.len() {
            return Err(SummaryError::CorruptedData {
                file: self.file.path().to_path_buf(),
                reason: format!(
                    "{} has {} samples, {} timesteps expected",
                    vector_name(slot),
                    values.len(),
                    self.ministeps.len()
                ),
            });
        }
        Ok(self.vectors.insert(slot, values))
    }

    fn report_index(&self) -> &[usize] {
        &self.report_index
    }

    fn timestep_count(&self) -> usize {
        self.ministeps.len()
    }

    fn start_date(&self) -> NaiveDateTime {
        self.start_date
    }

    fn restart_info(&self) -> Option<&RestartInfo> {
        self.restart.as_ref()
    }
}
