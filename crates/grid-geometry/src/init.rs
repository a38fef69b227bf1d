//! Companion initialization file (`.INIT` / `.FINIT`).
//!
//! The file starts with the global grid section. Every `LGRINIT` record
//! (first element = LGR name) opens the section of that refinement. Each
//! section carries its own `INTEHEAD`, where elements 8, 9 and 10 are the
//! grid dimensions and element 11 the number of active cells.

use std::ops::Range;
use std::path::Path;

use ecl_format::EclFile;
use tracing::debug;

use crate::error::{GridError, GridResult};
use crate::grid::GLOBAL_GRID;

const INTEHEAD_NI: usize = 8;
const INTEHEAD_NJ: usize = 9;
const INTEHEAD_NK: usize = 10;
const INTEHEAD_NACTIVE: usize = 11;

#[derive(Debug, Clone)]
struct Section {
    name: String,
    arrays: Range<usize>,
}

/// Initialization file split into per-grid sections.
#[derive(Debug)]
pub struct InitFile {
    file: EclFile,
    sections: Vec<Section>,
}

impl InitFile {
    pub fn open(path: impl AsRef<Path>) -> GridResult<Self> {
        let file = EclFile::open(path)?;
        let mut sections = vec![Section {
            name: GLOBAL_GRID.to_string(),
            arrays: 0..file.entries().len(),
        }];

        for (index, entry) in file.entries().iter().enumerate() {
            if entry.name == "LGRINIT" {
                let name = file
                    .get_string(index)?
                    .into_iter()
                    .next()
                    .unwrap_or_default();

                if let Some(last) = sections.last_mut() {
                    last.arrays.end = index;
                }
                sections.push(Section {
                    name,
                    arrays: index + 1..file.entries().len(),
                });
            }
        }

        debug!(
            file = %file.path().display(),
            grids = sections.len(),
            "Opened initialization file"
        );

        Ok(Self { file, sections })
    }

    /// Names of all grid sections, global first.
    pub fn grid_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.name.as_str()).collect()
    }

    fn section(&self, grid: &str) -> GridResult<&Section> {
        self.sections
            .iter()
            .find(|s| s.name == grid)
            .ok_or_else(|| GridError::GridNotFound(grid.to_string()))
    }

    fn find(&self, array: &str, grid: &str) -> GridResult<Option<usize>> {
        let section = self.section(grid)?;
        Ok(section
            .arrays
            .clone()
            .find(|n| self.file.entries()[*n].name == array))
    }

    fn intehead(&self, grid: &str) -> GridResult<Vec<i32>> {
        let index = self.find("INTEHEAD", grid)?.ok_or_else(|| {
            GridError::InconsistentData(format!("INTEHEAD missing for grid '{}'", grid))
        })?;
        let intehead = self.file.get_int(index)?;

        if intehead.len() <= INTEHEAD_NACTIVE {
            return Err(GridError::InconsistentData(format!(
                "INTEHEAD for grid '{}' has only {} elements",
                grid,
                intehead.len()
            )));
        }
        Ok(intehead)
    }

    pub fn grid_dimension(&self, grid: &str) -> GridResult<[usize; 3]> {
        let intehead = self.intehead(grid)?;
        Ok([
            intehead[INTEHEAD_NI].max(0) as usize,
            intehead[INTEHEAD_NJ].max(0) as usize,
            intehead[INTEHEAD_NK].max(0) as usize,
        ])
    }

    pub fn active_cells(&self, grid: &str) -> GridResult<usize> {
        Ok(self.intehead(grid)?[INTEHEAD_NACTIVE].max(0) as usize)
    }

    pub fn has_array(&self, array: &str, grid: &str) -> GridResult<bool> {
        Ok(self.find(array, grid)?.is_some())
    }

    /// Real-valued array of one grid section.
    pub fn get_real(&self, array: &str, grid: &str) -> GridResult<Vec<f32>> {
        let index = self.find(array, grid)?.ok_or_else(|| {
            GridError::InconsistentData(format!("array {} missing for grid '{}'", array, grid))
        })?;
        Ok(self.file.get_real(index)?)
    }
}
