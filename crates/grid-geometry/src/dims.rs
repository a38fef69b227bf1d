//! Grid dimensions and the global/active cell index mapping.

use crate::error::{GridError, GridResult};

/// Zero-based `(i, j, k)` cell coordinate.
pub type Ijk = [usize; 3];

/// Dimensions of one grid context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
    /// Number of coordinate regions (GRIDHEAD element 24, at least 1)
    pub num_regions: usize,
    /// Pillars hold polar `(r, theta)` coordinates
    pub radial: bool,
}

impl GridDimensions {
    pub fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self {
            ni,
            nj,
            nk,
            num_regions: 1,
            radial: false,
        }
    }

    /// Build from a GRIDHEAD array.
    pub fn from_gridhead(gridhead: &[i32]) -> GridResult<Self> {
        if gridhead.len() < 4 {
            return Err(GridError::InconsistentData(format!(
                "GRIDHEAD has {} elements, at least 4 required",
                gridhead.len()
            )));
        }

        let dim = |n: usize| -> GridResult<usize> {
            usize::try_from(gridhead[n]).map_err(|_| {
                GridError::InconsistentData(format!("negative grid dimension {}", gridhead[n]))
            })
        };

        let num_regions = gridhead.get(24).copied().filter(|v| *v > 0).unwrap_or(1) as usize;
        let radial = gridhead.get(26).is_some_and(|v| *v > 0);

        Ok(Self {
            ni: dim(1)?,
            nj: dim(2)?,
            nk: dim(3)?,
            num_regions,
            radial,
        })
    }

    pub fn as_array(&self) -> [usize; 3] {
        [self.ni, self.nj, self.nk]
    }

    pub fn cell_count(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    /// Row-major global index `i + j*ni + k*ni*nj`.
    pub fn global_index(&self, i: usize, j: usize, k: usize) -> GridResult<usize> {
        if i >= self.ni || j >= self.nj || k >= self.nk {
            return Err(GridError::OutOfRange(format!(
                "cell ({}, {}, {}) outside grid {}x{}x{}",
                i, j, k, self.ni, self.nj, self.nk
            )));
        }
        Ok(i + j * self.ni + k * self.ni * self.nj)
    }

    /// Inverse of [`GridDimensions::global_index`].
    pub fn ijk_from_global(&self, index: usize) -> GridResult<Ijk> {
        if index >= self.cell_count() {
            return Err(GridError::OutOfRange(format!(
                "global index {} outside grid with {} cells",
                index,
                self.cell_count()
            )));
        }
        Ok(decompose(index, self.ni, self.nj))
    }
}

/// Split a row-major index against `ni x nj` layers.
pub(crate) fn decompose(index: usize, ni: usize, nj: usize) -> Ijk {
    let layer = ni * nj;
    let k = index / layer;
    let rest = index % layer;
    [rest % ni, rest / ni, k]
}

/// Convert a one-based cell number stored in `array` to a zero-based index.
pub(crate) fn zero_based(array: &str, value: i32) -> GridResult<usize> {
    if value < 1 {
        return Err(GridError::CorruptedData(format!(
            "{} holds cell number {}, cell numbers start at 1",
            array, value
        )));
    }
    Ok(value as usize - 1)
}

/// Bijection between global cell indices and the dense active numbering.
#[derive(Debug, Clone, Default)]
pub struct ActiveCellIndex {
    active_of_global: Vec<Option<usize>>,
    global_of_active: Vec<usize>,
}

impl ActiveCellIndex {
    /// Every cell active.
    pub fn all_active(cells: usize) -> Self {
        Self {
            active_of_global: (0..cells).map(Some).collect(),
            global_of_active: (0..cells).collect(),
        }
    }

    /// Cells with a positive ACTNUM entry are active, in global order.
    pub fn from_actnum(actnum: &[i32]) -> Self {
        let mut active_of_global = Vec::with_capacity(actnum.len());
        let mut global_of_active = Vec::new();

        for (global, flag) in actnum.iter().enumerate() {
            if *flag > 0 {
                active_of_global.push(Some(global_of_active.len()));
                global_of_active.push(global);
            } else {
                active_of_global.push(None);
            }
        }

        Self {
            active_of_global,
            global_of_active,
        }
    }

    pub fn active_count(&self) -> usize {
        self.global_of_active.len()
    }

    /// Active index of a global cell, `None` for inactive cells.
    pub fn active(&self, global: usize) -> Option<usize> {
        self.active_of_global.get(global).copied().flatten()
    }

    pub fn global(&self, active: usize) -> Option<usize> {
        self.global_of_active.get(active).copied()
    }
}
