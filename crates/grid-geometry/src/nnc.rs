//! Non-neighbor connections.

use crate::dims::{zero_based, Ijk};
use crate::error::GridResult;

/// Connection between two cells that are not logical neighbors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonNeighborConnection {
    /// Zero-based global index of the first cell
    pub cell1: usize,
    /// Zero-based global index of the second cell
    pub cell2: usize,
    /// TRANNNC from the initialization file, when available
    pub transmissibility: Option<f32>,
}

/// Connection with both endpoints decomposed into `(i, j, k)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NncIjk {
    pub ijk1: Ijk,
    pub ijk2: Ijk,
    pub transmissibility: Option<f32>,
}

pub(crate) fn from_arrays(
    nnc1: &[i32],
    nnc2: &[i32],
    trans: Option<&[f32]>,
) -> GridResult<Vec<NonNeighborConnection>> {
    nnc1.iter()
        .zip(nnc2)
        .enumerate()
        .map(|(n, (c1, c2))| {
            Ok(NonNeighborConnection {
                cell1: zero_based("NNC1", *c1)?,
                cell2: zero_based("NNC2", *c2)?,
                transmissibility: trans.and_then(|t| t.get(n).copied()),
            })
        })
        .collect()
}
