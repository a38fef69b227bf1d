//! Corner-point grid decoder.
//!
//! Reads a grid file (`.EGRID` / `.FEGRID`) and serves:
//!
//! - global/active cell index mapping
//! - cell corner points from pillars (COORD) and corner depths (ZCORN)
//! - partial layer reads straight from disk
//! - local grid refinements and their host cells
//! - non-neighbor connections, with transmissibilities from the companion
//!   initialization file
//!
//! # Example
//!
//! ```no_run
//! use grid_geometry::EGrid;
//!
//! let grid = EGrid::open("CASE.EGRID")?;
//! let corners = grid.cell_corners([0, 0, 0])?;
//! println!("{} active cells, top corner {:?}", grid.active_cells(), corners[0]);
//! # Ok::<(), grid_geometry::GridError>(())
//! ```

pub mod dims;
pub mod error;
pub mod grid;
pub mod init;
pub mod nnc;
pub mod transform;

pub use dims::{ActiveCellIndex, GridDimensions, Ijk};
pub use error::{GridError, GridResult};
pub use grid::{CellCorners, EGrid, GLOBAL_GRID};
pub use init::InitFile;
pub use nnc::{NncIjk, NonNeighborConnection};
pub use transform::{CoordinateTransform, MapUnits};
