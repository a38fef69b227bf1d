//! Grid file decoder.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use ecl_format::EclFile;
use once_cell::unsync::OnceCell;
use tracing::{debug, info};

use crate::dims::{decompose, zero_based, ActiveCellIndex, GridDimensions, Ijk};
use crate::error::{GridError, GridResult};
use crate::init::InitFile;
use crate::nnc::{self, NncIjk, NonNeighborConnection};
use crate::transform::{CoordinateTransform, MapUnits};

/// Name of the top-level grid context.
pub const GLOBAL_GRID: &str = "global";

/// Eight corner points of a cell, top face first:
///
/// ```text
/// 0 --- 1      4 --- 5
/// |     |      |     |
/// 2 --- 3      6 --- 7
///   top         bottom
/// ```
pub type CellCorners = [[f64; 3]; 8];

// =============================================================================
// Open
// =============================================================================

/// Decoded grid context of a grid file.
///
/// Topology, active cells and LGR bookkeeping are built on open. COORD,
/// ZCORN and the connection arrays are read on first use and cached.
#[derive(Debug)]
pub struct EGrid {
    file: EclFile,
    grid_name: String,
    init_path: PathBuf,

    dims: GridDimensions,
    host_dims: Option<GridDimensions>,
    active: ActiveCellIndex,
    lgr_names: Vec<String>,
    layer_regions: Vec<usize>,
    host_cells: Vec<usize>,

    map_units: Option<MapUnits>,
    map_axes: Option<[f64; 6]>,
    transform: Option<CoordinateTransform>,

    coord_index: Option<usize>,
    zcorn_index: Option<usize>,
    nnc_index: Option<(usize, usize)>,

    coord: OnceCell<Vec<f32>>,
    zcorn: OnceCell<Vec<f32>>,
    nncs: OnceCell<Vec<NonNeighborConnection>>,
}

#[derive(Default)]
struct ContextArrays {
    gridhead: Option<Vec<i32>>,
    coord: Option<usize>,
    coordsys: Option<usize>,
    zcorn: Option<usize>,
    actnum: Option<usize>,
    nnc1: Option<usize>,
    nnc2: Option<usize>,
    hostnum: Option<usize>,
}

impl EGrid {
    /// Open the top-level grid of a file.
    pub fn open(path: impl AsRef<Path>) -> GridResult<Self> {
        Self::open_grid(path, GLOBAL_GRID)
    }

    /// Open the named grid context (`"global"` or an LGR name).
    pub fn open_grid(path: impl AsRef<Path>, grid_name: &str) -> GridResult<Self> {
        let path = path.as_ref();
        let file = EclFile::open(path)?;

        let mut context = GLOBAL_GRID.to_string();
        let mut lgr_names = Vec::new();
        let mut arrays = ContextArrays::default();
        let mut host_dims = None;
        let mut map_units = None;
        let mut map_axes = None;
        let mut length_factor = 1.0;

        for (n, entry) in file.entries().iter().enumerate() {
            match entry.name.as_str() {
                "ENDLGR" => context = GLOBAL_GRID.to_string(),
                "LGR" => {
                    let name = first_string(&file, n)?;
                    lgr_names.push(name.clone());
                    context = name;
                }
                "NNCHEAD" => {
                    let grid = file.get_int(n)?.get(1).copied().unwrap_or(0);
                    context = if grid <= 0 {
                        GLOBAL_GRID.to_string()
                    } else {
                        lgr_names.get(grid as usize - 1).cloned().ok_or_else(|| {
                            GridError::InconsistentData(format!(
                                "NNCHEAD refers to LGR number {} but only {} LGRs are defined",
                                grid,
                                lgr_names.len()
                            ))
                        })?
                    };
                }
                "MAPUNITS" => {
                    let units = MapUnits::parse(&first_string(&file, n)?)?;
                    length_factor = units.length_factor();
                    map_units = Some(units);
                }
                "MAPAXES" => {
                    let values = file.get_real(n)?;
                    if values.len() < 6 {
                        return Err(GridError::InconsistentData(format!(
                            "MAPAXES has {} elements, 6 required",
                            values.len()
                        )));
                    }
                    let mut axes = [0.0; 6];
                    for (dst, src) in axes.iter_mut().zip(&values) {
                        *dst = *src as f64 * length_factor;
                    }
                    map_axes = Some(axes);
                }
                _ => {}
            }

            let is_gridhead = entry.name == "GRIDHEAD";
            let in_context = context == grid_name;
            let in_global = context == GLOBAL_GRID;

            if is_gridhead && (in_context || in_global) {
                let gridhead = file.get_int(n)?;
                if in_global {
                    host_dims = Some(GridDimensions::from_gridhead(&gridhead)?);
                }
                if in_context {
                    arrays.gridhead = Some(gridhead);
                }
            }

            if in_context {
                match entry.name.as_str() {
                    "COORD" => arrays.coord = Some(n),
                    "COORDSYS" => arrays.coordsys = Some(n),
                    "ZCORN" => arrays.zcorn = Some(n),
                    "ACTNUM" => arrays.actnum = Some(n),
                    "NNC1" => arrays.nnc1 = Some(n),
                    "NNC2" => arrays.nnc2 = Some(n),
                    "HOSTNUM" => arrays.hostnum = Some(n),
                    _ => {}
                }
            }
        }

        let gridhead = arrays
            .gridhead
            .ok_or_else(|| GridError::GridNotFound(grid_name.to_string()))?;
        let dims = GridDimensions::from_gridhead(&gridhead)?;

        let layer_regions = match arrays.coordsys {
            Some(index) => layer_regions(&file.get_int(index)?, &dims)?,
            None => vec![0; dims.nk],
        };

        let active = match arrays.actnum {
            Some(index) => {
                let actnum = file.get_int(index)?;
                if actnum.len() != dims.cell_count() {
                    return Err(GridError::InconsistentData(format!(
                        "ACTNUM has {} elements, grid has {} cells",
                        actnum.len(),
                        dims.cell_count()
                    )));
                }
                ActiveCellIndex::from_actnum(&actnum)
            }
            None => ActiveCellIndex::all_active(dims.cell_count()),
        };

        let host_cells = match arrays.hostnum {
            Some(index) => file
                .get_int(index)?
                .into_iter()
                .map(|v| zero_based("HOSTNUM", v))
                .collect::<GridResult<_>>()?,
            None => Vec::new(),
        };

        let transform = map_axes
            .as_ref()
            .map(CoordinateTransform::from_mapaxes)
            .transpose()?;

        let init_path = init_file_path(path, file.is_formatted());

        info!(
            file = %path.display(),
            grid = grid_name,
            ni = dims.ni,
            nj = dims.nj,
            nk = dims.nk,
            active = active.active_count(),
            lgrs = lgr_names.len(),
            "Opened grid file"
        );

        Ok(Self {
            file,
            grid_name: grid_name.to_string(),
            init_path,
            dims,
            host_dims,
            active,
            lgr_names,
            layer_regions,
            host_cells,
            map_units,
            map_axes,
            transform,
            coord_index: arrays.coord,
            zcorn_index: arrays.zcorn,
            nnc_index: arrays.nnc1.zip(arrays.nnc2),
            coord: OnceCell::new(),
            zcorn: OnceCell::new(),
            nncs: OnceCell::new(),
        })
    }

    // =========================================================================
    // Topology
    // =========================================================================

    pub fn grid_name(&self) -> &str {
        &self.grid_name
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Path of the companion initialization file (may not exist).
    pub fn init_path(&self) -> &Path {
        &self.init_path
    }

    pub fn is_formatted(&self) -> bool {
        self.file.is_formatted()
    }

    pub fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    /// Dimensions of the top-level grid.
    pub fn host_dimensions(&self) -> Option<[usize; 3]> {
        self.host_dims.map(|d| d.as_array())
    }

    pub fn total_cells(&self) -> usize {
        self.dims.cell_count()
    }

    pub fn active_cells(&self) -> usize {
        self.active.active_count()
    }

    pub fn is_radial(&self) -> bool {
        self.dims.radial
    }

    pub fn num_regions(&self) -> usize {
        self.dims.num_regions
    }

    /// LGR names in file order.
    pub fn lgr_names(&self) -> &[String] {
        &self.lgr_names
    }

    pub fn map_units(&self) -> Option<MapUnits> {
        self.map_units
    }

    /// MAPAXES control points, scaled to metres.
    pub fn map_axes(&self) -> Option<[f64; 6]> {
        self.map_axes
    }

    pub fn transform(&self) -> Option<&CoordinateTransform> {
        self.transform.as_ref()
    }

    pub fn global_index(&self, i: usize, j: usize, k: usize) -> GridResult<usize> {
        self.dims.global_index(i, j, k)
    }

    /// Active index of a cell, `None` when the cell is inactive.
    pub fn active_index(&self, i: usize, j: usize, k: usize) -> GridResult<Option<usize>> {
        let global = self.dims.global_index(i, j, k)?;
        Ok(self.active.active(global))
    }

    pub fn ijk_from_global(&self, index: usize) -> GridResult<Ijk> {
        self.dims.ijk_from_global(index)
    }

    pub fn ijk_from_active(&self, index: usize) -> GridResult<Ijk> {
        let global = self.active.global(index).ok_or_else(|| {
            GridError::OutOfRange(format!(
                "active index {} outside grid with {} active cells",
                index,
                self.active.active_count()
            ))
        })?;
        self.dims.ijk_from_global(global)
    }

    /// Zero-based host cell of every refined cell (empty for the global grid).
    pub fn host_cells(&self) -> &[usize] {
        &self.host_cells
    }

    /// Host cells decomposed against the top-level grid dimensions.
    pub fn host_cells_ijk(&self) -> GridResult<Vec<Ijk>> {
        let host = self.host_dims.unwrap_or(self.dims);
        if host.ni == 0 || host.nj == 0 {
            return Err(GridError::InconsistentData(
                "top-level grid has zero extent".to_string(),
            ));
        }
        Ok(self
            .host_cells
            .iter()
            .map(|cell| decompose(*cell, host.ni, host.nj))
            .collect())
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    fn coord(&self) -> GridResult<&[f32]> {
        self.coord
            .get_or_try_init(|| self.load_real(self.coord_index, "COORD"))
            .map(Vec::as_slice)
    }

    fn zcorn(&self) -> GridResult<&[f32]> {
        self.zcorn
            .get_or_try_init(|| self.load_real(self.zcorn_index, "ZCORN"))
            .map(Vec::as_slice)
    }

    fn load_real(&self, index: Option<usize>, name: &str) -> GridResult<Vec<f32>> {
        let index = index.ok_or_else(|| {
            GridError::InconsistentData(format!("{} missing for grid '{}'", name, self.grid_name))
        })?;
        let values = self.file.get_real(index)?;
        debug!(array = name, elements = values.len(), "Loaded geometry array");
        Ok(values)
    }

    /// Top and bottom point of a pillar, converted to Cartesian for radial grids.
    fn pillar(&self, coord: &[f32], start: usize) -> GridResult<([f64; 3], [f64; 3])> {
        let p = coord.get(start..start + 6).ok_or_else(|| {
            GridError::InconsistentData(format!(
                "COORD has {} elements, pillar at {} requested",
                coord.len(),
                start
            ))
        })?;
        let p: Vec<f64> = p.iter().map(|v| *v as f64).collect();

        if self.dims.radial {
            let (ts, tc) = p[1].to_radians().sin_cos();
            let (bs, bc) = p[4].to_radians().sin_cos();
            Ok(([p[0] * tc, p[0] * ts, p[2]], [p[3] * bc, p[3] * bs, p[5]]))
        } else {
            Ok(([p[0], p[1], p[2]], [p[3], p[4], p[5]]))
        }
    }

    /// COORD offsets of the four pillars around column `(i, j)` in layer `k`.
    fn pillar_offsets(&self, i: usize, j: usize, k: usize) -> GridResult<[usize; 4]> {
        let ni = self.dims.ni;
        let nj = self.dims.nj;
        let region = *self.layer_regions.get(k).ok_or_else(|| {
            GridError::OutOfRange(format!("layer {} outside grid with {} layers", k, self.dims.nk))
        })?;

        let p0 = region * (ni + 1) * (nj + 1) * 6 + j * (ni + 1) * 6 + i * 6;
        let p2 = p0 + (ni + 1) * 6;
        Ok([p0, p0 + 6, p2, p2 + 6])
    }

    /// Corner points of cell `(i, j, k)`.
    pub fn cell_corners(&self, ijk: Ijk) -> GridResult<CellCorners> {
        let [i, j, k] = ijk;
        self.dims.global_index(i, j, k)?;

        let ni = self.dims.ni;
        let nj = self.dims.nj;
        let coord = self.coord()?;
        let zcorn = self.zcorn()?;

        let z0 = k * ni * nj * 8 + j * ni * 4 + i * 2;
        let top = [z0, z0 + 1, z0 + ni * 2, z0 + ni * 2 + 1];
        let layer = ni * nj * 4;

        let depth = |n: usize| -> GridResult<f64> {
            zcorn.get(n).map(|z| *z as f64).ok_or_else(|| {
                GridError::InconsistentData(format!(
                    "ZCORN has {} elements, index {} requested",
                    zcorn.len(),
                    n
                ))
            })
        };

        let pillars = self.pillar_offsets(i, j, k)?;
        let mut corners = [[0.0; 3]; 8];

        for n in 0..4 {
            let (pt, pb) = self.pillar(coord, pillars[n])?;
            let z_top = depth(top[n])?;
            let z_bottom = depth(top[n] + layer)?;

            let (x, y) = lateral_at_depth(pt, pb, z_top);
            corners[n] = [x, y, z_top];
            let (x, y) = lateral_at_depth(pt, pb, z_bottom);
            corners[n + 4] = [x, y, z_bottom];
        }

        Ok(corners)
    }

    pub fn cell_corners_global(&self, index: usize) -> GridResult<CellCorners> {
        self.cell_corners(self.dims.ijk_from_global(index)?)
    }

    /// Corner points with x/y mapped through MAPAXES, when present.
    pub fn cell_corners_mapped(&self, ijk: Ijk) -> GridResult<CellCorners> {
        let mut corners = self.cell_corners(ijk)?;
        if let Some(transform) = &self.transform {
            for corner in corners.iter_mut() {
                let (x, y) = transform.apply(corner[0], corner[1]);
                corner[0] = x;
                corner[1] = y;
            }
        }
        Ok(corners)
    }

    /// Four corner points per cell of one layer face, cells ordered j-major
    /// then i, restricted to the given inclusive i/j ranges.
    ///
    /// Uses the cached ZCORN when it is loaded; otherwise reads only the
    /// requested face from disk, which requires a binary file.
    pub fn layer_slice(
        &self,
        layer: usize,
        i_range: RangeInclusive<usize>,
        j_range: RangeInclusive<usize>,
        bottom_face: bool,
    ) -> GridResult<Vec<[f32; 3]>> {
        let ni = self.dims.ni;
        let nj = self.dims.nj;

        if layer >= self.dims.nk {
            return Err(GridError::OutOfRange(format!(
                "invalid layer index {}, valid range [0, {}]",
                layer,
                self.dims.nk.saturating_sub(1)
            )));
        }
        let (i1, i2) = (*i_range.start(), *i_range.end());
        let (j1, j2) = (*j_range.start(), *j_range.end());
        if i1 > i2 || i2 >= ni || j1 > j2 || j2 >= nj {
            return Err(GridError::OutOfRange(format!(
                "invalid box i {}..={} j {}..={} for grid {}x{}",
                i1, i2, j1, j2, ni, nj
            )));
        }

        let nodes = ni * nj * 4;
        let offset = nodes * layer * 2 + if bottom_face { nodes } else { 0 };

        let face: Vec<f32> = match self.zcorn.get() {
            Some(zcorn) => zcorn
                .get(offset..offset + nodes)
                .ok_or_else(|| {
                    GridError::InconsistentData(format!(
                        "ZCORN has {} elements, face {}..{} requested",
                        zcorn.len(),
                        offset,
                        offset + nodes
                    ))
                })?
                .to_vec(),
            None => self.read_face_from_disk(offset, nodes)?,
        };

        let coord = self.coord()?;
        let mut points = Vec::with_capacity((i2 - i1 + 1) * (j2 - j1 + 1) * 4);

        for j in j1..=j2 {
            for i in i1..=i2 {
                let pillars = self.pillar_offsets(i, j, layer)?;
                let z0 = j * ni * 4 + i * 2;
                let zind = [z0, z0 + 1, z0 + ni * 2, z0 + ni * 2 + 1];

                for n in 0..4 {
                    let (pt, pb) = self.pillar(coord, pillars[n])?;
                    let z = face[zind[n]] as f64;
                    let (x, y) = lateral_at_depth(pt, pb, z);
                    points.push([x as f32, y as f32, z as f32]);
                }
            }
        }

        Ok(points)
    }

    /// [`EGrid::layer_slice`] over the whole i/j extent.
    pub fn layer_slice_full(&self, layer: usize, bottom_face: bool) -> GridResult<Vec<[f32; 3]>> {
        if self.dims.ni == 0 || self.dims.nj == 0 {
            return Ok(Vec::new());
        }
        self.layer_slice(layer, 0..=self.dims.ni - 1, 0..=self.dims.nj - 1, bottom_face)
    }

    fn read_face_from_disk(&self, offset: usize, nodes: usize) -> GridResult<Vec<f32>> {
        if self.file.is_formatted() {
            return Err(GridError::InvalidOperation(
                "partial loading of ZCORN is not possible for formatted files".to_string(),
            ));
        }
        let index = self.zcorn_index.ok_or_else(|| {
            GridError::InconsistentData(format!("ZCORN missing for grid '{}'", self.grid_name))
        })?;

        debug!(offset, nodes, "Reading ZCORN face from disk");
        Ok(self.file.read_real_range(index, offset, nodes)?)
    }

    // =========================================================================
    // Non-neighbor connections
    // =========================================================================

    /// Connections of this grid context, loaded on first call.
    ///
    /// When the initialization file exists, its dimensions and active cell
    /// count must match this grid and `TRANNNC` supplies transmissibilities.
    pub fn non_neighbor_connections(&self) -> GridResult<&[NonNeighborConnection]> {
        self.nncs
            .get_or_try_init(|| self.load_nncs())
            .map(Vec::as_slice)
    }

    /// Connections with both endpoints as `(i, j, k)`.
    pub fn nnc_ijk(&self) -> GridResult<Vec<NncIjk>> {
        self.non_neighbor_connections()?
            .iter()
            .map(|c| {
                Ok(NncIjk {
                    ijk1: self.dims.ijk_from_global(c.cell1)?,
                    ijk2: self.dims.ijk_from_global(c.cell2)?,
                    transmissibility: c.transmissibility,
                })
            })
            .collect()
    }

    fn load_nncs(&self) -> GridResult<Vec<NonNeighborConnection>> {
        let Some((i1, i2)) = self.nnc_index else {
            return Ok(Vec::new());
        };

        let nnc1 = self.file.get_int(i1)?;
        let nnc2 = self.file.get_int(i2)?;
        if nnc1.len() != nnc2.len() {
            return Err(GridError::InconsistentData(format!(
                "NNC1 has {} elements, NNC2 has {}",
                nnc1.len(),
                nnc2.len()
            )));
        }

        let trans = if !nnc1.is_empty() && self.init_path.exists() {
            Some(self.load_transmissibility(nnc1.len())?)
        } else {
            None
        };

        debug!(
            grid = %self.grid_name,
            connections = nnc1.len(),
            transmissibility = trans.is_some(),
            "Loaded non-neighbor connections"
        );

        nnc::from_arrays(&nnc1, &nnc2, trans.as_deref())
    }

    fn load_transmissibility(&self, connections: usize) -> GridResult<Vec<f32>> {
        let init = InitFile::open(&self.init_path)?;

        let init_dims = init.grid_dimension(&self.grid_name)?;
        if init_dims != self.dims.as_array() {
            return Err(GridError::InconsistentData(format!(
                "grid dimensions {}x{}x{} differ from initialization file {}x{}x{}",
                self.dims.ni, self.dims.nj, self.dims.nk, init_dims[0], init_dims[1], init_dims[2]
            )));
        }

        let init_active = init.active_cells(&self.grid_name)?;
        if init_active != self.active.active_count() {
            return Err(GridError::InconsistentData(format!(
                "grid has {} active cells, initialization file {}",
                self.active.active_count(),
                init_active
            )));
        }

        let trans = init.get_real("TRANNNC", &self.grid_name)?;
        if trans.len() != connections {
            return Err(GridError::InconsistentData(format!(
                "TRANNNC has {} elements, NNC1 and NNC2 have {}",
                trans.len(),
                connections
            )));
        }

        Ok(trans)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn first_string(file: &EclFile, index: usize) -> GridResult<String> {
    Ok(file
        .get_string(index)?
        .into_iter()
        .next()
        .unwrap_or_default())
}

/// Layer to coordinate-region table from COORDSYS (6 ints per region,
/// one-based inclusive layer range in the first two).
fn layer_regions(coordsys: &[i32], dims: &GridDimensions) -> GridResult<Vec<usize>> {
    let mut regions = vec![0; dims.nk];

    for (region, record) in coordsys.chunks(6).take(dims.num_regions).enumerate() {
        let (l1, l2) = match record {
            [l1, l2, ..] => (*l1, *l2),
            _ => break,
        };
        if l1 < 1 || l2 < l1 || l2 as usize > dims.nk {
            return Err(GridError::InconsistentData(format!(
                "COORDSYS region {} covers layers {}..{} of {}",
                region + 1,
                l1,
                l2,
                dims.nk
            )));
        }
        for slot in &mut regions[l1 as usize - 1..l2 as usize] {
            *slot = region;
        }
    }

    Ok(regions)
}

/// Lateral position on a pillar at depth `z`.
fn lateral_at_depth(top: [f64; 3], bottom: [f64; 3], z: f64) -> (f64, f64) {
    let (zt, zb) = (top[2], bottom[2]);
    if zt == zb {
        return (top[0], top[1]);
    }
    let t = (zt - z) / (zt - zb);
    (top[0] + (bottom[0] - top[0]) * t, top[1] + (bottom[1] - top[1]) * t)
}

/// `<dir>/<stem>.INIT` or `.FINIT`.
fn init_file_path(grid_path: &Path, formatted: bool) -> PathBuf {
    let ext = if formatted { "FINIT" } else { "INIT" };
    grid_path.with_extension(ext)
}
