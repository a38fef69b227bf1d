//! Builders that write synthetic simulator output files.
//!
//! Every builder produces real container files through `ecl-format`, so the
//! decoders under test read exactly what they would read from a simulator
//! run. Geometry and sample values follow simple closed-form patterns that
//! tests can recompute.

use std::path::{Path, PathBuf};

use ecl_format::{EclOutput, EclResult};

/// Placeholder name used for series without a well or group.
pub const NO_NAME: &str = ":+:+:+:+";

fn ext(formatted: bool, binary: &str) -> String {
    if formatted {
        format!("F{}", binary)
    } else {
        binary.to_string()
    }
}

// =============================================================================
// Grid files
// =============================================================================

/// Local grid refinement written after the global grid.
#[derive(Debug, Clone)]
pub struct LgrSpec {
    pub name: String,
    pub grid: GridBuilder,
    /// One-based host cell of every refined cell
    pub hostnum: Vec<i32>,
}

/// Regular corner-point grid with optionally tilted pillars.
///
/// Pillar `(i, j)` runs from `(i*dx, j*dy, top)` to
/// `(i*dx + tilt_x, j*dy + tilt_y, top + nk*dz)`. Layer `k` spans depths
/// `top + k*dz` to `top + (k+1)*dz`.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
    pub top: f32,
    pub tilt: (f32, f32),
    pub actnum: Option<Vec<i32>>,
    pub radial: bool,
    pub map_units: Option<String>,
    pub map_axes: Option<[f32; 6]>,
    /// One-based global cell pairs
    pub nnc: Vec<(i32, i32)>,
    pub lgrs: Vec<LgrSpec>,
    /// Coordinate regions: one-based inclusive layer range and the x shift
    /// applied to that region's pillars
    pub coord_regions: Vec<(usize, usize, f32)>,
}

impl GridBuilder {
    pub fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self {
            ni,
            nj,
            nk,
            dx: 100.0,
            dy: 100.0,
            dz: 10.0,
            top: 2000.0,
            tilt: (0.0, 0.0),
            actnum: None,
            radial: false,
            map_units: None,
            map_axes: None,
            nnc: Vec::new(),
            lgrs: Vec::new(),
            coord_regions: Vec::new(),
        }
    }

    pub fn cell_size(mut self, dx: f32, dy: f32, dz: f32) -> Self {
        self.dx = dx;
        self.dy = dy;
        self.dz = dz;
        self
    }

    pub fn top(mut self, top: f32) -> Self {
        self.top = top;
        self
    }

    pub fn tilt(mut self, tx: f32, ty: f32) -> Self {
        self.tilt = (tx, ty);
        self
    }

    pub fn actnum(mut self, actnum: Vec<i32>) -> Self {
        self.actnum = Some(actnum);
        self
    }

    /// Interpret `dx` as radial and `dy` as angular (degrees) spacing.
    pub fn radial(mut self) -> Self {
        self.radial = true;
        self
    }

    pub fn map_units(mut self, units: &str) -> Self {
        self.map_units = Some(units.to_string());
        self
    }

    pub fn map_axes(mut self, axes: [f32; 6]) -> Self {
        self.map_axes = Some(axes);
        self
    }

    pub fn nnc(mut self, cell1: i32, cell2: i32) -> Self {
        self.nnc.push((cell1, cell2));
        self
    }

    pub fn lgr(mut self, name: &str, grid: GridBuilder, hostnum: Vec<i32>) -> Self {
        self.lgrs.push(LgrSpec {
            name: name.to_string(),
            grid,
            hostnum,
        });
        self
    }

    /// Add a COORDSYS region. Each region gets its own COORD block.
    pub fn coord_region(mut self, first_layer: usize, last_layer: usize, shift_x: f32) -> Self {
        self.coord_regions.push((first_layer, last_layer, shift_x));
        self
    }

    pub fn cell_count(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    pub fn active_count(&self) -> usize {
        match &self.actnum {
            Some(actnum) => actnum.iter().filter(|v| **v > 0).count(),
            None => self.cell_count(),
        }
    }

    pub fn gridhead(&self) -> Vec<i32> {
        let mut gridhead = vec![0; 100];
        gridhead[0] = 1;
        gridhead[1] = self.ni as i32;
        gridhead[2] = self.nj as i32;
        gridhead[3] = self.nk as i32;
        gridhead[24] = self.coord_regions.len().max(1) as i32;
        gridhead[26] = i32::from(self.radial);
        gridhead
    }

    pub fn coord(&self) -> Vec<f32> {
        let shifts: Vec<f32> = if self.coord_regions.is_empty() {
            vec![0.0]
        } else {
            self.coord_regions.iter().map(|r| r.2).collect()
        };
        let bottom = self.top + self.nk as f32 * self.dz;
        let mut coord = Vec::with_capacity(shifts.len() * (self.ni + 1) * (self.nj + 1) * 6);

        for shift in shifts {
            for j in 0..=self.nj {
                for i in 0..=self.ni {
                    let x = i as f32 * self.dx + shift;
                    let y = j as f32 * self.dy;
                    coord.extend([x, y, self.top, x + self.tilt.0, y + self.tilt.1, bottom]);
                }
            }
        }
        coord
    }

    pub fn coordsys(&self) -> Vec<i32> {
        self.coord_regions
            .iter()
            .flat_map(|(first, last, _)| [*first as i32, *last as i32, 0, 0, 0, 0])
            .collect()
    }

    /// Depth of a layer face.
    pub fn face_depth(&self, k: usize, bottom: bool) -> f32 {
        self.top + (k + usize::from(bottom)) as f32 * self.dz
    }

    pub fn zcorn(&self) -> Vec<f32> {
        let face = self.ni * self.nj * 4;
        let mut zcorn = Vec::with_capacity(face * 2 * self.nk);

        for k in 0..self.nk {
            zcorn.extend(std::iter::repeat(self.face_depth(k, false)).take(face));
            zcorn.extend(std::iter::repeat(self.face_depth(k, true)).take(face));
        }
        zcorn
    }

    fn write_grid<W: std::io::Write>(&self, out: &mut EclOutput<W>) -> EclResult<()> {
        out.write_int("GRIDHEAD", &self.gridhead())?;
        out.write_real("COORD", &self.coord())?;
        if !self.coord_regions.is_empty() {
            out.write_int("COORDSYS", &self.coordsys())?;
        }
        out.write_real("ZCORN", &self.zcorn())?;
        if let Some(actnum) = &self.actnum {
            out.write_int("ACTNUM", actnum)?;
        }
        Ok(())
    }

    /// Write `<dir>/<stem>.EGRID` (or `.FEGRID`).
    pub fn write(&self, dir: &Path, stem: &str, formatted: bool) -> EclResult<PathBuf> {
        let path = dir.join(format!("{}.{}", stem, ext(formatted, "EGRID")));
        let mut out = EclOutput::create(&path)?;

        let mut filehead = vec![0; 100];
        filehead[0] = 3;
        filehead[1] = 2007;
        out.write_int("FILEHEAD", &filehead)?;

        if let Some(units) = &self.map_units {
            out.write_string("MAPUNITS", &[units.clone()])?;
        }
        if let Some(axes) = &self.map_axes {
            out.write_real("MAPAXES", axes)?;
        }

        self.write_grid(&mut out)?;
        out.write_int("ENDGRID", &[])?;

        for lgr in &self.lgrs {
            out.write_string("LGR", &[lgr.name.clone()])?;
            lgr.grid.write_grid(&mut out)?;
            out.write_int("HOSTNUM", &lgr.hostnum)?;
            out.write_int("ENDGRID", &[])?;
            out.write_int("ENDLGR", &[])?;
        }

        if !self.nnc.is_empty() {
            let mut nnchead = vec![0; 10];
            nnchead[0] = self.nnc.len() as i32;
            out.write_int("NNCHEAD", &nnchead)?;
            let (nnc1, nnc2): (Vec<i32>, Vec<i32>) = self.nnc.iter().copied().unzip();
            out.write_int("NNC1", &nnc1)?;
            out.write_int("NNC2", &nnc2)?;
        }

        out.finish()?;
        Ok(path)
    }
}

/// One grid section of an initialization file.
#[derive(Debug, Clone)]
pub struct InitSection {
    pub lgr_name: Option<String>,
    pub dims: [usize; 3],
    pub active_cells: usize,
    pub trannnc: Option<Vec<f32>>,
}

/// Initialization file matching a [`GridBuilder`].
#[derive(Debug, Clone)]
pub struct InitBuilder {
    pub sections: Vec<InitSection>,
}

impl InitBuilder {
    /// Consistent sections for the global grid and every LGR.
    pub fn for_grid(grid: &GridBuilder) -> Self {
        let mut sections = vec![InitSection {
            lgr_name: None,
            dims: [grid.ni, grid.nj, grid.nk],
            active_cells: grid.active_count(),
            trannnc: None,
        }];
        for lgr in &grid.lgrs {
            sections.push(InitSection {
                lgr_name: Some(lgr.name.clone()),
                dims: [lgr.grid.ni, lgr.grid.nj, lgr.grid.nk],
                active_cells: lgr.grid.active_count(),
                trannnc: None,
            });
        }
        Self { sections }
    }

    /// TRANNNC of the global section.
    pub fn trannnc(mut self, values: Vec<f32>) -> Self {
        self.sections[0].trannnc = Some(values);
        self
    }

    /// Override the active cell count of the global section.
    pub fn active_cells(mut self, count: usize) -> Self {
        self.sections[0].active_cells = count;
        self
    }

    /// Override the dimensions of the global section.
    pub fn dims(mut self, dims: [usize; 3]) -> Self {
        self.sections[0].dims = dims;
        self
    }

    /// Write `<dir>/<stem>.INIT` (or `.FINIT`).
    pub fn write(&self, dir: &Path, stem: &str, formatted: bool) -> EclResult<PathBuf> {
        let path = dir.join(format!("{}.{}", stem, ext(formatted, "INIT")));
        let mut out = EclOutput::create(&path)?;

        for section in &self.sections {
            if let Some(name) = &section.lgr_name {
                out.write_string("LGRINIT", &[name.clone()])?;
            }

            let mut intehead = vec![0; 95];
            intehead[8] = section.dims[0] as i32;
            intehead[9] = section.dims[1] as i32;
            intehead[10] = section.dims[2] as i32;
            intehead[11] = section.active_cells as i32;
            out.write_int("INTEHEAD", &intehead)?;
            out.write_real("PORO", &vec![0.25; section.active_cells])?;

            if let Some(trannnc) = &section.trannnc {
                out.write_real("TRANNNC", trannnc)?;
            }
        }

        out.finish()?;
        Ok(path)
    }
}

// =============================================================================
// Summary files
// =============================================================================

/// One summary series declared in the specification file.
#[derive(Debug, Clone)]
pub struct SeriesSpec {
    pub keyword: String,
    pub wgname: String,
    pub num: i32,
    pub unit: String,
    pub lgr: Option<(String, [i32; 3])>,
}

/// Result file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultLayout {
    /// One `.UNSMRY` / `.FUNSMRY` file
    Unified,
    /// One `.Snnnn` / `.Annnn` file per report step
    Multiple,
}

/// Value generator: `(global ministep, series index) -> value`.
pub type ValueFn = fn(i32, usize) -> f32;

/// Default values: `TIME` is ten days per ministep, everything else encodes
/// the ministep and series index as `ministep * 100 + series`.
pub fn default_value(ministep: i32, series: usize) -> f32 {
    if series == 0 {
        (ministep + 1) as f32 * 10.0
    } else {
        (ministep * 100) as f32 + series as f32
    }
}

/// A summary run: specification file plus result files.
///
/// The first series should be `TIME` so the default generator produces
/// consistent dates.
#[derive(Debug, Clone)]
pub struct SummaryCase {
    pub dims: [i32; 3],
    /// Day, month, year, hour, minute, microsecond
    pub start: [i32; 6],
    /// Root name (possibly with a directory) and report step of the base run
    pub restart: Option<(String, i32)>,
    pub series: Vec<SeriesSpec>,
    /// Ministeps in each report step
    pub report_steps: Vec<usize>,
    /// Ministep number of the first step of this run
    pub first_ministep: i32,
    /// Skip ministep numbers to produce gaps
    pub ministep_stride: i32,
    pub formatted: bool,
    pub layout: ResultLayout,
    /// Write `NAMES` instead of `WGNAMES`
    pub use_names: bool,
    pub values: ValueFn,
}

impl Default for SummaryCase {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryCase {
    pub fn new() -> Self {
        Self {
            dims: [10, 10, 3],
            start: [1, 1, 2020, 0, 0, 0],
            restart: None,
            series: Vec::new(),
            report_steps: Vec::new(),
            first_ministep: 0,
            ministep_stride: 1,
            formatted: false,
            layout: ResultLayout::Unified,
            use_names: false,
            values: default_value,
        }
    }

    pub fn dims(mut self, ni: i32, nj: i32, nk: i32) -> Self {
        self.dims = [ni, nj, nk];
        self
    }

    pub fn start(mut self, day: i32, month: i32, year: i32) -> Self {
        self.start = [day, month, year, 0, 0, 0];
        self
    }

    pub fn start_time(mut self, hour: i32, minute: i32, microsecond: i32) -> Self {
        self.start[3] = hour;
        self.start[4] = minute;
        self.start[5] = microsecond;
        self
    }

    pub fn restart_from(mut self, root: &str, report_step: i32) -> Self {
        self.restart = Some((root.to_string(), report_step));
        self
    }

    pub fn series(mut self, keyword: &str, wgname: &str, num: i32, unit: &str) -> Self {
        self.series.push(SeriesSpec {
            keyword: keyword.to_string(),
            wgname: wgname.to_string(),
            num,
            unit: unit.to_string(),
            lgr: None,
        });
        self
    }

    pub fn lgr_series(
        mut self,
        keyword: &str,
        wgname: &str,
        lgr: &str,
        ijk: [i32; 3],
        unit: &str,
    ) -> Self {
        self.series.push(SeriesSpec {
            keyword: keyword.to_string(),
            wgname: wgname.to_string(),
            num: 0,
            unit: unit.to_string(),
            lgr: Some((lgr.to_string(), ijk)),
        });
        self
    }

    pub fn report_steps(mut self, ministeps: &[usize]) -> Self {
        self.report_steps = ministeps.to_vec();
        self
    }

    pub fn first_ministep(mut self, ministep: i32) -> Self {
        self.first_ministep = ministep;
        self
    }

    pub fn ministep_stride(mut self, stride: i32) -> Self {
        self.ministep_stride = stride;
        self
    }

    pub fn formatted(mut self, formatted: bool) -> Self {
        self.formatted = formatted;
        self
    }

    pub fn layout(mut self, layout: ResultLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn use_names(mut self) -> Self {
        self.use_names = true;
        self
    }

    pub fn values(mut self, values: ValueFn) -> Self {
        self.values = values;
        self
    }

    pub fn timestep_count(&self) -> usize {
        self.report_steps.iter().sum()
    }

    /// Ministep numbers of all steps, in order.
    pub fn ministeps(&self) -> Vec<i32> {
        (0..self.timestep_count() as i32)
            .map(|n| self.first_ministep + n * self.ministep_stride)
            .collect()
    }

    /// Expected samples of one series.
    pub fn expected(&self, series: usize) -> Vec<f32> {
        self.ministeps()
            .into_iter()
            .map(|m| (self.values)(m, series))
            .collect()
    }

    fn restart_step(&self) -> i32 {
        self.restart.as_ref().map(|(_, step)| *step).unwrap_or(0)
    }

    fn restart_pieces(&self) -> Vec<String> {
        let root = self
            .restart
            .as_ref()
            .map(|(root, _)| root.as_str())
            .unwrap_or("");
        let mut pieces: Vec<String> = root
            .as_bytes()
            .chunks(8)
            .map(|c| String::from_utf8_lossy(c).to_string())
            .collect();
        pieces.resize(9, String::new());
        pieces
    }

    /// Write the specification file and result files into `dir`, returning
    /// the specification file path.
    pub fn write(&self, dir: &Path, stem: &str) -> EclResult<PathBuf> {
        let spec_path = dir.join(format!("{}.{}", stem, ext(self.formatted, "SMSPEC")));
        self.write_spec(&spec_path)?;

        match self.layout {
            ResultLayout::Unified => {
                let path = dir.join(format!("{}.{}", stem, ext(self.formatted, "UNSMRY")));
                let mut out = EclOutput::create(&path)?;
                let mut step = 0;
                for (report, ministeps) in self.report_steps.iter().enumerate() {
                    self.write_report(&mut out, report, step, *ministeps)?;
                    step += ministeps;
                }
                out.finish()?;
            }
            ResultLayout::Multiple => {
                let mut step = 0;
                for (report, ministeps) in self.report_steps.iter().enumerate() {
                    let number = self.restart_step() as usize + report + 1;
                    let letter = if self.formatted { 'A' } else { 'S' };
                    let path = dir.join(format!("{}.{}{:04}", stem, letter, number));
                    let mut out = EclOutput::create(&path)?;
                    self.write_report(&mut out, report, step, *ministeps)?;
                    out.finish()?;
                    step += ministeps;
                }
            }
        }

        Ok(spec_path)
    }

    fn write_report<W: std::io::Write>(
        &self,
        out: &mut EclOutput<W>,
        report: usize,
        first_step: usize,
        ministeps: usize,
    ) -> EclResult<()> {
        out.write_int("SEQHDR", &[self.restart_step() + report as i32 + 1])?;

        let numbers = self.ministeps();
        for step in first_step..first_step + ministeps {
            let ministep = numbers[step];
            out.write_int("MINISTEP", &[ministep])?;
            let values: Vec<f32> = (0..self.series.len())
                .map(|n| (self.values)(ministep, n))
                .collect();
            out.write_real("PARAMS", &values)?;
        }
        Ok(())
    }

    fn write_spec(&self, path: &Path) -> EclResult<()> {
        let mut out = EclOutput::create(path)?;

        out.write_int("INTEHEAD", &[1, 100])?;
        out.write_string("RESTART", &self.restart_pieces())?;
        out.write_int(
            "DIMENS",
            &[
                self.series.len() as i32,
                self.dims[0],
                self.dims[1],
                self.dims[2],
                0,
                self.restart_step(),
            ],
        )?;

        let keywords: Vec<String> = self.series.iter().map(|s| s.keyword.clone()).collect();
        let wgnames: Vec<String> = self.series.iter().map(|s| s.wgname.clone()).collect();
        let nums: Vec<i32> = self.series.iter().map(|s| s.num).collect();
        let units: Vec<String> = self.series.iter().map(|s| s.unit.clone()).collect();

        out.write_string("KEYWORDS", &keywords)?;
        out.write_string(if self.use_names { "NAMES" } else { "WGNAMES" }, &wgnames)?;
        out.write_int("NUMS", &nums)?;

        if self.series.iter().any(|s| s.lgr.is_some()) {
            let lgr = |f: fn(&(String, [i32; 3])) -> i32| -> Vec<i32> {
                self.series
                    .iter()
                    .map(|s| s.lgr.as_ref().map(f).unwrap_or(0))
                    .collect()
            };
            let names: Vec<String> = self
                .series
                .iter()
                .map(|s| s.lgr.as_ref().map(|l| l.0.clone()).unwrap_or_default())
                .collect();
            out.write_string("LGRS", &names)?;
            out.write_int("NUMLX", &lgr(|l| l.1[0]))?;
            out.write_int("NUMLY", &lgr(|l| l.1[1]))?;
            out.write_int("NUMLZ", &lgr(|l| l.1[2]))?;
        }

        out.write_string("UNITS", &units)?;
        out.write_int("STARTDAT", &self.start)?;
        out.finish()?;
        Ok(())
    }
}
