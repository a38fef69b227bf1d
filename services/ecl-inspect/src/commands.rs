//! Subcommand implementations. Output goes to the given writer.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use grid_geometry::{EGrid, GLOBAL_GRID};
use summary_reader::{cache_path, Summary, SummaryOptions, SummarySource};
use tracing::info;

use crate::config::InspectConfig;

/// Parse a one-based `I,J,K` triple into zero-based indices.
pub fn parse_cell(value: &str) -> Result<[usize; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected I,J,K, got '{}'", value));
    }

    let mut ijk = [0usize; 3];
    for (n, part) in parts.iter().enumerate() {
        let index: usize = part
            .parse()
            .map_err(|_| format!("'{}' is not a positive integer", part))?;
        if index == 0 {
            return Err("cell indices are one-based".to_string());
        }
        ijk[n] = index - 1;
    }
    Ok(ijk)
}

pub fn summary_options(config: &InspectConfig, restarts: bool) -> SummaryOptions {
    SummaryOptions {
        follow_restarts: restarts || config.summary.follow_restarts,
        ..config.summary.clone()
    }
}

pub fn grid<W: Write>(
    out: &mut W,
    file: &Path,
    lgr: Option<&str>,
    cell: Option<[usize; 3]>,
) -> Result<()> {
    let grid = EGrid::open_grid(file, lgr.unwrap_or(GLOBAL_GRID))?;
    let dims = grid.dimensions();

    writeln!(out, "grid:         {}", grid.grid_name())?;
    writeln!(out, "dimensions:   {} x {} x {}", dims.ni, dims.nj, dims.nk)?;
    writeln!(out, "total cells:  {}", grid.total_cells())?;
    writeln!(out, "active cells: {}", grid.active_cells())?;
    if grid.is_radial() {
        writeln!(out, "radial:       yes")?;
    }
    if let Some(units) = grid.map_units() {
        writeln!(out, "map units:    {}", units.as_str())?;
    }
    if !grid.lgr_names().is_empty() {
        writeln!(out, "lgrs:         {}", grid.lgr_names().join(", "))?;
    }
    writeln!(out, "nncs:         {}", grid.non_neighbor_connections()?.len())?;

    if let Some(ijk) = cell {
        let corners = grid
            .cell_corners_mapped(ijk)
            .with_context(|| format!("cell {},{},{}", ijk[0] + 1, ijk[1] + 1, ijk[2] + 1))?;
        writeln!(out, "corners of {},{},{}:", ijk[0] + 1, ijk[1] + 1, ijk[2] + 1)?;
        for (n, [x, y, z]) in corners.iter().enumerate() {
            writeln!(out, "  {} {:>14.3} {:>14.3} {:>10.3}", n, x, y, z)?;
        }
    }
    Ok(())
}

pub fn keys<W: Write>(
    out: &mut W,
    file: &Path,
    pattern: Option<&str>,
    options: SummaryOptions,
) -> Result<()> {
    let summary = Summary::open_with_options(file, options)?;
    let keys = match pattern {
        Some(pattern) => summary.list_keys(pattern)?,
        None => summary.keys().to_vec(),
    };

    let width = keys.iter().map(String::len).max().unwrap_or(0);
    for key in &keys {
        writeln!(out, "{:<width$}  {}", key, summary.unit(key)?, width = width)?;
    }
    Ok(())
}

pub fn vector<W: Write>(
    out: &mut W,
    file: &Path,
    keys: &[String],
    report_steps: bool,
    options: SummaryOptions,
) -> Result<()> {
    let summary = Summary::open_with_options(file, options)?;
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    summary.load_keys(&refs)?;

    let (dates, columns) = if report_steps {
        let columns = keys
            .iter()
            .map(|k| summary.get_at_report_steps(k))
            .collect::<Result<Vec<_>, _>>()?;
        (summary.dates_at_report_steps()?, columns)
    } else {
        let columns = keys
            .iter()
            .map(|k| summary.get(k).map(|v| v.to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        (summary.dates()?, columns)
    };

    write!(out, "{:<19}", "DATE")?;
    for key in keys {
        write!(out, " {:>16}", key)?;
    }
    writeln!(out)?;

    for (n, date) in dates.iter().enumerate() {
        write!(out, "{}", date.format("%Y-%m-%d %H:%M:%S"))?;
        for column in &columns {
            write!(out, " {:>16.6}", column[n])?;
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn cache<W: Write>(out: &mut W, file: &Path, options: SummaryOptions) -> Result<()> {
    let summary = Summary::open_with_options(file, options)?;
    let path = summary
        .catalog()
        .spec_path()
        .map(cache_path)
        .context("summary has no specification file")?;

    if summary.export_cache()? {
        let (opening, loading) = summary.io_elapsed();
        info!(
            file = %path.display(),
            opening_ms = opening.as_millis() as u64,
            loading_ms = loading.as_millis() as u64,
            "Exported summary cache"
        );
        writeln!(out, "wrote {}", path.display())?;
    } else {
        writeln!(out, "{} already exists", path.display())?;
    }
    Ok(())
}
