//! Summary specification file (`.SMSPEC` / `.FSMSPEC`).
//!
//! Arrays used:
//!
//! | Array | Content |
//! |-------|---------|
//! | `DIMENS` | `[0]` series count, `[1..4]` grid dimensions, `[5]` restart report step |
//! | `RESTART` | root name of the base run in 8-character pieces |
//! | `KEYWORDS`, `WGNAMES` (or `NAMES`), `NUMS`, `UNITS` | one entry per series |
//! | `LGRS`, `NUMLX`, `NUMLY`, `NUMLZ` | optional LGR descriptor per series |
//! | `STARTDAT` | day, month, year, hour, minute, microsecond |

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use ecl_format::EclFile;
use tracing::debug;

use crate::error::{SummaryError, SummaryResult};
use crate::node::{LgrCell, SummaryNode};

const SPEC_EXTENSION: &str = "SMSPEC";
const FORMATTED_SPEC_EXTENSION: &str = "FSMSPEC";

/// Simulation start as stored in `STARTDAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartDate {
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub hour: i32,
    pub minute: i32,
    pub microsecond: i32,
}

impl StartDate {
    /// Build from `STARTDAT`; missing time fields default to zero.
    pub fn from_startdat(values: &[i32]) -> Option<Self> {
        let field = |n: usize| values.get(n).copied().unwrap_or(0);
        if values.len() < 3 {
            return None;
        }
        Some(Self {
            day: field(0),
            month: field(1),
            year: field(2),
            hour: field(3),
            minute: field(4),
            microsecond: field(5),
        })
    }

    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        let second = self.microsecond / 1_000_000;
        let micro = self.microsecond % 1_000_000;
        NaiveDate::from_ymd_opt(self.year, self.month.try_into().ok()?, self.day.try_into().ok()?)?
            .and_hms_micro_opt(
                self.hour.try_into().ok()?,
                self.minute.try_into().ok()?,
                second.try_into().ok()?,
                micro.try_into().ok()?,
            )
    }

    /// Day, month, year, hour, minute, second, millisecond.
    pub fn to_cache_fields(&self) -> [i32; 7] {
        [
            self.day,
            self.month,
            self.year,
            self.hour,
            self.minute,
            self.microsecond / 1_000_000,
            (self.microsecond % 1_000_000) / 1000,
        ]
    }

    /// Inverse of [`StartDate::to_cache_fields`]; accepts six fields as well.
    pub fn from_cache_fields(values: &[i32]) -> Option<Self> {
        if values.len() < 6 {
            return None;
        }
        let millisecond = values.get(6).copied().unwrap_or(0);
        Some(Self {
            day: values[0],
            month: values[1],
            year: values[2],
            hour: values[3],
            minute: values[4],
            microsecond: values[5] * 1_000_000 + millisecond * 1000,
        })
    }
}

/// Base run a summary was restarted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartInfo {
    /// Root name as written by the simulator, relative to the run directory
    pub root: String,
    /// Report step of the base run the restart starts from
    pub report_step: i32,
}

/// Decoded specification file.
#[derive(Debug, Clone)]
pub struct SpecFile {
    pub path: PathBuf,
    pub formatted: bool,
    pub dims: [i32; 3],
    pub restart: Option<RestartInfo>,
    /// Report step this run was restarted from, zero for a base run
    pub restart_step: i32,
    pub nodes: Vec<SummaryNode>,
    pub start: StartDate,
}

/// Apply the default extension and check the file kind.
///
/// Returns the path and whether it is the formatted variant.
pub fn resolve_spec_path(path: &Path) -> SummaryResult<(PathBuf, bool)> {
    match path.extension().and_then(|e| e.to_str()) {
        None => Ok((path.with_extension(SPEC_EXTENSION), false)),
        Some(SPEC_EXTENSION) => Ok((path.to_path_buf(), false)),
        Some(FORMATTED_SPEC_EXTENSION) => Ok((path.to_path_buf(), true)),
        Some(_) => Err(SummaryError::InvalidExtension(path.to_path_buf())),
    }
}

/// Read one specification file.
pub fn read_spec(path: &Path, formatted: bool) -> SummaryResult<SpecFile> {
    let file = EclFile::open_with_format(path, formatted)?;
    let corrupted = |reason: String| SummaryError::CorruptedData {
        file: path.to_path_buf(),
        reason,
    };

    let dimens = file.get_int_named("DIMENS")?;
    if dimens.len() < 4 {
        return Err(corrupted(format!("DIMENS has {} elements", dimens.len())));
    }
    let count = dimens[0].max(0) as usize;
    let dims = [dimens[1], dimens[2], dimens[3]];
    let restart_step = dimens.get(5).copied().unwrap_or(0);

    let keywords = file.get_string_named("KEYWORDS")?;
    let owners = if file.has_array("WGNAMES") {
        file.get_string_named("WGNAMES")?
    } else {
        file.get_string_named("NAMES")?
    };
    let nums = file.get_int_named("NUMS")?;
    let units = file.get_string_named("UNITS")?;

    for (name, len) in [
        ("KEYWORDS", keywords.len()),
        ("WGNAMES", owners.len()),
        ("NUMS", nums.len()),
        ("UNITS", units.len()),
    ] {
        if len != count {
            return Err(corrupted(format!(
                "{} has {} elements, DIMENS declares {} series",
                name, len, count
            )));
        }
    }

    let lgrs = if file.has_array("LGRS") {
        Some((
            file.get_string_named("LGRS")?,
            file.get_int_named("NUMLX")?,
            file.get_int_named("NUMLY")?,
            file.get_int_named("NUMLZ")?,
        ))
    } else {
        None
    };

    let nodes = (0..count)
        .map(|n| {
            let lgr = lgrs.as_ref().and_then(|(names, lx, ly, lz)| {
                Some(LgrCell {
                    name: names.get(n)?.trim().to_string(),
                    ijk: [*lx.get(n)?, *ly.get(n)?, *lz.get(n)?],
                })
            });
            SummaryNode::new(&keywords[n], &owners[n], nums[n], &units[n]).with_lgr(lgr)
        })
        .collect();

    let restart = if file.has_array("RESTART") {
        let root = file.get_string_named("RESTART")?.concat().trim().to_string();
        (!root.is_empty()).then_some(RestartInfo {
            root,
            report_step: restart_step,
        })
    } else {
        None
    };

    let start = StartDate::from_startdat(&file.get_int_named("STARTDAT")?)
        .ok_or_else(|| corrupted("STARTDAT has fewer than 3 elements".to_string()))?;

    debug!(
        file = %path.display(),
        series = count,
        restart = restart.as_ref().map(|r| r.root.as_str()).unwrap_or(""),
        restart_step,
        "Read summary specification"
    );

    Ok(SpecFile {
        path: path.to_path_buf(),
        formatted,
        dims,
        restart,
        restart_step,
        nodes,
        start,
    })
}

/// Locate the specification file of a restart root, relative to the
/// directory of the referencing file unless the root is absolute.
pub fn resolve_restart(referencing: &Path, root: &str) -> SummaryResult<(PathBuf, bool)> {
    let root_path = Path::new(root);
    let base = if root_path.is_absolute() {
        root_path.to_path_buf()
    } else {
        referencing
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(root_path)
    };

    for (ext, formatted) in [(SPEC_EXTENSION, false), (FORMATTED_SPEC_EXTENSION, true)] {
        let mut candidate = base.clone().into_os_string();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            return Ok((candidate, formatted));
        }
    }

    Err(SummaryError::RestartNotFound(root.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_extension() {
        assert_eq!(
            resolve_spec_path(Path::new("/run/CASE")).unwrap(),
            (PathBuf::from("/run/CASE.SMSPEC"), false)
        );
        assert_eq!(
            resolve_spec_path(Path::new("CASE.FSMSPEC")).unwrap(),
            (PathBuf::from("CASE.FSMSPEC"), true)
        );
        assert!(matches!(
            resolve_spec_path(Path::new("CASE.UNSMRY")),
            Err(SummaryError::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_start_date() {
        let start = StartDate::from_startdat(&[6, 11, 1997, 13, 45, 30_250_000]).unwrap();
        assert_eq!(start.to_cache_fields(), [6, 11, 1997, 13, 45, 30, 250]);
        assert_eq!(
            start.to_datetime().unwrap().to_string(),
            "1997-11-06 13:45:30.250"
        );
        assert_eq!(
            StartDate::from_cache_fields(&start.to_cache_fields()),
            Some(start)
        );

        let date_only = StartDate::from_startdat(&[1, 1, 2020]).unwrap();
        assert_eq!(date_only.hour, 0);
        assert!(StartDate::from_startdat(&[1, 1]).is_none());
        assert!(StartDate::from_startdat(&[31, 2, 2020]).unwrap().to_datetime().is_none());
    }

    #[test]
    fn test_missing_restart_root() {
        let dir = tempfile::tempdir().unwrap();
        let referencing = dir.path().join("CASE.SMSPEC");
        assert!(matches!(
            resolve_restart(&referencing, "BASE"),
            Err(SummaryError::RestartNotFound(root)) if root == "BASE"
        ));

        std::fs::write(dir.path().join("BASE.FSMSPEC"), b"").unwrap();
        let (path, formatted) = resolve_restart(&referencing, "BASE").unwrap();
        assert_eq!(path, dir.path().join("BASE.FSMSPEC"));
        assert!(formatted);
    }
}
