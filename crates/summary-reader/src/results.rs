//! Summary result files: discovery and timestep scan.
//!
//! A run stores its samples either in one unified file (`.UNSMRY` /
//! `.FUNSMRY`) or in one numbered file per report step (`.Snnnn` /
//! `.Annnn`). Inside, every timestep is a `MINISTEP` array followed by a
//! `PARAMS` array, and a `SEQHDR` array opens each report step.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ecl_format::{ArrayEntry, EclFile};
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{SummaryError, SummaryResult};

const SEQHDR: &str = "SEQHDR";
const MINISTEP: &str = "MINISTEP";
const PARAMS: &str = "PARAMS";
const IGNORED_ARRAYS: [&str; 2] = ["TNAVHEAD", "TNAVTIME"];

/// Location of one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStep {
    /// Chain link, oldest run first
    pub link: usize,
    /// Index into the link's result files
    pub file: usize,
    /// Payload offset of the `MINISTEP` array
    pub ministep_offset: u64,
    /// Payload offset of the `PARAMS` array
    pub params_offset: u64,
    /// Number of values in the `PARAMS` array
    pub params_count: usize,
}

/// Result files of one specification file.
///
/// When both layouts are present the numbered set is used only if its last
/// file is newer than the unified file.
pub fn find_result_files(spec_path: &Path, formatted: bool) -> SummaryResult<Vec<PathBuf>> {
    let stem = spec_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = match spec_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let unified = dir.join(format!("{}.{}", stem, if formatted { "FUNSMRY" } else { "UNSMRY" }));

    let letter = if formatted { 'A' } else { 'S' };
    let numbered = Regex::new(&format!(r"^{}\.{}[0-9]{{4}}$", regex::escape(&stem), letter))
        .map_err(|e| SummaryError::InvalidOperation(e.to_string()))?;

    let mut multiple: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| numbered.is_match(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect();
    multiple.sort();

    let files = match (unified.exists(), multiple.last()) {
        (true, None) => vec![unified],
        (false, Some(_)) => multiple,
        (true, Some(last)) => {
            if modified(last)? > modified(&unified)? {
                multiple
            } else {
                vec![unified]
            }
        }
        (false, None) => return Err(SummaryError::NoResultFiles(spec_path.to_path_buf())),
    };

    debug!(
        spec = %spec_path.display(),
        files = files.len(),
        "Found summary result files"
    );
    Ok(files)
}

fn modified(path: &Path) -> SummaryResult<SystemTime> {
    Ok(std::fs::metadata(path)?.modified()?)
}

/// Timesteps of one chain link.
#[derive(Debug, Default)]
pub(crate) struct LinkSteps {
    pub steps: Vec<TimeStep>,
    /// Link-local index of the last timestep of every report step
    pub report_ends: Vec<usize>,
}

/// Walk the `MINISTEP`/`PARAMS` pairs of a link's result files.
///
/// Stops once `report_limit` report steps are complete, which is where the
/// next newer run of a restart chain takes over.
pub(crate) fn scan_timesteps(
    link: usize,
    files: &[PathBuf],
    formatted: bool,
    report_limit: Option<usize>,
) -> SummaryResult<LinkSteps> {
    let mut arrays: Vec<(usize, ArrayEntry)> = Vec::new();
    for (index, path) in files.iter().enumerate() {
        let file = EclFile::open_with_format(path, formatted)?;
        arrays.extend(
            file.entries()
                .iter()
                .filter(|e| !IGNORED_ARRAYS.contains(&e.name.as_str()))
                .map(|e| (index, e.clone())),
        );
    }

    let unexpected = |n: usize, expected: &'static str| {
        let (file, found) = match arrays.get(n) {
            Some((file, entry)) => (files[*file].clone(), entry.name.clone()),
            None => (
                files.last().cloned().unwrap_or_default(),
                "end of data".to_string(),
            ),
        };
        SummaryError::UnexpectedMarker {
            file,
            expected,
            found,
        }
    };

    let mut result = LinkSteps::default();
    let mut n = usize::from(arrays.first().is_some_and(|(_, e)| e.name == SEQHDR));

    while n < arrays.len() {
        if report_limit.is_some_and(|limit| result.report_ends.len() >= limit) {
            break;
        }

        let (file, ministep) = &arrays[n];
        if ministep.name != MINISTEP {
            return Err(unexpected(n, MINISTEP));
        }
        let params = match arrays.get(n + 1) {
            Some((_, entry)) if entry.name == PARAMS => entry,
            _ => return Err(unexpected(n + 1, PARAMS)),
        };

        result.steps.push(TimeStep {
            link,
            file: *file,
            ministep_offset: ministep.offset,
            params_offset: params.offset,
            params_count: params.count,
        });
        n += 2;

        let step = result.steps.len() - 1;
        match arrays.get(n) {
            Some((_, entry)) if entry.name == SEQHDR => {
                result.report_ends.push(step);
                n += 1;
            }
            Some(_) => {}
            None => result.report_ends.push(step),
        }
    }

    debug!(
        link,
        steps = result.steps.len(),
        report_steps = result.report_ends.len(),
        "Scanned summary timesteps"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecl_format::EclOutput;

    fn write_arrays(path: &Path, names: &[&str]) {
        let mut out = EclOutput::create(path).unwrap();
        for name in names {
            match *name {
                "PARAMS" => out.write_real(name, &[1.0, 2.0]).unwrap(),
                other => out.write_int(other, &[0]).unwrap(),
            }
        }
        out.finish().unwrap();
    }

    #[test]
    fn test_scan_report_boundaries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CASE.UNSMRY");
        write_arrays(
            &path,
            &[
                "SEQHDR", "MINISTEP", "PARAMS", "MINISTEP", "PARAMS", "SEQHDR", "MINISTEP",
                "PARAMS", "TNAVTIME",
            ],
        );

        let scanned = scan_timesteps(0, &[path], false, None).unwrap();
        assert_eq!(scanned.steps.len(), 3);
        assert_eq!(scanned.report_ends, vec![1, 2]);
        assert_eq!(scanned.steps[2].params_count, 2);
    }

    #[test]
    fn test_scan_stops_at_report_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CASE.UNSMRY");
        write_arrays(
            &path,
            &[
                "SEQHDR", "MINISTEP", "PARAMS", "SEQHDR", "MINISTEP", "PARAMS", "SEQHDR",
                "MINISTEP", "PARAMS",
            ],
        );

        let scanned = scan_timesteps(0, &[path], false, Some(2)).unwrap();
        assert_eq!(scanned.steps.len(), 2);
        assert_eq!(scanned.report_ends, vec![0, 1]);
    }

    #[test]
    fn test_scan_rejects_broken_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CASE.UNSMRY");
        write_arrays(&path, &["SEQHDR", "MINISTEP", "MINISTEP"]);

        match scan_timesteps(0, &[path.clone()], false, None) {
            Err(SummaryError::UnexpectedMarker {
                expected, found, ..
            }) => {
                assert_eq!(expected, "PARAMS");
                assert_eq!(found, "MINISTEP");
            }
            other => panic!("expected UnexpectedMarker, got {:?}", other),
        }

        write_arrays(&path, &["SEQHDR", "MINISTEP"]);
        assert!(matches!(
            scan_timesteps(0, &[path], false, None),
            Err(SummaryError::UnexpectedMarker { expected: "PARAMS", .. })
        ));
    }

    #[test]
    fn test_result_file_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("CASE.SMSPEC");

        assert!(matches!(
            find_result_files(&spec, false),
            Err(SummaryError::NoResultFiles(_))
        ));

        for name in ["CASE.S0002", "CASE.S0001", "OTHER.S0001", "CASE.A0001"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let files = find_result_files(&spec, false).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("CASE.S0001"), dir.path().join("CASE.S0002")]
        );

        // a newer unified file takes precedence
        let unified = dir.path().join("CASE.UNSMRY");
        std::fs::write(&unified, b"").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&unified)
            .unwrap()
            .set_modified(SystemTime::now() + std::time::Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            find_result_files(&spec, false).unwrap(),
            vec![dir.path().join("CASE.UNSMRY")]
        );
    }
}
