//! Restart chain resolution.
//!
//! A restarted run references the run it continues from through the
//! `RESTART` array of its specification file. Following those references
//! from the requested file yields the chain, which is stored oldest run
//! first. Each run contributes timesteps up to the report step where the
//! next newer run takes over.

use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{SummaryError, SummaryResult};
use crate::results::{find_result_files, scan_timesteps, TimeStep};
use crate::smspec::{read_spec, resolve_restart, SpecFile};

/// One run of a restart chain.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub spec_path: PathBuf,
    pub formatted: bool,
    pub result_files: Vec<PathBuf>,
    /// Report step of the previous run this run starts from, zero for a base run
    pub restart_step: i32,
    /// Global report steps (zero-based) contributed by this run
    pub report_steps: Range<usize>,
    /// Global timesteps contributed by this run
    pub timesteps: Range<usize>,
}

/// Ordered runs, oldest first.
#[derive(Debug, Clone, Default)]
pub struct RestartChain {
    links: Vec<ChainLink>,
}

impl RestartChain {
    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The requested run.
    pub fn newest(&self) -> Option<&ChainLink> {
        self.links.last()
    }

    pub fn link(&self, index: usize) -> Option<&ChainLink> {
        self.links.get(index)
    }
}

/// Specification files of the chain, oldest first.
pub(crate) fn read_chain_specs(
    spec_path: &Path,
    formatted: bool,
    follow_restarts: bool,
) -> SummaryResult<Vec<SpecFile>> {
    let mut specs = vec![read_spec(spec_path, formatted)?];
    let mut visited: HashSet<PathBuf> = HashSet::new();
    visited.insert(canonical(spec_path));

    while follow_restarts {
        let Some(restart) = specs.last().and_then(|s| s.restart.clone()) else {
            break;
        };
        let referencing = specs.last().map(|s| s.path.clone()).unwrap_or_default();
        let (path, formatted) = resolve_restart(&referencing, &restart.root)?;

        if !visited.insert(canonical(&path)) {
            return Err(SummaryError::InvalidRestartChain(format!(
                "{} is referenced twice",
                path.display()
            )));
        }

        debug!(
            from = %referencing.display(),
            to = %path.display(),
            report_step = restart.report_step,
            "Following restart reference"
        );
        specs.push(read_spec(&path, formatted)?);
    }

    specs.reverse();
    Ok(specs)
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Result of walking every link's result files.
#[derive(Debug, Default)]
pub(crate) struct ChainSteps {
    pub chain: RestartChain,
    pub timesteps: Vec<TimeStep>,
    /// Global index of the last timestep of every report step
    pub report_index: Vec<usize>,
}

/// Locate and scan the result files of every link, oldest first.
pub(crate) fn scan_chain(specs: &[SpecFile]) -> SummaryResult<ChainSteps> {
    let mut out = ChainSteps::default();

    for (link, spec) in specs.iter().enumerate() {
        let files = find_result_files(&spec.path, spec.formatted)?;
        // Restart steps are absolute report numbers; the scan counts from
        // where this link begins.
        let report_limit = specs
            .get(link + 1)
            .map(|newer| (newer.restart_step - spec.restart_step).max(0) as usize);

        let scanned = scan_timesteps(link, &files, spec.formatted, report_limit)?;

        let first_step = out.timesteps.len();
        let first_report = out.report_index.len();
        out.report_index
            .extend(scanned.report_ends.iter().map(|s| s + first_step));
        out.timesteps.extend(scanned.steps);

        out.chain.links.push(ChainLink {
            spec_path: spec.path.clone(),
            formatted: spec.formatted,
            result_files: files,
            restart_step: spec.restart_step,
            report_steps: first_report..out.report_index.len(),
            timesteps: first_step..out.timesteps.len(),
        });
    }

    info!(
        links = out.chain.len(),
        timesteps = out.timesteps.len(),
        report_steps = out.report_index.len(),
        "Resolved summary restart chain"
    );
    Ok(out)
}
