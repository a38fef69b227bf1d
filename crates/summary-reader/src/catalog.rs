//! Canonical key catalog over a restart chain.
//!
//! Keys from every link are merged into one sorted, deduplicated list; a
//! key's position in that list is its slot. Each link keeps its own table
//! from slot to the raw `PARAMS` position, since runs of a chain may
//! declare different series.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::info;

use crate::chain::{read_chain_specs, scan_chain, RestartChain};
use crate::error::{SummaryError, SummaryResult};
use crate::node::Category;
use crate::results::TimeStep;
use crate::smspec::{resolve_spec_path, RestartInfo, SpecFile, StartDate};

/// Keys, units and timestep locations of a summary run.
#[derive(Debug)]
pub struct SummaryCatalog {
    chain: RestartChain,
    follow_restarts: bool,

    keys: Vec<String>,
    slots: HashMap<String, usize>,
    units: Vec<String>,
    categories: Vec<Category>,

    /// `[link][slot]` first raw position of the slot's series
    positions: Vec<Vec<Option<usize>>>,
    /// `[link][raw]` slot of every raw series
    raw_slots: Vec<Vec<Option<usize>>>,

    timesteps: Vec<TimeStep>,
    report_index: Vec<usize>,

    start: StartDate,
    start_date: NaiveDateTime,
    restart: Option<RestartInfo>,
}

impl SummaryCatalog {
    /// Build the catalog of a specification file.
    ///
    /// A path without extension gets `.SMSPEC`. With `follow_restarts` the
    /// runs this one was restarted from are included.
    pub fn open(path: impl AsRef<Path>, follow_restarts: bool) -> SummaryResult<Self> {
        let (spec_path, formatted) = resolve_spec_path(path.as_ref())?;
        let specs = read_chain_specs(&spec_path, formatted, follow_restarts)?;
        let steps = scan_chain(&specs)?;

        let newest = specs
            .last()
            .ok_or_else(|| SummaryError::InvalidOperation("empty restart chain".to_string()))?;
        let start = newest.start;
        let start_date = start.to_datetime().ok_or_else(|| SummaryError::CorruptedData {
            file: newest.path.clone(),
            reason: format!("invalid STARTDAT {:?}", start),
        })?;
        let restart = newest.restart.clone();

        let (keys, units, categories) = merge_keys(&specs);
        let slots: HashMap<String, usize> = keys
            .iter()
            .enumerate()
            .map(|(slot, key)| (key.clone(), slot))
            .collect();

        let mut positions = Vec::with_capacity(specs.len());
        let mut raw_slots = Vec::with_capacity(specs.len());
        for spec in &specs {
            let mut position = vec![None; keys.len()];
            let mut raw = Vec::with_capacity(spec.nodes.len());
            for (index, node) in spec.nodes.iter().enumerate() {
                let slot = node.key(spec.dims).and_then(|k| slots.get(&k).copied());
                // A key repeated within one file reads its last series.
                if let Some(slot) = slot {
                    position[slot] = Some(index);
                }
                raw.push(slot);
            }
            positions.push(position);
            raw_slots.push(raw);
        }

        info!(
            file = %spec_path.display(),
            keys = keys.len(),
            links = steps.chain.len(),
            timesteps = steps.timesteps.len(),
            "Built summary catalog"
        );

        Ok(Self {
            chain: steps.chain,
            follow_restarts,
            keys,
            slots,
            units,
            categories,
            positions,
            raw_slots,
            timesteps: steps.timesteps,
            report_index: steps.report_index,
            start,
            start_date,
            restart,
        })
    }

    pub fn chain(&self) -> &RestartChain {
        &self.chain
    }

    pub fn follows_restarts(&self) -> bool {
        self.follow_restarts
    }

    /// Canonical keys in slot order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn slot(&self, key: &str) -> Option<usize> {
        self.slots.get(key).copied()
    }

    pub(crate) fn require_slot(&self, key: &str) -> SummaryResult<usize> {
        self.slot(key)
            .ok_or_else(|| SummaryError::KeyNotFound(key.to_string()))
    }

    pub fn unit(&self, key: &str) -> Option<&str> {
        self.slot(key).map(|slot| self.units[slot].as_str())
    }

    pub fn units(&self) -> &[String] {
        &self.units
    }

    pub fn category(&self, key: &str) -> Option<Category> {
        self.slot(key).map(|slot| self.categories[slot])
    }

    /// Raw `PARAMS` position of a slot in a chain link.
    pub fn position(&self, link: usize, slot: usize) -> Option<usize> {
        self.positions.get(link)?.get(slot).copied().flatten()
    }

    /// Slot of a raw series of a chain link.
    pub fn slot_of_raw(&self, link: usize, raw: usize) -> Option<usize> {
        self.raw_slots.get(link)?.get(raw).copied().flatten()
    }

    pub fn timesteps(&self) -> &[TimeStep] {
        &self.timesteps
    }

    /// Global index of the last timestep of every report step.
    pub fn report_index(&self) -> &[usize] {
        &self.report_index
    }

    pub fn start(&self) -> StartDate {
        self.start
    }

    pub fn start_date(&self) -> NaiveDateTime {
        self.start_date
    }

    pub fn restart_info(&self) -> Option<&RestartInfo> {
        self.restart.as_ref()
    }

    pub fn spec_path(&self) -> Option<&Path> {
        self.chain.newest().map(|l| l.spec_path.as_path())
    }
}

/// Sorted key set with units and categories; the newest link's unit wins.
fn merge_keys(specs: &[SpecFile]) -> (Vec<String>, Vec<String>, Vec<Category>) {
    let mut keys = BTreeSet::new();
    let mut details: HashMap<String, (String, Category)> = HashMap::new();

    for spec in specs {
        for node in &spec.nodes {
            if let Some(key) = node.key(spec.dims) {
                details.insert(key.clone(), (node.unit.clone(), node.category));
                keys.insert(key);
            }
        }
    }

    let keys: Vec<String> = keys.into_iter().collect();
    let (units, categories): (Vec<String>, Vec<Category>) = keys
        .iter()
        .map(|k| details.get(k).cloned().unwrap_or((String::new(), Category::Miscellaneous)))
        .unzip();
    (keys, units, categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SummaryNode;
    use std::path::PathBuf;

    fn spec(nodes: Vec<SummaryNode>) -> SpecFile {
        SpecFile {
            path: PathBuf::from("CASE.SMSPEC"),
            formatted: false,
            dims: [10, 10, 3],
            restart: None,
            restart_step: 0,
            nodes,
            start: StartDate::from_startdat(&[1, 1, 2020]).unwrap(),
        }
    }

    #[test]
    fn test_merge_keys_sorted_and_deduplicated() {
        let old = spec(vec![
            SummaryNode::new("WOPR", "P1", 0, "SM3/DAY"),
            SummaryNode::new("FOPT", ":+:+:+:+", 0, "SM3"),
            SummaryNode::new("GOPR", ":+:+:+:+", 0, "SM3/DAY"),
        ]);
        let new = spec(vec![
            SummaryNode::new("WOPR", "P1", 0, "STB/DAY"),
            SummaryNode::new("BPR", ":+:+:+:+", 1, "BARSA"),
        ]);

        let (keys, units, categories) = merge_keys(&[old, new]);
        assert_eq!(keys, vec!["BPR:1,1,1", "FOPT", "WOPR:P1"]);
        assert_eq!(units, vec!["BARSA", "SM3", "STB/DAY"]);
        assert_eq!(categories[2], Category::Well);
    }
}
