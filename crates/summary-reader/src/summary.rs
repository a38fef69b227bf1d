//! Summary run backed by its specification and result files.

use std::cell::Cell;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache;
use crate::catalog::SummaryCatalog;
use crate::chain::RestartChain;
use crate::error::{SummaryError, SummaryResult};
use crate::loader::{self, LoadStrategy, VectorCache};
use crate::smspec::RestartInfo;
use crate::source::SummarySource;

/// Options for opening a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    /// Include the runs this one was restarted from
    pub follow_restarts: bool,
    /// Fraction of all keys above which a multi-key load reads whole
    /// `PARAMS` arrays instead of seeking to single values
    pub bulk_load_fraction: f64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            follow_restarts: false,
            bulk_load_fraction: 0.1,
        }
    }
}

/// Summary time series of one run, or of a restart chain.
///
/// Keys and timestep locations are resolved on open. Vectors are read on
/// first request and kept for the lifetime of the summary.
#[derive(Debug)]
pub struct Summary {
    catalog: SummaryCatalog,
    options: SummaryOptions,
    vectors: VectorCache,
    ministeps: OnceCell<Vec<i32>>,
    io_opening: Duration,
    io_loading: Cell<Duration>,
}

impl Summary {
    /// Open with default options (no restart following).
    pub fn open(path: impl AsRef<Path>) -> SummaryResult<Self> {
        Self::open_with_options(path, SummaryOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: SummaryOptions) -> SummaryResult<Self> {
        let started = Instant::now();
        let catalog = SummaryCatalog::open(path, options.follow_restarts)?;

        Ok(Self {
            catalog,
            options,
            vectors: VectorCache::new(),
            ministeps: OnceCell::new(),
            io_opening: started.elapsed(),
            io_loading: Cell::new(Duration::ZERO),
        })
    }

    pub fn catalog(&self) -> &SummaryCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &SummaryOptions {
        &self.options
    }

    pub fn chain(&self) -> &RestartChain {
        self.catalog.chain()
    }

    /// Whether a key's vector is already in memory.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.catalog
            .slot(key)
            .is_some_and(|slot| self.vectors.contains(slot))
    }

    /// Load several keys at once.
    ///
    /// Reads whole `PARAMS` arrays when more than the configured fraction of
    /// all keys is requested, single values otherwise.
    pub fn load_keys(&self, keys: &[&str]) -> SummaryResult<()> {
        let mut slots = Vec::with_capacity(keys.len());
        for key in keys {
            let slot = self.catalog.require_slot(key)?;
            if !self.vectors.contains(slot) && !slots.contains(&slot) {
                slots.push(slot);
            }
        }

        let threshold = self.options.bulk_load_fraction * self.catalog.keys().len() as f64;
        let strategy = if slots.len() as f64 > threshold {
            LoadStrategy::Bulk
        } else {
            LoadStrategy::Targeted
        };
        self.load_slots(&slots, strategy)
    }

    /// Load every key in one sequential pass.
    pub fn load_all(&self) -> SummaryResult<()> {
        let slots: Vec<usize> = (0..self.catalog.keys().len())
            .filter(|slot| !self.vectors.contains(*slot))
            .collect();
        self.load_slots(&slots, LoadStrategy::Bulk)
    }

    fn load_slots(&self, slots: &[usize], strategy: LoadStrategy) -> SummaryResult<()> {
        if slots.is_empty() {
            return Ok(());
        }

        let started = Instant::now();
        let vectors = loader::read_vectors(&self.catalog, slots, strategy)?;
        for (slot, values) in slots.iter().zip(vectors) {
            self.vectors.insert(*slot, values);
        }

        let elapsed = started.elapsed();
        self.io_loading.set(self.io_loading.get() + elapsed);
        debug!(
            keys = slots.len(),
            ?strategy,
            elapsed_ms = elapsed.as_millis() as u64,
            "Loaded summary vectors"
        );
        Ok(())
    }

    /// `MINISTEP` number of every timestep.
    pub fn ministeps(&self) -> SummaryResult<&[i32]> {
        self.ministeps
            .get_or_try_init(|| loader::read_ministeps(&self.catalog))
            .map(Vec::as_slice)
    }

    /// Whether the ministep numbers are consecutive, i.e. no timestep was
    /// left out when the run was written.
    pub fn all_steps_available(&self) -> SummaryResult<bool> {
        Ok(self.ministeps()?.windows(2).all(|w| w[1] == w[0] + 1))
    }

    /// Wall time spent opening and loading.
    pub fn io_elapsed(&self) -> (Duration, Duration) {
        (self.io_opening, self.io_loading.get())
    }

    /// Write the `.ESMRY` cache next to the specification file.
    ///
    /// Returns `Ok(false)` when the cache file already exists.
    pub fn export_cache(&self) -> SummaryResult<bool> {
        if self.options.follow_restarts {
            return Err(SummaryError::InvalidOperation(
                "cache export is not supported when restarts are followed".to_string(),
            ));
        }
        let spec_path = self.catalog.spec_path().ok_or_else(|| {
            SummaryError::InvalidOperation("summary has no specification file".to_string())
        })?;
        let path = cache::cache_path(spec_path);
        if path.exists() {
            info!(file = %path.display(), "Summary cache already exists");
            return Ok(false);
        }

        self.load_all()?;
        let vectors: Vec<Arc<[f32]>> = self
            .catalog
            .keys()
            .iter()
            .map(|key| self.get(key))
            .collect::<SummaryResult<_>>()?;

        cache::write_cache(&path, &self.catalog, &vectors, self.ministeps()?)?;
        Ok(true)
    }
}

impl SummarySource for Summary {
    fn keys(&self) -> &[String] {
        self.catalog.keys()
    }

    fn has_key(&self, key: &str) -> bool {
        self.catalog.slot(key).is_some()
    }

    fn unit(&self, key: &str) -> SummaryResult<&str> {
        self.catalog
            .unit(key)
            .ok_or_else(|| SummaryError::KeyNotFound(key.to_string()))
    }

    fn get(&self, key: &str) -> SummaryResult<Arc<[f32]>> {
        let slot = self.catalog.require_slot(key)?;
        if let Some(values) = self.vectors.get(slot) {
            return Ok(values);
        }

        self.load_slots(&[slot], LoadStrategy::Targeted)?;
        self.vectors
            .get(slot)
            .ok_or_else(|| SummaryError::KeyNotFound(key.to_string()))
    }

    fn report_index(&self) -> &[usize] {
        self.catalog.report_index()
    }

    fn timestep_count(&self) -> usize {
        self.catalog.timesteps().len()
    }

    fn start_date(&self) -> NaiveDateTime {
        self.catalog.start_date()
    }

    fn restart_info(&self) -> Option<&RestartInfo> {
        self.catalog.restart_info()
    }
}
