//! Query surface shared by summaries and summary caches.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};

use crate::error::{SummaryError, SummaryResult};
use crate::pattern::KeyPattern;
use crate::smspec::RestartInfo;

/// Time series source addressed by canonical keys.
///
/// Implementors provide the key list, units, report-step index and vector
/// access; date handling and report-step filtering are derived from those.
pub trait SummarySource {
    /// Canonical keys, sorted.
    fn keys(&self) -> &[String];

    fn unit(&self, key: &str) -> SummaryResult<&str>;

    /// All samples of a key, one per timestep. Loaded on first access.
    fn get(&self, key: &str) -> SummaryResult<Arc<[f32]>>;

    /// Global index of the last timestep of every report step.
    fn report_index(&self) -> &[usize];

    fn timestep_count(&self) -> usize;

    fn start_date(&self) -> NaiveDateTime;

    fn restart_info(&self) -> Option<&RestartInfo>;

    fn has_key(&self, key: &str) -> bool {
        self.keys().binary_search_by(|k| k.as_str().cmp(key)).is_ok()
    }

    /// Keys matching a shell-style wildcard pattern.
    fn list_keys(&self, pattern: &str) -> SummaryResult<Vec<String>> {
        let pattern = KeyPattern::new(pattern)?;
        Ok(self
            .keys()
            .iter()
            .filter(|k| pattern.matches(k))
            .cloned()
            .collect())
    }

    fn report_step_count(&self) -> usize {
        self.report_index().len()
    }

    /// Timestep index recorded for a one-based report step.
    fn timestep_index_at_report_step_start(&self, report_step: usize) -> SummaryResult<usize> {
        let count = self.report_step_count();
        if report_step < 1 || report_step > count {
            return Err(SummaryError::ReportStepOutOfRange {
                step: report_step,
                count,
            });
        }
        Ok(self.report_index()[report_step - 1])
    }

    /// Samples of a key at the report steps only.
    fn get_at_report_steps(&self, key: &str) -> SummaryResult<Vec<f32>> {
        let values = self.get(key)?;
        Ok(self
            .report_index()
            .iter()
            .filter_map(|n| values.get(*n).copied())
            .collect())
    }

    /// Date of every timestep: start date plus `TIME` days.
    fn dates(&self) -> SummaryResult<Vec<NaiveDateTime>> {
        let start = self.start_date();
        let time = self.get("TIME")?;
        Ok(time
            .iter()
            .map(|days| {
                let micros = (f64::from(*days) * 86_400.0 * 1.0e6).round() as i64;
                start + Duration::microseconds(micros)
            })
            .collect())
    }

    fn dates_at_report_steps(&self) -> SummaryResult<Vec<NaiveDateTime>> {
        let dates = self.dates()?;
        Ok(self
            .report_index()
            .iter()
            .filter_map(|n| dates.get(*n).copied())
            .collect())
    }
}
