//! Generation statistics
//!
//! Counters describing one generation run: how many events were drained,
//! how many instances were admitted or deferred, how they ended, and how much
//! of the object pool was used. Collected by the scheduler and rendered by
//! `output::text` and `output::json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters for one generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Drain steps written (the requested operation count)
    pub drains: u64,
    /// Playback instances admitted
    pub admissions: u64,
    /// Admission attempts deferred for lack of pool capacity
    pub deferrals: u64,
    /// Instances closed after exhausting their model
    pub natural_closes: u64,
    /// Instances still active at shutdown and force-closed
    pub shutdown_closes: u64,
    /// Largest number of simultaneously active instances
    pub peak_active: usize,
    /// Distinct objects referenced by the trace
    pub objects_used: usize,
    /// Simulated time of the last drained event (microseconds)
    pub final_time: u64,
    /// Whether the run stopped early because the pool could admit nothing more
    pub pool_starved: bool,
    /// Admissions per model name
    pub admissions_by_model: BTreeMap<String, u64>,
}

impl GenerationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an admission of the named model
    pub fn record_admission(&mut self, model: &str) {
        self.admissions += 1;
        *self
            .admissions_by_model
            .entry(model.to_string())
            .or_insert(0) += 1;
    }

    /// Track the active set size after an insertion
    pub fn observe_active(&mut self, active: usize) {
        self.peak_active = self.peak_active.max(active);
    }

    /// Instances opened but not yet closed; always zero after a finished run
    pub fn open_instances(&self) -> u64 {
        self.admissions - self.natural_closes - self.shutdown_closes
    }
}
