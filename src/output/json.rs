//! JSON output formatting
//!
//! Machine-readable report of one generation run: the effective
//! configuration, the seed, and the generation counters.

use crate::config::GeneratorConfig;
use crate::stats::GenerationStats;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Top-level JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub tool: String,
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub seed: u64,
    pub config: GeneratorConfig,
    pub stats: GenerationStats,
}

impl JsonReport {
    pub fn new(config: &GeneratorConfig, seed: u64, stats: &GenerationStats, elapsed_secs: f64) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now(),
            elapsed_secs,
            seed,
            config: config.clone(),
            stats: stats.clone(),
        }
    }
}

/// Write JSON report to file
pub fn write_json_report(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create stats file: {}", output_path.display()))?;

    if pretty {
        serde_json::to_writer_pretty(file, report)?;
    } else {
        serde_json::to_writer(file, report)?;
    }

    Ok(())
}
