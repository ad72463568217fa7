//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! Settings are resolved in three layers: built-in defaults, an optional TOML
//! file (`--config`), then command-line flags, with later layers taking
//! precedence.

pub mod cli;
pub mod toml;
pub mod validator;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default number of drain steps to generate
pub const DEFAULT_OPERATIONS: u64 = 1_000_000;

/// Default cap on distinct objects
pub const DEFAULT_MAX_OBJECTS: usize = 1000;

/// Default object name prefix
pub const DEFAULT_PREFIX: &str = "rbd_data.";

/// What to do with a sampled model that does not fit the object pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeferralPolicy {
    /// Drop it and draw a fresh model on the next tick
    #[default]
    Resample,
    /// Keep it and retry the same model on the next tick
    Retain,
}

impl fmt::Display for DeferralPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferralPolicy::Resample => write!(f, "resample"),
            DeferralPolicy::Retain => write!(f, "retain"),
        }
    }
}

/// Complete generator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Workload model file
    pub model: Option<PathBuf>,
    /// Trace destination; standard output when unset
    pub output: Option<PathBuf>,
    /// Drain steps to generate; 0 means unbounded
    pub operations: u64,
    /// Maximum number of distinct objects in the trace
    pub max_objects: usize,
    /// Prefix for generated object names
    pub prefix: String,
    /// RNG seed; drawn from entropy when unset
    pub seed: Option<u64>,
    /// Handling of models deferred for lack of pool capacity
    pub deferral: DeferralPolicy,
    /// Optional JSON statistics report
    pub stats_json: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            output: None,
            operations: DEFAULT_OPERATIONS,
            max_objects: DEFAULT_MAX_OBJECTS,
            prefix: DEFAULT_PREFIX.to_string(),
            seed: None,
            deferral: DeferralPolicy::default(),
            stats_json: None,
        }
    }
}

impl GeneratorConfig {
    /// True when generation never stops on its own
    pub fn is_unbounded(&self) -> bool {
        self.operations == 0
    }
}

/// Layout of a TOML configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub generator: GeneratorConfig,
}

impl fmt::Display for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: &Option<PathBuf>, none: &str| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| none.to_string())
        };
        writeln!(f, "Model file:   {}", show(&self.model, "(none)"))?;
        writeln!(f, "Output:       {}", show(&self.output, "stdout"))?;
        if self.is_unbounded() {
            writeln!(f, "Operations:   unbounded")?;
        } else {
            writeln!(f, "Operations:   {}", self.operations)?;
        }
        writeln!(f, "Max objects:  {}", self.max_objects)?;
        writeln!(f, "Prefix:       {}", self.prefix)?;
        match self.seed {
            Some(seed) => writeln!(f, "Seed:         {}", seed)?,
            None => writeln!(f, "Seed:         (random)")?,
        }
        write!(f, "Deferral:     {}", self.deferral)
    }
}
