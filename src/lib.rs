//! IOSynth - replayable block-storage IO trace generator
//!
//! IOSynth synthesizes a time-ordered sequence of simulated block-storage IO
//! operations from a set of statistical workload models. The result is a fio
//! version 2 iolog that a benchmarking tool can replay against a storage
//! target without needing the live application.
//!
//! # Architecture
//!
//! - **Models**: immutable workload models loaded once from a model file
//! - **Distribution**: weighted sampler favoring shorter models
//! - **Target**: bounded pool of storage object names
//! - **Worker**: playback instance running one model (open/step/close)
//! - **Coordinator**: event scheduler merging all instances in time order
//! - **Output**: iolog trace writer plus text/JSON summaries
//!
//! Generation is single-threaded and fully deterministic for a given seed and
//! model set.

pub mod config;
pub mod coordinator;
pub mod distribution;
pub mod model;
pub mod output;
pub mod stats;
pub mod target;
pub mod worker;

// Re-export commonly used types
pub use config::GeneratorConfig;
pub use coordinator::{generate_trace, Scheduler};
pub use model::{ModelRegistry, WorkloadModel};

/// Result type used throughout IOSynth
pub type Result<T> = anyhow::Result<T>;
