//! Weighted workload model sampler
//!
//! Builds a cumulative distribution table over the loaded models once, then
//! maps each uniform draw to a model with a binary search.
//!
//! # Weighting
//!
//! A model of length `L` gets weight `max_length / L`, normalized by the sum
//! of all weights. Shorter models are picked proportionally more often, so
//! over many selections the total simulated *time* contributed by each model
//! trends toward uniform rather than the selection *count*.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use iosynth::distribution::weighted::WeightedSampler;
//! use iosynth::model::WorkloadModel;
//!
//! let models = vec![
//!     Arc::new(WorkloadModel::new("short", 10, 1, vec![]).unwrap()),
//!     Arc::new(WorkloadModel::new("long", 100, 1, vec![]).unwrap()),
//! ];
//! let sampler = WeightedSampler::new(&models).unwrap();
//! assert_eq!(sampler.sample(0.5).name(), "short");
//! assert_eq!(sampler.sample(0.95).name(), "long");
//! ```

use crate::model::WorkloadModel;
use std::sync::Arc;
use thiserror::Error;

/// Errors building the distribution table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplerError {
    #[error("cannot build a distribution over an empty model set")]
    Empty,
}

/// Cumulative distribution table over workload models
///
/// `boundaries[i]` is the lower edge of model `i`'s interval. Boundaries start
/// at 0.0 and are strictly increasing; the last interval extends to 1.0.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    boundaries: Vec<f64>,
    weights: Vec<f64>,
    models: Vec<Arc<WorkloadModel>>,
}

impl WeightedSampler {
    /// Build the table from the full model set
    pub fn new(models: &[Arc<WorkloadModel>]) -> Result<Self, SamplerError> {
        let max_length = models
            .iter()
            .map(|m| m.length())
            .max()
            .ok_or(SamplerError::Empty)? as f64;

        let raw: Vec<f64> = models
            .iter()
            .map(|m| max_length / m.length() as f64)
            .collect();
        let sum: f64 = raw.iter().sum();

        let weights: Vec<f64> = raw.iter().map(|w| w / sum).collect();

        let mut boundaries = Vec::with_capacity(weights.len());
        let mut cumulative = 0.0;
        for w in &weights {
            boundaries.push(cumulative);
            cumulative += w;
        }

        Ok(Self {
            boundaries,
            weights,
            models: models.to_vec(),
        })
    }

    /// Index of the model whose interval contains `u`
    ///
    /// Picks the model with the greatest boundary `<= u`. Draws beyond the
    /// last boundary map to the last model; draws below zero (or NaN) map to
    /// the first.
    pub fn sample_index(&self, u: f64) -> usize {
        let idx = self.boundaries.partition_point(|&b| b <= u);
        idx.saturating_sub(1)
    }

    /// Model whose interval contains `u`
    pub fn sample(&self, u: f64) -> &Arc<WorkloadModel> {
        &self.models[self.sample_index(u)]
    }

    /// Lower interval edges, one per model
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Normalized weights, one per model
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn models(&self) -> &[Arc<WorkloadModel>] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
