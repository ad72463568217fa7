//! Admission candidate state machine
//!
//! Each scheduler tick holds at most one candidate model waiting to be
//! admitted:
//!
//! ```text
//! NoCandidate --sample--> HaveCandidate --fits--> admitted (NoCandidate)
//!                              |
//!                              +--does not fit--> Resample: NoCandidate
//!                                                 Retain:   HaveCandidate
//! ```
//!
//! Under [`DeferralPolicy::Resample`] a deferred candidate is dropped and the
//! next tick draws from the full distribution again. Models with large object
//! footprints are therefore admitted less often than their weight suggests
//! when the pool is nearly full. This is a known approximation and is kept on
//! purpose. [`DeferralPolicy::Retain`] keeps retrying the same candidate;
//! since the pool never shrinks, this freezes admission at the first model
//! that fails to fit while the active instances drain.

use crate::config::DeferralPolicy;
use crate::distribution::weighted::WeightedSampler;
use crate::distribution::UnitSource;
use crate::model::WorkloadModel;
use crate::target::pool::ObjectPool;
use std::sync::Arc;

/// Candidate slot
#[derive(Debug, Clone, Default)]
pub enum Candidate {
    #[default]
    None,
    Have(Arc<WorkloadModel>),
}

/// Result of one admission attempt
#[derive(Debug, Clone)]
pub enum AdmissionOutcome {
    /// The model fits the pool and must be admitted now
    Admit(Arc<WorkloadModel>),
    /// The model does not fit yet
    Deferred(Arc<WorkloadModel>),
}

/// Candidate sub-machine driven once per scheduler tick
#[derive(Debug, Clone)]
pub struct Admission {
    candidate: Candidate,
    policy: DeferralPolicy,
}

impl Admission {
    pub fn new(policy: DeferralPolicy) -> Self {
        Self {
            candidate: Candidate::None,
            policy,
        }
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Sample a candidate if needed and check it against the pool
    ///
    /// Does not touch the pool; the caller reserves objects on `Admit`.
    pub fn step(
        &mut self,
        sampler: &WeightedSampler,
        source: &mut dyn UnitSource,
        pool: &ObjectPool,
    ) -> AdmissionOutcome {
        let model = match std::mem::take(&mut self.candidate) {
            Candidate::Have(model) => model,
            Candidate::None => Arc::clone(sampler.sample(source.next_unit())),
        };

        if pool.has_headroom(model.object_count() as usize) {
            return AdmissionOutcome::Admit(model);
        }

        if self.policy == DeferralPolicy::Retain {
            self.candidate = Candidate::Have(Arc::clone(&model));
        }
        AdmissionOutcome::Deferred(model)
    }

    /// Drop any retained candidate
    pub fn discard(&mut self) {
        self.candidate = Candidate::None;
    }
}
