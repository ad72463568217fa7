//! Workload models
//!
//! A workload model is an immutable description of one reusable access pattern:
//! a nominal length (relative duration weight), the number of distinct storage
//! objects it touches, and a time-ordered list of operations against those
//! objects.
//!
//! Models are loaded once at startup into a [`ModelRegistry`] and shared as
//! `Arc<WorkloadModel>` handles by the sampler and every playback instance.
//!
//! # Example
//!
//! ```
//! use iosynth::model::{ModelOp, OpAction, WorkloadModel};
//!
//! let model = WorkloadModel::new(
//!     "seq-read",
//!     10,
//!     1,
//!     vec![ModelOp::new(0, OpAction::Read, 0, 0, 4096)],
//! ).unwrap();
//! assert_eq!(model.object_count(), 1);
//! ```

pub mod loader;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building or parsing a workload model
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model '{0}' has zero length")]
    ZeroLength(String),

    #[error("model '{0}' touches zero objects")]
    ZeroObjects(String),

    #[error("model '{model}' op {index} references object {object}, but the model only has {object_count} objects")]
    ObjectOutOfRange {
        model: String,
        index: usize,
        object: u32,
        object_count: u32,
    },

    #[error("model '{model}' op {index} at {at}us goes back in time (previous op at {previous}us)")]
    OutOfOrder {
        model: String,
        index: usize,
        at: u64,
        previous: u64,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: record '{model}' is missing its 'end' line")]
    Unterminated { line: usize, model: String },
}

/// IO action performed by a single model operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpAction {
    Read,
    Write,
    Trim,
    Sync,
    Datasync,
}

impl OpAction {
    /// Keyword used for this action in both the model file and the iolog
    pub fn as_str(&self) -> &'static str {
        match self {
            OpAction::Read => "read",
            OpAction::Write => "write",
            OpAction::Trim => "trim",
            OpAction::Sync => "sync",
            OpAction::Datasync => "datasync",
        }
    }

    /// Whether this action carries an offset/length pair
    pub fn has_range(&self) -> bool {
        matches!(self, OpAction::Read | OpAction::Write | OpAction::Trim)
    }
}

impl fmt::Display for OpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(OpAction::Read),
            "write" => Ok(OpAction::Write),
            "trim" => Ok(OpAction::Trim),
            "sync" => Ok(OpAction::Sync),
            "datasync" => Ok(OpAction::Datasync),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// One timestamped operation of a workload model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelOp {
    /// Offset in microseconds from the instance start
    pub at: u64,
    pub action: OpAction,
    /// Logical object index, `< object_count`
    pub object: u32,
    pub offset: u64,
    pub len: u64,
}

impl ModelOp {
    pub fn new(at: u64, action: OpAction, object: u32, offset: u64, len: u64) -> Self {
        Self {
            at,
            action,
            object,
            offset,
            len,
        }
    }
}

/// Immutable workload model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadModel {
    name: String,
    length: u32,
    object_count: u32,
    ops: Vec<ModelOp>,
}

impl WorkloadModel {
    /// Build a model, checking its invariants
    pub fn new(
        name: impl Into<String>,
        length: u32,
        object_count: u32,
        ops: Vec<ModelOp>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if length == 0 {
            return Err(ModelError::ZeroLength(name));
        }
        if object_count == 0 {
            return Err(ModelError::ZeroObjects(name));
        }

        let mut previous = 0u64;
        for (index, op) in ops.iter().enumerate() {
            if op.object >= object_count {
                return Err(ModelError::ObjectOutOfRange {
                    model: name,
                    index,
                    object: op.object,
                    object_count,
                });
            }
            if op.at < previous {
                return Err(ModelError::OutOfOrder {
                    model: name,
                    index,
                    at: op.at,
                    previous,
                });
            }
            previous = op.at;
        }

        Ok(Self {
            name,
            length,
            object_count,
            ops,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative duration weight
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Number of distinct objects an instance of this model touches
    pub fn object_count(&self) -> u32 {
        self.object_count
    }

    pub fn ops(&self) -> &[ModelOp] {
        &self.ops
    }
}

/// Read-only collection of loaded models
///
/// Populated once at startup and never mutated during generation. Handles are
/// cheap to clone and outlive any single playback instance.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<WorkloadModel>>,
}

impl ModelRegistry {
    pub fn new(models: Vec<WorkloadModel>) -> Self {
        Self {
            models: models.into_iter().map(Arc::new).collect(),
        }
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

    /// Smallest object footprint among all models
    pub fn min_object_count(&self) -> Option<u32> {
        self.models.iter().map(|m| m.object_count()).min()
    }
}
