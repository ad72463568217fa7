//! Playback instances
//!
//! A [`Playback`] is a live, time-bound run of one workload model against the
//! shared object pool. It owns the object names reserved for it at admission
//! and walks the model's operation list with a cursor, turning each operation
//! into iolog commands.
//!
//! # Lifecycle
//!
//! ```text
//! Bound --open()--> Active --emit_next()...--> Exhausted --close()--> Closed
//!                     |                                                 ^
//!                     +------------------- close() (shutdown) ----------+
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use iosynth::model::{ModelOp, OpAction, WorkloadModel};
//! use iosynth::target::pool::ObjectPool;
//! use iosynth::worker::Playback;
//!
//! let model = Arc::new(WorkloadModel::new(
//!     "m", 10, 1, vec![ModelOp::new(5, OpAction::Read, 0, 0, 4096)],
//! )?);
//! let mut pool = ObjectPool::new("x.", 10);
//! let mut pb = Playback::admit(model, &mut pool, 100)?;
//!
//! let opened = pb.open()?;
//! assert_eq!(opened, "x.0000000000000000 add\nx.0000000000000000 open\n");
//! assert_eq!(pb.next_event_time(), Some(105));
//!
//! let cmd = pb.emit_next(105)?;
//! assert_eq!(cmd, "x.0000000000000000 read 0 4096\n");
//! assert_eq!(pb.next_event_time(), None);
//!
//! assert_eq!(pb.close()?, "x.0000000000000000 close\n");
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::model::{ModelOp, WorkloadModel};
use crate::target::pool::{ObjectPool, PoolError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Lifecycle state of a playback instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Created, objects reserved, not yet opened
    Bound,
    /// Opened, has a pending event
    Active,
    /// No further events; waiting for close
    Exhausted,
    /// Close commands emitted
    Closed,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlaybackState::Bound => "bound",
            PlaybackState::Active => "active",
            PlaybackState::Exhausted => "exhausted",
            PlaybackState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Protocol violations on a playback instance
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("cannot {op} a playback instance in state '{state}'")]
    InvalidState {
        op: &'static str,
        state: PlaybackState,
    },

    #[error("event requested at {requested}us but the next event is due at {due:?}")]
    NotDue { requested: u64, due: Option<u64> },
}

/// Live run of one workload model
#[derive(Debug)]
pub struct Playback {
    model: Arc<WorkloadModel>,
    start_time: u64,
    /// Model object index -> reserved pool name
    objects: Vec<Arc<str>>,
    /// Next model op to emit
    cursor: usize,
    state: PlaybackState,
}

impl Playback {
    /// Reserve the model's objects and bind a new instance starting at `start_time`
    ///
    /// This is the only point at which an instance consumes pool capacity.
    pub fn admit(
        model: Arc<WorkloadModel>,
        pool: &mut ObjectPool,
        start_time: u64,
    ) -> Result<Self, PoolError> {
        let objects = pool.reserve(model.object_count() as usize)?;
        Ok(Self {
            model,
            start_time,
            objects,
            cursor: 0,
            state: PlaybackState::Bound,
        })
    }

    pub fn model(&self) -> &Arc<WorkloadModel> {
        &self.model
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Object names owned by this instance
    pub fn objects(&self) -> &[Arc<str>] {
        &self.objects
    }

    /// Bound -> Active: emit object creation commands
    ///
    /// A model without operations goes straight to Exhausted.
    pub fn open(&mut self) -> Result<String, PlaybackError> {
        self.expect_state("open", PlaybackState::Bound)?;

        let mut out = String::new();
        for name in &self.objects {
            out.push_str(&format!("{} add\n{} open\n", name, name));
        }

        self.state = if self.model.ops().is_empty() {
            PlaybackState::Exhausted
        } else {
            PlaybackState::Active
        };
        Ok(out)
    }

    /// Absolute time of the next pending event, `None` once exhausted
    pub fn next_event_time(&self) -> Option<u64> {
        if self.state != PlaybackState::Active {
            return None;
        }
        self.model
            .ops()
            .get(self.cursor)
            .map(|op| self.start_time.saturating_add(op.at))
    }

    /// Emit the command for the pending event due at `at` and advance
    pub fn emit_next(&mut self, at: u64) -> Result<String, PlaybackError> {
        self.expect_state("emit from", PlaybackState::Active)?;

        let due = self.next_event_time();
        if due != Some(at) {
            return Err(PlaybackError::NotDue { requested: at, due });
        }

        let op = self.model.ops()[self.cursor];
        self.cursor += 1;
        if self.cursor >= self.model.ops().len() {
            self.state = PlaybackState::Exhausted;
        }

        Ok(self.format_op(&op))
    }

    /// Emit closing commands; valid once, from Active or Exhausted
    pub fn close(&mut self) -> Result<String, PlaybackError> {
        match self.state {
            PlaybackState::Active | PlaybackState::Exhausted => {}
            state => return Err(PlaybackError::InvalidState { op: "close", state }),
        }

        let mut out = String::new();
        for name in &self.objects {
            out.push_str(&format!("{} close\n", name));
        }
        self.state = PlaybackState::Closed;
        Ok(out)
    }

    fn format_op(&self, op: &ModelOp) -> String {
        // Object indices are validated against object_count at model load
        let name = &self.objects[op.object as usize];
        format!("{} {} {} {}\n", name, op.action, op.offset, op.len)
    }

    fn expect_state(&self, op: &'static str, expected: PlaybackState) -> Result<(), PlaybackError> {
        if self.state != expected {
            return Err(PlaybackError::InvalidState {
                op,
                state: self.state,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OpAction;

    fn two_object_model() -> Arc<WorkloadModel> {
        Arc::new(
            WorkloadModel::new(
                "two",
                10,
                2,
                vec![
                    ModelOp::new(0, OpAction::Write, 0, 0, 4096),
                    ModelOp::new(3, OpAction::Read, 1, 8192, 512),
                    ModelOp::new(3, OpAction::Sync, 1, 0, 0),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_admit_reserves_objects() {
        let mut pool = ObjectPool::new("x.", 10);
        let pb = Playback::admit(two_object_model(), &mut pool, 0).unwrap();
        assert_eq!(pool.names_count(), 2);
        assert_eq!(pb.objects().len(), 2);
        assert_eq!(pb.state(), PlaybackState::Bound);
        assert_eq!(pb.next_event_time(), None);
    }

    #[test]
    fn test_admit_respects_cap() {
        let mut pool = ObjectPool::new("x.", 1);
        assert!(Playback::admit(two_object_model(), &mut pool, 0).is_err());
        assert_eq!(pool.names_count(), 0);
    }

    #[test]
    fn test_full_lifecycle() {
        let mut pool = ObjectPool::new("x.", 10);
        let mut pb = Playback::admit(two_object_model(), &mut pool, 50).unwrap();

        let opened = pb.open().unwrap();
        assert_eq!(
            opened,
            "x.0000000000000000 add\nx.0000000000000000 open\n\
             x.0000000000000001 add\nx.0000000000000001 open\n"
        );
        assert_eq!(pb.state(), PlaybackState::Active);

        assert_eq!(pb.next_event_time(), Some(50));
        assert_eq!(pb.emit_next(50).unwrap(), "x.0000000000000000 write 0 4096\n");
        assert_eq!(pb.next_event_time(), Some(53));
        assert_eq!(pb.emit_next(53).unwrap(), "x.0000000000000001 read 8192 512\n");
        assert_eq!(pb.next_event_time(), Some(53));
        assert_eq!(pb.emit_next(53).unwrap(), "x.0000000000000001 sync 0 0\n");

        assert_eq!(pb.state(), PlaybackState::Exhausted);
        assert_eq!(pb.next_event_time(), None);

        let closed = pb.close().unwrap();
        assert_eq!(closed, "x.0000000000000000 close\nx.0000000000000001 close\n");
        assert_eq!(pb.state(), PlaybackState::Closed);
    }

    #[test]
    fn test_forced_close_while_active() {
        let mut pool = ObjectPool::new("x.", 10);
        let mut pb = Playback::admit(two_object_model(), &mut pool, 0).unwrap();
        pb.open().unwrap();
        pb.emit_next(0).unwrap();

        assert!(pb.close().is_ok());
        assert_eq!(pb.next_event_time(), None);
    }

    #[test]
    fn test_protocol_violations() {
        let mut pool = ObjectPool::new("x.", 10);
        let mut pb = Playback::admit(two_object_model(), &mut pool, 0).unwrap();

        assert_eq!(
            pb.emit_next(0).unwrap_err(),
            PlaybackError::InvalidState {
                op: "emit from",
                state: PlaybackState::Bound
            }
        );
        assert!(pb.close().is_err());

        pb.open().unwrap();
        assert!(pb.open().is_err());
        assert_eq!(
            pb.emit_next(7).unwrap_err(),
            PlaybackError::NotDue {
                requested: 7,
                due: Some(0)
            }
        );

        pb.close().unwrap();
        assert!(pb.close().is_err());
    }

    #[test]
    fn test_empty_model_exhausted_on_open() {
        let model = Arc::new(WorkloadModel::new("idle", 1, 1, vec![]).unwrap());
        let mut pool = ObjectPool::new("x.", 10);
        let mut pb = Playback::admit(model, &mut pool, 0).unwrap();

        pb.open().unwrap();
        assert_eq!(pb.state(), PlaybackState::Exhausted);
        assert_eq!(pb.next_event_time(), None);
        assert!(pb.close().is_ok());
    }
}
