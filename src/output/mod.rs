//! Trace and report output
//!
//! - **iolog**: the replayable trace itself (fio version 2 iolog)
//! - **text**: human-readable generation summary
//! - **json**: machine-readable generation summary
//!
//! The scheduler talks to the trace through the [`TraceSink`] trait, so tests
//! can observe every batch with its kind and simulated timestamp while the
//! real writer just forwards the commands verbatim.

pub mod iolog;
pub mod json;
pub mod text;

use crate::Result;

/// First line of every trace
pub const IOLOG_HEADER: &str = "fio version 2 iolog\n";

/// Where a batch of commands came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Object creation on admission, plus cleanup if the model has no ops
    Open,
    /// One pending event of an active instance, plus cleanup if it was the last
    Drain,
    /// Cleanup of an instance still active when the run stops
    Close,
}

/// A block of serialized commands released by the scheduler
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    pub kind: BatchKind,
    /// Simulated time (microseconds) at which the batch was released
    pub time: u64,
    pub commands: &'a str,
}

/// Destination for the ordered trace
///
/// Batches must be written in the order received; sinks never reorder.
pub trait TraceSink {
    /// Write the trace header; called once before any batch
    fn write_header(&mut self) -> Result<()>;

    /// Append one batch
    fn write_batch(&mut self, batch: &Batch<'_>) -> Result<()>;
}
