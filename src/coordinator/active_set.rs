//! Time-ordered set of active playback instances
//!
//! A min-heap keyed by `(next_event_time, insertion_sequence)`. The sequence
//! number makes ties FIFO: of two instances due at the same time, the one
//! inserted first is popped first. Reinserting an instance gives it a fresh
//! sequence number.

use crate::worker::Playback;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct ActiveEntry {
    time: u64,
    seq: u64,
    playback: Playback,
}

impl ActiveEntry {
    fn key(&self) -> (u64, u64) {
        (self.time, self.seq)
    }
}

impl PartialEq for ActiveEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ActiveEntry {}

impl Ord for ActiveEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for ActiveEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Active instances ordered by next event time, FIFO within equal times
#[derive(Default)]
pub struct ActiveSet {
    heap: BinaryHeap<ActiveEntry>,
    next_seq: u64,
}

impl ActiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an instance under the time its next event is due
    pub fn push(&mut self, time: u64, playback: Playback) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(ActiveEntry {
            time,
            seq,
            playback,
        });
    }

    /// Remove the earliest instance along with its key time
    pub fn pop(&mut self) -> Option<(u64, Playback)> {
        self.heap.pop().map(|e| (e.time, e.playback))
    }

    /// Earliest pending event time
    pub fn peek_time(&self) -> Option<u64> {
        self.heap.peek().map(|e| e.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Take every remaining instance, in no particular order
    pub fn drain(&mut self) -> impl Iterator<Item = Playback> + '_ {
        self.heap.drain().map(|e| e.playback)
    }
}
