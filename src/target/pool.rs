//! Bounded object name pool
//!
//! Allocates object names under a shared prefix and tracks how many distinct
//! objects are in use. The pool only grows: names are never released, so
//! every name it hands out is unique for the lifetime of the pool.

use super::object_name;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the object pool
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("object pool exhausted: {requested} objects requested, {in_use} of {max} in use")]
    Exhausted {
        requested: usize,
        in_use: usize,
        max: usize,
    },
}

/// Pool of storage object names
#[derive(Debug, Clone)]
pub struct ObjectPool {
    prefix: String,
    max_objects: usize,
    /// Logical index -> name
    names: Vec<Arc<str>>,
}

impl ObjectPool {
    /// Create an empty pool capped at `max_objects` names
    pub fn new(prefix: impl Into<String>, max_objects: usize) -> Self {
        Self {
            prefix: prefix.into(),
            max_objects,
            names: Vec::new(),
        }
    }

    pub fn max_objects(&self) -> usize {
        self.max_objects
    }

    /// Number of distinct objects handed out so far
    pub fn names_count(&self) -> usize {
        self.names.len()
    }

    /// Names still available before the cap is reached
    pub fn remaining(&self) -> usize {
        self.max_objects.saturating_sub(self.names.len())
    }

    /// Whether `n` more objects fit under the cap
    pub fn has_headroom(&self, n: usize) -> bool {
        self.names.len() + n <= self.max_objects
    }

    /// Allocate `n` new object names
    ///
    /// Fails without allocating anything when the cap would be exceeded.
    pub fn reserve(&mut self, n: usize) -> Result<Vec<Arc<str>>, PoolError> {
        if !self.has_headroom(n) {
            return Err(PoolError::Exhausted {
                requested: n,
                in_use: self.names.len(),
                max: self.max_objects,
            });
        }

        let start = self.names.len();
        for index in start..start + n {
            self.names
                .push(Arc::from(object_name(&self.prefix, index as u64)));
        }
        Ok(self.names[start..].to_vec())
    }
}
