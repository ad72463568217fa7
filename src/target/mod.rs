//! Simulated storage targets
//!
//! The generator never touches real storage. A target here is a named storage
//! object (e.g. an RBD data object) that appears in the trace. All names come
//! from one shared [`pool::ObjectPool`] so the set of objects a trace touches
//! stays bounded.
//!
//! # Example
//!
//! ```
//! use iosynth::target::pool::ObjectPool;
//!
//! let mut pool = ObjectPool::new("x.", 4);
//! let names = pool.reserve(2).unwrap();
//! assert_eq!(&*names[0], "x.0000000000000000");
//! assert_eq!(pool.names_count(), 2);
//! assert!(!pool.has_headroom(3));
//! ```

pub mod pool;

/// Name of the object with the given running index
///
/// Zero-padded hex keeps names fixed-width and lexically ordered by index.
pub fn object_name(prefix: &str, index: u64) -> String {
    format!("{}{:016x}", prefix, index)
}
