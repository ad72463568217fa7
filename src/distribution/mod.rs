//! Random draws and workload model selection
//!
//! This module provides the uniform random source that drives the generator
//! and the weighted sampler that maps a uniform draw to a workload model.
//!
//! # Sources
//!
//! - **Xoshiro**: seedable xoshiro256++ stream (default)
//! - **Scripted**: replays a fixed list of draws (tests, debugging)
//!
//! # Example
//!
//! ```
//! use iosynth::distribution::{UnitSource, uniform::XoshiroSource};
//!
//! let mut source = XoshiroSource::with_seed(7);
//! let u = source.next_unit();
//! assert!((0.0..1.0).contains(&u));
//! ```

/// Source of uniform draws in `[0, 1)`
///
/// The generator is single-threaded and fully deterministic given a fixed
/// seed, so implementations only need to be `Send` to allow the generator to
/// be moved into a thread by the caller.
pub trait UnitSource: Send {
    /// Next uniform draw in `[0, 1)`
    fn next_unit(&mut self) -> f64;
}

pub mod scripted;
pub mod uniform;
pub mod weighted;
