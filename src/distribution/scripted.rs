//! Scripted draw sequence
//!
//! Replays a fixed list of draws in order, wrapping back to the start when
//! the list is exhausted. Lets tests steer model selection exactly.

use crate::distribution::UnitSource;

/// Source replaying a fixed sequence of draws: d0, d1, d2, d0, ...
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    draws: Vec<f64>,
    /// Index of the next draw
    position: usize,
}

impl ScriptedSource {
    /// Create a scripted source
    ///
    /// Draws are clamped into `[0, 1)`. An empty script always yields 0.0.
    pub fn new(draws: Vec<f64>) -> Self {
        let draws = draws
            .into_iter()
            .map(|d| d.clamp(0.0, f64::from_bits(1.0f64.to_bits() - 1)))
            .collect();
        Self { draws, position: 0 }
    }
}

impl UnitSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }

        let draw = self.draws[self.position];

        // Wrap around at the end of the script
        self.position += 1;
        if self.position >= self.draws.len() {
            self.position = 0;
        }

        draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_wraparound() {
        let mut source = ScriptedSource::new(vec![0.1, 0.5, 0.9]);

        assert_eq!(source.next_unit(), 0.1);
        assert_eq!(source.next_unit(), 0.5);
        assert_eq!(source.next_unit(), 0.9);
        assert_eq!(source.next_unit(), 0.1); // Wrapped
    }

    #[test]
    fn test_scripted_empty() {
        let mut source = ScriptedSource::new(vec![]);
        assert_eq!(source.next_unit(), 0.0);
    }

    #[test]
    fn test_scripted_clamps() {
        let mut source = ScriptedSource::new(vec![-0.5, 1.0, 7.0]);
        assert_eq!(source.next_unit(), 0.0);
        assert!(source.next_unit() < 1.0);
        assert!(source.next_unit() < 1.0);
    }
}
