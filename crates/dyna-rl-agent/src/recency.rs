//! Steps-since-last-chosen bookkeeping for the exploration bonus

use ndarray::Array2;

/// Per `(state, action)` count of real steps since the pair was last chosen.
///
/// Only real steps touch the counter; planning reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecencyCounter {
    counts: Array2<u64>,
}

impl RecencyCounter {
    /// Create a counter with every entry at zero
    #[must_use]
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        Self {
            counts: Array2::zeros((num_states, num_actions)),
        }
    }

    /// Record a real step that chose `(state, action)`: every entry grows by
    /// one, then the chosen entry drops to zero.
    pub fn touch(&mut self, state: usize, action: usize) {
        self.counts += 1_u64;
        self.counts[[state, action]] = 0;
    }

    /// Real steps since `(state, action)` was last chosen
    #[must_use]
    pub fn get(&self, state: usize, action: usize) -> u64 {
        self.counts[[state, action]]
    }

    /// Exploration bonus `epsilon * sqrt(C[state, action])`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bonus(&self, state: usize, action: usize, epsilon: f64) -> f64 {
        epsilon * (self.get(state, action) as f64).sqrt()
    }

    /// Zero every entry
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }
}
