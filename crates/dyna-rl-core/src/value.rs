//! Dense action-value table

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Tabular Q-function over a finite state-action space.
///
/// Entries start at zero and are mutated in place by learning updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable {
    values: Array2<f64>,
}

impl QTable {
    /// Create a zero-initialised table
    #[must_use]
    pub fn zeros(num_states: usize, num_actions: usize) -> Self {
        Self {
            values: Array2::zeros((num_states, num_actions)),
        }
    }

    /// Number of states (rows)
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.values.nrows()
    }

    /// Number of actions (columns)
    #[must_use]
    pub fn num_actions(&self) -> usize {
        self.values.ncols()
    }

    /// `Q[state, action]`
    #[must_use]
    pub fn get(&self, state: usize, action: usize) -> f64 {
        self.values[[state, action]]
    }

    /// Overwrite `Q[state, action]`
    pub fn set(&mut self, state: usize, action: usize, value: f64) {
        self.values[[state, action]] = value;
    }

    /// Action values for one state
    #[must_use]
    pub fn row(&self, state: usize) -> ArrayView1<'_, f64> {
        self.values.row(state)
    }

    /// `max_a Q[state, a]`
    #[must_use]
    pub fn max_value(&self, state: usize) -> f64 {
        self.row(state)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// First action attaining the row maximum
    #[must_use]
    pub fn greedy_action(&self, state: usize) -> usize {
        let row = self.row(state);
        let mut best = 0;
        for (action, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = action;
            }
        }
        best
    }

    /// Whether every action value of `state` equals the first one
    #[must_use]
    pub fn is_uniform(&self, state: usize) -> bool {
        let row = self.row(state);
        row.iter().all(|&v| v == row[0])
    }

    /// Move `Q[state, action]` toward `target` by `step_size`, returning the
    /// temporal-difference error that was applied.
    pub fn step_toward(&mut self, state: usize, action: usize, target: f64, step_size: f64) -> f64 {
        let current = self.values[[state, action]];
        let td_error = target - current;
        self.values[[state, action]] = current + step_size * td_error;
        td_error
    }

    /// Zero every entry
    pub fn clear(&mut self) {
        self.values.fill(0.0);
    }
}
