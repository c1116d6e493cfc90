//! Transitions and the append-only history of real experience

use serde::{Deserialize, Serialize};

use crate::Reward;

/// One `(state, action, reward, next_state)` transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the action was taken in
    pub state: usize,
    /// Action taken
    pub action: usize,
    /// Reward received
    pub reward: Reward,
    /// State reached
    pub next_state: usize,
}

impl Transition {
    /// Create a new transition
    #[must_use]
    pub fn new(state: usize, action: usize, reward: impl Into<Reward>, next_state: usize) -> Self {
        Self {
            state,
            action,
            reward: reward.into(),
            next_state,
        }
    }

    /// A zero-reward transition from `(state, action)` back to `state`
    #[must_use]
    pub fn self_loop(state: usize, action: usize) -> Self {
        Self::new(state, action, Reward::default(), state)
    }
}

/// Ordered record of every real transition, one entry per real step.
///
/// Entries are only ever appended; the log is cleared when the owning agent
/// is reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    transitions: Vec<Transition>,
}

impl History {
    /// Create an empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition
    pub fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Number of logged steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if no step has been logged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Logged transitions in order
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Iterate over logged transitions in order
    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.transitions.iter()
    }

    /// The reward column
    #[must_use]
    pub fn rewards(&self) -> Vec<f64> {
        self.iter().map(|t| t.reward.value()).collect()
    }

    /// Running sum of the reward column, one value per step
    #[must_use]
    pub fn cumulative_rewards(&self) -> Vec<f64> {
        self.iter()
            .scan(0.0, |total, t| {
                *total += t.reward.value();
                Some(*total)
            })
            .collect()
    }

    /// Sum of all logged rewards
    #[must_use]
    pub fn total_reward(&self) -> Reward {
        self.iter().map(|t| t.reward).sum()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Transition;
    type IntoIter = std::slice::Iter<'a, Transition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
