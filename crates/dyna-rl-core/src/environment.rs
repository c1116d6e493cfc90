//! Environment contract for finite MDPs

use ndarray::{Array2, Array3, ArrayView1};
use rand::Rng;
use rand_distr::{Distribution, WeightedIndex};
use tracing::debug;

use crate::{RLError, Reward};

/// Largest deviation from 1.0 tolerated in a transition row
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// A finite Markov decision process seen through its transition tensor
/// `P[s, a, s']` and reward table `R[s, a]`.
///
/// Agents only read from an environment; they never mutate it.
pub trait TabularEnvironment {
    /// Number of states
    fn num_states(&self) -> usize;

    /// Number of actions available in every state
    fn num_actions(&self) -> usize;

    /// State the agent starts in, and returns to after reaching the goal
    fn start_state(&self) -> usize;

    /// Goal state
    fn goal_state(&self) -> usize;

    /// Distribution over next states for `(state, action)`
    fn transition_probabilities(&self, state: usize, action: usize) -> ArrayView1<'_, f64>;

    /// Reward for taking `action` in `state`
    fn reward(&self, state: usize, action: usize) -> Reward;

    /// Sample a next state from `P[state, action, :]`
    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        state: usize,
        action: usize,
        rng: &mut R,
    ) -> crate::Result<usize> {
        let dist = WeightedIndex::<f64>::new(self.transition_probabilities(state, action).iter())
            .map_err(|e| {
                RLError::Environment(format!(
                    "transition row ({state}, {action}) is not a distribution: {e}"
                ))
            })?;
        Ok(dist.sample(rng))
    }
}

/// Dense, validated tabular MDP
#[derive(Debug, Clone)]
pub struct TabularMdp {
    transitions: Array3<f64>,
    rewards: Array2<f64>,
    start_state: usize,
    goal_state: usize,
    /// One sampler per `(s, a)`, row-major
    samplers: Vec<WeightedIndex<f64>>,
}

impl TabularMdp {
    /// Build an MDP from a `[S, A, S]` transition tensor and an `[S, A]`
    /// reward table.
    ///
    /// Fails if the shapes disagree, if `start` or `goal` is out of range, if
    /// any transition row is not a probability distribution, or if any reward
    /// is not finite.
    pub fn new(
        transitions: Array3<f64>,
        rewards: Array2<f64>,
        start_state: usize,
        goal_state: usize,
    ) -> crate::Result<Self> {
        let (num_states, num_actions, num_next) = transitions.dim();
        if num_states == 0 || num_actions == 0 {
            return Err(RLError::Environment(format!(
                "empty transition tensor ({num_states} states, {num_actions} actions)"
            )));
        }
        if num_next != num_states {
            return Err(RLError::DimensionMismatch {
                expected: num_states,
                actual: num_next,
            });
        }
        let (reward_states, reward_actions) = rewards.dim();
        if reward_states != num_states {
            return Err(RLError::DimensionMismatch {
                expected: num_states,
                actual: reward_states,
            });
        }
        if reward_actions != num_actions {
            return Err(RLError::DimensionMismatch {
                expected: num_actions,
                actual: reward_actions,
            });
        }
        for (label, index) in [("start", start_state), ("goal", goal_state)] {
            if index >= num_states {
                return Err(RLError::InvalidState(format!(
                    "{label} state {index} out of range for {num_states} states"
                )));
            }
        }
        if let Some(((s, a), r)) = rewards.indexed_iter().find(|(_, r)| !r.is_finite()) {
            return Err(RLError::Environment(format!(
                "reward for ({s}, {a}) is not finite: {r}"
            )));
        }

        let mut samplers = Vec::with_capacity(num_states * num_actions);
        for s in 0..num_states {
            for a in 0..num_actions {
                let row = transitions.slice(ndarray::s![s, a, ..]);
                if row.iter().any(|p| !p.is_finite() || *p < 0.0) {
                    return Err(RLError::Environment(format!(
                        "transition row ({s}, {a}) has a negative or non-finite entry"
                    )));
                }
                let total: f64 = row.sum();
                if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return Err(RLError::Environment(format!(
                        "transition row ({s}, {a}) sums to {total}, expected 1"
                    )));
                }
                let sampler = WeightedIndex::<f64>::new(row.iter()).map_err(|e| {
                    RLError::Environment(format!("transition row ({s}, {a}): {e}"))
                })?;
                samplers.push(sampler);
            }
        }

        debug!(num_states, num_actions, start_state, goal_state, "built tabular MDP");

        Ok(Self {
            transitions,
            rewards,
            start_state,
            goal_state,
            samplers,
        })
    }

    /// Build a deterministic MDP where `next_states[s][a]` is the only
    /// successor of `(s, a)` and `rewards[s][a]` its reward.
    pub fn deterministic(
        next_states: &[Vec<usize>],
        rewards: &[Vec<f64>],
        start_state: usize,
        goal_state: usize,
    ) -> crate::Result<Self> {
        let num_states = next_states.len();
        let num_actions = next_states.first().map_or(0, Vec::len);
        if rewards.len() != num_states {
            return Err(RLError::DimensionMismatch {
                expected: num_states,
                actual: rewards.len(),
            });
        }

        let mut transitions = Array3::zeros((num_states, num_actions, num_states));
        for (s, (successors, row_rewards)) in next_states.iter().zip(rewards).enumerate() {
            for len in [successors.len(), row_rewards.len()] {
                if len != num_actions {
                    return Err(RLError::DimensionMismatch {
                        expected: num_actions,
                        actual: len,
                    });
                }
            }
            for (a, &next) in successors.iter().enumerate() {
                if next >= num_states {
                    return Err(RLError::InvalidState(format!(
                        "successor {next} of ({s}, {a}) out of range for {num_states} states"
                    )));
                }
                transitions[[s, a, next]] = 1.0;
            }
        }
        let rewards = Array2::from_shape_fn((num_states, num_actions), |(s, a)| rewards[s][a]);

        Self::new(transitions, rewards, start_state, goal_state)
    }

    /// The full `[S, A, S]` transition tensor
    #[must_use]
    pub fn transitions(&self) -> &Array3<f64> {
        &self.transitions
    }

    /// The `[S, A]` reward table
    #[must_use]
    pub fn rewards(&self) -> &Array2<f64> {
        &self.rewards
    }
}

impl TabularEnvironment for TabularMdp {
    fn num_states(&self) -> usize {
        self.transitions.dim().0
    }

    fn num_actions(&self) -> usize {
        self.transitions.dim().1
    }

    fn start_state(&self) -> usize {
        self.start_state
    }

    fn goal_state(&self) -> usize {
        self.goal_state
    }

    fn transition_probabilities(&self, state: usize, action: usize) -> ArrayView1<'_, f64> {
        self.transitions.slice(ndarray::s![state, action, ..])
    }

    fn reward(&self, state: usize, action: usize) -> Reward {
        Reward(self.rewards[[state, action]])
    }

    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        state: usize,
        action: usize,
        rng: &mut R,
    ) -> crate::Result<usize> {
        let (num_states, num_actions) = (self.num_states(), self.num_actions());
        if state >= num_states {
            return Err(RLError::InvalidState(format!(
                "state {state} out of range for {num_states} states"
            )));
        }
        if action >= num_actions {
            return Err(RLError::InvalidAction(format!(
                "action {action} out of range for {num_actions} actions"
            )));
        }
        Ok(self.samplers[state * num_actions + action].sample(rng))
    }
}
