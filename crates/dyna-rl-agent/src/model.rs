//! Learned one-step model used as the source of planning updates

use rand::Rng;

use dyna_rl_core::Transition;

/// Deterministic world model remembering the last observed outcome of every
/// `(state, action)` pair.
///
/// Every pair always has an entry: after construction or [`reset`] each pair
/// maps to a zero-reward self-loop, so [`sample`] never has to special-case
/// unseen pairs.
///
/// [`reset`]: ExperienceModel::reset
/// [`sample`]: ExperienceModel::sample
#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceModel {
    /// Row-major by `(state, action)`
    entries: Vec<Transition>,
    num_actions: usize,
}

impl ExperienceModel {
    /// Create a model filled with self-loops
    #[must_use]
    pub fn new(num_states: usize, num_actions: usize) -> Self {
        let entries = (0..num_states)
            .flat_map(|s| (0..num_actions).map(move |a| Transition::self_loop(s, a)))
            .collect();
        Self {
            entries,
            num_actions,
        }
    }

    /// Overwrite the stored outcome of `(transition.state, transition.action)`
    pub fn record(&mut self, transition: Transition) {
        let index = self.index(transition.state, transition.action);
        self.entries[index] = transition;
    }

    /// Stored outcome of `(state, action)`
    #[must_use]
    pub fn get(&self, state: usize, action: usize) -> &Transition {
        &self.entries[self.index(state, action)]
    }

    /// Draw one pair uniformly from all pairs and return its stored outcome
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Transition {
        self.entries[rng.gen_range(0..self.entries.len())]
    }

    /// Restore every entry to its self-loop
    pub fn reset(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            *entry = Transition::self_loop(index / self.num_actions, index % self.num_actions);
        }
    }

    /// Number of `(state, action)` pairs
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the model covers no pairs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over stored outcomes, row-major by `(state, action)`
    pub fn iter(&self) -> std::slice::Iter<'_, Transition> {
        self.entries.iter()
    }

    fn index(&self, state: usize, action: usize) -> usize {
        state * self.num_actions + action
    }
}
