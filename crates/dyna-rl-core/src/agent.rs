//! Agent traits and shared configuration

use serde::{Deserialize, Serialize};

use crate::{History, RLError};

/// Learning parameters shared by tabular value learners
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Learning rate, in (0, 1]
    #[serde(alias = "learning_rate")]
    pub alpha: f64,
    /// Discount factor, in (0, 1)
    pub gamma: f64,
}

impl AgentConfig {
    /// Create a new configuration. Ranges are not checked here.
    #[must_use]
    pub fn new(alpha: f64, gamma: f64) -> Self {
        Self { alpha, gamma }
    }

    /// Check `alpha` in (0, 1] and `gamma` in (0, 1)
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(RLError::Configuration(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(RLError::Configuration(format!(
                "gamma must be in (0, 1), got {}",
                self.gamma
            )));
        }
        Ok(())
    }
}

fn default_reset() -> bool {
    true
}

/// Parameters of one call to [`TabularAgent::simulate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Number of real steps to run
    pub num_steps: usize,
    /// Recreate all learned state and return to the start state first
    #[serde(default = "default_reset")]
    pub reset: bool,
    /// Planning updates after every real step; `None` disables planning
    #[serde(default)]
    pub planning_updates: Option<usize>,
}

impl SimulationOptions {
    /// Run `num_steps` real steps from a fresh agent, without planning
    #[must_use]
    pub fn new(num_steps: usize) -> Self {
        Self {
            num_steps,
            reset: true,
            planning_updates: None,
        }
    }

    /// Set whether learned state is reset before running
    #[must_use]
    pub fn with_reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Perform `n` planning updates after every real step
    #[must_use]
    pub fn with_planning(mut self, n: usize) -> Self {
        self.planning_updates = Some(n);
        self
    }
}

/// Counters accumulated since the last reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Real steps taken
    pub total_steps: usize,
    /// Synthetic updates performed
    pub planning_updates: usize,
    /// Arrivals at the goal state
    pub episodes: usize,
    /// Sum of real rewards
    pub total_reward: f64,
}

/// An agent that interacts with a tabular environment and logs every real
/// transition it makes.
pub trait TabularAgent {
    /// Run real steps according to `options`
    fn simulate(&mut self, options: &SimulationOptions) -> crate::Result<()>;

    /// Every real transition since the last reset
    fn history(&self) -> &History;

    /// Counters since the last reset
    fn metrics(&self) -> AgentMetrics;

    /// Cumulative reward after each real step
    fn performance(&self) -> Vec<f64> {
        self.history().cumulative_rewards()
    }
}
