//! Random agent for baseline comparisons

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use dyna_rl_core::{
    AgentMetrics, History, RLError, Result, SimulationOptions, TabularAgent, TabularEnvironment,
    Transition,
};

/// Agent that selects actions uniformly at random and never learns.
///
/// It follows the same start/goal movement rules and logs the same history as
/// [`DynaAgent`](crate::DynaAgent), so performance curves are comparable.
/// Planning budgets are ignored.
#[derive(Debug, Clone)]
pub struct RandomAgent<E, R = StdRng> {
    env: E,
    rng: R,
    history: History,
    metrics: AgentMetrics,
    state: usize,
}

impl<E: TabularEnvironment> RandomAgent<E, StdRng> {
    /// Create a random agent with a reproducible random source
    #[must_use]
    pub fn seeded(env: E, seed: u64) -> Self {
        Self::with_rng(env, StdRng::seed_from_u64(seed))
    }
}

impl<E: TabularEnvironment, R: Rng> RandomAgent<E, R> {
    /// Create a random agent drawing from `rng`
    pub fn with_rng(env: E, rng: R) -> Self {
        let state = env.start_state();
        Self {
            env,
            rng,
            history: History::new(),
            metrics: AgentMetrics::default(),
            state,
        }
    }

    fn step(&mut self) -> Result<Transition> {
        let state = self.state;
        let action = self.rng.gen_range(0..self.env.num_actions());
        let next_state = self.env.sample_next_state(state, action, &mut self.rng)?;
        if next_state >= self.env.num_states() {
            return Err(RLError::InvalidState(format!(
                "state {next_state} out of range for {} states",
                self.env.num_states()
            )));
        }
        let transition = Transition::new(state, action, self.env.reward(state, action), next_state);

        self.history.push(transition);
        self.metrics.total_steps += 1;
        self.metrics.total_reward += transition.reward.value();

        if next_state == self.env.goal_state() {
            self.metrics.episodes += 1;
            self.state = self.env.start_state();
        } else {
            self.state = next_state;
        }
        Ok(transition)
    }
}

impl<E: TabularEnvironment, R: Rng> TabularAgent for RandomAgent<E, R> {
    fn simulate(&mut self, options: &SimulationOptions) -> Result<()> {
        if options.reset {
            self.history.clear();
            self.metrics = AgentMetrics::default();
            self.state = self.env.start_state();
        }
        for _ in 0..options.num_steps {
            self.step()?;
        }
        info!(
            total_steps = self.metrics.total_steps,
            episodes = self.metrics.episodes,
            "random baseline finished"
        );
        Ok(())
    }

    fn history(&self) -> &History {
        &self.history
    }

    fn metrics(&self) -> AgentMetrics {
        self.metrics
    }
}
