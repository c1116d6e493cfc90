//! Dyna agent: direct learning interleaved with planning from a learned model

use metrics::{counter, increment_counter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, trace};

use dyna_rl_core::{
    AgentConfig, AgentMetrics, History, Policy, QTable, RLError, Result, Reward,
    SimulationOptions, TabularAgent, TabularEnvironment, TieBreakGreedy, Transition,
};

use crate::model::ExperienceModel;
use crate::recency::RecencyCounter;

/// How a planning update combines the plain and bonus-augmented targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusMode {
    /// Apply the plain update, then a second update toward the
    /// bonus-augmented target. A planning call moves `Q[s, a]` twice.
    #[default]
    Compound,
    /// Apply only the bonus-augmented update during planning
    Replace,
}

/// Dyna-specific configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynaConfig {
    /// Learning rate and discount
    #[serde(flatten)]
    pub base: AgentConfig,
    /// Weight of the `sqrt(steps since last chosen)` exploration bonus
    pub epsilon: f64,
    /// Planning update composition
    #[serde(default)]
    pub bonus_mode: BonusMode,
}

impl DynaConfig {
    /// Create a configuration. Ranges are not checked; see [`validate`].
    ///
    /// [`validate`]: DynaConfig::validate
    #[must_use]
    pub fn new(alpha: f64, gamma: f64, epsilon: f64) -> Self {
        Self {
            base: AgentConfig::new(alpha, gamma),
            epsilon,
            bonus_mode: BonusMode::default(),
        }
    }

    /// Set the planning update composition
    #[must_use]
    pub fn with_bonus_mode(mut self, bonus_mode: BonusMode) -> Self {
        self.bonus_mode = bonus_mode;
        self
    }

    /// Parse a JSON document such as
    /// `{"alpha": 0.5, "gamma": 0.9, "epsilon": 0.01}`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the documented ranges: `alpha` in (0, 1], `gamma` in (0, 1),
    /// `epsilon` finite and non-negative
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(RLError::Configuration(format!(
                "epsilon must be finite and >= 0, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Tabular Dyna agent with a last-outcome world model and a recency bonus
/// applied to planning updates.
///
/// All learned state (value table, model, recency counter, history) is owned
/// by the instance and persists across [`simulate`] calls unless a reset is
/// requested.
///
/// [`simulate`]: TabularAgent::simulate
#[derive(Debug, Clone)]
pub struct DynaAgent<E, R = StdRng> {
    config: DynaConfig,
    env: E,
    rng: R,
    policy: TieBreakGreedy,
    q: QTable,
    model: ExperienceModel,
    recency: RecencyCounter,
    history: History,
    metrics: AgentMetrics,
    state: usize,
}

impl<E: TabularEnvironment> DynaAgent<E, StdRng> {
    /// Create an agent whose random source is seeded from the OS
    #[must_use]
    pub fn new(config: DynaConfig, env: E) -> Self {
        Self::with_rng(config, env, StdRng::from_entropy())
    }

    /// Create an agent with a reproducible random source
    #[must_use]
    pub fn seeded(config: DynaConfig, env: E, seed: u64) -> Self {
        Self::with_rng(config, env, StdRng::seed_from_u64(seed))
    }
}

impl<E: TabularEnvironment, R: Rng> DynaAgent<E, R> {
    /// Create an agent drawing all of its randomness (tie-breaks, transition
    /// sampling, planning samples) from `rng`
    pub fn with_rng(config: DynaConfig, env: E, rng: R) -> Self {
        let (num_states, num_actions) = (env.num_states(), env.num_actions());
        let state = env.start_state();
        Self {
            config,
            env,
            rng,
            policy: TieBreakGreedy,
            q: QTable::zeros(num_states, num_actions),
            model: ExperienceModel::new(num_states, num_actions),
            recency: RecencyCounter::new(num_states, num_actions),
            history: History::new(),
            metrics: AgentMetrics::default(),
            state,
        }
    }

    /// Forget everything learned and return to the start state
    pub fn reset(&mut self) {
        self.q.clear();
        self.model.reset();
        self.recency.reset();
        self.history.clear();
        self.metrics = AgentMetrics::default();
        self.state = self.env.start_state();
    }

    /// Pick an action for `state` with the tie-breaking greedy policy
    pub fn select_action(&mut self, state: usize) -> usize {
        self.policy.select(&self.q, state, &mut self.rng)
    }

    /// Apply one learning update for `(state, action) -> (reward, next_state)`.
    ///
    /// The plain target is `r + gamma * max Q[next_state]`. With `use_bonus`
    /// the target of the bonus update adds `epsilon * sqrt(C[state, action])`;
    /// under [`BonusMode::Compound`] that update follows the plain one and
    /// sees its result.
    pub fn update(
        &mut self,
        state: usize,
        action: usize,
        reward: Reward,
        next_state: usize,
        use_bonus: bool,
    ) {
        let AgentConfig { alpha, gamma } = self.config.base;

        if !use_bonus || self.config.bonus_mode == BonusMode::Compound {
            let target = reward.value() + gamma * self.q.max_value(next_state);
            let td_error = self.q.step_toward(state, action, target, alpha);
            trace!(state, action, td_error, "value update");
        }

        if use_bonus {
            let bonus = self.recency.bonus(state, action, self.config.epsilon);
            let target = reward.value() + bonus + gamma * self.q.max_value(next_state);
            let td_error = self.q.step_toward(state, action, target, alpha);
            trace!(state, action, bonus, td_error, "bonus update");
        }
    }

    /// Learn from one real transition: value update, model record, recency
    /// touch and history append, in that order.
    pub fn observe(&mut self, transition: Transition) -> Result<()> {
        let Transition {
            state,
            action,
            reward,
            next_state,
        } = transition;
        self.check_state(state)?;
        self.check_state(next_state)?;
        if action >= self.env.num_actions() {
            return Err(RLError::InvalidAction(format!(
                "action {action} out of range for {} actions",
                self.env.num_actions()
            )));
        }

        self.update(state, action, reward, next_state, false);
        self.model.record(transition);
        self.recency.touch(state, action);
        self.history.push(transition);

        self.metrics.total_steps += 1;
        self.metrics.total_reward += reward.value();
        increment_counter!("dyna_real_steps_total");
        Ok(())
    }

    /// Perform `n` synthetic updates from pairs drawn uniformly out of the
    /// experience model
    pub fn plan(&mut self, n: usize) {
        for _ in 0..n {
            let t = self.model.sample(&mut self.rng);
            self.update(t.state, t.action, t.reward, t.next_state, true);
        }
        self.metrics.planning_updates += n;
        counter!(
            "dyna_planning_updates_total",
            u64::try_from(n).unwrap_or(u64::MAX)
        );
    }

    /// Take one real step from the current state, learn from it, optionally
    /// plan, then move (returning to the start state on reaching the goal).
    ///
    /// Fails with [`RLError::InvalidState`] if the current, goal or sampled
    /// next state lies outside the environment's state space.
    pub fn step(&mut self, planning_updates: Option<usize>) -> Result<Transition> {
        let state = self.state;
        self.check_state(state)?;
        self.check_state(self.env.goal_state())?;
        let action = self.select_action(state);
        let next_state = self.env.sample_next_state(state, action, &mut self.rng)?;
        self.check_state(next_state)?;
        let reward = self.env.reward(state, action);

        let transition = Transition::new(state, action, reward, next_state);
        self.observe(transition)?;

        if let Some(n) = planning_updates {
            self.plan(n);
        }

        if next_state == self.env.goal_state() {
            self.metrics.episodes += 1;
            increment_counter!("dyna_episodes_total");
            debug!(
                step = self.metrics.total_steps,
                episode = self.metrics.episodes,
                "goal reached, returning to start"
            );
            self.state = self.env.start_state();
        } else {
            self.state = next_state;
        }

        Ok(transition)
    }

    /// Agent configuration
    #[must_use]
    pub fn config(&self) -> &DynaConfig {
        &self.config
    }

    /// The environment the agent acts in
    #[must_use]
    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Learned action values
    #[must_use]
    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    /// Learned one-step model
    #[must_use]
    pub fn experience_model(&self) -> &ExperienceModel {
        &self.model
    }

    /// Steps-since-last-chosen counters
    #[must_use]
    pub fn recency(&self) -> &RecencyCounter {
        &self.recency
    }

    /// State the next real step starts from
    #[must_use]
    pub fn current_state(&self) -> usize {
        self.state
    }

    fn check_state(&self, state: usize) -> Result<()> {
        if state >= self.env.num_states() {
            return Err(RLError::InvalidState(format!(
                "state {state} out of range for {} states",
                self.env.num_states()
            )));
        }
        Ok(())
    }
}

impl<E: TabularEnvironment, R: Rng> TabularAgent for DynaAgent<E, R> {
    fn simulate(&mut self, options: &SimulationOptions) -> Result<()> {
        let span = info_span!(
            "dyna_simulate",
            steps = options.num_steps,
            reset = options.reset,
            planning = ?options.planning_updates
        );
        let _guard = span.enter();

        if options.reset {
            self.reset();
        }

        for _ in 0..options.num_steps {
            self.step(options.planning_updates)?;
        }

        info!(
            total_steps = self.metrics.total_steps,
            episodes = self.metrics.episodes,
            total_reward = self.metrics.total_reward,
            "simulation finished"
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
