//! End-to-end tests for the Dyna simulation loop

use approx::assert_relative_eq;
use ndarray::{array, Array1, Array3};
use rand::Rng;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing_subscriber::EnvFilter;

use dyna_rl_agent::{BonusMode, DynaAgent, DynaConfig, RandomAgent};
use dyna_rl_core::{
    RLError, Reward, SimulationOptions, TabularAgent, TabularEnvironment, TabularMdp,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// 0 --a0--> 1 (goal) with reward 1
fn two_state_env() -> TabularMdp {
    TabularMdp::deterministic(&[vec![1], vec![1]], &[vec![1.0], vec![0.0]], 0, 1).unwrap()
}

/// Corridor of `len` states; action 0 moves left, action 1 moves right.
/// Stepping right into the last state (the goal) pays 1.
fn corridor_env(len: usize) -> TabularMdp {
    let goal = len - 1;
    let next_states: Vec<Vec<usize>> = (0..len)
        .map(|s| vec![s.saturating_sub(1), (s + 1).min(goal)])
        .collect();
    let rewards: Vec<Vec<f64>> = (0..len)
        .map(|s| vec![0.0, if s + 1 == goal { 1.0 } else { 0.0 }])
        .collect();
    TabularMdp::deterministic(&next_states, &rewards, 0, goal).unwrap()
}

/// Three states, two actions, noisy transitions and mixed-sign rewards
fn noisy_env() -> TabularMdp {
    let mut transitions = Array3::zeros((3, 2, 3));
    for s in 0..3 {
        transitions[[s, 0, s]] = 0.6;
        transitions[[s, 0, (s + 1) % 3]] = 0.4;
        transitions[[s, 1, (s + 2) % 3]] = 0.7;
        transitions[[s, 1, (s + 1) % 3]] = 0.3;
    }
    let rewards = array![[0.0, -1.0], [2.0, 0.5], [0.0, 1.0]];
    TabularMdp::new(transitions, rewards, 0, 2).unwrap()
}

#[test]
fn test_two_state_scenario_without_planning() {
    init_tracing();
    let alpha = 0.4;
    let mut agent = DynaAgent::seeded(DynaConfig::new(alpha, 0.9, 0.1), two_state_env(), 0);
    agent.simulate(&SimulationOptions::new(3)).unwrap();

    let history = agent.history();
    assert_eq!(history.len(), 3);
    for t in history {
        assert_eq!((t.state, t.action, t.reward, t.next_state), (0, 0, Reward(1.0), 1));
    }

    // the goal row is never acted from, so max Q[1] stays 0
    let expected = 1.0 - (1.0_f64 - alpha).powi(3);
    assert_relative_eq!(agent.q_table().get(0, 0), expected, max_relative = 1e-12);
    assert_eq!(agent.q_table().get(1, 0), 0.0);
    assert_eq!(agent.performance(), vec![1.0, 2.0, 3.0]);
    assert_eq!(agent.metrics().episodes, 3);
}

#[test]
fn test_fresh_policy_is_uniform() {
    let env = TabularMdp::deterministic(&[vec![0; 4]], &[vec![0.0; 4]], 0, 0).unwrap();
    let mut agent = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.0), env, 2024);

    let draws = 4_000;
    let mut counts = [0u32; 4];
    for _ in 0..draws {
        counts[agent.select_action(0)] += 1;
    }

    let expected = f64::from(draws) / 4.0;
    let statistic: f64 = counts
        .iter()
        .map(|&c| (f64::from(c) - expected).powi(2) / expected)
        .sum();
    let critical = ChiSquared::new(3.0).unwrap().inverse_cdf(0.999);
    assert!(statistic < critical, "counts {counts:?}, chi2 {statistic}");
}

#[test]
fn test_seeded_runs_are_identical() {
    let config = DynaConfig::new(0.3, 0.95, 0.05);
    let options = SimulationOptions::new(300).with_planning(4);

    let mut first = DynaAgent::seeded(config, noisy_env(), 77);
    let mut second = DynaAgent::seeded(config, noisy_env(), 77);
    first.simulate(&options).unwrap();
    second.simulate(&options).unwrap();

    assert_eq!(first.history(), second.history());
    assert_eq!(first.q_table(), second.q_table());
    assert_eq!(first.metrics(), second.metrics());

    let mut other = DynaAgent::seeded(config, noisy_env(), 78);
    other.simulate(&options).unwrap();
    assert_ne!(first.history(), other.history());
}

#[test]
fn test_performance_is_prefix_sum_of_rewards() {
    let mut agent = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.1), noisy_env(), 3);
    agent
        .simulate(&SimulationOptions::new(200).with_planning(2))
        .unwrap();

    let performance = agent.performance();
    assert_eq!(performance.len(), 200);
    let mut total = 0.0;
    for (value, t) in performance.iter().zip(agent.history()) {
        total += t.reward.value();
        assert_eq!(*value, total);
    }
    assert_eq!(agent.metrics().total_reward, total);
}

#[test]
fn test_recency_matches_history() {
    let mut agent = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.1), noisy_env(), 11);
    agent
        .simulate(&SimulationOptions::new(150).with_planning(5))
        .unwrap();

    let transitions = agent.history().transitions();
    let steps = transitions.len() as u64;
    for s in 0..3 {
        for a in 0..2 {
            let expected = transitions
                .iter()
                .rposition(|t| (t.state, t.action) == (s, a))
                .map_or(steps, |last| steps - 1 - last as u64);
            assert_eq!(agent.recency().get(s, a), expected, "pair ({s}, {a})");
        }
    }
}

#[test]
fn test_model_holds_last_outcome_of_each_pair() {
    let mut agent = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.1), noisy_env(), 19);
    agent.simulate(&SimulationOptions::new(100)).unwrap();

    for s in 0..3 {
        for a in 0..2 {
            let last = agent
                .history()
                .iter()
                .rev()
                .find(|t| (t.state, t.action) == (s, a))
                .copied();
            let stored = *agent.experience_model().get(s, a);
            match last {
                Some(t) => assert_eq!(stored, t),
                None => assert_eq!((stored.reward, stored.next_state), (Reward(0.0), s)),
            }
        }
    }
}

#[test]
fn test_training_continues_without_reset() {
    // a positive bonus makes every planning update move the table
    let mut agent = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.1), corridor_env(5), 4);
    agent
        .simulate(&SimulationOptions::new(25).with_planning(2))
        .unwrap();
    let q_before = agent.q_table().clone();

    agent
        .simulate(&SimulationOptions::new(25).with_reset(false).with_planning(2))
        .unwrap();
    assert_eq!(agent.history().len(), 50);
    assert_eq!(agent.metrics().total_steps, 50);
    assert_ne!(*agent.q_table(), q_before);

    agent.simulate(&SimulationOptions::new(10)).unwrap();
    assert_eq!(agent.history().len(), 10);
}

#[test]
fn test_planning_beats_random_baseline() {
    init_tracing();
    let steps = 2_000;

    let mut dyna = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.0), corridor_env(10), 8);
    dyna.simulate(&SimulationOptions::new(steps).with_planning(20))
        .unwrap();

    let mut baseline = RandomAgent::seeded(corridor_env(10), 8);
    baseline.simulate(&SimulationOptions::new(steps)).unwrap();

    let dyna_reward = *dyna.performance().last().unwrap();
    let random_reward = *baseline.performance().last().unwrap();
    assert!(
        dyna_reward > 2.0 * random_reward,
        "dyna {dyna_reward} vs random {random_reward}"
    );
    assert_eq!(dyna.metrics().planning_updates, steps * 20);
}

#[test]
fn test_replace_mode_still_learns() {
    let config = DynaConfig::new(0.5, 0.9, 0.0).with_bonus_mode(BonusMode::Replace);
    let mut agent = DynaAgent::seeded(config, corridor_env(6), 21);
    agent
        .simulate(&SimulationOptions::new(500).with_planning(10))
        .unwrap();
    assert!(agent.metrics().episodes > 20);
    // right is preferred next to the goal
    assert!(agent.q_table().get(4, 1) > agent.q_table().get(4, 0));
}

/// Environment whose sampler escapes the state space
struct LeakyEnv {
    row: Array1<f64>,
}

impl TabularEnvironment for LeakyEnv {
    fn num_states(&self) -> usize {
        2
    }

    fn num_actions(&self) -> usize {
        1
    }

    fn start_state(&self) -> usize {
        0
    }

    fn goal_state(&self) -> usize {
        1
    }

    fn transition_probabilities(&self, _state: usize, _action: usize) -> ndarray::ArrayView1<'_, f64> {
        self.row.view()
    }

    fn reward(&self, _state: usize, _action: usize) -> Reward {
        Reward(0.0)
    }

    fn sample_next_state<R: Rng + ?Sized>(
        &self,
        _state: usize,
        _action: usize,
        _rng: &mut R,
    ) -> dyna_rl_core::Result<usize> {
        Ok(7)
    }
}

#[test]
fn test_out_of_range_next_state_fails_fast() {
    let env = LeakyEnv {
        row: array![0.0, 1.0],
    };
    let mut agent = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.0), env, 0);
    let err = agent.simulate(&SimulationOptions::new(5)).unwrap_err();
    assert!(matches!(err, RLError::InvalidState(_)), "{err}");
    assert!(agent.history().is_empty());
}

/// Two-state environment reporting arbitrary start and goal indices
struct MisplacedEnv {
    start: usize,
    goal: usize,
    row: Array1<f64>,
}

impl TabularEnvironment for MisplacedEnv {
    fn num_states(&self) -> usize {
        2
    }

    fn num_actions(&self) -> usize {
        1
    }

    fn start_state(&self) -> usize {
        self.start
    }

    fn goal_state(&self) -> usize {
        self.goal
    }

    fn transition_probabilities(&self, _state: usize, _action: usize) -> ndarray::ArrayView1<'_, f64> {
        self.row.view()
    }

    fn reward(&self, _state: usize, _action: usize) -> Reward {
        Reward(0.0)
    }
}

#[test]
fn test_out_of_range_start_or_goal_fails_fast() {
    for (start, goal) in [(5, 1), (0, 9)] {
        let env = MisplacedEnv {
            start,
            goal,
            row: array![0.0, 1.0],
        };
        let mut agent = DynaAgent::seeded(DynaConfig::new(0.5, 0.9, 0.0), env, 0);
        let err = agent.simulate(&SimulationOptions::new(1)).unwrap_err();
        assert!(matches!(err, RLError::InvalidState(_)), "({start}, {goal}): {err}");
        assert!(agent.history().is_empty());
    }
}

#[test]
fn test_default_sampler_on_custom_environment() {
    struct Coin {
        row: Array1<f64>,
    }

    impl TabularEnvironment for Coin {
        fn num_states(&self) -> usize {
            2
        }
        fn num_actions(&self) -> usize {
            1
        }
        fn start_state(&self) -> usize {
            0
        }
        fn goal_state(&self) -> usize {
            1
        }
        fn transition_probabilities(&self, _state: usize, _action: usize) -> ndarray::ArrayView1<'_, f64> {
            self.row.view()
        }
        fn reward(&self, state: usize, _action: usize) -> Reward {
            Reward(if state == 0 { 1.0 } else { 0.0 })
        }
    }

    let mut agent = DynaAgent::seeded(
        DynaConfig::new(0.5, 0.9, 0.0),
        Coin {
            row: array![0.5, 0.5],
        },
        6,
    );
    agent.simulate(&SimulationOptions::new(400)).unwrap();
    let goals = agent.metrics().episodes;
    assert!((150..250).contains(&goals), "goals {goals}");
    assert!(agent.history().iter().all(|t| t.state == 0));
}
