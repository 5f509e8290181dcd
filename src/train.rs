// passgym/src/train.rs
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::env::passes::{Action, Observation, PASSES};
use crate::env::{Benchmark, CycleOverBenchmarks, Env, EnvProvider, Session};
use crate::learner::{AgentHandle, GreedyPolicy, LearnerError, QTable, Trainer};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub max_episodes: u64,
    /// Episodes between checkpoints.
    pub episodes_per_iteration: u64,
    pub seed: u64,
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
    /// Step counts above this share one row of the table.
    pub horizon: u32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_episodes: 5,
            episodes_per_iteration: 1,
            seed: 0xCC,
            alpha: 0.1,
            gamma: 0.99,
            epsilon: 0.2,
            horizon: 5,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), LearnerError> {
        if self.max_episodes == 0 {
            return Err(LearnerError::InvalidConfig(
                "max_episodes must be > 0".to_string(),
            ));
        }
        if self.episodes_per_iteration == 0 {
            return Err(LearnerError::InvalidConfig(
                "episodes_per_iteration must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.alpha) || self.alpha == 0.0 {
            return Err(LearnerError::InvalidConfig(
                "alpha must be in (0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(LearnerError::InvalidConfig(
                "gamma must be in [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(LearnerError::InvalidConfig(
                "epsilon must be in [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingStats {
    pub total_steps: u64,
    pub total_episodes: u64,
    pub training_time: Duration,
    pub best_iteration: u64,
    pub best_mean_reward: f64,
}

struct Checkpoint {
    iteration: u64,
    mean_reward: f64,
    table: QTable,
}

/// Epsilon-greedy Q-learning over a cycle of training benchmarks. Every
/// iteration is checkpointed and the best one by mean episode reward is
/// restored as a greedy agent.
pub struct QLearningTrainer<'a, P> {
    provider: &'a P,
    benchmarks: Vec<Benchmark>,
    cfg: TrainConfig,
    stats: Option<TrainingStats>,
}

impl<'a, P> QLearningTrainer<'a, P>
where
    P: EnvProvider,
    P::Env: Env<Obs = Observation, Act = Action>,
{
    pub fn new(provider: &'a P, benchmarks: Vec<Benchmark>, cfg: TrainConfig) -> Self {
        Self {
            provider,
            benchmarks,
            cfg,
            stats: None,
        }
    }

    /// Stats of the most recent run.
    pub fn stats(&self) -> Option<&TrainingStats> {
        self.stats.as_ref()
    }

    fn run(&self) -> Result<(QTable, TrainingStats), LearnerError> {
        self.cfg.validate()?;
        let start = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.cfg.seed);

        let mut session = Session::new(self.provider.make_env()?);
        let mut env = CycleOverBenchmarks::new(&mut *session, self.benchmarks.clone())?;

        let mut table = QTable::new(self.cfg.horizon, PASSES.len());
        let mut best: Option<Checkpoint> = None;
        let mut iteration_rewards = Vec::new();
        let mut iteration = 0;
        let mut total_steps = 0;

        for episode in 0..self.cfg.max_episodes {
            let (benchmark, mut obs) = env.reset()?;
            loop {
                let state = table.state_index(&obs);
                let action = if rng.gen_bool(self.cfg.epsilon) {
                    rng.gen_range(0..table.n_actions())
                } else {
                    table.best_action(state)
                };
                let step = env.step(action)?;
                total_steps += 1;

                let target = if step.done {
                    step.reward
                } else {
                    step.reward + self.cfg.gamma * table.max_value(table.state_index(&step.obs))
                };
                table.update(state, action, self.cfg.alpha, target);

                obs = step.obs;
                if step.done {
                    break;
                }
            }

            let reward = env.episode_reward();
            debug!(episode, %benchmark, reward, "episode finished");
            iteration_rewards.push(reward);

            let last = episode + 1 == self.cfg.max_episodes;
            if iteration_rewards.len() as u64 == self.cfg.episodes_per_iteration || last {
                let mean_reward =
                    iteration_rewards.iter().sum::<f64>() / iteration_rewards.len() as f64;
                debug!(iteration, mean_reward, "checkpoint");
                if best.as_ref().is_none_or(|b| mean_reward > b.mean_reward) {
                    best = Some(Checkpoint {
                        iteration,
                        mean_reward,
                        table: table.clone(),
                    });
                }
                iteration_rewards.clear();
                iteration += 1;
            }
        }

        let best = best.ok_or(LearnerError::NoCheckpoint)?;
        let stats = TrainingStats {
            total_steps,
            total_episodes: self.cfg.max_episodes,
            training_time: start.elapsed(),
            best_iteration: best.iteration,
            best_mean_reward: best.mean_reward,
        };
        Ok((best.table, stats))
    }
}

impl<P> Trainer<Observation, Action> for QLearningTrainer<'_, P>
where
    P: EnvProvider,
    P::Env: Env<Obs = Observation, Act = Action>,
{
    fn train(&mut self) -> Result<AgentHandle<Observation, Action>, LearnerError> {
        info!(
            episodes = self.cfg.max_episodes,
            benchmarks = self.benchmarks.len(),
            seed = self.cfg.seed,
            "training started"
        );
        let (table, stats) = self.run()?;
        info!(
            steps = stats.total_steps,
            best_iteration = stats.best_iteration,
            best_mean_reward = stats.best_mean_reward,
            elapsed_ms = stats.training_time.as_millis() as u64,
            "training finished"
        );
        self.stats = Some(stats);
        Ok(AgentHandle::new(GreedyPolicy::new(table)))
    }
}
