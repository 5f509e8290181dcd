use serde::Serialize;
use tracing::{debug, info};

use super::errors::EvalError;
use super::switching::{RegressionScope, SequencePair, SwitchingPolicy};
use crate::env::{Benchmark, Env, EnvProvider, Session};
use crate::learner::Agent;

/// What happened on one benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeRecord<A> {
    pub benchmark: Benchmark,
    pub episode_reward: f64,
    pub rewards: Vec<f64>,
    pub actions: Vec<A>,
    pub switches: usize,
}

/// Run the switching heuristic over `benchmarks` on an already-open environment.
/// Every benchmark starts at the head of the active sequence; the active
/// sequence and (depending on `scope`) the previous reward carry over.
pub fn run_sequences<E: Env>(
    env: &mut E,
    benchmarks: &[Benchmark],
    sequences: &SequencePair<E::Act>,
    scope: RegressionScope,
) -> Result<Vec<EpisodeRecord<E::Act>>, EvalError> {
    let mut policy = SwitchingPolicy::new(sequences, scope);
    let mut records = Vec::with_capacity(benchmarks.len());

    for benchmark in benchmarks {
        env.reset(benchmark)?;
        policy.begin_episode();

        let mut rewards = Vec::new();
        let mut actions = Vec::new();
        let mut switches = 0;
        loop {
            let action = policy.next_action().clone();
            let step = env.step(action.clone())?;
            if policy.observe(step.reward) {
                switches += 1;
                debug!(
                    %benchmark,
                    step = rewards.len(),
                    active = ?policy.active(),
                    "reward regressed, switched sequence"
                );
            }
            rewards.push(step.reward);
            actions.push(action);
            if step.done {
                break;
            }
        }

        records.push(EpisodeRecord {
            benchmark: benchmark.clone(),
            episode_reward: env.episode_reward(),
            rewards,
            actions,
            switches,
        });
    }
    Ok(records)
}

/// Run episodes where `agent` picks every action from the current observation.
pub fn run_agent<E, G>(
    env: &mut E,
    agent: &G,
    benchmarks: &[Benchmark],
) -> Result<Vec<EpisodeRecord<E::Act>>, EvalError>
where
    E: Env,
    G: Agent<E::Obs, E::Act> + ?Sized,
{
    let mut records = Vec::with_capacity(benchmarks.len());

    for benchmark in benchmarks {
        let mut obs = env.reset(benchmark)?;
        let mut rewards = Vec::new();
        let mut actions = Vec::new();
        loop {
            let action = agent.compute_action(&obs);
            let step = env.step(action.clone())?;
            rewards.push(step.reward);
            actions.push(action);
            obs = step.obs;
            if step.done {
                break;
            }
        }

        records.push(EpisodeRecord {
            benchmark: benchmark.clone(),
            episode_reward: env.episode_reward(),
            rewards,
            actions,
            switches: 0,
        });
    }
    Ok(records)
}

fn totals<A>(records: Vec<EpisodeRecord<A>>) -> Vec<f64> {
    records.into_iter().map(|r| r.episode_reward).collect()
}

/// Scores fixed sequences or agents on benchmarks. Each call opens one
/// environment session and reuses it for every benchmark in the call.
pub struct SequenceEvaluator<'p, P> {
    provider: &'p P,
    scope: RegressionScope,
}

impl<'p, P: EnvProvider> SequenceEvaluator<'p, P> {
    pub fn new(provider: &'p P) -> Self {
        Self {
            provider,
            scope: RegressionScope::default(),
        }
    }

    pub fn with_scope(mut self, scope: RegressionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Episode reward per benchmark, in input order.
    pub fn evaluate(
        &self,
        benchmarks: &[Benchmark],
        sequences: &SequencePair<<P::Env as Env>::Act>,
    ) -> Result<Vec<f64>, EvalError> {
        self.evaluate_detailed(benchmarks, sequences).map(totals)
    }

    pub fn evaluate_detailed(
        &self,
        benchmarks: &[Benchmark],
        sequences: &SequencePair<<P::Env as Env>::Act>,
    ) -> Result<Vec<EpisodeRecord<<P::Env as Env>::Act>>, EvalError> {
        if benchmarks.is_empty() {
            return Ok(Vec::new());
        }
        let mut session = Session::new(self.provider.make_env()?);
        let records = run_sequences(&mut *session, benchmarks, sequences, self.scope)?;
        session.close()?;

        let switches: usize = records.iter().map(|r| r.switches).sum();
        info!(benchmarks = records.len(), switches, "evaluated fixed sequences");
        Ok(records)
    }

    pub fn evaluate_with_agent<G>(
        &self,
        agent: &G,
        benchmarks: &[Benchmark],
    ) -> Result<Vec<f64>, EvalError>
    where
        G: Agent<<P::Env as Env>::Obs, <P::Env as Env>::Act> + ?Sized,
    {
        if benchmarks.is_empty() {
            return Ok(Vec::new());
        }
        let mut session = Session::new(self.provider.make_env()?);
        let records = run_agent(&mut *session, agent, benchmarks)?;
        session.close()?;

        info!(benchmarks = records.len(), "evaluated agent");
        Ok(totals(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{Corpora, EnvError, PassPipelineProvider, Step, TimeLimit};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed reward script; the episode ends when the script runs out.
    struct ScriptedEnv {
        script: Vec<f64>,
        cursor: usize,
        total: f64,
    }

    impl ScriptedEnv {
        fn new(script: Vec<f64>) -> Self {
            Self {
                script,
                cursor: 0,
                total: 0.0,
            }
        }
    }

    impl Env for ScriptedEnv {
        type Obs = usize;
        type Act = u32;
        type Info = ();

        fn reset(&mut self, _benchmark: &Benchmark) -> Result<usize, EnvError> {
            self.cursor = 0;
            self.total = 0.0;
            Ok(0)
        }

        fn step(&mut self, _act: u32) -> Result<Step<usize, ()>, EnvError> {
            let reward = self.script[self.cursor];
            self.cursor += 1;
            self.total += reward;
            Ok(Step {
                obs: self.cursor,
                reward,
                done: self.cursor == self.script.len(),
                info: (),
            })
        }

        fn episode_reward(&self) -> f64 {
            self.total
        }

        fn close(&mut self) -> Result<(), EnvError> {
            Ok(())
        }
    }

    struct CountingProvider {
        made: AtomicUsize,
    }

    impl EnvProvider for CountingProvider {
        type Env = ScriptedEnv;

        fn make_env(&self) -> Result<ScriptedEnv, EnvError> {
            self.made.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedEnv::new(vec![1.0]))
        }
    }

    struct Constant(usize);

    impl Agent<crate::env::passes::Observation, usize> for Constant {
        fn compute_action(&self, _obs: &crate::env::passes::Observation) -> usize {
            self.0
        }
    }

    fn benchmarks(n: usize) -> Vec<Benchmark> {
        (0..n).map(|i| Benchmark::from_parts("t", &i.to_string())).collect()
    }

    #[test]
    fn test_decreasing_rewards_scenario() {
        let mut env = ScriptedEnv::new(vec![10.0, 8.0, 5.0]);
        let pair = SequencePair::new(vec![1, 2], Some(vec![3])).unwrap();
        let records =
            run_sequences(&mut env, &benchmarks(1), &pair, RegressionScope::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].actions, vec![1, 2, 3]);
        assert_eq!(records[0].switches, 2);
        assert_eq!(records[0].episode_reward, 23.0);
    }

    #[test]
    fn test_single_sequence_cycles() {
        let mut env = ScriptedEnv::new(vec![5.0, 4.0, 3.0, 2.0, 1.0]);
        let pair = SequencePair::single(vec![7, 8]).unwrap();
        let records =
            run_sequences(&mut env, &benchmarks(1), &pair, RegressionScope::default()).unwrap();
        assert_eq!(records[0].actions, vec![7, 8, 7, 8, 7]);
        assert_eq!(records[0].switches, 0);
    }

    #[test]
    fn test_each_benchmark_starts_at_sequence_head() {
        let mut env = ScriptedEnv::new(vec![1.0, 1.0]);
        let pair = SequencePair::single(vec![1, 2, 3]).unwrap();
        let records =
            run_sequences(&mut env, &benchmarks(2), &pair, RegressionScope::default()).unwrap();
        assert_eq!(records[0].actions, vec![1, 2]);
        assert_eq!(records[1].actions, vec![1, 2]);
    }

    #[test]
    fn test_active_sequence_carries_across_benchmarks() {
        // Second step regresses and switches to B; the next benchmark opens on B.
        let mut env = ScriptedEnv::new(vec![5.0, 2.0]);
        let pair = SequencePair::new(vec![1, 2], Some(vec![7, 8, 9])).unwrap();
        let records =
            run_sequences(&mut env, &benchmarks(2), &pair, RegressionScope::PerEpisode).unwrap();
        assert_eq!(records[0].actions, vec![1, 2]);
        assert_eq!(records[1].actions, vec![7, 8]);
    }

    #[test]
    fn test_previous_reward_carries_across_benchmarks() {
        // The first step of the second benchmark (3.0) is compared against
        // the last step of the first (4.0).
        let pair = SequencePair::new(vec![1], Some(vec![2])).unwrap();

        let mut env = ScriptedEnv::new(vec![3.0, 4.0]);
        let records = run_sequences(
            &mut env,
            &benchmarks(2),
            &pair,
            RegressionScope::AcrossBenchmarks,
        )
        .unwrap();
        assert_eq!(records[0].switches, 0);
        assert_eq!(records[1].switches, 1);
        assert_eq!(records[1].actions, vec![1, 2]);

        let mut env = ScriptedEnv::new(vec![3.0, 4.0]);
        let records =
            run_sequences(&mut env, &benchmarks(2), &pair, RegressionScope::PerEpisode).unwrap();
        assert_eq!(records[1].switches, 0);
        assert_eq!(records[1].actions, vec![1, 1]);
    }

    #[test]
    fn test_empty_benchmarks_skip_environment() {
        let provider = CountingProvider {
            made: AtomicUsize::new(0),
        };
        let evaluator = SequenceEvaluator::new(&provider);
        let pair = SequencePair::single(vec![1]).unwrap();
        assert!(evaluator.evaluate(&[], &pair).unwrap().is_empty());
        assert_eq!(provider.made.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_one_session_per_call() {
        let provider = CountingProvider {
            made: AtomicUsize::new(0),
        };
        let evaluator = SequenceEvaluator::new(&provider);
        let pair = SequencePair::single(vec![1]).unwrap();
        let rewards = evaluator.evaluate(&benchmarks(4), &pair).unwrap();
        assert_eq!(rewards, vec![1.0; 4]);
        assert_eq!(provider.made.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let provider = PassPipelineProvider::new(Corpora::default(), 5);
        let evaluator = SequenceEvaluator::new(&provider);
        let pair = SequencePair::new(vec![0, 2, 3], Some(vec![4, 5])).unwrap();
        let bms = provider.corpora().get("chstone-v0").unwrap().benchmarks().to_vec();
        let first = evaluator.evaluate(&bms, &pair).unwrap();
        let second = evaluator.evaluate(&bms, &pair).unwrap();
        assert_eq!(first.len(), bms.len());
        assert_eq!(first, second);
    }

    #[test]
    fn test_constant_agent_matches_direct_stepping() {
        let provider = PassPipelineProvider::new(Corpora::default(), 5);
        let bms = provider.corpora().get("chstone-v0").unwrap().benchmarks()[..3].to_vec();

        let mut env = provider.make_env().unwrap();
        let records = run_agent(&mut env, &Constant(2), &bms).unwrap();

        let mut direct: TimeLimit<_> = provider.make_env().unwrap();
        for (record, benchmark) in records.iter().zip(&bms) {
            direct.reset(benchmark).unwrap();
            let mut trace = Vec::new();
            loop {
                let step = direct.step(2).unwrap();
                trace.push(step.reward);
                if step.done {
                    break;
                }
            }
            assert_eq!(record.rewards, trace);
            assert_eq!(record.episode_reward, direct.episode_reward());
        }

        let evaluator = SequenceEvaluator::new(&provider);
        let totals = evaluator.evaluate_with_agent(&Constant(2), &bms).unwrap();
        let expected: Vec<f64> = records.iter().map(|r| r.episode_reward).collect();
        assert_eq!(totals, expected);
    }

    #[test]
    fn test_unknown_benchmark_aborts_batch() {
        let provider = PassPipelineProvider::new(Corpora::default(), 5);
        let evaluator = SequenceEvaluator::new(&provider);
        let pair = SequencePair::single(vec![0]).unwrap();
        let bms = vec![
            Benchmark::from_parts("chstone-v0", "sha"),
            Benchmark::from_parts("chstone-v0", "md5"),
        ];
        assert!(matches!(
            evaluator.evaluate(&bms, &pair),
            Err(EvalError::Env(EnvError::UnknownBenchmark(_)))
        ));
    }
}
