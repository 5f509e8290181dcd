use tracing::trace;

use super::{Benchmark, Env, EnvError, Step};

/// Ends every episode after `max_steps` actions.
pub struct TimeLimit<E> {
    inner: E,
    max_steps: u32,
    elapsed: u32,
}

impl<E: Env> TimeLimit<E> {
    pub fn new(inner: E, max_steps: u32) -> Self {
        Self {
            inner,
            max_steps,
            elapsed: 0,
        }
    }
}

impl<E: Env> Env for TimeLimit<E> {
    type Obs = E::Obs;
    type Act = E::Act;
    type Info = E::Info;

    fn reset(&mut self, benchmark: &Benchmark) -> Result<Self::Obs, EnvError> {
        self.elapsed = 0;
        self.inner.reset(benchmark)
    }

    fn step(&mut self, act: Self::Act) -> Result<Step<Self::Obs, Self::Info>, EnvError> {
        let mut step = self.inner.step(act)?;
        self.elapsed += 1;
        if self.elapsed >= self.max_steps {
            trace!(steps = self.elapsed, "step limit reached");
            step.done = true;
        }
        Ok(step)
    }

    fn episode_reward(&self) -> f64 {
        self.inner.episode_reward()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.inner.close()
    }
}

/// Resets onto the next benchmark of a fixed list each time, wrapping around.
pub struct CycleOverBenchmarks<E> {
    inner: E,
    benchmarks: Vec<Benchmark>,
    next: usize,
}

impl<E: Env> CycleOverBenchmarks<E> {
    pub fn new(inner: E, benchmarks: Vec<Benchmark>) -> Result<Self, EnvError> {
        if benchmarks.is_empty() {
            return Err(EnvError::NoBenchmarks);
        }
        Ok(Self {
            inner,
            benchmarks,
            next: 0,
        })
    }

    /// Start an episode on the next benchmark in the cycle.
    pub fn reset(&mut self) -> Result<(Benchmark, E::Obs), EnvError> {
        let benchmark = self.benchmarks[self.next].clone();
        self.next = (self.next + 1) % self.benchmarks.len();
        let obs = self.inner.reset(&benchmark)?;
        Ok((benchmark, obs))
    }

    pub fn step(&mut self, act: E::Act) -> Result<Step<E::Obs, E::Info>, EnvError> {
        self.inner.step(act)
    }

    pub fn episode_reward(&self) -> f64 {
        self.inner.episode_reward()
    }

    pub fn close(&mut self) -> Result<(), EnvError> {
        self.inner.close()
    }
}
