use crate::env::errors::EnvError;
use crate::env::types::{Benchmark, Step};

/// One simulation session: reset onto a benchmark, then step actions until done.
pub trait Env: Send {
    type Obs: Send + Clone + 'static;
    type Act: Send + Clone + 'static;
    type Info: Send + Clone + 'static;

    fn reset(&mut self, benchmark: &Benchmark) -> Result<Self::Obs, EnvError>;
    fn step(&mut self, act: Self::Act) -> Result<Step<Self::Obs, Self::Info>, EnvError>;

    /// Cumulative reward of the current episode.
    fn episode_reward(&self) -> f64;

    fn close(&mut self) -> Result<(), EnvError>;
}

impl<E: Env + ?Sized> Env for &mut E {
    type Obs = E::Obs;
    type Act = E::Act;
    type Info = E::Info;

    fn reset(&mut self, benchmark: &Benchmark) -> Result<Self::Obs, EnvError> {
        (**self).reset(benchmark)
    }

    fn step(&mut self, act: Self::Act) -> Result<Step<Self::Obs, Self::Info>, EnvError> {
        (**self).step(act)
    }

    fn episode_reward(&self) -> f64 {
        (**self).episode_reward()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        (**self).close()
    }
}

/// Hands out fresh environments. Implementations must be shareable across
/// the threads the runtime schedules work on.
pub trait EnvProvider: Send + Sync {
    type Env: Env;

    fn make_env(&self) -> Result<Self::Env, EnvError>;
}
