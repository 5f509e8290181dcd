use super::errors::LearnerError;
use super::handle::AgentHandle;

/// Maps an observation to the next action.
pub trait Agent<O, A>: Send + Sync {
    fn compute_action(&self, obs: &O) -> A;
}

/// Runs an optimization procedure and hands back the resulting agent.
pub trait Trainer<O, A> {
    fn train(&mut self) -> Result<AgentHandle<O, A>, LearnerError>;
}
